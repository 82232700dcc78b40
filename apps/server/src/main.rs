#![warn(clippy::all, clippy::pedantic)]

use std::net::SocketAddr;
use std::sync::Arc;

use actix_web::middleware::DefaultHeaders;
use actix_web::{App, HttpServer, web};
use tracing::info;
use webpulse::{Config, LibsqlRegistry, Registry};

mod error;
mod routes;

use error::AppError;
use logger::init_tracing;

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::from_config(std::env::var("WEBPULSE_CONFIG").ok())?.with_env_overrides();
    let registry: Arc<dyn Registry> = Arc::new(
        LibsqlRegistry::open(
            &config.store.database_path,
            config.store.pool_size,
            config.store_timeout(),
        )
        .await?,
    );

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    run_server(addr, registry).await
}

async fn run_server(addr: SocketAddr, registry: Arc<dyn Registry>) -> Result<(), AppError> {
    info!(%addr, "Starting registration server");

    let registry = web::Data::from(registry);
    HttpServer::new(move || {
        App::new()
            .wrap(
                DefaultHeaders::new()
                    .add(("Access-Control-Allow-Origin", "*"))
                    .add(("Access-Control-Allow-Headers", "Content-Type"))
                    .add(("Access-Control-Allow-Methods", "OPTIONS,POST,GET,DELETE")),
            )
            .app_data(registry.clone())
            .app_data(routes::websites::json_config())
            .configure(routes::routes)
    })
    .bind(addr)?
    .run()
    .await?;

    Ok(())
}
