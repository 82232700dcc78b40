use actix_web::{HttpResponse, delete, get, post, web};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use webpulse::{Registry, ValidationError};

use crate::error::ApiError;

macros_utils::routes! {
    route add_website,
    route list_websites,
    route remove_website,
}

#[derive(Debug, Deserialize)]
pub struct AddWebsite {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveWebsite {
    url: Option<String>,
}

/// Reject unparseable bodies with the same error shape as every other failure
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        warn!("Invalid JSON input: {}", err);
        ApiError::BadRequest("Invalid JSON input".into()).into()
    })
}

/// Register a URL with status `UNKNOWN`, never checked
#[post("/websites")]
pub async fn add_website(
    registry: web::Data<dyn Registry>,
    body: web::Json<AddWebsite>,
) -> Result<HttpResponse, ApiError> {
    let url = body.into_inner().url.ok_or(ValidationError::Missing)?;

    registry.register(&url).await?;

    info!(url = %url, "Registered website");
    Ok(HttpResponse::Ok().json(json!({ "message": format!("{url} added successfully") })))
}

#[get("/websites")]
pub async fn list_websites(registry: web::Data<dyn Registry>) -> Result<HttpResponse, ApiError> {
    let websites = registry.list_all().await?;

    Ok(HttpResponse::Ok().json(json!({ "websites": websites })))
}

#[delete("/websites")]
pub async fn remove_website(
    registry: web::Data<dyn Registry>,
    query: web::Query<RemoveWebsite>,
) -> Result<HttpResponse, ApiError> {
    let url = query.into_inner().url.ok_or(ValidationError::Missing)?;

    registry.remove(&url).await?;

    info!(url = %url, "Removed website");
    Ok(HttpResponse::Ok().json(json!({ "message": format!("URL {url} deleted successfully") })))
}
