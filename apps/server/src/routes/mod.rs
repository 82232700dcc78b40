use actix_web::web::ServiceConfig;

pub mod health;
pub mod websites;

pub fn routes(cfg: &mut ServiceConfig) {
    health::routes(cfg);
    websites::routes(cfg);
}
