use actix_web::middleware::DefaultHeaders;
use actix_web::{HttpResponse, options, web};

use crate::error::ApiError;

mod health;
mod models;
mod printers;
mod status;

/// Register every route, API routes under `/api`
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.configure(health::routes).service(
        web::scope("/api")
            .app_data(json_config())
            .configure(printers::routes)
            .configure(status::routes)
            // Must stay last: catches OPTIONS for every path above
            .service(preflight),
    );
}

/// Permissive CORS headers on every response
pub fn cors_headers() -> DefaultHeaders {
    DefaultHeaders::new()
        .add(("Access-Control-Allow-Origin", "*"))
        .add(("Access-Control-Allow-Headers", "Content-Type,Authorization"))
        .add(("Access-Control-Allow-Methods", "GET,PUT,POST,DELETE,OPTIONS"))
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| ApiError::InvalidBody(err.to_string()).into())
}

#[options("/{tail:.*}")]
async fn preflight() -> HttpResponse {
    HttpResponse::Ok().finish()
}
