use actix_web::{HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

// Liveness endpoint
pub async fn ping() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "success": true,
        "message": "Admin API is running",
        "timestamp": Utc::now(),
    }))
}

// CORS preflight
pub async fn preflight() -> impl Responder {
    HttpResponse::Ok().finish()
}
