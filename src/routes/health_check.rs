use actix_web::HttpResponse;

/// GET /api/health - public, always 200.
pub async fn health_check() -> HttpResponse {
    tracing::debug!("Health check endpoint called");
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "auth-api"
    }))
}
