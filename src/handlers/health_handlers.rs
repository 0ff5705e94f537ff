use actix_web::{HttpResponse, web};

use crate::state::app_state::AppState;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    // Touch the history backing so a broken file or database shows up here
    match state.history.ping().await {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({ "success": true })),
        Err(e) => {
            log::error!("Health check failed: {}", e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "error": "History storage unavailable" }))
        }
    }
}
