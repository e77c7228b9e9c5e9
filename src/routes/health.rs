use actix_web::{get, web, HttpResponse, Responder};
use chrono::Utc;
use serde_json::json;

use crate::{auth::AccessMode, state::AppState};

/// Liveness probe. Reports the server time, crate version and which access
/// rules are active.
#[get("/health")]
pub async fn health(state: web::Data<AppState>) -> impl Responder {
    let access_mode = match state.policy.mode() {
        AccessMode::Open => "open",
        AccessMode::Authenticated => "authenticated",
    };

    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "access_mode": access_mode,
        "ownership_enforced": state.policy.enforces_ownership(),
        "timestamp": Utc::now()
    }))
}
