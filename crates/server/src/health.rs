use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub catalog: HealthCheck,
    pub checked_at: String,
}

pub fn router(state: AppState) -> Router {
    Router::new().route("/health", get(health)).with_state(state)
}

pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let catalog = catalog_check(&state);
    let ready = catalog.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "packquote-server runtime initialized".to_string(),
        },
        catalog,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn catalog_check(state: &AppState) -> HealthCheck {
    let engine = state.engine();
    let catalog = engine.catalog();
    let families = [
        ("bag types", catalog.bag_types().len()),
        ("sizes", catalog.bag_sizes().len()),
        ("materials", catalog.materials().len()),
        ("tiers", catalog.tiers().len()),
    ];

    match families.iter().find(|(_, count)| *count == 0) {
        Some((family, _)) => {
            HealthCheck { status: "degraded", detail: format!("catalog has no {family}") }
        }
        None => HealthCheck {
            status: "ready",
            detail: format!(
                "{} bag types, {} materials, {} processes loaded",
                catalog.bag_types().len(),
                catalog.materials().len(),
                catalog.processes().len()
            ),
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use packquote_core::config::AppConfig;
    use packquote_core::QuoteEngine;

    use crate::health::health;
    use crate::state::AppState;

    #[tokio::test]
    async fn health_returns_ready_with_builtin_catalog() {
        let state = AppState::new(QuoteEngine::default(), Arc::new(AppConfig::default()));

        let (status, Json(payload)) = health(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.catalog.status, "ready");
        assert_eq!(payload.service.status, "ready");
        assert!(payload.catalog.detail.contains("bag types"));
    }
}
