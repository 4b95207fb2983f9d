//! JSON API for storefront and operator clients.
//!
//! - `GET  /api/v1/catalog`                 — catalog families and option rules
//! - `POST /api/v1/quote`                   — price a configuration
//! - `POST /api/v1/configurator/select`     — apply one option change to a selection
//! - `POST /api/v1/admin/catalog/reload`    — rebuild the engine from the configured catalog

use axum::{
    extract::State,
    http::{header::AUTHORIZATION, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{NaiveDate, Utc};
use packquote_core::domain::quote::PriceBreak;
use packquote_core::{
    ApplicationError, BagTypeId, CatalogData, CheckoutRequest, ConstraintRules,
    ConstraintViolation, InterfaceError, MaterialId, ProcessId, QuoteEngine, QuoteError,
    QuoteInput, QuoteResult, QuoteRuntime, Selection, SelectionError,
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CatalogResponse {
    pub catalog: CatalogData,
    pub rules: ConstraintRules,
    pub display_cny_rate: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct QuoteRequest {
    #[serde(flatten)]
    pub input: QuoteInput,
    /// Delivery days are counted from this date; defaults to today.
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct QuoteResponse {
    pub correlation_id: String,
    pub quote: QuoteResult,
    pub next_price_break: Option<PriceBreak>,
    pub checkout: CheckoutRequest,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum SelectAction {
    Add { process: ProcessId },
    Remove { process: ProcessId },
    Toggle { process: ProcessId },
    Group {
        group: String,
        #[serde(default)]
        option: Option<ProcessId>,
    },
    SetMaterial { material: MaterialId },
    SetBagType { bag_type: BagTypeId },
}

#[derive(Debug, Deserialize)]
pub struct SelectRequest {
    pub selection: Selection,
    #[serde(flatten)]
    pub action: SelectAction,
}

#[derive(Debug, Serialize)]
pub struct SelectResponse {
    pub selection: Selection,
    pub disabled_options: Vec<ProcessId>,
    pub available_materials: Vec<MaterialId>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub status: &'static str,
    pub correlation_id: String,
    pub bag_types: usize,
    pub materials: usize,
    pub processes: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
    pub message: String,
    pub violations: Vec<ConstraintViolation>,
    pub correlation_id: String,
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    fn new(
        status: StatusCode,
        code: &str,
        message: impl Into<String>,
        correlation_id: String,
    ) -> Self {
        let message = message.into();
        Self {
            status,
            body: ErrorBody {
                error: message.clone(),
                code: code.to_string(),
                message,
                violations: Vec::new(),
                correlation_id,
            },
        }
    }

    fn from_quote(error: QuoteError, correlation_id: String) -> Self {
        let violations = error.violations().to_vec();
        let interface = ApplicationError::from(error).into_interface(correlation_id);
        let user_message = interface.user_message().to_string();

        let InterfaceError::BadRequest { message, code, correlation_id } = interface;

        Self {
            status: StatusCode::BAD_REQUEST,
            body: ErrorBody { error: user_message, code, message, violations, correlation_id },
        }
    }

    fn from_selection(error: SelectionError, correlation_id: String) -> Self {
        let violations = match &error {
            SelectionError::Blocked(violation) => vec![violation.clone()],
            _ => Vec::new(),
        };
        let mut api_error = Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            "SELECTION_REJECTED",
            error.to_string(),
            correlation_id,
        );
        api_error.body.violations = violations;
        api_error
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/catalog", get(catalog))
        .route("/api/v1/quote", post(quote))
        .route("/api/v1/configurator/select", post(select))
        .route("/api/v1/admin/catalog/reload", post(reload_catalog))
        .with_state(state)
}

fn correlation_id() -> String {
    format!("req-{}", Uuid::new_v4().simple())
}

pub async fn catalog(State(state): State<AppState>) -> Json<CatalogResponse> {
    let engine = state.engine();
    Json(CatalogResponse {
        catalog: engine.catalog().data().clone(),
        rules: engine.rules().clone(),
        display_cny_rate: state.config().pricing.display_cny_rate,
    })
}

pub async fn quote(
    State(state): State<AppState>,
    Json(request): Json<QuoteRequest>,
) -> Result<Json<QuoteResponse>, ApiError> {
    let correlation_id = correlation_id();
    let engine = state.engine();
    let today = request.today.unwrap_or_else(|| Utc::now().date_naive());

    match engine.quote_on(&request.input, today) {
        Ok(quote) => {
            info!(
                event_name = "api.quote.priced",
                correlation_id = %correlation_id,
                bag_type = %request.input.bag_type,
                quantity = quote.quantity,
                total_price = %quote.total_price,
                "quote priced"
            );
            Ok(Json(QuoteResponse {
                correlation_id,
                next_price_break: quote.next_price_break().cloned(),
                checkout: quote.checkout_request(),
                quote,
            }))
        }
        Err(error) => {
            warn!(
                event_name = "api.quote.rejected",
                correlation_id = %correlation_id,
                code = error.code(),
                violations = error.violations().len(),
                "quote rejected"
            );
            Err(ApiError::from_quote(error, correlation_id))
        }
    }
}

pub async fn select(
    State(state): State<AppState>,
    Json(request): Json<SelectRequest>,
) -> Result<Json<SelectResponse>, ApiError> {
    let engine = state.engine();
    let configurator = engine.configurator();
    let current = &configurator
        .normalize(&request.selection)
        .map_err(|error| ApiError::from_selection(error, correlation_id()))?;

    let next = match request.action {
        SelectAction::Add { process } => configurator.select(current, &process),
        SelectAction::Remove { process } => Ok(configurator.deselect(current, &process)),
        SelectAction::Toggle { process } => configurator.toggle(current, &process),
        SelectAction::Group { group, option } => {
            configurator.select_group(current, &group, option.as_ref())
        }
        SelectAction::SetMaterial { material } => configurator.set_material(current, &material),
        SelectAction::SetBagType { bag_type } => configurator.set_bag_type(current, &bag_type),
    }
    .map_err(|error| ApiError::from_selection(error, correlation_id()))?;

    Ok(Json(SelectResponse {
        disabled_options: configurator.disabled_options(&next),
        available_materials: configurator
            .available_materials(&next)
            .into_iter()
            .map(|material| material.id.clone())
            .collect(),
        selection: next,
    }))
}

pub async fn reload_catalog(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ReloadResponse>, ApiError> {
    let correlation_id = correlation_id();
    let Some(expected) = state.config().server.admin_token.as_ref() else {
        return Err(ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "not found", correlation_id));
    };

    let presented = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));
    if presented != Some(expected.expose_secret()) {
        warn!(
            event_name = "api.admin.unauthorized",
            correlation_id = %correlation_id,
            "catalog reload refused"
        );
        return Err(ApiError::new(
            StatusCode::UNAUTHORIZED,
            "UNAUTHORIZED",
            "a valid admin bearer token is required",
            correlation_id,
        ));
    }

    let engine = match QuoteEngine::from_config(state.config()) {
        Ok(engine) => engine,
        Err(error) => {
            warn!(
                event_name = "api.admin.catalog_rejected",
                correlation_id = %correlation_id,
                error = %error,
                "catalog reload rejected; previous catalog stays live"
            );
            return Err(ApiError::new(
                StatusCode::UNPROCESSABLE_ENTITY,
                "CATALOG_INVALID",
                error.to_string(),
                correlation_id,
            ));
        }
    };

    let response = ReloadResponse {
        status: "reloaded",
        bag_types: engine.catalog().bag_types().len(),
        materials: engine.catalog().materials().len(),
        processes: engine.catalog().processes().len(),
        correlation_id,
    };
    state.replace_engine(engine);
    info!(
        event_name = "api.admin.catalog_reloaded",
        correlation_id = %response.correlation_id,
        bag_types = response.bag_types,
        materials = response.materials,
        "catalog reloaded"
    );

    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        extract::State,
        http::{header::AUTHORIZATION, HeaderMap, HeaderValue, Request, StatusCode},
        Json,
    };
    use chrono::NaiveDate;
    use packquote_core::config::AppConfig;
    use packquote_core::{BagTypeId, MaterialId, ProcessId, QuoteEngine, QuoteInput, Selection};
    use rust_decimal::Decimal;
    use secrecy::SecretString;
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const ADMIN_TOKEN: &str = "test-admin-token-0001";

    fn state_with(config: AppConfig) -> AppState {
        AppState::new(QuoteEngine::default(), Arc::new(config))
    }

    fn state() -> AppState {
        state_with(AppConfig::default())
    }

    fn admin_state() -> AppState {
        let mut config = AppConfig::default();
        config.server.admin_token = Some(SecretString::from(ADMIN_TOKEN.to_string()));
        state_with(config)
    }

    fn reference_request() -> QuoteRequest {
        QuoteRequest {
            input: QuoteInput::new("stand-up", "md", "pet-pe", 1_000, 4),
            today: NaiveDate::from_ymd_opt(2024, 5, 6),
        }
    }

    fn bearer(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).expect("header value"),
        );
        headers
    }

    fn selection(processes: &[&str]) -> Selection {
        Selection {
            bag_type: BagTypeId::new("stand-up"),
            material: MaterialId::new("pet-pe"),
            processes: processes.iter().map(|id| ProcessId::new(*id)).collect(),
        }
    }

    #[tokio::test]
    async fn quote_returns_priced_result_with_checkout_fields() {
        let Json(response) = quote(State(state()), Json(reference_request()))
            .await
            .expect("quote should succeed");

        assert_eq!(response.quote.unit_price, Decimal::new(4104, 4));
        assert_eq!(response.quote.total_price, Decimal::new(41040, 2));
        assert_eq!(response.next_price_break.map(|row| row.quantity), Some(2_500));
        assert_eq!(response.checkout.currency, "USD");
        assert_eq!(response.checkout.estimated_delivery, response.quote.delivery.latest);
        assert!(response.correlation_id.starts_with("req-"));
    }

    #[tokio::test]
    async fn quote_rejection_carries_code_and_violations() {
        let mut request = reference_request();
        request.input = request.input.with_process("spout-corner").with_process("zipper");

        let error = quote(State(state()), Json(request)).await.expect_err("conflict");

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.body.code, "CONSTRAINT_VIOLATION");
        assert!(error.body.violations.iter().any(|v| v.code == "SPOUT_ZIPPER_CONFLICT"));
        assert!(error.body.error.contains("could not be quoted"));
        assert!(error.body.correlation_id.starts_with("req-"));
    }

    #[tokio::test]
    async fn unknown_material_is_a_bad_request_without_violations() {
        let mut request = reference_request();
        request.input.material = MaterialId::new("vellum");

        let error = quote(State(state()), Json(request)).await.expect_err("unknown material");

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.body.code, "UNKNOWN_MATERIAL");
        assert!(error.body.violations.is_empty());
    }

    #[tokio::test]
    async fn oversized_quote_is_a_bad_request() {
        let request = QuoteRequest {
            input: QuoteInput::new("stand-up", "custom", "pet-pe", u32::MAX, u32::MAX)
                .with_custom_dimensions(u32::MAX, u32::MAX, Some(u32::MAX)),
            today: NaiveDate::from_ymd_opt(2024, 5, 6),
        };

        let error = quote(State(state()), Json(request)).await.expect_err("overflow");

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.body.code, "PRICE_OVERFLOW");
    }

    #[tokio::test]
    async fn catalog_exposes_families_rules_and_display_rate() {
        let Json(response) = catalog(State(state())).await;

        assert!(!response.catalog.bag_types.is_empty());
        assert!(response.rules.groups.iter().any(|group| group.code == "zipper"));
        assert_eq!(response.display_cny_rate, Decimal::new(72, 1));
    }

    #[tokio::test]
    async fn select_add_applies_the_clear_set() {
        let request = SelectRequest {
            selection: selection(&["zipper", "valve"]),
            action: SelectAction::Add { process: ProcessId::new("spout-corner") },
        };

        let Json(response) = select(State(state()), Json(request)).await.expect("select");

        assert_eq!(
            response.selection.processes,
            BTreeSet::from([ProcessId::new("spout-corner")])
        );
        assert!(response.disabled_options.contains(&ProcessId::new("tin-tie")));
        assert!(!response.available_materials.contains(&MaterialId::new("kraft-pe")));
    }

    #[tokio::test]
    async fn select_blocked_option_is_unprocessable() {
        let mut current = selection(&[]);
        current.material = MaterialId::new("kraft-pe");
        let request = SelectRequest {
            selection: current,
            action: SelectAction::Add { process: ProcessId::new("spot-uv") },
        };

        let error = select(State(state()), Json(request)).await.expect_err("blocked");

        assert_eq!(error.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error.body.code, "SELECTION_REJECTED");
        assert_eq!(error.body.violations.len(), 1);
    }

    #[tokio::test]
    async fn select_normalizes_a_conflicting_incoming_selection() {
        let state = state();
        let mut current = selection(&["spout-corner", "zipper"]);
        current.material = MaterialId::new("kraft-pe");
        let request = SelectRequest {
            selection: current,
            action: SelectAction::Add { process: ProcessId::new("tear-notch") },
        };

        let Json(response) = select(State(state.clone()), Json(request)).await.expect("select");

        assert_eq!(
            response.selection.processes,
            BTreeSet::from([ProcessId::new("tear-notch"), ProcessId::new("zipper")])
        );
        assert_ne!(response.selection.material, MaterialId::new("kraft-pe"));

        let input = QuoteInput {
            processes: response.selection.processes.clone(),
            ..QuoteInput::new(
                response.selection.bag_type.as_str(),
                "md",
                response.selection.material.as_str(),
                1_000,
                1,
            )
        };
        let quoted = quote(
            State(state),
            Json(QuoteRequest { input, today: NaiveDate::from_ymd_opt(2024, 5, 6) }),
        )
        .await;
        assert!(quoted.is_ok(), "normalized selection should be quotable");
    }

    #[tokio::test]
    async fn select_rejects_an_incoming_option_the_material_blocks() {
        let mut current = selection(&["gloss-lamination", "spout-corner", "tin-tie", "zipper"]);
        current.material = MaterialId::new("kraft-pe");
        let request = SelectRequest {
            selection: current,
            action: SelectAction::Add { process: ProcessId::new("tear-notch") },
        };

        let error = select(State(state()), Json(request)).await.expect_err("blocked");

        assert_eq!(error.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error.body.violations[0].code, "KRAFT_FINISH");
    }

    #[tokio::test]
    async fn reload_is_hidden_without_admin_token() {
        let error = reload_catalog(State(state()), bearer(ADMIN_TOKEN))
            .await
            .expect_err("no admin token configured");

        assert_eq!(error.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn reload_refuses_wrong_token() {
        let error = reload_catalog(State(admin_state()), bearer("wrong-token-wrong-token"))
            .await
            .expect_err("wrong token");
        assert_eq!(error.status, StatusCode::UNAUTHORIZED);

        let error = reload_catalog(State(admin_state()), HeaderMap::new())
            .await
            .expect_err("missing header");
        assert_eq!(error.status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn reload_rebuilds_the_engine() {
        let state = admin_state();
        let before = state.engine();

        let Json(response) =
            reload_catalog(State(state.clone()), bearer(ADMIN_TOKEN)).await.expect("reload");

        assert_eq!(response.status, "reloaded");
        assert_eq!(response.bag_types, before.catalog().bag_types().len());
        assert!(!Arc::ptr_eq(&before, &state.engine()));
    }

    #[tokio::test]
    async fn rejected_reload_keeps_the_previous_engine() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.toml");
        std::fs::write(&path, include_str!("../../core/tests/fixtures/mini_catalog.toml"))
            .expect("write catalog");

        let mut config = AppConfig::default();
        config.server.admin_token = Some(SecretString::from(ADMIN_TOKEN.to_string()));
        config.catalog.path = Some(path);
        let state = state_with(config);
        let before = state.engine();

        let error = reload_catalog(State(state.clone()), bearer(ADMIN_TOKEN))
            .await
            .expect_err("standard rules reference ids missing from the fixture");

        assert_eq!(error.status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(error.body.code, "CATALOG_INVALID");
        assert!(Arc::ptr_eq(&before, &state.engine()));
    }

    #[tokio::test]
    async fn router_serves_quote_json_over_http() {
        let body = r#"{
            "bag_type": "stand-up",
            "bag_size": "md",
            "material": "pet-pe",
            "processes": ["digital"],
            "quantity": 150,
            "print_colors": 2,
            "today": "2024-05-06"
        }"#;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/quote")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("request");

        let response = router(state()).oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload["quote"]["printing_method"], "digital");
        assert_eq!(payload["quote"]["moq_met"], true);
        assert_eq!(payload["quote"]["delivery"]["earliest"], "2024-05-13");
    }

    #[tokio::test]
    async fn router_maps_select_rejection_to_json_error() {
        let body = r#"{
            "selection": {"bag_type": "stand-up", "material": "pet-pe"},
            "action": "group",
            "group": "zipper",
            "option": "valve"
        }"#;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/configurator/select")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("request");

        let response = router(state()).oneshot(request).await.expect("response");
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload: Value = serde_json::from_slice(&bytes).expect("json");
        assert_eq!(payload["code"], "SELECTION_REJECTED");
    }
}
