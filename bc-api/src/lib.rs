//! bc-api library - Blind Check form service
//!
//! REST endpoints over a [`FormStore`]: form lookup and upsert, marker and
//! form verification, scan matching, and validation reports.

use axum::routing::{get, post, put};
use axum::Router;
use bc_common::{FormStore, TextMatcher};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn FormStore>,
    /// Default matcher; requests may pick another policy
    pub matcher: TextMatcher,
}

impl AppState {
    pub fn new(store: Arc<dyn FormStore>, matcher: TextMatcher) -> Self {
        Self { store, matcher }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    let forms = Router::new()
        .route("/api/blind-check-form", get(api::list_forms))
        .route(
            "/api/blind-check-form/:contract_number",
            get(api::get_form).put(api::put_form),
        )
        .route("/api/blind-check-form/:contract_number/view", get(api::get_form_view))
        .route("/api/blind-check-form/:contract_number/grid", get(api::get_form_grid))
        .route("/api/blind-check-form/:contract_number/report", get(api::get_report))
        .route("/api/blind-check-summaries", get(api::list_summaries));

    let verification = Router::new()
        .route(
            "/api/blind-check-form/:contract_number/verification",
            post(api::update_verification),
        )
        .route(
            "/api/blind-check-form/:contract_number/markers/:x/:y",
            put(api::update_marker),
        )
        .route(
            "/api/blind-check-form/:contract_number/markers/:x/:y/scan",
            post(api::scan_marker),
        )
        .route("/api/blind-check-form/:contract_number/scans", get(api::list_scans))
        .route("/api/match", post(api::match_text));

    Router::new()
        .merge(forms)
        .merge(verification)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
