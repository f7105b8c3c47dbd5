//! Form and marker verification, scan matching and scan history

use axum::{
    extract::State,
    Json,
};
use bc_common::matching::MatchPolicy;
use bc_common::models::{
    validate_contract_number, MarkerPlacement, MarkerVerification, ScanRecord, VerificationUpdate,
};
use bc_common::{BlindCheckForm, MatchOutcome};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::forms::load_form;
use super::{ApiError, ApiJson, ApiPath};
use crate::AppState;

/// POST /api/blind-check-form/:contract_number/verification
pub async fn update_verification(
    State(state): State<AppState>,
    ApiPath(contract_number): ApiPath<String>,
    ApiJson(update): ApiJson<VerificationUpdate>,
) -> Result<Json<BlindCheckForm>, ApiError> {
    validate_contract_number(&contract_number)?;

    if !state
        .store
        .update_verification(&contract_number, &update)
        .await?
    {
        return Err(ApiError::form_not_found(&contract_number));
    }

    Ok(Json(load_form(&state, &contract_number).await?))
}

/// Manual (checkbox) verification of one marker
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerUpdateRequest {
    pub is_verified: bool,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub scanned_text: Option<String>,
}

/// PUT /api/blind-check-form/:contract_number/markers/:x/:y
pub async fn update_marker(
    State(state): State<AppState>,
    ApiPath((contract_number, x, y)): ApiPath<(String, i32, i32)>,
    ApiJson(request): ApiJson<MarkerUpdateRequest>,
) -> Result<Json<MarkerPlacement>, ApiError> {
    validate_contract_number(&contract_number)?;

    let verification = MarkerVerification::manual(
        request.is_verified,
        request.notes,
        request.scanned_text,
        Utc::now(),
    );
    let form = state
        .store
        .update_marker(&contract_number, x, y, verification)
        .await?
        .ok_or_else(|| ApiError::form_not_found(&contract_number))?;

    stored_marker(&form, x, y).map(Json)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRequest {
    pub scanned_text: String,
    /// Overrides the configured policy for this scan
    #[serde(default)]
    pub policy: Option<MatchPolicy>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResponse {
    pub outcome: MatchOutcome,
    pub marker: MarkerPlacement,
}

/// POST /api/blind-check-form/:contract_number/markers/:x/:y/scan
///
/// Every attempt is recorded. A match marks the marker verified; a miss
/// leaves its previous verification in place.
pub async fn scan_marker(
    State(state): State<AppState>,
    ApiPath((contract_number, x, y)): ApiPath<(String, i32, i32)>,
    ApiJson(request): ApiJson<ScanRequest>,
) -> Result<Json<ScanResponse>, ApiError> {
    let form = load_form(&state, &contract_number).await?;
    let placement = form
        .placement(x, y)
        .ok_or_else(|| ApiError::marker_not_found(&contract_number, x, y))?;

    let matcher = match request.policy {
        Some(policy) => state.matcher.with_policy(policy),
        None => state.matcher,
    };
    let outcome = matcher.evaluate(&placement.inscription, &request.scanned_text);
    let now = Utc::now();

    let scan = ScanRecord::new(&contract_number, placement, &request.scanned_text, &outcome, now);
    state.store.record_scan(&scan).await?;

    let marker = if outcome.matched {
        let verification = MarkerVerification::from_scan(&outcome, &request.scanned_text, now);
        let updated = state
            .store
            .update_marker(&contract_number, x, y, verification)
            .await?
            .ok_or_else(|| ApiError::form_not_found(&contract_number))?;
        stored_marker(&updated, x, y)?
    } else {
        placement.clone()
    };

    info!(
        contract_number = %contract_number,
        x,
        y,
        policy = %outcome.policy,
        score = outcome.score,
        matched = outcome.matched,
        "Marker scan evaluated"
    );

    Ok(Json(ScanResponse { outcome, marker }))
}

/// GET /api/blind-check-form/:contract_number/scans
pub async fn list_scans(
    State(state): State<AppState>,
    ApiPath(contract_number): ApiPath<String>,
) -> Result<Json<Vec<ScanRecord>>, ApiError> {
    load_form(&state, &contract_number).await?;
    Ok(Json(state.store.list_scans(&contract_number).await?))
}

fn stored_marker(form: &BlindCheckForm, x: i32, y: i32) -> Result<MarkerPlacement, ApiError> {
    form.placement(x, y).cloned().ok_or_else(|| {
        ApiError::Internal(format!(
            "Marker ({}, {}) missing from stored form '{}'",
            x, y, form.contract_number
        ))
    })
}
