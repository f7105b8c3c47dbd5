//! Stateless text match endpoint

use axum::{extract::State, Json};
use bc_common::matching::MatchPolicy;
use bc_common::MatchOutcome;
use serde::Deserialize;

use super::ApiJson;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRequest {
    pub expected: String,
    pub scanned: String,
    #[serde(default)]
    pub policy: Option<MatchPolicy>,
}

/// POST /api/match
pub async fn match_text(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<MatchRequest>,
) -> Json<MatchOutcome> {
    let matcher = request
        .policy
        .map_or(state.matcher, |policy| state.matcher.with_policy(policy));

    Json(matcher.evaluate(&request.expected, &request.scanned))
}
