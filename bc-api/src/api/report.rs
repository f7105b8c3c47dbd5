//! Validation report download

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use bc_common::report::{validation_report, FormExport};
use chrono::Utc;
use serde::Deserialize;

use super::forms::load_form;
use super::{ApiError, ApiPath, ApiQuery};
use crate::AppState;

#[derive(Debug, Default, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub format: ReportFormat,
}

/// GET /api/blind-check-form/:contract_number/report?format=text|json
pub async fn get_report(
    State(state): State<AppState>,
    ApiPath(contract_number): ApiPath<String>,
    ApiQuery(query): ApiQuery<ReportQuery>,
) -> Result<Response, ApiError> {
    let form = load_form(&state, &contract_number).await?;
    let now = Utc::now();

    let response = match query.format {
        ReportFormat::Text => (
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            validation_report(&form, now),
        )
            .into_response(),
        ReportFormat::Json => Json(FormExport::new(&form, now)).into_response(),
    };

    Ok(response)
}
