//! Form lookup, listing and upsert
//!
//! Forms are addressed by contract number. Lookups that find nothing return
//! 404 with the case ID in the message.

use axum::{
    extract::State,
    Json,
};
use bc_common::models::validate_contract_number;
use bc_common::view::{matches_search, BlindCheckFormView, FormSummary, GridView};
use bc_common::BlindCheckForm;
use serde::Deserialize;
use tracing::debug;

use super::{ApiError, ApiJson, ApiPath, ApiQuery};
use crate::AppState;

/// Optional fuzzy filter on contract number or decedent name
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

impl SearchQuery {
    fn apply(&self, forms: Vec<BlindCheckForm>) -> Vec<BlindCheckForm> {
        match self.search.as_deref().map(str::trim) {
            Some(query) if !query.is_empty() => forms
                .into_iter()
                .filter(|form| matches_search(form, query))
                .collect(),
            _ => forms,
        }
    }
}

/// Load a form or fail with the client-facing not-found error
pub(crate) async fn load_form(
    state: &AppState,
    contract_number: &str,
) -> Result<BlindCheckForm, ApiError> {
    validate_contract_number(contract_number)?;

    state
        .store
        .get_form(contract_number)
        .await?
        .ok_or_else(|| ApiError::form_not_found(contract_number))
}

/// GET /api/blind-check-form
pub async fn list_forms(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<BlindCheckForm>>, ApiError> {
    let forms = query.apply(state.store.list_forms().await?);
    debug!(count = forms.len(), search = ?query.search, "Listed blind check forms");
    Ok(Json(forms))
}

/// GET /api/blind-check-summaries
pub async fn list_summaries(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<SearchQuery>,
) -> Result<Json<Vec<FormSummary>>, ApiError> {
    let forms = query.apply(state.store.list_forms().await?);
    Ok(Json(forms.iter().map(FormSummary::from).collect()))
}

/// GET /api/blind-check-form/:contract_number
pub async fn get_form(
    State(state): State<AppState>,
    ApiPath(contract_number): ApiPath<String>,
) -> Result<Json<BlindCheckForm>, ApiError> {
    Ok(Json(load_form(&state, &contract_number).await?))
}

/// PUT /api/blind-check-form/:contract_number
///
/// Creates or replaces the whole document. The body's contract number must
/// match the path.
pub async fn put_form(
    State(state): State<AppState>,
    ApiPath(contract_number): ApiPath<String>,
    ApiJson(form): ApiJson<BlindCheckForm>,
) -> Result<Json<BlindCheckForm>, ApiError> {
    validate_contract_number(&contract_number)?;

    if form.contract_number != contract_number {
        return Err(ApiError::BadRequest(format!(
            "Contract number '{}' in body does not match '{}' in path",
            form.contract_number, contract_number
        )));
    }

    let saved = state.store.save_form(form).await?;
    Ok(Json(saved))
}

/// GET /api/blind-check-form/:contract_number/view
pub async fn get_form_view(
    State(state): State<AppState>,
    ApiPath(contract_number): ApiPath<String>,
) -> Result<Json<BlindCheckFormView>, ApiError> {
    let form = load_form(&state, &contract_number).await?;
    Ok(Json(BlindCheckFormView::from(&form)))
}

/// GET /api/blind-check-form/:contract_number/grid
pub async fn get_form_grid(
    State(state): State<AppState>,
    ApiPath(contract_number): ApiPath<String>,
) -> Result<Json<GridView>, ApiError> {
    let form = load_form(&state, &contract_number).await?;
    Ok(Json(GridView::from(&form)))
}
