//! Client-facing projections of the form document

use serde::{Deserialize, Serialize};

use crate::grid::{GridPosition, MarkerGrid};
use crate::matching::fuzzy_subsequence;
use crate::models::BlindCheckForm;

/// Lean view of a form: contract number plus its diagram
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlindCheckFormView {
    pub contract_number: String,
    pub diagram: Vec<MarkerPlacementView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPlacementView {
    pub x: i32,
    pub y: i32,
    pub inscription: String,
}

impl From<&BlindCheckForm> for BlindCheckFormView {
    fn from(form: &BlindCheckForm) -> Self {
        Self {
            contract_number: form.contract_number.clone(),
            diagram: form
                .placements()
                .iter()
                .map(|p| MarkerPlacementView {
                    x: p.x,
                    y: p.y,
                    inscription: p.inscription.clone(),
                })
                .collect(),
        }
    }
}

/// One row of the form list
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSummary {
    pub contract_number: String,
    pub decedent_name: String,
    pub is_verified: bool,
    pub verified_markers: usize,
    pub total_markers: usize,
}

impl From<&BlindCheckForm> for FormSummary {
    fn from(form: &BlindCheckForm) -> Self {
        Self {
            contract_number: form.contract_number.clone(),
            decedent_name: form.decedent_name(),
            is_verified: form.is_verified(),
            verified_markers: form.verified_marker_count(),
            total_markers: form.placements().len(),
        }
    }
}

/// True when the search query fuzzily matches the contract number or decedent
pub fn matches_search(form: &BlindCheckForm, query: &str) -> bool {
    fuzzy_subsequence(query, &form.contract_number)
        || fuzzy_subsequence(query, &form.decedent_name())
}

/// The 3x3 grid as shown to the field worker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridView {
    pub contract_number: String,
    pub decedent_name: String,
    pub is_verified: bool,
    pub center: GridPosition,
    pub cells: Vec<GridCellView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridCellView {
    pub row: i32,
    pub column: i32,
    /// 1-based "(row, column)" label within the 3x3 window
    pub label: String,
    /// Position relative to the centre
    pub relation: String,
    pub inscription: Option<String>,
    pub is_verified: bool,
}

impl From<&BlindCheckForm> for GridView {
    fn from(form: &BlindCheckForm) -> Self {
        let center = form.center();
        let grid = MarkerGrid::around(center, form.placements());

        let cells = grid
            .cells()
            .into_iter()
            .enumerate()
            .map(|(index, (position, marker))| GridCellView {
                row: position.row,
                column: position.column,
                label: format!("({}, {})", index / 3 + 1, index % 3 + 1),
                relation: position.relation_to(&center),
                inscription: marker.map(|m| m.inscription.clone()),
                is_verified: marker.is_some_and(|m| m.is_verified()),
            })
            .collect();

        Self {
            contract_number: form.contract_number.clone(),
            decedent_name: form.decedent_name(),
            is_verified: form.is_verified(),
            center,
            cells,
        }
    }
}
