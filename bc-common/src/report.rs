//! Validation report export
//!
//! Plain-text report for printing and a JSON export for archival.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::matching::ValidationStatus;
use crate::models::{BlindCheckForm, MarkerPlacement, VerificationMethod};

/// JSON export of a form's markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormExport {
    pub contract_number: String,
    pub markers: Vec<MarkerPlacement>,
    pub export_date: DateTime<Utc>,
    pub total_markers: usize,
    pub validated_markers: usize,
}

impl FormExport {
    pub fn new(form: &BlindCheckForm, export_date: DateTime<Utc>) -> Self {
        let markers = sorted_markers(form.placements().iter());
        let validated_markers = markers.iter().filter(|m| m.is_verified()).count();

        Self {
            contract_number: form.contract_number.clone(),
            total_markers: markers.len(),
            markers: markers.into_iter().cloned().collect(),
            export_date,
            validated_markers,
        }
    }
}

/// Status and confidence shown for a verified marker
///
/// Manual confirmations count as full confidence.
fn marker_status(marker: &MarkerPlacement) -> (ValidationStatus, f64) {
    match &marker.verification {
        Some(v) => {
            let confidence = match v.method {
                VerificationMethod::Manual => 1.0,
                VerificationMethod::Scan => v.match_score.unwrap_or(0.0),
            };
            (ValidationStatus::classify(v.is_verified, confidence), confidence)
        }
        None => (ValidationStatus::NotScanned, 0.0),
    }
}

fn sorted_markers<'a>(markers: impl Iterator<Item = &'a MarkerPlacement>) -> Vec<&'a MarkerPlacement> {
    let mut markers: Vec<_> = markers.collect();
    markers.sort_by_key(|m| m.position());
    markers
}

/// Render the plain-text validation report
pub fn validation_report(form: &BlindCheckForm, generated_at: DateTime<Utc>) -> String {
    let total = form.placements().len();
    let validated = sorted_markers(form.placements().iter().filter(|m| m.is_verified()));

    let mut lines = vec![
        "Cemetery Blind Check Validation Report".to_string(),
        format!("Contract: {}", form.contract_number),
        format!("Decedent: {}", form.decedent_name()),
        format!("Generated: {}", generated_at.format("%Y-%m-%d %H:%M:%S UTC")),
        "=".repeat(50),
        String::new(),
        format!(
            "Form Status: {}",
            if form.is_verified() { "Verified" } else { "Unverified" }
        ),
    ];
    if let Some(by) = &form.blind_check_verification.verified_by {
        lines.push(format!("Verified By: {}", by));
    }
    lines.push(format!("Validated Markers: {} / {}", validated.len(), total));
    lines.push(String::new());

    for marker in validated {
        lines.extend(marker_lines(marker));
        lines.push(String::new());
    }

    let mut report = lines.join("\n");
    report.push('\n');
    report
}

fn marker_lines(marker: &MarkerPlacement) -> Vec<String> {
    let (status, confidence) = marker_status(marker);
    let mut lines = vec![
        format!("Position: Row {}, Column {}", marker.y, marker.x),
        format!("Inscription: {}", marker.inscription),
        format!("Status: {}", status),
        format!("Confidence: {}%", (confidence * 100.0).round() as i64),
    ];

    if let Some(v) = &marker.verification {
        if let Some(scanned) = v.scanned_text.as_ref().filter(|s| *s != &marker.inscription) {
            lines.push(format!("Scanned: {}", scanned));
        }
        if let Some(notes) = &v.notes {
            lines.push(format!("Notes: {}", notes));
        }
    }
    lines
}
