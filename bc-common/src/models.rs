//! Blind Check form document
//!
//! One document per contract, keyed by contract number. Field names on the
//! wire are camelCase; every nested section defaults when absent so partially
//! filled forms still load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::grid::GridPosition;
use crate::matching::{MatchOutcome, MatchPolicy};
use crate::{Error, Result};

/// Longest contract number accepted as a document key
pub const MAX_CONTRACT_NUMBER_LEN: usize = 64;

/// Largest absolute marker coordinate accepted on save
pub const MAX_COORDINATE: i32 = 100_000;

/// Blind check form document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlindCheckForm {
    /// Unique contract number (document id and partition key)
    pub contract_number: String,
    #[serde(default)]
    pub form_metadata: FormMetadata,
    #[serde(default)]
    pub case_info: CaseInfo,
    #[serde(default)]
    pub arrangement_counselor: ArrangementCounselor,
    #[serde(default)]
    pub location_details: LocationDetails,
    #[serde(default)]
    pub administration: Administration,
    #[serde(default)]
    pub blind_check_verification: BlindCheckVerification,
    #[serde(default)]
    pub memorial_blind_check: MemorialBlindCheck,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormMetadata {
    pub form_version: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CaseInfo {
    pub case_type: Option<String>,
    pub cemetery_name: Option<String>,
    pub interment_date: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ArrangementCounselor {
    pub counselor_name: String,
    pub conference_date: Option<String>,
    pub decedent_name: DecedentName,
    pub interment_service: IntermentService,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DecedentName {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
}

impl DecedentName {
    /// Name parts joined by single spaces, blank parts skipped
    pub fn full_name(&self) -> String {
        [
            self.first_name.as_str(),
            self.middle_name.as_deref().unwrap_or(""),
            self.last_name.as_str(),
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IntermentService {
    pub service_type: Option<String>,
    pub service_date: Option<String>,
}

/// Physical location of the interment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationDetails {
    pub section: String,
    pub block: String,
    pub lot: String,
    pub building: String,
    pub tier_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Administration {
    pub admin_name: String,
    pub date_time_received: Option<DateTime<Utc>>,
    pub assigned_to: String,
}

/// Form-level verification record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlindCheckVerification {
    pub is_verified: bool,
    /// Field worker who signed off the check
    pub verified_by: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MemorialBlindCheck {
    pub marker_placements: Vec<MarkerPlacement>,
    pub verifications: Verifications,
    pub associate_signature: Option<AssociateSignature>,
}

/// One grid cell: coordinate plus the expected inscription
///
/// `x` is the column and `y` the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerPlacement {
    pub x: i32,
    pub y: i32,
    pub inscription: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<MarkerVerification>,
}

impl MarkerPlacement {
    pub fn new(x: i32, y: i32, inscription: impl Into<String>) -> Self {
        Self {
            x,
            y,
            inscription: inscription.into(),
            verification: None,
        }
    }

    pub fn position(&self) -> GridPosition {
        GridPosition::new(self.y, self.x)
    }

    pub fn is_verified(&self) -> bool {
        self.verification.as_ref().is_some_and(|v| v.is_verified)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMethod {
    Scan,
    Manual,
}

/// Verification state of a single marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkerVerification {
    pub is_verified: bool,
    pub method: VerificationMethod,
    #[serde(default)]
    pub scanned_text: Option<String>,
    /// Similarity score of the scan that produced this record
    #[serde(default)]
    pub match_score: Option<f64>,
    #[serde(default)]
    pub notes: Option<String>,
    pub verified_at: DateTime<Utc>,
}

impl MarkerVerification {
    /// Checkbox-style verification by the field worker
    pub fn manual(
        is_verified: bool,
        notes: Option<String>,
        scanned_text: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            is_verified,
            method: VerificationMethod::Manual,
            scanned_text,
            match_score: None,
            notes,
            verified_at: now,
        }
    }

    /// Verification derived from a scan outcome
    pub fn from_scan(outcome: &MatchOutcome, scanned_text: &str, now: DateTime<Utc>) -> Self {
        Self {
            is_verified: outcome.matched,
            method: VerificationMethod::Scan,
            scanned_text: Some(scanned_text.to_string()),
            match_score: Some(outcome.score),
            notes: None,
            verified_at: now,
        }
    }
}

/// Checklist completed alongside the grid
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Verifications {
    pub agrees_with_adjacent_interments: VerificationItem,
    pub agrees_with_numbered_pins: VerificationItem,
    pub agrees_with_permanent_records: VerificationItem,
    pub agrees_with_interment_order: VerificationItem,
    pub agrees_with_disinterment_order: VerificationItem,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct VerificationItem {
    pub agrees: Option<bool>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssociateSignature {
    pub name: String,
    pub signature_base64: String,
    pub date: String,
}

/// Request to set the form-level verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerificationUpdate {
    pub is_verified: bool,
    #[serde(default)]
    pub verified_by: Option<String>,
}

/// Audit record of one scan attempt against a marker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanRecord {
    pub guid: Uuid,
    pub contract_number: String,
    pub x: i32,
    pub y: i32,
    pub expected: String,
    pub scanned_text: String,
    pub score: f64,
    pub matched: bool,
    pub policy: MatchPolicy,
    pub scanned_at: DateTime<Utc>,
}

impl ScanRecord {
    pub fn new(
        contract_number: &str,
        placement: &MarkerPlacement,
        scanned_text: &str,
        outcome: &MatchOutcome,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            guid: Uuid::new_v4(),
            contract_number: contract_number.to_string(),
            x: placement.x,
            y: placement.y,
            expected: placement.inscription.clone(),
            scanned_text: scanned_text.to_string(),
            score: outcome.score,
            matched: outcome.matched,
            policy: outcome.policy,
            scanned_at: now,
        }
    }
}

/// Check that a contract number is usable as a document key and file name
pub fn validate_contract_number(contract_number: &str) -> Result<()> {
    let trimmed = contract_number.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidInput("contract number must not be blank".to_string()));
    }
    if trimmed != contract_number {
        return Err(Error::InvalidInput(format!(
            "contract number '{}' has surrounding whitespace",
            contract_number
        )));
    }
    if contract_number.len() > MAX_CONTRACT_NUMBER_LEN {
        return Err(Error::InvalidInput(format!(
            "contract number longer than {} characters",
            MAX_CONTRACT_NUMBER_LEN
        )));
    }
    if contract_number == "." || contract_number == ".." {
        return Err(Error::InvalidInput(format!(
            "invalid contract number '{}'",
            contract_number
        )));
    }
    if contract_number
        .chars()
        .any(|c| c == '/' || c == '\\' || c.is_control())
    {
        return Err(Error::InvalidInput(format!(
            "contract number '{}' contains forbidden characters",
            contract_number
        )));
    }
    Ok(())
}

impl BlindCheckForm {
    /// Empty form for a contract
    pub fn new(contract_number: impl Into<String>) -> Self {
        Self {
            contract_number: contract_number.into(),
            form_metadata: FormMetadata::default(),
            case_info: CaseInfo::default(),
            arrangement_counselor: ArrangementCounselor::default(),
            location_details: LocationDetails::default(),
            administration: Administration::default(),
            blind_check_verification: BlindCheckVerification::default(),
            memorial_blind_check: MemorialBlindCheck::default(),
        }
    }

    pub fn placements(&self) -> &[MarkerPlacement] {
        &self.memorial_blind_check.marker_placements
    }

    pub fn placement(&self, x: i32, y: i32) -> Option<&MarkerPlacement> {
        self.placements().iter().find(|p| p.x == x && p.y == y)
    }

    pub fn placement_mut(&mut self, x: i32, y: i32) -> Option<&mut MarkerPlacement> {
        self.memorial_blind_check
            .marker_placements
            .iter_mut()
            .find(|p| p.x == x && p.y == y)
    }

    pub fn is_verified(&self) -> bool {
        self.blind_check_verification.is_verified
    }

    pub fn verified_marker_count(&self) -> usize {
        self.placements().iter().filter(|p| p.is_verified()).count()
    }

    /// Display name of the decedent
    ///
    /// Falls back to the first inscription up to its first `-`, then "Unknown".
    pub fn decedent_name(&self) -> String {
        let full = self.arrangement_counselor.decedent_name.full_name();
        if !full.is_empty() {
            return full;
        }

        self.placements()
            .first()
            .and_then(|p| p.inscription.split('-').next())
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| "Unknown".to_string())
    }

    /// Centre of the marker diagram (midpoint of the placements' bounding box)
    pub fn center(&self) -> GridPosition {
        match bounding_box(self.placements()) {
            // Midpoint of two i32 values always fits back into i32
            Some((min_x, max_x, min_y, max_y)) => GridPosition::new(
                (min_y + max_y).div_euclid(2) as i32,
                (min_x + max_x).div_euclid(2) as i32,
            ),
            None => GridPosition::new(1, 1),
        }
    }

    /// Structural checks applied before a form is stored
    pub fn validate(&self) -> Result<()> {
        validate_contract_number(&self.contract_number)?;

        let mut seen = BTreeSet::new();
        for placement in self.placements() {
            if placement.x.unsigned_abs() > MAX_COORDINATE.unsigned_abs()
                || placement.y.unsigned_abs() > MAX_COORDINATE.unsigned_abs()
            {
                return Err(Error::InvalidInput(format!(
                    "marker placement ({}, {}) is outside -{max}..={max}",
                    placement.x,
                    placement.y,
                    max = MAX_COORDINATE
                )));
            }
            if !seen.insert((placement.x, placement.y)) {
                return Err(Error::InvalidInput(format!(
                    "duplicate marker placement at ({}, {})",
                    placement.x, placement.y
                )));
            }
        }

        if let Some((min_x, max_x, min_y, max_y)) = bounding_box(self.placements()) {
            if max_x - min_x > 2 || max_y - min_y > 2 {
                return Err(Error::InvalidInput(format!(
                    "marker placements span {}x{} cells, expected at most 3x3",
                    max_x - min_x + 1,
                    max_y - min_y + 1
                )));
            }
        }

        Ok(())
    }

    pub fn apply_verification(&mut self, update: &VerificationUpdate, now: DateTime<Utc>) {
        let record = &mut self.blind_check_verification;
        record.is_verified = update.is_verified;
        record.verified_by = update.verified_by.clone();
        record.verified_at = Some(now);
    }

    /// Replace the verification of the marker at `(x, y)`
    pub fn apply_marker_verification(
        &mut self,
        x: i32,
        y: i32,
        verification: MarkerVerification,
    ) -> Result<()> {
        let contract_number = self.contract_number.clone();
        let placement = self.placement_mut(x, y).ok_or_else(|| {
            Error::NotFound(format!(
                "No marker at ({}, {}) on contract '{}'",
                x, y, contract_number
            ))
        })?;
        placement.verification = Some(verification);
        Ok(())
    }
}

/// `(min_x, max_x, min_y, max_y)` over all placements
/// `(min_x, max_x, min_y, max_y)`, widened so spans and sums cannot overflow
fn bounding_box(placements: &[MarkerPlacement]) -> Option<(i64, i64, i64, i64)> {
    let first = placements.first()?;
    let (x, y) = (i64::from(first.x), i64::from(first.y));
    Some(placements.iter().fold(
        (x, x, y, y),
        |(min_x, max_x, min_y, max_y), p| {
            let (x, y) = (i64::from(p.x), i64::from(p.y));
            (min_x.min(x), max_x.max(x), min_y.min(y), max_y.max(y))
        },
    ))
}
