//! Form document stores
//!
//! Two backends share one trait:
//! - [`SqliteStore`]: persistent, writable document store
//! - [`DirectoryStore`]: read-only folder of `<contract>.json` files
//!
//! Documents are keyed by contract number. Upserts are last-writer-wins;
//! read-modify-write updates on the SQLite store run inside a transaction.

use async_trait::async_trait;

use crate::models::{BlindCheckForm, MarkerVerification, ScanRecord, VerificationUpdate};
use crate::Result;

mod directory;
mod sqlite;

pub use directory::DirectoryStore;
pub use sqlite::SqliteStore;

/// Document store for blind check forms
#[async_trait]
pub trait FormStore: Send + Sync {
    /// Short backend name for logs and health output
    fn backend(&self) -> &'static str;

    /// Load one form; `Ok(None)` when no document has this contract number
    async fn get_form(&self, contract_number: &str) -> Result<Option<BlindCheckForm>>;

    /// All forms ordered by contract number
    async fn list_forms(&self) -> Result<Vec<BlindCheckForm>>;

    /// Validate and upsert a form, returning what was stored
    async fn save_form(&self, form: BlindCheckForm) -> Result<BlindCheckForm>;

    /// Set the form-level verification; `Ok(false)` when the form is absent
    async fn update_verification(
        &self,
        contract_number: &str,
        update: &VerificationUpdate,
    ) -> Result<bool>;

    /// Replace one marker's verification
    ///
    /// `Ok(None)` when the form is absent, `Error::NotFound` when the form
    /// has no marker at `(x, y)`.
    async fn update_marker(
        &self,
        contract_number: &str,
        x: i32,
        y: i32,
        verification: MarkerVerification,
    ) -> Result<Option<BlindCheckForm>>;

    /// Append a scan attempt to the audit trail
    async fn record_scan(&self, scan: &ScanRecord) -> Result<()>;

    /// Scan attempts for one contract, oldest first
    async fn list_scans(&self, contract_number: &str) -> Result<Vec<ScanRecord>>;
}
