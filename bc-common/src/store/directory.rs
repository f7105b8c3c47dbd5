//! Read-only store over a folder of `<contract>.json` documents

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::FormStore;
use crate::models::{
    validate_contract_number, BlindCheckForm, MarkerVerification, ScanRecord, VerificationUpdate,
};
use crate::seed::{form_files, read_form_file};
use crate::{Error, Result};

/// Folder of form documents, one file per contract
///
/// File names match contract numbers case-insensitively. Files that fail to
/// parse are logged and skipped when listing.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    folder: PathBuf,
}

impl DirectoryStore {
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    async fn find_file(&self, contract_number: &str) -> Result<Option<PathBuf>> {
        validate_contract_number(contract_number)?;
        let wanted = format!("{}.json", contract_number);

        Ok(form_files(&self.folder).await?.into_iter().find(|path| {
            path.file_name()
                .is_some_and(|name| name.to_string_lossy().eq_ignore_ascii_case(&wanted))
        }))
    }

    /// A stored file that does not parse is a server-side fault
    async fn load_file(&self, path: &Path) -> Result<BlindCheckForm> {
        read_form_file(path).await.map_err(|e| match e {
            Error::InvalidInput(detail) => {
                Error::Internal(format!("Stored form file is corrupt: {}", detail))
            }
            other => other,
        })
    }

    fn read_only(&self, operation: &str) -> Error {
        Error::ReadOnly(format!(
            "Cannot {} in read-only form folder {}",
            operation,
            self.folder.display()
        ))
    }
}

#[async_trait]
impl FormStore for DirectoryStore {
    fn backend(&self) -> &'static str {
        "directory"
    }

    async fn get_form(&self, contract_number: &str) -> Result<Option<BlindCheckForm>> {
        let Some(path) = self.find_file(contract_number).await? else {
            debug!(contract_number, "No form file in {}", self.folder.display());
            return Ok(None);
        };

        self.load_file(&path).await.map(Some)
    }

    async fn list_forms(&self) -> Result<Vec<BlindCheckForm>> {
        let mut forms = Vec::new();
        for path in form_files(&self.folder).await? {
            match read_form_file(&path).await {
                Ok(form) => forms.push(form),
                Err(e) => warn!("Skipping {}: {}", path.display(), e),
            }
        }

        forms.sort_by(|a, b| a.contract_number.cmp(&b.contract_number));
        Ok(forms)
    }

    async fn save_form(&self, _form: BlindCheckForm) -> Result<BlindCheckForm> {
        Err(self.read_only("save form"))
    }

    async fn update_verification(
        &self,
        _contract_number: &str,
        _update: &VerificationUpdate,
    ) -> Result<bool> {
        Err(self.read_only("update verification"))
    }

    async fn update_marker(
        &self,
        _contract_number: &str,
        _x: i32,
        _y: i32,
        _verification: MarkerVerification,
    ) -> Result<Option<BlindCheckForm>> {
        Err(self.read_only("update marker"))
    }

    async fn record_scan(&self, _scan: &ScanRecord) -> Result<()> {
        Err(self.read_only("record scan"))
    }

    async fn list_scans(&self, _contract_number: &str) -> Result<Vec<ScanRecord>> {
        // No history is kept for file-backed forms
        Ok(Vec::new())
    }
}
