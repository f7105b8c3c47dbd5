//! Bulk load of form documents from a folder

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::models::BlindCheckForm;
use crate::store::FormStore;
use crate::{Error, Result};

/// Parse one form document
pub async fn read_form_file(path: &Path) -> Result<BlindCheckForm> {
    let bytes = tokio::fs::read(path).await?;
    serde_json::from_slice(&bytes)
        .map_err(|e| Error::InvalidInput(format!("{}: {}", path.display(), e)))
}

/// `*.json` files directly inside `folder`, sorted by path
pub async fn form_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(folder).await?;
    let mut files = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case("json"));
        if is_json && entry.file_type().await?.is_file() {
            files.push(path);
        }
    }

    files.sort();
    Ok(files)
}

/// Outcome of a seed run
#[derive(Debug, Default, Clone, Serialize)]
pub struct SeedReport {
    pub found: usize,
    pub saved: usize,
    /// One message per file that could not be loaded or stored
    pub errors: Vec<String>,
}

impl SeedReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Save every form file in `folder` into `store`
///
/// Files are independent; a bad file is reported and the run continues.
pub async fn seed_store(store: &dyn FormStore, folder: &Path) -> Result<SeedReport> {
    let files = form_files(folder).await?;
    let mut report = SeedReport {
        found: files.len(),
        ..SeedReport::default()
    };

    info!("Seeding {} form files from {}", files.len(), folder.display());

    for path in files {
        let result = match read_form_file(&path).await {
            Ok(form) => store.save_form(form).await.map(|_| ()),
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => report.saved += 1,
            Err(e) => {
                error!("Failed to seed {}: {}", path.display(), e);
                report.errors.push(format!("{}: {}", path.display(), e));
            }
        }
    }

    info!(
        "Seed complete: {} saved, {} errors",
        report.saved,
        report.errors.len()
    );
    Ok(report)
}
