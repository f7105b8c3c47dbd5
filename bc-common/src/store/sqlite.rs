//! SQLite-backed document store

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};
use uuid::Uuid;

use super::FormStore;
use crate::db::{retry_on_lock, DEFAULT_MAX_LOCK_WAIT_MS};
use crate::models::{BlindCheckForm, MarkerVerification, ScanRecord, VerificationUpdate};
use crate::{Error, Result};

/// Forms stored as JSON documents, one row per contract
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    /// Serializes read-modify-write updates within this process
    write_gate: Arc<Mutex<()>>,
}

impl SqliteStore {
    /// Wrap a pool prepared by [`crate::db::init_database`]
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_gate: Arc::new(Mutex::new(())),
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn count_forms(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM blind_check_forms")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn apply_verification_once(
        &self,
        contract_number: &str,
        update: &VerificationUpdate,
    ) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let Some(mut form) = load_document(&mut tx, contract_number).await? else {
            return Ok(false);
        };

        form.apply_verification(update, Utc::now());
        upsert_document(&mut tx, &form).await?;
        tx.commit().await?;
        Ok(true)
    }

    async fn apply_marker_once(
        &self,
        contract_number: &str,
        x: i32,
        y: i32,
        verification: MarkerVerification,
    ) -> Result<Option<BlindCheckForm>> {
        let mut tx = self.pool.begin().await?;

        let Some(mut form) = load_document(&mut tx, contract_number).await? else {
            return Ok(None);
        };

        form.apply_marker_verification(x, y, verification)?;
        upsert_document(&mut tx, &form).await?;
        tx.commit().await?;
        Ok(Some(form))
    }
}

fn parse_document(contract_number: &str, document: &str) -> Result<BlindCheckForm> {
    serde_json::from_str(document).map_err(|e| {
        Error::Internal(format!(
            "Stored document for contract '{}' is corrupt: {}",
            contract_number, e
        ))
    })
}

async fn load_document(
    conn: &mut SqliteConnection,
    contract_number: &str,
) -> Result<Option<BlindCheckForm>> {
    let document: Option<String> =
        sqlx::query_scalar("SELECT document FROM blind_check_forms WHERE contract_number = ?")
            .bind(contract_number)
            .fetch_optional(&mut *conn)
            .await?;

    document
        .map(|doc| parse_document(contract_number, &doc))
        .transpose()
}

async fn upsert_document(conn: &mut SqliteConnection, form: &BlindCheckForm) -> Result<()> {
    let document = serde_json::to_string(form)?;

    sqlx::query(
        r#"
        INSERT INTO blind_check_forms (contract_number, document, is_verified, created_at, updated_at)
        VALUES (?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        ON CONFLICT(contract_number) DO UPDATE SET
            document = excluded.document,
            is_verified = excluded.is_verified,
            updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(&form.contract_number)
    .bind(document)
    .bind(form.is_verified())
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[async_trait]
impl FormStore for SqliteStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn get_form(&self, contract_number: &str) -> Result<Option<BlindCheckForm>> {
        let mut conn = self.pool.acquire().await?;
        let form = load_document(&mut conn, contract_number).await?;

        if form.is_none() {
            debug!(contract_number, "Blind check form not found in database");
        }
        Ok(form)
    }

    async fn list_forms(&self) -> Result<Vec<BlindCheckForm>> {
        let rows = sqlx::query(
            "SELECT contract_number, document FROM blind_check_forms ORDER BY contract_number",
        )
        .fetch_all(&self.pool)
        .await?;

        let mut forms = Vec::with_capacity(rows.len());
        for row in rows {
            let contract_number: String = row.get("contract_number");
            let document: String = row.get("document");
            match parse_document(&contract_number, &document) {
                Ok(form) => forms.push(form),
                Err(e) => error!(contract_number = %contract_number, "Skipping form: {}", e),
            }
        }

        Ok(forms)
    }

    async fn save_form(&self, form: BlindCheckForm) -> Result<BlindCheckForm> {
        form.validate()?;

        let mut conn = self.pool.acquire().await?;
        upsert_document(&mut conn, &form).await?;

        info!(contract_number = %form.contract_number, "Saved blind check form");
        Ok(form)
    }

    async fn update_verification(
        &self,
        contract_number: &str,
        update: &VerificationUpdate,
    ) -> Result<bool> {
        let _gate = self.write_gate.lock().await;
        let updated = retry_on_lock("update verification", DEFAULT_MAX_LOCK_WAIT_MS, || {
            self.apply_verification_once(contract_number, update)
        })
        .await?;

        if !updated {
            debug!(contract_number, "Verification update for unknown form");
            return Ok(false);
        }

        info!(
            contract_number,
            is_verified = update.is_verified,
            verified_by = ?update.verified_by,
            "Updated blind check verification"
        );
        Ok(true)
    }

    async fn update_marker(
        &self,
        contract_number: &str,
        x: i32,
        y: i32,
        verification: MarkerVerification,
    ) -> Result<Option<BlindCheckForm>> {
        let is_verified = verification.is_verified;

        let _gate = self.write_gate.lock().await;
        let form = retry_on_lock("update marker", DEFAULT_MAX_LOCK_WAIT_MS, || {
            self.apply_marker_once(contract_number, x, y, verification.clone())
        })
        .await?;

        if form.is_some() {
            info!(contract_number, x, y, is_verified, "Updated marker verification");
        }
        Ok(form)
    }

    async fn record_scan(&self, scan: &ScanRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO marker_scans
                (guid, contract_number, x, y, expected, scanned_text, score, matched, policy, scanned_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(scan.guid.to_string())
        .bind(&scan.contract_number)
        .bind(scan.x)
        .bind(scan.y)
        .bind(&scan.expected)
        .bind(&scan.scanned_text)
        .bind(scan.score)
        .bind(scan.matched)
        .bind(scan.policy.to_string())
        .bind(scan.scanned_at.to_rfc3339_opts(SecondsFormat::Micros, true))
        .execute(&self.pool)
        .await?;

        debug!(guid = %scan.guid, contract_number = %scan.contract_number, "Recorded marker scan");
        Ok(())
    }

    async fn list_scans(&self, contract_number: &str) -> Result<Vec<ScanRecord>> {
        let rows = sqlx::query(
            r#"
            SELECT guid, contract_number, x, y, expected, scanned_text, score, matched, policy, scanned_at
            FROM marker_scans
            WHERE contract_number = ?
            ORDER BY scanned_at, rowid
            "#,
        )
        .bind(contract_number)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> Result<ScanRecord> {
                let guid_str: String = row.get("guid");
                let guid = Uuid::parse_str(&guid_str)
                    .map_err(|e| Error::Internal(format!("Invalid UUID in database: {}", e)))?;

                let scanned_at_str: String = row.get("scanned_at");
                let scanned_at = DateTime::parse_from_rfc3339(&scanned_at_str)
                    .map_err(|e| Error::Internal(format!("Invalid timestamp in database: {}", e)))?
                    .with_timezone(&Utc);

                let policy_str: String = row.get("policy");

                Ok(ScanRecord {
                    guid,
                    contract_number: row.get("contract_number"),
                    x: row.get("x"),
                    y: row.get("y"),
                    expected: row.get("expected"),
                    scanned_text: row.get("scanned_text"),
                    score: row.get("score"),
                    matched: row.get("matched"),
                    policy: policy_str.parse()?,
                    scanned_at,
                })
            })
            .collect()
    }
}
