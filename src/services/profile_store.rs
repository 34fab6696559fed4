//! Caregiver profile store.
//!
//! Owns the `caregivers` table. Every mutation goes through here:
//! - `create` never overwrites a live record
//! - `update` is a read-merge-write under a per-id lock and a write
//!   transaction, so concurrent merges for one id never drop each other's
//!   additions and an abandoned call commits nothing
//! - reads take no lock

use sqlx::SqlitePool;
use thiserror::Error;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

use super::caregiver_row::{select_caregivers, CaregiverRow, INSERT_CAREGIVER, UPDATE_CAREGIVER};
use super::keyed_lock::KeyedLocks;
use crate::db;
use crate::domain::{now, validate_id, Caregiver, CaregiverUpdate, ValidationError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("caregiver '{0}' not found")]
    NotFound(String),

    #[error("caregiver '{0}' already exists")]
    AlreadyExists(String),

    #[error("caregiver '{id}' has an unreadable {field} column: {reason}")]
    MalformedPersistedState {
        id: String,
        field: &'static str,
        reason: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(#[from] ValidationError),

    #[error("failed to encode caregiver: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("persistence unavailable: {0}")]
    PersistenceUnavailable(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub struct ProfileStore {
    pool: SqlitePool,
    locks: KeyedLocks,
}

impl ProfileStore {
    /// Wraps a pool whose schema is already migrated (see `db::connect`)
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            locks: KeyedLocks::new(),
        }
    }

    /// Create a blank profile, generating a UUID when no id is given
    #[instrument(skip(self))]
    pub async fn create(&self, id: Option<String>) -> StoreResult<Caregiver> {
        let id = match id {
            Some(id) => {
                validate_id(&id)?;
                id
            }
            None => Uuid::new_v4().to_string(),
        };

        let caregiver = Caregiver::new(id, now());
        let row = CaregiverRow::encode(&caregiver)?;

        let result = row
            .bind_mutable(sqlx::query(INSERT_CAREGIVER))
            .bind(row.id.as_str())
            .bind(row.created_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::AlreadyExists(caregiver.id));
        }

        info!(caregiver_id = %caregiver.id, "Caregiver created");
        Ok(caregiver)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> StoreResult<Option<Caregiver>> {
        let row = sqlx::query_as::<_, CaregiverRow>(select_caregivers!("WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(CaregiverRow::decode).transpose()
    }

    /// Fetch the profile for `id`, creating it first if it does not exist
    #[instrument(skip(self))]
    pub async fn get_or_create(&self, id: &str) -> StoreResult<Caregiver> {
        if let Some(caregiver) = self.get_by_id(id).await? {
            return Ok(caregiver);
        }

        match self.create(Some(id.to_string())).await {
            // Lost a creation race; the winner's record is the one to return
            Err(StoreError::AlreadyExists(_)) => self
                .get_by_id(id)
                .await?
                .ok_or_else(|| StoreError::NotFound(id.to_string())),
            result => result,
        }
    }

    /// Merge `update` into the stored profile and return the new snapshot
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: &str, update: CaregiverUpdate) -> StoreResult<Caregiver> {
        let _guard = self.locks.lock(id).await;
        let mut tx = self.pool.begin().await?;

        // Take SQLite's write lock before reading so the snapshot we merge
        // into cannot be overtaken by another connection.
        let claimed = sqlx::query("UPDATE caregivers SET updated_at = updated_at WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if claimed.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let mut caregiver = sqlx::query_as::<_, CaregiverRow>(select_caregivers!("WHERE id = ?"))
            .bind(id)
            .fetch_one(&mut *tx)
            .await?
            .decode()?;

        caregiver.apply_update(update);
        caregiver
            .touch(now())
            .map_err(|e| StoreError::MalformedPersistedState {
                id: id.to_string(),
                field: "updated_at",
                reason: e.to_string(),
            })?;

        let row = CaregiverRow::encode(&caregiver)?;
        row.bind_mutable(sqlx::query(UPDATE_CAREGIVER))
            .bind(row.id.as_str())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        debug!(
            caregiver_id = %caregiver.id,
            updated_at = %caregiver.updated_at,
            "Caregiver updated"
        );
        Ok(caregiver)
    }

    /// Remove a profile; `false` when there was nothing to remove
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM caregivers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        let deleted = result.rows_affected() > 0;
        if deleted {
            info!(caregiver_id = %id, "Caregiver deleted");
        }
        Ok(deleted)
    }

    /// Every readable profile, oldest first.
    ///
    /// A row that fails to decode is logged and left out; reading it by id
    /// still reports `MalformedPersistedState`.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> StoreResult<Vec<Caregiver>> {
        let rows = sqlx::query_as::<_, CaregiverRow>(select_caregivers!("ORDER BY created_at, id"))
            .fetch_all(&self.pool)
            .await?;

        let mut caregivers = Vec::with_capacity(rows.len());
        for row in rows {
            match row.decode() {
                Ok(caregiver) => caregivers.push(caregiver),
                Err(e) => error!(error = %e, "Skipping unreadable caregiver record"),
            }
        }
        Ok(caregivers)
    }

    pub async fn health_check(&self) -> bool {
        db::health_check(&self.pool).await
    }

    /// Close the underlying pool; called once on shutdown
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Profile store closed");
    }
}
