use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard},
};

use expense_core::{Persistence, PersistenceError};
use expense_domain::{IdentityKey, PersistedRecord};
use tracing::{debug, warn};
use uuid::Uuid;

/// Row store kept in process memory.
///
/// `fail_next` and `fail_after` arm a one-shot failure for a coming write, so
/// hosts and tests can exercise the commit rollback paths.
#[derive(Debug, Default)]
pub struct InMemoryPersistence {
    rows: Mutex<Vec<PersistedRecord>>,
    armed: Mutex<Option<ArmedFailure>>,
}

#[derive(Debug)]
struct ArmedFailure {
    skip: usize,
    message: String,
}

impl InMemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<PersistedRecord>) -> Self {
        Self {
            rows: Mutex::new(records),
            armed: Mutex::new(None),
        }
    }

    /// Makes the next insert or delete fail with `message`.
    pub fn fail_next(&self, message: impl Into<String>) {
        self.fail_after(0, message);
    }

    /// Lets `writes` writes succeed, then fails the one after.
    pub fn fail_after(&self, writes: usize, message: impl Into<String>) {
        if let Ok(mut slot) = self.armed.lock() {
            *slot = Some(ArmedFailure {
                skip: writes,
                message: message.into(),
            });
        }
    }

    pub fn len(&self) -> Result<usize, PersistenceError> {
        Ok(self.rows()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, PersistenceError> {
        Ok(self.len()? == 0)
    }

    pub fn all(&self) -> Result<Vec<PersistedRecord>, PersistenceError> {
        Ok(self.rows()?.clone())
    }

    /// Serializes every stored row as pretty JSON.
    pub fn export_json(&self) -> Result<String, PersistenceError> {
        let rows = self.rows()?;
        serde_json::to_string_pretty(&*rows)
            .map_err(|err| PersistenceError::new(format!("export failed: {}", err)))
    }

    pub fn import_json(data: &str) -> Result<Self, PersistenceError> {
        let rows: Vec<PersistedRecord> = serde_json::from_str(data)
            .map_err(|err| PersistenceError::new(format!("import failed: {}", err)))?;
        Ok(Self::with_records(rows))
    }

    fn rows(&self) -> Result<MutexGuard<'_, Vec<PersistedRecord>>, PersistenceError> {
        self.rows
            .lock()
            .map_err(|_| PersistenceError::new("storage lock poisoned"))
    }

    fn take_failure(&self) -> Result<(), PersistenceError> {
        let mut slot = self
            .armed
            .lock()
            .map_err(|_| PersistenceError::new("storage lock poisoned"))?;
        let Some(armed) = slot.as_mut() else {
            return Ok(());
        };
        if armed.skip > 0 {
            armed.skip -= 1;
            return Ok(());
        }
        let message = slot.take().map(|armed| armed.message).unwrap_or_default();
        warn!(%message, "injected storage failure");
        Err(PersistenceError::new(message))
    }
}

impl Persistence for InMemoryPersistence {
    fn insert(&self, records: Vec<PersistedRecord>) -> Result<(), PersistenceError> {
        self.take_failure()?;
        let mut rows = self.rows()?;
        let existing: HashSet<Uuid> = rows.iter().map(|r| r.id).collect();
        if let Some(dup) = records.iter().find(|r| existing.contains(&r.id)) {
            return Err(PersistenceError::new(format!("duplicate row id {}", dup.id)));
        }
        debug!(rows = records.len(), "inserting rows");
        rows.extend(records);
        Ok(())
    }

    fn delete_by_ids(&self, ids: &[Uuid]) -> Result<(), PersistenceError> {
        self.take_failure()?;
        let mut rows = self.rows()?;
        let before = rows.len();
        rows.retain(|row| !ids.contains(&row.id));
        debug!(removed = before - rows.len(), "deleted rows by id");
        Ok(())
    }

    fn delete_by_identity_key(
        &self,
        parent_id: Uuid,
        key: &IdentityKey,
    ) -> Result<(), PersistenceError> {
        self.take_failure()?;
        let mut rows = self.rows()?;
        let before = rows.len();
        rows.retain(|row| !(row.parent_id == parent_id && &row.identity_key == key));
        debug!(removed = before - rows.len(), key = %key, "deleted group rows");
        Ok(())
    }

    fn query_by_parent(&self, parent_id: Uuid) -> Result<Vec<PersistedRecord>, PersistenceError> {
        Ok(self
            .rows()?
            .iter()
            .filter(|row| row.parent_id == parent_id)
            .cloned()
            .collect())
    }
}
