//! Hands staged entries to the persistence collaborator.

use expense_domain::{FormSnapshot, IdentityKey, PersistedRecord, RemainderPolicy, StagedEntry};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    allocation::{AllocationSplitter, RecordTarget},
    collaborators::Persistence,
    consolidation::ConsolidationGrouper,
    error::{CoreError, CoreResult, PersistenceError},
    staging::{SnapshotComparator, StagingArea},
};

/// Outcome of a successful commit.
#[derive(Debug, Clone)]
pub struct CommitReceipt {
    pub inserted: Vec<Uuid>,
    /// Rows removed because the commit replaced an edited group.
    pub replaced: Vec<Uuid>,
    /// Entries whose ownership moved out of the staging area.
    pub entries: Vec<StagedEntry>,
}

/// Drives decomposition and the single outstanding persistence request.
pub struct CommitCoordinator<P> {
    persistence: P,
    policy: RemainderPolicy,
}

impl<P: Persistence> CommitCoordinator<P> {
    pub fn new(persistence: P, policy: RemainderPolicy) -> Self {
        Self {
            persistence,
            policy,
        }
    }

    pub fn persistence(&self) -> &P {
        &self.persistence
    }

    pub fn policy(&self) -> RemainderPolicy {
        self.policy
    }

    /// Decomposes every staged entry and persists the rows under `parent_id`.
    ///
    /// Refused while dirty against `live`, while another commit is in flight,
    /// or when an entry breaks the bucket invariants. In edit mode the rows of
    /// the edited group are replaced. Any failure leaves the staging area as
    /// it was.
    pub fn commit<C: SnapshotComparator>(
        &self,
        staging: &mut StagingArea<C>,
        parent_id: Uuid,
        live: &FormSnapshot,
    ) -> CoreResult<CommitReceipt> {
        staging.ensure_clean(live)?;
        staging.begin_commit()?;

        match self.persist(staging, parent_id) {
            Ok((inserted, replaced)) => {
                let entries = staging.complete_commit();
                info!(
                    %parent_id,
                    groups = entries.len(),
                    rows = inserted.len(),
                    replaced = replaced.len(),
                    "commit succeeded"
                );
                Ok(CommitReceipt {
                    inserted,
                    replaced,
                    entries,
                })
            }
            Err(err) => {
                warn!(%parent_id, error = %err, "commit failed; staged entries kept");
                staging.abort_commit();
                match err {
                    CoreError::Persistence(inner) => Err(inner.sanitized().into()),
                    other => Err(other),
                }
            }
        }
    }

    /// Loads and regroups every row under a parent work plan.
    pub fn load(&self, parent_id: Uuid) -> CoreResult<ConsolidationGrouper> {
        let records = self.persistence.query_by_parent(parent_id)?;
        Ok(ConsolidationGrouper::group(records))
    }

    /// Deletes every row of one group.
    pub fn delete_group(&self, parent_id: Uuid, key: &IdentityKey) -> CoreResult<()> {
        self.persistence.delete_by_identity_key(parent_id, key)?;
        info!(%parent_id, key = %key, "group deleted");
        Ok(())
    }

    fn persist<C: SnapshotComparator>(
        &self,
        staging: &StagingArea<C>,
        parent_id: Uuid,
    ) -> CoreResult<(Vec<Uuid>, Vec<Uuid>)> {
        let tolerance = staging.policy().tolerance;
        let mut records: Vec<PersistedRecord> = Vec::new();
        for entry in staging.entries() {
            AllocationSplitter::validate_with_tolerance(&entry.group, tolerance)?;
            let target = RecordTarget {
                parent_id,
                identity_key: entry.identity_key(),
            };
            records.extend(AllocationSplitter::decompose(
                &entry.group,
                &target,
                self.policy,
            ));
        }

        let replaced = match staging.editing_key() {
            Some(key) => self.existing_ids(parent_id, key)?,
            None => Vec::new(),
        };

        let inserted: Vec<Uuid> = records.iter().map(|r| r.id).collect();
        self.persistence.insert(records)?;

        if !replaced.is_empty() {
            if let Err(err) = self.persistence.delete_by_ids(&replaced) {
                self.roll_back(&inserted);
                return Err(err.into());
            }
        }
        Ok((inserted, replaced))
    }

    fn existing_ids(&self, parent_id: Uuid, key: &IdentityKey) -> Result<Vec<Uuid>, CoreError> {
        Ok(self
            .persistence
            .query_by_parent(parent_id)?
            .into_iter()
            .filter(|record| &record.identity_key == key)
            .map(|record| record.id)
            .collect())
    }

    fn roll_back(&self, inserted: &[Uuid]) {
        if let Err(PersistenceError { message }) = self.persistence.delete_by_ids(inserted) {
            warn!(rows = inserted.len(), %message, "rollback of inserted rows failed");
        }
    }
}
