//! Holding area for computed-but-unsaved allocation groups.
//!
//! Transitions:
//!
//! ```text
//! Empty ──stage_new──▶ Staged(1..N) ──complete_commit / clear_all──▶ Empty
//! Empty ──begin_edit──▶ Editing ──stage_new──▶ StagedForUpdate
//! StagedForUpdate ──complete_commit / cancel_edit──▶ Empty
//! ```
//!
//! A failed commit (`abort_commit`) leaves entries and mode untouched.

use expense_domain::{AllocationGroup, FormSnapshot, IdentityKey, Money, StagedEntry};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    allocation::{AllocationSplitter, DEFAULT_TOLERANCE},
    error::{CoreError, CoreResult, InputValidationError},
    unit_cost::UnitCostCalculator,
};

/// Decides whether live form input has drifted from a staged snapshot.
pub trait SnapshotComparator {
    fn differs(&self, staged: &FormSnapshot, live: &FormSnapshot) -> bool;
}

/// Dirty when the recomputed total moves by more than `tolerance`, or the
/// requested service or destination changes at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TotalsAndDestination {
    pub tolerance: Money,
}

impl Default for TotalsAndDestination {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
        }
    }
}

impl SnapshotComparator for TotalsAndDestination {
    fn differs(&self, staged: &FormSnapshot, live: &FormSnapshot) -> bool {
        let staged_total = UnitCostCalculator::compute_entities_total(&staged.sub_entities);
        let live_total = UnitCostCalculator::compute_entities_total(&live.sub_entities);
        !staged_total.within(live_total, self.tolerance)
            || staged.requested_service != live.requested_service
            || staged.destination != live.destination
    }
}

/// Shared dirty check used by every expense form.
pub fn is_dirty<C>(staged: &FormSnapshot, live: &FormSnapshot, comparator: &C) -> bool
where
    C: SnapshotComparator + ?Sized,
{
    comparator.differs(staged, live)
}

/// Which required fields a form enforces before staging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StagingPolicy {
    pub tolerance: Money,
    pub require_positive_days: bool,
    pub require_positive_effective_count: bool,
}

impl Default for StagingPolicy {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            require_positive_days: false,
            require_positive_effective_count: false,
        }
    }
}

/// Observable state of a [`StagingArea`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StagingState {
    Empty,
    Staged(usize),
    Editing,
    StagedForUpdate,
}

/// The persisted group being replaced while in edit mode.
#[derive(Debug, Clone, PartialEq, Eq)]
struct EditTarget {
    key: IdentityKey,
}

/// Per-form-session owner of staged entries.
#[derive(Debug)]
pub struct StagingArea<C = TotalsAndDestination> {
    policy: StagingPolicy,
    comparator: C,
    entries: Vec<StagedEntry>,
    editing: Option<EditTarget>,
    in_flight: bool,
}

impl StagingArea<TotalsAndDestination> {
    pub fn new(policy: StagingPolicy) -> Self {
        let comparator = TotalsAndDestination {
            tolerance: policy.tolerance,
        };
        Self::with_comparator(policy, comparator)
    }
}

impl Default for StagingArea<TotalsAndDestination> {
    fn default() -> Self {
        Self::new(StagingPolicy::default())
    }
}

impl<C: SnapshotComparator> StagingArea<C> {
    pub fn with_comparator(policy: StagingPolicy, comparator: C) -> Self {
        Self {
            policy,
            comparator,
            entries: Vec::new(),
            editing: None,
            in_flight: false,
        }
    }

    pub fn policy(&self) -> &StagingPolicy {
        &self.policy
    }

    pub fn state(&self) -> StagingState {
        match (&self.editing, self.entries.len()) {
            (Some(_), 0) => StagingState::Editing,
            (Some(_), _) => StagingState::StagedForUpdate,
            (None, 0) => StagingState::Empty,
            (None, count) => StagingState::Staged(count),
        }
    }

    pub fn entries(&self) -> &[StagedEntry] {
        &self.entries
    }

    pub fn entry(&self, temp_id: Uuid) -> Option<&StagedEntry> {
        self.entries.iter().find(|entry| entry.temp_id == temp_id)
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    /// Key of the persisted group being replaced, when in edit mode.
    pub fn editing_key(&self) -> Option<&IdentityKey> {
        self.editing.as_ref().map(|target| &target.key)
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Enters edit mode for an existing persisted group.
    pub fn begin_edit(&mut self, key: IdentityKey) -> CoreResult<()> {
        if self.in_flight {
            return Err(CoreError::CommitInFlight);
        }
        if !self.entries.is_empty() {
            return Err(CoreError::InvalidOperation(
                "cannot edit a saved group while new entries are pending".into(),
            ));
        }
        debug!(key = %key, "entering edit mode");
        self.editing = Some(EditTarget { key });
        Ok(())
    }

    /// Checks the form's required fields and the group's bucket invariants.
    pub fn validate_for_staging(
        &self,
        group: &AllocationGroup,
        snapshot: &FormSnapshot,
    ) -> CoreResult<()> {
        if snapshot.active_warnings > 0 {
            return Err(InputValidationError::WarningsActive(snapshot.active_warnings).into());
        }
        if self.policy.require_positive_days && snapshot.days == 0 {
            return Err(InputValidationError::NonPositiveDays.into());
        }
        if self.policy.require_positive_effective_count && snapshot.effective_count == 0 {
            return Err(InputValidationError::NonPositiveEffectiveCount.into());
        }
        if snapshot.quantity_total() <= 0.0 {
            return Err(InputValidationError::ZeroQuantityTotal.into());
        }
        if group.destination().is_none() {
            return Err(InputValidationError::MissingDestination.into());
        }
        AllocationSplitter::validate_with_tolerance(group, self.policy.tolerance)?;
        Ok(())
    }

    /// Stages a computed group with a copy of the input that produced it.
    ///
    /// Appends in add mode; replaces the single entry in edit mode. Rejected
    /// input leaves the area unchanged.
    pub fn stage_new(
        &mut self,
        group: AllocationGroup,
        snapshot: FormSnapshot,
        display_memo: String,
    ) -> CoreResult<&StagedEntry> {
        if self.in_flight {
            return Err(CoreError::CommitInFlight);
        }
        if let Err(err) = self.validate_for_staging(&group, &snapshot) {
            warn!(error = %err, "staging rejected");
            return Err(err);
        }
        let entry = StagedEntry::new(group, snapshot, display_memo);
        debug!(temp_id = %entry.temp_id, total = %entry.group.total_value, "staged entry");
        if self.editing.is_some() {
            self.entries.clear();
        }
        self.entries.push(entry);
        let index = self.entries.len() - 1;
        Ok(&self.entries[index])
    }

    /// Whether the most recently staged entry no longer matches `live`.
    ///
    /// Nothing staged means nothing can be dirty.
    pub fn is_dirty(&self, live: &FormSnapshot) -> bool {
        self.entries
            .last()
            .map(|entry| is_dirty(entry.source_snapshot(), live, &self.comparator))
            .unwrap_or(false)
    }

    /// Dirty check against one specific staged entry.
    pub fn is_entry_dirty(&self, temp_id: Uuid, live: &FormSnapshot) -> bool {
        self.entry(temp_id)
            .map(|entry| is_dirty(entry.source_snapshot(), live, &self.comparator))
            .unwrap_or(false)
    }

    /// Fails with [`CoreError::DirtyState`] when the latest entry is stale.
    pub fn ensure_clean(&self, live: &FormSnapshot) -> CoreResult<()> {
        if self.is_dirty(live) {
            return Err(CoreError::DirtyState);
        }
        Ok(())
    }

    /// Drops one pending entry in add mode. Edit mode is left alone; use
    /// [`StagingArea::cancel_edit`] there.
    pub fn remove_pending(&mut self, temp_id: Uuid) -> bool {
        if self.editing.is_some() || self.in_flight {
            return false;
        }
        let before = self.entries.len();
        self.entries.retain(|entry| entry.temp_id != temp_id);
        before != self.entries.len()
    }

    /// Leaves edit mode, discarding its staged entry.
    pub fn cancel_edit(&mut self) -> bool {
        if self.editing.is_none() || self.in_flight {
            return false;
        }
        debug!("edit canceled");
        self.editing = None;
        self.entries.clear();
        true
    }

    /// Empties the area and any edit-mode marker.
    pub fn clear_all(&mut self) {
        debug!(count = self.entries.len(), "clearing staging area");
        self.entries.clear();
        self.editing = None;
    }

    /// Raises the in-flight flag before handing entries to persistence.
    pub fn begin_commit(&mut self) -> CoreResult<()> {
        if self.in_flight {
            return Err(CoreError::CommitInFlight);
        }
        if self.entries.is_empty() {
            return Err(CoreError::NothingStaged);
        }
        self.in_flight = true;
        Ok(())
    }

    /// Persistence succeeded: ownership of the entries passes to the caller.
    pub fn complete_commit(&mut self) -> Vec<StagedEntry> {
        self.in_flight = false;
        self.editing = None;
        std::mem::take(&mut self.entries)
    }

    /// Persistence failed: keep everything so the user can retry or edit.
    pub fn abort_commit(&mut self) {
        self.in_flight = false;
    }
}
