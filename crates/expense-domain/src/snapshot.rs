//! Form input snapshots and the staged entries built from them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    common::*,
    group::{AllocationGroup, SubEntity},
    money::Money,
    record::IdentityKey,
};

/// The input state of an expense form that feeds one allocation group.
///
/// The same shape describes the live editor state and the immutable copy
/// captured when a calculation is staged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct FormSnapshot {
    pub holding_org: String,
    pub holding_unit: String,
    pub days: u32,
    pub effective_count: u32,
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_family: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<OrgRef>,
    pub requested_service: Money,
    #[serde(default)]
    pub sub_entities: Vec<SubEntity>,
    /// Category warnings still showing on the form (e.g. step violations while typing).
    #[serde(default)]
    pub active_warnings: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_memo: Option<String>,
}

impl FormSnapshot {
    /// Composite key shared by every row persisted from this form.
    pub fn identity_key(&self) -> IdentityKey {
        IdentityKey {
            holding_org: self.holding_org.clone(),
            holding_unit: self.holding_unit.clone(),
            days: self.days,
            effective_count: self.effective_count,
            phase: self.phase.clone(),
            category_family: self.category_family.clone(),
        }
    }

    /// Sum of quantities over the items that contribute to the total.
    ///
    /// Day-dependent items without usage days are left out.
    pub fn quantity_total(&self) -> f64 {
        self.sub_entities
            .iter()
            .flat_map(|entity| entity.items.iter())
            .filter(|item| item.is_active())
            .map(|item| item.quantity())
            .sum()
    }

    pub fn sub_entity_mut(&mut self, label: &str) -> Option<&mut SubEntity> {
        self.sub_entities
            .iter_mut()
            .find(|entity| entity.label == label)
    }
}

/// A computed-but-unsaved group awaiting review.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StagedEntry {
    pub temp_id: Uuid,
    pub group: AllocationGroup,
    source_snapshot: FormSnapshot,
    pub display_memo: String,
    pub staged_at: DateTime<Utc>,
}

impl StagedEntry {
    pub fn new(
        group: AllocationGroup,
        source_snapshot: FormSnapshot,
        display_memo: String,
    ) -> Self {
        Self {
            temp_id: Uuid::new_v4(),
            group,
            source_snapshot,
            display_memo,
            staged_at: Utc::now(),
        }
    }

    /// The input state captured at staging time. Read-only.
    pub fn source_snapshot(&self) -> &FormSnapshot {
        &self.source_snapshot
    }

    pub fn identity_key(&self) -> IdentityKey {
        self.source_snapshot.identity_key()
    }
}

impl Identifiable for StagedEntry {
    fn id(&self) -> Uuid {
        self.temp_id
    }
}
