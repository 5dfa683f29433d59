//! Rows as stored by the persistence collaborator.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{common::*, item::LineItem, money::Money};

/// Composite key shared by all rows that make up one allocation group.
///
/// Field order defines the display ordering: holding org name first, then
/// holding unit code, then the remaining fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct IdentityKey {
    pub holding_org: String,
    pub holding_unit: String,
    pub days: u32,
    pub effective_count: u32,
    pub phase: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_family: Option<String>,
}

impl Displayable for IdentityKey {
    fn display_label(&self) -> String {
        format!("{} / {}", self.holding_org, self.holding_unit)
    }
}

impl fmt::Display for IdentityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} {}d x{} [{}]",
            self.holding_org, self.holding_unit, self.days, self.effective_count, self.phase
        )?;
        if let Some(family) = &self.category_family {
            write!(f, " {}", family)?;
        }
        Ok(())
    }
}

/// One persisted row: a single sub-entity's share of an allocation group.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PersistedRecord {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub identity_key: IdentityKey,
    pub sub_entity_label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<OrgRef>,
    #[serde(default)]
    pub items: Vec<LineItem>,
    pub material_value: Money,
    pub service_value: Money,
    pub total_value: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_memo: Option<String>,
}

impl Identifiable for PersistedRecord {
    fn id(&self) -> Uuid {
        self.id
    }
}

impl NamedEntity for PersistedRecord {
    fn name(&self) -> &str {
        &self.sub_entity_label
    }
}
