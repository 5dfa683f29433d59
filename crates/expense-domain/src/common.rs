//! Shared traits and organizational references.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Exposes a stable identifier for entities handed to persistence.
pub trait Identifiable {
    fn id(&self) -> Uuid;
}

/// Provides read-only access to an entity's display name.
pub trait NamedEntity {
    fn name(&self) -> &str;
}

/// Converts an entity into a user-facing display label.
pub trait Displayable {
    fn display_label(&self) -> String;
}

/// Reference to an organizational entity and one of its units.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OrgRef {
    pub name: String,
    pub unit_code: String,
}

impl OrgRef {
    pub fn new(name: impl Into<String>, unit_code: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            unit_code: unit_code.into(),
        }
    }

    /// Returns `true` when the reference names an organization.
    pub fn is_set(&self) -> bool {
        !self.name.trim().is_empty()
    }
}

impl NamedEntity for OrgRef {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for OrgRef {
    fn display_label(&self) -> String {
        if self.unit_code.trim().is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.unit_code)
        }
    }
}
