//! Allocation groups, their buckets, and sub-entity partitions.

use serde::{Deserialize, Serialize};

use crate::{common::*, item::LineItem, money::Money};

/// The two budget classification buckets a group total is split into.
///
/// `material` covers goods/equipment spend (ND 30), `service` covers
/// contracted services (ND 39).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Buckets {
    pub material: Money,
    pub service: Money,
}

impl Buckets {
    pub fn total(&self) -> Money {
        self.material + self.service
    }
}

/// A named partition of a group's items, persisted as exactly one row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubEntity {
    pub label: String,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

impl SubEntity {
    pub fn new(label: impl Into<String>, items: Vec<LineItem>) -> Self {
        Self {
            label: label.into(),
            items,
        }
    }

    /// Finds an item by key for in-place edits.
    pub fn item_mut(&mut self, key: &str) -> Option<&mut LineItem> {
        self.items.iter_mut().find(|item| item.key == key)
    }
}

impl NamedEntity for SubEntity {
    fn name(&self) -> &str {
        &self.label
    }
}

/// One logical funding request before it is split into persisted rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AllocationGroup {
    pub total_value: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<OrgRef>,
    pub buckets: Buckets,
    #[serde(default)]
    pub sub_entities: Vec<SubEntity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_memo: Option<String>,
}

impl AllocationGroup {
    pub fn material(&self) -> Money {
        self.buckets.material
    }

    pub fn service(&self) -> Money {
        self.buckets.service
    }

    /// Returns the destination when it names an organization.
    pub fn destination(&self) -> Option<&OrgRef> {
        self.destination.as_ref().filter(|org| org.is_set())
    }

    /// Returns the custom memo when it holds non-blank text.
    pub fn custom_memo(&self) -> Option<&str> {
        self.custom_memo
            .as_deref()
            .filter(|memo| !memo.trim().is_empty())
    }

    pub fn item_count(&self) -> usize {
        self.sub_entities.iter().map(|entity| entity.items.len()).sum()
    }
}

/// How rounding residue from a proportional split is assigned to sub-entities.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum RemainderPolicy {
    /// Every residual cent goes to the first sub-entity in iteration order.
    #[default]
    FirstEntry,
    /// Residual cents go one at a time to the largest fractional remainders.
    LargestRemainder,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_destination_and_memo_read_as_unset() {
        let group = AllocationGroup {
            total_value: Money::ZERO,
            destination: Some(OrgRef::new("", "")),
            buckets: Buckets::default(),
            sub_entities: Vec::new(),
            custom_memo: Some("   ".into()),
        };
        assert!(group.destination().is_none());
        assert!(group.custom_memo().is_none());
    }

    #[test]
    fn buckets_total_adds_both_sides() {
        let buckets = Buckets {
            material: Money::from_major(25, 0),
            service: Money::from_major(15, 0),
        };
        assert_eq!(buckets.total(), Money::from_major(40, 0));
    }
}
