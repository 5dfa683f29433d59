//! Regroups persisted rows into logical allocation groups for display and edit.

use std::collections::BTreeMap;

use expense_domain::{AllocationGroup, Buckets, IdentityKey, Money, PersistedRecord, SubEntity};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};

/// Display summary for one consolidated group.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsolidatedGroup {
    pub key: IdentityKey,
    pub record_ids: Vec<Uuid>,
    pub sub_entity_labels: Vec<String>,
    pub total_value: Money,
    pub material: Money,
    pub service: Money,
}

/// Persisted rows grouped by [`IdentityKey`].
///
/// Groups iterate in key order: holding org name, then holding unit code.
/// Rows keep their input order within a group, so the first sub-entity of a
/// decomposition stays first.
#[derive(Debug, Clone, Default)]
pub struct ConsolidationGrouper {
    groups: BTreeMap<IdentityKey, Vec<PersistedRecord>>,
}

impl ConsolidationGrouper {
    pub fn group(records: impl IntoIterator<Item = PersistedRecord>) -> Self {
        let mut groups: BTreeMap<IdentityKey, Vec<PersistedRecord>> = BTreeMap::new();
        for record in records {
            groups
                .entry(record.identity_key.clone())
                .or_default()
                .push(record);
        }
        Self { groups }
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &IdentityKey> {
        self.groups.keys()
    }

    pub fn records(&self, key: &IdentityKey) -> Option<&[PersistedRecord]> {
        self.groups.get(key).map(Vec::as_slice)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&IdentityKey, &[PersistedRecord])> {
        self.groups
            .iter()
            .map(|(key, records)| (key, records.as_slice()))
    }

    pub fn into_map(self) -> BTreeMap<IdentityKey, Vec<PersistedRecord>> {
        self.groups
    }

    /// Rebuilds one editable group from every row under `key`.
    pub fn expand(&self, key: &IdentityKey) -> CoreResult<AllocationGroup> {
        let records = self
            .groups
            .get(key)
            .ok_or_else(|| CoreError::GroupNotFound(key.to_string()))?;

        let mut buckets = Buckets::default();
        let mut total_value = Money::ZERO;
        let mut sub_entities = Vec::with_capacity(records.len());
        for record in records {
            buckets.material += record.material_value;
            buckets.service += record.service_value;
            total_value += record.total_value;
            sub_entities.push(SubEntity::new(
                record.sub_entity_label.clone(),
                record.items.clone(),
            ));
        }

        Ok(AllocationGroup {
            total_value,
            destination: records.iter().find_map(|r| r.destination.clone()),
            buckets,
            sub_entities,
            custom_memo: memo_for(records).map(str::to_string),
        })
    }

    /// Per-group totals in display order.
    pub fn summaries(&self) -> Vec<ConsolidatedGroup> {
        self.groups
            .iter()
            .map(|(key, records)| ConsolidatedGroup {
                key: key.clone(),
                record_ids: records.iter().map(|r| r.id).collect(),
                sub_entity_labels: records.iter().map(|r| r.sub_entity_label.clone()).collect(),
                total_value: records.iter().map(|r| r.total_value).sum(),
                material: records.iter().map(|r| r.material_value).sum(),
                service: records.iter().map(|r| r.service_value).sum(),
            })
            .collect()
    }
}

/// First non-blank custom memo stored on any of the rows.
pub fn memo_for(records: &[PersistedRecord]) -> Option<&str> {
    records
        .iter()
        .filter_map(|r| r.custom_memo.as_deref())
        .find(|memo| !memo.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use expense_domain::{LineItem, OrgRef};

    fn key(org: &str, unit: &str) -> IdentityKey {
        IdentityKey {
            holding_org: org.into(),
            holding_unit: unit.into(),
            days: 30,
            effective_count: 12,
            phase: "Fase 1".into(),
            category_family: Some("veterinary".into()),
        }
    }

    fn record(key: &IdentityKey, label: &str, material: i64, service: i64) -> PersistedRecord {
        PersistedRecord {
            id: Uuid::new_v4(),
            parent_id: Uuid::nil(),
            identity_key: key.clone(),
            sub_entity_label: label.into(),
            destination: Some(OrgRef::new("CPA/M-1", "160100")),
            items: vec![LineItem::per_unit(label, 1.0, Money::from_cents(material + service))],
            material_value: Money::from_cents(material),
            service_value: Money::from_cents(service),
            total_value: Money::from_cents(material + service),
            custom_memo: None,
        }
    }

    #[test]
    fn groups_sort_by_org_then_unit() {
        let b = key("2º BPM", "300");
        let a_high = key("1º BPM", "200");
        let a_low = key("1º BPM", "100");
        let grouper = ConsolidationGrouper::group(vec![
            record(&b, "Canine", 100, 0),
            record(&a_high, "Canine", 100, 0),
            record(&a_low, "Canine", 100, 0),
            record(&b, "Equine", 50, 50),
        ]);
        let keys: Vec<&IdentityKey> = grouper.keys().collect();
        assert_eq!(keys, vec![&a_low, &a_high, &b]);
        assert_eq!(grouper.records(&b).map(|rows| rows.len()), Some(2));
    }

    #[test]
    fn expand_sums_rows_and_rebuilds_sub_entities() {
        let k = key("1º BPM", "100");
        let mut first = record(&k, "Canine", 666, 334);
        first.custom_memo = Some("custom narrative".into());
        let grouper = ConsolidationGrouper::group(vec![
            first,
            record(&k, "Equine", 667, 333),
            record(&k, "Bovine", 667, 333),
        ]);
        let group = grouper.expand(&k).unwrap();
        assert_eq!(group.total_value, Money::from_major(30, 0));
        assert_eq!(group.material(), Money::from_major(20, 0));
        assert_eq!(group.service(), Money::from_major(10, 0));
        let labels: Vec<&str> = group.sub_entities.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Canine", "Equine", "Bovine"]);
        assert_eq!(group.custom_memo(), Some("custom narrative"));
    }

    #[test]
    fn expand_unknown_key_fails() {
        let grouper = ConsolidationGrouper::group(Vec::new());
        assert!(matches!(
            grouper.expand(&key("x", "y")),
            Err(CoreError::GroupNotFound(_))
        ));
    }

    #[test]
    fn summaries_report_ids_and_totals() {
        let k = key("1º BPM", "100");
        let rows = vec![record(&k, "Canine", 100, 20), record(&k, "Equine", 200, 30)];
        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let summaries = ConsolidationGrouper::group(rows).summaries();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].record_ids, ids);
        assert_eq!(summaries[0].total_value, Money::from_cents(350));
        assert_eq!(summaries[0].service, Money::from_cents(50));
    }
}
