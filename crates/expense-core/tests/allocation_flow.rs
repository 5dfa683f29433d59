use expense_core::{
    AllocationError, AllocationSplitter, CurrencyInputCodec, RecordTarget, UnitCostCalculator,
};
use expense_domain::{
    IdentityKey, LineItem, Money, OrgRef, RemainderPolicy, SubEntity, UnitBasis,
};
use uuid::Uuid;

fn target() -> RecordTarget {
    RecordTarget {
        parent_id: Uuid::new_v4(),
        identity_key: IdentityKey {
            holding_org: "1º BPM".into(),
            holding_unit: "160222".into(),
            days: 15,
            effective_count: 40,
            phase: "Fase 2".into(),
            category_family: Some("veterinary".into()),
        },
    }
}

fn species(label: &str, cents: i64) -> SubEntity {
    SubEntity::new(label, vec![LineItem::per_unit("dose", 1.0, Money::from_cents(cents))])
}

#[test]
fn typed_service_value_flows_into_exact_rows() {
    let requested = CurrencyInputCodec::digits_to_value("3333");
    assert_eq!(requested, Money::from_cents(3333));

    let group = AllocationSplitter::build_group(
        vec![
            species("Canine", 3334),
            species("Equine", 3333),
            species("Bovine", 3333),
        ],
        requested,
        Some(OrgRef::new("CPA/M-1", "160100")),
        None,
    );
    assert_eq!(group.total_value, Money::from_major(100, 0));
    AllocationSplitter::validate(&group).expect("valid group");

    let rows = AllocationSplitter::decompose(&group, &target(), RemainderPolicy::FirstEntry);
    assert_eq!(rows.len(), 3);
    let material: Money = rows.iter().map(|r| r.material_value).sum();
    let service: Money = rows.iter().map(|r| r.service_value).sum();
    assert_eq!(material, group.material());
    assert_eq!(service, group.service());
    for row in &rows {
        assert_eq!(row.total_value, row.material_value + row.service_value);
        assert_eq!(row.destination, group.destination);
    }
}

#[test]
fn both_remainder_policies_keep_sums_exact() {
    let group = AllocationSplitter::build_group(
        vec![species("A", 1001), species("B", 1001), species("C", 1001)],
        Money::from_cents(1000),
        Some(OrgRef::new("CPA/M-1", "160100")),
        None,
    );
    for policy in [RemainderPolicy::FirstEntry, RemainderPolicy::LargestRemainder] {
        let rows = AllocationSplitter::decompose(&group, &target(), policy);
        let service: Money = rows.iter().map(|r| r.service_value).sum();
        let total: Money = rows.iter().map(|r| r.total_value).sum();
        assert_eq!(service, Money::from_cents(1000));
        assert_eq!(total, group.total_value);
    }
}

#[test]
fn priced_items_drive_group_total() {
    let items = vec![
        LineItem::new("rent", 1.0, Money::from_major(1200, 0), UnitBasis::PerUnitProratedAnnually)
            .with_usage_days(400.0),
        LineItem::new("per-diem", 2.0, Money::from_major(80, 0), UnitBasis::per_diem())
            .with_usage_days(5.0),
    ];
    // 1200 x 2 + 2 x 80 x 4.5
    assert_eq!(
        UnitCostCalculator::compute_group_total(&items),
        Money::from_major(3120, 0)
    );
}

#[test]
fn unset_destination_fails_validation_for_positive_total() {
    let group = AllocationSplitter::build_group(
        vec![species("Canine", 500)],
        Money::ZERO,
        None,
        None,
    );
    assert_eq!(
        AllocationSplitter::validate(&group),
        Err(AllocationError::MissingDestination)
    );
}
