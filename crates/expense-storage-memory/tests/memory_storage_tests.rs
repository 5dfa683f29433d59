use expense_core::{
    CommitCoordinator, CoreError, FormSession, NarrativeMemo, StagingPolicy, StagingState,
};
use expense_domain::{LineItem, Money, OrgRef, QuantityRule, RemainderPolicy};
use expense_storage_memory::{InMemoryPersistence, StaticCatalog, StaticOrgResolver};
use uuid::Uuid;

fn catalog() -> StaticCatalog {
    StaticCatalog::new().with_defaults(
        "veterinary",
        2024,
        vec![
            LineItem::per_unit("vaccine", 0.0, Money::from_major(10, 0)),
            LineItem::per_unit("deworming", 0.0, Money::from_major(5, 0)),
        ],
    )
}

fn session() -> FormSession {
    let mut session = FormSession::new(
        "veterinary",
        QuantityRule::Unconstrained,
        StagingPolicy::default(),
    );
    {
        let live = session.live_mut();
        live.holding_org = "1º BPM".into();
        live.holding_unit = "160222".into();
        live.days = 30;
        live.effective_count = 8;
        live.phase = "Fase 1".into();
    }
    let resolver = StaticOrgResolver::new(vec![OrgRef::new("CPA/M-1", "160100")]);
    assert!(session.resolve_destination(&resolver, "CPA/M-1", "160100"));

    let catalog = catalog();
    for species in ["Canine", "Equine"] {
        session.seed_from_catalog(&catalog, species, Some(2024));
    }
    session.set_quantity("Canine", "vaccine", 3.0).expect("canine");
    session.set_quantity("Equine", "deworming", 2.0).expect("equine");
    session.set_requested_service_digits("1001");
    session
}

#[test]
fn commit_round_trips_through_memory_store() {
    let coordinator =
        CommitCoordinator::new(InMemoryPersistence::new(), RemainderPolicy::FirstEntry);
    let parent = Uuid::new_v4();
    let mut session = session();

    session.stage(&NarrativeMemo::default()).expect("stage");
    let receipt = session.commit(&coordinator, parent).expect("commit");
    assert_eq!(receipt.inserted.len(), 2);
    assert_eq!(coordinator.persistence().len().expect("len"), 2);

    let summaries = coordinator.load(parent).expect("load").summaries();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0].total_value, Money::from_major(40, 0));
    assert_eq!(summaries[0].service, Money::from_cents(1001));
    assert_eq!(summaries[0].material, Money::from_cents(2999));
    assert_eq!(summaries[0].sub_entity_labels, vec!["Canine", "Equine"]);
}

#[test]
fn injected_failure_keeps_entries_staged() {
    let coordinator =
        CommitCoordinator::new(InMemoryPersistence::new(), RemainderPolicy::FirstEntry);
    let mut session = session();
    session.stage(&NarrativeMemo::default()).expect("stage");

    coordinator.persistence().fail_next("connection reset");
    let err = session
        .commit(&coordinator, Uuid::new_v4())
        .expect_err("commit should fail");
    assert!(matches!(err, CoreError::Persistence(_)));
    assert_eq!(session.staging().state(), StagingState::Staged(1));
    assert!(coordinator.persistence().is_empty().expect("len"));
}

#[test]
fn failed_replacement_rolls_back_new_rows() {
    let coordinator =
        CommitCoordinator::new(InMemoryPersistence::new(), RemainderPolicy::FirstEntry);
    let parent = Uuid::new_v4();
    let mut session = session();
    session.stage(&NarrativeMemo::default()).expect("stage");
    let first = session.commit(&coordinator, parent).expect("commit");

    let grouper = coordinator.load(parent).expect("load");
    let key = grouper.keys().next().cloned().expect("group key");
    session.load_for_edit(&grouper, &key).expect("edit");
    session.set_quantity("Canine", "vaccine", 5.0).expect("quantity");
    session.stage(&NarrativeMemo::default()).expect("restage");

    // The insert goes through, the delete of the replaced rows fails.
    coordinator.persistence().fail_after(1, "delete timed out");
    let err = session
        .commit(&coordinator, parent)
        .expect_err("replacement should fail");
    assert!(matches!(err, CoreError::Persistence(_)));
    assert_eq!(session.staging().state(), StagingState::StagedForUpdate);

    let mut ids: Vec<Uuid> = coordinator
        .persistence()
        .all()
        .expect("rows")
        .iter()
        .map(|row| row.id)
        .collect();
    let mut original = first.inserted.clone();
    ids.sort();
    original.sort();
    assert_eq!(ids, original);

    let receipt = session.commit(&coordinator, parent).expect("retry");
    assert_eq!(receipt.replaced.len(), 2);
    assert_eq!(coordinator.persistence().len().expect("len"), 2);
}
