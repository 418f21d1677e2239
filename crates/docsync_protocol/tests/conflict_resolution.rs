//! Conflict detection, policies, and reconciliation end to end.

use docsync_codec::{doc, Document, Value};
use docsync_protocol::{
    local_wins, remote_wins, ChangeEvent, CompactChangeEvent, Conflict, ConflictHandler,
    ConflictPolicy, ConflictResolution, ConflictState, Namespace, ProtocolError, Reconciler,
    ReconcilerConfig, UpdateDescription,
};
use docsync_testkit::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn remote_wins_is_total(
        id in document_id_strategy(),
        local in any_change_event_strategy(),
        remote in compact_change_event_strategy()
    ) {
        prop_assert_eq!(
            remote_wins().resolve_conflict(&id, &local, &remote),
            ConflictResolution::UseRemote
        );
    }

    #[test]
    fn local_wins_is_total(
        id in document_id_strategy(),
        local in any_change_event_strategy(),
        remote in compact_change_event_strategy()
    ) {
        prop_assert_eq!(
            local_wins().resolve_conflict(&id, &local, &remote),
            ConflictResolution::UseLocal
        );
    }

    #[test]
    fn detected_conflicts_start_conflicted(
        local in change_event_strategy(),
        other in compact_change_event_strategy()
    ) {
        let remote = CompactChangeEvent::new(
            other.operation_type(),
            other.full_document().cloned(),
            local.document_key().clone(),
            other.update_description().cloned(),
            other.has_uncommitted_writes(),
        );
        let existence_differs =
            local.operation_type().is_delete() != remote.operation_type().is_delete();

        let namespace = local.namespace().clone();
        match Conflict::detect(namespace, local.clone(), remote.clone()) {
            Some(conflict) => {
                prop_assert_eq!(conflict.state(), ConflictState::Conflicted);
                prop_assert!(local.has_uncommitted_writes());
                prop_assert_eq!(conflict.document_id(), local.document_id().unwrap());
                prop_assert_eq!(conflict.remote(), &remote);
            }
            None => {
                prop_assert!(!local.has_uncommitted_writes() || !existence_differs);
            }
        }
    }

    #[test]
    fn confirmed_events_never_conflict(
        local in change_event_strategy(),
        remote in compact_change_event_strategy()
    ) {
        let namespace = local.namespace().clone();
        let confirmed = local.without_uncommitted_writes();
        prop_assert!(Conflict::detect(namespace, confirmed, remote).is_none());
    }
}

#[test]
fn name_scenario_with_both_policies() {
    let local = fixtures::local_update("A");
    let remote = fixtures::remote_update("B");
    let id = fixtures::document_id();

    let resolution = remote_wins().resolve_conflict(&id, &local, &remote);
    assert_eq!(resolution, ConflictResolution::UseRemote);
    assert_eq!(
        resolution.winning_document(&local, &remote),
        Some(fixtures::named("B"))
    );

    let resolution = local_wins().resolve_conflict(&id, &local, &remote);
    assert_eq!(resolution, ConflictResolution::UseLocal);
    assert_eq!(
        resolution.winning_document(&local, &remote),
        Some(fixtures::named("A"))
    );
}

#[test]
fn remote_delete_scenario() {
    let local = fixtures::local_update("A");
    let remote = fixtures::remote_delete();
    let id = fixtures::document_id();

    let resolution = remote_wins().resolve_conflict(&id, &local, &remote);
    assert_eq!(resolution, ConflictResolution::UseRemote);
    assert_eq!(resolution.winning_document(&local, &remote), None);

    let resolution = local_wins().resolve_conflict(&id, &local, &remote);
    assert_eq!(
        resolution.winning_document(&local, &remote),
        Some(fixtures::named("A"))
    );
}

#[test]
fn local_delete_against_remote_update() {
    let mut conflict = Conflict::detect(
        fixtures::namespace(),
        fixtures::local_delete(),
        fixtures::remote_update("B"),
    )
    .unwrap();

    let reconciler: Reconciler = ReconcilerConfig::new().with_default_handler(local_wins()).build();
    assert_eq!(
        reconciler.reconcile(&mut conflict).unwrap(),
        &ConflictResolution::UseLocal
    );
    assert_eq!(conflict.winning_document(), None);
}

#[test]
fn full_conflict_cycle() {
    let mut conflict = fixtures::name_conflict("A", "B");
    assert_eq!(conflict.document_id(), &fixtures::document_id());

    let reconciler: Reconciler = Reconciler::default();
    reconciler.reconcile(&mut conflict).unwrap();
    assert_eq!(conflict.state(), ConflictState::Resolved);
    assert_eq!(conflict.winning_document(), Some(fixtures::named("B")));

    let applied = conflict.acknowledge().unwrap();
    assert_eq!(applied, ConflictResolution::UseRemote);
    assert_eq!(conflict.state(), ConflictState::Idle);

    assert_eq!(
        conflict.begin_resolving(),
        Err(ProtocolError::InvalidStateTransition {
            from: ConflictState::Idle,
            to: ConflictState::Resolving,
        })
    );
}

#[test]
fn merge_handler_sees_both_sides() {
    let merge = |id: &Value, local: &ChangeEvent, remote: &CompactChangeEvent| {
        let name = |document: Option<&Document>| {
            document
                .and_then(|d| d.get_str("name"))
                .unwrap_or_default()
                .to_string()
        };
        let mut merged = doc! { "_id" => id.clone() };
        merged.insert(
            "name",
            format!("{}+{}", name(local.full_document()), name(remote.full_document())),
        );
        ConflictResolution::merged(merged)
    };

    let mut conflict = fixtures::name_conflict("A", "B");
    conflict.begin_resolving().unwrap();
    conflict.resolve_with(&merge).unwrap();

    let merged = conflict.winning_document().unwrap();
    assert_eq!(merged, doc! { "_id" => 1, "name" => "A+B" });

    let description = UpdateDescription::diff(&fixtures::named("A"), &merged);
    assert_eq!(
        description.to_update_document(),
        doc! { "$set" => doc! { "name" => "A+B" } }
    );
}

#[test]
fn reconciler_routes_by_namespace() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counted = {
        let calls = Arc::clone(&calls);
        move |_: &Value, _: &ChangeEvent, _: &CompactChangeEvent| {
            calls.fetch_add(1, Ordering::SeqCst);
            ConflictResolution::UseLocal
        }
    };

    let reconciler: Reconciler = ReconcilerConfig::new()
        .with_namespace_handler(fixtures::namespace(), counted)
        .build();

    let mut conflict = fixtures::name_conflict("A", "B");
    assert_eq!(
        reconciler.reconcile(&mut conflict).unwrap(),
        &ConflictResolution::UseLocal
    );

    let elsewhere = Namespace::new("foo", "baz");
    assert_eq!(
        reconciler.resolve(
            &elsewhere,
            &fixtures::document_id(),
            &fixtures::local_update("A"),
            &fixtures::remote_update("B"),
        ),
        ConflictResolution::UseRemote
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn reconciler_is_shareable_across_threads() {
    let reconciler: Reconciler = ReconcilerConfig::new()
        .with_default_handler(ConflictPolicy::LocalWins)
        .build();

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let reconciler = reconciler.clone();
            std::thread::spawn(move || {
                let mut conflict = fixtures::name_conflict("A", "B");
                reconciler.reconcile(&mut conflict).unwrap();
                conflict.acknowledge().unwrap()
            })
        })
        .collect();

    for handle in handles {
        assert_eq!(handle.join().unwrap(), ConflictResolution::UseLocal);
    }
}

#[test]
fn policy_loads_from_config() {
    #[derive(serde::Deserialize)]
    struct SyncSettings {
        default_policy: ConflictPolicy,
    }

    let settings: SyncSettings =
        serde_json::from_str(r#"{ "default_policy": "local_wins" }"#).unwrap();
    let reconciler: Reconciler = ReconcilerConfig::new()
        .with_default_handler(settings.default_policy)
        .build();

    let mut conflict = fixtures::name_conflict("A", "B");
    reconciler.reconcile(&mut conflict).unwrap();
    assert_eq!(conflict.winning_document(), Some(fixtures::named("A")));
}
