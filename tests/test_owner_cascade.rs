//! Owner deletion cascade against the in-process store:
//! exclusive vs shared horses, archival, atomicity under injected faults,
//! missing owners and retries.

mod common;

use chrono::Utc;
use common::{racing_service, racing_store};
use horse_racing_admin::storage::FaultPoint;
use horse_racing_admin::{DomainError, RequestContext};

#[tokio::test]
async fn deleting_an_owner_removes_only_exclusively_owned_horses() {
    let store = racing_store();
    let service = racing_service(&store);

    let summary = service
        .delete_owner(&RequestContext::admin(), "O1")
        .await
        .unwrap();

    assert_eq!(summary.owner_id, "O1");
    assert_eq!(summary.deleted_horses, vec!["H10".to_string()]);
    assert_eq!(summary.released_edges, 2);
    assert_eq!(summary.deleted_results, 2);

    let after = store.snapshot().await;
    assert!(after.owner("O1").is_none());

    // H10 was O1's alone: gone together with both of its results.
    assert!(after.horse("H10").is_none());
    assert!(after.results_of_horse("H10").is_empty());

    // H11 is still owned by O2 and keeps its result.
    assert!(after.horse("H11").is_some());
    assert_eq!(after.owner_count("H11"), 1);
    assert!(after.owns("O2", "H11"));
    assert!(!after.owns("O1", "H11"));
    assert_eq!(after.results_of_horse("H11").len(), 1);

    // Unrelated rows untouched.
    assert!(after.horse("H12").is_some());
    assert!(after.owner("O2").is_some());
    assert!(after.race("race1").is_some());
    assert!(after.race("race2").is_some());
}

#[tokio::test]
async fn deleted_horses_are_archived_with_their_last_state() {
    let store = racing_store();
    let service = racing_service(&store);
    let before = store.snapshot().await;
    let h10 = before.horse("H10").cloned().unwrap();

    let started = Utc::now();
    service
        .delete_owner(&RequestContext::admin(), "O1")
        .await
        .unwrap();

    let after = store.snapshot().await;
    let archive = after.archive();
    assert_eq!(archive.len(), 1);

    let entry = &archive[0];
    assert_eq!(entry.horse_id, h10.horse_id);
    assert_eq!(entry.horse_name, h10.horse_name);
    assert_eq!(entry.age, h10.age);
    assert_eq!(entry.gender, h10.gender);
    assert_eq!(entry.registration, h10.registration);
    assert_eq!(entry.stable_id.as_deref(), Some(h10.stable_id.as_str()));
    assert!(entry.deleted_at >= started);
}

#[tokio::test]
async fn owner_without_horses_is_deleted_without_archiving_anything() {
    let store = racing_store();
    let service = racing_service(&store);

    let summary = service
        .delete_owner(&RequestContext::admin(), "O3")
        .await
        .unwrap();

    assert!(summary.deleted_horses.is_empty());
    assert_eq!(summary.released_edges, 0);
    let after = store.snapshot().await;
    assert!(after.owner("O3").is_none());
    assert!(after.archive().is_empty());
}

#[tokio::test]
async fn injected_failures_leave_the_store_untouched() {
    let faults = [
        FaultPoint::DeleteOwnership,
        FaultPoint::OrphanScan,
        FaultPoint::DeleteHorse,
        FaultPoint::DeleteOwner,
        FaultPoint::Commit,
    ];

    for fault in faults {
        let store = racing_store();
        let service = racing_service(&store);
        let before = store.snapshot().await;

        store.arm_fault(fault);
        let err = service
            .delete_owner(&RequestContext::admin(), "O1")
            .await
            .unwrap_err();

        assert!(
            matches!(err, DomainError::StoreUnavailable(_)),
            "{:?}: unexpected error {:?}",
            fault,
            err
        );
        assert!(err.is_retryable());
        assert!(
            store.snapshot().await == before,
            "{:?}: store changed after a failed deletion",
            fault
        );

        // The fault fired once; the same call now goes through.
        let summary = service
            .delete_owner(&RequestContext::admin(), "O1")
            .await
            .unwrap();
        assert_eq!(summary.deleted_horses, vec!["H10".to_string()]);
    }
}

#[tokio::test]
async fn missing_owner_is_not_found_and_writes_nothing() {
    let store = racing_store();
    let service = racing_service(&store);
    let before = store.snapshot().await;

    let err = service
        .delete_owner(&RequestContext::admin(), "O404")
        .await
        .unwrap_err();

    assert!(matches!(err, DomainError::NotFound { entity: "owner", .. }));
    assert!(store.snapshot().await == before);
}

#[tokio::test]
async fn repeating_a_successful_deletion_reports_not_found() {
    let store = racing_store();
    let service = racing_service(&store);

    service
        .delete_owner(&RequestContext::admin(), "O1")
        .await
        .unwrap();
    let after_first = store.snapshot().await;

    let err = service
        .delete_owner(&RequestContext::admin(), "O1")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "NOT_FOUND");
    assert!(store.snapshot().await == after_first);
}

#[tokio::test]
async fn shared_horse_goes_once_its_last_owner_is_deleted() {
    let store = racing_store();
    let service = racing_service(&store);

    let first = service
        .delete_owner(&RequestContext::admin(), "O1")
        .await
        .unwrap();
    let second = service
        .delete_owner(&RequestContext::admin(), "O2")
        .await
        .unwrap();

    assert_eq!(first.deleted_horses, vec!["H10".to_string()]);
    assert_eq!(
        second.deleted_horses,
        vec!["H11".to_string(), "H12".to_string()]
    );

    let after = store.snapshot().await;
    let archived: Vec<&str> = after.archive().iter().map(|a| a.horse_id.as_str()).collect();
    assert_eq!(archived, vec!["H10", "H11", "H12"]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_deletions_sharing_a_horse_archive_it_exactly_once() {
    let store = racing_store();
    let service = racing_service(&store);

    let a = {
        let service = service.clone();
        tokio::spawn(async move { service.delete_owner(&RequestContext::admin(), "O1").await })
    };
    let b = {
        let service = service.clone();
        tokio::spawn(async move { service.delete_owner(&RequestContext::admin(), "O2").await })
    };
    a.await.unwrap().unwrap();
    b.await.unwrap().unwrap();

    let after = store.snapshot().await;
    assert!(after.horse("H11").is_none());
    let h11_entries = after
        .archive()
        .iter()
        .filter(|a| a.horse_id == "H11")
        .count();
    assert_eq!(h11_entries, 1);
    assert_eq!(after.archive().len(), 3);
}

#[tokio::test]
async fn deleting_a_horse_directly_archives_it_and_clears_its_links() {
    let store = racing_store();
    let service = racing_service(&store);

    let deleted_results = service
        .delete_horse(&RequestContext::admin(), "H11")
        .await
        .unwrap();
    assert_eq!(deleted_results, 1);

    let after = store.snapshot().await;
    assert!(after.horse("H11").is_none());
    assert_eq!(after.owner_count("H11"), 0);
    assert!(after.owner("O1").is_some());
    assert!(after.owner("O2").is_some());
    assert_eq!(after.archive().len(), 1);
    assert_eq!(after.archive()[0].horse_id, "H11");

    let err = service
        .delete_horse(&RequestContext::admin(), "H11")
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::NotFound { entity: "horse", .. }));
}

#[tokio::test]
async fn failed_horse_deletion_is_rolled_back() {
    for fault in [FaultPoint::DeleteHorse, FaultPoint::Commit] {
        let store = racing_store();
        let service = racing_service(&store);
        let before = store.snapshot().await;

        store.arm_fault(fault);
        let err = service
            .delete_horse(&RequestContext::admin(), "H10")
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::StoreUnavailable(_)), "{:?}", fault);
        assert!(store.snapshot().await == before, "{:?}", fault);
    }
}

#[tokio::test]
async fn guests_cannot_delete_owners() {
    let store = racing_store();
    let service = racing_service(&store);
    let before = store.snapshot().await;

    let err = service
        .delete_owner(&RequestContext::guest(), "O1")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "FORBIDDEN");
    assert!(store.snapshot().await == before);
}
