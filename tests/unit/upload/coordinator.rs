use super::*;
use crate::upload::remote::MemoryAssetStore;

fn file(name: &str) -> UploadPayload {
    UploadPayload::new(name, "image/png", name.as_bytes().to_vec())
}

fn names(batch: &[UploadPayload]) -> Vec<&str> {
    batch.iter().map(|p| p.file_name.as_str()).collect()
}

#[test]
fn single_files_in_one_window_coalesce_in_order() {
    let mut coord = UploadCoordinator::new(Duration::from_millis(1000));
    let mut remote = MemoryAssetStore::new();
    let t0 = Instant::now();
    let scope = UploadScope::Layer(LayerId(1));

    let mut locals = Vec::new();
    for (i, name) in ["a", "b", "c", "d"].iter().enumerate() {
        let now = t0 + Duration::from_millis(200 * i as u64);
        locals.extend(coord.submit(scope, vec![file(name)], now));
        assert!(coord.pump(now, &mut remote).is_empty());
    }
    assert_eq!(remote.call_count(), 0);
    assert_eq!(coord.pending_in_scope(scope), 4);

    let outcomes = coord.pump(t0 + Duration::from_millis(1000), &mut remote);
    assert_eq!(remote.call_count(), 1);
    assert_eq!(names(&remote.calls()[0]), vec!["a", "b", "c", "d"]);

    let [BatchOutcome::Resolved { resolutions, .. }] = outcomes.as_slice() else {
        panic!("expected one resolved batch, got {outcomes:?}");
    };
    let resolved: Vec<LocalRef> = resolutions.iter().map(|r| r.local.clone()).collect();
    assert_eq!(resolved, locals);
    assert!(!coord.has_pending());
}

#[test]
fn multi_file_submission_dispatches_without_waiting() {
    let mut coord = UploadCoordinator::default();
    let mut remote = MemoryAssetStore::new();
    let now = Instant::now();
    let scope = UploadScope::Layer(LayerId(7));

    let locals = coord.submit(scope, vec![file("x"), file("y"), file("z")], now);
    assert_eq!(locals.len(), 3);

    let outcomes = coord.pump(now, &mut remote);
    assert_eq!(remote.call_count(), 1);
    assert_eq!(remote.calls()[0].len(), 3);

    let BatchOutcome::Resolved { resolutions, .. } = &outcomes[0] else {
        panic!("expected resolved batch");
    };
    let remotes: Vec<&str> = resolutions.iter().map(|r| r.remote.as_str()).collect();
    assert_eq!(remotes, vec!["remote:1", "remote:2", "remote:3"]);
    for (res, local) in resolutions.iter().zip(&locals) {
        assert_eq!(&res.local, local);
    }
}

#[test]
fn scopes_keep_independent_windows() {
    let mut coord = UploadCoordinator::new(Duration::from_millis(1000));
    let mut remote = MemoryAssetStore::new();
    let t0 = Instant::now();
    let a = UploadScope::Layer(LayerId(1));
    let b = UploadScope::Layer(LayerId(2));

    coord.submit(a, vec![file("a1")], t0);
    coord.submit(b, vec![file("b1")], t0 + Duration::from_millis(600));

    let first = coord.pump(t0 + Duration::from_millis(1000), &mut remote);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].scope(), a);
    assert_eq!(coord.pending_in_scope(b), 1);

    let second = coord.pump(t0 + Duration::from_millis(1600), &mut remote);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].scope(), b);
    assert_eq!(remote.call_count(), 2);
}

#[test]
fn later_submissions_do_not_extend_the_window() {
    let mut coord = UploadCoordinator::new(Duration::from_millis(1000));
    let t0 = Instant::now();
    let scope = UploadScope::Draft(DraftId(3));
    coord.submit(scope, vec![file("a")], t0);
    coord.submit(scope, vec![file("b")], t0 + Duration::from_millis(900));
    assert_eq!(
        coord.next_deadline(),
        Some(t0 + Duration::from_millis(1000))
    );
}

#[test]
fn failed_batch_is_not_retried() {
    let mut coord = UploadCoordinator::default();
    let mut remote = MemoryAssetStore::new();
    remote.fail_next(1);
    let now = Instant::now();

    let locals = coord.submit(UploadScope::Background, vec![file("bg"), file("bg2")], now);
    let outcomes = coord.pump(now, &mut remote);
    assert!(matches!(outcomes[0], BatchOutcome::Failed { .. }));
    assert_eq!(coord.failed().len(), 2);
    assert!(coord.failed().contains(&locals[0]));

    assert!(coord.pump(now + Duration::from_secs(10), &mut remote).is_empty());
    assert_eq!(remote.call_count(), 1);
}

#[test]
fn mismatched_reference_count_is_a_failure() {
    struct ShortStore;
    impl RemoteAssetStore for ShortStore {
        fn submit_batch(
            &mut self,
            _files: &[UploadPayload],
        ) -> crate::StrataResult<Vec<RemoteRef>> {
            Ok(vec![RemoteRef("only-one".to_string())])
        }
    }

    let mut coord = UploadCoordinator::default();
    let now = Instant::now();
    coord.submit(UploadScope::Layer(LayerId(1)), vec![file("a"), file("b")], now);
    let outcomes = coord.pump(now, &mut ShortStore);
    let BatchOutcome::Failed { reason, locals, .. } = &outcomes[0] else {
        panic!("expected failure");
    };
    assert_eq!(locals.len(), 2);
    assert!(reason.contains("2 files"));
}

#[test]
fn abandon_scope_clears_window_and_queue() {
    let mut coord = UploadCoordinator::default();
    let mut remote = MemoryAssetStore::new();
    let now = Instant::now();
    let scope = UploadScope::Layer(LayerId(9));
    let locals = coord.submit(scope, vec![file("a")], now);
    assert!(coord.is_pending(&locals[0]));

    assert_eq!(coord.abandon_scope(scope), 1);
    assert!(!coord.is_pending(&locals[0]));
    assert!(coord.flush_all(&mut remote).is_empty());
    assert_eq!(remote.call_count(), 0);
}

#[test]
fn flush_all_ignores_deadlines() {
    let mut coord = UploadCoordinator::new(Duration::from_secs(60));
    let mut remote = MemoryAssetStore::new();
    let now = Instant::now();
    coord.submit(UploadScope::Layer(LayerId(1)), vec![file("a")], now);
    coord.submit(UploadScope::Layer(LayerId(2)), vec![file("b")], now);
    let outcomes = coord.flush_all(&mut remote);
    assert_eq!(outcomes.len(), 2);
    assert_eq!(remote.call_count(), 2);
}

#[test]
fn reserve_local_refs_skips_used_sequence_numbers() {
    let mut coord = UploadCoordinator::default();
    let used = [LocalRef::from_seq(4), LocalRef("foreign".to_string())];
    coord.reserve_local_refs(used.iter());
    assert_eq!(coord.allocate_local(), LocalRef::from_seq(5));
}

#[test]
fn resubmitting_clears_failed_flag() {
    let mut coord = UploadCoordinator::default();
    let mut remote = MemoryAssetStore::new();
    remote.fail_next(1);
    let now = Instant::now();
    let scope = UploadScope::Layer(LayerId(1));
    coord.submit(scope, vec![file("a"), file("b")], now);
    coord.pump(now, &mut remote);
    let failed: Vec<LocalRef> = coord.failed().iter().cloned().collect();

    let tasks = failed
        .iter()
        .map(|local| UploadTask {
            local: local.clone(),
            payload: file("again"),
        })
        .collect();
    coord.resubmit(scope, tasks, now);
    assert!(coord.failed().is_empty());
    let outcomes = coord.pump(now, &mut remote);
    assert!(matches!(outcomes[0], BatchOutcome::Resolved { .. }));
}

#[test]
fn cancelled_files_are_never_sent() {
    let mut coord = UploadCoordinator::default();
    let mut remote = MemoryAssetStore::new();
    let now = Instant::now();
    let scope = UploadScope::Draft(DraftId(3));
    let batch = coord.submit(scope, vec![file("a"), file("b")], now);
    let single = coord.submit(UploadScope::Layer(LayerId(1)), vec![file("c")], now);

    assert!(coord.cancel(&batch[1]));
    assert!(coord.cancel(&single[0]));
    assert!(!coord.cancel(&single[0]));
    assert_eq!(coord.pending_in_scope(UploadScope::Layer(LayerId(1))), 0);
    assert_eq!(coord.next_deadline(), None);

    let outcomes = coord.flush_all(&mut remote);
    assert_eq!(outcomes.len(), 1);
    assert_eq!(remote.call_count(), 1);
    assert_eq!(names(&remote.calls()[0]), vec!["a"]);
}

#[test]
fn cancelling_the_last_file_of_a_batch_drops_the_batch() {
    let mut coord = UploadCoordinator::default();
    let mut remote = MemoryAssetStore::new();
    let locals = coord.submit(
        UploadScope::Background,
        vec![file("a"), file("b")],
        Instant::now(),
    );
    for local in &locals {
        assert!(coord.cancel(local));
    }
    assert!(!coord.has_pending());
    assert!(coord.flush_all(&mut remote).is_empty());
    assert_eq!(remote.call_count(), 0);
}
