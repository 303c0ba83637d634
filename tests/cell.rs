mod support;

use std::sync::{Arc, Mutex};

use optimistic_rust::{MutationError, OptimisticCell, OptimisticState, RollbackPolicy, Transition};
use proptest::prelude::*;
use support::manual;

#[derive(Clone, Debug, PartialEq)]
struct Profile {
    name: String,
    bio: String,
}

fn profile(name: &str, bio: &str) -> Profile {
    Profile {
        name: name.to_string(),
        bio: bio.to_string(),
    }
}

#[tokio::test]
async fn confirmation_overrides_speculation() {
    let cell = OptimisticCell::new(profile("ada", ""));
    let (reply, confirm) = manual();

    let pending = cell.update(profile("Ada", "mathematician"), || confirm);
    assert_eq!(cell.data().name, "Ada");
    assert!(cell.is_optimistic());

    // server normalizes the name
    reply.ok(profile("Ada Lovelace", "mathematician"));
    let confirmed = pending.await;

    assert_eq!(confirmed, Some(profile("Ada Lovelace", "mathematician")));
    assert_eq!(cell.data(), profile("Ada Lovelace", "mathematician"));
    assert!(!cell.is_optimistic());
    assert!(cell.error().is_none());
}

#[tokio::test]
async fn failure_restores_and_reports() {
    let cell = OptimisticCell::new(profile("ada", ""));

    let result = cell
        .update(profile("ada", "too long"), || async {
            Err::<Profile, _>("bio exceeds 160 characters")
        })
        .await;

    assert_eq!(result, None);
    let state = cell.state();
    assert_eq!(state.data, profile("ada", ""));
    assert!(!state.is_optimistic);
    let err = state.error.unwrap();
    assert!(err.is_rejected());
    assert!(err.to_string().contains("bio exceeds 160 characters"));
}

#[tokio::test]
async fn set_discards_pending_and_late_results() {
    let cell = OptimisticCell::new(1);
    let (reply, confirm) = manual();
    let pending = cell.update(2, || confirm);

    cell.set(10);
    assert_eq!(cell.data(), 10);
    assert!(!cell.is_optimistic());
    assert_eq!(cell.in_flight(), 0);

    reply.fail("too late");
    assert_eq!(pending.await, None);
    assert_eq!(cell.data(), 10);
    assert!(cell.error().is_none());
}

#[tokio::test]
async fn latest_policy_restores_most_recent_snapshot() {
    let cell = OptimisticCell::new(0);
    let (first, confirm_first) = manual();
    let (second, confirm_second) = manual();

    let a = cell.update(1, || confirm_first);
    let b = cell.update(2, || confirm_second);
    assert_eq!(cell.data(), 2);

    // the snapshot was taken right before the second update
    first.fail("conflict");
    assert_eq!(a.await, None);
    assert_eq!(cell.data(), 1);
    assert!(!cell.is_optimistic());

    second.ok(20);
    assert_eq!(b.await, Some(20));
    assert_eq!(cell.data(), 20);
    assert!(cell.error().is_none());
}

#[tokio::test]
async fn isolated_policy_reverts_only_the_failed_update() {
    let cell = OptimisticCell::builder(0)
        .rollback(RollbackPolicy::Isolated)
        .build();
    let (first, confirm_first) = manual();
    let (second, confirm_second) = manual();

    let a = cell.update(1, || confirm_first);
    let b = cell.update(2, || confirm_second);

    first.fail("conflict");
    assert_eq!(a.await, None);
    assert_eq!(cell.data(), 2);
    assert!(cell.is_optimistic());
    assert!(cell.error().is_some());

    second.fail("offline");
    assert_eq!(b.await, None);
    assert_eq!(cell.data(), 0);
    assert!(!cell.is_optimistic());
}

#[tokio::test]
async fn isolated_policy_keeps_newest_confirmation() {
    let cell = OptimisticCell::builder(0)
        .rollback(RollbackPolicy::Isolated)
        .build();
    let (first, confirm_first) = manual();
    let (second, confirm_second) = manual();

    let a = cell.update(1, || confirm_first);
    let b = cell.update(2, || confirm_second);

    second.ok(20);
    assert_eq!(b.await, Some(20));
    assert_eq!(cell.data(), 20);
    assert!(cell.is_optimistic());

    first.ok(10);
    assert_eq!(a.await, Some(10));
    assert_eq!(cell.data(), 20);
    assert!(!cell.is_optimistic());
}

#[tokio::test]
async fn observers_see_every_transition_in_order() {
    let cell = OptimisticCell::new(0);
    let seen: Arc<Mutex<Vec<(Transition, i32, bool)>>> = Arc::default();

    let log = Arc::clone(&seen);
    let _sub = cell.subscribe(move |transition, state: &OptimisticState<i32>| {
        log.lock()
            .unwrap()
            .push((transition, state.data, state.is_optimistic));
    });

    cell.update(1, || async { Ok::<_, String>(1) }).await;
    cell.update(2, || async { Err::<i32, _>("nope") }).await;
    cell.reset();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            (Transition::Speculative, 1, true),
            (Transition::Confirmed, 1, false),
            (Transition::Speculative, 2, true),
            (Transition::RolledBack, 1, false),
            (Transition::Reset, 0, false),
        ]
    );
}

#[tokio::test]
async fn observer_can_read_the_cell() {
    let cell = OptimisticCell::new(0);
    let reads = Arc::new(Mutex::new(Vec::new()));

    let handle = cell.clone();
    let log = Arc::clone(&reads);
    let _sub = cell.subscribe(move |_, _| log.lock().unwrap().push(handle.data()));

    cell.update(5, || async { Ok::<_, String>(6) }).await;

    assert_eq!(*reads.lock().unwrap(), vec![5, 6]);
}

#[tokio::test]
async fn error_hook_sees_rolled_back_state() {
    let observed: Arc<Mutex<Option<(String, i32)>>> = Arc::default();
    let sink = Arc::clone(&observed);
    let cell = OptimisticCell::builder(3)
        .on_error(move |err: &MutationError, state: &OptimisticState<i32>| {
            *sink.lock().unwrap() = Some((err.to_string(), state.data));
        })
        .build();

    cell.update(4, || async { Err::<i32, _>("quota exceeded") }).await;

    let (message, data) = observed.lock().unwrap().clone().unwrap();
    assert!(message.contains("quota exceeded"));
    assert_eq!(data, 3);
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #[test]
    fn failed_updates_leave_value_unchanged(initial in any::<i64>(), values in prop::collection::vec(any::<i64>(), 1..8)) {
        runtime().block_on(async {
            let cell = OptimisticCell::new(initial);
            for value in values {
                let result = cell.update(value, || async { Err::<i64, _>("rejected") }).await;
                assert_eq!(result, None);
                assert_eq!(cell.data(), initial);
                assert!(!cell.is_optimistic());
            }
        });
    }

    #[test]
    fn isolated_cell_settles_on_newest_success(
        outcomes in prop::collection::vec(any::<bool>(), 1..8),
        order in prop::collection::vec(any::<u32>(), 8),
    ) {
        runtime().block_on(async {
            let cell = OptimisticCell::builder(-1_i64)
                .rollback(RollbackPolicy::Isolated)
                .build();

            let mut started = Vec::new();
            for (index, _) in outcomes.iter().enumerate() {
                let (reply, confirm) = manual();
                let pending = cell.update(index as i64, || confirm);
                started.push((reply, pending));
            }

            let mut settle: Vec<usize> = (0..outcomes.len()).collect();
            settle.sort_by_key(|index| (order[*index], *index));

            let mut slots: Vec<_> = started.into_iter().map(Some).collect();
            for index in settle {
                let (reply, pending) = slots[index].take().unwrap();
                if outcomes[index] {
                    reply.ok(index as i64 * 10);
                } else {
                    reply.fail("rejected");
                }
                pending.await;
            }

            let expected = outcomes
                .iter()
                .rposition(|ok| *ok)
                .map_or(-1, |index| index as i64 * 10);
            assert_eq!(cell.data(), expected);
            assert!(!cell.is_optimistic());
        });
    }
}
