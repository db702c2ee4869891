//! Concurrency tests for the completion registry.
//!
//! Covers concurrent allocation, racing completions, cross-thread
//! observation of outcomes, and future copies taken on either side of
//! completion.

#[macro_use]
mod common;

use common::*;
use rayon::prelude::*;
use settle::{
    Code, CompletionRegistry, FutureError, FutureStatus, Outcome, RawHandle, RegistryConfig,
    SlotStatus, Status,
};
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;

// ============================================================================
// Allocation
// ============================================================================

#[test]
fn concurrent_allocation_yields_distinct_handles() {
    init_test("concurrent_allocation_yields_distinct_handles");
    const SLOTS: usize = 4_096;
    let registry = CompletionRegistry::with_label("alloc");

    let handles: Vec<RawHandle> = (0..SLOTS)
        .into_par_iter()
        .map(|_| registry.allocate::<usize>().raw())
        .collect();

    let unique: HashSet<RawHandle> = handles.iter().copied().collect();
    assert_with_log!(unique.len() == SLOTS, "distinct handles", SLOTS, unique.len());
    assert_with_log!(registry.len() == SLOTS, "registry len", SLOTS, registry.len());
    assert_with_log!(
        registry.pending_count() == SLOTS,
        "all pending",
        SLOTS,
        registry.pending_count()
    );
    test_complete!("concurrent_allocation_yields_distinct_handles", slots = SLOTS);
}

#[test]
fn interleaved_allocation_does_not_disturb_completed_slots() {
    init_test("interleaved_allocation_does_not_disturb_completed_slots");
    let registry = CompletionRegistry::default();

    // Each task allocates, completes with its own index, then checks it.
    (0..1_024_usize).into_par_iter().for_each(|i| {
        let handle = registry.allocate::<usize>();
        if i % 3 == 0 {
            registry.complete_failure(handle, Code::Aborted, format!("task {i}"));
        } else {
            registry.complete_success(handle, i);
        }
        match registry.query(handle).into_outcome() {
            Some(Outcome::Success(value)) => assert_eq!(*value, i),
            Some(Outcome::Failure(status)) => {
                assert_eq!(status, Status::new(Code::Aborted, format!("task {i}")));
            }
            None => unreachable!("slot {i} lost its completion"),
        }
    });

    assert_eq!(registry.len(), 1_024);
    assert_eq!(registry.pending_count(), 0);
    test_complete!("interleaved_allocation_does_not_disturb_completed_slots");
}

// ============================================================================
// Completion races
// ============================================================================

#[test]
fn racing_completions_have_exactly_one_winner() {
    init_test("racing_completions_have_exactly_one_winner");
    const THREADS: usize = 8;

    for round in 0..64_u32 {
        let registry = CompletionRegistry::default();
        let handle = registry.allocate::<u32>();
        let barrier = Barrier::new(THREADS);
        let winners = AtomicUsize::new(0);

        thread::scope(|scope| {
            for t in 0..THREADS {
                let registry = &registry;
                let barrier = &barrier;
                let winners = &winners;
                scope.spawn(move || {
                    barrier.wait();
                    let result = if t % 2 == 0 {
                        registry.try_complete_success(handle, t as u32)
                    } else {
                        registry.try_complete_failure(handle, Code::Cancelled, "lost")
                    };
                    match result {
                        Ok(()) => {
                            winners.fetch_add(1, Ordering::SeqCst);
                        }
                        Err(err) => {
                            assert_eq!(err, FutureError::AlreadyCompleted { handle: handle.raw() });
                        }
                    }
                });
            }
        });

        assert_eq!(winners.load(Ordering::SeqCst), 1, "round {round}");
        assert_eq!(registry.query(handle).status(), SlotStatus::Completed);
    }
    test_complete!("racing_completions_have_exactly_one_winner");
}

#[test]
fn completion_callbacks_run_exactly_once_under_contention() {
    init_test("completion_callbacks_run_exactly_once_under_contention");
    let registry = CompletionRegistry::default();
    let handle = registry.allocate::<u8>();
    let runs = Arc::new(AtomicUsize::new(0));
    let barrier = Barrier::new(9);

    thread::scope(|scope| {
        for _ in 0..8 {
            let runs = Arc::clone(&runs);
            let registry = &registry;
            let barrier = &barrier;
            scope.spawn(move || {
                barrier.wait();
                registry.on_completion(handle, move |_| {
                    runs.fetch_add(1, Ordering::SeqCst);
                });
            });
        }
        barrier.wait();
        registry.complete_success(handle, 1);
    });

    assert_with_log!(
        runs.load(Ordering::SeqCst) == 8,
        "callback runs",
        8,
        runs.load(Ordering::SeqCst)
    );
    test_complete!("completion_callbacks_run_exactly_once_under_contention");
}

// ============================================================================
// Observation
// ============================================================================

#[test]
fn success_is_visible_from_every_thread() {
    init_test("success_is_visible_from_every_thread");
    let registry = CompletionRegistry::default();
    let handle = registry.allocate::<String>();
    registry.complete_success(handle, "payload".to_string());

    let observed: Vec<String> = (0..16)
        .into_par_iter()
        .map(|_| {
            let future = registry.future(handle);
            assert_eq!(future.status(), FutureStatus::Complete);
            future.result().as_ref().clone()
        })
        .collect();

    assert!(observed.iter().all(|value| value == "payload"));
    test_complete!("success_is_visible_from_every_thread");
}

#[test]
fn readers_never_see_a_partial_outcome() {
    init_test("readers_never_see_a_partial_outcome");
    let registry = CompletionRegistry::default();
    let handle = registry.allocate::<Vec<u64>>();
    let expected: Vec<u64> = (0..256).collect();
    let barrier = Barrier::new(5);

    thread::scope(|scope| {
        for _ in 0..4 {
            let registry = &registry;
            let barrier = &barrier;
            let expected = &expected;
            scope.spawn(move || {
                barrier.wait();
                loop {
                    match registry.query(handle).into_outcome() {
                        None => thread::yield_now(),
                        Some(outcome) => {
                            assert_eq!(outcome.value().map(|v| v.as_slice()), Some(&expected[..]));
                            break;
                        }
                    }
                }
            });
        }
        barrier.wait();
        registry.complete_success_with(handle, |buf| buf.extend(0..256));
    });
    test_complete!("readers_never_see_a_partial_outcome");
}

#[test]
fn copies_before_and_after_completion_agree() {
    init_test("copies_before_and_after_completion_agree");
    let registry = CompletionRegistry::default();
    let handle = registry.allocate::<i64>();
    let before = registry.future(handle);
    let early_copies: Vec<_> = (0..4).map(|_| before.clone()).collect();

    let producer = {
        let registry = registry.clone();
        thread::spawn(move || registry.complete_failure(handle, Code::DeadlineExceeded, "slow"))
    };
    producer.join().expect("producer panicked");

    let after = registry.future(handle);
    for future in early_copies.iter().chain([&before, &after]) {
        assert_eq!(future.status(), FutureStatus::Complete);
        assert_eq!(future.error(), Status::new(Code::DeadlineExceeded, "slow"));
    }
    assert_eq!(before, after);
    test_complete!("copies_before_and_after_completion_agree");
}

#[test]
fn registry_outlives_its_creator_through_futures() {
    init_test("registry_outlives_its_creator_through_futures");
    let future = {
        let registry = CompletionRegistry::new(RegistryConfig::default().label("scoped"));
        let handle = registry.allocate::<u8>();
        let future = registry.future(handle);
        let worker = registry.clone();
        thread::spawn(move || worker.complete_success(handle, 3))
            .join()
            .expect("worker panicked");
        future
    };

    assert_eq!(future.registry().map(CompletionRegistry::ref_count), Some(1));
    assert_eq!(*future.result(), 3);
    test_complete!("registry_outlives_its_creator_through_futures");
}
