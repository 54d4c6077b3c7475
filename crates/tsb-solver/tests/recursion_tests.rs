use super::*;

#[test]
fn cycle_is_detected_until_leave() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::with_profile(RecursionProfile::Relation);
    assert_eq!(guard.enter(1), RecursionResult::Entered);
    assert_eq!(guard.enter(1), RecursionResult::Cycle);
    assert_eq!(guard.entered_at(&1), Some(0));
    guard.leave(1);
    assert_eq!(guard.entered_at(&1), None);
    assert_eq!(guard.depth(), 0);
}

#[test]
fn keys_remember_their_entry_depth() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::with_profile(RecursionProfile::Relation);
    assert_eq!(guard.enter(7), RecursionResult::Entered);
    assert_eq!(guard.enter(8), RecursionResult::Entered);
    assert_eq!(guard.enter(9), RecursionResult::Entered);
    assert_eq!(guard.entered_at(&8), Some(1));
    assert_eq!(guard.entered_at(&9), Some(2));
    assert_eq!(guard.depth(), 3);
    guard.leave(9);
    guard.leave(8);
    guard.leave(7);
    assert_eq!(guard.depth(), 0);
}

#[test]
fn depth_limit_denies_entry() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::with_profile(RecursionProfile::Custom {
        max_depth: 2,
        max_iterations: 100,
    });
    assert_eq!(guard.enter(1), RecursionResult::Entered);
    assert_eq!(guard.enter(2), RecursionResult::Entered);
    assert_eq!(guard.enter(3), RecursionResult::DepthExceeded);
    assert_eq!(guard.entered_at(&3), None);
    guard.leave(2);
    guard.leave(1);
}

#[test]
fn iteration_budget_counts_denied_attempts() {
    let mut guard: RecursionGuard<u32> = RecursionGuard::new(10, 3);
    for key in 0..3 {
        assert_eq!(guard.enter(key), RecursionResult::Entered);
        guard.leave(key);
    }
    assert_eq!(guard.enter(9), RecursionResult::IterationExceeded);
}

#[test]
fn depth_counter_refuses_past_limit() {
    let mut counter = DepthCounter::with_profile(RecursionProfile::ShallowTraversal);
    let mut entered = 0;
    while counter.enter() {
        entered += 1;
    }
    assert_eq!(entered, 20);
    for _ in 0..entered {
        counter.leave();
    }
    assert!(counter.enter());
}
