mod support;

use proptest::prelude::*;
use respool::Pool;
use support::ScriptedFactory;

const MAX_SIZE: u32 = 3;

/// Drives a pool through a random sequence of acquire/release actions and
/// checks, after each step, that the counters the spec calls out stay
/// internally consistent: the pool never exceeds its ceiling, and the
/// available/using split always sums to something no larger than the total.
fn check_sequence(actions: Vec<bool>) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap();

    rt.block_on(async move {
        let pool = Pool::builder()
            .max_size(MAX_SIZE)
            .min_idle(0)
            .build(ScriptedFactory::new())
            .unwrap();

        let mut held = Vec::new();
        for acquire in actions {
            // Only ever acquire below the ceiling: with no acquire timeout
            // configured, trying to acquire while already holding every
            // resource would wait forever for a release this loop has no
            // other way to schedule.
            if acquire && held.len() < MAX_SIZE as usize {
                if let Ok(handle) = pool.acquire().await {
                    held.push(handle);
                }
            } else if !held.is_empty() {
                held.pop();
            }
            tokio::task::yield_now().await;

            let state = pool.state().await;
            assert!(state.size <= MAX_SIZE, "size {} exceeds max {}", state.size, MAX_SIZE);
            assert!(
                state.available + state.using <= state.size,
                "available ({}) + using ({}) exceeds size ({})",
                state.available,
                state.using,
                state.size
            );
            assert_eq!(
                state.using as usize,
                held.len().min(MAX_SIZE as usize),
                "using count should track live checkouts"
            );
        }
    });
}

proptest! {
    #[test]
    fn pool_invariants_hold_under_random_acquire_release_sequences(
        actions in prop::collection::vec(any::<bool>(), 1..60)
    ) {
        check_sequence(actions);
    }
}
