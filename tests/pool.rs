mod support;

use respool::{Pool, PoolError};
use std::time::Duration;
use support::ScriptedFactory;

#[tokio::test]
async fn max_cap_hands_the_released_handle_to_the_next_waiter() {
    let pool = Pool::builder()
        .max_size(1)
        .min_idle(0)
        .build(ScriptedFactory::new())
        .unwrap();

    let first = pool.acquire().await.unwrap();
    let first_id = first.id;

    let pool2 = pool.clone();
    let second = tokio::spawn(async move { pool2.acquire().await.unwrap() });

    // Give the second acquire a moment to enqueue before we free up the slot.
    tokio::task::yield_now().await;
    drop(first);

    let second = second.await.unwrap();
    assert_eq!(second.id, first_id);

    let state = pool.state().await;
    assert_eq!(state.size, 1);
    assert_eq!(state.available, 0);
    assert_eq!(state.using, 1);
}

#[tokio::test]
async fn sequential_creation_errors_are_delivered_to_the_waiting_caller() {
    let pool = Pool::builder()
        .max_size(1)
        .min_idle(0)
        .build(ScriptedFactory::failing(5))
        .unwrap();

    for attempt in 0..5 {
        match pool.acquire().await {
            Err(PoolError::Factory(_)) => {}
            other => panic!("attempt {attempt} expected a factory error, got {other:?}"),
        }
    }

    let sixth = pool.acquire().await.expect("sixth attempt should succeed");
    assert_eq!(sixth.id, 5);

    let state = pool.state().await;
    assert_eq!(state.waiting, 0);
}

#[tokio::test]
async fn an_invalid_idle_resource_is_destroyed_and_replaced() {
    let factory = ScriptedFactory::rejecting_zero_id();
    let pool = Pool::builder()
        .max_size(2)
        .min_idle(0)
        .build(factory)
        .unwrap();

    let first = pool.acquire().await.unwrap();
    assert_eq!(first.id, 0);
    drop(first);
    // Let the automatic release land before we acquire again.
    tokio::task::yield_now().await;

    let second = pool.acquire().await.unwrap();
    assert_ne!(second.id, 0, "the zero-id handle should have been rejected");

    let second_id = second.id;
    drop(second);
    tokio::task::yield_now().await;

    let state = pool.state().await;
    assert_eq!(state.available, 1);
    assert_eq!(state.using, 0);
    let _ = second_id;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn drain_waits_for_every_outstanding_acquire_to_settle() {
    let pool = Pool::builder()
        .max_size(2)
        .min_idle(0)
        .build(ScriptedFactory::new())
        .unwrap();

    let mut holders = Vec::new();
    for _ in 0..5 {
        let pool = pool.clone();
        holders.push(tokio::spawn(async move {
            let handle = pool.acquire().await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            drop(handle);
        }));
    }

    pool.drain().await;

    for holder in holders {
        holder.await.unwrap();
    }

    let state = pool.state().await;
    assert_eq!(state.available, 0);
    assert_eq!(state.waiting, 0);
    assert_eq!(state.using, 0);

    match pool.acquire().await {
        Err(PoolError::Draining) => {}
        other => panic!("expected draining error after drain, got {other:?}"),
    }
}

#[tokio::test(start_paused = true)]
async fn idle_resources_past_their_timeout_are_reaped() {
    let factory = ScriptedFactory::new();
    let pool = Pool::builder()
        .max_size(2)
        .min_idle(0)
        .idle_timeout(Duration::from_millis(50))
        .reap_interval(Duration::from_millis(10))
        .build(factory)
        .unwrap();

    let h0 = pool.acquire().await.unwrap();
    let h1 = pool.acquire().await.unwrap();
    let (id0, id1) = (h0.id, h1.id);
    drop(h0);
    drop(h1);

    tokio::time::sleep(Duration::from_millis(500)).await;

    let state = pool.state().await;
    assert_eq!(state.size, 0);
    assert_eq!(state.available, 0);
    let _ = (id0, id1);
}

#[tokio::test]
async fn fifo_order_is_preserved_among_waiters() {
    let pool = Pool::builder()
        .max_size(1)
        .min_idle(0)
        .build(ScriptedFactory::new())
        .unwrap();

    let first = pool.acquire().await.unwrap();

    let pool_a = pool.clone();
    let waiter_a = tokio::spawn(async move { pool_a.acquire().await.unwrap() });
    tokio::task::yield_now().await;

    let pool_b = pool.clone();
    let waiter_b = tokio::spawn(async move { pool_b.acquire().await.unwrap() });
    tokio::task::yield_now().await;

    drop(first);
    let a = waiter_a.await.unwrap();
    let a_id = a.id;
    drop(a);
    let b = waiter_b.await.unwrap();

    // `a` must have been served strictly before `b`: both were fulfilled
    // with the single recycled handle, one after the other.
    assert_eq!(a_id, b.id);
}
