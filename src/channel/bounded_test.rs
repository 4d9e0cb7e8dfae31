// ABOUTME: Tests for the bounded channel - FIFO order, capacity, close and drain.
// ABOUTME: Uses tokio-test task harness to assert pending/woken states without timing.

use std::collections::HashMap;
use std::sync::Arc;

use tokio_test::task;
use tokio_test::{assert_pending, assert_ready, assert_ready_eq};

use super::BoundedChannel;
use crate::error::{Closed, ConfigError};

#[test]
fn test_zero_capacity_rejected() {
    let result = BoundedChannel::<u32>::new(0);
    assert!(matches!(result, Err(ConfigError::ZeroCapacity)));
}

#[tokio::test]
async fn test_fifo_single_producer() {
    let channel = BoundedChannel::new(5).unwrap();
    for i in 1..=5 {
        channel.push(i).await.unwrap();
    }
    assert_eq!(channel.len(), 5);

    for expected in 1..=5 {
        assert_eq!(channel.pop().await, Some(expected));
    }
    assert!(channel.is_empty());
}

#[test]
fn test_push_waits_while_full() {
    let channel = BoundedChannel::new(2).unwrap();
    assert_ready_eq!(task::spawn(channel.push(1)).poll(), Ok(()));
    assert_ready_eq!(task::spawn(channel.push(2)).poll(), Ok(()));

    let mut push = task::spawn(channel.push(3));
    assert_pending!(push.poll());
    assert_eq!(channel.len(), 2);

    // Still full, still pending
    assert_pending!(push.poll());

    assert_ready_eq!(task::spawn(channel.pop()).poll(), Some(1));
    assert!(push.is_woken());
    assert_ready_eq!(push.poll(), Ok(()));
    assert_eq!(channel.len(), 2);
}

#[test]
fn test_pop_waits_while_empty() {
    let channel = BoundedChannel::new(2).unwrap();

    let mut pop = task::spawn(channel.pop());
    assert_pending!(pop.poll());

    assert_ready_eq!(task::spawn(channel.push("a")).poll(), Ok(()));
    assert!(pop.is_woken());
    assert_ready_eq!(pop.poll(), Some("a"));
}

#[test]
fn test_close_releases_blocked_pusher() {
    let channel = BoundedChannel::new(1).unwrap();
    assert_ready_eq!(task::spawn(channel.push(1)).poll(), Ok(()));

    let mut push = task::spawn(channel.push(2));
    assert_pending!(push.poll());

    channel.close();
    assert!(push.is_woken());
    assert_ready_eq!(push.poll(), Err(Closed(2)));
}

#[test]
fn test_close_releases_blocked_popper() {
    let channel = BoundedChannel::<u32>::new(1).unwrap();

    let mut pop = task::spawn(channel.pop());
    assert_pending!(pop.poll());

    channel.close();
    assert!(pop.is_woken());
    assert_ready_eq!(pop.poll(), None);
}

#[tokio::test]
async fn test_pop_after_close_returns_remaining_items() {
    let channel = BoundedChannel::new(3).unwrap();
    channel.push(1).await.unwrap();
    channel.push(2).await.unwrap();
    channel.close();

    assert!(channel.is_closed());
    assert_eq!(channel.push(3).await, Err(Closed(3)));
    assert_eq!(channel.pop().await, Some(1));
    assert_eq!(channel.pop().await, Some(2));
    assert_eq!(channel.pop().await, None);

    // Idempotent
    channel.close();
    assert_eq!(channel.pop().await, None);
}

#[test]
fn test_drain_discards_items_and_wakes_pushers() {
    let channel = BoundedChannel::new(2).unwrap();
    assert_ready!(task::spawn(channel.push(1)).poll()).unwrap();
    assert_ready!(task::spawn(channel.push(2)).poll()).unwrap();

    let mut first = task::spawn(channel.push(3));
    let mut second = task::spawn(channel.push(4));
    assert_pending!(first.poll());
    assert_pending!(second.poll());

    assert_eq!(channel.try_drain_all(), 2);
    assert!(channel.is_empty());
    assert!(first.is_woken());
    assert!(second.is_woken());
    assert_ready_eq!(first.poll(), Ok(()));
    assert_ready_eq!(second.poll(), Ok(()));
    assert_eq!(channel.len(), 2);

    assert_eq!(channel.try_drain_all(), 2);
    assert_eq!(channel.try_drain_all(), 0);
}

#[test]
fn test_closed_into_inner() {
    let err = Closed("item");
    assert_eq!(err.to_string(), "channel closed");
    assert_eq!(err.into_inner(), "item");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_fifo_per_producer_under_contention() {
    const PRODUCERS: usize = 4;
    const PER_PRODUCER: u64 = 500;
    const CAPACITY: usize = 8;

    let channel = Arc::new(BoundedChannel::new(CAPACITY).unwrap());
    let mut handles = Vec::new();

    for producer in 0..PRODUCERS {
        let channel = channel.clone();
        handles.push(tokio::spawn(async move {
            for seq in 0..PER_PRODUCER {
                channel.push((producer, seq)).await.unwrap();
            }
        }));
    }

    let consumer = {
        let channel = channel.clone();
        tokio::spawn(async move {
            let mut last_seen: HashMap<usize, u64> = HashMap::new();
            for _ in 0..(PRODUCERS as u64 * PER_PRODUCER) {
                assert!(channel.len() <= CAPACITY);
                let (producer, seq) = channel.pop().await.unwrap();
                if let Some(prev) = last_seen.insert(producer, seq) {
                    assert!(seq > prev, "producer {} went backwards", producer);
                }
            }
            last_seen
        })
    };

    for handle in handles {
        handle.await.unwrap();
    }
    let last_seen = consumer.await.unwrap();

    assert_eq!(last_seen.len(), PRODUCERS);
    for seq in last_seen.values() {
        assert_eq!(*seq, PER_PRODUCER - 1);
    }
    assert!(channel.is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_each_consumer_sees_increasing_order() {
    const TOTAL: u64 = 2000;

    let channel = Arc::new(BoundedChannel::new(4).unwrap());

    let producer = {
        let channel = channel.clone();
        tokio::spawn(async move {
            for seq in 0..TOTAL {
                channel.push(seq).await.unwrap();
            }
            channel.close();
        })
    };

    let mut consumers = Vec::new();
    for _ in 0..3 {
        let channel = channel.clone();
        consumers.push(tokio::spawn(async move {
            let mut seen = Vec::new();
            while let Some(seq) = channel.pop().await {
                seen.push(seq);
            }
            seen
        }));
    }

    producer.await.unwrap();

    let mut all = Vec::new();
    for consumer in consumers {
        let seen = consumer.await.unwrap();
        assert!(seen.windows(2).all(|w| w[0] < w[1]));
        all.extend(seen);
    }

    all.sort_unstable();
    assert_eq!(all, (0..TOTAL).collect::<Vec<_>>());
}
