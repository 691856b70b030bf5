//! Bounded fan-out for per-week fetches.

use futures_util::FutureExt;
use futures_util::future::join_all;
use log::warn;
use std::fmt::Display;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicUsize, Ordering};

/// In-flight ceiling used for week fetches.
pub const FETCH_CONCURRENCY: usize = 6;

/// Run `worker` over `items` with at most `limit` calls in flight.
///
/// Workers pull the next unclaimed index as soon as they finish one, so a slow
/// item never holds up the rest. Output order matches `items`; an item whose
/// worker errors or panics yields `None` without disturbing its siblings.
pub async fn map_concurrent<I, T, E, F, Fut>(items: &[I], limit: usize, worker: F) -> Vec<Option<T>>
where
    F: Fn(&I, usize) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let next = AtomicUsize::new(0);
    let (next, worker) = (&next, &worker);
    let lanes = limit.max(1).min(items.len());

    let lane_results = join_all((0..lanes).map(|_| async move {
        let mut done: Vec<(usize, Option<T>)> = Vec::new();
        loop {
            let index = next.fetch_add(1, Ordering::SeqCst);
            let Some(item) = items.get(index) else {
                break;
            };
            // Calling the worker inside the wrapped future also catches panics
            // raised before its first poll.
            let outcome = AssertUnwindSafe(async { worker(item, index).await })
                .catch_unwind()
                .await;
            let value = match outcome {
                Ok(Ok(value)) => Some(value),
                Ok(Err(e)) => {
                    warn!("item {index} failed: {e}");
                    None
                }
                Err(_) => {
                    warn!("item {index} panicked");
                    None
                }
            };
            done.push((index, value));
        }
        done
    }))
    .await;

    let mut results: Vec<Option<T>> = (0..items.len()).map(|_| None).collect();
    for (index, value) in lane_results.into_iter().flatten() {
        results[index] = value;
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::sync::Arc;
    use std::time::Duration;

    /// Tracks how many calls are running at once.
    #[derive(Default)]
    struct InFlight {
        current: AtomicUsize,
        peak: AtomicUsize,
    }

    impl InFlight {
        fn enter(&self) {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
        }

        fn exit(&self) {
            self.current.fetch_sub(1, Ordering::SeqCst);
        }
    }

    #[tokio::test]
    async fn matches_sequential_map_when_limit_covers_all_items() {
        let items: Vec<u32> = (1..=8).collect();
        let results = map_concurrent(&items, 16, |n, _| {
            let n = *n;
            async move {
                if n % 3 == 0 {
                    Err(format!("{n} is unlucky"))
                } else {
                    Ok(n * 10)
                }
            }
        })
        .await;

        let expected: Vec<Option<u32>> = items
            .iter()
            .map(|n| if n % 3 == 0 { None } else { Some(n * 10) })
            .collect();
        assert_eq!(results, expected);
    }

    #[tokio::test(start_paused = true)]
    async fn never_exceeds_limit_and_keeps_order() {
        let probe = Arc::new(InFlight::default());
        let items: Vec<u64> = vec![50, 5, 40, 1, 30, 2, 20, 3, 10, 4, 60, 7];

        let results = map_concurrent(&items, 3, |delay, index| {
            let probe = probe.clone();
            let delay = *delay;
            async move {
                probe.enter();
                tokio::time::sleep(Duration::from_millis(delay)).await;
                probe.exit();
                Ok::<_, Infallible>(index)
            }
        })
        .await;

        assert_eq!(probe.peak.load(Ordering::SeqCst), 3);
        let order: Vec<usize> = results.into_iter().map(Option::unwrap).collect();
        assert_eq!(order, (0..items.len()).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn panicking_item_is_isolated() {
        let items = ["ok", "boom", "ok"];
        let results = map_concurrent(&items, 2, |s, _| {
            let s = *s;
            async move {
                if s == "boom" {
                    panic!("worker blew up");
                }
                Ok::<_, Infallible>(s.len())
            }
        })
        .await;
        assert_eq!(results, vec![Some(2), None, Some(2)]);
    }

    #[tokio::test]
    async fn worker_panicking_before_returning_a_future_is_isolated() {
        let items = [1u8, 2, 3];
        let results = map_concurrent(&items, 2, |n, _| {
            assert_ne!(*n, 2, "refusing to build a future");
            let n = *n;
            async move { Ok::<_, Infallible>(n) }
        })
        .await;
        assert_eq!(results, vec![Some(1), None, Some(3)]);
    }

    #[tokio::test]
    async fn empty_input_and_zero_limit() {
        let none: Vec<Option<u8>> = map_concurrent(&[] as &[u8], 4, |n, _| {
            let n = *n;
            async move { Ok::<_, Infallible>(n) }
        })
        .await;
        assert!(none.is_empty());

        let items = [1u8, 2, 3];
        let all = map_concurrent(&items, 0, |n, _| {
            let n = *n;
            async move { Ok::<_, Infallible>(n) }
        })
        .await;
        assert_eq!(all, vec![Some(1), Some(2), Some(3)]);
    }
}
