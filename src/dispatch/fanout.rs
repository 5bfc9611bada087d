use futures::stream::{self, StreamExt};
use std::future::Future;

/// Run `f` over every item with at most `limit` futures in flight.
///
/// Output order matches input order regardless of completion order, and the
/// call resolves only once every item has.
pub async fn bounded<I, T, F, Fut, R>(items: I, limit: usize, f: F) -> Vec<R>
where
    I: IntoIterator<Item = T>,
    F: FnMut(T) -> Fut,
    Fut: Future<Output = R>,
{
    stream::iter(items)
        .map(f)
        .buffered(limit.max(1))
        .collect()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn test_preserves_input_order() {
        // Later items finish first
        let results = bounded(vec![30u64, 20, 10, 0], 4, |delay| async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            delay
        })
        .await;

        assert_eq!(results, vec![30, 20, 10, 0]);
    }

    #[tokio::test]
    async fn test_respects_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        bounded(0..10, 3, |_| {
            let in_flight = in_flight.clone();
            let peak = peak.clone();
            async move {
                let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(5)).await;
                in_flight.fetch_sub(1, Ordering::SeqCst);
            }
        })
        .await;

        assert!(peak.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_zero_limit_still_runs() {
        let results = bounded(vec![1, 2], 0, |n| async move { n * 2 }).await;
        assert_eq!(results, vec![2, 4]);
    }
}
