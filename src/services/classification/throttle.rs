// Throttled Task Runner
// Bounds the number of simultaneously outstanding asynchronous tasks and
// returns their outputs in input order regardless of completion order.

use std::future::Future;
use tokio::task::{JoinError, JoinSet};
use tracing::warn;

/// Run `tasks` with at most `limit` in flight.
///
/// Tasks are admitted strictly in input order: when the pool is full the
/// runner waits for the earliest completion before admitting the next task.
/// Outputs come back in input order, verbatim — a task's `Err` output is the
/// caller's to handle, never swallowed here. Once admitted, a task runs to
/// completion; there is no cancellation.
pub async fn run_throttled<F>(tasks: Vec<F>, limit: usize) -> Vec<F::Output>
where
    F: Future + Send + 'static,
    F::Output: Send + 'static,
{
    let limit = limit.max(1);
    let total = tasks.len();
    let mut slots: Vec<Option<F::Output>> = Vec::with_capacity(total);
    slots.resize_with(total, || None);

    let mut join_set: JoinSet<(usize, F::Output)> = JoinSet::new();
    for (idx, task) in tasks.into_iter().enumerate() {
        while join_set.len() >= limit {
            if let Some(joined) = join_set.join_next().await {
                store(&mut slots, joined);
            }
        }
        join_set.spawn(async move { (idx, task.await) });
    }

    while let Some(joined) = join_set.join_next().await {
        store(&mut slots, joined);
    }

    slots.into_iter().flatten().collect()
}

fn store<T>(slots: &mut [Option<T>], joined: Result<(usize, T), JoinError>) {
    match joined {
        Ok((idx, output)) => slots[idx] = Some(output),
        Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
        // We never abort spawned tasks, so this only fires on runtime
        // shutdown; the slot stays empty.
        Err(err) => warn!("throttled task aborted: {}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::sleep;

    #[tokio::test]
    async fn test_outputs_preserve_input_order() {
        // Later tasks finish first; output order must still match input.
        let tasks: Vec<_> = (0..8u64)
            .map(|i| async move {
                sleep(Duration::from_millis(80 - i * 10)).await;
                i
            })
            .collect();
        let outputs = run_throttled(tasks, 8).await;
        assert_eq!(outputs, (0..8).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn test_concurrency_never_exceeds_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let high_water = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let in_flight = in_flight.clone();
                let high_water = high_water.clone();
                async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    high_water.fetch_max(now, Ordering::SeqCst);
                    sleep(Duration::from_millis(10)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                }
            })
            .collect();

        run_throttled(tasks, 5).await;
        assert!(high_water.load(Ordering::SeqCst) <= 5);
    }

    #[tokio::test]
    async fn test_failing_task_output_propagates() {
        let tasks: Vec<_> = (0..3)
            .map(|i| async move {
                if i == 1 {
                    Err::<i32, String>("boom".to_string())
                } else {
                    Ok(i)
                }
            })
            .collect();
        let outputs = run_throttled(tasks, 2).await;
        assert_eq!(outputs[0], Ok(0));
        assert_eq!(outputs[1], Err("boom".to_string()));
        assert_eq!(outputs[2], Ok(2));
    }

    #[tokio::test]
    async fn test_zero_limit_is_clamped_to_one() {
        let tasks: Vec<_> = (0..3).map(|i| async move { i }).collect();
        let outputs = run_throttled(tasks, 0).await;
        assert_eq!(outputs, vec![0, 1, 2]);
    }
}
