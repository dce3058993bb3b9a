// SPDX-FileCopyrightText: 2026 Calldock Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded-concurrency task runner with isolated failure semantics.
//!
//! Runs N independent async tasks with at most K in flight, scheduling the
//! next queued task as soon as a slot frees. Each task yields a
//! `TaskOutcome` with its result and duration; one task failing never
//! aborts its siblings.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::warn;

use calldock_core::CalldockError;

/// Per-task result collected by the runner.
#[derive(Debug)]
pub struct TaskOutcome<T> {
    /// Position of the task in the input list.
    pub index: usize,
    /// The task's result; errors are isolated per task.
    pub result: Result<T, CalldockError>,
    /// Wall-clock time the task ran for.
    pub duration: Duration,
}

impl<T> TaskOutcome<T> {
    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Run `tasks` with at most `limit` in flight, returning outcomes in input
/// order.
///
/// `limit` of 0 is treated as 1. Panicking tasks are reported as internal
/// errors in their own outcome slot rather than poisoning the batch.
pub async fn run_bounded<T, F, Fut>(tasks: Vec<F>, limit: usize) -> Vec<TaskOutcome<T>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, CalldockError>> + Send + 'static,
    T: Send + 'static,
{
    let limit = limit.max(1);
    let semaphore = Arc::new(Semaphore::new(limit));
    let mut set = JoinSet::new();

    for (index, task) in tasks.into_iter().enumerate() {
        let semaphore = semaphore.clone();
        set.spawn(async move {
            // Acquire never fails: the semaphore is never closed.
            let _permit = semaphore.acquire_owned().await;
            let start = tokio::time::Instant::now();
            let result = task().await;
            TaskOutcome {
                index,
                result,
                duration: start.elapsed(),
            }
        });
    }

    let mut outcomes: Vec<Option<TaskOutcome<T>>> = Vec::new();
    let mut count = 0usize;
    while let Some(joined) = set.join_next().await {
        count += 1;
        match joined {
            Ok(outcome) => {
                let index = outcome.index;
                if index >= outcomes.len() {
                    outcomes.resize_with(index + 1, || None);
                }
                outcomes[index] = Some(outcome);
            }
            Err(join_err) => {
                warn!(error = %join_err, "runner task panicked");
            }
        }
    }

    // Fill any slot lost to a panic with an internal-error outcome.
    if outcomes.len() < count {
        outcomes.resize_with(count, || None);
    }
    outcomes
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| TaskOutcome {
                index,
                result: Err(CalldockError::Internal("task panicked".to_string())),
                duration: Duration::ZERO,
            })
        })
        .collect()
}

/// Run `tasks` in sequential chunks of `chunk_size`, each chunk bounded by
/// `limit`. Outcomes are returned in input order across all chunks.
pub async fn run_chunked<T, F, Fut>(
    tasks: Vec<F>,
    chunk_size: usize,
    limit: usize,
) -> Vec<TaskOutcome<T>>
where
    F: FnOnce() -> Fut + Send + 'static,
    Fut: Future<Output = Result<T, CalldockError>> + Send + 'static,
    T: Send + 'static,
{
    let chunk_size = chunk_size.max(1);
    let mut all = Vec::new();
    let mut tasks = tasks;
    let mut offset = 0usize;

    while !tasks.is_empty() {
        let rest = tasks.split_off(chunk_size.min(tasks.len()));
        let chunk = std::mem::replace(&mut tasks, rest);
        let mut outcomes = run_bounded(chunk, limit).await;
        for outcome in &mut outcomes {
            outcome.index += offset;
        }
        offset += outcomes.len();
        all.extend(outcomes);
    }

    all
}

/// Map every item through `f` with bounded concurrency, then fold the
/// successes with `reduce`. Failed items are returned alongside the
/// accumulated value so the caller decides what partial results mean.
pub async fn map_reduce<I, T, A, F, Fut, R>(
    items: Vec<I>,
    limit: usize,
    f: F,
    init: A,
    reduce: R,
) -> (A, Vec<TaskOutcome<T>>)
where
    I: Send + 'static,
    T: Send + 'static,
    F: Fn(I) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, CalldockError>> + Send + 'static,
    R: Fn(A, &T) -> A,
{
    let f = Arc::new(f);
    let tasks: Vec<_> = items
        .into_iter()
        .map(|item| {
            let f = f.clone();
            move || f(item)
        })
        .collect();

    let outcomes = run_bounded(tasks, limit).await;
    let mut acc = init;
    let mut failures = Vec::new();
    for outcome in outcomes {
        match &outcome.result {
            Ok(value) => acc = reduce(acc, value),
            Err(_) => failures.push(outcome),
        }
    }
    (acc, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn outcomes_preserve_input_order() {
        let tasks: Vec<_> = (0..8u64)
            .map(|i| {
                move || async move {
                    // Later tasks finish first.
                    tokio::time::sleep(Duration::from_millis(20 - 2 * i)).await;
                    Ok::<_, CalldockError>(i)
                }
            })
            .collect();

        let outcomes = run_bounded(tasks, 8).await;
        assert_eq!(outcomes.len(), 8);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.index, i);
            assert_eq!(*outcome.result.as_ref().unwrap(), i as u64);
        }
    }

    #[tokio::test]
    async fn never_exceeds_concurrency_limit() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));

        let tasks: Vec<_> = (0..20)
            .map(|_| {
                let in_flight = in_flight.clone();
                let peak = peak.clone();
                move || async move {
                    let now = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    Ok::<_, CalldockError>(())
                }
            })
            .collect();

        run_bounded(tasks, 3).await;
        assert!(peak.load(Ordering::SeqCst) <= 3, "peak concurrency exceeded limit");
    }

    #[tokio::test]
    async fn failing_task_does_not_abort_siblings() {
        let tasks: Vec<_> = (0..5u32)
            .map(|i| {
                move || async move {
                    if i == 2 {
                        Err(CalldockError::transient("task 2 failed"))
                    } else {
                        Ok(i)
                    }
                }
            })
            .collect();

        let outcomes = run_bounded(tasks, 2).await;
        assert_eq!(outcomes.len(), 5);
        assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 4);
        assert!(!outcomes[2].is_success());
    }

    #[tokio::test]
    async fn zero_limit_treated_as_one() {
        let tasks = vec![|| async { Ok::<_, CalldockError>(1) }];
        let outcomes = run_bounded(tasks, 0).await;
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_success());
    }

    #[tokio::test]
    async fn empty_task_list_yields_empty_outcomes() {
        let tasks: Vec<fn() -> std::future::Ready<Result<(), CalldockError>>> = vec![];
        let outcomes = run_bounded(tasks, 4).await;
        assert!(outcomes.is_empty());
    }

    #[tokio::test]
    async fn panicking_task_is_isolated() {
        let tasks: Vec<Box<dyn FnOnce() -> futures::future::BoxFuture<'static, Result<u32, CalldockError>> + Send>> = vec![
            Box::new(|| Box::pin(async { Ok(1) })),
            Box::new(|| Box::pin(async { panic!("boom") })),
            Box::new(|| Box::pin(async { Ok(3) })),
        ];

        let outcomes = run_bounded(tasks, 3).await;
        assert_eq!(outcomes.len(), 3);
        assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 2);
    }

    #[tokio::test]
    async fn chunked_preserves_global_order() {
        let tasks: Vec<_> = (0..7u32)
            .map(|i| move || async move { Ok::<_, CalldockError>(i * 10) })
            .collect();

        let outcomes = run_chunked(tasks, 3, 2).await;
        assert_eq!(outcomes.len(), 7);
        for (i, outcome) in outcomes.iter().enumerate() {
            assert_eq!(outcome.index, i);
            assert_eq!(*outcome.result.as_ref().unwrap(), i as u32 * 10);
        }
    }

    #[tokio::test]
    async fn map_reduce_accumulates_successes_and_reports_failures() {
        let items = vec![1u32, 2, 3, 4];
        let (sum, failures) = map_reduce(
            items,
            2,
            |i| async move {
                if i == 3 {
                    Err(CalldockError::transient("no"))
                } else {
                    Ok(i)
                }
            },
            0u32,
            |acc, v| acc + v,
        )
        .await;

        assert_eq!(sum, 1 + 2 + 4);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].index, 2);
    }
}
