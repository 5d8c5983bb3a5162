//! Concurrent runner - spawn everything, release together, await all

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;

use tokio::sync::Barrier;
use tokio::task::{JoinSet, LocalSet};

use crate::domain::result::{Error, Result};

/// Type-erased operation, for scenarios that mix operation kinds
pub type Operation<T> = Pin<Box<dyn Future<Output = Result<T>> + 'static>>;

/// Box an operation future so differently-typed operations share one list
pub fn operation<T, F>(fut: F) -> Operation<T>
where
    F: Future<Output = Result<T>> + 'static,
{
    Box::pin(fut)
}

/// Run every operation as its own local task and wait for all of them
///
/// Operations share `Rc<Account>`s, so they run as `spawn_local` tasks on a
/// `LocalSet` driven by the calling thread. Tasks are held at a barrier until
/// all have been spawned so they start together. There is no timeout and
/// nothing is cancelled: every task runs to completion. Results come back in
/// completion order. The first error (or panic) is returned once all tasks are
/// done; it is never swallowed, since a failing operation is a harness bug
/// rather than a race effect.
pub async fn run_concurrently<T, F>(ops: Vec<F>) -> Result<Vec<T>>
where
    F: Future<Output = Result<T>> + 'static,
    T: 'static,
{
    let local = LocalSet::new();
    local.run_until(join_all(ops)).await
}

async fn join_all<T, F>(ops: Vec<F>) -> Result<Vec<T>>
where
    F: Future<Output = Result<T>> + 'static,
    T: 'static,
{
    let total = ops.len();
    let gate = Rc::new(Barrier::new(total));
    let mut tasks = JoinSet::new();

    for op in ops {
        let gate = Rc::clone(&gate);
        tasks.spawn_local(async move {
            gate.wait().await;
            op.await
        });
    }

    let mut results = Vec::with_capacity(total);
    let mut first_error: Option<Error> = None;

    while let Some(joined) = tasks.join_next().await {
        match joined.map_err(Error::from).and_then(|result| result) {
            Ok(value) => results.push(value),
            Err(e) => {
                tracing::warn!(error = %e, "concurrent operation failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(results),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn test_collects_every_result() {
        let ops: Vec<_> = (0..8u32).map(|i| async move { Ok::<_, Error>(i * 2) }).collect();
        let mut results = run_concurrently(ops).await.unwrap();
        results.sort_unstable();
        assert_eq!(results, vec![0, 2, 4, 6, 8, 10, 12, 14]);
    }

    #[tokio::test]
    async fn test_empty_list() {
        let ops: Vec<Operation<u32>> = Vec::new();
        let results = run_concurrently(ops).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_operations_start_before_any_finishes() {
        let started = Rc::new(Cell::new(0usize));
        let ops: Vec<Operation<usize>> = (0..4)
            .map(|_| {
                let started = Rc::clone(&started);
                operation(async move {
                    started.set(started.get() + 1);
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(started.get())
                })
            })
            .collect();

        let results = run_concurrently(ops).await.unwrap();
        assert_eq!(results, vec![4, 4, 4, 4]);
    }

    #[tokio::test]
    async fn test_error_is_propagated_after_all_tasks_finish() {
        let finished = Rc::new(Cell::new(0usize));
        let ops: Vec<Operation<()>> = (0..5)
            .map(|i| {
                let finished = Rc::clone(&finished);
                operation(async move {
                    if i == 2 {
                        return Err(Error::invalid_argument("amount must be positive, got 0"));
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    finished.set(finished.get() + 1);
                    Ok(())
                })
            })
            .collect();

        let err = run_concurrently(ops).await.unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(finished.get(), 4);
    }

    #[tokio::test]
    async fn test_panic_surfaces_as_task_error() {
        let ops: Vec<Operation<()>> = vec![
            operation(async { Ok::<_, Error>(()) }),
            operation(async {
                let explode = true;
                if explode {
                    panic!("boom");
                }
                Ok::<_, Error>(())
            }),
        ];
        let err = run_concurrently(ops).await.unwrap_err();
        assert!(matches!(err, Error::Task(_)));
    }
}
