use std::future::Future;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use tracing::{debug, error, trace};

use crate::types::error::BlocksCopyError;
use crate::types::token::CopyCancellationToken;

/// The result of processing one unit. A failure never affects sibling units.
#[derive(Debug)]
pub struct UnitOutcome<U, T> {
    pub unit: U,
    pub result: Result<T>,
}

impl<U, T> UnitOutcome<U, T> {
    pub fn is_err(&self) -> bool {
        self.result.is_err()
    }
}

/// Runs `work` over `units` with at most `concurrency` units in flight.
///
/// Units are handed to workers through an MPMC channel. Once the token is cancelled,
/// workers stop picking up new work and every remaining unit resolves to
/// [`BlocksCopyError::Cancelled`]. Outcomes are returned in the order of `units`.
pub async fn run_bounded<U, T, F, Fut>(
    units: Vec<U>,
    concurrency: u16,
    cancellation_token: CopyCancellationToken,
    work: F,
) -> Vec<UnitOutcome<U, T>>
where
    U: Clone + Send + Sync + 'static,
    T: Send + 'static,
    F: Fn(U) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    if units.is_empty() {
        return vec![];
    }

    let (unit_sender, unit_receiver) = async_channel::bounded(units.len());
    for (index, unit) in units.iter().cloned().enumerate() {
        // the channel is sized to hold every unit, so this never waits.
        let _ = unit_sender.send((index, unit)).await;
    }
    unit_sender.close();

    let (outcome_sender, outcome_receiver) = async_channel::unbounded();
    let work = Arc::new(work);
    let worker_size = (concurrency.max(1) as usize).min(units.len());

    let mut join_handles = Vec::with_capacity(worker_size);
    for worker_index in 0..worker_size {
        let unit_receiver = unit_receiver.clone();
        let outcome_sender = outcome_sender.clone();
        let cancellation_token = cancellation_token.clone();
        let work = work.clone();

        join_handles.push(tokio::spawn(async move {
            while let Ok((index, unit)) = unit_receiver.recv().await {
                let result = if cancellation_token.is_cancelled() {
                    trace!(worker_index = worker_index, "unit skipped, cancelled.");
                    Err(anyhow!(BlocksCopyError::Cancelled))
                } else {
                    work(unit).await
                };

                if outcome_sender.send((index, result)).await.is_err() {
                    break;
                }
            }

            trace!(worker_index = worker_index, "worker has been completed.");
        }));
    }
    drop(outcome_sender);

    for join_handle in join_handles {
        if let Err(e) = join_handle.await {
            error!(error = e.to_string(), "worker task failed.");
        }
    }

    let mut results: Vec<Option<Result<T>>> = units.iter().map(|_| None).collect();
    while let Ok((index, result)) = outcome_receiver.try_recv() {
        results[index] = Some(result);
    }

    let outcomes = units
        .into_iter()
        .zip(results)
        .map(|(unit, result)| UnitOutcome {
            unit,
            // a unit without a result was in flight when its worker panicked.
            result: result.unwrap_or_else(|| Err(anyhow!("worker task terminated abnormally."))),
        })
        .collect::<Vec<_>>();

    debug!(
        units = outcomes.len(),
        failed = outcomes.iter().filter(|outcome| outcome.is_err()).count(),
        "all units have been processed."
    );

    outcomes
}
