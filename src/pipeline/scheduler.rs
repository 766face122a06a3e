use std::time::Duration;

use tokio::select;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info, trace};

use crate::pipeline::CopyPipeline;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Running,
    Succeeded,
    Failed,
    Stopped,
}

/// Drives copy cycles. A zero period runs exactly one cycle. Otherwise a cycle runs
/// immediately and then once per period until the cancellation token fires. A failed
/// cycle never stops the schedule.
pub struct CycleScheduler {
    pipeline: CopyPipeline,
    period: Duration,
    state: SchedulerState,
}

impl CycleScheduler {
    pub fn new(pipeline: CopyPipeline) -> Self {
        let period = pipeline.config().copy_period;

        Self {
            pipeline,
            period,
            state: SchedulerState::Idle,
        }
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn pipeline(&self) -> &CopyPipeline {
        &self.pipeline
    }

    /// Returns `Succeeded` or `Failed` for a single cycle, `Stopped` once a periodic
    /// schedule has been cancelled.
    pub async fn run(&mut self) -> SchedulerState {
        let cancellation_token = self.pipeline.get_cancellation_token();

        if !self.pipeline.config().is_periodic() {
            self.run_cycle().await;
            return self.state;
        }

        let mut interval = tokio::time::interval_at(Instant::now() + self.period, self.period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            if cancellation_token.is_cancelled() {
                break;
            }

            self.run_cycle().await;
            self.state = SchedulerState::Idle;

            select! {
                _ = cancellation_token.cancelled() => {
                    debug!("cancellation_token canceled.");
                    break;
                }
                _ = interval.tick() => {
                    trace!("copy period elapsed.");
                }
            }
        }

        self.state = SchedulerState::Stopped;
        info!("copy scheduler stopped.");

        self.state
    }

    async fn run_cycle(&mut self) {
        self.state = SchedulerState::Running;

        let start_time = Instant::now();
        let report = self.pipeline.run_cycle().await;
        let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());

        let metrics = self.pipeline.get_metrics();
        let dry_run = self.pipeline.config().dry_run;

        if report.is_success() {
            metrics.inc_copy_cycles_succeeded();
            info!(
                dry_run = dry_run,
                duration_sec = duration_sec,
                "finished copying blocks."
            );
            self.state = SchedulerState::Succeeded;
        } else {
            metrics.inc_copy_cycles_failed();
            error!(
                dry_run = dry_run,
                duration_sec = duration_sec,
                "failed to copy blocks."
            );
            self.state = SchedulerState::Failed;
        }

        let snapshot = metrics.snapshot();
        info!(
            copy_cycles_succeeded = snapshot.copy_cycles_succeeded,
            copy_cycles_failed = snapshot.copy_cycles_failed,
            blocks_copied = snapshot.blocks_copied,
            blocks_copy_failed = snapshot.blocks_copy_failed,
            "copy metrics."
        );
    }
}
