use anyhow::{Result, anyhow};
use tokio::time::Instant;
use tracing::{error, trace};

use blockscopy::Config;
use blockscopy::pipeline::CopyPipeline;
use blockscopy::pipeline::scheduler::{CycleScheduler, SchedulerState};
use blockscopy::types::metrics::CopyMetrics;
use blockscopy::types::token::create_copy_cancellation_token;

mod ctrl_c_handler;

/// Runs the copy schedule until it completes (single cycle) or is cancelled by a
/// signal (periodic). A failed single cycle is reported as an error.
pub async fn run(config: Config) -> Result<()> {
    let cancellation_token = create_copy_cancellation_token();
    ctrl_c_handler::spawn_ctrl_c_handler(cancellation_token.clone());

    let start_time = Instant::now();
    trace!("blockscopy start.");

    let metrics = CopyMetrics::new_shared()?;
    let pipeline = CopyPipeline::new(config, cancellation_token, metrics).await?;
    let mut scheduler = CycleScheduler::new(pipeline);

    let state = scheduler.run().await;

    let duration_sec = format!("{:.3}", start_time.elapsed().as_secs_f32());
    if state == SchedulerState::Failed {
        error!(duration_sec = duration_sec, "blockscopy failed.");

        return Err(anyhow!("blockscopy failed."));
    }

    trace!(duration_sec = duration_sec, "blockscopy has been completed.");

    Ok(())
}
