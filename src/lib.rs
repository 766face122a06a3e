/*!
# Overview
blockscopy mirrors immutable, tenant-partitioned TSDB blocks from a source bucket to a
target bucket.

A source bucket is laid out as `<tenant>/<block ID>/...`, where every block is a set of
objects plus a `meta.json` descriptor. Once a block has been copied, blockscopy writes a
zero-length marker `<tenant>/markers/<block ID>-copied-<target bucket>` next to it in the
source bucket, so the next run skips it.

## Features
- Safe to re-run: partial failures and restarts never corrupt the target bucket.
  `meta.json` is always the last object written, so readers of the target never see a
  half-copied block as complete.
- Skips blocks that are already copied, marked for deletion, or shorter than a minimum
  duration (`--min-block-duration`, 24h by default).
- Two-level bounded concurrency: `--tenant-concurrency` tenants at a time, and
  `--block-concurrency` blocks at a time within each tenant. A failing tenant or block
  never stops its siblings.
- Runs once, or periodically with `--copy-period`.
- S3 (and S3-compatible storage) or local directories on either side. S3 to S3 copies
  are performed server-side with `CopyObject`, or `UploadPartCopy` for objects at or
  above `--multipart-threshold`. Other copies stream the object bodies, with multipart
  uploads for large objects.
- Counters (`cortex_blocks_copy_*_total`) are kept in a `prometheus` registry owned by
  [`types::metrics::CopyMetrics`].
- `--dry-run` reports what would be copied without writing anything.

## As a library
blockscopy CLI is a thin wrapper of the blockscopy library.

Example usage
=============

```Toml
[dependencies]
blockscopy = "0.1"
tokio = { version = "1", features = ["full"] }
```

```no_run
use blockscopy::config::args::build_config_from_args;
use blockscopy::pipeline::CopyPipeline;
use blockscopy::pipeline::scheduler::{CycleScheduler, SchedulerState};
use blockscopy::types::metrics::CopyMetrics;
use blockscopy::types::token::create_copy_cancellation_token;

#[tokio::main]
async fn main() {
    // You can use all the arguments for blockscopy CLI.
    let args = vec![
        "program_name",
        "--min-block-duration",
        "12h",
        "--tenant-concurrency",
        "2",
        "s3://source-bucket",
        "s3://target-bucket",
    ];
    let config = build_config_from_args(args).unwrap();

    // The token can be cancelled from another task to stop copying.
    let cancellation_token = create_copy_cancellation_token();
    let metrics = CopyMetrics::new_shared().unwrap();

    let pipeline = CopyPipeline::new(config, cancellation_token, metrics.clone())
        .await
        .unwrap();

    // A single cycle. The report tells what happened to every tenant.
    let report = pipeline.run_cycle().await;
    for (tenant, tenant_report) in &report.tenants {
        println!("{tenant}: {} blocks copied", tenant_report.copied);
    }

    // Or let the scheduler drive cycles according to `--copy-period`.
    let mut scheduler = CycleScheduler::new(pipeline);
    if scheduler.run().await == SchedulerState::Failed {
        println!("copy failed.");
    }

    println!("{:?}", metrics.snapshot());
}
```

For more examples,
=============
see the blockscopy binary source code in `src/bin/blockscopy` and the integration
tests in `tests`.
*/

pub use config::Config;
pub use config::args::CLIArgs;

pub mod config;
pub mod pipeline;
pub mod storage;
pub mod types;
