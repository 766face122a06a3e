mod concurrency;
mod copy_period;
mod dry_run;
mod min_block_duration;
mod multipart;
mod tenants;
