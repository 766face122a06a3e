#[cfg(test)]
mod tests {
    use crate::config::args::*;

    #[test]
    fn with_custom_value() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--tenant-concurrency",
            "2",
            "--block-concurrency",
            "16",
            "s3://source-bucket",
            "s3://target-bucket",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(config.tenant_concurrency, 2);
        assert_eq!(config.block_concurrency, 16);
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--tenant-concurrency",
            "0",
            "s3://source-bucket",
            "s3://target-bucket",
        ];
        assert!(build_config_from_args(args).is_err());

        let args = vec![
            "blockscopy",
            "--block-concurrency",
            "0",
            "s3://source-bucket",
            "s3://target-bucket",
        ];
        assert!(build_config_from_args(args).is_err());
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
