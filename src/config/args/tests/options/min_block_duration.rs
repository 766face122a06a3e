#[cfg(test)]
mod tests {
    use crate::config::args::*;

    #[test]
    fn with_custom_value() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--min-block-duration",
            "2h 30m",
            "s3://source-bucket",
            "s3://target-bucket",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(config.min_block_duration, Duration::from_secs(150 * 60));
        assert!(config.is_min_block_duration_enabled());
    }

    #[test]
    fn disabled() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--min-block-duration",
            "0s",
            "s3://source-bucket",
            "s3://target-bucket",
        ];

        let config = build_config_from_args(args).unwrap();

        assert!(!config.is_min_block_duration_enabled());
    }

    #[test]
    fn invalid_duration() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--min-block-duration",
            "-1h",
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
