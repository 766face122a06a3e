#[cfg(test)]
mod tests {
    use crate::config::args::*;

    #[test]
    fn with_custom_value() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--copy-period",
            "15m",
            "s3://source-bucket",
            "s3://target-bucket",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(config.copy_period, Duration::from_secs(15 * 60));
        assert!(config.is_periodic());
    }

    #[test]
    fn zero_period_runs_once() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--copy-period",
            "0s",
            "s3://source-bucket",
            "s3://target-bucket",
        ];

        let config = build_config_from_args(args).unwrap();

        assert!(!config.is_periodic());
    }

    #[test]
    fn invalid_period() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--copy-period",
            "every hour",
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
