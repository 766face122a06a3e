#[cfg(test)]
mod tests {
    use crate::config::TransferConfig;
    use crate::config::args::*;

    const MIB: u64 = 1024 * 1024;

    #[test]
    fn default_transfer_config() {
        init_dummy_tracing_subscriber();

        let args = vec!["blockscopy", "s3://source-bucket", "s3://target-bucket"];
        let config = build_config_from_args(args).unwrap();

        let expected = TransferConfig {
            multipart_threshold: 8 * MIB,
            multipart_chunksize: 8 * MIB,
        };
        assert_eq!(
            config.source_client_config.unwrap().transfer_config,
            expected
        );
        assert_eq!(
            config.target_client_config.unwrap().transfer_config,
            expected
        );
    }

    #[test]
    fn with_custom_value() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--multipart-threshold",
            "64MiB",
            "--multipart-chunksize",
            "16MiB",
            "s3://source-bucket",
            "s3://target-bucket",
        ];
        let config = build_config_from_args(args).unwrap();

        assert_eq!(
            config.target_client_config.unwrap().transfer_config,
            TransferConfig {
                multipart_threshold: 64 * MIB,
                multipart_chunksize: 16 * MIB,
            }
        );
    }

    #[test]
    fn out_of_range_value_is_rejected() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--multipart-chunksize",
            "4MiB",
            "s3://source-bucket",
            "s3://target-bucket",
        ];
        assert!(build_config_from_args(args).is_err());

        let args = vec![
            "blockscopy",
            "--multipart-threshold",
            "6GiB",
            "s3://source-bucket",
            "s3://target-bucket",
        ];
        assert!(build_config_from_args(args).is_err());

        let args = vec![
            "blockscopy",
            "--multipart-threshold",
            "8XiB",
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
