#[cfg(test)]
mod tests {
    use crate::config::args::*;

    #[test]
    fn with_default_value() {
        init_dummy_tracing_subscriber();

        let args = vec!["blockscopy", "s3://source-bucket", "s3://target-bucket"];

        let config = build_config_from_args(args).unwrap();

        assert!(config.tenant_filter_config.is_allowed("tenant-1"));
    }

    #[test]
    fn with_comma_separated_lists() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--enabled-tenants",
            "tenant-1,tenant-2",
            "--disabled-tenants",
            "tenant-2",
            "s3://source-bucket",
            "s3://target-bucket",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(
            config.tenant_filter_config.enabled_tenants,
            HashSet::from(["tenant-1".to_string(), "tenant-2".to_string()])
        );
        assert_eq!(
            config.tenant_filter_config.disabled_tenants,
            HashSet::from(["tenant-2".to_string()])
        );

        assert!(config.tenant_filter_config.is_allowed("tenant-1"));
        assert!(!config.tenant_filter_config.is_allowed("tenant-2"));
        assert!(!config.tenant_filter_config.is_allowed("tenant-3"));
    }

    #[test]
    fn with_repeated_option() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--disabled-tenants",
            "tenant-1",
            "--disabled-tenants",
            "tenant-3",
            "s3://source-bucket",
            "s3://target-bucket",
        ];

        let config = build_config_from_args(args).unwrap();

        assert!(!config.tenant_filter_config.is_allowed("tenant-1"));
        assert!(config.tenant_filter_config.is_allowed("tenant-2"));
        assert!(!config.tenant_filter_config.is_allowed("tenant-3"));
    }

    #[test]
    fn empty_tenant_is_rejected() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--enabled-tenants",
            "tenant-1,,tenant-2",
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
