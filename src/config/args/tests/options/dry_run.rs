#[cfg(test)]
mod tests {
    use crate::config::args::*;

    #[test]
    fn dry_run_forces_info_level() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--dry-run",
            "s3://source-bucket",
            "s3://target-bucket",
        ];

        let config = build_config_from_args(args).unwrap();

        assert!(config.dry_run);
        assert_eq!(
            config.tracing_config.as_ref().unwrap().tracing_level,
            log::Level::Info
        );
    }

    #[test]
    fn dry_run_with_silent_option() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--dry-run",
            "-qq",
            "s3://source-bucket",
            "s3://target-bucket",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(
            config.tracing_config.as_ref().unwrap().tracing_level,
            log::Level::Info
        );
    }

    #[test]
    fn dry_run_keeps_higher_verbosity() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--dry-run",
            "-vv",
            "--json-tracing",
            "s3://source-bucket",
            "s3://target-bucket",
        ];

        let config = build_config_from_args(args).unwrap();

        assert_eq!(
            config.tracing_config.as_ref().unwrap().tracing_level,
            log::Level::Debug
        );
        assert!(config.tracing_config.as_ref().unwrap().json_tracing);
    }

    #[test]
    fn dry_run_keeps_tracing_flags() {
        init_dummy_tracing_subscriber();

        let args = vec![
            "blockscopy",
            "--dry-run",
            "--json-tracing",
            "--disable-color-tracing",
            "s3://source-bucket",
            "s3://target-bucket",
        ];

        let config = build_config_from_args(args).unwrap();

        let tracing_config = config.tracing_config.as_ref().unwrap();
        assert_eq!(tracing_config.tracing_level, log::Level::Info);
        assert!(tracing_config.json_tracing);
        assert!(tracing_config.disable_color_tracing);
    }

    fn init_dummy_tracing_subscriber() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("dummy=trace")
            .try_init();
    }
}
