use std::env;

use rusty_fork::rusty_fork_test;
use tracing_subscriber::fmt::format::FmtSpan;

use blockscopy::config::TracingConfig;

const EVENT_FILTER_ENV_VAR: &str = "RUST_LOG";

pub fn init_tracing(config: &TracingConfig) {
    let fmt_span = if config.span_events_tracing {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let subscriber_builder = tracing_subscriber::fmt()
        .compact()
        .with_ansi(!config.disable_color_tracing)
        .with_span_events(fmt_span);

    let (event_filter, show_target) = build_event_filter(config);

    let subscriber_builder = subscriber_builder
        .with_env_filter(event_filter)
        .with_target(show_target);
    if config.json_tracing {
        subscriber_builder.json().init();
    } else {
        subscriber_builder.init();
    }
}

// AWS SDK tracing takes precedence over RUST_LOG. The target is shown unless only
// blockscopy events are emitted.
fn build_event_filter(config: &TracingConfig) -> (String, bool) {
    let tracing_level = config.tracing_level;
    if config.aws_sdk_tracing {
        let filter = ["blockscopy", "aws_smithy_runtime", "aws_config", "aws_sigv4"]
            .iter()
            .map(|target| format!("{target}={tracing_level}"))
            .collect::<Vec<_>>()
            .join(",");
        return (filter, true);
    }

    match env::var(EVENT_FILTER_ENV_VAR) {
        Ok(filter) => (filter, true),
        Err(_) => (format!("blockscopy={tracing_level}"), false),
    }
}

rusty_fork_test! {
    #[test]
    fn init_json_tracing() {
        init_tracing(&TracingConfig {
            tracing_level: log::Level::Info,
            json_tracing: true,
            aws_sdk_tracing: false,
            span_events_tracing: false,
            disable_color_tracing: false,
        });
    }

    #[test]
    fn init_aws_sdk_tracing() {
        init_tracing(&TracingConfig {
            tracing_level: log::Level::Debug,
            json_tracing: false,
            aws_sdk_tracing: true,
            span_events_tracing: false,
            disable_color_tracing: false,
        });
    }

    #[test]
    fn init_normal_tracing() {
        // This code is used to test purpose only and run separated processes.
        unsafe { env::remove_var(EVENT_FILTER_ENV_VAR) };

        let config = TracingConfig {
            tracing_level: log::Level::Warn,
            json_tracing: false,
            aws_sdk_tracing: false,
            span_events_tracing: false,
            disable_color_tracing: false,
        };
        assert_eq!(
            build_event_filter(&config),
            ("blockscopy=WARN".to_string(), false)
        );

        init_tracing(&config);
    }

    #[test]
    fn init_span_events_tracing() {
        init_tracing(&TracingConfig {
            tracing_level: log::Level::Info,
            json_tracing: false,
            aws_sdk_tracing: true,
            span_events_tracing: true,
            disable_color_tracing: false,
        });
    }

    #[test]
    fn init_disable_color_tracing() {
        init_tracing(&TracingConfig {
            tracing_level: log::Level::Info,
            json_tracing: false,
            aws_sdk_tracing: false,
            span_events_tracing: false,
            disable_color_tracing: true,
        });
    }

    #[test]
    fn init_with_env() {
        // This code is used to test purpose only and run separated processes.
        unsafe { env::set_var(EVENT_FILTER_ENV_VAR, "trace") };

        let config = TracingConfig {
            tracing_level: log::Level::Info,
            json_tracing: false,
            aws_sdk_tracing: false,
            span_events_tracing: false,
            disable_color_tracing: true,
        };
        assert_eq!(build_event_filter(&config), ("trace".to_string(), true));

        init_tracing(&config);
    }

    #[test]
    fn aws_sdk_tracing_ignores_env() {
        // This code is used to test purpose only and run separated processes.
        unsafe { env::set_var(EVENT_FILTER_ENV_VAR, "trace") };

        let (filter, show_target) = build_event_filter(&TracingConfig {
            tracing_level: log::Level::Info,
            json_tracing: false,
            aws_sdk_tracing: true,
            span_events_tracing: false,
            disable_color_tracing: false,
        });
        assert!(filter.starts_with("blockscopy=INFO,aws_smithy_runtime=INFO"));
        assert!(show_target);
    }
}
