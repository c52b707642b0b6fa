use crate::config::{Config, RustEnv};
use log::LevelFilter;
use simplelog::{self, ColorChoice, ConfigBuilder, TerminalMode};

/// Modules to filter out from logging when not in Trace mode.
/// These are the HTTP stack underneath axum, which is chatty per request and
/// per streamed SSE frame.
const FILTERED_MODULES: &[&str] = &["tower", "tower_http", "tracing", "hyper", "h2", "axum"];

pub struct Logger {}

impl Logger {
    /// Initializes the global logger from `Config`.
    ///
    /// Trace level shows everything, dependency logs included. Any other level
    /// hides the modules in `FILTERED_MODULES`. Production writes uncoloured
    /// output to stderr so log collectors get plain lines.
    pub fn init_logger(config: &Config) {
        let log_level_filter = Self::convert_level_filter(config.log_level_filter);
        let apply_filters = Self::should_filter_dependencies(config.log_level_filter);
        let log_config = Self::build_log_config(apply_filters);
        let (terminal_mode, color_choice) = Self::terminal_settings(&config.runtime_env);

        simplelog::TermLogger::init(log_level_filter, log_config, terminal_mode, color_choice)
            .expect("Failed to start simplelog");
    }

    /// Converts log::LevelFilter to simplelog::LevelFilter.
    fn convert_level_filter(level: LevelFilter) -> simplelog::LevelFilter {
        match level {
            LevelFilter::Off => simplelog::LevelFilter::Off,
            LevelFilter::Error => simplelog::LevelFilter::Error,
            LevelFilter::Warn => simplelog::LevelFilter::Warn,
            LevelFilter::Info => simplelog::LevelFilter::Info,
            LevelFilter::Debug => simplelog::LevelFilter::Debug,
            LevelFilter::Trace => simplelog::LevelFilter::Trace,
        }
    }

    fn should_filter_dependencies(level: LevelFilter) -> bool {
        level != LevelFilter::Trace
    }

    fn terminal_settings(runtime_env: &RustEnv) -> (TerminalMode, ColorChoice) {
        match runtime_env {
            RustEnv::Production => (TerminalMode::Stderr, ColorChoice::Never),
            RustEnv::Development | RustEnv::Staging => (TerminalMode::Mixed, ColorChoice::Auto),
        }
    }

    /// Builds a simplelog Config with RFC 3339 timestamps and, when
    /// `apply_filters` is set, the noisy dependencies suppressed.
    fn build_log_config(apply_filters: bool) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();

        if apply_filters {
            for module in FILTERED_MODULES {
                builder.add_filter_ignore_str(module);
            }
        }

        builder.build()
    }
}
