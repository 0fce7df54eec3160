//! Logging setup shared by the dashboard server and the fetch CLI.
//!
//! Configured from `NGD_LOG_LEVEL`, `NGD_LOG_FORMAT` (`json`|`pretty`) and
//! `NGD_LOG_TARGET`.

use std::net::SocketAddr;

use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::{non_blank_var, DashboardConfig};
use crate::registry::all_datasets;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
    pub include_target: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
            include_target: true,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingInitError {
    #[error("logging already initialized: {0}")]
    AlreadyInitialized(#[from] tracing::subscriber::SetGlobalDefaultError),
}

pub const LOG_LEVEL_VAR: &str = "NGD_LOG_LEVEL";
pub const LOG_FORMAT_VAR: &str = "NGD_LOG_FORMAT";
pub const LOG_TARGET_VAR: &str = "NGD_LOG_TARGET";

impl LoggingConfig {
    /// Builds the config from a variable lookup. Unrecognised format or
    /// target values keep the default.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            level: lookup(LOG_LEVEL_VAR).unwrap_or(defaults.level),
            format: lookup(LOG_FORMAT_VAR)
                .as_deref()
                .and_then(parse_log_format)
                .unwrap_or(defaults.format),
            include_target: lookup(LOG_TARGET_VAR)
                .as_deref()
                .and_then(parse_bool)
                .unwrap_or(defaults.include_target),
        }
    }
}

pub fn logging_config_from_env() -> LoggingConfig {
    LoggingConfig::from_lookup(non_blank_var)
}

pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingInitError> {
    let env_filter =
        EnvFilter::try_new(config.level.clone()).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(config.include_target)
        .with_ansi(matches!(config.format, LogFormat::Pretty));

    match config.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Pretty => tracing::subscriber::set_global_default(builder.pretty().finish())?,
    }

    Ok(())
}

/// `component` names the binary that is starting.
pub fn log_app_start(component: &'static str, config: &LoggingConfig) {
    info!(
        component,
        event = "app.start",
        log_level = %config.level,
        log_format = ?config.format,
        include_target = config.include_target
    );
}

pub fn log_app_bind(component: &'static str, bound_addr: SocketAddr) {
    info!(
        component,
        event = "app.bind",
        bind_addr = %bound_addr,
        url = %format!("http://{bound_addr}/")
    );
}

/// Never records credentials or the ticket value, only whether they are set.
pub fn log_config_loaded(component: &'static str, config: &DashboardConfig) {
    info!(
        component,
        event = "config.loaded",
        base_url = config.epias.base_url.as_str(),
        cas_url = config.epias.cas_url.as_str(),
        credentials_configured = config.epias.credentials().is_some(),
        ticket_configured = config.epias.ticket.is_some(),
        dataset_count = all_datasets().len()
    );
}

fn parse_log_format(raw: &str) -> Option<LogFormat> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "json" => Some(LogFormat::Json),
        "pretty" => Some(LogFormat::Pretty),
        _ => None,
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
