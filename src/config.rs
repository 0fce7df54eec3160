//! Environment-driven connection and dashboard settings.

use std::env;
use std::fmt;
use std::net::SocketAddr;

use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://seffaflik.epias.com.tr/natural-gas-service";
pub const DEFAULT_CAS_URL: &str = "https://giris.epias.com.tr/cas/v1/tickets";
pub const DEFAULT_DASHBOARD_ADDR: &str = "127.0.0.1:8080";

const BASE_URL_VAR: &str = "EPIAS_BASE_URL";
const CAS_URL_VAR: &str = "EPIAS_CAS_URL";
const USERNAME_VAR: &str = "EPIAS_USERNAME";
const PASSWORD_VAR: &str = "EPIAS_PASSWORD";
const TICKET_VAR: &str = "EPIAS_TGT";
const DASHBOARD_ADDR_VAR: &str = "NGD_DASHBOARD_ADDR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var} value '{value}': {message}")]
    InvalidValue {
        var: &'static str,
        value: String,
        message: String,
    },
}

#[derive(Clone, PartialEq, Eq)]
pub struct EpiasConfig {
    pub base_url: String,
    pub cas_url: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub ticket: Option<String>,
}

impl Default for EpiasConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            cas_url: DEFAULT_CAS_URL.to_string(),
            username: None,
            password: None,
            ticket: None,
        }
    }
}

impl EpiasConfig {
    pub fn credentials(&self) -> Option<(&str, &str)> {
        Some((self.username.as_deref()?, self.password.as_deref()?))
    }
}

impl fmt::Debug for EpiasConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EpiasConfig")
            .field("base_url", &self.base_url)
            .field("cas_url", &self.cas_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("ticket", &self.ticket.as_ref().map(|_| "***"))
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardConfig {
    pub epias: EpiasConfig,
    pub bind_addr: SocketAddr,
}

pub fn epias_config_from_env() -> EpiasConfig {
    let defaults = EpiasConfig::default();
    EpiasConfig {
        base_url: non_blank_var(BASE_URL_VAR).unwrap_or(defaults.base_url),
        cas_url: non_blank_var(CAS_URL_VAR).unwrap_or(defaults.cas_url),
        username: non_blank_var(USERNAME_VAR),
        password: non_blank_var(PASSWORD_VAR),
        ticket: non_blank_var(TICKET_VAR),
    }
}

pub fn dashboard_config_from_env() -> Result<DashboardConfig, ConfigError> {
    let raw_addr =
        non_blank_var(DASHBOARD_ADDR_VAR).unwrap_or_else(|| DEFAULT_DASHBOARD_ADDR.to_string());
    let bind_addr = raw_addr
        .parse::<SocketAddr>()
        .map_err(|err| ConfigError::InvalidValue {
            var: DASHBOARD_ADDR_VAR,
            value: raw_addr.clone(),
            message: err.to_string(),
        })?;

    Ok(DashboardConfig {
        epias: epias_config_from_env(),
        bind_addr,
    })
}

pub(crate) fn non_blank_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    const ALL_VARS: [&str; 6] = [
        BASE_URL_VAR,
        CAS_URL_VAR,
        USERNAME_VAR,
        PASSWORD_VAR,
        TICKET_VAR,
        DASHBOARD_ADDR_VAR,
    ];

    fn env_lock() -> &'static Mutex<()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    fn with_env_vars<R>(vars: &[(&str, Option<&str>)], f: impl FnOnce() -> R) -> R {
        let _guard = env_lock().lock().expect("env lock should not be poisoned");
        let previous: Vec<(String, Option<String>)> = ALL_VARS
            .iter()
            .map(|key| ((*key).to_string(), env::var(key).ok()))
            .collect();

        for key in ALL_VARS {
            env::remove_var(key);
        }
        for (key, value) in vars {
            if let Some(v) = value {
                env::set_var(key, v);
            }
        }

        let output = f();

        for (key, value) in previous {
            match value {
                Some(v) => env::set_var(key, v),
                None => env::remove_var(key),
            }
        }

        output
    }

    #[test]
    fn defaults_when_env_missing() {
        let cfg = with_env_vars(&[], dashboard_config_from_env).unwrap();
        assert_eq!(cfg.epias, EpiasConfig::default());
        assert_eq!(cfg.bind_addr.to_string(), DEFAULT_DASHBOARD_ADDR);
        assert!(cfg.epias.credentials().is_none());
    }

    #[test]
    fn blank_values_count_as_unset() {
        let cfg = with_env_vars(
            &[(BASE_URL_VAR, Some("  ")), (USERNAME_VAR, Some(""))],
            epias_config_from_env,
        );
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert!(cfg.username.is_none());
    }

    #[test]
    fn reads_overrides_and_credentials() {
        let cfg = with_env_vars(
            &[
                (BASE_URL_VAR, Some("http://127.0.0.1:9000/ngs")),
                (USERNAME_VAR, Some("analyst")),
                (PASSWORD_VAR, Some("secret")),
                (TICKET_VAR, Some(" TGT-1 ")),
                (DASHBOARD_ADDR_VAR, Some("0.0.0.0:9999")),
            ],
            dashboard_config_from_env,
        )
        .unwrap();

        assert_eq!(cfg.epias.base_url, "http://127.0.0.1:9000/ngs");
        assert_eq!(cfg.epias.credentials(), Some(("analyst", "secret")));
        assert_eq!(cfg.epias.ticket.as_deref(), Some("TGT-1"));
        assert_eq!(cfg.bind_addr.port(), 9999);
        assert!(!format!("{:?}", cfg.epias).contains("secret"));
    }

    #[test]
    fn invalid_bind_address_is_reported() {
        let err = with_env_vars(
            &[(DASHBOARD_ADDR_VAR, Some("not-an-addr"))],
            dashboard_config_from_env,
        )
        .unwrap_err();
        assert!(err.to_string().contains(DASHBOARD_ADDR_VAR));
    }
}
