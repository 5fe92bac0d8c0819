use std::str::FromStr;
use std::time::Duration;

use crate::args::Args;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a service running locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the generation service.
    pub api_url: String,
    /// Delay between download status checks.
    pub poll_interval: Duration,
    /// Per-request HTTP timeout. Uploads block until lyrics and a preview
    /// have been generated, so this is long.
    pub request_timeout: Duration,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be a valid {expected}, got '{value}'")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },

    #[error("{0} must be greater than zero")]
    Zero(&'static str),
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `LIFEMIX_API_URL`              | `http://localhost:5000` |
    /// | `LIFEMIX_POLL_INTERVAL_SECS`   | `10`                    |
    /// | `LIFEMIX_REQUEST_TIMEOUT_SECS` | `300`                   |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env), reading variables through
    /// `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("LIFEMIX_API_URL").unwrap_or_else(|| "http://localhost:5000".into());

        let poll_interval_secs: u64 =
            parse_var(&lookup, "LIFEMIX_POLL_INTERVAL_SECS", "u64", 10)?;
        let request_timeout_secs: u64 =
            parse_var(&lookup, "LIFEMIX_REQUEST_TIMEOUT_SECS", "u64", 300)?;

        let config = Self {
            api_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            request_timeout: Duration::from_secs(request_timeout_secs),
        };
        config.check()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the environment.
    pub fn with_overrides(mut self, args: &Args) -> Result<Self, ConfigError> {
        if let Some(url) = &args.api_url {
            self.api_url = url.clone();
        }
        if let Some(secs) = args.poll_interval_secs {
            self.poll_interval = Duration::from_secs(secs);
        }
        if let Some(secs) = args.request_timeout_secs {
            self.request_timeout = Duration::from_secs(secs);
        }
        self.check()?;
        Ok(self)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.poll_interval.is_zero() {
            return Err(ConfigError::Zero("Poll interval"));
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::Zero("Request timeout"));
        }
        Ok(())
    }
}

fn parse_var<F, T>(
    lookup: &F,
    name: &'static str,
    expected: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            expected,
            value,
        }),
    }
}
