use crate::error::{Error, Result};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://aitools.cs.vt.edu:7860";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const ENV_BASE_URL: &str = "PROXY_BASE_URL";
pub const ENV_TIMEOUT: &str = "PROXY_TIMEOUT";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_OPENAI_ORG_ID: &str = "OPENAI_ORG_ID";
pub const ENV_ANTHROPIC_API_KEY: &str = "ANTHROPIC_API_KEY";
pub const ENV_USERNAME: &str = "DEFAULT_USERNAME";
pub const ENV_PIN: &str = "DEFAULT_PIN";

/// A credential that must not show up in logs or `{:?}` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret(*** {} bytes ***)", self.0.len())
    }
}

/// Values given explicitly on the command line. They beat the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub username: Option<String>,
    pub pin: Option<String>,
}

/// Resolved, immutable settings for one run.
#[derive(Debug, Clone)]
pub struct Settings {
    pub base_url: String,
    pub timeout: Duration,
    pub openai_api_key: Option<Secret>,
    pub openai_org_id: Option<Secret>,
    pub anthropic_api_key: Option<Secret>,
    pub username: String,
    pub pin: Secret,
}

impl Settings {
    /// Resolve with CLI value > environment value > built-in default.
    /// Empty strings from either source count as unset.
    pub fn resolve<F>(overrides: Overrides, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| non_empty(env(key));

        let username = non_empty(overrides.username)
            .or_else(|| lookup(ENV_USERNAME))
            .ok_or_else(|| {
                Error::config(format!(
                    "Error: Username is required. Provide --username or set {ENV_USERNAME} in .env file."
                ))
            })?;
        let pin = non_empty(overrides.pin)
            .or_else(|| lookup(ENV_PIN))
            .ok_or_else(|| {
                Error::config(format!(
                    "Error: PIN is required. Provide --pin or set {ENV_PIN} in .env file."
                ))
            })?;

        let base_url = non_empty(overrides.base_url)
            .or_else(|| lookup(ENV_BASE_URL))
            .unwrap_or_else(|| DEFAULT_BASE_URL.into())
            .trim_end_matches('/')
            .to_string();

        let timeout_secs = match overrides.timeout_secs {
            Some(secs) => secs,
            None => match lookup(ENV_TIMEOUT) {
                Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                    Error::config(format!(
                        "Error: {ENV_TIMEOUT}={raw:?} is not a number of seconds: {e}"
                    ))
                })?,
                None => DEFAULT_TIMEOUT_SECS,
            },
        };
        if timeout_secs == 0 {
            return Err(Error::config(format!(
                "Error: {ENV_TIMEOUT} must be at least 1 second"
            )));
        }

        Ok(Self {
            base_url,
            timeout: Duration::from_secs(timeout_secs),
            openai_api_key: lookup(ENV_OPENAI_API_KEY).map(Secret::new),
            openai_org_id: lookup(ENV_OPENAI_ORG_ID).map(Secret::new),
            anthropic_api_key: lookup(ENV_ANTHROPIC_API_KEY).map(Secret::new),
            username,
            pin: Secret::new(pin),
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
