//! Runtime configuration
//!
//! Settings come from the process environment, optionally seeded from a
//! `.env` file. Every setting has a default, so an empty environment
//! yields a working configuration pointed at a local service.

use std::{env, str::FromStr, time::Duration};

use dotenvy::dotenv;
use url::Url;

use crate::{
    constants::timing::FEEDBACK_DELAY_MILLIS,
    error::{Error, Result},
};

/// Base URL used when `QUIZ_SERVICE_URL` is unset
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:8080";

/// Request timeout in seconds used when `QUIZ_REQUEST_TIMEOUT_SECS` is unset
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// How the terminal front end writes frames and notices
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl FromStr for OutputMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("expected `text` or `json`, got `{other}`")),
        }
    }
}

/// Client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root of the quiz service
    pub service_url: Url,
    /// How long a verdict stays on screen
    pub feedback_delay: Duration,
    /// Upper bound for a single service call
    pub request_timeout: Duration,
    /// Front end output format
    pub output: OutputMode,
}

impl Config {
    /// Reads the configuration from the environment and `.env`
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a variable is set to an unparsable value.
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` if a variable is set to an unparsable value.
    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Self> {
        let service_url = get_env_or(&lookup, "QUIZ_SERVICE_URL", || {
            Url::parse(DEFAULT_SERVICE_URL).map_err(|e| e.to_string())
        })?;
        if service_url.cannot_be_a_base() {
            return Err(Error::Config(format!(
                "QUIZ_SERVICE_URL must be an http(s) URL, got {service_url}"
            )));
        }

        Ok(Self {
            service_url,
            feedback_delay: Duration::from_millis(get_env_or(
                &lookup,
                "QUIZ_FEEDBACK_DELAY_MS",
                || Ok(FEEDBACK_DELAY_MILLIS),
            )?),
            request_timeout: Duration::from_secs(get_env_or(
                &lookup,
                "QUIZ_REQUEST_TIMEOUT_SECS",
                || Ok(DEFAULT_REQUEST_TIMEOUT_SECS),
            )?),
            output: get_env_or(&lookup, "QUIZ_OUTPUT", || Ok(OutputMode::default()))?,
        })
    }
}

fn get_env_or<T, F, D>(lookup: &F, name: &str, default: D) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
    D: FnOnce() -> std::result::Result<T, String>,
{
    match lookup(name) {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {name}: {e}"))),
        _ => default().map_err(|e| Error::Config(format!("Invalid default for {name}: {e}"))),
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).unwrap();

        assert_eq!(config.service_url.as_str(), "http://localhost:8080/");
        assert_eq!(
            config.feedback_delay,
            Duration::from_millis(FEEDBACK_DELAY_MILLIS)
        );
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.output, OutputMode::Text);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("QUIZ_SERVICE_URL", "https://quiz.example.com/v1"),
            ("QUIZ_FEEDBACK_DELAY_MS", "500"),
            ("QUIZ_REQUEST_TIMEOUT_SECS", "3"),
            ("QUIZ_OUTPUT", "JSON"),
        ]))
        .unwrap();

        assert_eq!(config.service_url.as_str(), "https://quiz.example.com/v1");
        assert_eq!(config.feedback_delay, Duration::from_millis(500));
        assert_eq!(config.request_timeout, Duration::from_secs(3));
        assert_eq!(config.output, OutputMode::Json);
    }

    #[test]
    fn test_blank_values_use_defaults() {
        let config = Config::from_lookup(lookup_from(&[("QUIZ_FEEDBACK_DELAY_MS", "  ")])).unwrap();
        assert_eq!(
            config.feedback_delay,
            Duration::from_millis(FEEDBACK_DELAY_MILLIS)
        );
    }

    #[test]
    fn test_invalid_values() {
        for (name, value) in [
            ("QUIZ_SERVICE_URL", "not a url"),
            ("QUIZ_SERVICE_URL", "mailto:quiz@example.com"),
            ("QUIZ_FEEDBACK_DELAY_MS", "-1"),
            ("QUIZ_REQUEST_TIMEOUT_SECS", "soon"),
            ("QUIZ_OUTPUT", "xml"),
        ] {
            let err = Config::from_lookup(lookup_from(&[(name, value)])).unwrap_err();
            assert!(matches!(err, Error::Config(ref m) if m.contains(name)), "{err}");
        }
    }

    #[test]
    fn test_output_mode_from_str() {
        assert_eq!("text".parse::<OutputMode>().unwrap(), OutputMode::Text);
        assert_eq!(" Json ".parse::<OutputMode>().unwrap(), OutputMode::Json);
        assert!("yaml".parse::<OutputMode>().is_err());
    }
}
