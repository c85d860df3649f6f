//! Google Maps API configuration.
//!
//! Keys are injected at runtime, never compiled in.

use std::env;
use std::fmt;

use crate::error::{PlannerError, PlannerResult};

pub const API_KEY_VAR: &str = "GOOGLE_MAPS_API_KEY";
pub const API_BASE_VAR: &str = "GOOGLE_MAPS_API_BASE";
pub const LANGUAGE_VAR: &str = "GOOGLE_MAPS_LANGUAGE";
pub const TIMEOUT_VAR: &str = "GOOGLE_MAPS_TIMEOUT_SECS";
pub const RETRIES_VAR: &str = "GOOGLE_MAPS_MAX_RETRIES";

#[derive(Clone)]
pub struct GoogleMapsConfig {
    /// Scheme and host, e.g. `https://maps.googleapis.com`.
    pub base_url: String,
    pub api_key: String,
    pub language: Option<String>,
    pub timeout_secs: u64,
    /// Extra attempts after a transport error or a 5xx.
    pub max_retries: u32,
}

impl Default for GoogleMapsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://maps.googleapis.com".to_string(),
            api_key: String::new(),
            language: None,
            timeout_secs: 10,
            max_retries: 1,
        }
    }
}

impl fmt::Debug for GoogleMapsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleMapsConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("language", &self.language)
            .field("timeout_secs", &self.timeout_secs)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

impl GoogleMapsConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Reads the configuration from process environment variables.
    pub fn from_env() -> PlannerResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    ///
    /// The API key is required; everything else falls back to defaults.
    pub fn from_lookup<F>(lookup: F) -> PlannerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup(API_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| PlannerError::Config(format!("{} is not set", API_KEY_VAR)))?;

        let mut config = Self::new(api_key);

        if let Some(base) = lookup(API_BASE_VAR) {
            config.base_url = normalize_base(&base);
        }
        if let Some(language) = lookup(LANGUAGE_VAR).filter(|lang| !lang.is_empty()) {
            config.language = Some(language);
        }
        if let Some(timeout) = lookup(TIMEOUT_VAR) {
            config.timeout_secs = parse_number(TIMEOUT_VAR, &timeout)?;
        }
        if let Some(retries) = lookup(RETRIES_VAR) {
            config.max_retries = parse_number(RETRIES_VAR, &retries)?;
        }

        Ok(config)
    }
}

/// Accepts both `maps.googleapis.com` and `https://maps.googleapis.com/`.
fn normalize_base(base: &str) -> String {
    let trimmed = base.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> PlannerResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PlannerError::Config(format!("{} must be a number, got {:?}", name, value)))
}
