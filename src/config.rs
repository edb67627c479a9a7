//! Tap configuration
//!
//! The config file is a flat JSON object supplying credentials, the sync
//! start date, and an optional request timeout override.

use crate::error::{Error, Result};
use crate::types::JsonValue;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Default per-request timeout in seconds, used whenever the config value is
/// absent, empty, non-positive, or unparseable.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: f64 = 600.0;

/// Tap configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TapConfig {
    /// Recharge API access token
    pub access_token: String,

    /// User agent sent on every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// ISO 8601 date; the lower bound for streams with no prior bookmark
    pub start_date: String,

    /// Per-request timeout in seconds. Accepts a number or a numeric string;
    /// anything else falls back to the default.
    #[serde(default)]
    pub request_timeout: Option<JsonValue>,
}

impl TapConfig {
    /// Load config from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| Error::Config {
            message: format!("Failed to read config file: {e}"),
        })?;
        Self::from_json(&contents)
    }

    /// Parse config from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| Error::Config {
            message: format!("Failed to parse config: {e}"),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Check required fields are non-empty
    pub fn validate(&self) -> Result<()> {
        if self.access_token.is_empty() {
            return Err(Error::missing_field("access_token"));
        }
        if self.start_date.is_empty() {
            return Err(Error::missing_field("start_date"));
        }
        Ok(())
    }

    /// The normalized per-request timeout
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(normalize_request_timeout(self.request_timeout.as_ref()))
    }
}

/// Normalize a raw `request_timeout` config value to seconds.
///
/// Numbers and numeric strings pass through; null, empty, non-positive and
/// unparseable values all collapse to [`DEFAULT_REQUEST_TIMEOUT_SECS`].
pub fn normalize_request_timeout(raw: Option<&JsonValue>) -> f64 {
    let parsed = match raw {
        None | Some(JsonValue::Null) => None,
        Some(JsonValue::Number(n)) => n.as_f64(),
        Some(JsonValue::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };
    match parsed {
        Some(secs) if secs > 0.0 => secs,
        _ => DEFAULT_REQUEST_TIMEOUT_SECS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    fn config_with_timeout(timeout: Option<JsonValue>) -> TapConfig {
        TapConfig {
            access_token: "dummy_at".to_string(),
            user_agent: Some("dummy_ua".to_string()),
            start_date: "2021-01-01T00:00:00Z".to_string(),
            request_timeout: timeout,
        }
    }

    #[test_case(None, 600.0 ; "absent defaults")]
    #[test_case(Some(json!(null)), 600.0 ; "null defaults")]
    #[test_case(Some(json!("")), 600.0 ; "empty string defaults")]
    #[test_case(Some(json!(0)), 600.0 ; "zero defaults")]
    #[test_case(Some(json!(-5)), 600.0 ; "negative defaults")]
    #[test_case(Some(json!("abc")), 600.0 ; "unparseable defaults")]
    #[test_case(Some(json!(100)), 100.0 ; "integer passes through")]
    #[test_case(Some(json!("100")), 100.0 ; "numeric string coerces")]
    #[test_case(Some(json!(100.8)), 100.8 ; "float passes through")]
    fn test_normalize_request_timeout(raw: Option<JsonValue>, expected: f64) {
        assert!((normalize_request_timeout(raw.as_ref()) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_request_timeout_duration() {
        let config = config_with_timeout(Some(json!("100")));
        assert_eq!(config.request_timeout(), Duration::from_secs(100));

        let config = config_with_timeout(None);
        assert_eq!(config.request_timeout(), Duration::from_secs(600));
    }

    #[test]
    fn test_from_json() {
        let config = TapConfig::from_json(
            r#"{"access_token": "tok", "start_date": "2021-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(config.access_token, "tok");
        assert!(config.user_agent.is_none());
    }

    #[test]
    fn test_missing_access_token() {
        let result =
            TapConfig::from_json(r#"{"access_token": "", "start_date": "2021-01-01T00:00:00Z"}"#);
        assert!(matches!(
            result,
            Err(Error::MissingConfigField { .. })
        ));
    }
}
