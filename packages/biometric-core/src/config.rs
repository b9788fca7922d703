//! Bridge configuration.
//!
//! Defaults match the platform's own behavior. Hosts can override through
//! environment variables or the JSON passed to `bio_init`.

use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::encoder::SUCCESS_MARKER;
use crate::error::Result;
use crate::request::Policy;

/// Environment variable for [`BridgeConfig::default_policy`]
pub const ENV_POLICY: &str = "BIOMETRIC_BRIDGE_POLICY";
/// Environment variable for [`BridgeConfig::success_marker`]
pub const ENV_SUCCESS_MARKER: &str = "BIOMETRIC_BRIDGE_SUCCESS_MARKER";
/// Environment variable for [`BridgeConfig::wait_timeout_ms`]
pub const ENV_WAIT_TIMEOUT_MS: &str = "BIOMETRIC_BRIDGE_WAIT_TIMEOUT_MS";

/// Configuration for a [`crate::BiometricBridge`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Policy used when the C caller passes `0`
    pub default_policy: Policy,
    /// Payload of a successful transport result
    pub success_marker: String,
    /// Stop waiting after this many milliseconds (`None` waits forever)
    pub wait_timeout_ms: Option<u64>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_policy: Policy::BiometricsOnly,
            success_marker: SUCCESS_MARKER.to_string(),
            wait_timeout_ms: None,
        }
    }
}

impl BridgeConfig {
    /// Defaults overridden by environment variables
    ///
    /// Unparsable values are logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(name) = lookup(ENV_POLICY) {
            match Policy::from_name(&name) {
                Ok(policy) => config.default_policy = policy,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_POLICY, e),
            }
        }
        if let Some(marker) = lookup(ENV_SUCCESS_MARKER) {
            config.success_marker = marker;
        }
        if let Some(raw) = lookup(ENV_WAIT_TIMEOUT_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.wait_timeout_ms = Some(ms),
                Err(e) => tracing::warn!("Ignoring {}={:?}: {}", ENV_WAIT_TIMEOUT_MS, raw, e),
            }
        }

        config
    }

    /// Parse the JSON handed over by the host; missing fields default
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Wait timeout as a `Duration`
    pub fn wait_timeout(&self) -> Option<Duration> {
        self.wait_timeout_ms.map(Duration::from_millis)
    }

    /// Builder-style timeout override
    pub fn with_wait_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.wait_timeout_ms = timeout.map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = BridgeConfig::default();
        assert_eq!(config.default_policy, Policy::BiometricsOnly);
        assert_eq!(config.success_marker, "true");
        assert_eq!(config.wait_timeout(), None);
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            (ENV_POLICY, "biometrics_or_fallback"),
            (ENV_SUCCESS_MARKER, "ok"),
            (ENV_WAIT_TIMEOUT_MS, "1500"),
        ]
        .into_iter()
        .collect();
        let config = BridgeConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.default_policy, Policy::BiometricsOrFallback);
        assert_eq!(config.success_marker, "ok");
        assert_eq!(config.wait_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn test_bad_env_values_are_ignored() {
        let config = BridgeConfig::from_lookup(|k| match k {
            ENV_POLICY => Some("retina".to_string()),
            ENV_WAIT_TIMEOUT_MS => Some("soon".to_string()),
            _ => None,
        });
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_json() {
        let config = BridgeConfig::from_json(r#"{"wait_timeout_ms": 250}"#).unwrap();
        assert_eq!(config.wait_timeout(), Some(Duration::from_millis(250)));
        assert_eq!(config.success_marker, "true");

        assert!(matches!(
            BridgeConfig::from_json("{not json"),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_wait_timeout_override_saturates() {
        let config = BridgeConfig::default().with_wait_timeout(Some(Duration::MAX));
        assert_eq!(config.wait_timeout_ms, Some(u64::MAX));

        let config = config.with_wait_timeout(Some(Duration::from_millis(40)));
        assert_eq!(config.wait_timeout(), Some(Duration::from_millis(40)));
        assert_eq!(config.with_wait_timeout(None).wait_timeout(), None);
    }
}
