//! Harness and suite configuration.
//!
//! `HarnessConfig` replaces a process-wide host/port table: every service is
//! listed by name with its own port (and optionally its own host), and the
//! pacing interval and TLS relaxation are explicit fields.
//!
//! ```toml
//! host = "10.0.0.5"
//! username = "alice"
//! inter_call_delay_ms = 3000
//!
//! [services.clamav]
//! port = 5002
//!
//! [services.klocwork]
//! port = 5004
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::ClientConfig;
use crate::error::{ConfigError, HarnessError};
use crate::types::{AnalysisPayload, ScanPayload};

pub const CLAMAV: &str = "clamav";
pub const KLOCWORK: &str = "klocwork";

const DEFAULT_DELAY_MS: u64 = 3000;

/// Basic credentials sent to every service.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Where a single service listens. `host` falls back to the shared host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceEndpoint {
    #[serde(default)]
    pub host: Option<String>,
    pub port: u16,
}

impl ServiceEndpoint {
    pub fn new(port: u16) -> Self {
        Self { host: None, port }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct HarnessConfig {
    /// Host shared by every service without its own `host`.
    pub host: String,
    pub scheme: String,
    /// Identity placed in submission paths.
    pub username: String,
    pub credentials: Option<Credentials>,
    pub insecure_skip_verify: bool,
    /// Pause after each call before the next one is issued. 0 disables it.
    pub inter_call_delay_ms: u64,
    pub services: BTreeMap<String, ServiceEndpoint>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        let services = [
            ("three_rd", 5001),
            (CLAMAV, 5002),
            ("sdle", 5003),
            (KLOCWORK, 5004),
            ("bdba", 5005),
        ]
        .into_iter()
        .map(|(name, port)| (name.to_string(), ServiceEndpoint::new(port)))
        .collect();

        Self {
            host: "127.0.0.1".to_string(),
            scheme: "http".to_string(),
            username: "tester".to_string(),
            credentials: None,
            insecure_skip_verify: false,
            inter_call_delay_ms: DEFAULT_DELAY_MS,
            services,
        }
    }
}

impl HarnessConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply `SCAN_HARNESS_*` overrides looked up through `lookup`
    /// (normally `std::env::var(..).ok()`).
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup("SCAN_HARNESS_HOST") {
            self.host = host;
        }
        if let Some(username) = lookup("SCAN_HARNESS_USERNAME") {
            self.username = username;
        }
        if let Some(delay) = lookup("SCAN_HARNESS_DELAY_MS") {
            self.inter_call_delay_ms = delay.parse().map_err(|_| ConfigError::Invalid {
                field: "SCAN_HARNESS_DELAY_MS".to_string(),
                reason: format!("not a number of milliseconds: {delay:?}"),
            })?;
        }
        if let Some(insecure) = lookup("SCAN_HARNESS_INSECURE") {
            self.insecure_skip_verify = parse_flag(&insecure).ok_or_else(|| ConfigError::Invalid {
                field: "SCAN_HARNESS_INSECURE".to_string(),
                reason: format!("not a boolean: {insecure:?}"),
            })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::Invalid {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        if self.host.is_empty() {
            return Err(invalid("host", "must not be empty"));
        }
        if self.username.is_empty() {
            return Err(invalid("username", "must not be empty"));
        }
        if !matches!(self.scheme.as_str(), "http" | "https") {
            return Err(invalid("scheme", "must be http or https"));
        }
        for required in [CLAMAV, KLOCWORK] {
            if !self.services.contains_key(required) {
                return Err(invalid("services", &format!("missing entry for {required}")));
            }
        }
        if let Some((name, _)) = self.services.iter().find(|(_, e)| e.port == 0) {
            return Err(invalid(&format!("services.{name}.port"), "must not be 0"));
        }
        Ok(())
    }

    pub fn inter_call_delay(&self) -> Duration {
        Duration::from_millis(self.inter_call_delay_ms)
    }

    /// `scheme://host:port` for a named service.
    pub fn base_url(&self, service: &str) -> Result<String, HarnessError> {
        let endpoint = self
            .services
            .get(service)
            .ok_or_else(|| HarnessError::UnknownService(service.to_string()))?;
        let host = endpoint.host.as_deref().unwrap_or(&self.host);
        Ok(format!("{}://{}:{}", self.scheme, host, endpoint.port))
    }

    pub fn client_config(&self, service: &str) -> Result<ClientConfig, HarnessError> {
        let mut config = ClientConfig::new(self.base_url(service)?).insecure_skip_verify(self.insecure_skip_verify);
        if let Some(credentials) = &self.credentials {
            config = config.with_credentials(&credentials.username, &credentials.password);
        }
        Ok(config)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}

/// The cases to run, grouped by target service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SuiteFile {
    pub scan: Vec<ScanPayload>,
    pub analysis: Vec<AnalysisPayload>,
}

impl SuiteFile {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn is_empty(&self) -> bool {
        self.scan.is_empty() && self.analysis.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = HarnessConfig::default();
        config.validate().unwrap();
        assert_eq!(config.services[CLAMAV].port, 5002);
        assert_eq!(config.services[KLOCWORK].port, 5004);
        assert_eq!(config.inter_call_delay(), Duration::from_secs(3));
        assert!(!config.insecure_skip_verify);
    }

    #[test]
    fn parses_partial_toml_with_defaults() {
        let config = HarnessConfig::from_toml_str(
            r#"
            host = "10.0.0.5"
            username = "alice"

            [services.clamav]
            port = 6002

            [services.klocwork]
            host = "10.0.0.9"
            port = 6004
            "#,
        )
        .unwrap();
        config.validate().unwrap();
        assert_eq!(config.scheme, "http");
        assert_eq!(config.inter_call_delay_ms, 3000);
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.base_url(CLAMAV).unwrap(), "http://10.0.0.5:6002");
        assert_eq!(config.base_url(KLOCWORK).unwrap(), "http://10.0.0.9:6004");
    }

    #[test]
    fn example_config_parses() {
        let config = HarnessConfig::from_toml_str(include_str!("../../config/harness.example.toml")).unwrap();
        config.validate().unwrap();
    }

    #[test]
    fn example_suite_parses() {
        let suite = SuiteFile::from_toml_str(include_str!("../../config/tdvf-suite.toml")).unwrap();
        assert_eq!(suite.scan.len(), 1);
        assert_eq!(suite.scan[0].components[0].kind, "code");
        assert_eq!(suite.analysis.len(), 1);
        assert_eq!(suite.analysis[0].component, "tdvf");
    }

    #[test]
    fn unknown_service_is_an_error() {
        let err = HarnessConfig::default().base_url("nope").unwrap_err();
        assert!(matches!(err, HarnessError::UnknownService(ref s) if s == "nope"));
    }

    #[test]
    fn validate_rejects_missing_required_service() {
        let mut config = HarnessConfig::default();
        config.services.remove(KLOCWORK);
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("klocwork"));
    }

    #[test]
    fn validate_rejects_zero_port() {
        let mut config = HarnessConfig::default();
        config.services.insert("sdle".to_string(), ServiceEndpoint::new(0));
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "services.sdle.port"));
    }

    #[test]
    fn validate_rejects_empty_username() {
        let config = HarnessConfig {
            username: String::new(),
            ..HarnessConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn overrides_replace_fields() {
        let vars: HashMap<&str, &str> = [
            ("SCAN_HARNESS_HOST", "192.168.1.2"),
            ("SCAN_HARNESS_USERNAME", "bob"),
            ("SCAN_HARNESS_DELAY_MS", "0"),
            ("SCAN_HARNESS_INSECURE", "true"),
        ]
        .into_iter()
        .collect();
        let mut config = HarnessConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.host, "192.168.1.2");
        assert_eq!(config.username, "bob");
        assert_eq!(config.inter_call_delay(), Duration::ZERO);
        assert!(config.insecure_skip_verify);
    }

    #[test]
    fn bad_delay_override_is_rejected() {
        let mut config = HarnessConfig::default();
        let err = config
            .apply_overrides(|key| (key == "SCAN_HARNESS_DELAY_MS").then(|| "soon".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }

    #[test]
    fn insecure_override_ignores_case() {
        for (value, expected) in [("TRUE", true), ("Yes", true), (" 1 ", true), ("False", false), ("OFF", false)] {
            let mut config = HarnessConfig {
                insecure_skip_verify: !expected,
                ..HarnessConfig::default()
            };
            config
                .apply_overrides(|key| (key == "SCAN_HARNESS_INSECURE").then(|| value.to_string()))
                .unwrap();
            assert_eq!(config.insecure_skip_verify, expected, "{value:?}");
        }
    }

    #[test]
    fn unknown_insecure_override_is_rejected() {
        let mut config = HarnessConfig::default();
        let err = config
            .apply_overrides(|key| (key == "SCAN_HARNESS_INSECURE").then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { ref field, .. } if field == "SCAN_HARNESS_INSECURE"));
        assert!(!config.insecure_skip_verify);
    }

    #[test]
    fn debug_output_hides_credentials_password() {
        let config = HarnessConfig {
            credentials: Some(Credentials {
                username: "svc".to_string(),
                password: "hunter2".to_string(),
            }),
            ..HarnessConfig::default()
        };
        let printed = format!("{config:?}");
        assert!(printed.contains("svc"));
        assert!(!printed.contains("hunter2"));
    }

    #[test]
    fn client_config_carries_credentials_and_tls_choice() {
        let config = HarnessConfig {
            credentials: Some(Credentials {
                username: "u".to_string(),
                password: "p".to_string(),
            }),
            insecure_skip_verify: true,
            ..HarnessConfig::default()
        };
        let client = config.client_config(CLAMAV).unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:5002");
        assert_eq!(client.username, "u");
        assert_eq!(client.password, "p");
        assert!(client.insecure_skip_verify);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = HarnessConfig::load(Path::new("/nonexistent/harness.toml")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/harness.toml"));
    }
}
