//! Client configuration
//!
//! [`ClientConfig`] is built from defaults with [`ClientConfigBuilder`];
//! environment and file overlays are explicit, separate steps implemented by
//! the infrastructure crate.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_MAX_RETRIES, DEFAULT_RETRY_MAX_DELAY_SECS, DEFAULT_TIMEOUT_SECS, KEY_TYPE_ADVANCED,
    KEY_TYPE_STANDARD,
};
use crate::errors::{Result, XdrError};

/// Authentication scheme selected by the configured key type.
///
/// `"standard"` keys are sent verbatim; any other key type uses the signed
/// scheme with a per-request nonce and timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum KeyType {
    #[default]
    Standard,
    /// Signed key; holds the configured key type name
    Advanced(String),
}

impl KeyType {
    pub fn is_signed(&self) -> bool {
        !matches!(self, Self::Standard)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Standard => KEY_TYPE_STANDARD,
            Self::Advanced(name) => name,
        }
    }
}

impl From<&str> for KeyType {
    fn from(value: &str) -> Self {
        if value == KEY_TYPE_STANDARD {
            Self::Standard
        } else if value.is_empty() {
            Self::Advanced(KEY_TYPE_ADVANCED.to_string())
        } else {
            Self::Advanced(value.to_string())
        }
    }
}

impl From<String> for KeyType {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<KeyType> for String {
    fn from(value: KeyType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request-core configuration
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL for API (e.g., "https://api-tenant.xdr.us.paloaltonetworks.com")
    pub api_url: String,
    #[serde(skip_serializing)]
    pub api_key: String,
    pub api_key_id: u64,
    pub key_type: KeyType,
    /// Overrides the generated `User-Agent`
    pub user_agent: Option<String>,
    /// Per-attempt timeout enforced by the transport
    pub timeout_seconds: u64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Cap for a single backoff delay; zero selects the default
    pub retry_max_delay_seconds: u64,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn retry_max_delay(&self) -> Duration {
        if self.retry_max_delay_seconds == 0 {
            Duration::from_secs(DEFAULT_RETRY_MAX_DELAY_SECS)
        } else {
            Duration::from_secs(self.retry_max_delay_seconds)
        }
    }

    /// Total physical attempts per call (initial try + retries).
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `XdrError::Config` if the API URL or key is missing or the
    /// timeout is zero.
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(XdrError::Config("api_url must be set".to_string()));
        }
        if self.api_key.is_empty() {
            return Err(XdrError::Config("api_key must be set".to_string()));
        }
        if self.timeout_seconds == 0 {
            return Err(XdrError::Config("timeout_seconds must be greater than 0".to_string()));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            api_key_id: 0,
            key_type: KeyType::Standard,
            user_agent: None,
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_max_delay_seconds: DEFAULT_RETRY_MAX_DELAY_SECS,
        }
    }
}

// Keep the API key out of logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"<redacted>")
            .field("api_key_id", &self.api_key_id)
            .field("key_type", &self.key_type)
            .field("user_agent", &self.user_agent)
            .field("timeout_seconds", &self.timeout_seconds)
            .field("max_retries", &self.max_retries)
            .field("retry_max_delay_seconds", &self.retry_max_delay_seconds)
            .finish()
    }
}

/// Builder for [`ClientConfig`] with fluent API
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn api_key_id(mut self, id: u64) -> Self {
        self.config.api_key_id = id;
        self
    }

    pub fn key_type(mut self, key_type: impl Into<KeyType>) -> Self {
        self.config.key_type = key_type.into();
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = Some(agent.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout_seconds = timeout.as_secs().max(1);
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    pub fn retry_max_delay(mut self, delay: Duration) -> Self {
        self.config.retry_max_delay_seconds = delay.as_secs();
        self
    }

    /// Build without validation, for callers that apply overlays afterwards.
    pub fn build_unchecked(self) -> ClientConfig {
        self.config
    }

    /// Build and validate the configuration
    ///
    /// # Errors
    /// See [`ClientConfig::validate`].
    pub fn build(self) -> Result<ClientConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.max_attempts(), 4);
        assert_eq!(config.retry_max_delay(), Duration::from_secs(60));
        assert_eq!(config.key_type, KeyType::Standard);
    }

    #[test]
    fn test_max_attempts_is_never_zero() {
        let config = ClientConfig { max_retries: 0, ..ClientConfig::default() };
        assert_eq!(config.max_attempts(), 1);

        let config = ClientConfig { max_retries: u32::MAX, ..ClientConfig::default() };
        assert_eq!(config.max_attempts(), u32::MAX);
    }

    #[test]
    fn test_zero_retry_delay_falls_back_to_default() {
        let config = ClientConfig { retry_max_delay_seconds: 0, ..ClientConfig::default() };
        assert_eq!(config.retry_max_delay(), Duration::from_secs(60));
    }

    #[test]
    fn test_builder_validation() {
        let missing_url = ClientConfig::builder().api_key("secret").build();
        assert!(matches!(missing_url, Err(XdrError::Config(_))));

        let missing_key = ClientConfig::builder().api_url("https://api.example.com").build();
        assert!(matches!(missing_key, Err(XdrError::Config(_))));

        let config = ClientConfig::builder()
            .api_url("https://api.example.com")
            .api_key("secret")
            .api_key_id(7)
            .key_type("advanced")
            .max_retries(1)
            .build()
            .unwrap();
        assert!(config.key_type.is_signed());
        assert_eq!(config.max_attempts(), 2);
    }

    #[test]
    fn test_key_type_parsing() {
        assert_eq!(KeyType::from("standard"), KeyType::Standard);
        assert_eq!(KeyType::from("advanced"), KeyType::Advanced("advanced".into()));
        assert_eq!(KeyType::from("custom"), KeyType::Advanced("custom".into()));
        assert_eq!(String::from(KeyType::Standard), "standard");
    }

    #[test]
    fn test_api_key_is_not_serialized_or_logged() {
        let config = ClientConfig::builder()
            .api_url("https://api.example.com")
            .api_key("super-secret")
            .build_unchecked();

        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super-secret"));
        assert!(!format!("{config:?}").contains("super-secret"));
    }
}
