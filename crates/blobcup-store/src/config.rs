use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Retry schedule for idempotent store reads. Backoff is linear:
/// `base_backoff_ms * attempt`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_backoff_ms: 120,
        }
    }
}

/// Connection settings for a remote blob store.
///
/// The SAS token is a capability: its scope and expiry are enforced by the
/// store, never checked here.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct StoreConfig {
    pub account_name: String,
    pub sas_token: String,
    /// Overrides `https://<account_name>.blob.core.windows.net`.
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub retry: RetryPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            account_name: String::new(),
            sas_token: String::new(),
            endpoint: None,
            timeout_secs: 15,
            retry: RetryPolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn new(account_name: impl Into<String>, sas_token: impl Into<String>) -> Self {
        Self {
            account_name: account_name.into(),
            sas_token: sas_token.into(),
            ..Self::default()
        }
    }

    /// Blob service base URL, without a trailing slash.
    pub fn service_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.blob.core.windows.net", self.account_name),
        }
    }

    /// SAS token without a leading `?`.
    pub fn sas_query(&self) -> &str {
        self.sas_token.trim_start_matches('?')
    }

    pub fn validate(&self) -> StoreResult<()> {
        if self.endpoint.is_none() && self.account_name.trim().is_empty() {
            return Err(StoreError::InvalidConfig(
                "either account_name or endpoint must be set".into(),
            ));
        }
        if self.retry.max_attempts == 0 {
            return Err(StoreError::InvalidConfig(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("account_name", &self.account_name)
            .field("sas_token", &if self.sas_token.is_empty() { "" } else { "<redacted>" })
            .field("endpoint", &self.endpoint)
            .field("timeout_secs", &self.timeout_secs)
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.timeout_secs, 15);
        assert_eq!(c.retry, RetryPolicy::default());
        assert!(c.endpoint.is_none());
        assert!(c.validate().is_err());
    }

    #[test]
    fn service_url_from_account() {
        let c = StoreConfig::new("dncstorage", "sv=1&sig=x");
        assert_eq!(c.service_url(), "https://dncstorage.blob.core.windows.net");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn endpoint_override_drops_trailing_slash() {
        let c = StoreConfig {
            endpoint: Some("http://127.0.0.1:10000/devstoreaccount1/".into()),
            ..StoreConfig::default()
        };
        assert_eq!(c.service_url(), "http://127.0.0.1:10000/devstoreaccount1");
        assert!(c.validate().is_ok());
    }

    #[test]
    fn sas_query_strips_question_mark() {
        let c = StoreConfig::new("a", "?sv=2024&sig=abc");
        assert_eq!(c.sas_query(), "sv=2024&sig=abc");
    }

    #[test]
    fn zero_attempts_is_invalid() {
        let mut c = StoreConfig::new("a", "t");
        c.retry.max_attempts = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn debug_redacts_token() {
        let c = StoreConfig::new("a", "sig=secret");
        let debug = format!("{c:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn parses_partial_toml() {
        let c: StoreConfig = toml::from_str(
            r#"
            account_name = "acct"
            sas_token = "sv=1"

            [retry]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(c.account_name, "acct");
        assert_eq!(c.retry.max_attempts, 5);
        assert_eq!(c.retry.base_backoff_ms, 120);
        assert_eq!(c.timeout_secs, 15);
    }
}
