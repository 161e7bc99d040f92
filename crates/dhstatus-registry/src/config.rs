//! Registry client configuration

use serde::{Deserialize, Serialize};

/// Registry client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// URL scheme used to reach registry hosts (`https` unless testing)
    pub scheme: String,
    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        RegistryConfig {
            scheme: "https".to_string(),
            user_agent: format!("deckhouse-status/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use plain HTTP (local registries, test servers)
    pub fn with_scheme(mut self, scheme: &str) -> Self {
        self.scheme = scheme.to_string();
        self
    }

    pub(crate) fn base_url(&self, host: &str) -> String {
        format!("{}://{}", self.scheme, host)
    }
}
