//! GitHub client configuration

use serde::{Deserialize, Serialize};

pub const DEFAULT_API_BASE: &str = "https://api.github.com";
pub const DEFAULT_OWNER: &str = "deckhouse";
pub const DEFAULT_REPO: &str = "deckhouse";

/// GitHub client configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// REST API root, without trailing slash
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    /// Personal access token (optional; raises the rate limit)
    pub token: Option<String>,
    pub user_agent: String,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig")
            .field("api_base", &self.api_base)
            .field("owner", &self.owner)
            .field("repo", &self.repo)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl Default for GitHubConfig {
    fn default() -> Self {
        GitHubConfig {
            api_base: DEFAULT_API_BASE.to_string(),
            owner: DEFAULT_OWNER.to_string(),
            repo: DEFAULT_REPO.to_string(),
            token: None,
            user_agent: format!("deckhouse-status/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl GitHubConfig {
    /// Config for a specific repository
    pub fn new(owner: &str, repo: &str) -> Self {
        GitHubConfig {
            owner: owner.to_string(),
            repo: repo.to_string(),
            ..Default::default()
        }
    }

    /// Set authentication token; empty tokens are ignored
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string()).filter(|t| !t.is_empty());
        self
    }

    /// Point at another API root (GitHub Enterprise, test servers)
    pub fn with_api_base(mut self, api_base: &str) -> Self {
        self.api_base = api_base.trim_end_matches('/').to_string();
        self
    }

    pub(crate) fn repo_url(&self, path: &str) -> String {
        format!("{}/repos/{}/{}/{}", self.api_base, self.owner, self.repo, path)
    }
}
