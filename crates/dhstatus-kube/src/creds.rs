//! Registry credentials from a `.dockerconfigjson` pull secret.

use std::collections::BTreeMap;

use dhstatus_core::{RegistryCredentials, SourceError, SourceResult};
use serde::Deserialize;

pub const DOCKER_CONFIG_KEY: &str = ".dockerconfigjson";

#[derive(Debug, Default, Deserialize)]
struct DockerConfig {
    #[serde(default)]
    auths: BTreeMap<String, AuthEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthEntry {
    #[serde(default)]
    auth: String,
}

/// Pick the `auth` for `host` from a docker config, falling back to the
/// first entry (in key order) with a non-empty `auth`.
pub fn credentials_for_host(raw: &[u8], host: &str) -> SourceResult<RegistryCredentials> {
    if raw.is_empty() {
        return Err(SourceError::Decode(format!("empty {DOCKER_CONFIG_KEY}")));
    }
    let config: DockerConfig = serde_json::from_slice(raw)
        .map_err(|e| SourceError::Decode(format!("cannot parse docker config: {e}")))?;

    let for_host = config
        .auths
        .iter()
        .find(|(registry, entry)| registry_host(registry) == host && !entry.auth.is_empty());
    let chosen = for_host.or_else(|| config.auths.iter().find(|(_, entry)| !entry.auth.is_empty()));

    chosen
        .map(|(_, entry)| RegistryCredentials {
            auth: entry.auth.clone(),
        })
        .ok_or_else(|| SourceError::Decode("no auth entries in docker config".to_string()))
}

/// `https://r.example.com/v1/` and `r.example.com` name the same registry.
fn registry_host(key: &str) -> &str {
    let key = key
        .strip_prefix("https://")
        .or_else(|| key.strip_prefix("http://"))
        .unwrap_or(key);
    key.split('/').next().unwrap_or(key)
}
