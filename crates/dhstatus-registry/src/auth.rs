//! Bearer token exchange (Docker Registry v2 token auth).
//!
//! `GET /v2/` either answers 200 (anonymous access) or a challenge naming the
//! token realm. The token is then requested for `repository:<repo>:pull`,
//! with basic credentials when the cluster has them.

use std::collections::HashMap;
use std::sync::LazyLock;

use dhstatus_core::{RegistryCredentials, SourceResult};
use regex::Regex;
use reqwest::header::{AUTHORIZATION, WWW_AUTHENTICATE};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use crate::error::auth;

static CHALLENGE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(\w+)="([^"]*)""#).expect("valid challenge pattern"));

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    token: String,
}

/// `key="value"` pairs of a `WWW-Authenticate` challenge.
pub fn parse_challenge(header: &str) -> HashMap<String, String> {
    CHALLENGE_PARAM
        .captures_iter(header)
        .map(|caps| (caps[1].to_string(), caps[2].to_string()))
        .collect()
}

/// Obtain a pull token for `repository` on `base_url`.
///
/// `Ok(None)` means the registry allows anonymous access. Every failure is
/// reported as [`SourceError::Auth`](dhstatus_core::SourceError::Auth).
pub async fn fetch_token(
    http: &reqwest::Client,
    base_url: &str,
    repository: &str,
    credentials: Option<&RegistryCredentials>,
) -> SourceResult<Option<String>> {
    let check_url = format!("{base_url}/v2/");
    let response = http
        .get(&check_url)
        .send()
        .await
        .map_err(|e| auth(format!("cannot reach registry: {}", e.without_url())))?;
    debug!(method = "GET", url = %check_url, status = response.status().as_u16());

    if response.status() == StatusCode::OK {
        return Ok(None);
    }

    let challenge = response
        .headers()
        .get(WWW_AUTHENTICATE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| auth("no WWW-Authenticate header from registry"))?;

    let params = parse_challenge(challenge);
    let realm = params
        .get("realm")
        .filter(|r| !r.is_empty())
        .ok_or_else(|| auth("no realm in WWW-Authenticate"))?;

    let scope = format!("repository:{repository}:pull");
    let mut query: Vec<(&str, &str)> = Vec::with_capacity(2);
    if let Some(service) = params.get("service").filter(|s| !s.is_empty()) {
        query.push(("service", service.as_str()));
    }
    query.push(("scope", scope.as_str()));

    let mut request = http.get(realm.as_str()).query(&query);
    if let Some(creds) = credentials.filter(|c| !c.auth.is_empty()) {
        request = request.header(AUTHORIZATION, format!("Basic {}", creds.auth));
    }

    let response = request
        .send()
        .await
        .map_err(|e| auth(format!("token request failed: {}", e.without_url())))?;
    debug!(method = "GET", url = %realm, status = response.status().as_u16());

    if response.status() != StatusCode::OK {
        return Err(auth(format!(
            "token request: HTTP {}",
            response.status().as_u16()
        )));
    }

    let body: TokenResponse = response
        .json()
        .await
        .map_err(|e| auth(format!("cannot decode token response: {}", e.without_url())))?;
    Ok(Some(body.token))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_challenge_extracts_params() {
        let params = parse_challenge(
            r#"Bearer realm="https://auth.example.com/token",service="Docker registry",scope="repository:sys/app:pull""#,
        );
        assert_eq!(params["realm"], "https://auth.example.com/token");
        assert_eq!(params["service"], "Docker registry");
        assert_eq!(params["scope"], "repository:sys/app:pull");
    }

    #[test]
    fn test_parse_challenge_without_params() {
        assert!(parse_challenge("Basic").is_empty());
    }
}
