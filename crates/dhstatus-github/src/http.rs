//! Conditional JSON GET with GitHub's headers and error classification.

use std::time::Duration;

use chrono::Utc;
use dhstatus_core::{SourceError, SourceResult};
use reqwest::header::{ACCEPT, AUTHORIZATION, ETAG, IF_NONE_MATCH};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::GitHubConfig;

const API_VERSION: &str = "2022-11-28";
const RATE_LIMIT_RESET: &str = "X-RateLimit-Reset";

/// Result of a GET that may carry `If-None-Match`.
#[derive(Debug)]
pub enum Conditional<T> {
    Fresh { body: T, etag: Option<String> },
    NotModified { etag: Option<String> },
}

/// GET `url` and decode a JSON body. With `etag` set, a 304 answer returns
/// [`Conditional::NotModified`] without a body.
pub async fn get_conditional<T: DeserializeOwned>(
    http: &reqwest::Client,
    config: &GitHubConfig,
    url: &str,
    query: &[(&str, &str)],
    etag: Option<&str>,
) -> SourceResult<Conditional<T>> {
    let mut request = http
        .get(url)
        .query(query)
        .header(ACCEPT, "application/vnd.github+json")
        .header("X-GitHub-Api-Version", API_VERSION);
    if let Some(token) = &config.token {
        request = request.header(AUTHORIZATION, format!("Bearer {token}"));
    }
    if let Some(etag) = etag.filter(|e| !e.is_empty()) {
        request = request.header(IF_NONE_MATCH, etag);
    }

    let response = request
        .send()
        .await
        .map_err(|e| SourceError::Transport(e.without_url().to_string()))?;
    let status = response.status();
    debug!(method = "GET", url = %url, status = status.as_u16());

    let etag = header_str(&response, ETAG.as_str()).map(str::to_string);

    match status {
        StatusCode::NOT_MODIFIED => return Ok(Conditional::NotModified { etag }),
        StatusCode::FORBIDDEN => {
            let reset = header_str(&response, RATE_LIMIT_RESET);
            return Err(SourceError::RateLimited {
                reset_in: rate_limit_wait(reset, Utc::now().timestamp()),
            });
        }
        StatusCode::OK => {}
        other => return Err(SourceError::Protocol(format!("HTTP {}", other.as_u16()))),
    }

    let body = response
        .json::<T>()
        .await
        .map_err(|e| SourceError::Decode(e.without_url().to_string()))?;
    Ok(Conditional::Fresh { body, etag })
}

/// Unconditional GET.
pub async fn get_json<T: DeserializeOwned>(
    http: &reqwest::Client,
    config: &GitHubConfig,
    url: &str,
    query: &[(&str, &str)],
) -> SourceResult<T> {
    match get_conditional(http, config, url, query, None).await? {
        Conditional::Fresh { body, .. } => Ok(body),
        Conditional::NotModified { .. } => {
            Err(SourceError::Protocol("HTTP 304 without a cached copy".to_string()))
        }
    }
}

fn header_str<'a>(response: &'a reqwest::Response, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.is_empty())
}

/// Time left until the rate-limit window resets, if the header holds a
/// unix timestamp in the future.
pub fn rate_limit_wait(reset: Option<&str>, now_unix: i64) -> Option<Duration> {
    let reset_unix = reset?.trim().parse::<i64>().ok()?;
    let wait = reset_unix.checked_sub(now_unix)?;
    u64::try_from(wait)
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_wait_future_reset() {
        assert_eq!(
            rate_limit_wait(Some("1700000125"), 1_700_000_000),
            Some(Duration::from_secs(125))
        );
    }

    #[test]
    fn test_rate_limit_wait_past_or_garbage() {
        assert_eq!(rate_limit_wait(Some("1699999999"), 1_700_000_000), None);
        assert_eq!(rate_limit_wait(Some("1700000000"), 1_700_000_000), None);
        assert_eq!(rate_limit_wait(Some("soon"), 1_700_000_000), None);
        assert_eq!(rate_limit_wait(None, 1_700_000_000), None);
    }
}
