//! Registry client: manifest digests and the tag verdict.

use async_trait::async_trait;
use dhstatus_core::{
    ImageRef, RegistryCredentials, RegistrySource, RegistryVerdict, SourceError, SourceResult,
};
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::StatusCode;
use tracing::debug;

use crate::auth::fetch_token;
use crate::config::RegistryConfig;
use crate::error::{http_status, transport};

pub const MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json";
pub const DIGEST_HEADER: &str = "Docker-Content-Digest";

/// Docker Registry v2 client
#[derive(Debug, Clone)]
pub struct RegistryClient {
    config: RegistryConfig,
    http: reqwest::Client,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> SourceResult<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .build()
            .map_err(transport)?;
        Ok(RegistryClient { config, http })
    }

    /// Digest that `reference` (tag or digest) currently resolves to.
    ///
    /// A missing manifest is [`SourceError::NotFound`].
    pub async fn resolve_digest(
        &self,
        host: &str,
        repository: &str,
        reference: &str,
        token: Option<&str>,
    ) -> SourceResult<String> {
        let url = format!(
            "{}/v2/{}/manifests/{}",
            self.config.base_url(host),
            repository,
            reference
        );
        let mut request = self.http.head(&url).header(ACCEPT, MANIFEST_V2);
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        debug!(method = "HEAD", url = %url, status = status.as_u16());

        if status == StatusCode::NOT_FOUND {
            return Err(SourceError::NotFound {
                reference: format!("manifest {reference}"),
            });
        }
        if status != StatusCode::OK {
            return Err(http_status(status));
        }

        response
            .headers()
            .get(DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .ok_or_else(|| SourceError::Protocol(format!("no {DIGEST_HEADER} header")))
    }

    /// Resolve the tag and compare it with the running digest. When the tag
    /// is gone, check whether the running image is still there by digest.
    pub async fn probe(
        &self,
        image: &ImageRef,
        running_digest: Option<&str>,
        credentials: Option<&RegistryCredentials>,
    ) -> SourceResult<RegistryVerdict> {
        image.require_complete()?;

        let base_url = self.config.base_url(&image.host);
        let token = fetch_token(&self.http, &base_url, &image.repository, credentials).await?;
        let token = token.as_deref();

        match self
            .resolve_digest(&image.host, &image.repository, &image.tag, token)
            .await
        {
            Ok(digest) => Ok(RegistryVerdict::tag_found(digest, running_digest)),
            Err(err) if err.is_not_found() => {
                let image_exists = match running_digest.filter(|d| !d.is_empty()) {
                    Some(digest) => self
                        .resolve_digest(&image.host, &image.repository, digest, token)
                        .await
                        .is_ok(),
                    None => false,
                };
                Ok(RegistryVerdict::tag_removed(image_exists))
            }
            Err(err) => Err(err),
        }
    }
}

#[async_trait]
impl RegistrySource for RegistryClient {
    async fn check(
        &self,
        image: &ImageRef,
        running_digest: Option<&str>,
        credentials: Option<&RegistryCredentials>,
    ) -> RegistryVerdict {
        self.probe(image, running_digest, credentials)
            .await
            .unwrap_or_else(RegistryVerdict::failed)
    }
}
