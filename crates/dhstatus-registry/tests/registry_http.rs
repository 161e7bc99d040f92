//! Registry probe against a mock v2 registry.

use dhstatus_core::{ImageRef, RegistryCredentials, RegistrySource, RegistryVerdict, SourceError};
use dhstatus_registry::{RegistryClient, RegistryConfig};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RUNNING: &str = "sha256:1111111111111111111111111111111111111111111111111111111111111111";
const NEWER: &str = "sha256:2222222222222222222222222222222222222222222222222222222222222222";
const TAG_PATH: &str = "/v2/sys/deckhouse-oss/manifests/pr15160";

fn image(server: &MockServer) -> ImageRef {
    ImageRef {
        host: server.address().to_string(),
        repository: "sys/deckhouse-oss".to_string(),
        tag: "pr15160".to_string(),
    }
}

fn client() -> RegistryClient {
    RegistryClient::new(RegistryConfig::new().with_scheme("http")).unwrap()
}

async fn anonymous(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/v2/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(server)
        .await;
}

fn manifest(status: u16, digest: Option<&str>) -> ResponseTemplate {
    let template = ResponseTemplate::new(status);
    match digest {
        Some(digest) => template.insert_header("Docker-Content-Digest", digest),
        None => template,
    }
}

#[tokio::test]
async fn anonymous_registry_digest_match() {
    let server = MockServer::start().await;
    anonymous(&server).await;
    Mock::given(method("HEAD"))
        .and(path(TAG_PATH))
        .and(header(
            "Accept",
            "application/vnd.docker.distribution.manifest.v2+json",
        ))
        .respond_with(manifest(200, Some(RUNNING)))
        .expect(1)
        .mount(&server)
        .await;

    let verdict = client().check(&image(&server), Some(RUNNING), None).await;

    assert_eq!(verdict, RegistryVerdict::tag_found(RUNNING.to_string(), Some(RUNNING)));
    assert!(verdict.digest_match);
}

#[tokio::test]
async fn token_exchange_uses_challenge_and_credentials() {
    let server = MockServer::start().await;
    let challenge = format!(
        r#"Bearer realm="{}/auth/token",service="Docker registry""#,
        server.uri()
    );
    Mock::given(method("GET"))
        .and(path("/v2/"))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", challenge.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/auth/token"))
        .and(query_param("service", "Docker registry"))
        .and(query_param("scope", "repository:sys/deckhouse-oss:pull"))
        .and(header("Authorization", "Basic dXNlcjpwYXNz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"token": "t0k"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(TAG_PATH))
        .and(header("Authorization", "Bearer t0k"))
        .respond_with(manifest(200, Some(NEWER)))
        .expect(1)
        .mount(&server)
        .await;

    let creds = RegistryCredentials {
        auth: "dXNlcjpwYXNz".to_string(),
    };
    let verdict = client()
        .check(&image(&server), Some(RUNNING), Some(&creds))
        .await;

    assert!(verdict.tag_exists);
    assert_eq!(verdict.digest.as_deref(), Some(NEWER));
    assert!(!verdict.digest_match);
    assert_eq!(verdict.error, None);
}

#[tokio::test]
async fn removed_tag_checks_running_digest() {
    let server = MockServer::start().await;
    anonymous(&server).await;
    Mock::given(method("HEAD"))
        .and(path(TAG_PATH))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("HEAD"))
        .and(path(format!("/v2/sys/deckhouse-oss/manifests/{RUNNING}")))
        .respond_with(manifest(200, Some(RUNNING)))
        .expect(1)
        .mount(&server)
        .await;

    let verdict = client().check(&image(&server), Some(RUNNING), None).await;

    assert_eq!(verdict, RegistryVerdict::tag_removed(true));
}

#[tokio::test]
async fn removed_tag_and_gone_image() {
    let server = MockServer::start().await;
    anonymous(&server).await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let verdict = client().check(&image(&server), Some(RUNNING), None).await;
    assert_eq!(verdict, RegistryVerdict::tag_removed(false));
}

#[tokio::test]
async fn removed_tag_without_running_digest_skips_lookup() {
    let server = MockServer::start().await;
    anonymous(&server).await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let verdict = client().check(&image(&server), None, None).await;
    assert_eq!(verdict, RegistryVerdict::tag_removed(false));
}

#[tokio::test]
async fn token_endpoint_rejection_is_auth_error() {
    let server = MockServer::start().await;
    let challenge = format!(r#"Bearer realm="{}/token""#, server.uri());
    Mock::given(method("GET"))
        .and(path("/v2/"))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", challenge.as_str()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let verdict = client().check(&image(&server), Some(RUNNING), None).await;

    assert!(!verdict.tag_exists);
    let error = verdict.error.unwrap();
    assert_eq!(error, SourceError::Auth("token request: HTTP 401".to_string()));
    assert_eq!(error.to_string(), "registry auth: token request: HTTP 401");
}

#[tokio::test]
async fn challenge_without_realm_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/"))
        .respond_with(ResponseTemplate::new(401).insert_header("WWW-Authenticate", r#"Bearer service="x""#))
        .mount(&server)
        .await;

    let verdict = client().check(&image(&server), None, None).await;
    assert_eq!(
        verdict.error.map(|e| e.to_string()).as_deref(),
        Some("registry auth: no realm in WWW-Authenticate")
    );
}

#[tokio::test]
async fn challenge_missing_entirely_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v2/"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let verdict = client().check(&image(&server), None, None).await;
    assert_eq!(
        verdict.error,
        Some(SourceError::Auth(
            "no WWW-Authenticate header from registry".to_string()
        ))
    );
}

#[tokio::test]
async fn unexpected_manifest_status_is_reported() {
    let server = MockServer::start().await;
    anonymous(&server).await;
    Mock::given(method("HEAD"))
        .and(path(TAG_PATH))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let verdict = client().check(&image(&server), Some(RUNNING), None).await;
    assert_eq!(verdict.error, Some(SourceError::Protocol("HTTP 502".to_string())));
    assert!(!verdict.tag_exists);
}

#[tokio::test]
async fn missing_digest_header_is_reported() {
    let server = MockServer::start().await;
    anonymous(&server).await;
    Mock::given(method("HEAD"))
        .and(path(TAG_PATH))
        .respond_with(manifest(200, None))
        .mount(&server)
        .await;

    let verdict = client().check(&image(&server), Some(RUNNING), None).await;
    assert_eq!(
        verdict.error.map(|e| e.to_string()).as_deref(),
        Some("no Docker-Content-Digest header")
    );
}

#[tokio::test]
async fn incomplete_reference_fails_without_requests() {
    let server = MockServer::start().await;
    let reference = ImageRef::parse("deckhouse:pr15160");

    let verdict = client().check(&reference, Some(RUNNING), None).await;

    assert!(matches!(verdict.error, Some(SourceError::InvalidInput(_))));
    let requests = server.received_requests().await.unwrap_or_default();
    assert!(requests.is_empty());
}

#[tokio::test]
async fn resolve_digest_reports_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("HEAD"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client()
        .resolve_digest(&server.address().to_string(), "sys/deckhouse-oss", "pr1", None)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}
