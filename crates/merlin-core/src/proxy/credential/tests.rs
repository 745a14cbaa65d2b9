use super::*;
use merlin_types::models::{CredentialSecrets, UpstreamEndpoints};
use reqwest::Client;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::task::JoinSet;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct CountingSource {
    kind: CredentialSourceKind,
    calls: AtomicUsize,
    delay: Duration,
    outcome: Result<String, CredentialError>,
}

impl CountingSource {
    fn ok(token: &str) -> Arc<Self> {
        Arc::new(Self {
            kind: CredentialSourceKind::SessionCookie,
            calls: AtomicUsize::new(0),
            delay: Duration::from_millis(50),
            outcome: Ok(token.to_string()),
        })
    }

    fn failing(kind: CredentialSourceKind, error: CredentialError) -> Arc<Self> {
        Self::failing_after(kind, error, Duration::ZERO)
    }

    fn failing_after(kind: CredentialSourceKind, error: CredentialError, delay: Duration) -> Arc<Self> {
        Arc::new(Self { kind, calls: AtomicUsize::new(0), delay, outcome: Err(error) })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialSource for CountingSource {
    fn kind(&self) -> CredentialSourceKind {
        self.kind
    }

    async fn fetch(&self) -> Result<String, CredentialError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.outcome.clone().map(|token| format!("{}-{}", token, n))
    }
}

fn dynamic(source: &Arc<CountingSource>) -> Arc<dyn CredentialSource> {
    source.clone()
}

fn store_with(sources: Vec<Arc<dyn CredentialSource>>, lease: Duration) -> Arc<CredentialStore> {
    Arc::new(CredentialStore::new("test", sources, lease))
}

#[tokio::test]
async fn test_concurrent_misses_refresh_once() {
    let source = CountingSource::ok("tok");
    let store = store_with(vec![dynamic(&source)], Duration::from_secs(3300));

    let mut set = JoinSet::new();
    for _ in 0..16 {
        let store = Arc::clone(&store);
        set.spawn(async move { store.get_credential().await });
    }

    let mut values = Vec::new();
    while let Some(joined) = set.join_next().await {
        values.push(joined.unwrap().unwrap().value().to_string());
    }

    assert_eq!(source.calls(), 1, "exactly one upstream exchange");
    assert_eq!(values.len(), 16);
    assert!(values.iter().all(|v| v == "tok-0"));
}

#[tokio::test]
async fn test_concurrent_misses_share_failed_refresh() {
    let error = CredentialError::NetworkFailure {
        source_kind: CredentialSourceKind::SessionCookie,
        message: "connection refused".to_string(),
    };
    let source =
        CountingSource::failing_after(CredentialSourceKind::SessionCookie, error.clone(), Duration::from_millis(50));
    let store = store_with(vec![dynamic(&source)], Duration::from_secs(3300));

    let mut set = JoinSet::new();
    for _ in 0..8 {
        let store = Arc::clone(&store);
        set.spawn(async move { store.get_credential().await });
    }

    let mut errors = Vec::new();
    while let Some(joined) = set.join_next().await {
        errors.push(joined.unwrap().unwrap_err());
    }

    assert_eq!(source.calls(), 1, "waiters reuse the in-flight failure");
    assert_eq!(errors.len(), 8);
    assert!(errors.iter().all(|e| *e == error));
}

#[tokio::test]
async fn test_later_call_retries_after_failed_refresh() {
    let source = CountingSource::failing(CredentialSourceKind::Static, CredentialError::NoSecret);
    let store = store_with(vec![dynamic(&source)], Duration::from_secs(3300));

    assert!(store.get_credential().await.is_err());
    assert!(store.get_credential().await.is_err());

    assert_eq!(source.calls(), 2, "failures are not cached across requests");
}

#[tokio::test]
async fn test_cached_credential_served_without_refresh() {
    let source = CountingSource::ok("tok");
    let store = store_with(vec![dynamic(&source)], Duration::from_secs(3300));

    let first = store.get_credential().await.unwrap();
    let second = store.get_credential().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_expired_credential_never_returned() {
    let source = CountingSource::ok("fresh");
    let store = store_with(vec![dynamic(&source)], Duration::from_secs(3300));
    store.set_cached(Credential::new("stale", Utc::now() - TimeDelta::seconds(1)));

    let credential = store.get_credential().await.unwrap();

    assert_eq!(credential.value(), "fresh-0");
    assert!(credential.is_valid_at(Utc::now()));
    assert_eq!(source.calls(), 1);
}

#[tokio::test]
async fn test_zero_lease_refreshes_every_call() {
    let source = CountingSource::ok("tok");
    let store = store_with(vec![dynamic(&source)], Duration::ZERO);

    store.get_credential().await.unwrap();
    store.get_credential().await.unwrap();

    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_invalidate_forces_refresh() {
    let source = CountingSource::ok("tok");
    let store = store_with(vec![dynamic(&source)], Duration::from_secs(3300));

    store.get_credential().await.unwrap();
    store.invalidate();
    let credential = store.get_credential().await.unwrap();

    assert_eq!(credential.value(), "tok-1");
}

#[tokio::test]
async fn test_falls_back_to_next_source() {
    let session = CountingSource::failing(
        CredentialSourceKind::SessionCookie,
        CredentialError::NetworkFailure {
            source_kind: CredentialSourceKind::SessionCookie,
            message: "connection refused".to_string(),
        },
    );
    let static_source: Arc<dyn CredentialSource> = Arc::new(StaticTokenSource::new("static-tok"));
    let store = store_with(vec![dynamic(&session), static_source], Duration::from_secs(3300));

    let credential = store.get_credential().await.unwrap();

    assert_eq!(credential.value(), "static-tok");
    assert_eq!(session.calls(), 1);
}

#[tokio::test]
async fn test_empty_token_falls_through() {
    let empty: Arc<dyn CredentialSource> = Arc::new(StaticTokenSource::new("  "));
    let real: Arc<dyn CredentialSource> = Arc::new(StaticTokenSource::new("real"));
    let store = store_with(vec![empty, real], Duration::from_secs(3300));

    assert_eq!(store.get_credential().await.unwrap().value(), "real");
}

#[tokio::test]
async fn test_exhausted_chain_returns_last_error() {
    let rejected = CredentialError::UpstreamRejected {
        source_kind: CredentialSourceKind::RefreshToken,
        status: Some(401),
        message: "invalid token".to_string(),
    };
    let first = CountingSource::failing(
        CredentialSourceKind::SessionCookie,
        CredentialError::NetworkFailure {
            source_kind: CredentialSourceKind::SessionCookie,
            message: "timeout".to_string(),
        },
    );
    let second = CountingSource::failing(CredentialSourceKind::RefreshToken, rejected.clone());
    let store = store_with(vec![dynamic(&first), dynamic(&second)], Duration::from_secs(3300));

    let err = store.get_credential().await.unwrap_err();
    assert_eq!(err, rejected);

    // Not process-fatal: a later call walks the chain again
    assert!(store.get_credential().await.is_err());
}

#[tokio::test]
async fn test_empty_chain_is_no_secret() {
    let store = store_with(Vec::new(), Duration::from_secs(3300));
    assert_eq!(store.get_credential().await.unwrap_err(), CredentialError::NoSecret);
}

#[test]
fn test_bearer_prefix() {
    let expires = Utc::now();
    assert_eq!(Credential::new("abc", expires).bearer(), "Bearer abc");
    assert_eq!(Credential::new("Bearer abc", expires).bearer(), "Bearer abc");
}

#[test]
fn test_debug_redacts_value() {
    let credential = Credential::new("supersecretvalue", Utc::now());
    let debug = format!("{:?}", credential);
    assert!(!debug.contains("supersecretvalue"));
    assert!(debug.contains("supers***"));
}

#[test]
fn test_chain_order() {
    let secrets = CredentialSecrets {
        session_token: Some("s".to_string()),
        refresh_token: Some("r".to_string()),
        static_token: Some("t".to_string()),
    };
    let client = Client::new();
    let endpoints = Arc::new(UpstreamEndpoints::default());

    let chat = CredentialStore::new("chat", chat_sources(&secrets, &client, &endpoints), Duration::from_secs(60));
    let image = CredentialStore::new("image", image_sources(&secrets, &client, &endpoints), Duration::from_secs(60));

    assert_eq!(
        chat.source_kinds(),
        vec![
            CredentialSourceKind::SessionCookie,
            CredentialSourceKind::RefreshToken,
            CredentialSourceKind::Static
        ]
    );
    assert_eq!(
        image.source_kinds(),
        vec![
            CredentialSourceKind::Static,
            CredentialSourceKind::SessionCookie,
            CredentialSourceKind::RefreshToken
        ]
    );
}

#[test]
fn test_blank_secrets_skipped() {
    let secrets = CredentialSecrets {
        session_token: Some("   ".to_string()),
        refresh_token: None,
        static_token: Some("t".to_string()),
    };
    let endpoints = Arc::new(UpstreamEndpoints::default());
    let sources = chat_sources(&secrets, &Client::new(), &endpoints);
    assert_eq!(sources.len(), 1);
    assert_eq!(sources[0].kind(), CredentialSourceKind::Static);
}

#[tokio::test]
async fn test_session_cookie_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/session"))
        .and(header("cookie", "__Secure-authjs.session-token=sess-secret"))
        .and(header("x-merlin-version", "web-merlin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "user": { "accessToken": "access-from-session", "email": "a@b.c" },
            "expires": "2030-01-01T00:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoints = Arc::new(UpstreamEndpoints::with_base_url(&server.uri()));
    let source = SessionCookieSource::new(Client::new(), endpoints, "sess-secret");

    assert_eq!(source.fetch().await.unwrap(), "access-from-session");
}

#[tokio::test]
async fn test_session_cookie_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/session"))
        .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized"))
        .mount(&server)
        .await;

    let endpoints = Arc::new(UpstreamEndpoints::with_base_url(&server.uri()));
    let source = SessionCookieSource::new(Client::new(), endpoints, "bad");

    match source.fetch().await.unwrap_err() {
        CredentialError::UpstreamRejected { source_kind, status, .. } => {
            assert_eq!(source_kind, CredentialSourceKind::SessionCookie);
            assert_eq!(status, Some(401));
        },
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_refresh_exchange() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session/get"))
        .and(header("authorization", "refresh-secret"))
        .and(body_json(serde_json::json!({ "token": "refresh-secret" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": { "accessToken": "access-from-refresh", "refreshToken": "next" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let endpoints = Arc::new(UpstreamEndpoints::with_base_url(&server.uri()));
    let source = RefreshTokenSource::new(Client::new(), endpoints, "refresh-secret");

    assert_eq!(source.fetch().await.unwrap(), "access-from-refresh");
}

#[tokio::test]
async fn test_refresh_status_error_is_rejection() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/session/get"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "error",
            "error": { "type": "INVALID_TOKEN", "message": "token expired" }
        })))
        .mount(&server)
        .await;

    let endpoints = Arc::new(UpstreamEndpoints::with_base_url(&server.uri()));
    let source = RefreshTokenSource::new(Client::new(), endpoints, "stale");

    let err = source.fetch().await.unwrap_err();
    assert!(err.to_string().contains("INVALID_TOKEN: token expired"), "{}", err);
}

#[tokio::test]
async fn test_unreachable_session_is_network_failure() {
    let endpoints = Arc::new(UpstreamEndpoints::with_base_url("http://127.0.0.1:1"));
    let source = SessionCookieSource::new(Client::new(), endpoints, "sess");

    assert!(matches!(source.fetch().await.unwrap_err(), CredentialError::NetworkFailure { .. }));
}
