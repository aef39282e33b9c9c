//! Self-authenticating API client.
//!
//! This module provides the `AuthenticatedClient` struct, which logs in on
//! demand, injects the bearer token into every request and re-authenticates
//! when the server answers 401.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::sync::{Mutex, OnceCell};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::error::{ClientError, Result};
use super::options::RequestOptions;
use super::transport::{header_map, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::alias::AliasStore;
use crate::config::ClientConfig;

// ============================================================================
// Constants
// ============================================================================

/// Alias holding the bearer token returned by the login endpoint
pub const AUTH_TOKEN_ALIAS: &str = "authToken";

/// Alias holding the opaque user identifier returned by the login endpoint
pub const USER_UUID_ALIAS: &str = "userUuid";

/// Both aliases must be present for the client to count as authenticated
const SESSION_ALIASES: [&str; 2] = [AUTH_TOKEN_ALIAS, USER_UUID_ALIAS];

/// Login endpoint, relative to the API base URL
const LOGIN_PATH: &str = "login";

const JSON_MEDIA_TYPE: &str = "application/json";

#[derive(Serialize)]
struct LoginRequest<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    #[serde(rename = "authToken")]
    auth_token: String,
    #[serde(rename = "userUuid")]
    user_uuid: String,
}

struct Inner {
    config: ClientConfig,
    aliases: Arc<dyn AliasStore>,
    transport: OnceCell<Arc<dyn HttpTransport>>,
    /// Serializes non-forced logins so concurrent first requests share one
    login_lock: Mutex<()>,
}

/// HTTP client that manages its own session.
/// Clone is cheap - all state lives behind one `Arc`.
#[derive(Clone)]
pub struct AuthenticatedClient {
    inner: Arc<Inner>,
}

impl AuthenticatedClient {
    /// Create a client that builds a `ReqwestTransport` on first use.
    pub fn new(config: ClientConfig, aliases: Arc<dyn AliasStore>) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, aliases, OnceCell::new()))
    }

    /// Create a client around an existing transport.
    pub fn with_transport(
        config: ClientConfig,
        aliases: Arc<dyn AliasStore>,
        transport: Arc<dyn HttpTransport>,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_parts(config, aliases, OnceCell::new_with(Some(transport))))
    }

    fn from_parts(
        config: ClientConfig,
        aliases: Arc<dyn AliasStore>,
        transport: OnceCell<Arc<dyn HttpTransport>>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                aliases,
                transport,
                login_lock: Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn aliases(&self) -> &Arc<dyn AliasStore> {
        &self.inner.aliases
    }

    /// Both session aliases are present. Says nothing about token validity.
    pub fn is_authenticated(&self) -> bool {
        self.inner.aliases.has_aliases(&SESSION_ALIASES)
    }

    pub fn auth_token(&self) -> Option<String> {
        self.inner.aliases.lookup(AUTH_TOKEN_ALIAS)
    }

    pub fn user_uuid(&self) -> Option<String> {
        self.inner.aliases.lookup(USER_UUID_ALIAS)
    }

    async fn transport(&self) -> Result<&Arc<dyn HttpTransport>> {
        self.inner
            .transport
            .get_or_try_init(|| async {
                let transport = ReqwestTransport::new(&self.inner.config)?;
                Ok::<Arc<dyn HttpTransport>, ClientError>(Arc::new(transport))
            })
            .await
    }

    // ===== Authentication =====

    /// Make sure a session exists. With `force`, always log in again.
    pub async fn login(&self, force: bool) -> Result<()> {
        if force {
            return self.perform_login().await;
        }
        if self.is_authenticated() {
            return Ok(());
        }

        let _guard = self.inner.login_lock.lock().await;
        // Another caller may have finished logging in while we waited
        if self.is_authenticated() {
            return Ok(());
        }
        self.perform_login().await
    }

    /// Unconditionally log in and overwrite the session aliases.
    pub async fn reauthenticate(&self) -> Result<()> {
        self.login(true).await
    }

    async fn perform_login(&self) -> Result<()> {
        let config = &self.inner.config;
        let url = config.url_for(LOGIN_PATH);
        let body = serde_json::to_value(LoginRequest {
            login: &config.credentials.login,
            password: &config.credentials.password,
        })?;

        let mut request = HttpRequest::new(Method::POST, url);
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static(JSON_MEDIA_TYPE));
        request
            .headers
            .insert(ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        request.json = Some(body);

        debug!(login = %config.credentials.login, "Sending login request");
        let response = self
            .transport()
            .await?
            .send(request)
            .await
            .map_err(|e| ClientError::Authentication(format!("login request failed: {}", e)))?;

        if !response.status.is_success() {
            return Err(ClientError::Authentication(format!(
                "login rejected with status {}",
                response.status
            )));
        }

        let session: LoginResponse = response
            .json()
            .map_err(|e| ClientError::Authentication(format!("invalid login response: {}", e)))?;

        self.inner.aliases.set_aliases(&[
            (AUTH_TOKEN_ALIAS, session.auth_token.as_str()),
            (USER_UUID_ALIAS, session.user_uuid.as_str()),
        ]);
        info!(user_uuid = %session.user_uuid, "Logged in");
        Ok(())
    }

    // ===== Requests =====

    /// Send an authenticated request, logging in first if needed and
    /// re-authenticating on 401 up to `max_attempts` dispatches.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse> {
        let max_attempts = self.inner.config.max_attempts;
        let mut attempt = 1;

        loop {
            match self.attempt(method.clone(), uri, options.clone()).await {
                Err(e) if e.is_auth_expired() && attempt < max_attempts => {
                    attempt += 1;
                    warn!(
                        method = %method,
                        uri = uri,
                        attempt = attempt,
                        max_attempts = max_attempts,
                        "Token rejected, re-authenticating"
                    );
                    self.reauthenticate().await?;
                }
                result => return result,
            }
        }
    }

    /// Spawn `request` on the current tokio runtime and return a handle
    /// immediately. Retries on 401 exactly as `request` does.
    ///
    /// Fails with `ClientError::Runtime` when called outside a runtime.
    pub fn request_async(
        &self,
        method: Method,
        uri: impl Into<String>,
        options: RequestOptions,
    ) -> Result<PendingResponse> {
        let runtime = Handle::try_current().map_err(|e| ClientError::Runtime(e.to_string()))?;
        let client = self.clone();
        let uri = uri.into();
        Ok(PendingResponse {
            handle: runtime.spawn(async move { client.request(method, &uri, options).await }),
        })
    }

    /// Send a request with no login, no alias resolution and no default
    /// headers. Base headers from the config still apply.
    pub async fn raw_request(
        &self,
        method: Method,
        uri: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse> {
        let url = self.inner.config.url_for(uri);
        let request = Self::build_request(method, url, options)?;
        self.dispatch(request).await
    }

    pub async fn get(&self, uri: &str) -> Result<HttpResponse> {
        self.request(Method::GET, uri, RequestOptions::new()).await
    }

    pub async fn post_json(&self, uri: &str, body: Value) -> Result<HttpResponse> {
        self.request(Method::POST, uri, RequestOptions::new().json(body))
            .await
    }

    /// One link of the call chain: ensure a session, build, dispatch.
    async fn attempt(
        &self,
        method: Method,
        uri: &str,
        options: RequestOptions,
    ) -> Result<HttpResponse> {
        self.login(false).await?;

        let mut merged = Self::default_options().merge(options);

        // URI and every header expand together, once, from one snapshot
        let mut templates = vec![uri];
        templates.extend(merged.headers.iter().map(|(_, value)| value.as_str()));
        let mut resolved = self.inner.aliases.resolve_all(&templates)?.into_iter();
        let url = self
            .inner
            .config
            .url_for(&resolved.next().unwrap_or_default());
        for ((_, value), expanded) in merged.headers.iter_mut().zip(resolved) {
            *value = expanded;
        }

        let request = Self::build_request(method, url, merged)?;
        self.dispatch(request).await
    }

    fn default_options() -> RequestOptions {
        RequestOptions::new()
            .header(AUTHORIZATION.as_str(), format!("{{{}}}", AUTH_TOKEN_ALIAS))
            .header(CONTENT_TYPE.as_str(), JSON_MEDIA_TYPE)
            .header(ACCEPT.as_str(), JSON_MEDIA_TYPE)
    }

    fn build_request(method: Method, url: String, options: RequestOptions) -> Result<HttpRequest> {
        let headers = header_map(options.headers.iter().map(|(n, v)| (n, v)))?;
        Ok(HttpRequest {
            method,
            url,
            headers,
            query: options.query,
            json: options.json,
            timeout: options.timeout,
        })
    }

    async fn dispatch(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "Dispatching request");
        let response = self.transport().await?.send(request).await?;
        debug!(status = %response.status, "Response received");
        response.error_for_status()
    }
}

/// Handle to a request running in the background.
pub struct PendingResponse {
    handle: JoinHandle<Result<HttpResponse>>,
}

impl Future for PendingResponse {
    type Output = Result<HttpResponse>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle)
            .poll(cx)
            .map(|joined| joined.map_err(ClientError::from).and_then(|result| result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex as StdMutex;

    use async_trait::async_trait;
    use reqwest::StatusCode;
    use serde_json::json;

    use crate::alias::MemoryAliasStore;

    /// Transport that records every request and answers from scripts:
    /// login calls get `login_status`, other calls pop `responses` and
    /// repeat the last entry once the queue is down to one.
    struct ScriptedTransport {
        login_status: StatusCode,
        responses: StdMutex<VecDeque<StatusCode>>,
        requests: StdMutex<Vec<HttpRequest>>,
        logins: StdMutex<u32>,
    }

    impl ScriptedTransport {
        fn new(responses: &[u16]) -> Arc<Self> {
            Arc::new(Self {
                login_status: StatusCode::OK,
                responses: StdMutex::new(
                    responses.iter().map(|s| StatusCode::from_u16(*s).unwrap()).collect(),
                ),
                requests: StdMutex::new(Vec::new()),
                logins: StdMutex::new(0),
            })
        }

        fn failing_login() -> Arc<Self> {
            Arc::new(Self {
                login_status: StatusCode::FORBIDDEN,
                responses: StdMutex::new(VecDeque::from([StatusCode::OK])),
                requests: StdMutex::new(Vec::new()),
                logins: StdMutex::new(0),
            })
        }

        fn logins(&self) -> u32 {
            *self.logins.lock().unwrap()
        }

        fn dispatches(&self) -> Vec<HttpRequest> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .filter(|r| !r.url.ends_with("/login"))
                .cloned()
                .collect()
        }

        fn all_requests(&self) -> Vec<HttpRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpTransport for ScriptedTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
            let is_login = request.url.ends_with("/login");
            self.requests.lock().unwrap().push(request);

            if is_login {
                let n = {
                    let mut logins = self.logins.lock().unwrap();
                    *logins += 1;
                    *logins
                };
                let body = json!({"authToken": format!("token-{}", n), "userUuid": "uuid-1"});
                return Ok(HttpResponse::new(self.login_status, body.to_string()));
            }

            let status = {
                let mut responses = self.responses.lock().unwrap();
                if responses.len() > 1 {
                    responses.pop_front().unwrap()
                } else {
                    *responses.front().unwrap()
                }
            };
            Ok(HttpResponse::new(status, r#"{"ok": true}"#))
        }
    }

    fn client_with(
        transport: Arc<ScriptedTransport>,
        max_attempts: u32,
    ) -> (AuthenticatedClient, Arc<MemoryAliasStore>) {
        let store = Arc::new(MemoryAliasStore::new());
        let config = ClientConfig::new("alice", "secret")
            .with_api("https://api.test/v1")
            .with_max_attempts(max_attempts);
        let client = AuthenticatedClient::with_transport(config, store.clone(), transport).unwrap();
        (client, store)
    }

    #[test]
    fn test_new_rejects_missing_credentials() {
        let store: Arc<dyn AliasStore> = Arc::new(MemoryAliasStore::new());
        let result = AuthenticatedClient::new(ClientConfig::new("", "pw"), store);
        assert!(matches!(result, Err(ClientError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn test_first_request_logs_in_exactly_once() {
        let transport = ScriptedTransport::new(&[200]);
        let (client, store) = client_with(transport.clone(), 3);

        let response = client.get("items").await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(transport.logins(), 1);

        let all = transport.all_requests();
        assert_eq!(all.len(), 2);
        assert!(all[0].url.ends_with("/login"));
        assert_eq!(all[1].url, "https://api.test/v1/items");
        assert_eq!(store.get_alias("authToken").unwrap(), "token-1");
        assert_eq!(store.get_alias("userUuid").unwrap(), "uuid-1");
    }

    #[tokio::test]
    async fn test_login_sends_credentials_without_authorization() {
        let transport = ScriptedTransport::new(&[200]);
        let (client, _) = client_with(transport.clone(), 3);
        client.login(false).await.unwrap();

        let login = &transport.all_requests()[0];
        assert_eq!(login.method, Method::POST);
        assert_eq!(login.url, "https://api.test/v1/login");
        assert_eq!(login.json, Some(json!({"login": "alice", "password": "secret"})));
        assert!(login.headers.get(AUTHORIZATION).is_none());
        assert_eq!(login.headers.get(CONTENT_TYPE).unwrap(), JSON_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_existing_session_skips_login() {
        let transport = ScriptedTransport::new(&[200]);
        let (client, store) = client_with(transport.clone(), 3);
        store.set_aliases(&[("authToken", "cached"), ("userUuid", "u")]);

        client.get("items").await.unwrap();
        assert_eq!(transport.logins(), 0);

        let dispatched = transport.dispatches();
        assert_eq!(dispatched.len(), 1);
        assert_eq!(dispatched[0].headers.get(AUTHORIZATION).unwrap(), "cached");
        assert_eq!(dispatched[0].headers.get(ACCEPT).unwrap(), JSON_MEDIA_TYPE);
    }

    #[tokio::test]
    async fn test_partial_session_triggers_login() {
        let transport = ScriptedTransport::new(&[200]);
        let (client, store) = client_with(transport.clone(), 3);
        store.set_alias("authToken", "orphan");

        client.get("items").await.unwrap();
        assert_eq!(transport.logins(), 1);
        assert_eq!(client.auth_token().as_deref(), Some("token-1"));
    }

    #[tokio::test]
    async fn test_login_force_always_hits_network() {
        let transport = ScriptedTransport::new(&[200]);
        let (client, _) = client_with(transport.clone(), 3);

        client.login(false).await.unwrap();
        client.login(false).await.unwrap();
        assert_eq!(transport.logins(), 1);

        client.reauthenticate().await.unwrap();
        assert_eq!(transport.logins(), 2);
        assert_eq!(client.auth_token().as_deref(), Some("token-2"));
    }

    #[tokio::test]
    async fn test_always_unauthorized_is_bounded() {
        let transport = ScriptedTransport::new(&[401]);
        let (client, _) = client_with(transport.clone(), 3);

        let err = client.get("items").await.unwrap_err();
        assert!(err.is_auth_expired());
        assert_eq!(transport.dispatches().len(), 3);
        // One initial login plus two re-authentications
        assert_eq!(transport.logins(), 3);
    }

    #[tokio::test]
    async fn test_single_attempt_never_reauthenticates() {
        let transport = ScriptedTransport::new(&[401]);
        let (client, store) = client_with(transport.clone(), 1);
        store.set_aliases(&[("authToken", "stale"), ("userUuid", "u")]);

        assert!(client.get("items").await.unwrap_err().is_auth_expired());
        assert_eq!(transport.dispatches().len(), 1);
        assert_eq!(transport.logins(), 0);
    }

    #[tokio::test]
    async fn test_unauthorized_then_ok_retries_once() {
        let transport = ScriptedTransport::new(&[401, 200]);
        let (client, store) = client_with(transport.clone(), 3);
        store.set_aliases(&[("authToken", "stale"), ("userUuid", "u")]);

        let response = client.get("items").await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(transport.logins(), 1);

        let dispatched = transport.dispatches();
        assert_eq!(dispatched.len(), 2);
        assert_eq!(dispatched[0].headers.get(AUTHORIZATION).unwrap(), "stale");
        assert_eq!(dispatched[1].headers.get(AUTHORIZATION).unwrap(), "token-1");
    }

    #[tokio::test]
    async fn test_retry_budget_is_per_call() {
        let transport = ScriptedTransport::new(&[401, 401, 200, 401, 401, 200]);
        let (client, _) = client_with(transport.clone(), 3);

        client.get("first").await.unwrap();
        // A fresh call gets a full budget again
        client.get("second").await.unwrap();
        assert_eq!(transport.dispatches().len(), 6);
    }

    #[tokio::test]
    async fn test_other_errors_are_not_retried() {
        let transport = ScriptedTransport::new(&[500]);
        let (client, _) = client_with(transport.clone(), 3);

        match client.get("items").await {
            Err(ClientError::Status { status, .. }) => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("unexpected {:?}", other.map(|r| r.status)),
        }
        assert_eq!(transport.dispatches().len(), 1);
        assert_eq!(transport.logins(), 1);
    }

    #[tokio::test]
    async fn test_failed_login_is_authentication_error() {
        let transport = ScriptedTransport::failing_login();
        let (client, store) = client_with(transport.clone(), 3);

        let err = client.get("items").await.unwrap_err();
        assert!(matches!(err, ClientError::Authentication(_)));
        assert!(transport.dispatches().is_empty());
        assert!(!store.has_alias("authToken"));
    }

    #[tokio::test]
    async fn test_uri_and_header_aliases_are_resolved() {
        let transport = ScriptedTransport::new(&[200]);
        let (client, store) = client_with(transport.clone(), 3);
        store.set_aliases(&[("authToken", "t"), ("userUuid", "u-42")]);

        let options = RequestOptions::new()
            .header("X-User", "{userUuid}")
            .header("Authorization", "Bearer {authToken}")
            .query("page", "2");
        client
            .request(Method::GET, "users/{userUuid}/items", options)
            .await
            .unwrap();

        let sent = &transport.dispatches()[0];
        assert_eq!(sent.url, "https://api.test/v1/users/u-42/items");
        assert_eq!(sent.headers.get("x-user").unwrap(), "u-42");
        assert_eq!(sent.headers.get(AUTHORIZATION).unwrap(), "Bearer t");
        assert_eq!(sent.query, vec![("page".to_string(), "2".to_string())]);
    }

    #[tokio::test]
    async fn test_token_containing_braces_is_sent_verbatim() {
        let transport = ScriptedTransport::new(&[200]);
        let (client, store) = client_with(transport.clone(), 3);
        store.set_aliases(&[("authToken", "abc{sig}def"), ("userUuid", "uuid-1")]);

        client.get("users/{userUuid}").await.unwrap();
        assert_eq!(transport.logins(), 0);
        let sent = transport.dispatches();
        assert_eq!(sent[0].url, "https://api.test/v1/users/uuid-1");
        assert_eq!(sent[0].headers.get(AUTHORIZATION).unwrap(), "abc{sig}def");
    }

    #[tokio::test]
    async fn test_ttl_expired_session_logs_in_again() {
        let transport = ScriptedTransport::new(&[200]);
        let stale = chrono::Utc::now() - chrono::Duration::minutes(30);
        let entries = [("authToken", "token-old"), ("userUuid", "uuid-old")]
            .into_iter()
            .map(|(name, value)| {
                let mut entry = crate::alias::AliasEntry::new(value);
                entry.set_at = stale;
                (name.to_string(), entry)
            })
            .collect();
        let store = Arc::new(MemoryAliasStore::from_entries(
            entries,
            Some(chrono::Duration::minutes(10)),
        ));
        let config = ClientConfig::new("alice", "secret").with_api("https://api.test/v1");
        let client =
            AuthenticatedClient::with_transport(config, store.clone(), transport.clone()).unwrap();

        assert!(!client.is_authenticated());
        client.get("items").await.unwrap();

        assert_eq!(transport.logins(), 1);
        let sent = transport.dispatches();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].headers.get(AUTHORIZATION).unwrap(), "token-1");
        assert_eq!(store.get_alias("authToken").unwrap(), "token-1");
    }

    #[tokio::test]
    async fn test_unknown_alias_in_uri_fails_before_dispatch() {
        let transport = ScriptedTransport::new(&[200]);
        let (client, store) = client_with(transport.clone(), 3);
        store.set_aliases(&[("authToken", "t"), ("userUuid", "u")]);

        let err = client.get("orders/{orderId}").await.unwrap_err();
        assert!(matches!(err, ClientError::UnknownAlias(ref n) if n == "orderId"));
        assert!(transport.dispatches().is_empty());
    }

    #[tokio::test]
    async fn test_raw_request_bypasses_authentication() {
        let transport = ScriptedTransport::new(&[200]);
        let (client, _) = client_with(transport.clone(), 3);

        client
            .raw_request(Method::GET, "status/{literal}", RequestOptions::new())
            .await
            .unwrap();

        assert_eq!(transport.logins(), 0);
        let sent = &transport.all_requests()[0];
        assert_eq!(sent.url, "https://api.test/v1/status/{literal}");
        assert!(sent.headers.get(AUTHORIZATION).is_none());
    }

    #[tokio::test]
    async fn test_request_async_retries_like_request() {
        let transport = ScriptedTransport::new(&[401, 200]);
        let (client, store) = client_with(transport.clone(), 3);
        store.set_aliases(&[("authToken", "stale"), ("userUuid", "u")]);

        let pending = client
            .request_async(Method::DELETE, "items/1", RequestOptions::new())
            .unwrap();
        let response = pending.await.unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(transport.logins(), 1);
        assert_eq!(transport.dispatches()[0].method, Method::DELETE);
    }

    #[test]
    fn test_request_async_outside_runtime_is_an_error() {
        let (client, _) = client_with(ScriptedTransport::new(&[200]), 3);
        let result = client.request_async(Method::GET, "items", RequestOptions::new());
        assert!(matches!(result, Err(ClientError::Runtime(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_requests_share_one_login() {
        let transport = ScriptedTransport::new(&[200]);
        let (client, _) = client_with(transport.clone(), 3);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                client
                    .request_async(Method::GET, format!("items/{}", i), RequestOptions::new())
                    .unwrap()
            })
            .collect();
        for result in futures::future::join_all(handles).await {
            result.unwrap();
        }

        assert_eq!(transport.logins(), 1);
        assert_eq!(transport.dispatches().len(), 8);
    }
}
