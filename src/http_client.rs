//! Shared outbound HTTP client. Every call resolves to the response body on
//! success; failures are logged once and handed back to the caller with the
//! full server response intact.
use std::future::Future;

use reqwest::{header::HeaderMap, Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::HttpClientConfig;

#[derive(Debug, Error)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{url} returned {status}")]
    Status {
        status: StatusCode,
        url: Url,
        headers: HeaderMap,
        body: String,
    },
    /// Network, timeout, request-building or body decode failure.
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status(),
        }
    }

    pub fn url(&self) -> Option<&Url> {
        match self {
            ApiError::Status { url, .. } => Some(url),
            ApiError::Transport(e) => e.url(),
        }
    }

    /// Raw body of an error response.
    pub fn body(&self) -> Option<&str> {
        match self {
            ApiError::Status { body, .. } => Some(body),
            ApiError::Transport(_) => None,
        }
    }

    /// Error response body decoded as JSON.
    pub fn body_json<T: DeserializeOwned>(&self) -> Option<serde_json::Result<T>> {
        self.body().map(serde_json::from_str)
    }
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Option<Url>,
}

impl ApiClient {
    pub fn new(config: &HttpClientConfig) -> Result<Self, reqwest::Error> {
        let mut builder = Client::builder().user_agent(config.user_agent.clone());
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Start a request. Relative paths are joined onto the base URL; absolute
    /// URLs are used as given.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let target = match &self.base_url {
            Some(base) => match base.join(path) {
                Ok(url) => url.to_string(),
                Err(e) => {
                    // reqwest reports the raw path as a builder error on send
                    warn!(error = %e, base = %base, path, "cannot resolve request path");
                    path.to_string()
                }
            },
            None => path.to_string(),
        };
        self.client.request(method, target)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.request(Method::GET, path)
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.request(Method::POST, path)
    }

    pub fn put(&self, path: &str) -> RequestBuilder {
        self.request(Method::PUT, path)
    }

    pub fn patch(&self, path: &str) -> RequestBuilder {
        self.request(Method::PATCH, path)
    }

    pub fn delete(&self, path: &str) -> RequestBuilder {
        self.request(Method::DELETE, path)
    }

    /// Send and decode the JSON body as `T`.
    pub async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        intercept(request, |res| res.json::<T>()).await
    }

    /// Send and return the body as text.
    pub async fn send_text(&self, request: RequestBuilder) -> Result<String, ApiError> {
        intercept(request, Response::text).await
    }
}

/// Response interceptor: success is reduced to the body via `read_body`, and
/// any failure is logged exactly once then returned.
async fn intercept<T, F, Fut>(request: RequestBuilder, read_body: F) -> Result<T, ApiError>
where
    F: FnOnce(Response) -> Fut,
    Fut: Future<Output = reqwest::Result<T>>,
{
    let outcome = exchange(request, read_body).await;
    if let Err(e) = &outcome {
        error!(
            error = %e,
            status = ?e.status().map(|s| s.as_u16()),
            url = ?e.url().map(Url::as_str),
            "api request failed"
        );
    }
    outcome
}

async fn exchange<T, F, Fut>(request: RequestBuilder, read_body: F) -> Result<T, ApiError>
where
    F: FnOnce(Response) -> Fut,
    Fut: Future<Output = reqwest::Result<T>>,
{
    let res = request.send().await?;
    let status = res.status();
    if !status.is_success() {
        let url = res.url().clone();
        let headers = res.headers().clone();
        let body = res.text().await?;
        return Err(ApiError::Status {
            status,
            url,
            headers,
            body,
        });
    }

    debug!(%status, url = %res.url(), "api request ok");
    Ok(read_body(res).await?)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use mockito::Server;
    use serde::Deserialize;
    use serde_json::json;
    use tracing::subscriber::DefaultGuard;

    use super::*;

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn count(&self, needle: &str) -> usize {
            let buf = self.0.lock().unwrap();
            String::from_utf8_lossy(&buf).matches(needle).count()
        }
    }

    fn capture_logs() -> (CapturedLogs, DefaultGuard) {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::DEBUG)
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    fn client_for(base: &str) -> ApiClient {
        ApiClient::new(&HttpClientConfig {
            base_url: Some(Url::parse(base).unwrap()),
            timeout: Some(Duration::from_secs(5)),
            user_agent: "accounts-test".into(),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn success_resolves_to_body_only() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/status")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let api = client_for(&server.url());
        let (logs, _guard) = capture_logs();
        let body: serde_json::Value = api.send(api.get("/status")).await.expect("send");

        assert_eq!(body, json!({ "ok": true }));
        assert_eq!(logs.count("api request failed"), 0);
    }

    #[tokio::test]
    async fn success_decodes_into_typed_body() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct Ack {
            ok: bool,
        }

        let mut server = Server::new_async().await;
        server
            .mock("POST", "/ack")
            .with_status(201)
            .with_body(r#"{"ok":true}"#)
            .create_async()
            .await;

        let api = client_for(&server.url());
        let ack: Ack = api
            .send(api.post("/ack").json(&json!({ "ping": 1 })))
            .await
            .expect("send");
        assert_eq!(ack, Ack { ok: true });
    }

    #[tokio::test]
    async fn text_body_is_returned_verbatim() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/plain")
            .with_status(200)
            .with_body("hello")
            .create_async()
            .await;

        let api = client_for(&server.url());
        let text = api.send_text(api.get("/plain")).await.expect("send");
        assert_eq!(text, "hello");
    }

    #[tokio::test]
    async fn server_error_is_logged_once_and_returned_unchanged() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/boom")
            .with_status(500)
            .with_body("kaput")
            .create_async()
            .await;

        let api = client_for(&server.url());
        let (logs, _guard) = capture_logs();
        let err = api
            .send::<serde_json::Value>(api.get("/boom"))
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Status { .. }));
        assert_eq!(err.status(), Some(StatusCode::INTERNAL_SERVER_ERROR));
        assert_eq!(err.url().map(|u| u.path()), Some("/boom"));
        assert_eq!(err.body(), Some("kaput"));
        assert_eq!(logs.count("api request failed"), 1);
    }

    #[tokio::test]
    async fn error_response_keeps_headers_and_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/signup")
            .with_status(422)
            .with_header("content-type", "application/json")
            .with_header("x-request-id", "abc-123")
            .with_body(r#"{"field":"email","msg":"taken"}"#)
            .create_async()
            .await;

        let api = client_for(&server.url());
        let (logs, _guard) = capture_logs();
        let err = api
            .send::<serde_json::Value>(api.post("/signup"))
            .await
            .unwrap_err();

        let ApiError::Status { status, headers, .. } = &err else {
            panic!("expected status error, got {err:?}");
        };
        assert_eq!(*status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(headers.get("x-request-id").unwrap(), "abc-123");
        let body: serde_json::Value = err.body_json().expect("has body").expect("json body");
        assert_eq!(body, json!({ "field": "email", "msg": "taken" }));
        assert_eq!(logs.count("api request failed"), 1);
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("DELETE", "/users/1")
            .with_status(404)
            .expect(1)
            .create_async()
            .await;

        let api = client_for(&server.url());
        let err = api
            .send_text(api.delete("/users/1"))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn undecodable_body_is_an_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/garbage")
            .with_status(200)
            .with_body("not json")
            .create_async()
            .await;

        let api = client_for(&server.url());
        let (logs, _guard) = capture_logs();
        let err = api
            .send::<serde_json::Value>(api.get("/garbage"))
            .await
            .unwrap_err();
        let ApiError::Transport(inner) = &err else {
            panic!("expected transport error, got {err:?}");
        };
        assert!(inner.is_decode());
        assert!(err.body().is_none());
        assert_eq!(logs.count("api request failed"), 1);
    }

    #[tokio::test]
    async fn connection_failure_is_logged_once() {
        // Nothing listens on port 1.
        let api = client_for("http://127.0.0.1:1/");
        let (logs, _guard) = capture_logs();
        let err = api.send_text(api.get("/")).await.unwrap_err();
        let ApiError::Transport(inner) = &err else {
            panic!("expected transport error, got {err:?}");
        };
        assert!(inner.is_connect() || inner.is_request());
        assert_eq!(logs.count("api request failed"), 1);
    }

    #[test]
    fn paths_resolve_against_base_url() {
        let api = client_for("http://api.local/v1/");
        let req = api.get("users").build().unwrap();
        assert_eq!(req.url().as_str(), "http://api.local/v1/users");

        let req = api.get("https://other.local/x").build().unwrap();
        assert_eq!(req.url().as_str(), "https://other.local/x");
    }

    #[test]
    fn unresolvable_path_is_logged() {
        let api = client_for("http://api.local/");
        let (logs, _guard) = capture_logs();
        let err = api.get("http://[oops").build().unwrap_err();
        assert!(err.is_builder());
        assert_eq!(logs.count("cannot resolve request path"), 1);
    }

    #[test]
    fn relative_path_without_base_fails_at_build() {
        let api = ApiClient::new(&HttpClientConfig::default()).unwrap();
        assert!(api.base_url().is_none());
        let err = api.get("/users").build().unwrap_err();
        assert!(err.is_builder());
    }
}
