// Authenticated session
//
// Owns the credentials, the current bearer token and the reqwest client
// bound to the platform's base URL. Every endpoint module issues its calls
// through `Session::send`, which attaches the token, re-authenticates once
// on HTTP 401, and turns every other non-2xx status into `Error::Api`.
//
// The token sits behind a tokio `RwLock`. Requests hold a read guard from
// the moment they read the token until the response headers arrive, and
// (re)authentication takes the write guard, so a request can never go out
// with a token that is being replaced underneath it. Requests to unrelated
// endpoints still run concurrently.

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::RwLock;
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::Error;
use crate::models::Identifier;
use crate::normalize;
use crate::transport::TransportConfig;

/// Credential exchange endpoint. Answers with a quoted token string.
pub const AUTHENTICATE_PATH: &str = "/api/v0/authenticate";

/// Best-effort token check run after every successful authentication.
pub const AUTHOK_PATH: &str = "/api/v0/authok";

/// Longest response body kept in error values.
const BODY_PREVIEW_CHARS: usize = 1024;

/// Username/password pair exchanged for a bearer token.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

// ── Requests ────────────────────────────────────────────────────────

/// Request body. Owned so the request can be replayed after re-authentication.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Text(String),
}

/// One call against the platform API, relative to the session's base URL.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: RequestBody,
    headers: HeaderMap,
}

impl ApiRequest {
    /// `path` must start with `/`, e.g. `/api/v0/labs`.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
            headers: HeaderMap::new(),
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_owned(), value.to_string()));
        self
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Text(body.into());
        self
    }

    /// Extra header. `Authorization` is always overwritten by the session.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn body(&self) -> &RequestBody {
        &self.body
    }
}

// ── Session ─────────────────────────────────────────────────────────

#[derive(Default)]
struct TokenState {
    token: Option<SecretString>,
    /// Bumped on every successful authentication. Lets a request that got
    /// a 401 tell whether someone else already rotated the token.
    generation: u64,
}

/// Authenticated connection to one platform instance.
///
/// Created once per process and shared by reference (or `Arc`) with every
/// component that talks to the platform. Nothing is persisted.
pub struct Session {
    http: reqwest::Client,
    base_url: Url,
    credentials: Credentials,
    token: RwLock<TokenState>,
}

impl Session {
    /// Create a session from a `TransportConfig`. No network traffic
    /// happens until the first request (or an explicit `authenticate`).
    pub fn new(
        base_url: Url,
        credentials: Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self::with_client(http, base_url, credentials))
    }

    /// Create a session around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url, credentials: Credentials) -> Self {
        Self {
            http,
            base_url,
            credentials,
            token: RwLock::new(TokenState::default()),
        }
    }

    /// The platform base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn username(&self) -> &str {
        &self.credentials.username
    }

    /// Whether a token has been obtained yet.
    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.token.is_some()
    }

    // ── Authentication ───────────────────────────────────────────────

    /// Exchange the credentials for a fresh bearer token.
    ///
    /// `POST /api/v0/authenticate` with `{"username", "password"}`. The
    /// response body is the token, usually wrapped in double quotes. A
    /// follow-up `GET /api/v0/authok` is attempted; its failure is logged
    /// and otherwise ignored.
    pub async fn authenticate(&self) -> Result<(), Error> {
        let mut state = self.token.write().await;
        self.login(&mut state).await
    }

    async fn login(&self, state: &mut TokenState) -> Result<(), Error> {
        let url = self.url(AUTHENTICATE_PATH)?;
        info!(%url, username = %self.credentials.username, "authenticating");

        let body = json!({
            "username": self.credentials.username,
            "password": self.credentials.password.expose_secret(),
        });

        let resp = self.http.post(url).json(&body).send().await?;
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(Error::Authentication {
                message: format!("HTTP {status}: {}", preview(&text)),
            });
        }

        let token = text.trim().trim_matches('"');
        if token.is_empty() {
            return Err(Error::Authentication {
                message: "authenticate endpoint returned an empty token".into(),
            });
        }

        state.token = Some(SecretString::from(token.to_owned()));
        state.generation += 1;
        debug!(generation = state.generation, "token stored");

        self.verify_token(token).await;
        Ok(())
    }

    async fn verify_token(&self, token: &str) {
        let check = async {
            let url = self.url(AUTHOK_PATH)?;
            self.http
                .get(url)
                .header(AUTHORIZATION, bearer(token)?)
                .send()
                .await?
                .error_for_status()?;
            Ok::<(), Error>(())
        };

        match check.await {
            Ok(()) => debug!("token verified"),
            Err(e) => warn!(error = %e, "token verification failed"),
        }
    }

    async fn ensure_token(&self) -> Result<(), Error> {
        if self.token.read().await.token.is_some() {
            return Ok(());
        }
        let mut state = self.token.write().await;
        // Another request may have logged in while we waited for the lock.
        if state.token.is_none() {
            self.login(&mut state).await?;
        }
        Ok(())
    }

    async fn reauthenticate(&self, seen_generation: u64) -> Result<(), Error> {
        let mut state = self.token.write().await;
        if state.generation != seen_generation {
            debug!("token already rotated by a concurrent request");
            return Ok(());
        }
        self.login(&mut state).await
    }

    // ── Requests ─────────────────────────────────────────────────────

    /// Perform an authenticated request.
    ///
    /// Authenticates first if no token is held. On HTTP 401 the session
    /// re-authenticates exactly once and replays the request; a second 401
    /// is returned as [`Error::Unauthorized`]. Any other non-2xx status is
    /// returned as [`Error::Api`] with the status and body.
    pub async fn send(&self, req: &ApiRequest) -> Result<reqwest::Response, Error> {
        let (resp, generation) = self.dispatch(req).await?;
        if resp.status() != StatusCode::UNAUTHORIZED {
            return check_status(req, resp).await;
        }

        warn!(method = %req.method, path = %req.path, "got 401, re-authenticating");
        self.reauthenticate(generation).await?;

        let (resp, _) = self.dispatch(req).await?;
        if resp.status() == StatusCode::UNAUTHORIZED {
            return Err(Error::Unauthorized {
                method: req.method.to_string(),
                endpoint: req.path.clone(),
            });
        }
        check_status(req, resp).await
    }

    async fn dispatch(&self, req: &ApiRequest) -> Result<(reqwest::Response, u64), Error> {
        self.ensure_token().await?;

        let state = self.token.read().await;
        let token = state.token.as_ref().ok_or_else(|| Error::Authentication {
            message: "no token held after authentication".into(),
        })?;

        let builder = self.build(req, token)?;
        debug!("{} {}", req.method, req.path);
        let resp = builder.send().await?;
        trace!(status = %resp.status(), "response received");

        Ok((resp, state.generation))
    }

    fn build(
        &self,
        req: &ApiRequest,
        token: &SecretString,
    ) -> Result<reqwest::RequestBuilder, Error> {
        let url = self.url(&req.path)?;

        let mut headers = req.headers.clone();
        headers.insert(AUTHORIZATION, bearer(token.expose_secret())?);

        let mut builder = self.http.request(req.method.clone(), url).headers(headers);
        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }

        Ok(match &req.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(value),
            RequestBody::Text(text) => builder
                .header(CONTENT_TYPE, "text/plain; charset=utf-8")
                .body(text.clone()),
        })
    }

    /// Join an absolute API path onto the base URL, keeping any path
    /// prefix the base URL carries.
    fn url(&self, path: &str) -> Result<Url, Error> {
        let base = self.base_url.as_str().trim_end_matches('/');
        Ok(Url::parse(&format!("{base}{path}"))?)
    }

    // ── Response helpers ─────────────────────────────────────────────

    /// Send and decode a JSON response body.
    pub async fn send_json<T: DeserializeOwned>(&self, req: &ApiRequest) -> Result<T, Error> {
        let resp = self.send(req).await?;
        let body = resp.text().await?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{e} (body preview: {:?})", preview(&body)),
            body,
        })
    }

    /// Send and return the raw response text.
    pub async fn send_text(&self, req: &ApiRequest) -> Result<String, Error> {
        let resp = self.send(req).await?;
        Ok(resp.text().await?)
    }

    /// Send and discard the response body.
    pub async fn send_empty(&self, req: &ApiRequest) -> Result<(), Error> {
        let _ = self.send_text(req).await?;
        Ok(())
    }

    /// Send a create request and pull the new resource's `id` out of the
    /// response. Some endpoints answer with the created object, others
    /// with a list of created objects; the first `id` wins.
    pub async fn send_for_id(&self, req: &ApiRequest) -> Result<Identifier, Error> {
        let value: Value = self.send_json(req).await?;
        let id = match &value {
            Value::Object(obj) => obj.get("id"),
            Value::Array(items) => items.first().and_then(|first| first.get("id")),
            _ => None,
        };
        match id {
            Some(Value::String(id)) if !id.is_empty() => Ok(Identifier::from(id.as_str())),
            _ => Err(Error::MissingId {
                endpoint: req.path.clone(),
                body: preview(&value.to_string()),
            }),
        }
    }

    /// Send a request to an identifier-list endpoint and normalize the
    /// answer (see [`normalize::identifiers`]).
    ///
    /// A body that is not valid JSON is treated as a bare string, so an
    /// unquoted run of concatenated identifiers still decodes.
    pub async fn get_identifiers(&self, req: &ApiRequest) -> Result<Vec<Identifier>, Error> {
        let text = self.send_text(req).await?;
        let value = serde_json::from_str::<Value>(&text)
            .unwrap_or_else(|_| Value::String(text.trim().to_owned()));

        let list = normalize::identifiers(&value).map_err(|e| Error::UnexpectedShape {
            endpoint: req.path.clone(),
            shape: e.shape,
        })?;

        trace!(
            path = %req.path,
            encoding = ?list.encoding,
            count = list.ids.len(),
            "normalized identifier list"
        );
        Ok(list.into_ids())
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("base_url", &self.base_url.as_str())
            .field("username", &self.credentials.username)
            .finish_non_exhaustive()
    }
}

async fn check_status(req: &ApiRequest, resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Api {
        method: req.method.to_string(),
        endpoint: req.path.clone(),
        status: status.as_u16(),
        body: preview(&body),
    })
}

fn bearer(token: &str) -> Result<HeaderValue, Error> {
    let mut value =
        HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| Error::Authentication {
            message: format!("token is not a valid header value: {e}"),
        })?;
    value.set_sensitive(true);
    Ok(value)
}

fn preview(body: &str) -> String {
    body.chars().take(BODY_PREVIEW_CHARS).collect()
}
