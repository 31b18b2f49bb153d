//! The client: configuration, request dispatch, and the typed operations.
//!
//! # Design
//! `RestClient` holds the backend origin, the default headers, and three
//! injected collaborators: the transport, the loading indicator, and the
//! callback scheduler. Each operation merges the resource's default
//! parameters under the caller's, routes the merged map into the query
//! string or the JSON body depending on the method, executes through the
//! transport, and decodes the response object. Every failure comes back as
//! a `ClientError`; nothing is dropped and nothing aborts.

use std::fmt;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ClientError;
use crate::hooks::{inline_scheduler, CallbackScheduler, LoadingIndicator, NoopIndicator};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::multipart::{encode_multipart, UploadFile};
use crate::params::{merge_params, value_text, JsonObject, Params};
use crate::resource::{decode_many, decode_one, Resource};
use crate::transport::{Transport, UreqTransport};

/// Request timeout applied when the builder is not given one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Typed REST client over a JSON backend.
///
/// Cheap to clone; clones share the transport, the indicator, and the
/// scheduler.
#[derive(Clone)]
pub struct RestClient {
    base_url: String,
    default_headers: Vec<(String, String)>,
    transport: Arc<dyn Transport>,
    indicator: Arc<dyn LoadingIndicator>,
    scheduler: CallbackScheduler,
}

impl fmt::Debug for RestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestClient")
            .field("base_url", &self.base_url)
            .field("default_headers", &self.default_headers)
            .finish_non_exhaustive()
    }
}

/// Builder for [`RestClient`].
pub struct RestClientBuilder {
    base_url: String,
    timeout: Duration,
    default_headers: Vec<(String, String)>,
    transport: Option<Arc<dyn Transport>>,
    indicator: Arc<dyn LoadingIndicator>,
    scheduler: CallbackScheduler,
}

impl RestClientBuilder {
    fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout: DEFAULT_TIMEOUT,
            default_headers: Vec::new(),
            transport: None,
            indicator: Arc::new(NoopIndicator),
            scheduler: inline_scheduler(),
        }
    }

    /// Request timeout for the bundled transport. Ignored when a custom
    /// transport is injected.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Header attached to every request. A per-call header with the same
    /// name takes precedence.
    pub fn default_header(mut self, name: &str, value: &str) -> Self {
        self.default_headers
            .push((name.to_string(), value.to_string()));
        self
    }

    /// Replace the bundled blocking transport.
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Indicator shown and hidden around calls made with
    /// `show_loading = true`.
    pub fn loading_indicator(mut self, indicator: Arc<dyn LoadingIndicator>) -> Self {
        self.indicator = indicator;
        self
    }

    /// Scheduler that delivers background completions, e.g. onto the host's
    /// main thread. Defaults to running them on the worker thread.
    pub fn callback_scheduler(mut self, scheduler: CallbackScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    /// Validate the base URL and assemble the client.
    pub fn build(self) -> Result<RestClient, ClientError> {
        let parsed = Url::parse(&self.base_url)
            .map_err(|e| ClientError::Config(format!("invalid base URL {:?}: {e}", self.base_url)))?;
        if !parsed.has_host() {
            return Err(ClientError::Config(format!(
                "base URL {:?} has no host",
                self.base_url
            )));
        }
        let transport = self
            .transport
            .unwrap_or_else(|| Arc::new(UreqTransport::new(self.timeout)));
        Ok(RestClient {
            base_url: self.base_url,
            default_headers: self.default_headers,
            transport,
            indicator: self.indicator,
            scheduler: self.scheduler,
        })
    }
}

impl RestClient {
    /// Start building a client for the given backend origin.
    pub fn builder(base_url: &str) -> RestClientBuilder {
        RestClientBuilder::new(base_url)
    }

    /// Issue a request and return the response's root JSON object.
    ///
    /// `params` travel as a JSON body for `POST`/`PUT`/`PATCH` and in the
    /// URL query string for every other method. `extra_headers` override
    /// default headers of the same name, case-insensitively.
    pub fn raw_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: Params,
        show_loading: bool,
        extra_headers: &[(String, String)],
    ) -> Result<JsonObject, ClientError> {
        self.with_indicator(show_loading, |client| {
            client.dispatch(method, path, params, extra_headers)
        })
    }

    /// GET one `T` from `T::base_path()` plus `path`.
    ///
    /// The call's `params` are merged over `T::default_params()` and encoded
    /// into the query string.
    pub fn fetch_one<T: Resource>(
        &self,
        path: &str,
        params: Params,
        show_loading: bool,
    ) -> Result<T, ClientError> {
        let merged = merge_params(T::default_params(), params);
        let object = self.raw_request(
            HttpMethod::Get,
            &resource_path::<T>(path),
            merged,
            show_loading,
            &[],
        )?;
        decode_one(object)
    }

    /// GET a list of `T`, decoded in order from the array under the
    /// response's `"result"` key.
    pub fn fetch_many<T: Resource>(
        &self,
        path: &str,
        params: Params,
        show_loading: bool,
    ) -> Result<Vec<T>, ClientError> {
        let merged = merge_params(T::default_params(), params);
        let object = self.raw_request(
            HttpMethod::Get,
            &resource_path::<T>(path),
            merged,
            show_loading,
            &[],
        )?;
        decode_many(object)
    }

    /// POST the merged params and decode the resulting `T`. Creates when
    /// `path` addresses the collection, updates when it addresses a record.
    pub fn update_one<T: Resource>(
        &self,
        path: &str,
        params: Params,
        show_loading: bool,
    ) -> Result<T, ClientError> {
        let merged = merge_params(T::default_params(), params);
        let object = self.raw_request(
            HttpMethod::Post,
            &resource_path::<T>(path),
            merged,
            show_loading,
            &[],
        )?;
        decode_one(object)
    }

    /// DELETE with the merged params in the query string, decoding the
    /// deleted record as `T`.
    pub fn delete_one<T: Resource>(
        &self,
        path: &str,
        params: Params,
        show_loading: bool,
    ) -> Result<T, ClientError> {
        let merged = merge_params(T::default_params(), params);
        let object = self.raw_request(
            HttpMethod::Delete,
            &resource_path::<T>(path),
            merged,
            show_loading,
            &[],
        )?;
        decode_one(object)
    }

    /// POST with an HTTP Basic `Authorization` header built from the
    /// credentials, decoding the session object as `T`.
    pub fn login_basic<T: Resource>(
        &self,
        path: &str,
        email: &str,
        password: &str,
        params: Params,
        show_loading: bool,
    ) -> Result<T, ClientError> {
        let merged = merge_params(T::default_params(), params);
        let headers = [(
            "Authorization".to_string(),
            basic_auth_header(email, password),
        )];
        let object = self.raw_request(
            HttpMethod::Post,
            &resource_path::<T>(path),
            merged,
            show_loading,
            &headers,
        )?;
        decode_one(object)
    }

    /// POST the merged params and `files` as a multipart/form-data body,
    /// decoding the server's answer as `T`.
    pub fn upload<T: Resource>(
        &self,
        path: &str,
        params: Params,
        files: &[UploadFile],
        show_loading: bool,
    ) -> Result<T, ClientError> {
        self.with_indicator(show_loading, |client| {
            client.upload_inner(path, params, files)
        })
    }

    /// Like [`raw_request`](Self::raw_request), run on a background thread
    /// with the outcome delivered through the callback scheduler.
    pub fn raw_request_background<F>(
        &self,
        method: HttpMethod,
        path: String,
        params: Params,
        show_loading: bool,
        extra_headers: Vec<(String, String)>,
        completion: F,
    ) where
        F: FnOnce(Result<JsonObject, ClientError>) + Send + 'static,
    {
        self.spawn_op(
            show_loading,
            move |client| client.raw_request(method, &path, params, false, &extra_headers),
            completion,
        );
    }

    /// Background variant of [`fetch_one`](Self::fetch_one).
    pub fn fetch_one_background<T, F>(
        &self,
        path: String,
        params: Params,
        show_loading: bool,
        completion: F,
    ) where
        T: Resource + Send + 'static,
        F: FnOnce(Result<T, ClientError>) + Send + 'static,
    {
        self.spawn_op(
            show_loading,
            move |client| client.fetch_one(&path, params, false),
            completion,
        );
    }

    /// Background variant of [`fetch_many`](Self::fetch_many).
    pub fn fetch_many_background<T, F>(
        &self,
        path: String,
        params: Params,
        show_loading: bool,
        completion: F,
    ) where
        T: Resource + Send + 'static,
        F: FnOnce(Result<Vec<T>, ClientError>) + Send + 'static,
    {
        self.spawn_op(
            show_loading,
            move |client| client.fetch_many(&path, params, false),
            completion,
        );
    }

    /// Background variant of [`update_one`](Self::update_one).
    pub fn update_one_background<T, F>(
        &self,
        path: String,
        params: Params,
        show_loading: bool,
        completion: F,
    ) where
        T: Resource + Send + 'static,
        F: FnOnce(Result<T, ClientError>) + Send + 'static,
    {
        self.spawn_op(
            show_loading,
            move |client| client.update_one(&path, params, false),
            completion,
        );
    }

    /// Background variant of [`delete_one`](Self::delete_one).
    pub fn delete_one_background<T, F>(
        &self,
        path: String,
        params: Params,
        show_loading: bool,
        completion: F,
    ) where
        T: Resource + Send + 'static,
        F: FnOnce(Result<T, ClientError>) + Send + 'static,
    {
        self.spawn_op(
            show_loading,
            move |client| client.delete_one(&path, params, false),
            completion,
        );
    }

    /// Background variant of [`login_basic`](Self::login_basic).
    pub fn login_basic_background<T, F>(
        &self,
        path: String,
        email: String,
        password: String,
        params: Params,
        show_loading: bool,
        completion: F,
    ) where
        T: Resource + Send + 'static,
        F: FnOnce(Result<T, ClientError>) + Send + 'static,
    {
        self.spawn_op(
            show_loading,
            move |client| client.login_basic(&path, &email, &password, params, false),
            completion,
        );
    }

    /// Background variant of [`upload`](Self::upload).
    pub fn upload_background<T, F>(
        &self,
        path: String,
        params: Params,
        files: Vec<UploadFile>,
        show_loading: bool,
        completion: F,
    ) where
        T: Resource + Send + 'static,
        F: FnOnce(Result<T, ClientError>) + Send + 'static,
    {
        self.spawn_op(
            show_loading,
            move |client| client.upload(&path, params, &files, false),
            completion,
        );
    }

    /// Run `op` on a detached thread and deliver its outcome through the
    /// scheduler, exactly once. `show` fires on the calling thread before
    /// dispatch; `hide` runs on the scheduler right before the completion,
    /// on success and failure alike.
    fn spawn_op<T, Op, F>(&self, show_loading: bool, op: Op, completion: F)
    where
        T: Send + 'static,
        Op: FnOnce(&RestClient) -> Result<T, ClientError> + Send + 'static,
        F: FnOnce(Result<T, ClientError>) + Send + 'static,
    {
        if show_loading {
            self.indicator.show();
        }
        let client = self.clone();
        thread::spawn(move || {
            let outcome = op(&client);
            let RestClient {
                indicator,
                scheduler,
                ..
            } = client;
            scheduler(Box::new(move || {
                if show_loading {
                    indicator.hide();
                }
                completion(outcome);
            }));
        });
    }

    fn with_indicator<T>(
        &self,
        show_loading: bool,
        op: impl FnOnce(&Self) -> Result<T, ClientError>,
    ) -> Result<T, ClientError> {
        if show_loading {
            self.indicator.show();
        }
        let outcome = op(self);
        if show_loading {
            self.indicator.hide();
        }
        outcome
    }

    fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        params: Params,
        extra_headers: &[(String, String)],
    ) -> Result<JsonObject, ClientError> {
        let request = self.build_request(method, path, params, extra_headers)?;
        debug!(method = request.method.as_str(), url = %request.url, "dispatching request");
        let response = self.transport.execute(&request)?;
        check_status(&response)?;
        parse_object(&response)
    }

    fn build_request(
        &self,
        method: HttpMethod,
        path: &str,
        params: Params,
        extra_headers: &[(String, String)],
    ) -> Result<HttpRequest, ClientError> {
        let mut url = self.request_url(path)?;
        let mut headers = self.merged_headers(extra_headers);

        let body = if method.has_request_body() {
            if !has_header(&headers, "content-type") {
                headers.push(("Content-Type".to_string(), "application/json".to_string()));
            }
            let bytes = serde_json::to_vec(&Value::Object(params))
                .map_err(|e| ClientError::Encode(e.to_string()))?;
            Some(bytes)
        } else {
            encode_query(&mut url, &params);
            None
        };

        Ok(HttpRequest {
            method,
            url: url.into(),
            headers,
            body,
        })
    }

    fn upload_inner<T: Resource>(
        &self,
        path: &str,
        params: Params,
        files: &[UploadFile],
    ) -> Result<T, ClientError> {
        let merged = merge_params(T::default_params(), params);
        let multipart = encode_multipart(&merged, files);
        let url = self.request_url(&resource_path::<T>(path))?;

        let mut headers = self.merged_headers(&[]);
        set_header(
            &mut headers,
            "Content-Type",
            &format!("multipart/form-data; boundary={}", multipart.boundary),
        );

        let request = HttpRequest {
            method: HttpMethod::Post,
            url: url.into(),
            headers,
            body: Some(multipart.bytes),
        };
        debug!(url = %request.url, files = files.len(), "dispatching upload");
        let response = self.transport.execute(&request)?;
        check_status(&response)?;
        decode_one(parse_object(&response)?)
    }

    /// Absolute URL for `path`: the base URL with the path appended as-is.
    fn request_url(&self, path: &str) -> Result<Url, ClientError> {
        let full = format!("{}{path}", self.base_url);
        Url::parse(&full)
            .map_err(|e| ClientError::Config(format!("invalid request URL {full:?}: {e}")))
    }

    fn merged_headers(&self, extra: &[(String, String)]) -> Vec<(String, String)> {
        let mut headers = self.default_headers.clone();
        for (name, value) in extra {
            set_header(&mut headers, name, value);
        }
        headers
    }
}

/// Full request path for `T`: its base path plus the call's suffix.
fn resource_path<T: Resource>(suffix: &str) -> String {
    format!("{}{suffix}", T::base_path())
}

/// `Authorization` value for HTTP Basic credentials.
fn basic_auth_header(email: &str, password: &str) -> String {
    let encoded = STANDARD.encode(format!("{email}:{password}"));
    format!("Basic {encoded}")
}

/// Encode `params` as query pairs on `url`. Array values repeat the key
/// once per element; strings are written bare, other values as JSON text.
fn encode_query(url: &mut Url, params: &Params) {
    if params.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (name, value) in params {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.append_pair(name, &value_text(item));
                }
            }
            other => {
                pairs.append_pair(name, &value_text(other));
            }
        }
    }
}

/// Replace a header in place, matching names case-insensitively.
fn set_header(headers: &mut Vec<(String, String)>, name: &str, value: &str) {
    match headers
        .iter_mut()
        .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
    {
        Some((_, existing_value)) => *existing_value = value.to_string(),
        None => headers.push((name.to_string(), value.to_string())),
    }
}

fn has_header(headers: &[(String, String)], name: &str) -> bool {
    headers
        .iter()
        .any(|(existing, _)| existing.eq_ignore_ascii_case(name))
}

/// Map a non-2xx response to `ClientError::HttpStatus`.
fn check_status(response: &HttpResponse) -> Result<(), ClientError> {
    if response.is_success() {
        return Ok(());
    }
    warn!(status = response.status, "request failed");
    Err(ClientError::HttpStatus {
        status: response.status,
        body: String::from_utf8_lossy(&response.body).into_owned(),
    })
}

/// Parse the response body as a JSON object.
fn parse_object(response: &HttpResponse) -> Result<JsonObject, ClientError> {
    let value: Value =
        serde_json::from_slice(&response.body).map_err(|e| ClientError::Decode(e.to_string()))?;
    match value {
        Value::Object(object) => Ok(object),
        _ => {
            warn!("response root is not a JSON object");
            Err(ClientError::Decode(
                "response root is not a JSON object".to_string(),
            ))
        }
    }
}
