//! The request pipeline.
//!
//! # Responsibilities
//! - Inject `Authorization`, tenant and request-id headers at build time
//! - Unwrap the business envelope into plain data, or classify the failure
//! - Retry transient failures within the configured budget
//! - Route 401s through the debounced unauthorized handler
//! - Raise success / error notifications per call options
//!
//! # Per-call State Machine
//! ```text
//! Pending ──▶ Success
//!    │  ├───▶ BusinessError
//!    │  ├───▶ Unauthorized
//!    │  └───▶ TransportError ──(transient, budget left)──▶ Pending
//!    └──(cancel)──▶ Cancelled
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::{ClientConfig, EnvelopeConfig};
use crate::http::cancel::PendingRequests;
use crate::http::error::{HttpError, HttpResult, TransportKind};
use crate::http::request::{
    resolve_url, Payload, RequestDescriptor, RequestOptions, UploadForm, X_REQUEST_ID,
};
use crate::http::response::{DownloadResponse, Envelope, RawResponse};
use crate::http::unauthorized::{UnauthorizedGuard, UnauthorizedHandler};
use crate::observability::metrics;
use crate::resilience::{RetryPolicy, Sleeper, TokioSleeper};
use crate::session::i18n::{
    DECODE_ERROR, NETWORK_ERROR, REQUEST_CONFIG_ERROR, REQUEST_FAILED, REQUEST_TIMEOUT,
    UNAUTHORIZED,
};
use crate::session::{
    DefaultTranslator, MemorySession, Notifier, SessionStore, TracingNotifier, Translator,
};

/// Decides whether an envelope reports business success.
pub type SuccessPredicate = Arc<dyn Fn(&Envelope) -> bool + Send + Sync>;

struct Inner {
    client: reqwest::Client,
    base_url: String,
    envelope: EnvelopeConfig,
    success: Option<SuccessPredicate>,
    tenant_header: HeaderName,
    retry: RetryPolicy,
    unauthorized: UnauthorizedHandler,
    session: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    translator: Arc<dyn Translator>,
    sleeper: Arc<dyn Sleeper>,
    pending: PendingRequests,
}

/// Builder wiring configuration and collaborators into an [`HttpClient`].
pub struct HttpClientBuilder {
    config: ClientConfig,
    session: Option<Arc<dyn SessionStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    translator: Option<Arc<dyn Translator>>,
    sleeper: Option<Arc<dyn Sleeper>>,
    success: Option<SuccessPredicate>,
}

impl HttpClientBuilder {
    pub fn session(mut self, session: Arc<dyn SessionStore>) -> Self {
        self.session = Some(session);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = Some(sleeper);
        self
    }

    /// Replace the default `code == success_code` check.
    pub fn success_predicate(
        mut self,
        predicate: impl Fn(&Envelope) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.success = Some(Arc::new(predicate));
        self
    }

    pub fn build(self) -> HttpResult<HttpClient> {
        let config = self.config;

        url::Url::parse(&config.endpoint.base_url).map_err(|e| {
            HttpError::Config(format!("invalid base URL '{}': {e}", config.endpoint.base_url))
        })?;
        let tenant_header =
            HeaderName::from_bytes(config.tenant.header.as_bytes()).map_err(|e| {
                HttpError::Config(format!("invalid tenant header '{}': {e}", config.tenant.header))
            })?;

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeouts.request_ms))
            .connect_timeout(Duration::from_millis(config.timeouts.connect_ms))
            .user_agent(config.endpoint.user_agent.clone());
        if config.endpoint.with_credentials {
            builder = builder.cookie_store(true);
        }
        let client = builder.build().map_err(|e| HttpError::Config(e.to_string()))?;

        let session = self
            .session
            .unwrap_or_else(|| Arc::new(MemorySession::default()));
        let notifier = self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier));
        let translator = self
            .translator
            .unwrap_or_else(|| Arc::new(DefaultTranslator::new()));
        let sleeper = self.sleeper.unwrap_or_else(|| Arc::new(TokioSleeper));

        let unauthorized = UnauthorizedHandler::new(
            Duration::from_millis(config.unauthorized.debounce_ms),
            Duration::from_millis(config.unauthorized.logout_delay_ms),
            Arc::clone(&session),
            Arc::clone(&notifier),
            Arc::clone(&sleeper),
        );

        tracing::debug!(
            base_url = %config.endpoint.base_url,
            max_retries = config.retries.max_retries,
            request_timeout_ms = config.timeouts.request_ms,
            "HTTP client initialized"
        );

        Ok(HttpClient {
            inner: Arc::new(Inner {
                client,
                base_url: config.endpoint.base_url,
                envelope: config.envelope,
                success: self.success,
                tenant_header,
                retry: RetryPolicy::from_config(&config.retries),
                unauthorized,
                session,
                notifier,
                translator,
                sleeper,
                pending: PendingRequests::new(),
            }),
        })
    }
}

/// Shared HTTP client for the console API. Cheap to clone.
#[derive(Clone)]
pub struct HttpClient {
    inner: Arc<Inner>,
}

impl HttpClient {
    pub fn builder(config: ClientConfig) -> HttpClientBuilder {
        HttpClientBuilder {
            config,
            session: None,
            notifier: None,
            translator: None,
            sleeper: None,
            success: None,
        }
    }

    /// Client with default collaborators.
    pub fn new(config: ClientConfig) -> HttpResult<Self> {
        Self::builder(config).build()
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn session(&self) -> &Arc<dyn SessionStore> {
        &self.inner.session
    }

    /// In-flight calls, for bulk or per-URL cancellation.
    pub fn pending(&self) -> &PendingRequests {
        &self.inner.pending
    }

    pub fn unauthorized_guard(&self) -> &UnauthorizedGuard {
        self.inner.unauthorized.guard()
    }

    pub async fn get<T, P>(&self, url: &str, params: &P, options: RequestOptions) -> HttpResult<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.call(Method::GET, url, params, options).await
    }

    pub async fn post<T, P>(&self, url: &str, params: &P, options: RequestOptions) -> HttpResult<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.call(Method::POST, url, params, options).await
    }

    pub async fn put<T, P>(&self, url: &str, params: &P, options: RequestOptions) -> HttpResult<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.call(Method::PUT, url, params, options).await
    }

    pub async fn patch<T, P>(&self, url: &str, params: &P, options: RequestOptions) -> HttpResult<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.call(Method::PATCH, url, params, options).await
    }

    pub async fn delete<T, P>(
        &self,
        url: &str,
        params: &P,
        options: RequestOptions,
    ) -> HttpResult<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        self.call(Method::DELETE, url, params, options).await
    }

    /// POST a multipart form and unwrap the envelope.
    pub async fn upload<T>(
        &self,
        url: &str,
        form: UploadForm,
        options: RequestOptions,
    ) -> HttpResult<T>
    where
        T: DeserializeOwned,
    {
        let descriptor = RequestDescriptor::new(Method::POST, url)
            .payload(Payload::Multipart(form))
            .options(options);
        self.request(descriptor).await
    }

    /// GET a binary body. The body is returned as-is; only an error envelope
    /// sent in place of the file is interpreted.
    pub async fn download<P>(
        &self,
        url: &str,
        params: &P,
        options: RequestOptions,
    ) -> HttpResult<DownloadResponse>
    where
        P: Serialize + ?Sized,
    {
        let start = Instant::now();
        let show_error = options.show_error_message;
        let descriptor = match RequestDescriptor::with_params(Method::GET, url, params, options) {
            Ok(d) => d,
            Err(err) => return Err(self.report(err, show_error)),
        };

        let result = match self.request_native(&descriptor).await {
            Ok(raw) => self.check_download(raw, &descriptor.options),
            Err(err) => Err(err),
        };

        match result {
            Ok(download) => {
                metrics::record_request("GET", "success", start);
                tracing::debug!(
                    url = %descriptor.url,
                    bytes = download.body.len(),
                    file_name = ?download.file_name,
                    "Download complete"
                );
                Ok(download)
            }
            Err(err) => {
                metrics::record_request("GET", err.kind_label(), start);
                self.log_failure(&descriptor, &err);
                Err(self.report(err, show_error))
            }
        }
    }

    /// Run a call through the full pipeline and return the unwrapped data.
    pub async fn request<T>(&self, descriptor: RequestDescriptor) -> HttpResult<T>
    where
        T: DeserializeOwned,
    {
        let start = Instant::now();
        let pending = self.inner.pending.register(
            &descriptor.method,
            &descriptor.url,
            descriptor.options.cancel.as_ref(),
        );
        let result = self.run_with_retries::<T>(&descriptor, pending.token()).await;
        drop(pending);

        match result {
            Ok(envelope) => {
                metrics::record_request(descriptor.method.as_str(), "success", start);
                if descriptor.options.show_success_message && !envelope.msg.is_empty() {
                    self.inner.notifier.show_success(&envelope.msg);
                }
                Ok(envelope.data)
            }
            Err(err) => {
                metrics::record_request(descriptor.method.as_str(), err.kind_label(), start);
                self.log_failure(&descriptor, &err);
                Err(self.report(err, descriptor.options.show_error_message))
            }
        }
    }

    /// Send once with headers injected and 401 handling applied, but no
    /// envelope interpretation, no retry and no notifications.
    pub async fn request_native(&self, descriptor: &RequestDescriptor) -> HttpResult<RawResponse> {
        let pending = self.inner.pending.register(
            &descriptor.method,
            &descriptor.url,
            descriptor.options.cancel.as_ref(),
        );
        self.send(descriptor, pending.token()).await
    }

    async fn call<T, P>(
        &self,
        method: Method,
        url: &str,
        params: &P,
        options: RequestOptions,
    ) -> HttpResult<T>
    where
        T: DeserializeOwned,
        P: Serialize + ?Sized,
    {
        let show_error = options.show_error_message;
        match RequestDescriptor::with_params(method, url, params, options) {
            Ok(descriptor) => self.request(descriptor).await,
            Err(err) => Err(self.report(err, show_error)),
        }
    }

    async fn run_with_retries<T>(
        &self,
        descriptor: &RequestDescriptor,
        token: &CancellationToken,
    ) -> HttpResult<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        let mut retries = 0;
        loop {
            if token.is_cancelled() {
                return Err(HttpError::Cancelled);
            }

            let err = match self.attempt::<T>(descriptor, token).await {
                Ok(envelope) => return Ok(envelope),
                Err(err) => err,
            };

            if !self.inner.retry.should_retry(&descriptor.method, &err, retries) {
                return Err(err);
            }

            retries += 1;
            let delay = self.inner.retry.delay_for(retries);
            tracing::info!(
                method = %descriptor.method,
                url = %descriptor.url,
                retry = retries,
                max_retries = self.inner.retry.max_retries(),
                delay = ?delay,
                error = %err,
                "Retrying request"
            );
            metrics::record_retry(descriptor.method.as_str());

            tokio::select! {
                biased;
                () = token.cancelled() => return Err(HttpError::Cancelled),
                () = self.inner.sleeper.sleep(delay) => {}
            }
        }
    }

    async fn attempt<T>(
        &self,
        descriptor: &RequestDescriptor,
        token: &CancellationToken,
    ) -> HttpResult<Envelope<T>>
    where
        T: DeserializeOwned,
    {
        let raw = self.send(descriptor, token).await?;
        let Envelope {
            code,
            msg,
            success,
            timestamp,
            data,
        } = self.check_envelope(raw, &descriptor.options)?;

        let data = serde_json::from_value::<T>(data).map_err(|e| HttpError::Decode(e.to_string()))?;
        Ok(Envelope {
            code,
            msg,
            success,
            timestamp,
            data,
        })
    }

    async fn send(
        &self,
        descriptor: &RequestDescriptor,
        token: &CancellationToken,
    ) -> HttpResult<RawResponse> {
        if token.is_cancelled() {
            return Err(HttpError::Cancelled);
        }

        let request_id = Uuid::new_v4().to_string();
        let builder = self.build_request(descriptor, &request_id)?;

        tracing::debug!(
            request_id = %request_id,
            method = %descriptor.method,
            url = %descriptor.url,
            "Sending request"
        );

        let response = tokio::select! {
            biased;
            () = token.cancelled() => return Err(HttpError::Cancelled),
            res = builder.send() => res.map_err(HttpError::from_reqwest)?,
        };

        let status = response.status();
        let headers = response.headers().clone();
        let body = tokio::select! {
            biased;
            () = token.cancelled() => return Err(HttpError::Cancelled),
            res = response.bytes() => res.map_err(HttpError::from_reqwest)?,
        };

        tracing::debug!(
            request_id = %request_id,
            status = status.as_u16(),
            bytes = body.len(),
            "Response received"
        );

        let raw = RawResponse { status, headers, body };
        if status == StatusCode::UNAUTHORIZED {
            let message = raw
                .envelope()
                .map(|e| e.msg)
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| self.translate(UNAUTHORIZED));
            return Err(self.unauthorized(message, &descriptor.options));
        }

        Ok(raw)
    }

    fn build_request(
        &self,
        descriptor: &RequestDescriptor,
        request_id: &str,
    ) -> HttpResult<reqwest::RequestBuilder> {
        let url = resolve_url(&self.inner.base_url, &descriptor.url)?;

        let mut headers = HeaderMap::new();
        headers.insert(X_REQUEST_ID, header_value(request_id)?);

        if let Some(token) = self.inner.session.access_token().filter(|t| !t.is_empty()) {
            let value = if token.starts_with("Bearer ") {
                token
            } else {
                format!("Bearer {token}")
            };
            headers.insert(AUTHORIZATION, header_value(&value)?);
        }

        if self.inner.session.tenant_enabled() {
            if let Some(tenant_id) = self.inner.session.tenant_id().filter(|t| !t.is_empty()) {
                headers.insert(self.inner.tenant_header.clone(), header_value(&tenant_id)?);
            }
        }

        for (name, value) in &descriptor.options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| HttpError::Config(format!("invalid header name '{name}': {e}")))?;
            headers.insert(name, header_value(value)?);
        }

        let mut builder = self
            .inner
            .client
            .request(descriptor.method.clone(), url)
            .headers(headers);

        if !descriptor.query.is_empty() {
            builder = builder.query(&descriptor.query);
        }

        builder = match &descriptor.payload {
            Payload::Empty => builder,
            Payload::Json(body) => builder.json(body),
            Payload::Multipart(form) => builder.multipart(form.to_multipart()?),
        };

        if let Some(timeout) = descriptor.options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(builder)
    }

    fn check_envelope(
        &self,
        raw: RawResponse,
        options: &RequestOptions,
    ) -> HttpResult<Envelope<Value>> {
        let Some(envelope) = raw.envelope() else {
            if raw.status.is_success() {
                return Err(HttpError::Decode("response body is not an envelope".to_string()));
            }
            return Err(self.status_error(raw.status));
        };

        if !self.is_success(&envelope) {
            return Err(self.envelope_failure(envelope, raw.status, options));
        }
        if !raw.status.is_success() {
            return Err(self.status_error(raw.status));
        }
        Ok(envelope)
    }

    fn check_download(
        &self,
        raw: RawResponse,
        options: &RequestOptions,
    ) -> HttpResult<DownloadResponse> {
        if raw.is_json() {
            if let Some(envelope) = raw.envelope() {
                if !self.is_success(&envelope) {
                    return Err(self.envelope_failure(envelope, raw.status, options));
                }
            }
        }
        if !raw.status.is_success() {
            return Err(self.status_error(raw.status));
        }
        Ok(DownloadResponse::from(raw))
    }

    fn is_success(&self, envelope: &Envelope) -> bool {
        match &self.inner.success {
            Some(predicate) => predicate(envelope),
            None => envelope.code == self.inner.envelope.success_code,
        }
    }

    fn envelope_failure(
        &self,
        envelope: Envelope,
        status: StatusCode,
        options: &RequestOptions,
    ) -> HttpError {
        let message = if envelope.msg.is_empty() {
            self.translate(REQUEST_FAILED)
        } else {
            envelope.msg
        };

        let unauthorized_code = &self.inner.envelope.unauthorized_code;
        if !unauthorized_code.is_empty() && &envelope.code == unauthorized_code {
            return self.unauthorized(message, options);
        }

        HttpError::Business {
            code: envelope.code,
            message,
            status: status.as_u16(),
        }
    }

    fn status_error(&self, status: StatusCode) -> HttpError {
        HttpError::Transport {
            kind: TransportKind::Status,
            status: Some(status.as_u16()),
            message: format!("{}: HTTP {}", self.translate(REQUEST_FAILED), status),
        }
    }

    fn unauthorized(&self, message: String, options: &RequestOptions) -> HttpError {
        if options.skip_unauthorized_handler {
            tracing::debug!("Unauthorized response, handler skipped for this call");
        } else {
            self.inner.unauthorized.handle(&message);
        }
        HttpError::Unauthorized { message }
    }

    /// Raise the error notification, if this error kind gets one.
    fn report(&self, err: HttpError, show_error: bool) -> HttpError {
        let notify =
            show_error && !matches!(err, HttpError::Unauthorized { .. } | HttpError::Cancelled);
        if notify {
            self.inner.notifier.show_error(&self.user_message(&err));
        }
        err
    }

    fn log_failure(&self, descriptor: &RequestDescriptor, err: &HttpError) {
        if err.is_cancelled() {
            tracing::debug!(
                method = %descriptor.method,
                url = %descriptor.url,
                "Request cancelled"
            );
        } else {
            tracing::warn!(
                method = %descriptor.method,
                url = %descriptor.url,
                kind = err.kind_label(),
                code = ?err.code(),
                status = ?err.status(),
                error = %err,
                "Request failed"
            );
        }
    }

    fn user_message(&self, err: &HttpError) -> String {
        match err {
            HttpError::Business { message, .. } | HttpError::Unauthorized { message } => {
                message.clone()
            }
            HttpError::Transport {
                kind: TransportKind::Timeout,
                ..
            } => self.translate(REQUEST_TIMEOUT),
            HttpError::Transport {
                kind: TransportKind::Connect,
                ..
            } => self.translate(NETWORK_ERROR),
            HttpError::Transport { message, .. } => message.clone(),
            HttpError::Config(_) => self.translate(REQUEST_CONFIG_ERROR),
            HttpError::Decode(_) => self.translate(DECODE_ERROR),
            HttpError::Cancelled => err.to_string(),
        }
    }

    fn translate(&self, key: &str) -> String {
        self.inner.translator.translate(key)
    }
}

fn header_value(value: &str) -> HttpResult<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|e| HttpError::Config(format!("invalid header value: {e}")))
}
