use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{ACCEPT, COOKIE, IF_MATCH};
use reqwest::multipart::Form;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tuition_auth::session::Session;
use url::Url;

use crate::app_ctx::AppContext;
use crate::blueprint::Blueprint;
use crate::http::envelope;
use crate::http::error::{server_message, ApiError};
use crate::http::response::Response;
use crate::runtime::TargetRuntime;

const CONFLICT_MESSAGE: &str = "This record was modified by someone else, reload it and try again";

enum Payload {
    Json(serde_json::Value),
    Multipart(Form),
}

/// One call against the API, relative to the configured base URL.
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Payload>,
    if_match: Option<String>,
    cancel: Option<CancellationToken>,
}

impl ApiRequest {
    pub fn new<P: Into<String>>(method: Method, path: P) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            if_match: None,
            cancel: None,
        }
    }

    pub fn get<P: Into<String>>(path: P) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post<P: Into<String>>(path: P) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put<P: Into<String>>(path: P) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete<P: Into<String>>(path: P) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn query<I, K, V>(mut self, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(Payload::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    pub fn multipart(mut self, form: Form) -> Self {
        self.body = Some(Payload::Multipart(form));
        self
    }

    pub fn if_match(mut self, etag: Option<String>) -> Self {
        self.if_match = etag;
        self
    }

    pub fn cancel(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Thin wrapper over the runtime's [`crate::HttpIO`]: attaches the session
/// cookies and the CSRF header, and turns status codes into [`ApiError`]s.
/// A 401 logs the session out unless the session says otherwise.
#[derive(Clone)]
pub struct ApiClient {
    runtime: TargetRuntime,
    base_url: Url,
    timeout: Duration,
    session: Arc<Session>,
    // only used to assemble requests, execution goes through the runtime
    builder: reqwest::Client,
}

impl ApiClient {
    pub fn new(runtime: TargetRuntime, blueprint: &Blueprint, session: Arc<Session>) -> Self {
        Self {
            runtime,
            base_url: blueprint.api.base_url.clone(),
            timeout: blueprint.api.timeout,
            session,
            builder: reqwest::Client::new(),
        }
    }

    pub fn from_context(app_ctx: &AppContext, session: Arc<Session>) -> Self {
        Self::new(app_ctx.runtime.clone(), &app_ctx.blueprint, session)
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn url(&self, path: &str) -> Result<Url, ApiError> {
        let raw = format!("{}{}", self.base_url.as_str().trim_end_matches('/'), path);
        Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))
    }

    fn build(&self, req: ApiRequest) -> Result<reqwest::Request, ApiError> {
        let url = self.url(&req.path)?;
        let mut builder = self
            .builder
            .request(req.method, url)
            .timeout(self.timeout)
            .header(ACCEPT, "application/json");

        if !req.query.is_empty() {
            builder = builder.query(&req.query);
        }
        if let Some(cookies) = self.session.jar().header_value() {
            builder = builder.header(COOKIE, cookies);
        }
        if let Some((name, token)) = self.session.csrf_header(&req.path) {
            builder = builder.header(name, token);
        }
        if let Some(etag) = req.if_match {
            builder = builder.header(IF_MATCH, etag);
        }
        builder = match req.body {
            Some(Payload::Json(body)) => builder.json(&body),
            Some(Payload::Multipart(form)) => builder.multipart(form),
            None => builder,
        };

        Ok(builder.build()?)
    }

    pub async fn send(&self, req: ApiRequest) -> Result<Response<Bytes>, ApiError> {
        let path = req.path.clone();
        let cancel = req.cancel.clone();
        if cancel.as_ref().is_some_and(|token| token.is_cancelled()) {
            return Err(ApiError::Cancelled);
        }

        let request = self.build(req)?;
        let method = request.method().clone();
        log::info!("{} {}", method, request.url());
        log::debug!("request: {:?}", request);

        let execution = self.runtime.http.execute(request);
        let response = match cancel {
            Some(token) => tokio::select! {
                biased;
                _ = token.cancelled() => {
                    log::info!("{} {} cancelled", method, path);
                    return Err(ApiError::Cancelled);
                }
                response = execution => response,
            },
            None => execution.await,
        }
        .map_err(ApiError::transport)?;

        self.session.jar().absorb(&response.headers);
        log::debug!("{} {} -> {}", method, path, response.status);

        match response.status {
            status if status.is_success() => Ok(response),
            StatusCode::UNAUTHORIZED => {
                let redirect = self.session.handle_unauthorized(&path);
                Err(ApiError::Unauthorized {
                    redirect,
                    message: server_message(&response.body),
                })
            }
            StatusCode::PRECONDITION_FAILED => {
                log::warn!("{} {} rejected, stale version", method, path);
                Err(ApiError::Conflict(
                    server_message(&response.body)
                        .unwrap_or_else(|| CONFLICT_MESSAGE.to_string()),
                ))
            }
            status => Err(ApiError::Server {
                status,
                message: server_message(&response.body),
            }),
        }
    }

    /// Sends the request and decodes the payload out of its envelope.
    pub async fn fetch<T: DeserializeOwned>(&self, req: ApiRequest) -> Result<T, ApiError> {
        let response = self.send(req).await?;
        envelope::unwrap(&response.body)
    }

    /// Like [`ApiClient::fetch`], also returning the entity's `ETag`.
    pub async fn fetch_versioned<T: DeserializeOwned>(
        &self,
        req: ApiRequest,
    ) -> Result<(T, Option<String>), ApiError> {
        let response = self.send(req).await?;
        let etag = response.etag();
        Ok((envelope::unwrap(&response.body)?, etag))
    }

    /// Sends the request, ignoring the payload of a successful response.
    pub async fn execute(&self, req: ApiRequest) -> Result<(), ApiError> {
        let response = self.send(req).await?;
        envelope::acknowledge(&response.body)
    }
}
