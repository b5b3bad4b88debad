//! Authenticated request pipeline.
//!
//! Every backend call goes through [`ApiClient`]: it attaches the stored
//! credential as a bearer header when one exists, classifies failures into
//! [`ApiErrorKind`], and reacts to a rejected credential by ending the
//! session and emitting [`SessionEnded`] once. The error is still returned
//! so call sites can recognize it and skip their own banner.
//!
//! Nothing here retries; a retry is always an explicit caller action.

mod auth;
mod community;
mod drones;
mod error;

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Method;
use reqwest::multipart::Form;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use error::{ApiError, ApiErrorKind, ApiResult};

use crate::config::Config;
use crate::models::list_from_value;
use crate::session::{EndReason, SessionEnded, SessionEvents, SessionStore};

/// User-Agent header sent on every request.
pub const USER_AGENT: &str = concat!("hangar/", env!("CARGO_PKG_VERSION"));

/// What a request carries.
enum Payload {
    Empty,
    Json(Value),
    Form(Form),
}

/// A received success response.
struct Reply {
    status: u16,
    body: String,
}

impl Reply {
    fn value(&self) -> Option<Value> {
        if self.body.trim().is_empty() {
            return None;
        }
        serde_json::from_str(&self.body).ok()
    }

    fn decode<T: DeserializeOwned>(&self) -> ApiResult<T> {
        serde_json::from_str(&self.body).map_err(|e| ApiError::malformed(self.status, e))
    }
}

/// Client for the drone-fleet backend.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    timeout: Duration,
    session: SessionStore,
    events: SessionEvents,
}

impl ApiClient {
    /// Builds a client from configuration.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot
    /// be built.
    pub fn from_config(config: &Config, session: SessionStore, events: SessionEvents) -> Result<Self> {
        Self::new(config.base_url()?, config.request_timeout(), session, events)
    }

    /// Builds a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        session: SessionStore,
        events: SessionEvents,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
            session,
            events,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn events(&self) -> &SessionEvents {
        &self.events
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, method: Method, path: &str, payload: Payload) -> ApiResult<Reply> {
        let token = self.session.get_session();

        let mut request = self.http.request(method.clone(), self.url(path));
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        request = match payload {
            Payload::Empty => request,
            Payload::Json(body) => request.json(&body),
            Payload::Form(form) => request.multipart(form),
        };

        tracing::debug!(%method, path, authenticated = token.is_some(), "sending request");

        let response = request
            .send()
            .await
            .map_err(|e| error::classify_reqwest_error(&e, self.timeout))?;
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| error::classify_reqwest_error(&e, self.timeout))?;

        if (200..300).contains(&status) {
            return Ok(Reply { status, body });
        }

        let err = ApiError::http_status(status, &body);
        tracing::debug!(%method, path, status, kind = %err.kind, "request failed");
        if err.is_unauthorized() {
            self.end_rejected_session(token.as_deref());
        }
        Err(err)
    }

    /// Ends the session the rejected request was sent with.
    ///
    /// Only the call that actually removes the credential emits, so a burst
    /// of concurrent 401s produces one clear and one event.
    fn end_rejected_session(&self, token: Option<&str>) {
        let Some(token) = token else {
            return;
        };

        let ended = match self.session.end_if_current(token) {
            Ok(ended) => ended,
            Err(e) => {
                // The in-memory credential is gone even if persisting failed.
                tracing::warn!(error = %e, "failed to persist session end");
                true
            }
        };

        if ended {
            self.events.emit(SessionEnded {
                reason: EndReason::Unauthorized,
            });
        }
    }

    fn encode<B: Serialize>(body: &B) -> ApiResult<Value> {
        serde_json::to_value(body)
            .map_err(|e| ApiError::validation(format!("Failed to encode request: {e}")))
    }

    /// `GET` a single JSON entity.
    ///
    /// # Errors
    /// Returns the classified failure; an undecodable body is a server error.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.send(Method::GET, path, Payload::Empty).await?.decode()
    }

    /// `GET` a JSON array. A missing or non-array body is an empty list, and
    /// items that fail to decode are skipped.
    ///
    /// # Errors
    /// Returns the classified failure.
    pub async fn get_list<T: DeserializeOwned>(&self, path: &str) -> ApiResult<Vec<T>> {
        let reply = self.send(Method::GET, path, Payload::Empty).await?;
        Ok(list_from_value(reply.value()))
    }

    /// `POST` a JSON body and decode the returned entity.
    ///
    /// # Errors
    /// Returns the classified failure.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let body = Self::encode(body)?;
        self.send(Method::POST, path, Payload::Json(body)).await?.decode()
    }

    /// `PUT` a JSON body and decode the returned entity.
    ///
    /// # Errors
    /// Returns the classified failure.
    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let body = Self::encode(body)?;
        self.send(Method::PUT, path, Payload::Json(body)).await?.decode()
    }

    /// `PATCH` a JSON body and decode the returned entity.
    ///
    /// # Errors
    /// Returns the classified failure.
    pub async fn patch_json<B, T>(&self, path: &str, body: &B) -> ApiResult<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let body = Self::encode(body)?;
        self.send(Method::PATCH, path, Payload::Json(body)).await?.decode()
    }

    /// `POST` a multipart form and decode the returned entity.
    ///
    /// # Errors
    /// Returns the classified failure.
    pub async fn post_form<T: DeserializeOwned>(&self, path: &str, form: Form) -> ApiResult<T> {
        self.send(Method::POST, path, Payload::Form(form)).await?.decode()
    }

    /// `DELETE` a resource; any response body is ignored.
    ///
    /// # Errors
    /// Returns the classified failure.
    pub async fn delete(&self, path: &str) -> ApiResult<()> {
        self.send(Method::DELETE, path, Payload::Empty).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> ApiClient {
        ApiClient::new(
            base,
            Duration::from_secs(1),
            SessionStore::in_memory(),
            SessionEvents::new(),
        )
        .unwrap()
    }

    #[test]
    fn url_joins_without_double_slash() {
        let api = client("http://localhost:8000/");
        assert_eq!(api.url("/drones"), "http://localhost:8000/drones");
        assert_eq!(api.url("drones/3"), "http://localhost:8000/drones/3");
    }

    #[test]
    fn rejection_without_token_is_ignored() {
        let api = client("http://localhost:8000");
        let mut watch = api.events().subscribe();

        api.end_rejected_session(None);
        assert_eq!(watch.try_next(), None);
    }

    #[test]
    fn rejection_of_stale_token_keeps_new_session() {
        let api = client("http://localhost:8000");
        let mut watch = api.events().subscribe();
        api.session().set_session("fresh").unwrap();

        api.end_rejected_session(Some("stale"));

        assert!(api.session().is_authenticated());
        assert_eq!(watch.try_next(), None);
    }

    #[test]
    fn empty_reply_is_no_value() {
        let reply = Reply {
            status: 200,
            body: "  ".to_string(),
        };
        assert_eq!(reply.value(), None);
        assert!(reply.decode::<Value>().is_err());
    }
}
