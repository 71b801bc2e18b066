//! Backend client: the session-establishment relay and the record store.
//!
//! The sign-in relay answers with a `session` cookie; later record calls send
//! it back in a `Cookie` header. The cookie value is a secret and never logged.

use crate::mockmate::{
    auth::{
        exchange::SessionRelay,
        types::{AppSession, RelayOutcome, SignInRequest, SignUpRequest},
    },
    client::{
        build_url_with_base, handle_json_response, handle_optional_json_response,
        map_request_error, sanitize_body, AppError,
    },
    records::{InterviewRecord, ProfileUpdate, RecordStore, User},
};
use async_trait::async_trait;
use reqwest::{
    header::{COOKIE, SET_COOKIE},
    Client, RequestBuilder, Response,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, instrument};

pub const SESSION_COOKIE: &str = "session";

#[derive(Deserialize)]
struct RelayErrorBody {
    message: String,
}

/// Relay failures carry the backend's `message` field; any other body is
/// replaced by a status line so markup never reaches the user.
async fn relay_error(response: Response) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<RelayErrorBody>(&body)
        .ok()
        .map(|body| body.message)
        .filter(|message| !message.trim().is_empty())
        .map(|message| sanitize_body(&message))
        .unwrap_or_else(|| format!("Request failed with status {status}"));

    AppError::Http { status, message }
}

/// Extracts the session cookie value from a response's `Set-Cookie` headers.
fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            let pair = cookie.split(';').next()?.trim();
            let (name, value) = pair.split_once('=')?;
            (name.trim() == SESSION_COOKIE && !value.is_empty()).then(|| value.to_string())
        })
}

#[derive(Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    session: Option<SecretString>,
}

impl BackendClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            session: None,
        }
    }

    /// Attaches a stored session for record store calls.
    #[must_use]
    pub fn with_session(mut self, session: &AppSession) -> Self {
        self.session = Some(session.value.clone());
        self
    }

    fn url(&self, path: &str) -> String {
        build_url_with_base(&self.base_url, path)
    }

    fn with_cookie(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.session {
            Some(session) => builder.header(
                COOKIE,
                format!("{SESSION_COOKIE}={}", session.expose_secret()),
            ),
            None => builder,
        }
    }

    async fn send(builder: RequestBuilder) -> Result<Response, AppError> {
        builder.send().await.map_err(map_request_error)
    }
}

#[async_trait]
impl SessionRelay for BackendClient {
    #[instrument(skip_all)]
    async fn sign_up(&self, request: &SignUpRequest) -> Result<RelayOutcome, AppError> {
        let response = Self::send(self.http.post(self.url("/api/auth/sign-up")).json(request)).await?;
        if !response.status().is_success() {
            return Err(relay_error(response).await);
        }
        handle_json_response(response).await
    }

    #[instrument(skip_all)]
    async fn sign_in(&self, request: SignInRequest) -> Result<AppSession, AppError> {
        let response = Self::send(self.http.post(self.url("/api/auth/sign-in")).json(&request)).await?;
        if !response.status().is_success() {
            return Err(relay_error(response).await);
        }

        let value = session_cookie(&response)
            .ok_or_else(|| AppError::Parse("Sign-in response carried no session".to_string()))?;
        debug!("backend session established");

        Ok(AppSession::new(value, request.email))
    }
}

#[async_trait]
impl RecordStore for BackendClient {
    #[instrument(skip(self))]
    async fn current_user(&self) -> Result<Option<User>, AppError> {
        if self.session.is_none() {
            return Ok(None);
        }
        let response = Self::send(self.with_cookie(self.http.get(self.url("/api/users/me")))).await?;
        handle_optional_json_response(response).await
    }

    #[instrument(skip(self))]
    async fn interviews_by_user(&self, user_id: &str) -> Result<Vec<InterviewRecord>, AppError> {
        let path = format!("/api/users/{}/interviews", urlencoding::encode(user_id));
        let response = Self::send(self.with_cookie(self.http.get(self.url(&path)))).await?;
        handle_json_response(response).await
    }

    #[instrument(skip(self))]
    async fn latest_interviews(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<InterviewRecord>, AppError> {
        let limit = limit.to_string();
        let builder = self
            .http
            .get(self.url("/api/interviews/latest"))
            .query(&[("userId", user_id), ("limit", limit.as_str())]);
        let response = Self::send(self.with_cookie(builder)).await?;
        handle_json_response(response).await
    }

    #[instrument(skip(self, update))]
    async fn update_profile(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<User, AppError> {
        let path = format!("/api/users/{}", urlencoding::encode(user_id));
        let builder = self.http.patch(self.url(&path)).json(update);
        let response = Self::send(self.with_cookie(builder)).await?;
        handle_json_response(response).await
    }
}
