//! Device Authorization Grant (RFC 8628) used for federated consent.
//!
//! Flow:
//! 1. Request a device code from the provider
//! 2. Show the verification URL and user code (and try to open a browser)
//! 3. Poll the token endpoint until the user approves, denies, or the code expires
//!
//! The provider's `id_token` is returned as a secret and handed to the identity
//! provider's IdP exchange.

use crate::mockmate::{
    auth::AuthError,
    client::{map_request_error, normalize_base_url},
};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::{sync::Arc, time::Duration};
use tokio::time::{sleep, Instant};
use tracing::{debug, info, instrument};

pub const DEFAULT_DEVICE_URL: &str = "https://oauth2.googleapis.com/device/code";
pub const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEVICE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";
const SCOPE: &str = "openid email profile";
/// Added to the poll interval when the server answers `slow_down`.
const SLOW_DOWN_STEP: Duration = Duration::from_secs(5);

/// Presents the verification step to the user.
pub trait ConsentPrompt: Send + Sync {
    fn show(&self, verification_uri: &str, user_code: &str);
}

#[derive(Debug, Deserialize)]
pub struct DeviceCodeResponse {
    pub device_code: String,
    pub user_code: String,
    #[serde(alias = "verification_url")]
    pub verification_uri: String,
    pub expires_in: u64,
    #[serde(default = "default_interval")]
    pub interval: u64,
}

const fn default_interval() -> u64 {
    5
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// What a single poll of the token endpoint means for the loop.
#[derive(Debug, PartialEq, Eq)]
enum PollState {
    Pending,
    SlowDown,
    Denied,
    Expired,
    Failed(String),
}

fn poll_state(error: &str) -> PollState {
    match error {
        "authorization_pending" => PollState::Pending,
        "slow_down" => PollState::SlowDown,
        "access_denied" => PollState::Denied,
        "expired_token" => PollState::Expired,
        other => PollState::Failed(other.to_string()),
    }
}

#[derive(Clone)]
pub struct DeviceFlow {
    http: Client,
    client_id: String,
    client_secret: Option<SecretString>,
    device_url: String,
    token_url: String,
    prompt: Arc<dyn ConsentPrompt>,
}

impl DeviceFlow {
    pub fn new(http: Client, client_id: impl Into<String>, prompt: Arc<dyn ConsentPrompt>) -> Self {
        Self {
            http,
            client_id: client_id.into(),
            client_secret: None,
            device_url: DEFAULT_DEVICE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            prompt,
        }
    }

    #[must_use]
    pub fn with_client_secret(mut self, secret: SecretString) -> Self {
        self.client_secret = Some(secret);
        self
    }

    #[must_use]
    pub fn with_endpoints(mut self, device_url: &str, token_url: &str) -> Self {
        if let Some(url) = normalize_base_url(device_url) {
            self.device_url = url;
        }
        if let Some(url) = normalize_base_url(token_url) {
            self.token_url = url;
        }
        self
    }

    /// Runs the whole consent flow and returns the provider id token.
    ///
    /// # Errors
    /// `ProviderConsentCancelled` when the user denies or the code expires,
    /// `Provider` for transport or protocol failures and for a code lifetime
    /// the clock cannot represent.
    #[instrument(skip(self))]
    pub async fn authorize(&self) -> Result<SecretString, AuthError> {
        let device = self.request_device_code().await?;
        let deadline = Instant::now()
            .checked_add(Duration::from_secs(device.expires_in))
            .ok_or_else(|| {
                AuthError::Provider(format!(
                    "device code lifetime of {}s is out of range",
                    device.expires_in
                ))
            })?;
        let mut interval = Duration::from_secs(device.interval.max(1));

        self.prompt.show(&device.verification_uri, &device.user_code);
        info!("waiting for provider consent");

        loop {
            sleep(interval).await;
            if Instant::now() >= deadline {
                return Err(AuthError::ProviderConsentCancelled);
            }

            let response = self.poll_token(&device.device_code).await?;
            if let Some(error) = response.error.as_deref() {
                match poll_state(error) {
                    PollState::Pending => debug!("authorization pending"),
                    PollState::SlowDown => {
                        interval = interval.saturating_add(SLOW_DOWN_STEP);
                        debug!("slowing down to {}s", interval.as_secs());
                    }
                    PollState::Denied | PollState::Expired => {
                        return Err(AuthError::ProviderConsentCancelled)
                    }
                    PollState::Failed(reason) => {
                        return Err(AuthError::Provider(format!("device flow failed: {reason}")))
                    }
                }
                continue;
            }

            return response
                .id_token
                .filter(|token| !token.is_empty())
                .map(SecretString::from)
                .ok_or(AuthError::TokenMissing);
        }
    }

    async fn request_device_code(&self) -> Result<DeviceCodeResponse, AuthError> {
        let response = self
            .http
            .post(&self.device_url)
            .form(&[("client_id", self.client_id.as_str()), ("scope", SCOPE)])
            .send()
            .await
            .map_err(|err| AuthError::Provider(map_request_error(err).to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            return Err(AuthError::Provider(format!(
                "device authorization rejected ({status})"
            )));
        }

        response
            .json()
            .await
            .map_err(|err| AuthError::Provider(format!("Failed to decode device code: {err}")))
    }

    async fn poll_token(&self, device_code: &str) -> Result<TokenResponse, AuthError> {
        let mut form = vec![
            ("client_id", self.client_id.as_str()),
            ("device_code", device_code),
            ("grant_type", DEVICE_GRANT_TYPE),
        ];
        if let Some(secret) = &self.client_secret {
            form.push(("client_secret", secret.expose_secret()));
        }

        // pending and denied answers arrive as 4xx with a JSON error body
        let response = self
            .http
            .post(&self.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|err| AuthError::Provider(map_request_error(err).to_string()))?;

        response
            .json()
            .await
            .map_err(|err| AuthError::Provider(format!("Failed to decode token response: {err}")))
    }
}
