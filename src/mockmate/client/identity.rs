//! Identity Toolkit REST adapter for the `IdentityProvider` seam. The API key
//! travels as a query parameter, so request URLs are never logged and
//! transport errors are stripped of their URL.

use crate::mockmate::{
    auth::{
        exchange::IdentityProvider,
        types::{AccountId, FederatedIdentity, ProviderKind, SessionToken},
        AuthError,
    },
    client::{build_url_with_base, device::DeviceFlow, map_request_error},
};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, instrument};

pub const DEFAULT_IDENTITY_URL: &str = "https://identitytoolkit.googleapis.com/v1";
/// Redirect URI the IdP exchange requires even for token-based credentials.
const IDP_REQUEST_URI: &str = "http://localhost";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordRequest<'a> {
    email: &'a str,
    password: &'a str,
    return_secure_token: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IdpRequest<'a> {
    post_body: String,
    request_uri: &'a str,
    return_secure_token: bool,
    return_idp_credential: bool,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountResponse {
    local_id: String,
    #[serde(default)]
    id_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdpResponse {
    local_id: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    photo_url: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Maps an Identity Toolkit error body to the workflow taxonomy. Messages may
/// carry a detail suffix (`"INVALID_PASSWORD : ..."`); only the code counts.
pub(crate) fn classify_error(status: u16, body: &str) -> AuthError {
    let message = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_default();
    let code = message
        .split(|c: char| c == ':' || c.is_whitespace())
        .next()
        .unwrap_or_default();

    match code {
        "EMAIL_EXISTS" => AuthError::AccountExists,
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "USER_DISABLED" => {
            AuthError::InvalidCredentials
        }
        "" => AuthError::Provider(format!("identity request failed ({status})")),
        other => AuthError::Provider(format!("identity request failed ({status}): {other}")),
    }
}

#[derive(Clone)]
pub struct IdentityToolkit {
    http: Client,
    base_url: String,
    api_key: SecretString,
    device: Option<DeviceFlow>,
}

impl IdentityToolkit {
    pub fn new(http: Client, base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            api_key,
            device: None,
        }
    }

    /// Enables federated consent through the device authorization flow.
    #[must_use]
    pub fn with_device_flow(mut self, device: DeviceFlow) -> Self {
        self.device = Some(device);
        self
    }

    async fn call<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: &str,
        body: &B,
    ) -> Result<T, AuthError> {
        if self.api_key.expose_secret().is_empty() {
            return Err(AuthError::Provider(
                "identity API key is not configured".to_string(),
            ));
        }

        let url = build_url_with_base(&self.base_url, &format!("accounts:{method}"));
        debug!(method, "identity toolkit request");

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(body)
            .send()
            .await
            .map_err(|err| AuthError::Provider(map_request_error(err).to_string()))?;

        let status = response.status();
        if status.is_success() {
            response
                .json::<T>()
                .await
                .map_err(|err| AuthError::Provider(format!("Failed to decode response: {err}")))
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(classify_error(status.as_u16(), &body))
        }
    }
}

#[async_trait]
impl IdentityProvider for IdentityToolkit {
    #[instrument(skip_all)]
    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AccountId, AuthError> {
        let request = PasswordRequest {
            email,
            password: password.expose_secret(),
            return_secure_token: true,
        };
        let response: AccountResponse = self.call("signUp", &request).await?;

        Ok(AccountId::new(response.local_id))
    }

    #[instrument(skip_all)]
    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Option<SessionToken>, AuthError> {
        let request = PasswordRequest {
            email,
            password: password.expose_secret(),
            return_secure_token: true,
        };
        let response: AccountResponse = self.call("signInWithPassword", &request).await?;

        Ok(SessionToken::non_empty(response.id_token))
    }

    #[instrument(skip(self))]
    async fn federated_consent(
        &self,
        provider: ProviderKind,
    ) -> Result<FederatedIdentity, AuthError> {
        let device = self.device.as_ref().ok_or_else(|| {
            AuthError::Provider(format!(
                "{} sign-in is not configured",
                provider.display_name()
            ))
        })?;
        let provider_token = device.authorize().await?;

        let request = IdpRequest {
            post_body: format!(
                "id_token={}&providerId={}",
                urlencoding::encode(provider_token.expose_secret()),
                provider.provider_id()
            ),
            request_uri: IDP_REQUEST_URI,
            return_secure_token: true,
            return_idp_credential: true,
        };
        let response: IdpResponse = self.call("signInWithIdp", &request).await?;

        let identity_token =
            SessionToken::non_empty(response.id_token).ok_or(AuthError::TokenMissing)?;
        let email = response
            .email
            .filter(|email| !email.trim().is_empty())
            .ok_or_else(|| AuthError::Provider("provider returned no email".to_string()))?;

        Ok(FederatedIdentity {
            account_id: AccountId::new(response.local_id),
            identity_token,
            email,
            display_name: response.display_name,
            photo_url: response.photo_url,
        })
    }
}
