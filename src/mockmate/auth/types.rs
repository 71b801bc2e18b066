//! Identifiers, tokens and relay payloads shared by the workflow and its
//! adapters. Anything carrying a password or token wraps it in `SecretString`
//! so `Debug` output stays redacted.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Which credential flow a form or federated request belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormMode {
    SignIn,
    SignUp,
}

impl FormMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SignIn => "sign-in",
            Self::SignUp => "sign-up",
        }
    }
}

impl fmt::Display for FormMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Federated identity providers offered next to the password form.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProviderKind {
    Google,
}

impl ProviderKind {
    /// Provider id understood by the identity provider's IdP exchange.
    #[must_use]
    pub const fn provider_id(self) -> &'static str {
        match self {
            Self::Google => "google.com",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Google => "Google",
        }
    }
}

/// Identity-provider account identifier (`uid`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque token issued by the identity provider. Not `Clone`: it is moved into
/// the relay request and consumed there.
#[derive(Debug)]
pub struct SessionToken(SecretString);

impl SessionToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::from(token.into()))
    }

    /// Returns `None` for an empty token so callers can surface `TokenMissing`.
    #[must_use]
    pub fn non_empty(token: Option<String>) -> Option<Self> {
        token
            .filter(|value| !value.trim().is_empty())
            .map(Self::new)
    }

    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

/// Profile attributes returned by a completed federated consent.
#[derive(Debug)]
pub struct FederatedIdentity {
    pub account_id: AccountId,
    pub identity_token: SessionToken,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Payload for the sign-up relay entry point.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub uid: AccountId,
    pub name: String,
    pub email: String,
    #[serde(serialize_with = "serialize_secret")]
    pub password: SecretString,
    pub profile_picture_url: String,
    pub resume_url: String,
}

/// Payload for the sign-in relay entry point.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: String,
    #[serde(serialize_with = "serialize_token")]
    pub id_token: SessionToken,
}

/// Sign-up relay answer; a `false` flag carries the backend's reason.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelayOutcome {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Backend session handle established by the sign-in relay. The workflow only
/// hands it back; the CLI's session store decides whether to keep it.
#[derive(Debug, Serialize, Deserialize)]
pub struct AppSession {
    #[serde(
        serialize_with = "serialize_secret",
        deserialize_with = "deserialize_secret"
    )]
    pub value: SecretString,
    pub email: String,
    pub established_at: DateTime<Utc>,
}

impl AppSession {
    pub fn new(value: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            value: SecretString::from(value.into()),
            email: email.into(),
            established_at: Utc::now(),
        }
    }
}

fn serialize_secret<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn serialize_token<S: Serializer>(token: &SessionToken, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(token.expose())
}

fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}
