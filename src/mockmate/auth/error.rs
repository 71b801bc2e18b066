use crate::mockmate::auth::{assets::AssetKind, types::AccountId, validator::ValidationReport};
use thiserror::Error;

/// Failures of a credential submission. Network-stage variants are produced
/// at the exchanger boundary; `Validation` never reaches the network.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid form: {0}")]
    Validation(ValidationReport),
    #[error("an account with this email already exists")]
    AccountExists,
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("identity provider returned no session token")]
    TokenMissing,
    #[error("failed to upload {kind} for account {account_id}: {reason}")]
    UploadFailure {
        account_id: AccountId,
        kind: AssetKind,
        reason: String,
    },
    #[error("session relay failed: {0}")]
    RelayFailure(String),
    #[error("sign-up rejected by the backend: {0}")]
    RelayRejected(String),
    #[error("provider consent was cancelled")]
    ProviderConsentCancelled,
    #[error("identity provider error: {0}")]
    Provider(String),
}

impl AuthError {
    /// Message shown to the user in a notification. Keeps provider internals
    /// and account identifiers out of the UI.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(report) => report.to_string(),
            Self::AccountExists => "An account with this email already exists".to_string(),
            Self::InvalidCredentials => "Invalid email or password".to_string(),
            Self::TokenMissing => "Error signing in".to_string(),
            Self::UploadFailure { kind, .. } => {
                format!("Your account was created, but the {kind} upload failed")
            }
            Self::RelayFailure(reason) | Self::RelayRejected(reason) => reason.clone(),
            Self::ProviderConsentCancelled => "Sign-in was cancelled".to_string(),
            Self::Provider(_) => "Unable to reach the identity provider".to_string(),
        }
    }

    /// Messages the credential form shows as they are, without the
    /// "Authentication failed" prefix.
    #[must_use]
    pub const fn stands_alone(&self) -> bool {
        matches!(self, Self::RelayRejected(_) | Self::TokenMissing)
    }

    /// Whether the identity account exists even though the submission failed.
    #[must_use]
    pub const fn account_created(&self) -> bool {
        matches!(self, Self::UploadFailure { .. })
    }
}
