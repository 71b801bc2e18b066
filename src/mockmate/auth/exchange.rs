//! Credential exchange against the external services. Every network error is
//! classified here into an `AuthError`; nothing below this boundary decides
//! what the user sees.
//!
//! Ordering within one submission is fixed: account creation, then uploads
//! (profile before resume), then the relay call. Uploads need the account id
//! for their storage path, and the relay persists URLs rather than bytes.

use crate::mockmate::{
    auth::{
        assets::{AssetKind, BinaryAsset},
        error::AuthError,
        form::{CredentialForm, FormParts},
        types::{
            AccountId, AppSession, FederatedIdentity, FormMode, ProviderKind, RelayOutcome,
            SessionToken, SignInRequest, SignUpRequest,
        },
    },
    client::AppError,
};
use async_trait::async_trait;
use secrecy::SecretString;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Display name used when a federated provider returns none.
pub const DEFAULT_DISPLAY_NAME: &str = "User";

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Creates an account and returns its id.
    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AccountId, AuthError>;

    /// Exchanges a password for a session token; `None` when the provider
    /// answered without one.
    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Option<SessionToken>, AuthError>;

    /// Runs the interactive consent flow for `provider`.
    async fn federated_consent(&self, provider: ProviderKind)
        -> Result<FederatedIdentity, AuthError>;
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Stores `asset` at `path` and returns a retrievable URL.
    async fn upload(&self, path: &str, asset: &BinaryAsset) -> Result<String, AppError>;
}

#[async_trait]
pub trait SessionRelay: Send + Sync {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<RelayOutcome, AppError>;

    async fn sign_in(&self, request: SignInRequest) -> Result<AppSession, AppError>;
}

/// Result of a completed registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    pub account_id: AccountId,
    pub profile_picture_url: String,
    pub resume_url: String,
}

/// Result of a completed federated exchange.
#[derive(Debug)]
pub enum FederatedOutcome {
    SignedIn(AppSession),
    Registered(Registration),
}

/// Storage path for an uploaded asset: `users/{account}/{kind}/{file}`.
#[must_use]
pub fn asset_path(account_id: &AccountId, kind: AssetKind, file_name: &str) -> String {
    format!("users/{account_id}/{}/{file_name}", kind.as_str())
}

#[derive(Clone)]
pub struct CredentialExchanger {
    identity: Arc<dyn IdentityProvider>,
    storage: Arc<dyn ObjectStorage>,
    relay: Arc<dyn SessionRelay>,
}

impl CredentialExchanger {
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        storage: Arc<dyn ObjectStorage>,
        relay: Arc<dyn SessionRelay>,
    ) -> Self {
        Self {
            identity,
            storage,
            relay,
        }
    }

    /// Creates the account, uploads staged assets, then relays the profile.
    ///
    /// # Errors
    /// `AccountExists`, `UploadFailure` (the account stays created), or
    /// `RelayFailure`/`RelayRejected`, plus provider errors from account
    /// creation.
    #[instrument(skip_all)]
    pub async fn register_with_credentials(
        &self,
        form: CredentialForm,
    ) -> Result<Registration, AuthError> {
        let FormParts {
            name,
            email,
            password,
            assets,
        } = form.into_parts();

        let account_id = self.identity.create_account(&email, &password).await?;
        info!(account_id = %account_id, "identity account created");

        let mut registration = Registration {
            account_id,
            profile_picture_url: String::new(),
            resume_url: String::new(),
        };

        for (kind, asset) in assets.into_uploads() {
            let url = self
                .upload(&registration.account_id, kind, asset)
                .await?;
            match kind {
                AssetKind::Profile => registration.profile_picture_url = url,
                AssetKind::Resume => registration.resume_url = url,
            }
        }

        let request = SignUpRequest {
            uid: registration.account_id.clone(),
            name,
            email,
            password,
            profile_picture_url: registration.profile_picture_url.clone(),
            resume_url: registration.resume_url.clone(),
        };
        self.relay_sign_up(&request).await?;

        Ok(registration)
    }

    /// Exchanges the password for a token and relays it.
    ///
    /// # Errors
    /// `InvalidCredentials`, `TokenMissing` or `RelayFailure`.
    #[instrument(skip_all)]
    pub async fn authenticate_with_credentials(
        &self,
        form: CredentialForm,
    ) -> Result<AppSession, AuthError> {
        let FormParts {
            email, password, ..
        } = form.into_parts();

        let token = self
            .identity
            .authenticate(&email, &password)
            .await?
            .ok_or(AuthError::TokenMissing)?;
        debug!("identity token issued");

        self.relay_sign_in(SignInRequest {
            email,
            id_token: token,
        })
        .await
    }

    /// Runs provider consent and relays its attributes for `mode`.
    ///
    /// # Errors
    /// `ProviderConsentCancelled`, provider errors, or `RelayFailure`.
    #[instrument(skip(self))]
    pub async fn authenticate_with_provider(
        &self,
        provider: ProviderKind,
        mode: FormMode,
    ) -> Result<FederatedOutcome, AuthError> {
        let identity = self.identity.federated_consent(provider).await?;
        info!(account_id = %identity.account_id, "provider consent completed");

        match mode {
            FormMode::SignIn => {
                let session = self
                    .relay_sign_in(SignInRequest {
                        email: identity.email,
                        id_token: identity.identity_token,
                    })
                    .await?;
                Ok(FederatedOutcome::SignedIn(session))
            }
            FormMode::SignUp => {
                let registration = Registration {
                    account_id: identity.account_id,
                    profile_picture_url: identity.photo_url.unwrap_or_default(),
                    resume_url: String::new(),
                };
                let request = SignUpRequest {
                    uid: registration.account_id.clone(),
                    name: identity
                        .display_name
                        .filter(|name| !name.trim().is_empty())
                        .unwrap_or_else(|| DEFAULT_DISPLAY_NAME.to_string()),
                    email: identity.email,
                    password: SecretString::default(),
                    profile_picture_url: registration.profile_picture_url.clone(),
                    resume_url: String::new(),
                };
                self.relay_sign_up(&request).await?;
                Ok(FederatedOutcome::Registered(registration))
            }
        }
    }

    async fn upload(
        &self,
        account_id: &AccountId,
        kind: AssetKind,
        asset: BinaryAsset,
    ) -> Result<String, AuthError> {
        let path = asset_path(account_id, kind, asset.file_name());
        debug!(path = %path, "uploading asset");

        self.storage
            .upload(&path, &asset)
            .await
            .map_err(|err| {
                warn!(kind = %kind, "asset upload failed: {err}");
                AuthError::UploadFailure {
                    account_id: account_id.clone(),
                    kind,
                    reason: err.to_string(),
                }
            })
    }

    async fn relay_sign_up(&self, request: &SignUpRequest) -> Result<(), AuthError> {
        let outcome = self.relay.sign_up(request).await.map_err(|err| {
            warn!("sign-up relay failed: {err}");
            AuthError::RelayFailure(err.reason())
        })?;

        if outcome.success {
            Ok(())
        } else {
            Err(AuthError::RelayRejected(
                outcome
                    .message
                    .unwrap_or_else(|| "Sign-up was rejected".to_string()),
            ))
        }
    }

    async fn relay_sign_in(&self, request: SignInRequest) -> Result<AppSession, AuthError> {
        self.relay.sign_in(request).await.map_err(|err| {
            warn!("sign-in relay failed: {err}");
            AuthError::RelayFailure(err.reason())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_asset_path() {
        let account = AccountId::new("uid-1");
        assert_eq!(
            asset_path(&account, AssetKind::Resume, "cv.pdf"),
            "users/uid-1/resume/cv.pdf"
        );
        assert_eq!(
            asset_path(&account, AssetKind::Profile, "me.png"),
            "users/uid-1/profile/me.png"
        );
    }
}
