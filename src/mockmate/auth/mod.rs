//! Credential submission workflow. It keeps authentication sequencing out of the
//! CLI and must never log passwords or token material.
//!
//! Flow Overview: the validator gates every submission locally. Sign-up creates
//! the identity account, uploads staged assets under the new account id, then
//! relays the profile to the backend. Sign-in exchanges the password for an
//! identity token and relays the token. The federated path replaces the form
//! with attributes returned by the provider consent flow.

pub mod assets;
pub mod error;
pub mod exchange;
pub mod form;
pub mod types;
pub mod validator;
pub mod workflow;

pub use assets::{AssetKind, BinaryAsset, SelectedFile, StageError, StagedAssets};
pub use error::AuthError;
pub use exchange::{CredentialExchanger, IdentityProvider, ObjectStorage, SessionRelay};
pub use form::CredentialForm;
pub use types::{AccountId, AppSession, FormMode, ProviderKind, SessionToken};
pub use validator::{FieldError, FormField, ValidationReport};
pub use workflow::{
    Completion, Navigator, Notification, NotificationLevel, Notifier, Route, SubmitOutcome,
    WorkflowController, WorkflowState,
};
