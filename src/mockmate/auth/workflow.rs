//! Workflow controller: the state machine around a credential submission.
//!
//! `Idle -> Submitting -> {Success, Failed} -> Idle`. The transition into
//! `Submitting` is checked and set under one lock so a second submit during an
//! in-flight exchange is refused before any network call. The lock is never
//! held across an await.

use crate::mockmate::auth::{
    error::AuthError,
    exchange::{CredentialExchanger, FederatedOutcome},
    form::CredentialForm,
    types::{AppSession, FormMode, ProviderKind},
    validator::{self, ValidationReport},
};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkflowState {
    Idle,
    Submitting,
    Success,
    Failed(String),
}

/// Client-side destinations the workflow can navigate to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Route {
    Home,
    SignIn,
    SignUp,
    Interview,
    Profile,
}

impl Route {
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Home => "/",
            Self::SignIn => "/sign-in",
            Self::SignUp => "/sign-up",
            Self::Interview => "/interview",
            Self::Profile => "/profile",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient message for the user (a toast).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}

/// What a successful submission hands back to the UI.
#[derive(Debug)]
pub struct Completion {
    pub route: Route,
    /// Present when the relay established a backend session.
    pub session: Option<AppSession>,
}

#[derive(Debug)]
pub enum SubmitOutcome {
    Succeeded(Completion),
    Failed(AuthError),
    /// The form did not validate; nothing was sent.
    Invalid(ValidationReport),
    /// A submission is already in flight; this one was dropped.
    InFlight,
}

pub struct WorkflowController {
    exchanger: CredentialExchanger,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    state: Mutex<WorkflowState>,
}

impl WorkflowController {
    pub fn new(
        exchanger: CredentialExchanger,
        notifier: Arc<dyn Notifier>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            exchanger,
            notifier,
            navigator,
            state: Mutex::new(WorkflowState::Idle),
        }
    }

    #[must_use]
    pub fn state(&self) -> WorkflowState {
        self.lock_state().clone()
    }

    #[must_use]
    pub fn is_submitting(&self) -> bool {
        *self.lock_state() == WorkflowState::Submitting
    }

    /// Any user interaction returns a finished workflow to `Idle`.
    pub fn interact(&self) {
        let mut state = self.lock_state();
        if matches!(*state, WorkflowState::Success | WorkflowState::Failed(_)) {
            *state = WorkflowState::Idle;
        }
    }

    /// Validates and submits the form for its mode.
    pub async fn submit(&self, form: CredentialForm) -> SubmitOutcome {
        if self.is_submitting() {
            debug!("submission ignored: already in flight");
            return SubmitOutcome::InFlight;
        }
        self.interact();

        let report = validator::validate(&form);
        if !report.is_valid() {
            debug!("submission rejected by validation");
            return SubmitOutcome::Invalid(report);
        }

        if !self.begin() {
            return SubmitOutcome::InFlight;
        }

        let mode = form.mode();
        let result = match mode {
            FormMode::SignUp => self
                .exchanger
                .register_with_credentials(form)
                .await
                .map(|_| Completion {
                    route: Route::SignIn,
                    session: None,
                }),
            FormMode::SignIn => self
                .exchanger
                .authenticate_with_credentials(form)
                .await
                .map(|session| Completion {
                    route: Route::Home,
                    session: Some(session),
                }),
        };

        let success_message = match mode {
            FormMode::SignUp => "Account created successfully",
            FormMode::SignIn => "Signed in successfully",
        };

        self.finish(result, success_message, |err| {
            if err.stands_alone() {
                err.user_message()
            } else {
                format!("Authentication failed: {}", err.user_message())
            }
        })
    }

    /// Runs the federated provider flow for `mode`.
    pub async fn submit_with_provider(&self, provider: ProviderKind, mode: FormMode) -> SubmitOutcome {
        self.interact();
        if !self.begin() {
            debug!("provider submission ignored: already in flight");
            return SubmitOutcome::InFlight;
        }

        let result = self
            .exchanger
            .authenticate_with_provider(provider, mode)
            .await
            .map(|outcome| match outcome {
                FederatedOutcome::SignedIn(session) => Completion {
                    route: Route::Home,
                    session: Some(session),
                },
                FederatedOutcome::Registered(_) => Completion {
                    route: Route::SignIn,
                    session: None,
                },
            });

        self.finish(result, "Authentication successful", |err| {
            format!(
                "{} authentication failed: {}",
                provider.display_name(),
                err.user_message()
            )
        })
    }

    fn begin(&self) -> bool {
        let mut state = self.lock_state();
        if *state == WorkflowState::Submitting {
            return false;
        }
        *state = WorkflowState::Submitting;
        true
    }

    fn finish(
        &self,
        result: Result<Completion, AuthError>,
        success_message: &str,
        failure_text: impl FnOnce(&AuthError) -> String,
    ) -> SubmitOutcome {
        match result {
            Ok(completion) => {
                *self.lock_state() = WorkflowState::Success;
                info!(route = completion.route.path(), "submission succeeded");
                self.notifier.notify(Notification::success(success_message));
                self.navigator.navigate(completion.route);
                SubmitOutcome::Succeeded(completion)
            }
            Err(err) => {
                *self.lock_state() = WorkflowState::Failed(err.user_message());
                error!("submission failed: {err}");
                self.notifier.notify(Notification::error(failure_text(&err)));
                SubmitOutcome::Failed(err)
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, WorkflowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
