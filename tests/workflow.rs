use async_trait::async_trait;
use mockmate::mockmate::{
    auth::{
        types::{
            AccountId, AppSession, FederatedIdentity, RelayOutcome, SessionToken, SignInRequest,
            SignUpRequest,
        },
        AssetKind, AuthError, BinaryAsset, CredentialExchanger, CredentialForm, FormField,
        FormMode, IdentityProvider, Navigator, Notification, NotificationLevel, Notifier,
        ObjectStorage, ProviderKind, Route, SelectedFile, SessionRelay, SubmitOutcome,
        WorkflowController, WorkflowState,
    },
    client::AppError,
};
use secrecy::{ExposeSecret, SecretString};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tempfile::TempDir;
use tokio::sync::Notify;

const ACCOUNT_ID: &str = "uid-1";
const TOKEN: &str = "id-token-1";

#[derive(Clone, Debug, PartialEq, Eq)]
enum Call {
    CreateAccount {
        email: String,
        password: String,
    },
    Authenticate {
        email: String,
        password: String,
    },
    Consent,
    Upload {
        path: String,
        mime: String,
    },
    RelaySignUp {
        uid: String,
        name: String,
        email: String,
        password: String,
        profile_picture_url: String,
        resume_url: String,
    },
    RelaySignIn {
        email: String,
        token: String,
    },
}

type Log = Arc<Mutex<Vec<Call>>>;

fn record(log: &Log, call: Call) {
    log.lock().expect("log").push(call);
}

/// Pauses `authenticate` until released.
struct Gate {
    started: Notify,
    release: Notify,
}

#[derive(Default)]
enum TokenReply {
    #[default]
    Issued,
    Missing,
}

#[derive(Default)]
enum ConsentReply {
    #[default]
    Granted,
    Cancelled,
}

#[derive(Default)]
struct FakeIdentity {
    log: Log,
    existing: Option<String>,
    token: TokenReply,
    consent: ConsentReply,
    display_name: Option<String>,
    gate: Option<Arc<Gate>>,
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    async fn create_account(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<AccountId, AuthError> {
        record(
            &self.log,
            Call::CreateAccount {
                email: email.to_string(),
                password: password.expose_secret().to_string(),
            },
        );
        if self.existing.as_deref() == Some(email) {
            return Err(AuthError::AccountExists);
        }
        Ok(AccountId::new(ACCOUNT_ID))
    }

    async fn authenticate(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Option<SessionToken>, AuthError> {
        record(
            &self.log,
            Call::Authenticate {
                email: email.to_string(),
                password: password.expose_secret().to_string(),
            },
        );
        if let Some(gate) = &self.gate {
            gate.started.notify_one();
            gate.release.notified().await;
        }
        Ok(match self.token {
            TokenReply::Issued => Some(SessionToken::new(TOKEN)),
            TokenReply::Missing => None,
        })
    }

    async fn federated_consent(
        &self,
        _provider: ProviderKind,
    ) -> Result<FederatedIdentity, AuthError> {
        record(&self.log, Call::Consent);
        match self.consent {
            ConsentReply::Granted => Ok(FederatedIdentity {
                account_id: AccountId::new("google-uid"),
                identity_token: SessionToken::new(TOKEN),
                email: "ann@gmail.com".to_string(),
                display_name: self.display_name.clone(),
                photo_url: None,
            }),
            ConsentReply::Cancelled => Err(AuthError::ProviderConsentCancelled),
        }
    }
}

struct FakeStorage {
    log: Log,
    fail: bool,
}

#[async_trait]
impl ObjectStorage for FakeStorage {
    async fn upload(&self, path: &str, asset: &BinaryAsset) -> Result<String, AppError> {
        record(
            &self.log,
            Call::Upload {
                path: path.to_string(),
                mime: asset.declared_mime().to_string(),
            },
        );
        if self.fail {
            return Err(AppError::Http {
                status: 503,
                message: "unavailable".to_string(),
            });
        }
        Ok(format!("https://files.test/{path}"))
    }
}

struct FakeRelay {
    log: Log,
    sign_up: RelayOutcome,
    sign_in_error: Option<AppError>,
}

#[async_trait]
impl SessionRelay for FakeRelay {
    async fn sign_up(&self, request: &SignUpRequest) -> Result<RelayOutcome, AppError> {
        record(
            &self.log,
            Call::RelaySignUp {
                uid: request.uid.to_string(),
                name: request.name.clone(),
                email: request.email.clone(),
                password: request.password.expose_secret().to_string(),
                profile_picture_url: request.profile_picture_url.clone(),
                resume_url: request.resume_url.clone(),
            },
        );
        Ok(self.sign_up.clone())
    }

    async fn sign_in(&self, request: SignInRequest) -> Result<AppSession, AppError> {
        record(
            &self.log,
            Call::RelaySignIn {
                email: request.email.clone(),
                token: request.id_token.expose().to_string(),
            },
        );
        match &self.sign_in_error {
            Some(err) => Err(err.clone()),
            None => Ok(AppSession::new("session-1", request.email)),
        }
    }
}

#[derive(Default)]
struct Feedback {
    notifications: Mutex<Vec<Notification>>,
    routes: Mutex<Vec<Route>>,
}

impl Notifier for Feedback {
    fn notify(&self, notification: Notification) {
        self.notifications.lock().expect("lock").push(notification);
    }
}

impl Navigator for Feedback {
    fn navigate(&self, route: Route) {
        self.routes.lock().expect("lock").push(route);
    }
}

impl Feedback {
    fn messages(&self) -> Vec<(NotificationLevel, String)> {
        self.notifications
            .lock()
            .expect("lock")
            .iter()
            .map(|n| (n.level, n.message.clone()))
            .collect()
    }

    fn routes(&self) -> Vec<Route> {
        self.routes.lock().expect("lock").clone()
    }
}

struct Harness {
    log: Log,
    feedback: Arc<Feedback>,
    controller: Arc<WorkflowController>,
}

impl Harness {
    fn calls(&self) -> Vec<Call> {
        self.log.lock().expect("log").clone()
    }
}

fn harness_with(
    identity: FakeIdentity,
    storage_fails: bool,
    sign_up: RelayOutcome,
) -> Harness {
    harness_with_relay(identity, storage_fails, sign_up, None)
}

fn harness_with_relay(
    identity: FakeIdentity,
    storage_fails: bool,
    sign_up: RelayOutcome,
    sign_in_error: Option<AppError>,
) -> Harness {
    let log = identity.log.clone();
    let feedback = Arc::new(Feedback::default());
    let exchanger = CredentialExchanger::new(
        Arc::new(identity),
        Arc::new(FakeStorage {
            log: log.clone(),
            fail: storage_fails,
        }),
        Arc::new(FakeRelay {
            log: log.clone(),
            sign_up,
            sign_in_error,
        }),
    );
    let controller = Arc::new(WorkflowController::new(
        exchanger,
        feedback.clone(),
        feedback.clone(),
    ));

    Harness {
        log,
        feedback,
        controller,
    }
}

fn accepted() -> RelayOutcome {
    RelayOutcome {
        success: true,
        message: None,
    }
}

fn harness() -> Harness {
    harness_with(FakeIdentity::default(), false, accepted())
}

fn sign_up_form(name: &str, email: &str, password: &str) -> CredentialForm {
    let mut form = CredentialForm::new(FormMode::SignUp);
    form.set_name(name);
    form.set_email(email);
    form.set_password(password);
    form
}

fn sign_in_form(email: &str, password: &str) -> CredentialForm {
    let mut form = CredentialForm::new(FormMode::SignIn);
    form.set_email(email);
    form.set_password(password);
    form
}

fn write_file(dir: &TempDir, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, contents).expect("write");
    path
}

#[tokio::test]
async fn short_name_never_reaches_the_exchanger() {
    let h = harness();

    let outcome = h
        .controller
        .submit(sign_up_form("An", "ann@x.com", "abcdef"))
        .await;

    let SubmitOutcome::Invalid(report) = outcome else {
        panic!("expected a validation report, got {outcome:?}");
    };
    assert_eq!(
        report.error_for(FormField::Name).map(|e| e.reason.as_str()),
        Some("Name must be at least 3 characters")
    );
    assert!(h.calls().is_empty());
    assert_eq!(h.controller.state(), WorkflowState::Idle);
    assert!(h.feedback.routes().is_empty());
}

#[tokio::test]
async fn sign_in_authenticates_once_then_relays_once() {
    let h = harness();

    let outcome = h
        .controller
        .submit(sign_in_form("ann@x.com", "abcdef"))
        .await;

    let SubmitOutcome::Succeeded(completion) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(completion.route, Route::Home);
    let session = completion.session.expect("session");
    assert_eq!(session.value.expose_secret(), "session-1");

    assert_eq!(
        h.calls(),
        vec![
            Call::Authenticate {
                email: "ann@x.com".to_string(),
                password: "abcdef".to_string(),
            },
            Call::RelaySignIn {
                email: "ann@x.com".to_string(),
                token: TOKEN.to_string(),
            },
        ]
    );
    assert_eq!(h.controller.state(), WorkflowState::Success);
    assert_eq!(
        h.feedback.messages(),
        vec![(
            NotificationLevel::Success,
            "Signed in successfully".to_string()
        )]
    );
    assert_eq!(h.feedback.routes(), vec![Route::Home]);
}

#[tokio::test]
async fn sign_up_uploads_both_assets_between_creation_and_relay() {
    let dir = TempDir::new().expect("tempdir");
    let image = write_file(&dir, "me.png", b"\x89PNG\r\n\x1a\n0000");
    let resume = write_file(&dir, "cv.pdf", b"%PDF-1.4 resume");

    let h = harness();
    let mut form = sign_up_form("Ann", "ann@x.com", "abcdef");
    form.stage(SelectedFile::from_path(image), AssetKind::Profile)
        .await
        .expect("profile");
    form.stage(SelectedFile::from_path(resume), AssetKind::Resume)
        .await
        .expect("resume");

    let outcome = h.controller.submit(form).await;
    assert!(matches!(outcome, SubmitOutcome::Succeeded(_)));

    let calls = h.calls();
    assert_eq!(calls.len(), 4);
    assert!(matches!(calls[0], Call::CreateAccount { .. }));
    assert_eq!(
        calls[1],
        Call::Upload {
            path: "users/uid-1/profile/me.png".to_string(),
            mime: "image/png".to_string(),
        }
    );
    assert_eq!(
        calls[2],
        Call::Upload {
            path: "users/uid-1/resume/cv.pdf".to_string(),
            mime: "application/pdf".to_string(),
        }
    );
    let Call::RelaySignUp {
        profile_picture_url,
        resume_url,
        ..
    } = &calls[3]
    else {
        panic!("expected relay last, got {:?}", calls[3]);
    };
    assert_eq!(profile_picture_url, "https://files.test/users/uid-1/profile/me.png");
    assert_eq!(resume_url, "https://files.test/users/uid-1/resume/cv.pdf");
}

#[tokio::test]
async fn sign_up_end_to_end_without_assets() {
    let h = harness();

    let outcome = h
        .controller
        .submit(sign_up_form("Ann", "ann@x.com", "abcdef"))
        .await;

    let SubmitOutcome::Succeeded(completion) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(completion.route, Route::SignIn);
    assert!(completion.session.is_none());

    assert_eq!(
        h.calls(),
        vec![
            Call::CreateAccount {
                email: "ann@x.com".to_string(),
                password: "abcdef".to_string(),
            },
            Call::RelaySignUp {
                uid: ACCOUNT_ID.to_string(),
                name: "Ann".to_string(),
                email: "ann@x.com".to_string(),
                password: "abcdef".to_string(),
                profile_picture_url: String::new(),
                resume_url: String::new(),
            },
        ]
    );
    assert_eq!(h.controller.state(), WorkflowState::Success);
    assert_eq!(
        h.feedback.messages(),
        vec![(
            NotificationLevel::Success,
            "Account created successfully".to_string()
        )]
    );
    assert_eq!(h.feedback.routes(), vec![Route::SignIn]);
}

#[tokio::test]
async fn double_submit_runs_one_network_sequence() {
    let gate = Arc::new(Gate {
        started: Notify::new(),
        release: Notify::new(),
    });
    let h = harness_with(
        FakeIdentity {
            gate: Some(gate.clone()),
            ..FakeIdentity::default()
        },
        false,
        accepted(),
    );

    let controller = h.controller.clone();
    let first = tokio::spawn(async move {
        controller
            .submit(sign_in_form("ann@x.com", "abcdef"))
            .await
    });

    gate.started.notified().await;
    assert!(h.controller.is_submitting());

    let second = h
        .controller
        .submit(sign_in_form("ann@x.com", "abcdef"))
        .await;
    assert!(matches!(second, SubmitOutcome::InFlight));

    let provider = h
        .controller
        .submit_with_provider(ProviderKind::Google, FormMode::SignIn)
        .await;
    assert!(matches!(provider, SubmitOutcome::InFlight));

    gate.release.notify_one();
    let first = first.await.expect("join");
    assert!(matches!(first, SubmitOutcome::Succeeded(_)));

    let authentications = h
        .calls()
        .iter()
        .filter(|call| matches!(call, Call::Authenticate { .. }))
        .count();
    assert_eq!(authentications, 1);
    assert_eq!(h.calls().len(), 2);
}

#[tokio::test]
async fn missing_token_fails_without_relay_and_allows_retry() {
    let h = harness_with(
        FakeIdentity {
            token: TokenReply::Missing,
            ..FakeIdentity::default()
        },
        false,
        accepted(),
    );

    let outcome = h
        .controller
        .submit(sign_in_form("ann@x.com", "abcdef"))
        .await;
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(AuthError::TokenMissing)
    ));
    assert_eq!(h.calls().len(), 1);
    assert_eq!(
        h.controller.state(),
        WorkflowState::Failed("Error signing in".to_string())
    );
    assert_eq!(
        h.feedback.messages(),
        vec![(
            NotificationLevel::Error,
            "Error signing in".to_string()
        )]
    );
    assert!(h.feedback.routes().is_empty());

    h.controller.interact();
    assert_eq!(h.controller.state(), WorkflowState::Idle);

    let retry = h
        .controller
        .submit(sign_in_form("ann@x.com", "abcdef"))
        .await;
    assert!(matches!(retry, SubmitOutcome::Failed(_)));
    assert_eq!(h.calls().len(), 2);
}

#[tokio::test]
async fn existing_account_is_reported() {
    let h = harness_with(
        FakeIdentity {
            existing: Some("ann@x.com".to_string()),
            ..FakeIdentity::default()
        },
        false,
        accepted(),
    );

    let outcome = h
        .controller
        .submit(sign_up_form("Ann", "ann@x.com", "abcdef"))
        .await;
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(AuthError::AccountExists)
    ));
    assert_eq!(h.calls().len(), 1);
    assert_eq!(
        h.feedback.messages()[0].1,
        "Authentication failed: An account with this email already exists"
    );
}

#[tokio::test]
async fn upload_failure_keeps_account_and_skips_relay() {
    let dir = TempDir::new().expect("tempdir");
    let resume = write_file(&dir, "cv.pdf", b"%PDF-1.4");

    let h = harness_with(FakeIdentity::default(), true, accepted());
    let mut form = sign_up_form("Ann", "ann@x.com", "abcdef");
    form.stage(SelectedFile::from_path(resume), AssetKind::Resume)
        .await
        .expect("resume");

    let outcome = h.controller.submit(form).await;
    let SubmitOutcome::Failed(err) = outcome else {
        panic!("expected failure, got {outcome:?}");
    };
    assert!(err.account_created());
    match err {
        AuthError::UploadFailure {
            account_id, kind, ..
        } => {
            assert_eq!(account_id.as_str(), ACCOUNT_ID);
            assert_eq!(kind, AssetKind::Resume);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(!h
        .calls()
        .iter()
        .any(|call| matches!(call, Call::RelaySignUp { .. })));
}

#[tokio::test]
async fn rejected_relay_surfaces_backend_message() {
    let h = harness_with(
        FakeIdentity::default(),
        false,
        RelayOutcome {
            success: false,
            message: Some("User already exists. Please sign in.".to_string()),
        },
    );

    let outcome = h
        .controller
        .submit(sign_up_form("Ann", "ann@x.com", "abcdef"))
        .await;
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(AuthError::RelayRejected(_))
    ));
    assert_eq!(
        h.feedback.messages(),
        vec![(
            NotificationLevel::Error,
            "User already exists. Please sign in.".to_string()
        )]
    );
}

#[tokio::test]
async fn relay_http_failure_keeps_prefix_and_server_wording() {
    let h = harness_with_relay(
        FakeIdentity::default(),
        false,
        accepted(),
        Some(AppError::Http {
            status: 401,
            message: "Invalid token".to_string(),
        }),
    );

    let outcome = h
        .controller
        .submit(sign_in_form("ann@x.com", "abcdef"))
        .await;
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(AuthError::RelayFailure(_))
    ));
    assert_eq!(
        h.feedback.messages(),
        vec![(
            NotificationLevel::Error,
            "Authentication failed: Invalid token".to_string()
        )]
    );
}

#[tokio::test]
async fn federated_sign_up_relays_provider_attributes() {
    let h = harness();

    let outcome = h
        .controller
        .submit_with_provider(ProviderKind::Google, FormMode::SignUp)
        .await;

    let SubmitOutcome::Succeeded(completion) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(completion.route, Route::SignIn);
    assert_eq!(
        h.calls(),
        vec![
            Call::Consent,
            Call::RelaySignUp {
                uid: "google-uid".to_string(),
                name: "User".to_string(),
                email: "ann@gmail.com".to_string(),
                password: String::new(),
                profile_picture_url: String::new(),
                resume_url: String::new(),
            },
        ]
    );
    assert_eq!(
        h.feedback.messages(),
        vec![(
            NotificationLevel::Success,
            "Authentication successful".to_string()
        )]
    );
}

#[tokio::test]
async fn federated_sign_in_goes_home() {
    let h = harness_with(
        FakeIdentity {
            display_name: Some("Ann".to_string()),
            ..FakeIdentity::default()
        },
        false,
        accepted(),
    );

    let outcome = h
        .controller
        .submit_with_provider(ProviderKind::Google, FormMode::SignIn)
        .await;

    let SubmitOutcome::Succeeded(completion) = outcome else {
        panic!("expected success, got {outcome:?}");
    };
    assert_eq!(completion.route, Route::Home);
    assert!(completion.session.is_some());
    assert_eq!(
        h.calls()[1],
        Call::RelaySignIn {
            email: "ann@gmail.com".to_string(),
            token: TOKEN.to_string(),
        }
    );
    assert_eq!(h.feedback.routes(), vec![Route::Home]);
}

#[tokio::test]
async fn cancelled_consent_is_reported_with_provider_name() {
    let h = harness_with(
        FakeIdentity {
            consent: ConsentReply::Cancelled,
            ..FakeIdentity::default()
        },
        false,
        accepted(),
    );

    let outcome = h
        .controller
        .submit_with_provider(ProviderKind::Google, FormMode::SignIn)
        .await;
    assert!(matches!(
        outcome,
        SubmitOutcome::Failed(AuthError::ProviderConsentCancelled)
    ));
    assert_eq!(h.calls(), vec![Call::Consent]);
    assert_eq!(
        h.feedback.messages(),
        vec![(
            NotificationLevel::Error,
            "Google authentication failed: Sign-in was cancelled".to_string()
        )]
    );
}
