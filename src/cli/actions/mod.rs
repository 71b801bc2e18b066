pub mod auth;
pub mod dashboard;
pub mod interview;
pub mod profile;

use crate::{
    cli::{
        globals::GlobalArgs,
        ui::{ConsoleConsentPrompt, TerminalNavigator, TerminalNotifier},
    },
    mockmate::{
        auth::{CredentialExchanger, WorkflowController},
        client::{http_client, BackendClient, DeviceFlow, IdentityToolkit, ObjectStore},
        interview::InterviewType,
        records::RecordStore,
        session::{SessionGuard, SessionStore},
    },
};
use anyhow::Result;
use secrecy::SecretString;
use std::{path::PathBuf, sync::Arc};
use tracing::debug;

#[derive(Debug)]
pub enum Action {
    Version,
    Run { globals: GlobalArgs, task: Task },
}

#[derive(Debug)]
pub enum Task {
    SignUp {
        name: String,
        email: String,
        password: Option<SecretString>,
        profile_image: Option<PathBuf>,
        resume: Option<PathBuf>,
    },
    SignIn {
        email: String,
        password: Option<SecretString>,
    },
    Google {
        sign_up: bool,
    },
    SignOut,
    Dashboard,
    Interview {
        role: String,
        interview_type: InterviewType,
        tech: Vec<String>,
        duration: u32,
        profile_image: Option<PathBuf>,
    },
    Profile {
        name: Option<String>,
        email: Option<String>,
        image: Option<PathBuf>,
    },
}

/// Adapters and terminal feedback shared by the actions.
pub struct Services {
    pub identity: Arc<IdentityToolkit>,
    pub storage: Arc<ObjectStore>,
    pub backend: BackendClient,
    pub sessions: SessionStore,
    pub notifier: Arc<TerminalNotifier>,
    pub navigator: Arc<TerminalNavigator>,
}

impl Services {
    /// # Errors
    /// Fails when the HTTP client cannot be built.
    pub fn new(globals: &GlobalArgs) -> Result<Self> {
        let http = http_client()?;

        let mut identity =
            IdentityToolkit::new(http.clone(), &globals.identity_url, globals.api_key.clone());
        if let Some(client_id) = &globals.oauth_client_id {
            let mut device = DeviceFlow::new(http.clone(), client_id, Arc::new(ConsoleConsentPrompt))
                .with_endpoints(&globals.device_url, &globals.token_url);
            if let Some(secret) = &globals.oauth_client_secret {
                device = device.with_client_secret(secret.clone());
            }
            identity = identity.with_device_flow(device);
        }

        Ok(Self {
            identity: Arc::new(identity),
            storage: Arc::new(ObjectStore::new(
                http.clone(),
                &globals.storage_url,
                &globals.storage_bucket,
            )),
            backend: BackendClient::new(http, &globals.api_url),
            sessions: SessionStore::new(&globals.session_file),
            notifier: Arc::new(TerminalNotifier),
            navigator: Arc::new(TerminalNavigator::default()),
        })
    }

    /// Record store bound to the stored session, if any.
    ///
    /// # Errors
    /// Fails when the session file cannot be read.
    pub async fn records(&self) -> Result<Arc<dyn RecordStore>> {
        let backend = match self.sessions.load().await? {
            Some(session) => {
                debug!(email = %session.email, "using stored session");
                self.backend.clone().with_session(&session)
            }
            None => self.backend.clone(),
        };
        Ok(Arc::new(backend))
    }

    /// # Errors
    /// Fails when the session file cannot be read.
    pub async fn guard(&self) -> Result<SessionGuard> {
        Ok(SessionGuard::new(
            self.records().await?,
            self.navigator.clone(),
        ))
    }

    #[must_use]
    pub fn workflow(&self) -> WorkflowController {
        let exchanger = CredentialExchanger::new(
            self.identity.clone(),
            self.storage.clone(),
            Arc::new(self.backend.clone()),
        );
        WorkflowController::new(exchanger, self.notifier.clone(), self.navigator.clone())
    }
}

/// Run a task against the configured services
///
/// # Errors
/// Returns the task's failure after it has been reported to the user.
pub async fn handle(task: Task, globals: &GlobalArgs) -> Result<()> {
    let services = Services::new(globals)?;

    match task {
        Task::SignUp { .. } | Task::SignIn { .. } | Task::Google { .. } | Task::SignOut => {
            auth::handle(task, &services).await
        }
        Task::Dashboard => dashboard::handle(&services).await,
        Task::Interview { .. } => interview::handle(task, &services).await,
        Task::Profile { .. } => profile::handle(task, &services).await,
    }
}
