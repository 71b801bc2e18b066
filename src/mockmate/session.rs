//! Session persistence and the authentication check used at navigation
//! boundaries.
//!
//! `SessionStore` keeps the backend session between CLI runs in a JSON file
//! readable only by its owner. `SessionGuard` makes the one record store query
//! a protected view needs and redirects when the answer is not the expected one.

use crate::mockmate::{
    auth::{types::AppSession, Navigator, Route},
    client::AppError,
    records::{RecordStore, User},
};
use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

const SESSION_DIR: &str = "mockmate";
const SESSION_FILE: &str = "session.json";
#[cfg(unix)]
const SESSION_FILE_MODE: u32 = 0o600;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("You are not signed in")]
    SignedOut,
    #[error(transparent)]
    Store(#[from] AppError),
    #[error("Session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Session file is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Default session file under the user's configuration directory.
#[must_use]
pub fn default_session_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(SESSION_DIR).join(SESSION_FILE))
}

#[derive(Clone, Debug)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Io {
            path: self.path.clone(),
            source,
        }
    }

    /// Reads the stored session, `None` when no file exists.
    ///
    /// # Errors
    /// Fails when the file cannot be read or does not hold a session.
    pub async fn load(&self) -> Result<Option<AppSession>, SessionError> {
        let contents = match tokio::fs::read(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(self.io_error(err)),
        };

        Ok(Some(serde_json::from_slice(&contents)?))
    }

    /// Writes the session, creating parent directories as needed.
    ///
    /// # Errors
    /// Fails when the directory or file cannot be written.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub async fn save(&self, session: &AppSession) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| self.io_error(err))?;
        }

        let contents = serde_json::to_vec_pretty(session)?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(SESSION_FILE_MODE);

        let mut file = options
            .open(&self.path)
            .await
            .map_err(|err| self.io_error(err))?;

        // mode only applies on creation; tighten a file left by an older run
        #[cfg(unix)]
        {
            use std::{fs::Permissions, os::unix::fs::PermissionsExt};
            file.set_permissions(Permissions::from_mode(SESSION_FILE_MODE))
                .await
                .map_err(|err| self.io_error(err))?;
        }

        file.write_all(&contents)
            .await
            .map_err(|err| self.io_error(err))?;
        file.flush().await.map_err(|err| self.io_error(err))?;

        debug!("session saved");
        Ok(())
    }

    /// Removes the stored session. Returns whether one existed.
    ///
    /// # Errors
    /// Fails when an existing file cannot be removed.
    pub async fn clear(&self) -> Result<bool, SessionError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(self.io_error(err)),
        }
    }
}

/// Authentication check for protected and public-only views.
pub struct SessionGuard {
    records: Arc<dyn RecordStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionGuard {
    pub fn new(records: Arc<dyn RecordStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { records, navigator }
    }

    /// Returns the signed-in user, or navigates to sign-in.
    ///
    /// # Errors
    /// `SignedOut` after redirecting, `Store` when the query fails.
    pub async fn require_user(&self) -> Result<User, SessionError> {
        match self.records.current_user().await? {
            Some(user) => Ok(user),
            None => {
                self.navigator.navigate(Route::SignIn);
                Err(SessionError::SignedOut)
            }
        }
    }

    /// Sign-in and sign-up views: a signed-in user is sent home. Returns
    /// `true` when a redirect happened.
    ///
    /// # Errors
    /// `Store` when the query fails.
    pub async fn redirect_if_signed_in(&self) -> Result<bool, SessionError> {
        if self.records.current_user().await?.is_some() {
            self.navigator.navigate(Route::Home);
            return Ok(true);
        }
        Ok(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mockmate::records::{InterviewRecord, ProfileUpdate};
    use async_trait::async_trait;
    use secrecy::ExposeSecret;
    use std::sync::Mutex;
    use tempfile::TempDir;

    struct FixedUser(Option<User>);

    #[async_trait]
    impl RecordStore for FixedUser {
        async fn current_user(&self) -> Result<Option<User>, AppError> {
            Ok(self.0.clone())
        }

        async fn interviews_by_user(&self, _: &str) -> Result<Vec<InterviewRecord>, AppError> {
            Ok(Vec::new())
        }

        async fn latest_interviews(
            &self,
            _: &str,
            _: usize,
        ) -> Result<Vec<InterviewRecord>, AppError> {
            Ok(Vec::new())
        }

        async fn update_profile(&self, _: &str, _: &ProfileUpdate) -> Result<User, AppError> {
            Err(AppError::Config("read only".to_string()))
        }
    }

    #[derive(Default)]
    struct Routes(Mutex<Vec<Route>>);

    impl Navigator for Routes {
        fn navigate(&self, route: Route) {
            self.0.lock().expect("lock").push(route);
        }
    }

    fn ann() -> User {
        User {
            id: "u1".to_string(),
            name: "Ann".to_string(),
            email: "ann@x.com".to_string(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_require_user_redirects_when_signed_out() {
        let routes = Arc::new(Routes::default());
        let guard = SessionGuard::new(Arc::new(FixedUser(None)), routes.clone());

        assert!(matches!(
            guard.require_user().await,
            Err(SessionError::SignedOut)
        ));
        assert_eq!(*routes.0.lock().expect("lock"), vec![Route::SignIn]);
    }

    #[tokio::test]
    async fn test_redirect_if_signed_in() {
        let routes = Arc::new(Routes::default());
        let guard = SessionGuard::new(Arc::new(FixedUser(Some(ann()))), routes.clone());

        assert!(guard.redirect_if_signed_in().await.expect("query"));
        assert_eq!(guard.require_user().await.expect("user"), ann());
        assert_eq!(*routes.0.lock().expect("lock"), vec![Route::Home]);
    }

    #[tokio::test]
    async fn test_session_store_lifecycle() {
        let dir = TempDir::new().expect("tempdir");
        let store = SessionStore::new(dir.path().join("nested").join(SESSION_FILE));

        assert!(store.load().await.expect("load").is_none());
        assert!(!store.clear().await.expect("clear"));

        store
            .save(&AppSession::new("cookie-1", "ann@x.com"))
            .await
            .expect("save");
        let loaded = store.load().await.expect("load").expect("session");
        assert_eq!(loaded.value.expose_secret(), "cookie-1");
        assert_eq!(loaded.email, "ann@x.com");

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = std::fs::metadata(store.path())
                .expect("metadata")
                .permissions()
                .mode();
            assert_eq!(mode & 0o777, 0o600);
        }

        assert!(store.clear().await.expect("clear"));
        assert!(store.load().await.expect("load").is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_save_tightens_existing_file() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(SESSION_FILE);
        std::fs::write(&path, b"{ stale session left by an older release }").expect("write");
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644))
            .expect("chmod");

        let store = SessionStore::new(&path);
        store
            .save(&AppSession::new("cookie-2", "ann@x.com"))
            .await
            .expect("save");

        let mode = std::fs::metadata(&path)
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
        let loaded = store.load().await.expect("load").expect("session");
        assert_eq!(loaded.value.expose_secret(), "cookie-2");
    }

    #[tokio::test]
    async fn test_corrupt_session_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join(SESSION_FILE);
        std::fs::write(&path, b"not json").expect("write");

        assert!(matches!(
            SessionStore::new(path).load().await,
            Err(SessionError::Corrupt(_))
        ));
    }
}
