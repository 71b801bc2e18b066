use crate::mockmate::{
    client::{
        device::{DEFAULT_DEVICE_URL, DEFAULT_TOKEN_URL},
        identity::DEFAULT_IDENTITY_URL,
        normalize_base_url,
        storage::DEFAULT_STORAGE_URL,
    },
    session::default_session_path,
};
use anyhow::{anyhow, Context, Result};
use secrecy::SecretString;
use std::path::PathBuf;
use url::Url;

/// Used when the platform has no configuration directory.
const FALLBACK_SESSION_FILE: &str = ".mockmate-session.json";

/// Connection settings shared by every action.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub api_url: String,
    pub identity_url: String,
    pub api_key: SecretString,
    pub storage_url: String,
    pub storage_bucket: String,
    pub oauth_client_id: Option<String>,
    pub oauth_client_secret: Option<SecretString>,
    pub device_url: String,
    pub token_url: String,
    pub session_file: PathBuf,
}

impl GlobalArgs {
    /// Settings with the public service defaults and no credentials.
    ///
    /// # Errors
    /// Fails when `api_url` is blank or not an absolute URL.
    pub fn new(api_url: &str) -> Result<Self> {
        let api_url = normalize_base_url(api_url)
            .ok_or_else(|| anyhow!("missing required argument: --api-url"))?;
        Url::parse(&api_url).with_context(|| format!("invalid --api-url: {api_url}"))?;
        let session_file =
            default_session_path().unwrap_or_else(|| PathBuf::from(FALLBACK_SESSION_FILE));

        Ok(Self {
            api_url,
            identity_url: DEFAULT_IDENTITY_URL.to_string(),
            api_key: SecretString::default(),
            storage_url: DEFAULT_STORAGE_URL.to_string(),
            storage_bucket: String::new(),
            oauth_client_id: None,
            oauth_client_secret: None,
            device_url: DEFAULT_DEVICE_URL.to_string(),
            token_url: DEFAULT_TOKEN_URL.to_string(),
            session_file,
        })
    }

    pub fn set_api_key(&mut self, key: SecretString) {
        self.api_key = key;
    }
}
