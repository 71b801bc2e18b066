//! Credential form state owned by one controller: field values, the staged
//! assets and the password visibility toggle.

use crate::mockmate::auth::{
    assets::{AssetKind, BinaryAsset, SelectedFile, StageError, StagedAssets},
    types::FormMode,
};
use secrecy::{ExposeSecret, SecretString};

#[derive(Debug)]
pub struct CredentialForm {
    mode: FormMode,
    name: String,
    email: String,
    password: SecretString,
    show_password: bool,
    assets: StagedAssets,
}

impl CredentialForm {
    #[must_use]
    pub fn new(mode: FormMode) -> Self {
        Self {
            mode,
            name: String::new(),
            email: String::new(),
            password: SecretString::default(),
            show_password: false,
            assets: StagedAssets::default(),
        }
    }

    #[must_use]
    pub fn with_assets(mut self, assets: StagedAssets) -> Self {
        self.assets = assets;
        self
    }

    #[must_use]
    pub const fn mode(&self) -> FormMode {
        self.mode
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub const fn password(&self) -> &SecretString {
        &self.password
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = SecretString::from(password.into());
    }

    pub fn toggle_password_visibility(&mut self) {
        self.show_password = !self.show_password;
    }

    #[must_use]
    pub const fn is_password_visible(&self) -> bool {
        self.show_password
    }

    /// What the password field shows: the value when visible, bullets otherwise.
    #[must_use]
    pub fn password_display(&self) -> String {
        let password = self.password.expose_secret();
        if self.show_password {
            password.to_string()
        } else {
            "•".repeat(password.chars().count())
        }
    }

    /// Stages a file on this form. Only sign-up forms carry assets.
    ///
    /// # Errors
    /// See `StagedAssets::stage`.
    pub async fn stage(&mut self, file: SelectedFile, kind: AssetKind) -> Result<&BinaryAsset, StageError> {
        self.assets.stage(file, kind).await
    }

    #[must_use]
    pub const fn assets(&self) -> &StagedAssets {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut StagedAssets {
        &mut self.assets
    }

    pub(crate) fn into_parts(self) -> FormParts {
        FormParts {
            name: self.name.trim().to_string(),
            email: normalize_email(&self.email),
            password: self.password,
            assets: self.assets,
        }
    }
}

/// Owned values moved out of a validated form for one submission.
pub(crate) struct FormParts {
    pub name: String,
    pub email: String,
    pub password: SecretString,
    pub assets: StagedAssets,
}

/// Normalizes emails for stable identity lookups and relay requests.
#[must_use]
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_visibility_toggle() {
        let mut form = CredentialForm::new(FormMode::SignIn);
        form.set_password("abc");
        assert_eq!(form.password_display(), "•••");

        form.toggle_password_visibility();
        assert!(form.is_password_visible());
        assert_eq!(form.password_display(), "abc");

        form.toggle_password_visibility();
        assert_eq!(form.password_display(), "•••");
    }

    #[test]
    fn test_into_parts_normalizes() {
        let mut form = CredentialForm::new(FormMode::SignUp);
        form.set_name("  Ann ");
        form.set_email(" Ann@X.com ");
        form.set_password("abcdef");

        let parts = form.into_parts();
        assert_eq!(parts.name, "Ann");
        assert_eq!(parts.email, "ann@x.com");
        assert_eq!(parts.password.expose_secret(), "abcdef");
        assert!(parts.assets.is_empty());
    }

    #[test]
    fn test_debug_hides_password() {
        let mut form = CredentialForm::new(FormMode::SignIn);
        form.set_password("hunter2");
        assert!(!format!("{form:?}").contains("hunter2"));
    }
}
