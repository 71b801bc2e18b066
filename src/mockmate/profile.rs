//! Profile view with an edit mode. Edits stay local to the draft until
//! `save`; `cancel` returns to the last saved user.

use crate::mockmate::{
    auth::{
        form::normalize_email,
        validator::{valid_email, FieldError, FormField, ValidationReport},
        AssetKind, BinaryAsset, SelectedFile, StageError, StagedAssets,
    },
    records::{ProfileUpdate, User},
};
use thiserror::Error;

/// Avatar shown when the user has no picture.
pub const DEFAULT_AVATAR: &str = "/profile-user.svg";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("Profile is not being edited")]
    NotEditing,
    #[error("{0}")]
    Invalid(ValidationReport),
    #[error(transparent)]
    Image(#[from] StageError),
}

/// A committed edit ready to be written back. A new image, when present, must
/// be uploaded before the update is sent.
#[derive(Debug)]
pub struct ProfileSave {
    pub update: ProfileUpdate,
    pub image: Option<BinaryAsset>,
}

#[derive(Debug)]
pub struct ProfileEditor {
    saved: User,
    draft: User,
    editing: bool,
    image: StagedAssets,
}

impl ProfileEditor {
    pub fn new(user: User) -> Self {
        Self {
            draft: user.clone(),
            saved: user,
            editing: false,
            image: StagedAssets::default(),
        }
    }

    #[must_use]
    pub const fn is_editing(&self) -> bool {
        self.editing
    }

    /// The user as currently displayed: the draft while editing.
    #[must_use]
    pub const fn user(&self) -> &User {
        &self.draft
    }

    #[must_use]
    pub fn avatar(&self) -> &str {
        self.image
            .get(AssetKind::Profile)
            .map(BinaryAsset::preview_encoding)
            .or(self.draft.image_url.as_deref())
            .filter(|url| !url.is_empty())
            .unwrap_or(DEFAULT_AVATAR)
    }

    pub fn begin_edit(&mut self) {
        self.editing = true;
    }

    /// # Errors
    /// `NotEditing` outside edit mode.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), ProfileError> {
        self.ensure_editing()?;
        self.draft.name = name.into();
        Ok(())
    }

    /// # Errors
    /// `NotEditing` outside edit mode.
    pub fn set_email(&mut self, email: impl Into<String>) -> Result<(), ProfileError> {
        self.ensure_editing()?;
        self.draft.email = email.into();
        Ok(())
    }

    /// Stages a new picture; only its preview is shown until the edit is saved.
    ///
    /// # Errors
    /// `NotEditing` outside edit mode, `Image` for rejected files.
    pub async fn stage_image(&mut self, file: SelectedFile) -> Result<&BinaryAsset, ProfileError> {
        self.ensure_editing()?;
        Ok(self.image.stage(file, AssetKind::Profile).await?)
    }

    /// Commits the draft and leaves edit mode.
    ///
    /// # Errors
    /// `NotEditing` outside edit mode, `Invalid` when the draft has a blank
    /// name or a malformed email. The draft is kept on error.
    pub fn save(&mut self) -> Result<ProfileSave, ProfileError> {
        self.ensure_editing()?;

        let name = self.draft.name.trim().to_string();
        let email = normalize_email(&self.draft.email);
        let mut report = ValidationReport::default();
        if name.is_empty() {
            report.push(FieldError::new(FormField::Name, "Name is required"));
        }
        if !valid_email(&email) {
            report.push(FieldError::new(FormField::Email, "Invalid email address"));
        }
        if !report.is_valid() {
            return Err(ProfileError::Invalid(report));
        }

        self.draft.name = name.clone();
        self.draft.email = email.clone();
        self.saved = self.draft.clone();
        self.editing = false;

        Ok(ProfileSave {
            update: ProfileUpdate {
                name,
                email,
                image_url: self.saved.image_url.clone(),
            },
            image: self.image.clear(AssetKind::Profile),
        })
    }

    /// Drops the draft and any staged picture.
    pub fn cancel(&mut self) {
        self.draft = self.saved.clone();
        self.image.clear(AssetKind::Profile);
        self.editing = false;
    }

    /// Replaces the saved user with what the record store returned.
    pub fn apply_saved(&mut self, user: User) {
        self.draft = user.clone();
        self.saved = user;
    }

    fn ensure_editing(&self) -> Result<(), ProfileError> {
        if self.editing {
            Ok(())
        } else {
            Err(ProfileError::NotEditing)
        }
    }
}
