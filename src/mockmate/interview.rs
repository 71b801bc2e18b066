//! Interview setup: the choices made before handing over to the interview agent.

use crate::mockmate::{
    auth::{
        assets::DEFAULT_MAX_ASSET_BYTES, AssetKind, BinaryAsset, SelectedFile, StageError,
    },
    records::User,
};
use serde::Serialize;
use std::{fmt, str::FromStr};
use thiserror::Error;
use uuid::Uuid;

pub const DURATION_OPTIONS: [u32; 6] = [10, 15, 20, 30, 45, 60];
pub const DEFAULT_DURATION: u32 = 15;
pub const TECH_OPTIONS: [&str; 8] = [
    "React",
    "Node.js",
    "TypeScript",
    "Python",
    "Java",
    "AWS",
    "SQL",
    "MongoDB",
];
const GUEST_NAME: &str = "Guest";

#[derive(Debug, Error)]
pub enum SetupError {
    #[error("Please specify your role")]
    RoleMissing,
    #[error("Unknown interview type: {0}")]
    UnknownType(String),
    #[error("Unknown technology: {0}")]
    UnknownTech(String),
    #[error("Duration of {0} minutes is not offered")]
    UnsupportedDuration(u32),
    #[error(transparent)]
    Photo(#[from] StageError),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub enum InterviewType {
    #[default]
    Technical,
    #[serde(rename = "HR")]
    Hr,
    Managerial,
    Behavioral,
}

impl InterviewType {
    pub const ALL: [Self; 4] = [Self::Technical, Self::Hr, Self::Managerial, Self::Behavioral];

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Technical => "Technical",
            Self::Hr => "HR",
            Self::Managerial => "Managerial",
            Self::Behavioral => "Behavioral",
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for InterviewType {
    type Err = SetupError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| SetupError::UnknownType(value.to_string()))
    }
}

/// What the interview agent receives.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewPlan {
    pub id: Uuid,
    pub user_name: String,
    pub user_id: Option<String>,
    pub interview_type: InterviewType,
    pub role: String,
    pub tech_stack: Vec<String>,
    pub duration_minutes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_image: Option<String>,
}

#[derive(Debug)]
pub struct InterviewSetup {
    interview_type: InterviewType,
    role: String,
    tech_stack: Vec<String>,
    duration: u32,
    photo: Option<BinaryAsset>,
}

impl Default for InterviewSetup {
    fn default() -> Self {
        Self {
            interview_type: InterviewType::default(),
            role: String::new(),
            tech_stack: Vec::new(),
            duration: DEFAULT_DURATION,
            photo: None,
        }
    }
}

impl InterviewSetup {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_type(&mut self, interview_type: InterviewType) {
        self.interview_type = interview_type;
    }

    pub fn set_role(&mut self, role: impl Into<String>) {
        self.role = role.into();
    }

    /// Adds the technology, or removes it when already selected. Selection
    /// order is kept. Returns whether it is selected afterwards.
    ///
    /// # Errors
    /// `UnknownTech` for values outside the offered options.
    pub fn toggle_tech(&mut self, tech: &str) -> Result<bool, SetupError> {
        let option = TECH_OPTIONS
            .iter()
            .find(|option| option.eq_ignore_ascii_case(tech.trim()))
            .ok_or_else(|| SetupError::UnknownTech(tech.to_string()))?;

        if let Some(index) = self.tech_stack.iter().position(|item| item == option) {
            self.tech_stack.remove(index);
            Ok(false)
        } else {
            self.tech_stack.push((*option).to_string());
            Ok(true)
        }
    }

    /// # Errors
    /// `UnsupportedDuration` for values outside the offered options.
    pub fn set_duration(&mut self, minutes: u32) -> Result<(), SetupError> {
        if !DURATION_OPTIONS.contains(&minutes) {
            return Err(SetupError::UnsupportedDuration(minutes));
        }
        self.duration = minutes;
        Ok(())
    }

    /// Reads an image for the preview shown during setup.
    ///
    /// # Errors
    /// Non-image files and unreadable paths are rejected.
    pub async fn stage_photo(&mut self, file: SelectedFile) -> Result<&BinaryAsset, SetupError> {
        let asset = BinaryAsset::load(file, AssetKind::Profile, DEFAULT_MAX_ASSET_BYTES).await?;
        Ok(&*self.photo.insert(asset))
    }

    #[must_use]
    pub const fn interview_type(&self) -> InterviewType {
        self.interview_type
    }

    #[must_use]
    pub fn tech_stack(&self) -> &[String] {
        &self.tech_stack
    }

    #[must_use]
    pub const fn duration(&self) -> u32 {
        self.duration
    }

    #[must_use]
    pub fn photo_preview(&self) -> Option<&str> {
        self.photo.as_ref().map(BinaryAsset::preview_encoding)
    }

    /// Builds the plan handed to the interview agent.
    ///
    /// # Errors
    /// `RoleMissing` when no role was entered.
    pub fn start(&self, user: Option<&User>) -> Result<InterviewPlan, SetupError> {
        let role = self.role.trim();
        if role.is_empty() {
            return Err(SetupError::RoleMissing);
        }

        Ok(InterviewPlan {
            id: Uuid::new_v4(),
            user_name: user
                .map(|user| user.name.trim())
                .filter(|name| !name.is_empty())
                .unwrap_or(GUEST_NAME)
                .to_string(),
            user_id: user.map(|user| user.id.clone()),
            interview_type: self.interview_type,
            role: role.to_string(),
            tech_stack: self.tech_stack.clone(),
            duration_minutes: self.duration,
            profile_image: self.photo_preview().map(str::to_string),
        })
    }
}
