//! Records read from the backend: the signed-in user and interview listings.

use crate::mockmate::client::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Signed-in user as returned by the record store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default, alias = "image", skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewRecord {
    pub id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub role: String,
    #[serde(rename = "type")]
    pub interview_type: String,
    #[serde(default)]
    pub techstack: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub finalized: bool,
}

/// Profile fields written back by the profile editor.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The user behind the current session, `None` when signed out.
    async fn current_user(&self) -> Result<Option<User>, AppError>;

    async fn interviews_by_user(&self, user_id: &str) -> Result<Vec<InterviewRecord>, AppError>;

    /// Latest interviews from other users, newest first.
    async fn latest_interviews(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<InterviewRecord>, AppError>;

    async fn update_profile(&self, user_id: &str, update: &ProfileUpdate)
        -> Result<User, AppError>;
}
