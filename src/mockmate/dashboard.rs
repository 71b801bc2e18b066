//! Home dashboard: the user's own interviews and interviews to take.

use crate::mockmate::{
    client::AppError,
    records::{InterviewRecord, RecordStore, User},
};
use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{error, instrument};

/// Number of latest interviews requested for the "take" section.
pub const LATEST_LIMIT: usize = 20;
pub const MAX_TECH_BADGES: usize = 3;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("Error fetching interviews")]
    Fetch(#[source] AppError),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InterviewCard {
    pub id: String,
    pub role: String,
    pub interview_type: String,
    pub techstack: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl InterviewCard {
    fn sample(id: &str, role: &str, techstack: &[&str], created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            role: role.to_string(),
            interview_type: "Technical".to_string(),
            techstack: techstack.iter().map(ToString::to_string).collect(),
            created_at,
        }
    }

    /// Tech badges shown on the card.
    #[must_use]
    pub fn badges(&self) -> &[String] {
        &self.techstack[..self.techstack.len().min(MAX_TECH_BADGES)]
    }

    #[must_use]
    pub fn is_sample(&self) -> bool {
        self.id.starts_with("sample-")
    }
}

impl From<InterviewRecord> for InterviewCard {
    fn from(record: InterviewRecord) -> Self {
        Self {
            id: record.id,
            role: record.role,
            interview_type: record.interview_type,
            techstack: record.techstack,
            created_at: record.created_at,
        }
    }
}

/// Cards offered when nobody else has published an interview yet.
#[must_use]
pub fn sample_cards(now: DateTime<Utc>) -> Vec<InterviewCard> {
    vec![
        InterviewCard::sample(
            "sample-frontend",
            "Frontend Developer",
            &["React", "JavaScript", "CSS"],
            now,
        ),
        InterviewCard::sample(
            "sample-backend",
            "Backend Developer",
            &["Node.js", "Express", "MongoDB"],
            now,
        ),
    ]
}

#[derive(Clone, Debug)]
pub struct Dashboard {
    pub user: User,
    pub your_interviews: Vec<InterviewCard>,
    pub take_interviews: Vec<InterviewCard>,
    pub has_past: bool,
    pub has_upcoming: bool,
}

impl Dashboard {
    /// Fetches both listings concurrently. Either failure fails the whole view.
    ///
    /// # Errors
    /// `DashboardError::Fetch` when either query fails.
    #[instrument(skip_all, fields(user = %user.id))]
    pub async fn load(records: &dyn RecordStore, user: User) -> Result<Self, DashboardError> {
        let (mine, latest) = tokio::try_join!(
            records.interviews_by_user(&user.id),
            records.latest_interviews(&user.id, LATEST_LIMIT),
        )
        .map_err(|err| {
            error!("Error fetching interviews: {err}");
            DashboardError::Fetch(err)
        })?;

        let has_past = !mine.is_empty();
        let has_upcoming = !latest.is_empty();
        let take_interviews = if has_upcoming {
            latest.into_iter().map(InterviewCard::from).collect()
        } else {
            sample_cards(Utc::now())
        };

        Ok(Self {
            user,
            your_interviews: mine.into_iter().map(InterviewCard::from).collect(),
            take_interviews,
            has_past,
            has_upcoming,
        })
    }
}
