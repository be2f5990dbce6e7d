use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "application_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Pending,
    Reviewed,
    InterviewScheduled,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    /// Statuses still eligible for bulk ranking.
    pub fn is_pre_decision(self) -> bool {
        matches!(self, ApplicationStatus::Pending | ApplicationStatus::Reviewed)
    }
}

impl FromStr for ApplicationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match super::normalize_label(s).as_str() {
            "PENDING" => Ok(ApplicationStatus::Pending),
            "REVIEWED" => Ok(ApplicationStatus::Reviewed),
            "INTERVIEW_SCHEDULED" => Ok(ApplicationStatus::InterviewScheduled),
            "ACCEPTED" => Ok(ApplicationStatus::Accepted),
            "REJECTED" => Ok(ApplicationStatus::Rejected),
            _ => Err(Error::InvalidArgument(format!("Invalid status: {}", s))),
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ApplicationStatus::Pending => "PENDING",
            ApplicationStatus::Reviewed => "REVIEWED",
            ApplicationStatus::InterviewScheduled => "INTERVIEW_SCHEDULED",
            ApplicationStatus::Accepted => "ACCEPTED",
            ApplicationStatus::Rejected => "REJECTED",
        };
        f.write_str(label)
    }
}

/// Application row without the CV payload; the blob is loaded separately through
/// [`CvDocument`] when a caller actually needs it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Application {
    pub id: Uuid,
    pub applicant_id: Uuid,
    pub job_offer_id: Uuid,
    pub status: ApplicationStatus,
    pub cv_file_name: String,
    pub cv_file_type: String,
    pub cv_size: i64,
    pub submitted_at: DateTime<Utc>,
    pub cv_score: Option<i32>,
    pub candidate_message: Option<String>,
    pub internal_notes: Option<String>,
    pub ai_summary: Option<String>,
    pub ai_interview_questions: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct CvDocument {
    pub file_name: String,
    pub file_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct NewApplication {
    pub applicant_id: Uuid,
    pub job_offer_id: Uuid,
    pub cv: CvDocument,
}

/// A candidate's answer to one custom question. `form_field_id` becomes `None` once the
/// recruiter deletes the field; `field_label` keeps the question text for display.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicationCustomData {
    pub id: Uuid,
    pub application_id: Uuid,
    pub form_field_id: Option<Uuid>,
    pub field_label: String,
    pub value: String,
}

#[derive(Debug, Clone)]
pub struct NewCustomAnswer {
    pub form_field_id: Uuid,
    pub field_label: String,
    pub value: String,
}

/// A write to the review columns of one application. Each variant touches only its own
/// columns, so concurrent writers to other columns are never reverted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationUpdate {
    /// Sets the status and replaces the candidate message.
    Status {
        status: ApplicationStatus,
        message: Option<String>,
    },
    /// Ranking outcome. Applies only while the stored status is still pre-decision, and
    /// writes `default_message` only where no message is stored yet.
    Decision {
        status: ApplicationStatus,
        default_message: Option<String>,
    },
    Score(i32),
    InternalNotes(Option<String>),
    AiSummary(String),
    AiInterviewQuestions(String),
}

impl ApplicationUpdate {
    /// Applies the update to an in-memory row. Returns `false` when a decision no longer
    /// applies because the row has left the pre-decision states.
    pub fn apply_to(&self, application: &mut Application) -> bool {
        match self {
            ApplicationUpdate::Status { status, message } => {
                application.status = *status;
                application.candidate_message = message.clone();
            }
            ApplicationUpdate::Decision {
                status,
                default_message,
            } => {
                if !application.status.is_pre_decision() {
                    return false;
                }
                application.status = *status;
                if application.candidate_message.is_none() {
                    application.candidate_message = default_message.clone();
                }
            }
            ApplicationUpdate::Score(score) => application.cv_score = Some(*score),
            ApplicationUpdate::InternalNotes(notes) => application.internal_notes = notes.clone(),
            ApplicationUpdate::AiSummary(text) => application.ai_summary = Some(text.clone()),
            ApplicationUpdate::AiInterviewQuestions(text) => {
                application.ai_interview_questions = Some(text.clone())
            }
        }
        true
    }
}
