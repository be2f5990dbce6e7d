use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::application::{Application, ApplicationCustomData, ApplicationStatus};
use crate::models::job_offer::JobOffer;
use crate::models::user::User;

/// One `{field_id, value}` pair submitted with an application. Multi-choice answers may be
/// sent as a JSON array of strings.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomAnswerInput {
    #[serde(alias = "fieldId")]
    pub field_id: Uuid,
    #[schema(value_type = Object)]
    pub value: JsonValue,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    pub status: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateScoreRequest {
    pub score: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpdateNotesRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SelectTopRequest {
    #[serde(alias = "topCount")]
    #[validate(range(max = 10000))]
    pub top_count: u32,
}

/// Application joined with the display fields of its applicant and offer. Nullable fields
/// stay nullable on the wire: a missing score serializes as `null`, never `0`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub job_offer_id: Uuid,
    pub job_offer_title: Option<String>,
    pub applicant_id: Uuid,
    pub applicant_name: Option<String>,
    pub applicant_email: Option<String>,
    pub applicant_phone_number: Option<String>,
    pub status: ApplicationStatus,
    pub cv_file_name: String,
    pub cv_file_type: String,
    pub submitted_at: DateTime<Utc>,
    pub cv_score: Option<i32>,
    pub candidate_message: Option<String>,
    pub internal_notes: Option<String>,
    pub ai_summary: Option<String>,
    pub ai_interview_questions: Option<String>,
}

impl ApplicationResponse {
    pub fn from_parts(
        application: Application,
        applicant: Option<&User>,
        offer: Option<&JobOffer>,
    ) -> Self {
        Self {
            id: application.id,
            job_offer_id: application.job_offer_id,
            job_offer_title: offer.map(|o| o.title.clone()),
            applicant_id: application.applicant_id,
            applicant_name: applicant.map(User::full_name),
            applicant_email: applicant.map(|u| u.email.clone()),
            applicant_phone_number: applicant.and_then(|u| u.phone_number.clone()),
            status: application.status,
            cv_file_name: application.cv_file_name,
            cv_file_type: application.cv_file_type,
            submitted_at: application.submitted_at,
            cv_score: application.cv_score,
            candidate_message: application.candidate_message,
            internal_notes: application.internal_notes,
            ai_summary: application.ai_summary,
            ai_interview_questions: application.ai_interview_questions,
        }
    }

    /// Strips recruiter-only fields before the view reaches a candidate.
    pub fn for_candidate(mut self) -> Self {
        self.internal_notes = None;
        self.ai_summary = None;
        self.ai_interview_questions = None;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomDataResponse {
    pub id: Uuid,
    /// `null` once the question has been removed from the form.
    pub field_id: Option<Uuid>,
    pub label: String,
    pub value: String,
}

impl From<ApplicationCustomData> for CustomDataResponse {
    fn from(data: ApplicationCustomData) -> Self {
        Self {
            id: data.id,
            field_id: data.form_field_id,
            label: data.field_label,
            value: data.value,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AiTextResponse {
    pub application_id: Uuid,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnnotationTicket {
    pub job_id: Uuid,
    pub offer_id: Uuid,
    pub status: String,
}

/// Multipart body of the apply and CV replacement endpoints. Documentation only; handlers
/// read the parts directly.
#[derive(Debug, ToSchema)]
pub struct ApplicationUpload {
    /// PDF, 5 MiB at most.
    #[schema(value_type = String, format = Binary)]
    pub cv: Vec<u8>,
    /// JSON array of `{"fieldId": "...", "value": ...}`; ignored on CV replacement.
    #[schema(rename = "customData")]
    pub custom_data: Option<String>,
}
