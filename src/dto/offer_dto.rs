use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::job_offer::{ContractType, JobOffer, OfferStatus};
use crate::models::user::User;

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct JobOfferRequest {
    #[validate(length(min = 5, message = "title must contain at least 5 characters"))]
    pub title: String,
    #[validate(length(min = 20, message = "description must contain at least 20 characters"))]
    pub description: String,
    #[validate(length(min = 1, message = "location is required"))]
    pub location: String,
    /// PERMANENT, FIXED_TERM, INTERNSHIP, APPRENTICESHIP or FREELANCE
    #[serde(alias = "contractType")]
    pub contract_type: String,
    /// DRAFT, PUBLISHED or ARCHIVED
    pub status: String,
    #[schema(value_type = Option<String>, format = Date)]
    pub deadline: Option<NaiveDate>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JobOfferResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub contract_type: ContractType,
    pub status: OfferStatus,
    #[schema(value_type = Option<String>, format = Date)]
    pub deadline: Option<NaiveDate>,
    pub recruiter_id: Uuid,
    pub recruiter_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobOfferResponse {
    pub fn from_parts(offer: JobOffer, recruiter: Option<&User>) -> Self {
        Self {
            id: offer.id,
            title: offer.title,
            description: offer.description,
            location: offer.location,
            contract_type: offer.contract_type,
            status: offer.status,
            deadline: offer.deadline,
            recruiter_id: offer.recruiter_id,
            recruiter_name: recruiter.map(User::full_name),
            created_at: offer.created_at,
            updated_at: offer.updated_at,
        }
    }
}
