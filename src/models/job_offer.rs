use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "contract_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractType {
    Permanent,
    FixedTerm,
    Internship,
    Apprenticeship,
    Freelance,
}

impl FromStr for ContractType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match super::normalize_label(s).as_str() {
            "PERMANENT" | "CDI" => Ok(ContractType::Permanent),
            "FIXED_TERM" | "CDD" => Ok(ContractType::FixedTerm),
            "INTERNSHIP" | "STAGE" => Ok(ContractType::Internship),
            "APPRENTICESHIP" | "ALTERNANCE" => Ok(ContractType::Apprenticeship),
            "FREELANCE" => Ok(ContractType::Freelance),
            _ => Err(Error::InvalidArgument(format!("Invalid contract type: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "offer_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OfferStatus {
    Draft,
    Published,
    Archived,
}

impl FromStr for OfferStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match super::normalize_label(s).as_str() {
            "DRAFT" => Ok(OfferStatus::Draft),
            "PUBLISHED" => Ok(OfferStatus::Published),
            "ARCHIVED" => Ok(OfferStatus::Archived),
            _ => Err(Error::InvalidArgument(format!("Invalid offer status: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobOffer {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub location: String,
    pub contract_type: ContractType,
    pub status: OfferStatus,
    pub deadline: Option<NaiveDate>,
    pub recruiter_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobOffer {
    pub fn is_published(&self) -> bool {
        self.status == OfferStatus::Published
    }
}

#[derive(Debug, Clone)]
pub struct NewJobOffer {
    pub title: String,
    pub description: String,
    pub location: String,
    pub contract_type: ContractType,
    pub status: OfferStatus,
    pub deadline: Option<NaiveDate>,
    pub recruiter_id: Uuid,
}
