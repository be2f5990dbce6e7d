use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::str::FromStr;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::Error;

/// Delimiter used when a multi-choice answer is flattened into a single stored value.
pub const MULTI_CHOICE_DELIMITER: char = ';';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "form_field_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    Text,
    Textarea,
    SingleChoice,
    MultiChoice,
}

impl FieldType {
    pub fn is_choice(self) -> bool {
        matches!(self, FieldType::SingleChoice | FieldType::MultiChoice)
    }
}

impl FromStr for FieldType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match super::normalize_label(s).as_str() {
            "TEXT" => Ok(FieldType::Text),
            "TEXTAREA" => Ok(FieldType::Textarea),
            "SINGLE_CHOICE" | "RADIO" => Ok(FieldType::SingleChoice),
            "MULTI_CHOICE" | "CHECKBOX" => Ok(FieldType::MultiChoice),
            _ => Err(Error::InvalidArgument(format!("Invalid field type: {}", s))),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CustomFormField {
    pub id: Uuid,
    pub job_offer_id: Uuid,
    pub label: String,
    pub field_type: FieldType,
    pub options: Vec<String>,
    pub is_required: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewFormField {
    pub job_offer_id: Uuid,
    pub label: String,
    pub field_type: FieldType,
    pub options: Vec<String>,
    pub is_required: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn legacy_widget_names_map_to_choice_types() {
        assert_eq!("radio".parse::<FieldType>().unwrap(), FieldType::SingleChoice);
        assert_eq!("multi-choice".parse::<FieldType>().unwrap(), FieldType::MultiChoice);
        assert!(FieldType::MultiChoice.is_choice());
        assert!(!FieldType::Textarea.is_choice());
        assert!("date".parse::<FieldType>().is_err());
    }
}
