use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::form_field::{CustomFormField, FieldType};

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CustomFormFieldRequest {
    #[validate(length(min = 1, message = "label is required"))]
    pub label: String,
    /// TEXT, TEXTAREA, SINGLE_CHOICE or MULTI_CHOICE
    #[serde(alias = "fieldType")]
    pub field_type: String,
    #[serde(default)]
    pub options: Option<Vec<String>>,
    #[serde(default, alias = "isRequired")]
    pub is_required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CustomFormFieldResponse {
    pub id: Uuid,
    pub job_offer_id: Uuid,
    pub label: String,
    pub field_type: FieldType,
    pub options: Option<Vec<String>>,
    pub is_required: bool,
}

impl From<CustomFormField> for CustomFormFieldResponse {
    fn from(field: CustomFormField) -> Self {
        let options = field.field_type.is_choice().then_some(field.options);
        Self {
            id: field.id,
            job_offer_id: field.job_offer_id,
            label: field.label,
            field_type: field.field_type,
            options,
            is_required: field.is_required,
        }
    }
}
