use axum::Json;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::dto::application_dto::{
    AiTextResponse, AnnotationTicket, ApplicationResponse, ApplicationUpload, CustomAnswerInput,
    CustomDataResponse, SelectTopRequest, UpdateNotesRequest, UpdateScoreRequest,
    UpdateStatusRequest,
};
use crate::dto::form_dto::{CustomFormFieldRequest, CustomFormFieldResponse};
use crate::dto::offer_dto::{JobOfferRequest, JobOfferResponse};
use crate::models::application::ApplicationStatus;
use crate::models::form_field::FieldType;
use crate::models::job_offer::{ContractType, OfferStatus};

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        super::offers::list_public_offers,
        super::offers::get_public_offer,
        super::offers::create_offer,
        super::offers::update_offer,
        super::offers::delete_offer,
        super::offers::list_my_offers,
        super::offers::get_offer_details,
        super::offers::list_custom_fields,
        super::offers::create_custom_field,
        super::offers::delete_custom_field,
        super::applications::apply_to_offer,
        super::applications::list_my_applications,
        super::applications::update_application_cv,
        super::applications::list_offer_applications,
        super::applications::update_status,
        super::applications::update_score,
        super::applications::update_notes,
        super::applications::select_top,
        super::applications::download_cv,
        super::applications::get_custom_data,
        super::annotations::analyze_offer,
        super::annotations::generate_summary,
        super::annotations::generate_interview_questions,
    ),
    components(schemas(
        JobOfferRequest,
        JobOfferResponse,
        ContractType,
        OfferStatus,
        CustomFormFieldRequest,
        CustomFormFieldResponse,
        FieldType,
        ApplicationResponse,
        ApplicationStatus,
        ApplicationUpload,
        CustomAnswerInput,
        CustomDataResponse,
        UpdateStatusRequest,
        UpdateScoreRequest,
        UpdateNotesRequest,
        SelectTopRequest,
        AiTextResponse,
        AnnotationTicket,
    )),
    modifiers(&BearerAuth),
    tags((name = "hiring-portal", description = "Job offers, applications and review workflow"))
)]
pub struct ApiDoc;

pub async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
