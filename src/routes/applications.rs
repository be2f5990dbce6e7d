use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json},
};
use bytes::Bytes;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        application_dto::{
            ApplicationResponse, ApplicationUpload, CustomAnswerInput, CustomDataResponse,
            SelectTopRequest, UpdateNotesRequest, UpdateScoreRequest, UpdateStatusRequest,
        },
        ApiResponse,
    },
    error::Result,
    models::user::Role,
    services::{authorization::Actor, intake_service::CvUpload},
    AppState,
};

struct ApplicationForm {
    cv: Option<CvUpload>,
    custom_data: Vec<CustomAnswerInput>,
}

async fn read_application_form(mut multipart: Multipart) -> Result<ApplicationForm> {
    let mut form = ApplicationForm {
        cv: None,
        custom_data: Vec::new(),
    };

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "cv" => {
                let file_name = field.file_name().map(str::to_string);
                let mime_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?;
                form.cv = Some(CvUpload {
                    data: data.to_vec(),
                    file_name,
                    mime_type,
                });
            }
            "customData" | "custom_data" => {
                let raw = field.text().await?;
                if !raw.trim().is_empty() {
                    form.custom_data = serde_json::from_str(&raw)?;
                }
            }
            other => tracing::debug!(field = other, "ignoring unknown multipart field"),
        }
    }
    Ok(form)
}

fn missing_cv() -> CvUpload {
    CvUpload {
        data: Vec::new(),
        file_name: None,
        mime_type: None,
    }
}

#[utoipa::path(
    post,
    path = "/api/applications/apply/{offer_id}",
    params(("offer_id" = Uuid, Path, description = "Offer ID")),
    request_body(content = ApplicationUpload, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Application submitted", body = ApplicationResponse),
        (status = 400, description = "Invalid CV, malformed answers or duplicate application"),
        (status = 403, description = "Offer not published or answer for another offer's field"),
        (status = 404, description = "Offer or form field not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn apply_to_offer(
    State(state): State<AppState>,
    actor: Actor,
    Path(offer_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    actor.require(Role::Candidate)?;
    let form = read_application_form(multipart).await?;
    let application = state
        .intake_service
        .submit(
            offer_id,
            &actor,
            form.cv.unwrap_or_else(missing_cv),
            form.custom_data,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Application submitted", application)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/applications/mine",
    responses((status = 200, description = "Applications of the calling candidate", body = [ApplicationResponse])),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list_my_applications(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse> {
    actor.require(Role::Candidate)?;
    let applications = state.application_service.list_for_candidate(&actor).await?;
    Ok(Json(applications))
}

#[utoipa::path(
    put,
    path = "/api/applications/{id}/cv",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body(content = ApplicationUpload, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "CV replaced", body = ApplicationResponse),
        (status = 403, description = "Caller is not the applicant"),
        (status = 409, description = "Application already decided")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn update_application_cv(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<impl IntoResponse> {
    actor.require(Role::Candidate)?;
    let form = read_application_form(multipart).await?;
    let application = state
        .intake_service
        .update_cv(id, &actor, form.cv.unwrap_or_else(missing_cv))
        .await?;
    Ok(Json(ApiResponse::ok("CV updated", application)))
}

#[utoipa::path(
    get,
    path = "/api/applications/offer/{id}",
    params(("id" = Uuid, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Applications in arrival order", body = [ApplicationResponse]),
        (status = 403, description = "Caller does not own the offer")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list_offer_applications(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    let applications = state.application_service.list_for_offer(id, &actor).await?;
    Ok(Json(applications))
}

#[utoipa::path(
    put,
    path = "/api/applications/{id}/status",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApplicationResponse),
        (status = 400, description = "Unknown status"),
        (status = 403, description = "Caller does not own the offer")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    let application = state
        .application_service
        .set_status(id, &payload.status, payload.message, &actor)
        .await?;
    Ok(Json(ApiResponse::ok("Status updated", application)))
}

#[utoipa::path(
    put,
    path = "/api/applications/{id}/score",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateScoreRequest,
    responses(
        (status = 200, description = "Score stored", body = ApplicationResponse),
        (status = 400, description = "Score outside 0..=100")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn update_score(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateScoreRequest>,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    let application = state
        .application_service
        .set_score(id, payload.score, &actor)
        .await?;
    Ok(Json(ApiResponse::ok("Score updated", application)))
}

#[utoipa::path(
    put,
    path = "/api/applications/{id}/notes",
    params(("id" = Uuid, Path, description = "Application ID")),
    request_body = UpdateNotesRequest,
    responses((status = 200, description = "Notes stored or cleared", body = ApplicationResponse)),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn update_notes(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateNotesRequest>,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    let application = state
        .application_service
        .set_internal_notes(id, payload.notes, &actor)
        .await?;
    Ok(Json(ApiResponse::ok("Notes updated", application)))
}

#[utoipa::path(
    post,
    path = "/api/offers/{id}/select-top",
    params(("id" = Uuid, Path, description = "Offer ID")),
    request_body = SelectTopRequest,
    responses(
        (status = 200, description = "Full ranking after selection", body = [ApplicationResponse]),
        (status = 409, description = "Deadline not reached yet")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn select_top(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<SelectTopRequest>,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    payload.validate()?;
    let ranked = state
        .application_service
        .rank_and_select_top(id, payload.top_count as usize, &actor)
        .await?;
    Ok(Json(ApiResponse::ok("Top applications selected", ranked)))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/cv",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "CV file with its original name and MIME type"),
        (status = 403, description = "Caller is neither the applicant nor the recruiter")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn download_cv(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let cv = state.application_service.get_cv(id, &actor).await?;
    let disposition = format!(
        "attachment; filename=\"{}\"",
        cv.file_name.replace(['"', '\r', '\n'], "")
    );
    Ok((
        [
            (header::CONTENT_TYPE, cv.file_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        Bytes::from(cv.data),
    ))
}

#[utoipa::path(
    get,
    path = "/api/applications/{id}/custom-data",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Answers with their question label", body = [CustomDataResponse]),
        (status = 403, description = "Caller is neither the applicant nor the recruiter")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get_custom_data(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let answers = state.application_service.get_custom_data(id, &actor).await?;
    Ok(Json(answers))
}
