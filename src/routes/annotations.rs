use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    dto::{
        application_dto::{AiTextResponse, AnnotationTicket},
        ApiResponse,
    },
    error::Result,
    models::user::Role,
    services::authorization::Actor,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/offers/{id}/ai-analysis",
    params(("id" = Uuid, Path, description = "Offer ID")),
    responses(
        (status = 202, description = "Batch scoring queued", body = AnnotationTicket),
        (status = 403, description = "Caller does not own the offer"),
        (status = 409, description = "Queue is full")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn analyze_offer(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    let ticket = state.annotation_queue.enqueue(id, &actor).await?;
    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::ok("AI analysis started", ticket)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/ai-summary",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Summary, generated on first call", body = AiTextResponse),
        (status = 403, description = "Caller is neither the applicant nor the recruiter"),
        (status = 504, description = "Text generation timed out")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn generate_summary(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let summary = state.annotation_service.generate_summary(id, &actor).await?;
    Ok(Json(ApiResponse::ok("AI summary", summary)))
}

#[utoipa::path(
    post,
    path = "/api/applications/{id}/ai-questions",
    params(("id" = Uuid, Path, description = "Application ID")),
    responses(
        (status = 200, description = "Interview questions, generated on first call", body = AiTextResponse),
        (status = 403, description = "Caller is neither the applicant nor the recruiter")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn generate_interview_questions(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let questions = state
        .annotation_service
        .generate_interview_questions(id, &actor)
        .await?;
    Ok(Json(ApiResponse::ok("AI interview questions", questions)))
}
