use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use uuid::Uuid;

use crate::{
    dto::{
        form_dto::{CustomFormFieldRequest, CustomFormFieldResponse},
        offer_dto::{JobOfferRequest, JobOfferResponse},
        ApiResponse,
    },
    error::Result,
    models::user::Role,
    services::authorization::Actor,
    AppState,
};

#[utoipa::path(
    get,
    path = "/api/offers",
    responses(
        (status = 200, description = "Published offers, newest first", body = [JobOfferResponse])
    )
)]
#[axum::debug_handler]
pub async fn list_public_offers(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let offers = state.offer_service.list_public().await?;
    Ok(Json(offers))
}

#[utoipa::path(
    get,
    path = "/api/offers/{id}",
    params(("id" = Uuid, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Published offer", body = JobOfferResponse),
        (status = 404, description = "Offer missing or not published")
    )
)]
#[axum::debug_handler]
pub async fn get_public_offer(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let offer = state.offer_service.get_public(id).await?;
    Ok(Json(offer))
}

#[utoipa::path(
    post,
    path = "/api/offers",
    request_body = JobOfferRequest,
    responses(
        (status = 201, description = "Offer created", body = JobOfferResponse),
        (status = 400, description = "Invalid payload"),
        (status = 403, description = "Caller is not a recruiter")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create_offer(
    State(state): State<AppState>,
    actor: Actor,
    Json(payload): Json<JobOfferRequest>,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    let offer = state.offer_service.create(payload, &actor).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Offer created", offer)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/offers/{id}",
    params(("id" = Uuid, Path, description = "Offer ID")),
    request_body = JobOfferRequest,
    responses(
        (status = 200, description = "Offer updated", body = JobOfferResponse),
        (status = 403, description = "Caller does not own the offer"),
        (status = 404, description = "Offer not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn update_offer(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<JobOfferRequest>,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    let offer = state.offer_service.update(id, payload, &actor).await?;
    Ok(Json(ApiResponse::ok("Offer updated", offer)))
}

#[utoipa::path(
    delete,
    path = "/api/offers/{id}",
    params(("id" = Uuid, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer deleted with its fields and applications"),
        (status = 403, description = "Caller does not own the offer"),
        (status = 404, description = "Offer not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn delete_offer(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    state.offer_service.delete(id, &actor).await?;
    Ok(Json(ApiResponse::ok("Offer deleted", ())))
}

#[utoipa::path(
    get,
    path = "/api/offers/my",
    responses((status = 200, description = "Offers of the calling recruiter", body = [JobOfferResponse])),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn list_my_offers(
    State(state): State<AppState>,
    actor: Actor,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    let offers = state.offer_service.list_mine(&actor).await?;
    Ok(Json(offers))
}

#[utoipa::path(
    get,
    path = "/api/offers/{id}/details",
    params(("id" = Uuid, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Offer in any status", body = JobOfferResponse),
        (status = 403, description = "Caller does not own the offer")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn get_offer_details(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    let offer = state.offer_service.get_details(id, &actor).await?;
    Ok(Json(offer))
}

#[utoipa::path(
    get,
    path = "/api/offers/{id}/custom-fields",
    params(("id" = Uuid, Path, description = "Offer ID")),
    responses(
        (status = 200, description = "Application form of the offer", body = [CustomFormFieldResponse]),
        (status = 404, description = "Offer not found")
    )
)]
#[axum::debug_handler]
pub async fn list_custom_fields(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let fields = state.form_service.list_fields(id).await?;
    Ok(Json(fields))
}

#[utoipa::path(
    post,
    path = "/api/offers/{id}/custom-fields",
    params(("id" = Uuid, Path, description = "Offer ID")),
    request_body = CustomFormFieldRequest,
    responses(
        (status = 201, description = "Field added", body = CustomFormFieldResponse),
        (status = 400, description = "Unknown field type or missing options"),
        (status = 403, description = "Caller does not own the offer")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn create_custom_field(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomFormFieldRequest>,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    let field = state.form_service.create_field(id, payload, &actor).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Form field created", field)),
    ))
}

#[utoipa::path(
    delete,
    path = "/api/custom-fields/{id}",
    params(("id" = Uuid, Path, description = "Form field ID")),
    responses(
        (status = 200, description = "Field removed; submitted answers are kept"),
        (status = 403, description = "Caller does not own the offer"),
        (status = 404, description = "Field not found")
    ),
    security(("bearer" = []))
)]
#[axum::debug_handler]
pub async fn delete_custom_field(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    actor.require(Role::Recruiter)?;
    state.form_service.delete_field(id, &actor).await?;
    Ok(Json(ApiResponse::ok("Form field deleted", ())))
}
