pub mod annotations;
pub mod applications;
pub mod docs;
pub mod health;
pub mod offers;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::middleware::{auth, rate_limit};
use crate::AppState;

/// Room for a 5 MiB CV plus multipart framing and answers.
const MAX_BODY_BYTES: usize = 8 * 1024 * 1024;

/// Public and authenticated endpoints share paths (`GET` vs `POST /api/offers`), so a
/// single router is used; handlers that need an identity extract an `Actor`.
pub fn router(state: AppState, config: &Config) -> Router {
    let api = Router::new()
        .route(
            "/api/offers",
            get(offers::list_public_offers).post(offers::create_offer),
        )
        .route("/api/offers/my", get(offers::list_my_offers))
        .route(
            "/api/offers/:id",
            get(offers::get_public_offer)
                .put(offers::update_offer)
                .delete(offers::delete_offer),
        )
        .route("/api/offers/:id/details", get(offers::get_offer_details))
        .route(
            "/api/offers/:id/custom-fields",
            get(offers::list_custom_fields).post(offers::create_custom_field),
        )
        .route("/api/custom-fields/:id", delete(offers::delete_custom_field))
        .route("/api/offers/:id/select-top", post(applications::select_top))
        .route("/api/offers/:id/ai-analysis", post(annotations::analyze_offer))
        .route(
            "/api/applications/apply/:offer_id",
            post(applications::apply_to_offer),
        )
        .route(
            "/api/applications/mine",
            get(applications::list_my_applications),
        )
        .route(
            "/api/applications/offer/:id",
            get(applications::list_offer_applications),
        )
        .route(
            "/api/applications/:id/cv",
            get(applications::download_cv).put(applications::update_application_cv),
        )
        .route(
            "/api/applications/:id/custom-data",
            get(applications::get_custom_data),
        )
        .route("/api/applications/:id/status", put(applications::update_status))
        .route("/api/applications/:id/score", put(applications::update_score))
        .route("/api/applications/:id/notes", put(applications::update_notes))
        .route(
            "/api/applications/:id/ai-summary",
            post(annotations::generate_summary),
        )
        .route(
            "/api/applications/:id/ai-questions",
            post(annotations::generate_interview_questions),
        )
        .layer(from_fn_with_state(
            rate_limit::SurfaceLimits::new(config.public_rps, config.private_rps),
            rate_limit::rps_middleware,
        ))
        .layer(from_fn_with_state(
            state.jwt.clone(),
            auth::resolve_bearer_auth,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/api-docs/openapi.json", get(docs::openapi_json))
        .merge(api)
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
}
