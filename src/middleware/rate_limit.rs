use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::services::authorization::Actor;

#[derive(Debug)]
struct WindowState {
    start: Instant,
    count: u32,
}

/// Fixed one-second window shared by every request of a router surface.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    rps: u32,
    window: Arc<Mutex<WindowState>>,
}

impl RateLimiter {
    pub fn new(rps: u32) -> Self {
        Self {
            rps: rps.max(1),
            window: Arc::new(Mutex::new(WindowState {
                start: Instant::now(),
                count: 0,
            })),
        }
    }

    fn allow(&self) -> bool {
        let mut guard = self
            .window
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let now = Instant::now();
        if now.duration_since(guard.start) >= Duration::from_secs(1) {
            guard.start = now;
            guard.count = 0;
        }
        if guard.count < self.rps {
            guard.count += 1;
            true
        } else {
            false
        }
    }
}

/// Separate budgets for anonymous and authenticated traffic.
#[derive(Clone, Debug)]
pub struct SurfaceLimits {
    pub public: RateLimiter,
    pub authenticated: RateLimiter,
}

impl SurfaceLimits {
    pub fn new(public_rps: u32, authenticated_rps: u32) -> Self {
        Self {
            public: RateLimiter::new(public_rps),
            authenticated: RateLimiter::new(authenticated_rps),
        }
    }
}

/// Must run after the auth middleware so the resolved [`Actor`] is visible.
pub async fn rps_middleware(
    State(limits): State<SurfaceLimits>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let limiter = if req.extensions().get::<Actor>().is_some() {
        &limits.authenticated
    } else {
        &limits.public
    };
    if !limiter.allow() {
        tracing::warn!(path = %req.uri().path(), "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "success": false, "error": "rate_limit_exceeded" })),
        )
            .into_response();
    }
    next.run(req).await
}
