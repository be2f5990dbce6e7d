#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{NaiveDate, Utc};
use hiring_portal::{
    config::Config,
    database::{MemoryStore, RecruitmentStore, SharedStore},
    error::{Error, Result},
    middleware::auth::Claims,
    models::{
        job_offer::{ContractType, JobOffer, NewJobOffer, OfferStatus},
        user::{NewUser, Role},
    },
    routes,
    services::{ai_service::TextGenerator, authorization::Actor},
    utils::pdf::CvTextExtractor,
    AppState,
};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::Value;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

pub const JWT_SECRET: &str = "integration-test-secret";
pub const BOUNDARY: &str = "hiring-portal-boundary";

/// Always answers with the same scoring reply.
pub struct CannedGenerator(pub &'static str);

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _system: &str, _prompt: &str) -> Result<String> {
        Ok(self.0.to_string())
    }
}

/// Reads CV bytes as UTF-8 text.
pub struct Utf8Extractor;

#[async_trait]
impl CvTextExtractor for Utf8Extractor {
    async fn extract_text(&self, data: Vec<u8>) -> Result<String> {
        String::from_utf8(data).map_err(|_| Error::InvalidArgument("not text".to_string()))
    }
}

pub fn config() -> Config {
    Config {
        server_address: "127.0.0.1:0".into(),
        database_url: "postgres://unused".into(),
        database_max_connections: 1,
        jwt_secret: JWT_SECRET.into(),
        openai_api_key: None,
        openai_model: "gpt-4o-mini".into(),
        ai_timeout_secs: 5,
        ai_queue_capacity: 4,
        public_rps: 1000,
        private_rps: 1000,
    }
}

pub struct TestApp {
    pub router: Router,
    pub store: Arc<MemoryStore>,
    pub cancel: CancellationToken,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_generator(CannedGenerator(r#"{"score": 77, "resume": "Good match."}"#))
    }

    pub fn with_generator(generator: impl TextGenerator + 'static) -> Self {
        let store = Arc::new(MemoryStore::new());
        let shared: SharedStore = store.clone();
        let config = config();
        let (state, worker) = AppState::with_ai(
            shared,
            &config,
            Arc::new(generator),
            Arc::new(Utf8Extractor),
        )
        .unwrap();
        let cancel = CancellationToken::new();
        tokio::spawn(worker.run(cancel.clone()));
        Self {
            router: routes::router(state, &config),
            store,
            cancel,
        }
    }

    pub async fn user(&self, role: Role, email: &str) -> Actor {
        let user = self
            .store
            .insert_user(NewUser {
                first_name: "Alex".into(),
                last_name: "Durand".into(),
                email: email.into(),
                phone_number: None,
                role,
            })
            .await
            .unwrap();
        Actor::new(user.id, role)
    }

    pub async fn offer(
        &self,
        owner: &Actor,
        status: OfferStatus,
        deadline: Option<NaiveDate>,
    ) -> JobOffer {
        self.store
            .insert_offer(NewJobOffer {
                title: "Platform engineer".into(),
                description: "Run Kubernetes clusters and the CI fleet.".into(),
                location: "Bordeaux".into(),
                contract_type: ContractType::Permanent,
                status,
                deadline,
                recruiter_id: owner.id,
            })
            .await
            .unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::String(
                String::from_utf8_lossy(&bytes).into_owned(),
            ))
        };
        (status, body)
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

pub fn token(actor: &Actor) -> String {
    let claims = Claims {
        sub: actor.id.to_string(),
        exp: (Utc::now().timestamp() + 3600) as usize,
        role: Some(actor.role.to_string()),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .unwrap()
}

pub fn json_request(method: &str, uri: &str, actor: Option<&Actor>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(actor) = actor {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(actor)));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get(uri: &str, actor: Option<&Actor>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(actor) = actor {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(actor)));
    }
    builder.body(Body::empty()).unwrap()
}

/// Multipart body with a `cv` part and an optional `customData` part.
pub fn multipart_request(
    method: &str,
    uri: &str,
    actor: &Actor,
    cv: &[u8],
    mime_type: &str,
    custom_data: Option<Value>,
) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"cv\"; filename=\"my cv.pdf\"\r\nContent-Type: {mime_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(cv);
    body.extend_from_slice(b"\r\n");
    if let Some(data) = custom_data {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"customData\"\r\n\r\n{data}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .header(header::AUTHORIZATION, format!("Bearer {}", token(actor)))
        .body(Body::from(body))
        .unwrap()
}
