pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::database::SharedStore;
use crate::error::Result;
use crate::middleware::auth::JwtVerifier;
use crate::services::{
    ai_service::{OpenAiGenerator, TextGenerator},
    annotation_service::{AnnotationQueue, AnnotationService, AnnotationWorker},
    application_service::ApplicationService,
    form_service::FormService,
    intake_service::IntakeService,
    offer_service::OfferService,
};
use crate::utils::pdf::{CvTextExtractor, PdfTextExtractor};

#[derive(Clone)]
pub struct AppState {
    pub store: SharedStore,
    pub jwt: JwtVerifier,
    pub offer_service: OfferService,
    pub form_service: FormService,
    pub application_service: ApplicationService,
    pub intake_service: IntakeService,
    pub annotation_service: Arc<AnnotationService>,
    pub annotation_queue: AnnotationQueue,
}

impl AppState {
    /// Production wiring: OpenAI for text generation, lopdf for CV text.
    pub fn new(store: SharedStore, config: &Config) -> Result<(Self, AnnotationWorker)> {
        let timeout = Duration::from_secs(config.ai_timeout_secs);
        let http_client = Client::builder().timeout(timeout).build()?;
        let generator = OpenAiGenerator::new(
            http_client,
            config.openai_api_key.clone(),
            config.openai_model.clone(),
            timeout,
        );
        Self::with_ai(store, config, Arc::new(generator), Arc::new(PdfTextExtractor))
    }

    /// Returns the state and the annotation worker, which the caller must spawn.
    pub fn with_ai(
        store: SharedStore,
        config: &Config,
        generator: Arc<dyn TextGenerator>,
        extractor: Arc<dyn CvTextExtractor>,
    ) -> Result<(Self, AnnotationWorker)> {
        let annotation_service = Arc::new(AnnotationService::new(
            store.clone(),
            generator,
            extractor,
            Duration::from_secs(config.ai_timeout_secs),
        )?);
        let (annotation_queue, worker) =
            AnnotationQueue::new(annotation_service.clone(), config.ai_queue_capacity);

        let state = Self {
            jwt: JwtVerifier::new(&config.jwt_secret),
            offer_service: OfferService::new(store.clone()),
            form_service: FormService::new(store.clone()),
            application_service: ApplicationService::new(store.clone()),
            intake_service: IntakeService::new(store.clone()),
            annotation_service,
            annotation_queue,
            store,
        };
        Ok((state, worker))
    }
}
