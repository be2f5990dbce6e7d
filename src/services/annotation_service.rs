//! AI enrichment of applications: batch CV scoring behind an in-process queue, plus the
//! cached per-application summary and interview questions.

use regex::Regex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::database::SharedStore;
use crate::dto::application_dto::{AiTextResponse, AnnotationTicket};
use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::job_offer::JobOffer;
use crate::services::ai_service::{self, TextGenerator};
use crate::services::application_service::{ApplicationService, MAX_SCORE};
use crate::services::authorization::{ensure_offer_owner, Actor};
use crate::utils::pdf::CvTextExtractor;

/// What the scoring prompt asked for, as far as it could be recovered from the reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreReply {
    pub score: i32,
    pub summary: Option<String>,
}

/// Pattern-based reader for model replies. Tolerates prose or code fences around the JSON.
#[derive(Debug, Clone)]
pub struct ReplyParser {
    score: Regex,
    summary: Regex,
}

impl ReplyParser {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern).map_err(|e| Error::Internal(format!("Invalid reply pattern: {}", e)))
        };
        Ok(Self {
            score: compile(r#""score"\s*:\s*(\d+)"#)?,
            summary: compile(r#""(?:resume|summary)"\s*:\s*"((?:[^"\\]|\\.)*)""#)?,
        })
    }

    /// `None` when no score in range can be found.
    pub fn parse(&self, reply: &str) -> Option<ScoreReply> {
        let score = self
            .score
            .captures(reply)
            .and_then(|c| c.get(1))
            .and_then(|m| m.as_str().parse::<i32>().ok())
            .filter(|s| (0..=MAX_SCORE).contains(s))?;
        let summary = self
            .summary
            .captures(reply)
            .and_then(|c| c.get(1))
            .map(|m| unescape(m.as_str()).trim().to_string())
            .filter(|s| !s.is_empty());
        Some(ScoreReply { score, summary })
    }
}

/// Decodes JSON string escapes; text that is not a valid JSON string body is kept as is.
fn unescape(raw: &str) -> String {
    serde_json::from_str::<String>(&format!("\"{}\"", raw)).unwrap_or_else(|_| raw.to_string())
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub scored: usize,
    pub skipped: usize,
}

#[derive(Clone)]
pub struct AnnotationService {
    store: SharedStore,
    applications: ApplicationService,
    generator: Arc<dyn TextGenerator>,
    extractor: Arc<dyn CvTextExtractor>,
    parser: ReplyParser,
    timeout: Duration,
}

impl AnnotationService {
    pub fn new(
        store: SharedStore,
        generator: Arc<dyn TextGenerator>,
        extractor: Arc<dyn CvTextExtractor>,
        timeout: Duration,
    ) -> Result<Self> {
        Ok(Self {
            applications: ApplicationService::new(store.clone()),
            store,
            generator,
            extractor,
            parser: ReplyParser::new()?,
            timeout,
        })
    }

    /// Ownership check run before a batch is accepted.
    pub async fn authorize_batch(&self, offer_id: Uuid, actor: &Actor) -> Result<JobOffer> {
        let offer = self
            .store
            .find_offer(offer_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Offer not found: {}", offer_id)))?;
        ensure_offer_owner(actor, &offer)?;
        Ok(offer)
    }

    /// Scores every application of the offer. A failing application is logged and skipped;
    /// only failing to load the batch itself is an error. Stops between items on cancel.
    pub async fn annotate_offer(
        &self,
        offer_id: Uuid,
        actor: &Actor,
        cancel: &CancellationToken,
    ) -> Result<BatchReport> {
        let offer = self.authorize_batch(offer_id, actor).await?;
        let applications = self.store.list_applications_for_offer(offer.id).await?;
        tracing::info!(offer_id = %offer.id, count = applications.len(), "AI analysis started");

        let mut report = BatchReport::default();
        for application in applications {
            if cancel.is_cancelled() {
                tracing::warn!(offer_id = %offer.id, "AI analysis cancelled");
                break;
            }
            match self.annotate_one(&application, &offer, actor).await {
                Ok(()) => report.scored += 1,
                Err(e) => {
                    report.skipped += 1;
                    tracing::warn!(application_id = %application.id, error = %e, "skipping application in AI analysis");
                }
            }
        }

        tracing::info!(
            offer_id = %offer.id,
            scored = report.scored,
            skipped = report.skipped,
            "AI analysis finished"
        );
        Ok(report)
    }

    async fn annotate_one(
        &self,
        application: &Application,
        offer: &JobOffer,
        actor: &Actor,
    ) -> Result<()> {
        let cv_text = self.cv_text(application.id).await?;
        let prompt = ai_service::scoring_prompt(offer, &cv_text);
        let reply = self
            .within("text generation", self.generator.generate(ai_service::system_prompt(), &prompt))
            .await?;
        tracing::debug!(application_id = %application.id, reply = %reply, "raw AI reply");

        let parsed = self.parser.parse(&reply).ok_or_else(|| {
            Error::InvalidArgument("AI reply did not contain a usable score".to_string())
        })?;

        self.applications
            .set_score(application.id, parsed.score, actor)
            .await?;
        if let Some(summary) = parsed.summary {
            self.applications
                .set_internal_notes(application.id, Some(summary), actor)
                .await?;
        }
        Ok(())
    }

    /// Returns the cached summary or generates and stores it.
    pub async fn generate_summary(
        &self,
        application_id: Uuid,
        actor: &Actor,
    ) -> Result<AiTextResponse> {
        let (application, offer) = self.applications.load_for_reader(application_id, actor).await?;
        if let Some(cached) = application.ai_summary.filter(|s| !s.is_empty()) {
            return Ok(AiTextResponse { application_id, content: cached });
        }

        let cv_text = self.cv_text(application.id).await?;
        let content = self
            .within(
                "summary generation",
                self.generator.generate(
                    ai_service::system_prompt(),
                    &ai_service::summary_prompt(&offer, &cv_text),
                ),
            )
            .await?;
        self.applications
            .save_ai_summary(application.id, content.clone())
            .await?;
        tracing::info!(application_id = %application.id, "AI summary generated");
        Ok(AiTextResponse { application_id, content })
    }

    /// Returns the cached questions or generates and stores them.
    pub async fn generate_interview_questions(
        &self,
        application_id: Uuid,
        actor: &Actor,
    ) -> Result<AiTextResponse> {
        let (application, offer) = self.applications.load_for_reader(application_id, actor).await?;
        if let Some(cached) = application.ai_interview_questions.filter(|s| !s.is_empty()) {
            return Ok(AiTextResponse { application_id, content: cached });
        }

        let cv_text = self.cv_text(application.id).await?;
        let content = self
            .within(
                "interview question generation",
                self.generator.generate(
                    ai_service::system_prompt(),
                    &ai_service::interview_questions_prompt(&offer, &cv_text),
                ),
            )
            .await?;
        self.applications
            .save_ai_interview_questions(application.id, content.clone())
            .await?;
        tracing::info!(application_id = %application.id, "AI interview questions generated");
        Ok(AiTextResponse { application_id, content })
    }

    async fn cv_text(&self, application_id: Uuid) -> Result<String> {
        let cv = self
            .store
            .fetch_cv(application_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("CV not found for application {}", application_id)))?;
        self.within("CV text extraction", self.extractor.extract_text(cv.data))
            .await
    }

    async fn within<T>(&self, what: &str, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "{} took longer than {}s",
                what,
                self.timeout.as_secs()
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnnotationJob {
    pub job_id: Uuid,
    pub offer_id: Uuid,
    pub actor: Actor,
}

/// Producer side of the batch queue, held in the application state.
#[derive(Clone)]
pub struct AnnotationQueue {
    sender: mpsc::Sender<AnnotationJob>,
    service: Arc<AnnotationService>,
}

/// Consumer side; runs on its own task until cancelled or every sender is gone.
pub struct AnnotationWorker {
    receiver: mpsc::Receiver<AnnotationJob>,
    service: Arc<AnnotationService>,
}

impl AnnotationQueue {
    pub fn new(service: Arc<AnnotationService>, capacity: usize) -> (Self, AnnotationWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (
            Self {
                sender,
                service: service.clone(),
            },
            AnnotationWorker { receiver, service },
        )
    }

    /// Checks ownership, then hands the batch to the worker and returns at once.
    pub async fn enqueue(&self, offer_id: Uuid, actor: &Actor) -> Result<AnnotationTicket> {
        let offer = self.service.authorize_batch(offer_id, actor).await?;
        let job = AnnotationJob {
            job_id: Uuid::new_v4(),
            offer_id: offer.id,
            actor: *actor,
        };
        let job_id = job.job_id;

        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => Error::InvalidState(
                "Too many AI analyses are already queued, try again later".to_string(),
            ),
            mpsc::error::TrySendError::Closed(_) => {
                Error::Internal("AI analysis worker is not running".to_string())
            }
        })?;

        tracing::info!(job_id = %job_id, offer_id = %offer.id, "AI analysis queued");
        Ok(AnnotationTicket {
            job_id,
            offer_id: offer.id,
            status: "queued".to_string(),
        })
    }
}

impl AnnotationWorker {
    pub async fn run(mut self, cancel: CancellationToken) {
        tracing::info!("AI analysis worker started");
        loop {
            let job = tokio::select! {
                _ = cancel.cancelled() => break,
                job = self.receiver.recv() => match job {
                    Some(job) => job,
                    None => break,
                },
            };

            match self
                .service
                .annotate_offer(job.offer_id, &job.actor, &cancel)
                .await
            {
                Ok(report) => tracing::info!(
                    job_id = %job.job_id,
                    scored = report.scored,
                    skipped = report.skipped,
                    "AI analysis job done"
                ),
                Err(e) => tracing::error!(job_id = %job.job_id, error = %e, "AI analysis job failed"),
            }
        }
        tracing::info!("AI analysis worker stopped");
    }
}
