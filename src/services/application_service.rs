use std::cmp::Ordering;
use std::collections::HashMap;

use uuid::Uuid;

use crate::database::SharedStore;
use crate::dto::application_dto::{ApplicationResponse, CustomDataResponse};
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus, ApplicationUpdate, CvDocument};
use crate::models::job_offer::JobOffer;
use crate::models::user::User;
use crate::services::authorization::{
    ensure_can_read_application, ensure_offer_owner, ensure_recruiter_for_application, Actor,
};
use crate::utils::time;

/// Written when a recruiter accepts an application without a message of their own.
pub const ACCEPTANCE_MESSAGE: &str = "Congratulations! Your application caught our attention. \
     We will contact you soon to schedule an interview.";

/// Written on applications accepted by ranking that carry no message yet.
pub const SHORTLIST_MESSAGE: &str =
    "Congratulations! Your profile is part of our priority selection.";

pub const MIN_SCORE: i32 = 0;
pub const MAX_SCORE: i32 = 100;

/// Owns an application's review state: status, score, notes, and bulk selection.
#[derive(Clone)]
pub struct ApplicationService {
    store: SharedStore,
}

impl ApplicationService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Any recognized status is accepted from any status. The candidate message is replaced
    /// by `message`; accepting without one writes [`ACCEPTANCE_MESSAGE`].
    pub async fn set_status(
        &self,
        application_id: Uuid,
        status: &str,
        message: Option<String>,
        actor: &Actor,
    ) -> Result<ApplicationResponse> {
        let (application, offer) = self.load_for_recruiter(application_id, actor).await?;
        let status: ApplicationStatus = status.parse()?;

        let blank = message.as_deref().map_or(true, |m| m.trim().is_empty());
        let message = if status == ApplicationStatus::Accepted && blank {
            Some(ACCEPTANCE_MESSAGE.to_string())
        } else {
            message
        };

        let updated = self
            .store
            .update_application(application.id, ApplicationUpdate::Status { status, message })
            .await?;
        tracing::info!(application_id = %updated.id, status = %updated.status, "application status changed");
        self.present(updated, &offer).await
    }

    /// Overwrites any previous score, manual or AI-assigned.
    pub async fn set_score(
        &self,
        application_id: Uuid,
        score: i32,
        actor: &Actor,
    ) -> Result<ApplicationResponse> {
        let (application, offer) = self.load_for_recruiter(application_id, actor).await?;
        if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
            return Err(Error::InvalidArgument(format!(
                "Score must be between {} and {}, got {}",
                MIN_SCORE, MAX_SCORE, score
            )));
        }

        let updated = self
            .store
            .update_application(application.id, ApplicationUpdate::Score(score))
            .await?;
        tracing::info!(application_id = %updated.id, score, "application score set");
        self.present(updated, &offer).await
    }

    /// Empty or missing text clears the notes.
    pub async fn set_internal_notes(
        &self,
        application_id: Uuid,
        notes: Option<String>,
        actor: &Actor,
    ) -> Result<ApplicationResponse> {
        let (application, offer) = self.load_for_recruiter(application_id, actor).await?;

        let notes = notes.filter(|n| !n.trim().is_empty());
        let updated = self
            .store
            .update_application(application.id, ApplicationUpdate::InternalNotes(notes))
            .await?;
        tracing::info!(application_id = %updated.id, "internal notes updated");
        self.present(updated, &offer).await
    }

    /// Ranks every application of the offer by score (missing scores last, ties in arrival
    /// order). Pending or reviewed applications in the first `top_n` positions are accepted,
    /// the rest rejected; applications already past that stage keep their status but still
    /// occupy their position. Decisions are written together and touch only status and
    /// message, so a score or note written meanwhile survives, and an application decided
    /// meanwhile keeps that decision.
    pub async fn rank_and_select_top(
        &self,
        offer_id: Uuid,
        top_n: usize,
        actor: &Actor,
    ) -> Result<Vec<ApplicationResponse>> {
        let offer = self.load_offer(offer_id).await?;
        ensure_offer_owner(actor, &offer)?;

        if time::is_before_deadline(offer.deadline, time::today()) {
            return Err(Error::InvalidState(format!(
                "Applications cannot be ranked before the deadline ({})",
                offer.deadline.map(|d| d.to_string()).unwrap_or_default()
            )));
        }

        let applications = self.store.list_applications_for_offer(offer.id).await?;
        let (order, decisions) = select_top(applications, top_n);
        let written = self.store.update_applications(&decisions).await?;

        tracing::info!(
            offer_id = %offer.id,
            top_n,
            ranked = order.len(),
            changed = written.len(),
            skipped = decisions.len().saturating_sub(written.len()),
            "top applications selected"
        );
        let current = self.store.list_applications_for_offer(offer.id).await?;
        self.present_all(in_rank_order(current, &order), Some(&offer))
            .await
    }

    pub async fn list_for_offer(
        &self,
        offer_id: Uuid,
        actor: &Actor,
    ) -> Result<Vec<ApplicationResponse>> {
        let offer = self.load_offer(offer_id).await?;
        ensure_offer_owner(actor, &offer)?;
        let applications = self.store.list_applications_for_offer(offer.id).await?;
        self.present_all(applications, Some(&offer)).await
    }

    /// The candidate's own applications, without recruiter-only fields.
    pub async fn list_for_candidate(&self, actor: &Actor) -> Result<Vec<ApplicationResponse>> {
        let applicant = self
            .store
            .find_user(actor.id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        let applications = self
            .store
            .list_applications_for_applicant(applicant.id)
            .await?;

        let mut offers: HashMap<Uuid, Option<JobOffer>> = HashMap::new();
        let mut items = Vec::with_capacity(applications.len());
        for application in applications {
            if !offers.contains_key(&application.job_offer_id) {
                let offer = self.store.find_offer(application.job_offer_id).await?;
                offers.insert(application.job_offer_id, offer);
            }
            let offer = offers.get(&application.job_offer_id).and_then(Option::as_ref);
            items.push(
                ApplicationResponse::from_parts(application, Some(&applicant), offer)
                    .for_candidate(),
            );
        }
        Ok(items)
    }

    pub async fn get_cv(&self, application_id: Uuid, actor: &Actor) -> Result<CvDocument> {
        let (application, _) = self.load_for_reader(application_id, actor).await?;
        self.store
            .fetch_cv(application.id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("CV not found for application {}", application.id)))
    }

    /// Answers are returned even when their form field has since been deleted.
    pub async fn get_custom_data(
        &self,
        application_id: Uuid,
        actor: &Actor,
    ) -> Result<Vec<CustomDataResponse>> {
        let (application, _) = self.load_for_reader(application_id, actor).await?;
        let answers = self.store.list_custom_data(application.id).await?;
        Ok(answers.into_iter().map(Into::into).collect())
    }

    /// Persists AI output computed elsewhere, bypassing ownership checks. Callers must have
    /// authorized the read that produced it.
    pub(crate) async fn save_ai_summary(
        &self,
        application_id: Uuid,
        summary: String,
    ) -> Result<Application> {
        self.store
            .update_application(application_id, ApplicationUpdate::AiSummary(summary))
            .await
    }

    /// See [`save_ai_summary`](Self::save_ai_summary).
    pub(crate) async fn save_ai_interview_questions(
        &self,
        application_id: Uuid,
        questions: String,
    ) -> Result<Application> {
        self.store
            .update_application(
                application_id,
                ApplicationUpdate::AiInterviewQuestions(questions),
            )
            .await
    }

    pub(crate) async fn load_for_reader(
        &self,
        application_id: Uuid,
        actor: &Actor,
    ) -> Result<(Application, JobOffer)> {
        let application = self.load_application(application_id).await?;
        let offer = self.load_offer(application.job_offer_id).await?;
        ensure_can_read_application(actor, &application, &offer)?;
        Ok((application, offer))
    }

    async fn load_for_recruiter(
        &self,
        application_id: Uuid,
        actor: &Actor,
    ) -> Result<(Application, JobOffer)> {
        let application = self.load_application(application_id).await?;
        let offer = self.load_offer(application.job_offer_id).await?;
        ensure_recruiter_for_application(actor, &application, &offer)?;
        Ok((application, offer))
    }

    async fn load_application(&self, application_id: Uuid) -> Result<Application> {
        self.store
            .find_application(application_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application not found: {}", application_id)))
    }

    async fn load_offer(&self, offer_id: Uuid) -> Result<JobOffer> {
        self.store
            .find_offer(offer_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Offer not found: {}", offer_id)))
    }

    pub(crate) async fn present(
        &self,
        application: Application,
        offer: &JobOffer,
    ) -> Result<ApplicationResponse> {
        let applicant = self.store.find_user(application.applicant_id).await?;
        Ok(ApplicationResponse::from_parts(
            application,
            applicant.as_ref(),
            Some(offer),
        ))
    }

    async fn present_all(
        &self,
        applications: Vec<Application>,
        offer: Option<&JobOffer>,
    ) -> Result<Vec<ApplicationResponse>> {
        let mut applicants: HashMap<Uuid, Option<User>> = HashMap::new();
        let mut items = Vec::with_capacity(applications.len());
        for application in applications {
            if !applicants.contains_key(&application.applicant_id) {
                let user = self.store.find_user(application.applicant_id).await?;
                applicants.insert(application.applicant_id, user);
            }
            let applicant = applicants
                .get(&application.applicant_id)
                .and_then(Option::as_ref);
            items.push(ApplicationResponse::from_parts(application, applicant, offer));
        }
        Ok(items)
    }
}

/// Descending by score with missing scores after every scored application.
fn by_score_desc(a: Option<i32>, b: Option<i32>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Returns the ranking as ids and one decision per pre-decision application.
/// `applications` must be in arrival order; the sort is stable so equal scores keep it.
fn select_top(
    mut applications: Vec<Application>,
    top_n: usize,
) -> (Vec<Uuid>, Vec<(Uuid, ApplicationUpdate)>) {
    applications.sort_by(|a, b| by_score_desc(a.cv_score, b.cv_score));

    let mut decisions = Vec::new();
    for (rank, application) in applications.iter().enumerate() {
        if !application.status.is_pre_decision() {
            continue;
        }
        let decision = if rank < top_n {
            ApplicationUpdate::Decision {
                status: ApplicationStatus::Accepted,
                default_message: Some(SHORTLIST_MESSAGE.to_string()),
            }
        } else {
            ApplicationUpdate::Decision {
                status: ApplicationStatus::Rejected,
                default_message: None,
            }
        };
        decisions.push((application.id, decision));
    }
    let order = applications.iter().map(|a| a.id).collect();
    (order, decisions)
}

/// Current rows laid out in ranking order. Rows created after the ranking read are left out.
fn in_rank_order(current: Vec<Application>, order: &[Uuid]) -> Vec<Application> {
    let position: HashMap<Uuid, usize> = order.iter().enumerate().map(|(i, id)| (*id, i)).collect();
    let mut ranked: Vec<Application> = current
        .into_iter()
        .filter(|a| position.contains_key(&a.id))
        .collect();
    ranked.sort_by_key(|a| position.get(&a.id).copied().unwrap_or(usize::MAX));
    ranked
}
