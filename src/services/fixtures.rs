//! Seed helpers shared by the service unit tests.

use chrono::NaiveDate;
use std::sync::Arc;
use uuid::Uuid;

use crate::database::{MemoryStore, RecruitmentStore};
use crate::models::application::{
    Application, ApplicationStatus, ApplicationUpdate, CvDocument, NewApplication,
};
use crate::models::job_offer::{ContractType, JobOffer, NewJobOffer, OfferStatus};
use crate::models::user::{NewUser, Role};
use crate::services::authorization::Actor;

pub const PDF_MIME: &str = "application/pdf";

pub fn store() -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new())
}

pub async fn user(store: &MemoryStore, role: Role, email: &str) -> Actor {
    let (first_name, last_name) = match role {
        Role::Candidate => ("Camille", "Martin"),
        Role::Recruiter => ("Rania", "Haddad"),
    };
    let user = store
        .insert_user(NewUser {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: email.into(),
            phone_number: Some("+33 6 00 00 00 00".into()),
            role,
        })
        .await
        .unwrap();
    Actor::new(user.id, role)
}

pub async fn offer(
    store: &MemoryStore,
    recruiter: &Actor,
    status: OfferStatus,
    deadline: Option<NaiveDate>,
) -> JobOffer {
    store
        .insert_offer(NewJobOffer {
            title: "Backend developer".into(),
            description: "Build and run the hiring platform APIs.".into(),
            location: "Lyon".into(),
            contract_type: ContractType::Permanent,
            status,
            deadline,
            recruiter_id: recruiter.id,
        })
        .await
        .unwrap()
}

pub fn cv(bytes: &[u8]) -> CvDocument {
    CvDocument {
        file_name: "cv.pdf".into(),
        file_type: PDF_MIME.into(),
        data: bytes.to_vec(),
    }
}

/// Inserts a PENDING application for a fresh candidate and applies `score` directly.
pub async fn application(
    store: &MemoryStore,
    offer: &JobOffer,
    email: &str,
    score: Option<i32>,
) -> Application {
    let candidate = user(store, Role::Candidate, email).await;
    let app = store
        .insert_application(
            NewApplication {
                applicant_id: candidate.id,
                job_offer_id: offer.id,
                cv: cv(email.as_bytes()),
            },
            Vec::new(),
        )
        .await
        .unwrap();
    match score {
        Some(score) => store
            .update_application(app.id, ApplicationUpdate::Score(score))
            .await
            .unwrap(),
        None => app,
    }
}

/// Sets a status directly, without the service's message rules.
pub async fn decide(store: &MemoryStore, id: Uuid, status: ApplicationStatus) -> Application {
    store
        .update_application(id, ApplicationUpdate::Status { status, message: None })
        .await
        .unwrap()
}
