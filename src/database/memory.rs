use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::store::RecruitmentStore;
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationCustomData, ApplicationStatus, ApplicationUpdate, CvDocument,
    NewApplication, NewCustomAnswer,
};
use crate::models::form_field::{CustomFormField, NewFormField};
use crate::models::job_offer::{JobOffer, NewJobOffer, OfferStatus};
use crate::models::user::{NewUser, User};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    offers: Vec<JobOffer>,
    fields: Vec<CustomFormField>,
    applications: Vec<(Application, CvDocument)>,
    custom_data: Vec<ApplicationCustomData>,
}

/// Process-local store with the same constraints as the Postgres schema (unique
/// applicant/offer pair, cascades, orphaned answers). Used by tests and local demos.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl RecruitmentStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let mut tables = self.tables();
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(Error::InvalidArgument(format!(
                "A user with email {} already exists",
                user.email
            )));
        }
        let user = User {
            id: Uuid::new_v4(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone_number: user.phone_number,
            role: user.role,
            created_at: Utc::now(),
        };
        tables.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables().users.iter().find(|u| u.id == id).cloned())
    }

    async fn insert_offer(&self, offer: NewJobOffer) -> Result<JobOffer> {
        let mut tables = self.tables();
        if !tables.users.iter().any(|u| u.id == offer.recruiter_id) {
            return Err(Error::NotFound("Recruiter not found".to_string()));
        }
        let now = Utc::now();
        let offer = JobOffer {
            id: Uuid::new_v4(),
            title: offer.title,
            description: offer.description,
            location: offer.location,
            contract_type: offer.contract_type,
            status: offer.status,
            deadline: offer.deadline,
            recruiter_id: offer.recruiter_id,
            created_at: now,
            updated_at: now,
        };
        tables.offers.push(offer.clone());
        Ok(offer)
    }

    async fn find_offer(&self, id: Uuid) -> Result<Option<JobOffer>> {
        Ok(self.tables().offers.iter().find(|o| o.id == id).cloned())
    }

    async fn list_offers_by_status(&self, status: OfferStatus) -> Result<Vec<JobOffer>> {
        Ok(self
            .tables()
            .offers
            .iter()
            .rev()
            .filter(|o| o.status == status)
            .cloned()
            .collect())
    }

    async fn list_offers_by_recruiter(&self, recruiter_id: Uuid) -> Result<Vec<JobOffer>> {
        Ok(self
            .tables()
            .offers
            .iter()
            .rev()
            .filter(|o| o.recruiter_id == recruiter_id)
            .cloned()
            .collect())
    }

    async fn update_offer(&self, offer: &JobOffer) -> Result<JobOffer> {
        let mut tables = self.tables();
        let stored = tables
            .offers
            .iter_mut()
            .find(|o| o.id == offer.id)
            .ok_or_else(|| Error::NotFound("Job offer not found".to_string()))?;
        stored.title = offer.title.clone();
        stored.description = offer.description.clone();
        stored.location = offer.location.clone();
        stored.contract_type = offer.contract_type;
        stored.status = offer.status;
        stored.deadline = offer.deadline;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_offer(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables();
        let before = tables.offers.len();
        tables.offers.retain(|o| o.id != id);
        if tables.offers.len() == before {
            return Err(Error::NotFound("Job offer not found".to_string()));
        }
        tables.fields.retain(|f| f.job_offer_id != id);
        let removed: Vec<Uuid> = tables
            .applications
            .iter()
            .filter(|(a, _)| a.job_offer_id == id)
            .map(|(a, _)| a.id)
            .collect();
        tables.applications.retain(|(a, _)| a.job_offer_id != id);
        tables
            .custom_data
            .retain(|d| !removed.contains(&d.application_id));
        Ok(())
    }

    async fn insert_field(&self, field: NewFormField) -> Result<CustomFormField> {
        let mut tables = self.tables();
        if !tables.offers.iter().any(|o| o.id == field.job_offer_id) {
            return Err(Error::NotFound("Job offer not found".to_string()));
        }
        let field = CustomFormField {
            id: Uuid::new_v4(),
            job_offer_id: field.job_offer_id,
            label: field.label,
            field_type: field.field_type,
            options: field.options,
            is_required: field.is_required,
            created_at: Utc::now(),
        };
        tables.fields.push(field.clone());
        Ok(field)
    }

    async fn find_field(&self, id: Uuid) -> Result<Option<CustomFormField>> {
        Ok(self.tables().fields.iter().find(|f| f.id == id).cloned())
    }

    async fn list_fields(&self, offer_id: Uuid) -> Result<Vec<CustomFormField>> {
        Ok(self
            .tables()
            .fields
            .iter()
            .filter(|f| f.job_offer_id == offer_id)
            .cloned()
            .collect())
    }

    async fn delete_field(&self, id: Uuid) -> Result<()> {
        let mut tables = self.tables();
        let before = tables.fields.len();
        tables.fields.retain(|f| f.id != id);
        if tables.fields.len() == before {
            return Err(Error::NotFound("Form field not found".to_string()));
        }
        for answer in tables
            .custom_data
            .iter_mut()
            .filter(|d| d.form_field_id == Some(id))
        {
            answer.form_field_id = None;
        }
        Ok(())
    }

    async fn insert_application(
        &self,
        application: NewApplication,
        answers: Vec<NewCustomAnswer>,
    ) -> Result<Application> {
        let mut tables = self.tables();
        if tables.applications.iter().any(|(a, _)| {
            a.applicant_id == application.applicant_id && a.job_offer_id == application.job_offer_id
        }) {
            return Err(Error::InvalidArgument(
                "You have already applied to this offer".to_string(),
            ));
        }
        // every check happens before the first write so a failure leaves nothing behind
        if let Some(missing) = answers
            .iter()
            .find(|a| !tables.fields.iter().any(|f| f.id == a.form_field_id))
        {
            return Err(Error::NotFound(format!(
                "Form field not found: {}",
                missing.form_field_id
            )));
        }

        let now = Utc::now();
        let created = Application {
            id: Uuid::new_v4(),
            applicant_id: application.applicant_id,
            job_offer_id: application.job_offer_id,
            status: ApplicationStatus::Pending,
            cv_file_name: application.cv.file_name.clone(),
            cv_file_type: application.cv.file_type.clone(),
            cv_size: application.cv.data.len() as i64,
            submitted_at: now,
            cv_score: None,
            candidate_message: None,
            internal_notes: None,
            ai_summary: None,
            ai_interview_questions: None,
            updated_at: now,
        };
        tables.applications.push((created.clone(), application.cv));
        for answer in answers {
            tables.custom_data.push(ApplicationCustomData {
                id: Uuid::new_v4(),
                application_id: created.id,
                form_field_id: Some(answer.form_field_id),
                field_label: answer.field_label,
                value: answer.value,
            });
        }
        Ok(created)
    }

    async fn find_application(&self, id: Uuid) -> Result<Option<Application>> {
        Ok(self
            .tables()
            .applications
            .iter()
            .find(|(a, _)| a.id == id)
            .map(|(a, _)| a.clone()))
    }

    async fn find_application_for(
        &self,
        applicant_id: Uuid,
        offer_id: Uuid,
    ) -> Result<Option<Application>> {
        Ok(self
            .tables()
            .applications
            .iter()
            .find(|(a, _)| a.applicant_id == applicant_id && a.job_offer_id == offer_id)
            .map(|(a, _)| a.clone()))
    }

    async fn list_applications_for_offer(&self, offer_id: Uuid) -> Result<Vec<Application>> {
        Ok(self
            .tables()
            .applications
            .iter()
            .filter(|(a, _)| a.job_offer_id == offer_id)
            .map(|(a, _)| a.clone())
            .collect())
    }

    async fn list_applications_for_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<Application>> {
        Ok(self
            .tables()
            .applications
            .iter()
            .rev()
            .filter(|(a, _)| a.applicant_id == applicant_id)
            .map(|(a, _)| a.clone())
            .collect())
    }

    async fn update_application(
        &self,
        id: Uuid,
        update: ApplicationUpdate,
    ) -> Result<Application> {
        let mut tables = self.tables();
        let (stored, _) = tables
            .applications
            .iter_mut()
            .find(|(a, _)| a.id == id)
            .ok_or_else(|| Error::NotFound(format!("Application not found: {}", id)))?;
        if !update.apply_to(stored) {
            return Err(Error::NotFound(format!(
                "Application {} is no longer awaiting a decision",
                id
            )));
        }
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn update_applications(
        &self,
        updates: &[(Uuid, ApplicationUpdate)],
    ) -> Result<Vec<Application>> {
        let mut tables = self.tables();
        let mut written = Vec::with_capacity(updates.len());
        for (id, update) in updates {
            let Some((stored, _)) = tables.applications.iter_mut().find(|(a, _)| a.id == *id)
            else {
                continue;
            };
            if update.apply_to(stored) {
                stored.updated_at = Utc::now();
                written.push(stored.clone());
            }
        }
        Ok(written)
    }

    async fn fetch_cv(&self, application_id: Uuid) -> Result<Option<CvDocument>> {
        Ok(self
            .tables()
            .applications
            .iter()
            .find(|(a, _)| a.id == application_id)
            .map(|(_, cv)| cv.clone()))
    }

    async fn replace_cv(&self, application_id: Uuid, cv: CvDocument) -> Result<Application> {
        let mut tables = self.tables();
        let (stored, stored_cv) = tables
            .applications
            .iter_mut()
            .find(|(a, _)| a.id == application_id)
            .ok_or_else(|| Error::NotFound("Application not found".to_string()))?;
        stored.cv_file_name = cv.file_name.clone();
        stored.cv_file_type = cv.file_type.clone();
        stored.cv_size = cv.data.len() as i64;
        stored.updated_at = Utc::now();
        *stored_cv = cv;
        Ok(stored.clone())
    }

    async fn list_custom_data(&self, application_id: Uuid) -> Result<Vec<ApplicationCustomData>> {
        Ok(self
            .tables()
            .custom_data
            .iter()
            .filter(|d| d.application_id == application_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::form_field::FieldType;
    use crate::models::job_offer::ContractType;
    use crate::models::user::Role;

    async fn seed(store: &MemoryStore) -> (User, User, JobOffer) {
        let recruiter = store
            .insert_user(NewUser {
                first_name: "Rita".into(),
                last_name: "Recruiter".into(),
                email: "rita@example.com".into(),
                phone_number: None,
                role: Role::Recruiter,
            })
            .await
            .unwrap();
        let candidate = store
            .insert_user(NewUser {
                first_name: "Carl".into(),
                last_name: "Candidate".into(),
                email: "carl@example.com".into(),
                phone_number: None,
                role: Role::Candidate,
            })
            .await
            .unwrap();
        let offer = store
            .insert_offer(NewJobOffer {
                title: "Backend engineer".into(),
                description: "Build and run the hiring platform services.".into(),
                location: "Lyon".into(),
                contract_type: ContractType::Permanent,
                status: OfferStatus::Published,
                deadline: None,
                recruiter_id: recruiter.id,
            })
            .await
            .unwrap();
        (recruiter, candidate, offer)
    }

    fn cv() -> CvDocument {
        CvDocument {
            file_name: "cv.pdf".into(),
            file_type: "application/pdf".into(),
            data: b"%PDF-1.4".to_vec(),
        }
    }

    #[tokio::test]
    async fn second_application_for_same_pair_is_rejected() {
        let store = MemoryStore::new();
        let (_, candidate, offer) = seed(&store).await;
        let new = || NewApplication {
            applicant_id: candidate.id,
            job_offer_id: offer.id,
            cv: cv(),
        };
        store.insert_application(new(), vec![]).await.unwrap();
        let err = store.insert_application(new(), vec![]).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn deleting_a_field_orphans_answers_without_removing_them() {
        let store = MemoryStore::new();
        let (_, candidate, offer) = seed(&store).await;
        let field = store
            .insert_field(NewFormField {
                job_offer_id: offer.id,
                label: "Driving licence?".into(),
                field_type: FieldType::Text,
                options: vec![],
                is_required: false,
            })
            .await
            .unwrap();
        let app = store
            .insert_application(
                NewApplication {
                    applicant_id: candidate.id,
                    job_offer_id: offer.id,
                    cv: cv(),
                },
                vec![NewCustomAnswer {
                    form_field_id: field.id,
                    field_label: field.label.clone(),
                    value: "yes".into(),
                }],
            )
            .await
            .unwrap();

        store.delete_field(field.id).await.unwrap();

        let answers = store.list_custom_data(app.id).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].form_field_id, None);
        assert_eq!(answers[0].field_label, "Driving licence?");
    }
}
