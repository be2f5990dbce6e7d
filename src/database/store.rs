use async_trait::async_trait;
use std::sync::Arc;
use uuid::Uuid;

use crate::error::Result;
use crate::models::application::{
    Application, ApplicationCustomData, ApplicationUpdate, CvDocument, NewApplication,
    NewCustomAnswer,
};
use crate::models::form_field::{CustomFormField, NewFormField};
use crate::models::job_offer::{JobOffer, NewJobOffer, OfferStatus};
use crate::models::user::{NewUser, User};

pub type SharedStore = Arc<dyn RecruitmentStore>;

/// Persistence seam for the recruitment core. Services only talk to this trait; every
/// method is a single atomic unit from the caller's point of view.
#[async_trait]
pub trait RecruitmentStore: Send + Sync {
    async fn insert_user(&self, user: NewUser) -> Result<User>;
    async fn find_user(&self, id: Uuid) -> Result<Option<User>>;

    async fn insert_offer(&self, offer: NewJobOffer) -> Result<JobOffer>;
    async fn find_offer(&self, id: Uuid) -> Result<Option<JobOffer>>;
    /// Newest first.
    async fn list_offers_by_status(&self, status: OfferStatus) -> Result<Vec<JobOffer>>;
    async fn list_offers_by_recruiter(&self, recruiter_id: Uuid) -> Result<Vec<JobOffer>>;
    async fn update_offer(&self, offer: &JobOffer) -> Result<JobOffer>;
    /// Cascades to the offer's form fields and applications.
    async fn delete_offer(&self, id: Uuid) -> Result<()>;

    async fn insert_field(&self, field: NewFormField) -> Result<CustomFormField>;
    async fn find_field(&self, id: Uuid) -> Result<Option<CustomFormField>>;
    /// Creation order.
    async fn list_fields(&self, offer_id: Uuid) -> Result<Vec<CustomFormField>>;
    /// Answers referencing the field are kept with their label snapshot.
    async fn delete_field(&self, id: Uuid) -> Result<()>;

    /// Inserts the application and its answers in one transaction. A second application
    /// for the same (applicant, offer) pair fails with `InvalidArgument`.
    async fn insert_application(
        &self,
        application: NewApplication,
        answers: Vec<NewCustomAnswer>,
    ) -> Result<Application>;
    async fn find_application(&self, id: Uuid) -> Result<Option<Application>>;
    async fn find_application_for(
        &self,
        applicant_id: Uuid,
        offer_id: Uuid,
    ) -> Result<Option<Application>>;
    /// Arrival order.
    async fn list_applications_for_offer(&self, offer_id: Uuid) -> Result<Vec<Application>>;
    /// Newest first.
    async fn list_applications_for_applicant(&self, applicant_id: Uuid)
        -> Result<Vec<Application>>;
    /// Writes only the columns named by `update`. `NotFound` when the row is gone or a
    /// decision no longer applies to it.
    async fn update_application(&self, id: Uuid, update: ApplicationUpdate)
        -> Result<Application>;
    /// Applies several updates in one transaction and returns the rows actually written.
    /// Rows deleted in the meantime, and decisions on rows that are no longer pre-decision,
    /// are skipped.
    async fn update_applications(
        &self,
        updates: &[(Uuid, ApplicationUpdate)],
    ) -> Result<Vec<Application>>;

    async fn fetch_cv(&self, application_id: Uuid) -> Result<Option<CvDocument>>;
    async fn replace_cv(&self, application_id: Uuid, cv: CvDocument) -> Result<Application>;

    async fn list_custom_data(&self, application_id: Uuid) -> Result<Vec<ApplicationCustomData>>;
}
