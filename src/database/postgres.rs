use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::store::RecruitmentStore;
use crate::error::{Error, Result};
use crate::models::application::{
    Application, ApplicationCustomData, ApplicationUpdate, CvDocument, NewApplication,
    NewCustomAnswer,
};
use crate::models::form_field::{CustomFormField, NewFormField};
use crate::models::job_offer::{JobOffer, NewJobOffer, OfferStatus};
use crate::models::user::{NewUser, User};

const USER_COLUMNS: &str = "id, first_name, last_name, email, phone_number, role, created_at";
const OFFER_COLUMNS: &str = "id, title, description, location, contract_type, status, deadline, recruiter_id, created_at, updated_at";
const FIELD_COLUMNS: &str = "id, job_offer_id, label, field_type, options, is_required, created_at";
const APPLICATION_COLUMNS: &str = "id, applicant_id, job_offer_id, status, cv_file_name, cv_file_type, cv_size, submitted_at, cv_score, candidate_message, internal_notes, ai_summary, ai_interview_questions, updated_at";

const APPLICATION_PAIR_CONSTRAINT: &str = "applications_applicant_offer_key";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Runs one column-targeted update. `None` when the row is gone or, for a decision, no
/// longer pre-decision.
async fn apply_update<'e, E>(
    executor: E,
    id: Uuid,
    update: &ApplicationUpdate,
) -> Result<Option<Application>>
where
    E: PgExecutor<'e>,
{
    let (assignments, guard) = match update {
        ApplicationUpdate::Status { .. } => ("status = $2, candidate_message = $3", ""),
        ApplicationUpdate::Decision { .. } => (
            "status = $2, candidate_message = COALESCE(candidate_message, $3)",
            " AND status IN ('PENDING', 'REVIEWED')",
        ),
        ApplicationUpdate::Score(_) => ("cv_score = $2", ""),
        ApplicationUpdate::InternalNotes(_) => ("internal_notes = $2", ""),
        ApplicationUpdate::AiSummary(_) => ("ai_summary = $2", ""),
        ApplicationUpdate::AiInterviewQuestions(_) => ("ai_interview_questions = $2", ""),
    };
    let sql = format!(
        "UPDATE applications SET {assignments}, updated_at = NOW() \
         WHERE id = $1{guard} RETURNING {APPLICATION_COLUMNS}"
    );

    let query = sqlx::query_as::<_, Application>(&sql).bind(id);
    let query = match update {
        ApplicationUpdate::Status { status, message } => {
            query.bind(*status).bind(message.clone())
        }
        ApplicationUpdate::Decision {
            status,
            default_message,
        } => query.bind(*status).bind(default_message.clone()),
        ApplicationUpdate::Score(score) => query.bind(*score),
        ApplicationUpdate::InternalNotes(notes) => query.bind(notes.clone()),
        ApplicationUpdate::AiSummary(text) | ApplicationUpdate::AiInterviewQuestions(text) => {
            query.bind(text.clone())
        }
    };
    Ok(query.fetch_optional(executor).await?)
}

fn map_insert_error(err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() && db_err.constraint() == Some(APPLICATION_PAIR_CONSTRAINT)
        {
            return Error::InvalidArgument("You have already applied to this offer".to_string());
        }
        if db_err.is_foreign_key_violation() {
            return Error::NotFound("Referenced form field no longer exists".to_string());
        }
    }
    err.into()
}

#[async_trait]
impl RecruitmentStore for PgStore {
    async fn insert_user(&self, user: NewUser) -> Result<User> {
        let sql = format!(
            "INSERT INTO users (first_name, last_name, email, phone_number, role)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {USER_COLUMNS}"
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user.first_name)
            .bind(user.last_name)
            .bind(user.email)
            .bind(user.phone_number)
            .bind(user.role)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn insert_offer(&self, offer: NewJobOffer) -> Result<JobOffer> {
        let sql = format!(
            "INSERT INTO job_offers (title, description, location, contract_type, status, deadline, recruiter_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {OFFER_COLUMNS}"
        );
        let offer = sqlx::query_as::<_, JobOffer>(&sql)
            .bind(offer.title)
            .bind(offer.description)
            .bind(offer.location)
            .bind(offer.contract_type)
            .bind(offer.status)
            .bind(offer.deadline)
            .bind(offer.recruiter_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(offer)
    }

    async fn find_offer(&self, id: Uuid) -> Result<Option<JobOffer>> {
        let sql = format!("SELECT {OFFER_COLUMNS} FROM job_offers WHERE id = $1");
        let offer = sqlx::query_as::<_, JobOffer>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(offer)
    }

    async fn list_offers_by_status(&self, status: OfferStatus) -> Result<Vec<JobOffer>> {
        let sql = format!(
            "SELECT {OFFER_COLUMNS} FROM job_offers WHERE status = $1 ORDER BY created_at DESC"
        );
        let offers = sqlx::query_as::<_, JobOffer>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;
        Ok(offers)
    }

    async fn list_offers_by_recruiter(&self, recruiter_id: Uuid) -> Result<Vec<JobOffer>> {
        let sql = format!(
            "SELECT {OFFER_COLUMNS} FROM job_offers WHERE recruiter_id = $1 ORDER BY created_at DESC"
        );
        let offers = sqlx::query_as::<_, JobOffer>(&sql)
            .bind(recruiter_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(offers)
    }

    async fn update_offer(&self, offer: &JobOffer) -> Result<JobOffer> {
        let sql = format!(
            "UPDATE job_offers
             SET title = $2,
                 description = $3,
                 location = $4,
                 contract_type = $5,
                 status = $6,
                 deadline = $7,
                 updated_at = NOW()
             WHERE id = $1
             RETURNING {OFFER_COLUMNS}"
        );
        let updated = sqlx::query_as::<_, JobOffer>(&sql)
            .bind(offer.id)
            .bind(&offer.title)
            .bind(&offer.description)
            .bind(&offer.location)
            .bind(offer.contract_type)
            .bind(offer.status)
            .bind(offer.deadline)
            .fetch_one(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn delete_offer(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM job_offers WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Job offer not found".to_string()));
        }
        Ok(())
    }

    async fn insert_field(&self, field: NewFormField) -> Result<CustomFormField> {
        let sql = format!(
            "INSERT INTO custom_form_fields (job_offer_id, label, field_type, options, is_required)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {FIELD_COLUMNS}"
        );
        let field = sqlx::query_as::<_, CustomFormField>(&sql)
            .bind(field.job_offer_id)
            .bind(field.label)
            .bind(field.field_type)
            .bind(field.options)
            .bind(field.is_required)
            .fetch_one(&self.pool)
            .await?;
        Ok(field)
    }

    async fn find_field(&self, id: Uuid) -> Result<Option<CustomFormField>> {
        let sql = format!("SELECT {FIELD_COLUMNS} FROM custom_form_fields WHERE id = $1");
        let field = sqlx::query_as::<_, CustomFormField>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(field)
    }

    async fn list_fields(&self, offer_id: Uuid) -> Result<Vec<CustomFormField>> {
        let sql = format!(
            "SELECT {FIELD_COLUMNS} FROM custom_form_fields WHERE job_offer_id = $1 ORDER BY position ASC"
        );
        let fields = sqlx::query_as::<_, CustomFormField>(&sql)
            .bind(offer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(fields)
    }

    async fn delete_field(&self, id: Uuid) -> Result<()> {
        let res = sqlx::query("DELETE FROM custom_form_fields WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if res.rows_affected() == 0 {
            return Err(Error::NotFound("Form field not found".to_string()));
        }
        Ok(())
    }

    async fn insert_application(
        &self,
        application: NewApplication,
        answers: Vec<NewCustomAnswer>,
    ) -> Result<Application> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "INSERT INTO applications (applicant_id, job_offer_id, status, cv_data, cv_file_name, cv_file_type, cv_size)
             VALUES ($1, $2, 'PENDING', $3, $4, $5, $6)
             RETURNING {APPLICATION_COLUMNS}"
        );
        let cv_size = application.cv.data.len() as i64;
        let created = sqlx::query_as::<_, Application>(&sql)
            .bind(application.applicant_id)
            .bind(application.job_offer_id)
            .bind(application.cv.data)
            .bind(application.cv.file_name)
            .bind(application.cv.file_type)
            .bind(cv_size)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_insert_error)?;

        for answer in answers {
            sqlx::query(
                r#"
                INSERT INTO application_custom_data (application_id, form_field_id, field_label, value)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(created.id)
            .bind(answer.form_field_id)
            .bind(answer.field_label)
            .bind(answer.value)
            .execute(&mut *tx)
            .await
            .map_err(map_insert_error)?;
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn find_application(&self, id: Uuid) -> Result<Option<Application>> {
        let sql = format!("SELECT {APPLICATION_COLUMNS} FROM applications WHERE id = $1");
        let application = sqlx::query_as::<_, Application>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(application)
    }

    async fn find_application_for(
        &self,
        applicant_id: Uuid,
        offer_id: Uuid,
    ) -> Result<Option<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE applicant_id = $1 AND job_offer_id = $2"
        );
        let application = sqlx::query_as::<_, Application>(&sql)
            .bind(applicant_id)
            .bind(offer_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(application)
    }

    async fn list_applications_for_offer(&self, offer_id: Uuid) -> Result<Vec<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE job_offer_id = $1 ORDER BY arrival_seq ASC"
        );
        let applications = sqlx::query_as::<_, Application>(&sql)
            .bind(offer_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(applications)
    }

    async fn list_applications_for_applicant(
        &self,
        applicant_id: Uuid,
    ) -> Result<Vec<Application>> {
        let sql = format!(
            "SELECT {APPLICATION_COLUMNS} FROM applications WHERE applicant_id = $1 ORDER BY arrival_seq DESC"
        );
        let applications = sqlx::query_as::<_, Application>(&sql)
            .bind(applicant_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(applications)
    }

    async fn update_application(
        &self,
        id: Uuid,
        update: ApplicationUpdate,
    ) -> Result<Application> {
        apply_update(&self.pool, id, &update).await?.ok_or_else(|| {
            Error::NotFound(format!("Application {} not found or already decided", id))
        })
    }

    async fn update_applications(
        &self,
        updates: &[(Uuid, ApplicationUpdate)],
    ) -> Result<Vec<Application>> {
        let mut tx = self.pool.begin().await?;
        let mut written = Vec::with_capacity(updates.len());
        for (id, update) in updates {
            if let Some(row) = apply_update(&mut *tx, *id, update).await? {
                written.push(row);
            }
        }
        tx.commit().await?;
        Ok(written)
    }

    async fn fetch_cv(&self, application_id: Uuid) -> Result<Option<CvDocument>> {
        let cv = sqlx::query_as::<_, CvDocument>(
            r#"
            SELECT cv_file_name AS file_name, cv_file_type AS file_type, cv_data AS data
            FROM applications
            WHERE id = $1
            "#,
        )
        .bind(application_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(cv)
    }

    async fn replace_cv(&self, application_id: Uuid, cv: CvDocument) -> Result<Application> {
        let sql = format!(
            "UPDATE applications
             SET cv_data = $2, cv_file_name = $3, cv_file_type = $4, cv_size = $5, updated_at = NOW()
             WHERE id = $1
             RETURNING {APPLICATION_COLUMNS}"
        );
        let cv_size = cv.data.len() as i64;
        let updated = sqlx::query_as::<_, Application>(&sql)
            .bind(application_id)
            .bind(cv.data)
            .bind(cv.file_name)
            .bind(cv.file_type)
            .bind(cv_size)
            .fetch_one(&self.pool)
            .await?;
        Ok(updated)
    }

    async fn list_custom_data(&self, application_id: Uuid) -> Result<Vec<ApplicationCustomData>> {
        let rows = sqlx::query_as::<_, ApplicationCustomData>(
            r#"
            SELECT id, application_id, form_field_id, field_label, value
            FROM application_custom_data
            WHERE application_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(application_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}
