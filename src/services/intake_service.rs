use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::database::SharedStore;
use crate::dto::application_dto::{ApplicationResponse, CustomAnswerInput};
use crate::error::{Error, Result};
use crate::models::application::{CvDocument, NewApplication, NewCustomAnswer};
use crate::models::form_field::MULTI_CHOICE_DELIMITER;
use crate::services::authorization::{is_applicant, Actor};

pub const MAX_CV_SIZE: usize = 5 * 1024 * 1024;
pub const PDF_MIME_TYPE: &str = "application/pdf";

/// A CV as received from the transport layer, before any validation.
#[derive(Debug, Clone)]
pub struct CvUpload {
    pub data: Vec<u8>,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
}

#[derive(Clone)]
pub struct IntakeService {
    store: SharedStore,
}

impl IntakeService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Validates and stores a new application with its custom answers. Checks run in a
    /// fixed order and the first failure wins; nothing is persisted unless all pass.
    pub async fn submit(
        &self,
        offer_id: Uuid,
        actor: &Actor,
        upload: CvUpload,
        answers: Vec<CustomAnswerInput>,
    ) -> Result<ApplicationResponse> {
        let cv = validate_cv(upload)?;

        let candidate = self
            .store
            .find_user(actor.id)
            .await?
            .ok_or_else(|| Error::NotFound("Candidate not found".to_string()))?;
        let offer = self
            .store
            .find_offer(offer_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Offer not found: {}", offer_id)))?;

        if !offer.is_published() {
            return Err(Error::Forbidden(
                "You cannot apply to an offer that is not published".to_string(),
            ));
        }

        if self
            .store
            .find_application_for(candidate.id, offer.id)
            .await?
            .is_some()
        {
            return Err(Error::InvalidArgument(
                "You have already applied to this offer".to_string(),
            ));
        }

        let mut bound = Vec::with_capacity(answers.len());
        for answer in answers {
            let field = self
                .store
                .find_field(answer.field_id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("Form field not found: {}", answer.field_id)))?;
            if field.job_offer_id != offer.id {
                return Err(Error::Forbidden(format!(
                    "Form field {} does not belong to this offer",
                    field.id
                )));
            }
            bound.push(NewCustomAnswer {
                form_field_id: field.id,
                field_label: field.label,
                value: answer_text(&answer.value)?,
            });
        }

        let answer_count = bound.len();
        // the unique (applicant, offer) constraint catches a concurrent duplicate here
        let application = self
            .store
            .insert_application(
                NewApplication {
                    applicant_id: candidate.id,
                    job_offer_id: offer.id,
                    cv,
                },
                bound,
            )
            .await?;

        tracing::info!(
            application_id = %application.id,
            offer_id = %offer.id,
            candidate_id = %candidate.id,
            answers = answer_count,
            "application submitted"
        );
        Ok(ApplicationResponse::from_parts(application, Some(&candidate), Some(&offer)).for_candidate())
    }

    /// Replaces the CV of an application that has not been decided yet.
    pub async fn update_cv(
        &self,
        application_id: Uuid,
        actor: &Actor,
        upload: CvUpload,
    ) -> Result<ApplicationResponse> {
        let cv = validate_cv(upload)?;

        let application = self
            .store
            .find_application(application_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Application not found: {}", application_id)))?;
        if !is_applicant(actor, &application) {
            return Err(Error::Forbidden(
                "You are not allowed to modify this application".to_string(),
            ));
        }
        if !application.status.is_pre_decision() {
            return Err(Error::InvalidState(format!(
                "The CV can no longer be replaced once the application is {}",
                application.status
            )));
        }

        let updated = self.store.replace_cv(application.id, cv).await?;
        tracing::info!(application_id = %updated.id, size = updated.cv_size, "application CV replaced");

        let candidate = self.store.find_user(updated.applicant_id).await?;
        let offer = self.store.find_offer(updated.job_offer_id).await?;
        Ok(ApplicationResponse::from_parts(updated, candidate.as_ref(), offer.as_ref()).for_candidate())
    }
}

fn validate_cv(upload: CvUpload) -> Result<CvDocument> {
    if upload.data.is_empty() {
        return Err(Error::InvalidArgument("The CV file cannot be empty".to_string()));
    }
    if upload.mime_type.as_deref() != Some(PDF_MIME_TYPE) {
        return Err(Error::InvalidArgument("The CV must be a PDF document".to_string()));
    }
    if upload.data.len() > MAX_CV_SIZE {
        return Err(Error::InvalidArgument(
            "The CV file must not exceed 5 MiB".to_string(),
        ));
    }

    Ok(CvDocument {
        file_name: clean_file_name(upload.file_name.as_deref()),
        file_type: PDF_MIME_TYPE.to_string(),
        data: upload.data,
    })
}

/// Keeps only the last path component of a client-supplied name.
fn clean_file_name(raw: Option<&str>) -> String {
    raw.and_then(|name| name.rsplit(['/', '\\']).next())
        .map(str::trim)
        .filter(|name| !name.is_empty() && *name != "." && *name != "..")
        .unwrap_or("cv.pdf")
        .to_string()
}

/// Stored form of an answer. Multi-choice selections arrive as an array and are joined
/// with the option delimiter, so no selected item may contain it.
fn answer_text(value: &JsonValue) -> Result<String> {
    match value {
        JsonValue::Null => Ok(String::new()),
        JsonValue::String(s) => Ok(s.clone()),
        JsonValue::Array(items) => {
            let mut choices = Vec::with_capacity(items.len());
            for item in items {
                let choice = answer_text(item)?;
                if choice.contains(MULTI_CHOICE_DELIMITER) {
                    return Err(Error::InvalidArgument(format!(
                        "Selected option \"{}\" must not contain '{}'",
                        choice, MULTI_CHOICE_DELIMITER
                    )));
                }
                choices.push(choice);
            }
            Ok(choices.join(&MULTI_CHOICE_DELIMITER.to_string()))
        }
        other => Ok(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::RecruitmentStore;
    use crate::models::application::ApplicationStatus;
    use crate::models::form_field::{FieldType, NewFormField};
    use crate::models::job_offer::OfferStatus;
    use crate::models::user::Role;
    use crate::services::fixtures;
    use serde_json::json;

    fn pdf(len: usize) -> CvUpload {
        CvUpload {
            data: vec![b'%'; len],
            file_name: Some("../../etc/resume.pdf".into()),
            mime_type: Some(PDF_MIME_TYPE.into()),
        }
    }

    async fn field(store: &crate::database::MemoryStore, offer_id: Uuid, label: &str) -> Uuid {
        store
            .insert_field(NewFormField {
                job_offer_id: offer_id,
                label: label.into(),
                field_type: FieldType::MultiChoice,
                options: vec!["Rust".into(), "Go".into()],
                is_required: false,
            })
            .await
            .unwrap()
            .id
    }

    #[test]
    fn cv_checks_run_in_order() {
        let empty = CvUpload {
            data: Vec::new(),
            file_name: None,
            mime_type: Some("image/png".into()),
        };
        assert!(matches!(validate_cv(empty), Err(Error::InvalidArgument(m)) if m.contains("empty")));

        let mut wrong_type = pdf(MAX_CV_SIZE + 1);
        wrong_type.mime_type = Some("application/pdf; charset=binary".into());
        assert!(matches!(validate_cv(wrong_type), Err(Error::InvalidArgument(m)) if m.contains("PDF")));

        assert!(matches!(validate_cv(pdf(MAX_CV_SIZE + 1)), Err(Error::InvalidArgument(m)) if m.contains("5 MiB")));
        let accepted = validate_cv(pdf(MAX_CV_SIZE)).unwrap();
        assert_eq!(accepted.data.len(), MAX_CV_SIZE);
        assert_eq!(accepted.file_name, "resume.pdf");
    }

    #[test]
    fn answers_are_flattened_to_text() {
        assert_eq!(answer_text(&json!("Five years")).unwrap(), "Five years");
        assert_eq!(answer_text(&json!("Rust; mostly")).unwrap(), "Rust; mostly");
        assert_eq!(answer_text(&json!(["Rust", "Go"])).unwrap(), "Rust;Go");
        assert_eq!(answer_text(&json!(3)).unwrap(), "3");
        assert_eq!(answer_text(&json!(true)).unwrap(), "true");
        assert_eq!(answer_text(&JsonValue::Null).unwrap(), "");
    }

    #[test]
    fn selections_split_back_into_what_was_chosen() {
        let stored = answer_text(&json!(["C++", "Rust", "Go"])).unwrap();
        let choices: Vec<&str> = stored.split(MULTI_CHOICE_DELIMITER).collect();
        assert_eq!(choices, vec!["C++", "Rust", "Go"]);

        assert!(matches!(
            answer_text(&json!(["C; C++", "Rust"])),
            Err(Error::InvalidArgument(m)) if m.contains("C; C++")
        ));
    }

    #[tokio::test]
    async fn a_selection_containing_the_delimiter_leaves_no_application() {
        let store = fixtures::store();
        let owner = fixtures::user(&store, Role::Recruiter, "hr@example.com").await;
        let candidate = fixtures::user(&store, Role::Candidate, "c@example.com").await;
        let offer = fixtures::offer(&store, &owner, OfferStatus::Published, None).await;
        let languages = field(&store, offer.id, "Languages").await;
        let service = IntakeService::new(store.clone());

        let result = service
            .submit(
                offer.id,
                &candidate,
                pdf(10),
                vec![CustomAnswerInput {
                    field_id: languages,
                    value: json!(["C; C++", "Rust"]),
                }],
            )
            .await;

        assert!(matches!(result, Err(Error::InvalidArgument(_))));
        assert!(store.list_applications_for_offer(offer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn submission_binds_answers_and_starts_pending() {
        let store = fixtures::store();
        let owner = fixtures::user(&store, Role::Recruiter, "hr@example.com").await;
        let candidate = fixtures::user(&store, Role::Candidate, "c@example.com").await;
        let offer = fixtures::offer(&store, &owner, OfferStatus::Published, None).await;
        let languages = field(&store, offer.id, "Languages").await;
        let service = IntakeService::new(store.clone());

        let submitted = service
            .submit(
                offer.id,
                &candidate,
                pdf(1024),
                vec![CustomAnswerInput {
                    field_id: languages,
                    value: json!(["Rust", "Go"]),
                }],
            )
            .await
            .unwrap();

        assert_eq!(submitted.status, ApplicationStatus::Pending);
        assert_eq!(submitted.cv_file_name, "resume.pdf");
        let answers = store.list_custom_data(submitted.id).await.unwrap();
        assert_eq!(answers.len(), 1);
        assert_eq!(answers[0].value, "Rust;Go");
        assert_eq!(answers[0].field_label, "Languages");
    }

    #[tokio::test]
    async fn second_application_is_rejected_whatever_the_first_status() {
        let store = fixtures::store();
        let owner = fixtures::user(&store, Role::Recruiter, "hr@example.com").await;
        let candidate = fixtures::user(&store, Role::Candidate, "c@example.com").await;
        let offer = fixtures::offer(&store, &owner, OfferStatus::Published, None).await;
        let service = IntakeService::new(store.clone());

        let first = service
            .submit(offer.id, &candidate, pdf(10), Vec::new())
            .await
            .unwrap();
        fixtures::decide(&store, first.id, ApplicationStatus::Rejected).await;

        assert!(matches!(
            service.submit(offer.id, &candidate, pdf(10), Vec::new()).await,
            Err(Error::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn foreign_field_rolls_back_the_whole_submission() {
        let store = fixtures::store();
        let owner = fixtures::user(&store, Role::Recruiter, "hr@example.com").await;
        let candidate = fixtures::user(&store, Role::Candidate, "c@example.com").await;
        let offer = fixtures::offer(&store, &owner, OfferStatus::Published, None).await;
        let other_offer = fixtures::offer(&store, &owner, OfferStatus::Published, None).await;
        let own_field = field(&store, offer.id, "Languages").await;
        let foreign_field = field(&store, other_offer.id, "Availability").await;
        let service = IntakeService::new(store.clone());

        let result = service
            .submit(
                offer.id,
                &candidate,
                pdf(10),
                vec![
                    CustomAnswerInput { field_id: own_field, value: json!("Rust") },
                    CustomAnswerInput { field_id: foreign_field, value: json!("Now") },
                ],
            )
            .await;

        assert!(matches!(result, Err(Error::Forbidden(_))));
        assert!(store
            .find_application_for(candidate.id, offer.id)
            .await
            .unwrap()
            .is_none());
        assert!(store.list_applications_for_offer(offer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unpublished_offer_and_unknown_field_are_refused() {
        let store = fixtures::store();
        let owner = fixtures::user(&store, Role::Recruiter, "hr@example.com").await;
        let candidate = fixtures::user(&store, Role::Candidate, "c@example.com").await;
        let draft = fixtures::offer(&store, &owner, OfferStatus::Draft, None).await;
        let open = fixtures::offer(&store, &owner, OfferStatus::Published, None).await;
        let service = IntakeService::new(store.clone());

        assert!(matches!(
            service.submit(draft.id, &candidate, pdf(10), Vec::new()).await,
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            service.submit(Uuid::new_v4(), &candidate, pdf(10), Vec::new()).await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service
                .submit(
                    open.id,
                    &candidate,
                    pdf(10),
                    vec![CustomAnswerInput { field_id: Uuid::new_v4(), value: json!("x") }],
                )
                .await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn only_the_applicant_replaces_the_cv_before_a_decision() {
        let store = fixtures::store();
        let owner = fixtures::user(&store, Role::Recruiter, "hr@example.com").await;
        let candidate = fixtures::user(&store, Role::Candidate, "c@example.com").await;
        let offer = fixtures::offer(&store, &owner, OfferStatus::Published, None).await;
        let service = IntakeService::new(store.clone());
        let submitted = service
            .submit(offer.id, &candidate, pdf(10), Vec::new())
            .await
            .unwrap();

        assert!(matches!(
            service.update_cv(submitted.id, &owner, pdf(20)).await,
            Err(Error::Forbidden(_))
        ));
        let updated = service
            .update_cv(submitted.id, &candidate, pdf(20))
            .await
            .unwrap();
        assert_eq!(updated.id, submitted.id);
        assert_eq!(store.fetch_cv(submitted.id).await.unwrap().unwrap().data.len(), 20);

        fixtures::decide(&store, submitted.id, ApplicationStatus::Accepted).await;
        assert!(matches!(
            service.update_cv(submitted.id, &candidate, pdf(30)).await,
            Err(Error::InvalidState(_))
        ));
    }
}
