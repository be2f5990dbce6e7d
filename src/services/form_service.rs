use uuid::Uuid;
use validator::Validate;

use crate::database::SharedStore;
use crate::dto::form_dto::{CustomFormFieldRequest, CustomFormFieldResponse};
use crate::error::{Error, Result};
use crate::models::form_field::{CustomFormField, FieldType, NewFormField, MULTI_CHOICE_DELIMITER};
use crate::models::job_offer::JobOffer;
use crate::services::authorization::{ensure_offer_owner, Actor};

/// Recruiter-defined application questions, scoped to one job offer.
#[derive(Clone)]
pub struct FormService {
    store: SharedStore,
}

impl FormService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create_field(
        &self,
        offer_id: Uuid,
        payload: CustomFormFieldRequest,
        actor: &Actor,
    ) -> Result<CustomFormFieldResponse> {
        payload.validate()?;
        let offer = self.load_offer(offer_id).await?;
        ensure_offer_owner(actor, &offer)?;

        let field_type: FieldType = payload.field_type.parse()?;
        let options = normalize_options(field_type, payload.options.unwrap_or_default())?;

        let field = self
            .store
            .insert_field(NewFormField {
                job_offer_id: offer.id,
                label: payload.label.trim().to_string(),
                field_type,
                options,
                is_required: payload.is_required,
            })
            .await?;

        tracing::info!(field_id = %field.id, offer_id = %offer.id, field_type = ?field.field_type, "form field created");
        Ok(field.into())
    }

    /// Public: candidates need the schema to render the application form.
    pub async fn list_fields(&self, offer_id: Uuid) -> Result<Vec<CustomFormFieldResponse>> {
        let offer = self.load_offer(offer_id).await?;
        let fields = self.store.list_fields(offer.id).await?;
        Ok(fields.into_iter().map(Into::into).collect())
    }

    /// Answers already submitted against the field stay on their applications.
    pub async fn delete_field(&self, field_id: Uuid, actor: &Actor) -> Result<()> {
        let field = self.load_field(field_id).await?;
        let offer = self.load_offer(field.job_offer_id).await?;
        ensure_offer_owner(actor, &offer)?;

        self.store.delete_field(field.id).await?;
        tracing::info!(field_id = %field.id, offer_id = %offer.id, "form field deleted");
        Ok(())
    }

    pub(crate) async fn load_field(&self, field_id: Uuid) -> Result<CustomFormField> {
        self.store
            .find_field(field_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Form field not found: {}", field_id)))
    }

    async fn load_offer(&self, offer_id: Uuid) -> Result<JobOffer> {
        self.store
            .find_offer(offer_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Offer not found: {}", offer_id)))
    }
}

/// Choice fields keep their trimmed, non-empty options in order; free-text fields carry none.
/// Options may not contain the multi-choice delimiter, which would make stored answers
/// ambiguous.
fn normalize_options(field_type: FieldType, raw: Vec<String>) -> Result<Vec<String>> {
    if !field_type.is_choice() {
        return Ok(Vec::new());
    }
    let options: Vec<String> = raw
        .into_iter()
        .map(|o| o.trim().to_string())
        .filter(|o| !o.is_empty())
        .collect();
    if let Some(bad) = options.iter().find(|o| o.contains(MULTI_CHOICE_DELIMITER)) {
        return Err(Error::InvalidArgument(format!(
            "Option \"{}\" must not contain '{}'",
            bad, MULTI_CHOICE_DELIMITER
        )));
    }
    if options.is_empty() {
        return Err(Error::InvalidArgument(
            "Choice fields need at least one option".to_string(),
        ));
    }
    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryStore, RecruitmentStore};
    use crate::models::job_offer::{ContractType, NewJobOffer, OfferStatus};
    use crate::dto::application_dto::CustomAnswerInput;
    use crate::models::user::{NewUser, Role};
    use crate::services::application_service::ApplicationService;
    use crate::services::fixtures;
    use crate::services::intake_service::{CvUpload, IntakeService};
    use serde_json::json;
    use std::sync::Arc;

    async fn setup() -> (Arc<MemoryStore>, Actor, Actor, JobOffer) {
        let store = Arc::new(MemoryStore::new());
        let mut actors = Vec::new();
        for email in ["owner@example.com", "intruder@example.com"] {
            let user = store
                .insert_user(NewUser {
                    first_name: "R".into(),
                    last_name: "H".into(),
                    email: email.into(),
                    phone_number: None,
                    role: Role::Recruiter,
                })
                .await
                .unwrap();
            actors.push(Actor::recruiter(user.id));
        }
        let offer = store
            .insert_offer(NewJobOffer {
                title: "Support engineer".into(),
                description: "Help customers get the most out of the product.".into(),
                location: "Nantes".into(),
                contract_type: ContractType::Permanent,
                status: OfferStatus::Draft,
                deadline: None,
                recruiter_id: actors[0].id,
            })
            .await
            .unwrap();
        (store, actors[0], actors[1], offer)
    }

    fn field(label: &str, field_type: &str, options: Option<Vec<&str>>) -> CustomFormFieldRequest {
        CustomFormFieldRequest {
            label: label.into(),
            field_type: field_type.into(),
            options: options.map(|o| o.into_iter().map(String::from).collect()),
            is_required: true,
        }
    }

    #[tokio::test]
    async fn fields_are_listed_in_creation_order_with_options_only_on_choices() {
        let (store, owner, _, offer) = setup().await;
        let service = FormService::new(store);

        service
            .create_field(offer.id, field("Why us?", "textarea", Some(vec!["ignored"])), &owner)
            .await
            .unwrap();
        service
            .create_field(
                offer.id,
                field("Languages", "multi_choice", Some(vec![" Rust ", "", "Go"])),
                &owner,
            )
            .await
            .unwrap();

        let fields = service.list_fields(offer.id).await.unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].label, "Why us?");
        assert_eq!(fields[0].options, None);
        assert_eq!(
            fields[1].options,
            Some(vec!["Rust".to_string(), "Go".to_string()])
        );
    }

    #[tokio::test]
    async fn create_checks_existence_ownership_then_type() {
        let (store, owner, intruder, offer) = setup().await;
        let service = FormService::new(store);

        assert!(matches!(
            service
                .create_field(Uuid::new_v4(), field("Q", "text", None), &owner)
                .await,
            Err(Error::NotFound(_))
        ));
        assert!(matches!(
            service
                .create_field(offer.id, field("Q", "text", None), &intruder)
                .await,
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            service
                .create_field(offer.id, field("Q", "date", None), &owner)
                .await,
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            service
                .create_field(offer.id, field("Q", "single_choice", Some(vec![])), &owner)
                .await,
            Err(Error::InvalidArgument(_))
        ));
    }

    #[tokio::test]
    async fn options_containing_the_answer_delimiter_are_refused() {
        let (store, owner, _, offer) = setup().await;
        let service = FormService::new(store);

        let result = service
            .create_field(
                offer.id,
                field("Languages", "MULTI_CHOICE", Some(vec!["C; C++", "Rust"])),
                &owner,
            )
            .await;
        assert!(matches!(result, Err(Error::InvalidArgument(m)) if m.contains("C; C++")));

        // free-text fields ignore options, so the delimiter is harmless there
        service
            .create_field(offer.id, field("Stack", "text", Some(vec!["a;b"])), &owner)
            .await
            .unwrap();
        assert_eq!(service.list_fields(offer.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_requires_ownership() {
        let (store, owner, intruder, offer) = setup().await;
        let service = FormService::new(store);
        let created = service
            .create_field(offer.id, field("Notice period", "text", None), &owner)
            .await
            .unwrap();

        assert!(matches!(
            service.delete_field(created.id, &intruder).await,
            Err(Error::Forbidden(_))
        ));
        service.delete_field(created.id, &owner).await.unwrap();
        assert!(matches!(
            service.delete_field(created.id, &owner).await,
            Err(Error::NotFound(_))
        ));
        assert!(service.list_fields(offer.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn deleting_a_field_keeps_submitted_answers_readable() {
        let store = fixtures::store();
        let owner = fixtures::user(&store, Role::Recruiter, "hr@example.com").await;
        let candidate = fixtures::user(&store, Role::Candidate, "c@example.com").await;
        let offer = fixtures::offer(&store, &owner, OfferStatus::Published, None).await;
        let forms = FormService::new(store.clone());
        let question = forms
            .create_field(offer.id, field("Notice period", "text", None), &owner)
            .await
            .unwrap();
        let submitted = IntakeService::new(store.clone())
            .submit(
                offer.id,
                &candidate,
                CvUpload {
                    data: b"%PDF".to_vec(),
                    file_name: Some("cv.pdf".into()),
                    mime_type: Some(fixtures::PDF_MIME.into()),
                },
                vec![CustomAnswerInput {
                    field_id: question.id,
                    value: json!("Two months"),
                }],
            )
            .await
            .unwrap();

        forms.delete_field(question.id, &owner).await.unwrap();

        let applications = ApplicationService::new(store.clone());
        for reader in [&candidate, &owner] {
            let answers = applications
                .get_custom_data(submitted.id, reader)
                .await
                .unwrap();
            assert_eq!(answers.len(), 1);
            assert_eq!(answers[0].field_id, None);
            assert_eq!(answers[0].label, "Notice period");
            assert_eq!(answers[0].value, "Two months");
        }
    }

    #[tokio::test]
    async fn listing_fields_of_a_missing_offer_is_not_found() {
        let (store, _, _, _) = setup().await;
        let service = FormService::new(store);
        assert!(matches!(
            service.list_fields(Uuid::new_v4()).await,
            Err(Error::NotFound(_))
        ));
    }
}
