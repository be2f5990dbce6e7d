use uuid::Uuid;
use validator::Validate;

use crate::database::SharedStore;
use crate::dto::offer_dto::{JobOfferRequest, JobOfferResponse};
use crate::error::{Error, Result};
use crate::models::job_offer::{ContractType, JobOffer, NewJobOffer, OfferStatus};
use crate::services::authorization::{ensure_offer_owner, Actor};

#[derive(Clone)]
pub struct OfferService {
    store: SharedStore,
}

impl OfferService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, payload: JobOfferRequest, actor: &Actor) -> Result<JobOfferResponse> {
        payload.validate()?;
        let recruiter = self
            .store
            .find_user(actor.id)
            .await?
            .ok_or_else(|| Error::NotFound("Recruiter not found".to_string()))?;

        let offer = self
            .store
            .insert_offer(NewJobOffer {
                title: payload.title.trim().to_string(),
                description: payload.description,
                location: payload.location.trim().to_string(),
                contract_type: payload.contract_type.parse::<ContractType>()?,
                status: payload.status.parse::<OfferStatus>()?,
                deadline: payload.deadline,
                recruiter_id: recruiter.id,
            })
            .await?;

        tracing::info!(offer_id = %offer.id, recruiter_id = %recruiter.id, "job offer created");
        Ok(JobOfferResponse::from_parts(offer, Some(&recruiter)))
    }

    pub async fn update(
        &self,
        id: Uuid,
        payload: JobOfferRequest,
        actor: &Actor,
    ) -> Result<JobOfferResponse> {
        payload.validate()?;
        let mut offer = self.load(id).await?;
        ensure_offer_owner(actor, &offer)?;

        offer.title = payload.title.trim().to_string();
        offer.description = payload.description;
        offer.location = payload.location.trim().to_string();
        offer.contract_type = payload.contract_type.parse()?;
        offer.status = payload.status.parse()?;
        offer.deadline = payload.deadline;

        let updated = self.store.update_offer(&offer).await?;
        tracing::info!(offer_id = %updated.id, status = ?updated.status, "job offer updated");
        self.present(updated).await
    }

    pub async fn delete(&self, id: Uuid, actor: &Actor) -> Result<()> {
        let offer = self.load(id).await?;
        ensure_offer_owner(actor, &offer)?;
        self.store.delete_offer(offer.id).await?;
        tracing::info!(offer_id = %id, "job offer deleted");
        Ok(())
    }

    pub async fn list_public(&self) -> Result<Vec<JobOfferResponse>> {
        let offers = self.store.list_offers_by_status(OfferStatus::Published).await?;
        let mut items = Vec::with_capacity(offers.len());
        for offer in offers {
            items.push(self.present(offer).await?);
        }
        Ok(items)
    }

    /// Unpublished offers are indistinguishable from missing ones for the public.
    pub async fn get_public(&self, id: Uuid) -> Result<JobOfferResponse> {
        let offer = self
            .store
            .find_offer(id)
            .await?
            .filter(JobOffer::is_published)
            .ok_or_else(|| Error::NotFound(format!("Offer not found or not published: {}", id)))?;
        self.present(offer).await
    }

    pub async fn get_details(&self, id: Uuid, actor: &Actor) -> Result<JobOfferResponse> {
        let offer = self.load(id).await?;
        ensure_offer_owner(actor, &offer)?;
        self.present(offer).await
    }

    pub async fn list_mine(&self, actor: &Actor) -> Result<Vec<JobOfferResponse>> {
        let recruiter = self.store.find_user(actor.id).await?;
        let offers = self.store.list_offers_by_recruiter(actor.id).await?;
        Ok(offers
            .into_iter()
            .map(|offer| JobOfferResponse::from_parts(offer, recruiter.as_ref()))
            .collect())
    }

    async fn load(&self, id: Uuid) -> Result<JobOffer> {
        self.store
            .find_offer(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Offer not found: {}", id)))
    }

    async fn present(&self, offer: JobOffer) -> Result<JobOfferResponse> {
        let recruiter = self.store.find_user(offer.recruiter_id).await?;
        Ok(JobOfferResponse::from_parts(offer, recruiter.as_ref()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{MemoryStore, RecruitmentStore};
    use crate::models::user::{NewUser, Role};
    use std::sync::Arc;

    async fn recruiter(store: &MemoryStore, email: &str) -> Actor {
        let user = store
            .insert_user(NewUser {
                first_name: "Hana".into(),
                last_name: "Recruiter".into(),
                email: email.into(),
                phone_number: None,
                role: Role::Recruiter,
            })
            .await
            .unwrap();
        Actor::recruiter(user.id)
    }

    fn request(status: &str) -> JobOfferRequest {
        JobOfferRequest {
            title: "Site reliability engineer".into(),
            description: "Keep the platform fast, observable and boring.".into(),
            location: "Remote".into(),
            contract_type: "permanent".into(),
            status: status.into(),
            deadline: None,
        }
    }

    #[tokio::test]
    async fn unpublished_offers_are_hidden_from_the_public() {
        let store = Arc::new(MemoryStore::new());
        let owner = recruiter(&store, "owner@example.com").await;
        let service = OfferService::new(store.clone());

        let draft = service.create(request("draft"), &owner).await.unwrap();
        let archived = service.create(request("archived"), &owner).await.unwrap();
        let published = service.create(request("published"), &owner).await.unwrap();

        for hidden in [draft.id, archived.id] {
            assert!(matches!(
                service.get_public(hidden).await,
                Err(Error::NotFound(_))
            ));
        }
        let visible = service.get_public(published.id).await.unwrap();
        assert_eq!(visible.recruiter_name.as_deref(), Some("Hana Recruiter"));

        let listed = service.list_public().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, published.id);
    }

    #[tokio::test]
    async fn only_the_owner_can_update_or_delete() {
        let store = Arc::new(MemoryStore::new());
        let owner = recruiter(&store, "owner@example.com").await;
        let other = recruiter(&store, "other@example.com").await;
        let service = OfferService::new(store.clone());
        let offer = service.create(request("draft"), &owner).await.unwrap();

        assert!(matches!(
            service.update(offer.id, request("published"), &other).await,
            Err(Error::Forbidden(_))
        ));
        assert!(matches!(
            service.delete(offer.id, &other).await,
            Err(Error::Forbidden(_))
        ));

        let updated = service
            .update(offer.id, request("published"), &owner)
            .await
            .unwrap();
        assert_eq!(updated.status, OfferStatus::Published);

        service.delete(offer.id, &owner).await.unwrap();
        assert!(matches!(
            service.get_details(offer.id, &owner).await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn unknown_contract_type_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let owner = recruiter(&store, "owner@example.com").await;
        let service = OfferService::new(store.clone());
        let mut payload = request("draft");
        payload.contract_type = "zero-hours".into();

        assert!(matches!(
            service.create(payload, &owner).await,
            Err(Error::InvalidArgument(_))
        ));
    }
}
