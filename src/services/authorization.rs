//! Ownership checks shared by every sensitive operation. Everything here is a pure
//! function of ids; nothing reaches for ambient request state.

use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::application::Application;
use crate::models::job_offer::JobOffer;
use crate::models::user::Role;

/// The authenticated caller, passed explicitly into every core operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: Role,
}

impl Actor {
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    pub fn candidate(id: Uuid) -> Self {
        Self::new(id, Role::Candidate)
    }

    pub fn recruiter(id: Uuid) -> Self {
        Self::new(id, Role::Recruiter)
    }

    /// Role gate applied before dispatching to a service.
    pub fn require(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(Error::Forbidden(format!(
                "This action requires the {} role",
                role
            )))
        }
    }
}

pub fn is_owner_of_offer(actor: &Actor, offer: &JobOffer) -> bool {
    offer.recruiter_id == actor.id
}

pub fn is_applicant(actor: &Actor, application: &Application) -> bool {
    application.applicant_id == actor.id
}

/// `offer` must be the application's own offer; a mismatched pair never authorizes.
pub fn is_recruiter_for_application(
    actor: &Actor,
    application: &Application,
    offer: &JobOffer,
) -> bool {
    application.job_offer_id == offer.id && is_owner_of_offer(actor, offer)
}

pub fn ensure_offer_owner(actor: &Actor, offer: &JobOffer) -> Result<()> {
    if is_owner_of_offer(actor, offer) {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "You are not allowed to manage this offer".to_string(),
        ))
    }
}

pub fn ensure_recruiter_for_application(
    actor: &Actor,
    application: &Application,
    offer: &JobOffer,
) -> Result<()> {
    if is_recruiter_for_application(actor, application, offer) {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "You are not allowed to modify this application".to_string(),
        ))
    }
}

/// CV and custom answers are visible to the applicant and to the offer's recruiter only.
pub fn ensure_can_read_application(
    actor: &Actor,
    application: &Application,
    offer: &JobOffer,
) -> Result<()> {
    if is_applicant(actor, application) || is_recruiter_for_application(actor, application, offer)
    {
        Ok(())
    } else {
        Err(Error::Forbidden(
            "You are not allowed to access this application".to_string(),
        ))
    }
}
