pub mod ai_service;
pub mod annotation_service;
pub mod application_service;
pub mod authorization;
pub mod form_service;
pub mod intake_service;
pub mod offer_service;

#[cfg(test)]
pub(crate) mod fixtures;
