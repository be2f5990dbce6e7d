pub mod application_dto;
pub mod form_dto;
pub mod offer_dto;

use serde::Serialize;

/// Envelope returned by mutating endpoints; failures use the error body from `crate::error`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}
