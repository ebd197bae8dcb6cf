pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{Credentials, Registration, TokenResponse};

use crate::domain::email::Email;
use crate::domain::session::UserProfile;

/// The REST surface of the portal backend, as consumed by the controller.
#[cfg_attr(test, mockall::automock)]
pub trait Backend {
    /// `POST /login`
    fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ApiError>;
    /// `POST /register`
    fn register(&self, registration: &Registration) -> Result<(), ApiError>;
    /// `GET /user/profile`
    fn profile(&self, token: &str) -> Result<UserProfile, ApiError>;
    /// `GET /emails`
    fn emails(&self, token: &str) -> Result<Vec<Email>, ApiError>;
    /// `GET /emails/{id}/attachments/{filename}`
    fn attachment(&self, token: &str, email_id: &str, filename: &str) -> Result<Vec<u8>, ApiError>;
    /// `POST /logout`
    fn logout(&self, token: &str) -> Result<(), ApiError>;
}
