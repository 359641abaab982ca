//! HTTP routes for Folio

pub mod admin;
pub mod auth_routes;
pub mod health;
pub mod public;
pub mod response;

pub use admin::handle_admin_request;
pub use auth_routes::{handle_auth_request, SessionStatus};
pub use health::health_check;
pub use public::handle_api_request;
pub use response::{BoxBody, ErrorResponse, MAX_BODY_BYTES};
