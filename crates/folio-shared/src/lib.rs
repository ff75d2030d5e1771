//! # Folio Shared
//!
//! Wire types used at the HTTP edge: form payloads, JSON bodies and
//! problem details for error pages.

pub mod dto;
pub mod response;

pub use dto::{HealthResponse, LoginRequest};
pub use response::ErrorResponse;
