//! # Folio Core
//!
//! The domain layer of Folio.
//! Post and user entities, the ports infrastructure must implement, the
//! validation rules for post forms and the post workflow itself.
//! Nothing in here touches the network, the database or the filesystem.

pub mod domain;
pub mod error;
pub mod ports;
pub mod validation;
pub mod workflow;

pub use error::DomainError;
pub use workflow::{Notice, Outcome, PostWorkflow};
