//! Service layer for business logic
//!
//! Shared by the HTTP handlers and the CLI; every service is built from
//! explicitly passed storage handles so tests can run isolated instances.

mod content_service;
mod sweeper;

pub use content_service::*;
pub use sweeper::*;
