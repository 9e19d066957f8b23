//! Ephemera - short-lived file drops and short URLs
//!
//! Uploaded files and shortened URLs get a random identifier and an expiry.
//! Reads past the expiry behave exactly like reads of an unknown identifier,
//! and a background sweeper reclaims expired rows and blobs.
//!
//! # Architecture
//! - `storage`: metadata store (sea-orm) and blob store (filesystem)
//! - `services`: content service and reclamation sweeper
//! - `api`: HTTP handlers
//! - `config`: static configuration
//! - `runtime`: startup, shutdown and execution modes
//! - `system`: logging

pub mod api;
pub mod cli;
pub mod config;
pub mod errors;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod system;
pub mod utils;
