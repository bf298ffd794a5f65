//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Translate storage outcomes into domain errors the boundary can classify.

pub mod account_service;
pub mod catalog_service;
pub mod enrollment_service;
pub mod progress_service;
