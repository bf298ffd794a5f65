//! Domain model for the course catalog, accounts and learning progress.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep the content tree shape (course -> topic -> subtopic) in one place.
//!
//! # Invariants
//! - Parents own their ordered children; children only carry the parent id.
//! - Enrollment and progress records are append-only.

pub mod account;
pub mod catalog;
pub mod progress;
