//! Content search entry points.
//!
//! # Responsibility
//! - Expose case-insensitive substring search over the whole content tree.
//! - Keep match grouping and snippet shaping inside core.

pub mod content;
