//! URI canonicalization and queue assignment
//!
//! This module contains:
//! - The canonicalization rule chain applied before the already-seen check
//! - SURT authority computation and the queue-assignment policy

mod canonicalize;
mod class_key;

pub use canonicalize::{canonicalize, canonicalize_with, RewriteRule, DEFAULT_RULES};
pub use class_key::{class_key_for, surt_authority, QueueAssignmentPolicy};
