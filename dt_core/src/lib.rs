//! # DateTrack Core
//!
//! Shared types and traits for the DateTrack change tracking system.
//!
//! This crate provides:
//! - Type definitions for tracked groups, source records and facts
//! - The `SourceClient` trait implemented by remote source adapters
//! - Error types with proper handling

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types for convenience
pub use error::SourceError;
pub use traits::SourceClient;
pub use types::{
    ChangeRecord, Fact, FieldSpec, GroupCode, Identity, RunMode, SourceId, SourceRecord
};
