//! # Configuration System
//!
//! Centralized configuration management for the DateTrack system.
//!
//! This crate provides:
//! - Configuration structures for all system components
//! - Environment variable loading (12-factor app principles)
//! - Configuration file loading (TOML/YAML)
//! - Configuration validation
//!
//! # Best Practices
//!
//! - The configuration is one immutable value handed to every component at
//!   construction; nothing reads ambient state after startup
//! - Provides clear error messages for invalid configuration

pub mod config;
pub mod file_loader;
pub mod loader;
pub mod validator;

pub use config::{ColorConfig, GroupConfig, RetentionConfig, SeedConfig, TrackerConfig};
pub use file_loader::{ConfigFileError, load_from_file, load_from_toml, load_from_yaml};
pub use loader::{apply_env_overrides, load_from_env};
pub use validator::{ConfigValidationError, validate};
