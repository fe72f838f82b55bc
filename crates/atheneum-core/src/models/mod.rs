//! Data models for the application
//!
//! This module contains all data structures used throughout the application,
//! organized by domain. Each sub-module represents a specific catalog entity.

mod algorithm;
mod content;
mod note;
mod project;
mod stored_file;

// Re-export all models for convenient imports
pub use algorithm::*;
pub use content::*;
pub use note::*;
pub use project::*;
pub use stored_file::*;
