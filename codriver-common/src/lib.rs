//! # Codriver Common Library
//!
//! Shared code for the codriver tools including:
//! - Error types
//! - Configuration file loading and path resolution
//! - Logging configuration

pub mod config;
pub mod error;

pub use error::{Error, Result};
