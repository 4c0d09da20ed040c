//! Test Helper Utilities
//!
//! Shared fixtures for codriver-mapper integration tests

pub mod plugin_tree;

pub use plugin_tree::{write_file, write_plugin, write_project, PluginContents, Project};
