//! Host collaborators over HTTP.
//!
//! This module provides:
//! - The collaborator traits the engine depends on
//! - A reqwest-based HTTP client with JSON helpers
//! - [`ComfyHost`], which implements every collaborator against a running host

mod client;
mod host;
mod providers;

pub use client::{endpoint, HttpClient};
pub use host::{select_path_config, ComfyHost};
pub use providers::{InstalledAssetsProvider, PathConfigProvider};
