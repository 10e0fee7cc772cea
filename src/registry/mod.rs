//! Registry module for Docker registry interactions
//!
//! This module provides token issuance, the shared per-repository token cache
//! and manifest retrieval against the Docker Registry HTTP API v2.

pub mod auth;
pub mod client;
pub mod manifest;
pub mod token_cache;

pub use auth::{IssuedToken, TokenResponse, TokenSource};
pub use client::{RegistryClient, RegistryClientBuilder};
pub use manifest::{FsLayer, Manifest, ManifestSource};
pub use token_cache::{CachedToken, TokenCache};
