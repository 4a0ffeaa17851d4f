//! Firebase admin client.
//!
//! This crate provides:
//! - Service account credentials loaded from the environment
//! - A process-wide admin app registry with single construction
//! - ID token verification against Google's published key set
//! - Account lookup through the Identity Toolkit REST API
//! - Admin access tokens for REST calls via gcp_auth

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod keys;
pub mod metrics;
pub mod registry;

#[cfg(test)]
mod test_support;

pub use app::AdminApp;
pub use auth::{AdminAuth, TokenClaims};
pub use config::{Endpoints, FirebaseConfig, ServiceAccountCredentials};
pub use error::{FirebaseError, FirebaseResult};
pub use registry::AdminRegistry;
