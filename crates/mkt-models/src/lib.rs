//! Shared data models for the marketplace backend.
//!
//! This crate provides Serde-serializable types for:
//! - Account records resolved from the identity provider
//! - Authenticated session descriptors
//! - Redirect descriptors handed back to page handlers

pub mod account;
pub mod redirect;
pub mod session;

// Re-export common types
pub use account::Account;
pub use redirect::{Redirect, RedirectDescriptor};
pub use session::SessionDescriptor;
