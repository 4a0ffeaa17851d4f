//! Axum session API server.
//!
//! This crate provides:
//! - Session resolution from Firebase ID tokens (cookie or bearer)
//! - The login redirect returned to unauthenticated page requests
//! - Security headers, request IDs and request logging
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod session;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use session::{
    build_login_redirect, resolve_session, FirebaseSessionResolver, MaybeSession,
    RequireSession, SessionResolver, SessionSource,
};
pub use state::AppState;
