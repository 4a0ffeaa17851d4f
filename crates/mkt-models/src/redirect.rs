//! Redirect descriptors.
//!
//! Page handlers return these instead of rendering when the caller must be
//! sent elsewhere. The serialized shape is
//! `{ "redirect": { "destination": "/", "permanent": false } }`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Application root, where unauthenticated users are sent.
pub const HOME_PATH: &str = "/";

/// Redirect target and permanence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Redirect {
    pub destination: String,
    pub permanent: bool,
}

/// Wrapper matching the page-handler redirect result shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RedirectDescriptor {
    pub redirect: Redirect,
}

impl RedirectDescriptor {
    /// Temporary redirect to `destination`.
    pub fn temporary(destination: impl Into<String>) -> Self {
        Self {
            redirect: Redirect {
                destination: destination.into(),
                permanent: false,
            },
        }
    }

    /// Temporary redirect to the application root.
    pub fn home() -> Self {
        Self::temporary(HOME_PATH)
    }

    pub fn destination(&self) -> &str {
        &self.redirect.destination
    }

    pub fn is_permanent(&self) -> bool {
        self.redirect.permanent
    }
}
