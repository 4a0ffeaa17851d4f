//! Firebase admin metrics.
//!
//! - Admin REST request counters and latency by operation
//! - Key set refresh outcomes
//! - Token verification outcomes

use metrics::{counter, histogram};

// =============================================================================
// Metric Names
// =============================================================================

/// Metric name constants for consistency.
pub mod names {
    /// Admin REST requests by operation and status.
    pub const REQUESTS_TOTAL: &str = "firebase_admin_requests_total";

    /// Admin REST latency in seconds by operation.
    pub const LATENCY_SECONDS: &str = "firebase_admin_latency_seconds";

    /// Signing key set refreshes by outcome.
    pub const KEY_REFRESHES_TOTAL: &str = "firebase_key_refreshes_total";

    /// ID token verifications by outcome.
    pub const TOKEN_VERIFICATIONS_TOTAL: &str = "firebase_token_verifications_total";
}

// =============================================================================
// Recording Functions
// =============================================================================

/// Record metrics for a completed admin REST request.
pub fn record_request(operation: &str, status: u16, latency_ms: f64) {
    counter!(
        names::REQUESTS_TOTAL,
        "operation" => operation.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    histogram!(
        names::LATENCY_SECONDS,
        "operation" => operation.to_string()
    )
    .record(latency_ms / 1000.0);
}

pub fn record_key_refresh(success: bool) {
    counter!(
        names::KEY_REFRESHES_TOTAL,
        "outcome" => if success { "ok" } else { "error" }
    )
    .increment(1);
}

pub fn record_token_verification(outcome: &'static str) {
    counter!(names::TOKEN_VERIFICATIONS_TOTAL, "outcome" => outcome).increment(1);
}

// =============================================================================
// Tests
// =============================================================================
