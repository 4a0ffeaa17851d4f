//! Session handlers.

use axum::Json;
use mkt_models::SessionDescriptor;

use crate::session::MaybeSession;

/// Current session, or `null` when the caller is not signed in.
pub async fn get_session(MaybeSession(session): MaybeSession) -> Json<Option<SessionDescriptor>> {
    Json(session)
}
