//! Account handlers.
//!
//! `/api/account` is the API form: unauthenticated callers get a 307 to the
//! home page. `/api/pages/account` is the page-rendering form: it always
//! answers 200 with either page props or the redirect descriptor, for the
//! front end's server-side renderer to act on.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use mkt_models::{Account, RedirectDescriptor, SessionDescriptor};
use serde::Serialize;

use crate::error::{ApiError, ApiResult};
use crate::session::{build_login_redirect, MaybeSession, RequireSession};
use crate::state::AppState;

/// Get the signed-in caller's account record.
pub async fn get_account(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
) -> ApiResult<Json<Account>> {
    if let Some(account) = session.account {
        return Ok(Json(account));
    }

    let app = state.admin.get_or_create().await?;
    app.auth()
        .lookup_account(&session.user_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Account {}", session.user_id)))
}

/// Props for the account page.
#[derive(Debug, Serialize)]
pub struct AccountPageProps {
    pub session: SessionDescriptor,
}

/// Result of a server-side page load.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PageResult<P> {
    Props { props: P },
    Redirect(RedirectDescriptor),
}

impl<P: Serialize> IntoResponse for PageResult<P> {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

/// Server-side props for the account page.
pub async fn account_page(MaybeSession(session): MaybeSession) -> PageResult<AccountPageProps> {
    match session {
        Some(session) => PageResult::Props {
            props: AccountPageProps { session },
        },
        None => PageResult::Redirect(build_login_redirect()),
    }
}
