//! Session resolution.
//!
//! A [`SessionResolver`] turns the headers of an inbound request into an
//! optional [`SessionDescriptor`]. No session is a normal outcome, not an
//! error; handlers that need one convert it into the login redirect from
//! [`build_login_redirect`].

use std::future::Future;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, Request};
use axum::response::{IntoResponse, Redirect, Response};
use axum_extra::extract::CookieJar;
use mkt_firebase::AdminAuth;
use mkt_models::{RedirectDescriptor, SessionDescriptor};
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics::record_session_resolution;
use crate::state::AppState;

// =============================================================================
// Request shapes
// =============================================================================

/// Anything a session can be resolved from.
///
/// Extractors see [`Parts`], handlers that take the whole request see a
/// [`Request`]; both expose the same headers.
pub trait SessionSource {
    fn headers(&self) -> &HeaderMap;
}

impl SessionSource for Parts {
    fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

impl<B> SessionSource for Request<B> {
    fn headers(&self) -> &HeaderMap {
        Request::headers(self)
    }
}

impl SessionSource for HeaderMap {
    fn headers(&self) -> &HeaderMap {
        self
    }
}

// =============================================================================
// Resolver capability
// =============================================================================

/// Resolves the authenticated session for a request, if there is one.
///
/// Implementations see the request headers; [`resolve_session`] accepts any
/// [`SessionSource`].
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, headers: &HeaderMap) -> ApiResult<Option<SessionDescriptor>>;
}

/// Resolve the session for `request`.
///
/// Provider failures are returned unchanged; callers decide how to answer.
/// Only the headers are borrowed into the returned future, so it is `Send`
/// even for a `Request<Body>`, whose body is not `Sync`.
pub fn resolve_session<'a, S>(
    resolver: &'a dyn SessionResolver,
    request: &'a S,
) -> impl Future<Output = ApiResult<Option<SessionDescriptor>>> + Send + 'a
where
    S: SessionSource + ?Sized,
{
    resolver.resolve(request.headers())
}

/// Redirect sent to callers without a session: home, not permanent.
pub fn build_login_redirect() -> RedirectDescriptor {
    RedirectDescriptor::home()
}

/// HTTP form of a redirect descriptor (307, or 308 when permanent).
pub fn redirect_response(redirect: &RedirectDescriptor) -> Response {
    if redirect.is_permanent() {
        Redirect::permanent(redirect.destination()).into_response()
    } else {
        Redirect::temporary(redirect.destination()).into_response()
    }
}

// =============================================================================
// Firebase-backed resolver
// =============================================================================

/// Resolves sessions from Firebase ID tokens.
///
/// The token is read from the session cookie, falling back to an
/// `Authorization: Bearer` header. The scheme is matched case-insensitively.
pub struct FirebaseSessionResolver {
    auth: AdminAuth,
    cookie_name: String,
    resolve_accounts: bool,
}

impl FirebaseSessionResolver {
    pub fn new(auth: AdminAuth, cookie_name: impl Into<String>) -> Self {
        Self {
            auth,
            cookie_name: cookie_name.into(),
            resolve_accounts: false,
        }
    }

    /// Also look up the account record for each resolved session.
    pub fn with_account_resolution(mut self, enabled: bool) -> Self {
        self.resolve_accounts = enabled;
        self
    }

    fn session_token(&self, headers: &HeaderMap) -> Option<String> {
        let from_cookie = CookieJar::from_headers(headers)
            .get(&self.cookie_name)
            .map(|cookie| cookie.value().trim().to_string())
            .filter(|value| !value.is_empty());

        from_cookie.or_else(|| {
            headers
                .get(header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().split_once(' '))
                .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
                .map(|(_, token)| token.trim().to_string())
                .filter(|token| !token.is_empty())
        })
    }
}

#[async_trait]
impl SessionResolver for FirebaseSessionResolver {
    async fn resolve(&self, headers: &HeaderMap) -> ApiResult<Option<SessionDescriptor>> {
        let Some(token) = self.session_token(headers) else {
            record_session_resolution("anonymous");
            return Ok(None);
        };

        let claims = match self.auth.verify_id_token(&token).await {
            Ok(claims) => claims,
            Err(e) if e.is_invalid_token() => {
                debug!("Ignoring rejected session token: {}", e);
                record_session_resolution("rejected");
                return Ok(None);
            }
            Err(e) => {
                warn!("Session provider failed: {}", e);
                record_session_resolution("error");
                return Err(e.into());
            }
        };

        let mut session =
            SessionDescriptor::new(claims.uid(), claims.issued_at(), claims.expires_at());
        session.email = claims.email.clone();
        session.email_verified = claims.email_verified.unwrap_or(false);

        if self.resolve_accounts {
            session.account = self.auth.lookup_account(claims.uid()).await.map_err(|e| {
                record_session_resolution("error");
                ApiError::from(e)
            })?;
        }

        record_session_resolution("authenticated");
        Ok(Some(session))
    }
}

// =============================================================================
// Extractors
// =============================================================================

/// Per-request cache so a session is resolved at most once.
#[derive(Clone)]
struct ResolvedSession(Option<SessionDescriptor>);

/// The session if there is one. Only provider failures reject.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<SessionDescriptor>);

#[axum::async_trait]
impl FromRequestParts<AppState> for MaybeSession {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(ResolvedSession(session)) = parts.extensions.get::<ResolvedSession>() {
            return Ok(MaybeSession(session.clone()));
        }

        let session = resolve_session(state.sessions.as_ref(), &*parts).await?;
        parts.extensions.insert(ResolvedSession(session.clone()));

        Ok(MaybeSession(session))
    }
}

/// A session that must exist. Rejects with the login redirect otherwise.
#[derive(Debug, Clone)]
pub struct RequireSession(pub SessionDescriptor);

#[axum::async_trait]
impl FromRequestParts<AppState> for RequireSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeSession(session) = MaybeSession::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        session
            .map(RequireSession)
            .ok_or_else(|| redirect_response(&build_login_redirect()))
    }
}
