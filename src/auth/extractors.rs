use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::repo_types::SessionUser;
use crate::auth::session::{self, SESSION_COOKIE};
use crate::error::AuthError;
use crate::state::AppState;

/// Authenticated caller, resolved from the session cookie against the
/// store. Handlers taking this parameter only run for a live session;
/// anything else gets the `Unauthenticated` rejection.
pub struct CurrentUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let jar = CookieJar::from_headers(&parts.headers);
        let token = jar
            .get(SESSION_COOKIE)
            .map(|cookie| cookie.value().to_owned())
            .ok_or(AuthError::Unauthenticated)?;

        let session = session::validate(&state.db, &token)
            .await?
            .ok_or(AuthError::Unauthenticated)?;

        Ok(CurrentUser(session))
    }
}
