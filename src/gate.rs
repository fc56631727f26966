use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;

use crate::auth::session::SESSION_COOKIE;

/// How the gate treats a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Reachable with or without a session.
    Public,
    /// Login and signup pages; pointless once a session exists.
    AuthOnly,
    /// Requires a session cookie.
    Protected,
}

const AUTH_ONLY_PREFIXES: [&str; 2] = ["/login", "/signup"];
const PUBLIC_PREFIXES: [&str; 4] = ["/forgot-password", "/reset-password", "/privacy", "/terms"];

/// Classify a request path. Pure function of the path; query strings are
/// already stripped by the caller.
pub fn classify_path(path: &str) -> RouteClass {
    if AUTH_ONLY_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return RouteClass::AuthOnly;
    }
    if PUBLIC_PREFIXES.iter().any(|p| path.starts_with(p)) {
        return RouteClass::Public;
    }
    // The API speaks JSON errors, not redirects, and asset requests must
    // never bounce to a login page.
    if path == "/api" || path.starts_with("/api/") {
        return RouteClass::Public;
    }
    // Dotted final segment means a file: favicon.ico, app.css and friends.
    if path.rsplit('/').next().is_some_and(|seg| seg.contains('.')) {
        return RouteClass::Public;
    }
    RouteClass::Protected
}

fn has_session_cookie(headers: &HeaderMap) -> bool {
    CookieJar::from_headers(headers)
        .get(SESSION_COOKIE)
        .is_some()
}

/// Navigation gate: unauthenticated visits to protected pages bounce to
/// `/login`; authenticated visits to login/signup bounce home.
///
/// The check is cookie presence only. Whoever serves the page still
/// validates the session against the store; a forged cookie gets through
/// the gate and then fails there.
pub async fn route_gate(req: Request, next: Next) -> Response {
    match classify_path(req.uri().path()) {
        RouteClass::Public => next.run(req).await,
        RouteClass::AuthOnly => {
            if has_session_cookie(req.headers()) {
                Redirect::temporary("/").into_response()
            } else {
                next.run(req).await
            }
        }
        RouteClass::Protected => {
            if has_session_cookie(req.headers()) {
                next.run(req).await
            } else {
                Redirect::temporary("/login").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        middleware,
        routing::get,
        Router,
    };
    use tower::ServiceExt;

    #[test]
    fn login_and_signup_are_auth_only() {
        assert_eq!(classify_path("/login"), RouteClass::AuthOnly);
        assert_eq!(classify_path("/login/sso"), RouteClass::AuthOnly);
        assert_eq!(classify_path("/signup"), RouteClass::AuthOnly);
    }

    #[test]
    fn reset_flow_and_legal_pages_are_public() {
        assert_eq!(classify_path("/forgot-password"), RouteClass::Public);
        assert_eq!(classify_path("/reset-password"), RouteClass::Public);
        assert_eq!(classify_path("/privacy"), RouteClass::Public);
        assert_eq!(classify_path("/terms"), RouteClass::Public);
    }

    #[test]
    fn api_and_assets_are_public() {
        assert_eq!(classify_path("/api"), RouteClass::Public);
        assert_eq!(classify_path("/api/v1/auth/login"), RouteClass::Public);
        assert_eq!(classify_path("/favicon.ico"), RouteClass::Public);
        assert_eq!(classify_path("/assets/app.css"), RouteClass::Public);
        assert_eq!(classify_path("/placeholder.svg"), RouteClass::Public);
    }

    #[test]
    fn everything_else_is_protected() {
        assert_eq!(classify_path("/"), RouteClass::Protected);
        assert_eq!(classify_path("/dashboard"), RouteClass::Protected);
        assert_eq!(classify_path("/settings/profile"), RouteClass::Protected);
    }

    async fn ok() -> &'static str {
        "ok"
    }

    fn gated_app() -> Router {
        Router::new()
            .route("/", get(ok))
            .route("/login", get(ok))
            .route("/forgot-password", get(ok))
            .layer(middleware::from_fn(route_gate))
    }

    fn request(path: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(path);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn protected_page_without_cookie_redirects_to_login() {
        let response = gated_app().oneshot(request("/", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }

    #[tokio::test]
    async fn protected_page_with_cookie_passes() {
        let response = gated_app()
            .oneshot(request("/", Some("session_token=abc123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn login_page_with_cookie_redirects_home() {
        let response = gated_app()
            .oneshot(request("/login", Some("session_token=abc123")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/");
    }

    #[tokio::test]
    async fn login_page_without_cookie_passes() {
        let response = gated_app().oneshot(request("/login", None)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn forgot_password_passes_either_way() {
        let app = gated_app();

        let anonymous = app
            .clone()
            .oneshot(request("/forgot-password", None))
            .await
            .unwrap();
        assert_eq!(anonymous.status(), StatusCode::OK);

        let logged_in = app
            .oneshot(request("/forgot-password", Some("session_token=abc123")))
            .await
            .unwrap();
        assert_eq!(logged_in.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unrelated_cookies_do_not_authenticate() {
        let response = gated_app()
            .oneshot(request("/", Some("theme=dark; lang=en")))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/login");
    }
}
