//! Session middleware for Axum

use axum::{
    extract::{Request, State},
    http::{HeaderValue, header::SET_COOKIE},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::service::AuthService;
use crate::session::{CookieChange, SessionHandle};

/// Session middleware
///
/// Resolves the session cookie into a [`SessionHandle`] stored in request
/// extensions, then writes any cookie change requested by the handler
/// back onto the response. A cookie that no longer resolves is cleared.
pub async fn session_middleware(
    State(auth): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = auth.cookie_config().read_token(request.headers());

    let resolved = match token.as_deref() {
        Some(token) => auth.resolve(token).await,
        None => None,
    };
    let stale_cookie = token.is_some() && resolved.is_none();

    let handle = match resolved {
        Some((id, user)) => {
            debug!("Resumed session for user: {}", user.username);
            SessionHandle::resumed(id, user)
        }
        None => SessionHandle::anonymous(),
    };
    request.extensions_mut().insert(handle.clone());

    let mut response = next.run(request).await;

    let change = handle
        .take_cookie_change()
        .or_else(|| stale_cookie.then_some(CookieChange::Clear));

    if let Some(change) = change {
        let cookie = match change {
            CookieChange::Issue(token) => auth.cookie_config().session_cookie(&token),
            CookieChange::Clear => auth.cookie_config().removal_cookie(),
        };

        match HeaderValue::from_str(&cookie.to_string()) {
            Ok(value) => {
                response.headers_mut().append(SET_COOKIE, value);
            }
            Err(e) => warn!("Could not encode session cookie: {}", e),
        }
    }

    response
}

/// Middleware to require an authenticated session
pub async fn require_authenticated(request: Request, next: Next) -> Result<Response, AuthError> {
    let authenticated = request
        .extensions()
        .get::<SessionHandle>()
        .is_some_and(SessionHandle::is_authenticated);

    if !authenticated {
        return Err(AuthError::Unauthorized);
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::tests::service_with_users;
    use crate::session::CurrentUser;
    use axum::{
        Router,
        body::Body,
        http::{Request as HttpRequest, StatusCode, header::COOKIE},
        middleware::{from_fn, from_fn_with_state},
        routing::{get, post},
    };
    use gate_store::MemorySessionStore;
    use tower::ServiceExt;

    async fn app(dir: &tempfile::TempDir) -> Router {
        let auth = Arc::new(
            service_with_users(
                dir,
                &[("alice", "wonderland")],
                Arc::new(MemorySessionStore::new()),
            )
            .await,
        );

        let login_auth = auth.clone();
        let protected = Router::new()
            .route("/me", get(|user: CurrentUser| async move { user.username }))
            .route_layer(from_fn(require_authenticated));

        Router::new()
            .route(
                "/login",
                post(move |session: SessionHandle| async move {
                    match login_auth.login(&session, "alice", "wonderland").await {
                        Ok(_) => StatusCode::OK,
                        Err(e) => e.status_code(),
                    }
                }),
            )
            .merge(protected)
            .layer(from_fn_with_state(auth, session_middleware))
    }

    fn session_cookie(response: &Response) -> String {
        let header = response
            .headers()
            .get(SET_COOKIE)
            .expect("Set-Cookie header")
            .to_str()
            .unwrap();
        header.split(';').next().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_login_sets_cookie_and_unlocks_protected_route() {
        let dir = tempfile::tempdir().unwrap();
        let app = app(&dir).await;

        let response = app
            .clone()
            .oneshot(HttpRequest::post("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let cookie = session_cookie(&response);
        assert!(cookie.starts_with("llm_gate.sid="));

        let response = app
            .oneshot(
                HttpRequest::get("/me")
                    .header(COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(SET_COOKIE).is_none());
    }

    #[tokio::test]
    async fn test_protected_route_without_cookie() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .await
            .oneshot(HttpRequest::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_stale_cookie_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let response = app(&dir)
            .await
            .oneshot(
                HttpRequest::get("/me")
                    .header(COOKIE, "llm_gate.sid=not-a-token")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(session_cookie(&response), "llm_gate.sid=");
    }
}
