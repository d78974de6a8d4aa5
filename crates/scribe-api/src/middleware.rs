use axum::{
    extract::{Request, State},
    http::{StatusCode, Uri, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use scribe_core::Viewer;
use scribe_types::api::Claims;

use crate::auth::AppState;
use crate::error::LoginRequired;

/// Resolve the request's viewer from an optional Bearer token.
///
/// Missing or invalid tokens make the request anonymous; they are never
/// rejected here. Responses flagged with [`LoginRequired`] are turned into
/// a redirect to the login page that returns to the current path.
pub async fn identify(State(state): State<AppState>, mut req: Request, next: Next) -> Response {
    let viewer = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|token| {
            decode::<Claims>(
                token,
                &DecodingKey::from_secret(state.jwt_secret.as_bytes()),
                &Validation::default(),
            )
            .ok()
        })
        .map(|data| Viewer::user(data.claims.sub, data.claims.username))
        .unwrap_or_default();

    let uri = req.uri().clone();
    req.extensions_mut().insert(viewer);

    let response = next.run(req).await;
    if response.extensions().get::<LoginRequired>().is_some() {
        return login_redirect(&uri);
    }
    response
}

/// Reject anonymous viewers before the handler runs.
pub async fn require_auth(req: Request, next: Next) -> Response {
    let authenticated = req
        .extensions()
        .get::<Viewer>()
        .is_some_and(Viewer::is_authenticated);

    if !authenticated {
        return login_redirect(req.uri());
    }
    next.run(req).await
}

pub fn login_redirect(uri: &Uri) -> Response {
    redirect(&format!("/auth/login/?next={}", uri.path()))
}

pub fn redirect(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}
