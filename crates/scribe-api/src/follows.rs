use axum::{
    Extension,
    extract::{Path, State},
    response::Response,
};

use scribe_core::Viewer;
use scribe_core::follow;

use crate::auth::AppState;
use crate::error::{ApiError, blocking};
use crate::middleware::redirect;

/// POST /{username}/follow/
pub async fn profile_follow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Response, ApiError> {
    let location = format!("/{}/", username);
    blocking(move || follow::follow(&state.db, &viewer, &username)).await?;
    Ok(redirect(&location))
}

/// POST /{username}/unfollow/
pub async fn profile_unfollow(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Response, ApiError> {
    let location = format!("/{}/", username);
    blocking(move || follow::unfollow(&state.db, &viewer, &username)).await?;
    Ok(redirect(&location))
}
