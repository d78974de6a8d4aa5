use axum::{
    Extension, Json,
    extract::{Path, State},
    response::{IntoResponse, Response},
};

use scribe_core::Viewer;
use scribe_core::comments;
use scribe_core::posts::{self, EditOutcome, PostDraft};
use scribe_types::api::{CommentRequest, NewPostForm, PostRequest};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};
use crate::images;
use crate::middleware::redirect;

/// GET /new/: the choices a new-post form needs.
pub async fn new_post_form(State(state): State<AppState>) -> Result<Json<NewPostForm>, ApiError> {
    let groups = blocking(move || posts::list_groups(&state.db)).await?;
    Ok(Json(NewPostForm { groups }))
}

/// POST /new/: publish a post, then go back to the index.
pub async fn new_post(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<PostRequest>,
) -> Result<Response, ApiError> {
    // Validate the text before anything touches disk
    let draft = PostDraft::validate(&req.text, req.group.as_deref())?;
    let image = images::store_upload(&state, req.image.as_deref()).await?;
    let draft = draft.with_image(image);

    blocking(move || posts::create_post(&state.db, &viewer, draft)).await?;
    Ok(redirect("/"))
}

/// POST /{username}/{post_id}/edit/
///
/// Both the author's success and a non-author's attempt end on the post's
/// page; only the former changes anything.
pub async fn post_edit(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, i64)>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<PostRequest>,
) -> Result<Response, ApiError> {
    let draft = PostDraft::validate(&req.text, req.group.as_deref())?;
    let image = images::store_upload(&state, req.image.as_deref()).await?;
    let draft = draft.with_image(image);

    let outcome =
        blocking(move || posts::edit_post(&state.db, &viewer, &username, post_id, draft)).await?;

    let location = match outcome {
        EditOutcome::Updated(post) => format!("/{}/{}/", post.author_username, post.id),
        EditOutcome::NotOwner { username, post_id } => format!("/{}/{}/", username, post_id),
    };
    Ok(redirect(&location))
}

/// POST /{username}/{post_id}/comment/
pub async fn add_comment(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, i64)>,
    Extension(viewer): Extension<Viewer>,
    Json(req): Json<CommentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let location = format!("/{}/{}/", username, post_id);
    blocking(move || comments::submit_comment(&state.db, &viewer, &username, post_id, &req.text))
        .await?;
    Ok(redirect(&location))
}
