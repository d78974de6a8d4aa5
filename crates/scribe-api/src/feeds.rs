use axum::{
    Extension, Json,
    extract::{Path, Query, State},
};

use scribe_core::Viewer;
use scribe_core::feed::{self, View};
use scribe_core::pagination::parse_page_number;
use scribe_types::api::{FeedResponse, PageQuery, PostDetailResponse};

use crate::auth::AppState;
use crate::error::{ApiError, blocking};

async fn render_feed(
    state: AppState,
    view: View,
    viewer: Viewer,
    query: PageQuery,
) -> Result<Json<FeedResponse>, ApiError> {
    let page = parse_page_number(query.page.as_deref());
    let per_page = state.page_size;

    let feed = blocking(move || feed::resolve(&state.db, &view, &viewer, page, per_page)).await?;
    Ok(Json(feed.into()))
}

/// GET /
pub async fn index(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<PageQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    render_feed(state, View::Global, viewer, query).await
}

/// GET /group/{slug}/
pub async fn group_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<PageQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    render_feed(state, View::Group(slug), viewer, query).await
}

/// GET /{username}/
pub async fn profile(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<PageQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    render_feed(state, View::Profile(username), viewer, query).await
}

/// GET /follow/
pub async fn follow_index(
    State(state): State<AppState>,
    Extension(viewer): Extension<Viewer>,
    Query(query): Query<PageQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    render_feed(state, View::Following, viewer, query).await
}

/// GET /{username}/{post_id}/
pub async fn post_view(
    State(state): State<AppState>,
    Path((username, post_id)): Path<(String, i64)>,
    Extension(viewer): Extension<Viewer>,
) -> Result<Json<PostDetailResponse>, ApiError> {
    let detail =
        blocking(move || feed::post_detail(&state.db, &viewer, &username, post_id)).await?;
    Ok(Json(detail))
}
