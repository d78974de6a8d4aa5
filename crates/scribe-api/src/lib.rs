pub mod auth;
pub mod error;
pub mod feeds;
pub mod follows;
pub mod images;
pub mod middleware;
pub mod posts;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};

use crate::auth::AppState;
use crate::middleware::{identify, require_auth};

/// All routes. Static first segments (`new`, `follow`, `group`, `auth`,
/// `media`) take priority over `/{username}/`.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(feeds::index))
        .route("/group/{slug}/", get(feeds::group_posts))
        .route("/auth/register/", post(auth::register))
        .route("/auth/login/", post(auth::login))
        .route("/media/posts/{file_id}", get(images::serve_image))
        .route("/{username}/", get(feeds::profile))
        .route("/{username}/{post_id}/", get(feeds::post_view));

    let protected_routes = Router::new()
        .route("/new/", get(posts::new_post_form).post(posts::new_post))
        .route("/follow/", get(feeds::follow_index))
        .route("/{username}/follow/", post(follows::profile_follow))
        .route("/{username}/unfollow/", post(follows::profile_unfollow))
        .route("/{username}/{post_id}/edit/", post(posts::post_edit))
        .route("/{username}/{post_id}/comment/", post(posts::add_comment))
        .route_layer(axum_middleware::from_fn(require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(axum_middleware::from_fn_with_state(state.clone(), identify))
        .with_state(state)
}
