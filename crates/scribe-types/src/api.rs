use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Comment, Group, Post};

// -- JWT Claims --

/// JWT claims issued at login and decoded by the identity middleware.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterResponse {
    pub user_id: Uuid,
    pub token: String,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub user_id: Uuid,
    pub username: String,
    pub token: String,
}

// -- Posts --

/// Body of `POST /new/` and `POST /{username}/{post_id}/edit/`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostRequest {
    pub text: String,
    /// Group slug, if the post belongs to one.
    #[serde(default)]
    pub group: Option<String>,
    /// Base64-encoded image bytes.
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CommentRequest {
    pub text: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    /// Kept as a string so that garbage like `?page=abc` falls back to page 1.
    pub page: Option<String>,
}

/// A post as listed in a feed, with its comment count.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummary {
    #[serde(flatten)]
    pub post: Post,
    pub comment_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageMeta {
    pub number: usize,
    pub total_pages: usize,
    pub count: usize,
    pub has_next: bool,
    pub has_previous: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCard {
    pub username: String,
    pub followers: i64,
    pub followed: i64,
    /// Only present for authenticated viewers.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub following: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FeedResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<Group>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<ProfileCard>,
    pub posts: Vec<PostSummary>,
    pub page: PageMeta,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PostDetailResponse {
    pub profile: ProfileCard,
    pub post: PostSummary,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NewPostForm {
    pub groups: Vec<Group>,
}
