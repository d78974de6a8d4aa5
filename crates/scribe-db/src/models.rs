/// Database row types. These map directly to SQLite rows.
/// Distinct from scribe-types API models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

pub struct GroupRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

/// A post joined with its author's username and its group, if any.
pub struct PostRow {
    pub id: i64,
    pub author_id: String,
    pub author_username: String,
    pub group_slug: Option<String>,
    pub group_title: Option<String>,
    pub text: String,
    pub image: Option<String>,
    pub created_at: String,
}

pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub author_id: String,
    pub author_username: String,
    pub text: String,
    pub created_at: String,
}
