//! Post creation and editing.
//!
//! A post is built in two steps: [`PostDraft::validate`] checks the submitted
//! fields, then [`PostDraft::assign_owner`] produces a complete [`NewPost`].
//! Nothing reaches the store until both steps have succeeded.

use tracing::info;
use uuid::Uuid;

use scribe_db::Database;
use scribe_types::models::{Group, Post};

use crate::convert;
use crate::error::{CoreError, Result};
use crate::follow;
use crate::viewer::{Identity, Viewer};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostDraft {
    text: String,
    group: Option<String>,
    image: Option<String>,
}

/// A post with every field populated, ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub author_id: Uuid,
    pub text: String,
    pub group: Option<String>,
    pub image: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOutcome {
    Updated(Post),
    /// The viewer does not own the post. Nothing was changed; the caller
    /// should send them to the post's canonical page.
    NotOwner { username: String, post_id: i64 },
}

impl PostDraft {
    pub fn validate(text: &str, group: Option<&str>) -> Result<Self> {
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::validation("post text must not be empty"));
        }

        let group = group.map(str::trim).filter(|slug| !slug.is_empty());

        Ok(Self {
            text: text.to_string(),
            group: group.map(str::to_string),
            image: None,
        })
    }

    /// Attach a stored image reference (e.g. `posts/<uuid>`).
    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn assign_owner(self, owner: &Identity) -> NewPost {
        NewPost {
            author_id: owner.id,
            text: self.text,
            group: self.group,
            image: self.image,
        }
    }
}

pub fn create_post(db: &Database, viewer: &Viewer, draft: PostDraft) -> Result<i64> {
    let identity = viewer.require()?;
    let post = draft.assign_owner(identity);
    let group_id = group_id(db, post.group.as_deref())?;

    let id = db.insert_post(
        &post.author_id.to_string(),
        group_id,
        &post.text,
        post.image.as_deref(),
    )?;
    info!("{} published post {}", identity.username, id);
    Ok(id)
}

/// Edit `username`'s post. Only the author may change it; anyone else gets
/// [`EditOutcome::NotOwner`] and the post is left untouched.
///
/// A draft without an image keeps the current one.
pub fn edit_post(
    db: &Database,
    viewer: &Viewer,
    username: &str,
    post_id: i64,
    draft: PostDraft,
) -> Result<EditOutcome> {
    let identity = viewer.require()?;
    let author = follow::lookup(db, username)?;
    let existing = db
        .get_post(post_id)?
        .filter(|post| post.author_id == author.id)
        .ok_or_else(|| CoreError::not_found("post", post_id))?;

    if existing.author_id != identity.id.to_string() {
        info!(
            "{} tried to edit post {} owned by {}",
            identity.username, post_id, author.username
        );
        return Ok(EditOutcome::NotOwner {
            username: author.username,
            post_id,
        });
    }

    let group_id = group_id(db, draft.group.as_deref())?;
    let image = draft.image.or(existing.image);
    db.update_post(post_id, group_id, &draft.text, image.as_deref())?;

    let updated = db
        .get_post(post_id)?
        .ok_or_else(|| CoreError::not_found("post", post_id))?;
    Ok(EditOutcome::Updated(convert::post(updated)))
}

pub fn list_groups(db: &Database) -> Result<Vec<Group>> {
    Ok(db.list_groups()?.into_iter().map(convert::group).collect())
}

fn group_id(db: &Database, slug: Option<&str>) -> Result<Option<i64>> {
    let Some(slug) = slug else {
        return Ok(None);
    };

    let group = db
        .get_group_by_slug(slug)?
        .ok_or_else(|| CoreError::validation(format!("unknown group '{}'", slug)))?;
    Ok(Some(group.id))
}
