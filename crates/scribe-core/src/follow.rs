//! The directed follow graph.
//!
//! Each ordered (user, author) pair is either following or not. `follow` and
//! `unfollow` are total: calling either in the state it would move to is a
//! no-op. At most one edge per pair exists because the store inserts with
//! `ON CONFLICT DO NOTHING` against the pair's primary key.

use tracing::debug;
use uuid::Uuid;

use scribe_db::Database;
use scribe_db::models::UserRow;
use scribe_db::queries;
use scribe_types::api::ProfileCard;

use crate::error::{CoreError, Result};
use crate::viewer::Viewer;

/// Make the viewer follow `username`. Returns true if a new edge was created.
///
/// Following yourself is silently ignored.
pub fn follow(db: &Database, viewer: &Viewer, username: &str) -> Result<bool> {
    let identity = viewer.require()?;
    let author = lookup(db, username)?;
    let user_id = identity.id.to_string();

    if author.id == user_id {
        debug!("{} tried to follow themselves, ignoring", identity.username);
        return Ok(false);
    }

    let created = db.insert_follow(&user_id, &author.id)?;
    debug!(
        "{} -> {}: follow ({})",
        identity.username,
        author.username,
        if created { "created" } else { "already following" }
    );
    Ok(created)
}

/// Remove the viewer's edge to `username`. Returns true if an edge was removed.
pub fn unfollow(db: &Database, viewer: &Viewer, username: &str) -> Result<bool> {
    let identity = viewer.require()?;
    let author = lookup(db, username)?;

    let removed = db.delete_follow(&identity.id.to_string(), &author.id)?;
    debug!(
        "{} -> {}: unfollow ({})",
        identity.username,
        author.username,
        if removed { "removed" } else { "was not following" }
    );
    Ok(removed)
}

pub fn is_following(db: &Database, user: Uuid, author: Uuid) -> Result<bool> {
    Ok(db.follow_exists(&user.to_string(), &author.to_string())?)
}

pub fn follower_count(db: &Database, author: Uuid) -> Result<i64> {
    Ok(db.count_followers(&author.to_string())?)
}

pub fn followed_count(db: &Database, user: Uuid) -> Result<i64> {
    Ok(db.count_followed(&user.to_string())?)
}

/// Profile header for `username` as seen by `viewer`.
pub fn profile_card(db: &Database, viewer: &Viewer, username: &str) -> Result<ProfileCard> {
    let profile = lookup(db, username)?;
    card_for(db, viewer, &profile)
}

pub(crate) fn card_for(db: &Database, viewer: &Viewer, profile: &UserRow) -> Result<ProfileCard> {
    let viewer_id = viewer.identity().map(|identity| identity.id.to_string());

    let card = db.with_conn(|conn| {
        let followers = queries::count_followers(conn, &profile.id)?;
        let followed = queries::count_followed(conn, &profile.id)?;
        let following = match &viewer_id {
            Some(id) => Some(queries::query_follow_exists(conn, id, &profile.id)?),
            None => None,
        };

        Ok(ProfileCard {
            username: profile.username.clone(),
            followers,
            followed,
            following,
        })
    })?;

    Ok(card)
}

pub(crate) fn lookup(db: &Database, username: &str) -> Result<UserRow> {
    db.get_user_by_username(username)?
        .ok_or_else(|| CoreError::not_found("user", username))
}
