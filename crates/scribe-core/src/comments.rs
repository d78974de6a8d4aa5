use tracing::info;

use scribe_db::Database;
use scribe_types::models::Comment;

use crate::convert;
use crate::error::{CoreError, Result};
use crate::follow;
use crate::viewer::Viewer;

/// Admit a comment on `username`'s post `post_id`.
///
/// Anonymous viewers are refused before anything is looked up or written.
pub fn submit_comment(
    db: &Database,
    viewer: &Viewer,
    username: &str,
    post_id: i64,
    text: &str,
) -> Result<Comment> {
    let identity = viewer.require()?;

    let author = follow::lookup(db, username)?;
    db.get_post(post_id)?
        .filter(|post| post.author_id == author.id)
        .ok_or_else(|| CoreError::not_found("post", post_id))?;

    let text = text.trim();
    if text.is_empty() {
        return Err(CoreError::validation("comment text must not be empty"));
    }

    let comment_id = db.insert_comment(post_id, &identity.id.to_string(), text)?;
    info!("{} commented on post {}", identity.username, post_id);

    let row = db
        .get_comment(comment_id)?
        .ok_or_else(|| CoreError::not_found("comment", comment_id))?;
    Ok(convert::comment(row))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed;
    use crate::testing;

    #[test]
    fn anonymous_comment_is_refused_and_not_stored() {
        let db = testing::db();
        let sarah = testing::user(&db, "sarah");
        let post_id = testing::post(&db, &sarah, "hello");

        let result = submit_comment(&db, &Viewer::Anonymous, "sarah", post_id, "drive-by");
        assert!(matches!(result, Err(CoreError::Unauthorized)));
        assert!(db.get_comments(post_id).unwrap().is_empty());
    }

    #[test]
    fn authenticated_comment_shows_on_detail() {
        let db = testing::db();
        let sarah = testing::user(&db, "sarah");
        let post_id = testing::post(&db, &sarah, "hello");

        let comment = submit_comment(&db, &sarah, "sarah", post_id, "my own comment").unwrap();
        assert_eq!(comment.author_username, "sarah");
        assert_eq!(comment.post_id, post_id);

        let detail = feed::post_detail(&db, &Viewer::Anonymous, "sarah", post_id).unwrap();
        assert_eq!(detail.comments, vec![comment]);
    }

    #[test]
    fn blank_comment_is_rejected() {
        let db = testing::db();
        let sarah = testing::user(&db, "sarah");
        let post_id = testing::post(&db, &sarah, "hello");

        assert!(matches!(
            submit_comment(&db, &sarah, "sarah", post_id, "   "),
            Err(CoreError::Validation(_))
        ));
    }

    #[test]
    fn missing_post_is_not_found() {
        let db = testing::db();
        let sarah = testing::user(&db, "sarah");

        assert!(matches!(
            submit_comment(&db, &sarah, "sarah", 42, "hi"),
            Err(CoreError::NotFound { what: "post", .. })
        ));
    }
}
