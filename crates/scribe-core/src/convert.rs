use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;
use uuid::Uuid;

use scribe_db::models::{CommentRow, GroupRow, PostRow};
use scribe_types::models::{Comment, Group, GroupRef, Post};

/// SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS.SSS" without timezone.
pub(crate) fn parse_timestamp(raw: &str, context: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {}: {}", raw, context, e);
            DateTime::default()
        })
}

pub(crate) fn parse_uuid(raw: &str, context: &str) -> Uuid {
    raw.parse().unwrap_or_else(|e| {
        warn!("Corrupt id '{}' on {}: {}", raw, context, e);
        Uuid::default()
    })
}

pub(crate) fn post(row: PostRow) -> Post {
    let context = format!("post {}", row.id);
    let group = match (row.group_slug, row.group_title) {
        (Some(slug), Some(title)) => Some(GroupRef { slug, title }),
        _ => None,
    };

    Post {
        id: row.id,
        author_id: parse_uuid(&row.author_id, &context),
        author_username: row.author_username,
        group,
        text: row.text,
        image: row.image,
        created_at: parse_timestamp(&row.created_at, &context),
    }
}

pub(crate) fn comment(row: CommentRow) -> Comment {
    let context = format!("comment {}", row.id);
    Comment {
        id: row.id,
        post_id: row.post_id,
        author_id: parse_uuid(&row.author_id, &context),
        author_username: row.author_username,
        text: row.text,
        created_at: parse_timestamp(&row.created_at, &context),
    }
}

pub(crate) fn group(row: GroupRow) -> Group {
    Group {
        id: row.id,
        title: row.title,
        slug: row.slug,
        description: row.description,
    }
}
