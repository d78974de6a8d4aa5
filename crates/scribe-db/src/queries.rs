use std::collections::HashMap;

use crate::Database;
use crate::models::{CommentRow, GroupRow, PostRow, UserRow};
use anyhow::Result;
use rusqlite::types::Value;
use rusqlite::{Connection, Row, params_from_iter};

const POST_COLUMNS: &str = "p.id, p.author_id, u.username, g.slug, g.title, p.text, p.image, p.created_at
     FROM posts p
     JOIN users u ON p.author_id = u.id
     LEFT JOIN post_groups g ON p.group_id = g.id";

const COMMENT_COLUMNS: &str = "c.id, c.post_id, c.author_id, u.username, c.text, c.created_at
     FROM comments c
     JOIN users u ON c.author_id = u.id";

/// Which posts a feed query selects.
#[derive(Debug, Clone, Copy)]
pub enum PostFilter<'a> {
    All,
    Group(i64),
    Author(&'a str),
    /// Posts whose author is followed by the given user id.
    FollowedBy(&'a str),
}

impl PostFilter<'_> {
    fn clause(&self) -> &'static str {
        match self {
            Self::All => "1 = 1",
            Self::Group(_) => "p.group_id = ?",
            Self::Author(_) => "p.author_id = ?",
            Self::FollowedBy(_) => "p.author_id IN (SELECT author_id FROM follows WHERE user_id = ?)",
        }
    }

    fn params(&self) -> Vec<Value> {
        match self {
            Self::All => vec![],
            Self::Group(id) => vec![Value::Integer(*id)],
            Self::Author(id) | Self::FollowedBy(id) => vec![Value::Text(id.to_string())],
        }
    }
}

impl Database {
    // -- Users --

    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO users (id, username, password) VALUES (?1, ?2, ?3)",
                (id, username, password_hash),
            )?;
            Ok(())
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    pub fn get_user_by_id(&self, id: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_id(conn, id))
    }

    // -- Groups --

    pub fn create_group(&self, title: &str, slug: &str, description: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
                (title, slug, description),
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_group_by_slug(&self, slug: &str) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| query_group_by_slug(conn, slug))
    }

    pub fn list_groups(&self) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT id, title, slug, description FROM post_groups ORDER BY title")?;
            let rows = stmt
                .query_map([], group_from_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    // -- Posts --

    pub fn insert_post(
        &self,
        author_id: &str,
        group_id: Option<i64>,
        text: &str,
        image: Option<&str>,
    ) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO posts (author_id, group_id, text, image) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![author_id, group_id, text, image],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Overwrite the mutable fields of a post. Author and id never change.
    pub fn update_post(
        &self,
        id: i64,
        group_id: Option<i64>,
        text: &str,
        image: Option<&str>,
    ) -> Result<()> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "UPDATE posts SET group_id = ?2, text = ?3, image = ?4 WHERE id = ?1",
                rusqlite::params![id, group_id, text, image],
            )?;
            Ok(())
        })
    }

    pub fn get_post(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| query_post(conn, id))
    }

    // -- Comments --

    pub fn insert_comment(&self, post_id: i64, author_id: &str, text: &str) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO comments (post_id, author_id, text) VALUES (?1, ?2, ?3)",
                rusqlite::params![post_id, author_id, text],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_comment(&self, id: i64) -> Result<Option<CommentRow>> {
        self.with_conn(|conn| {
            let sql = format!("SELECT {} WHERE c.id = ?1", COMMENT_COLUMNS);
            let row = conn.query_row(&sql, [id], comment_from_row).optional()?;
            Ok(row)
        })
    }

    pub fn get_comments(&self, post_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| query_comments(conn, post_id))
    }

    // -- Follows --

    /// Insert-if-absent. Returns true when a new edge was created.
    pub fn insert_follow(&self, user_id: &str, author_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "INSERT INTO follows (user_id, author_id) VALUES (?1, ?2)
                 ON CONFLICT (user_id, author_id) DO NOTHING",
                (user_id, author_id),
            )?;
            Ok(changed == 1)
        })
    }

    /// Conditional delete. Returns true when an edge was removed.
    pub fn delete_follow(&self, user_id: &str, author_id: &str) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
                (user_id, author_id),
            )?;
            Ok(changed > 0)
        })
    }

    pub fn follow_exists(&self, user_id: &str, author_id: &str) -> Result<bool> {
        self.with_conn(|conn| query_follow_exists(conn, user_id, author_id))
    }

    pub fn count_followers(&self, author_id: &str) -> Result<i64> {
        self.with_conn(|conn| count_followers(conn, author_id))
    }

    pub fn count_followed(&self, user_id: &str) -> Result<i64> {
        self.with_conn(|conn| count_followed(conn, user_id))
    }
}

// -- Connection-level queries --
//
// Exposed so that callers can run several reads on one connection.

pub fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE username = ?1")?;

    let row = stmt.query_row([username], user_from_row).optional()?;
    Ok(row)
}

pub fn query_user_by_id(conn: &Connection, id: &str) -> Result<Option<UserRow>> {
    let mut stmt =
        conn.prepare("SELECT id, username, password, created_at FROM users WHERE id = ?1")?;

    let row = stmt.query_row([id], user_from_row).optional()?;
    Ok(row)
}

pub fn query_group_by_slug(conn: &Connection, slug: &str) -> Result<Option<GroupRow>> {
    let mut stmt =
        conn.prepare("SELECT id, title, slug, description FROM post_groups WHERE slug = ?1")?;

    let row = stmt.query_row([slug], group_from_row).optional()?;
    Ok(row)
}

pub fn query_post(conn: &Connection, id: i64) -> Result<Option<PostRow>> {
    let sql = format!("SELECT {} WHERE p.id = ?1", POST_COLUMNS);
    let row = conn.query_row(&sql, [id], post_from_row).optional()?;
    Ok(row)
}

pub fn count_posts(conn: &Connection, filter: PostFilter<'_>) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM posts p WHERE {}", filter.clause());
    let count: i64 = conn.query_row(&sql, params_from_iter(filter.params()), |r| r.get(0))?;
    Ok(count as usize)
}

/// One page of posts, newest first. Ties on `created_at` fall back to id so
/// that consecutive pages never overlap.
pub fn query_posts(
    conn: &Connection,
    filter: PostFilter<'_>,
    limit: usize,
    offset: usize,
) -> Result<Vec<PostRow>> {
    // JOIN users and groups so the page is a single query (no N+1)
    let sql = format!(
        "SELECT {} WHERE {} ORDER BY p.created_at DESC, p.id DESC LIMIT ? OFFSET ?",
        POST_COLUMNS,
        filter.clause()
    );

    let mut params = filter.params();
    params.push(Value::Integer(limit as i64));
    params.push(Value::Integer(offset as i64));

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map(params_from_iter(params), post_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Batch comment counts for a set of post ids in one `GROUP BY`.
/// Posts without comments are absent from the map.
pub fn comment_counts(conn: &Connection, post_ids: &[i64]) -> Result<HashMap<i64, i64>> {
    if post_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let placeholders: Vec<String> = (1..=post_ids.len()).map(|i| format!("?{}", i)).collect();
    let sql = format!(
        "SELECT post_id, COUNT(*) FROM comments WHERE post_id IN ({}) GROUP BY post_id",
        placeholders.join(", ")
    );

    let mut stmt = conn.prepare(&sql)?;
    let counts = stmt
        .query_map(params_from_iter(post_ids.iter()), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
        })?
        .collect::<std::result::Result<HashMap<_, _>, _>>()?;

    Ok(counts)
}

pub fn query_comments(conn: &Connection, post_id: i64) -> Result<Vec<CommentRow>> {
    let sql = format!(
        "SELECT {} WHERE c.post_id = ?1 ORDER BY c.created_at ASC, c.id ASC",
        COMMENT_COLUMNS
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([post_id], comment_from_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

pub fn query_follow_exists(conn: &Connection, user_id: &str, author_id: &str) -> Result<bool> {
    let exists: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = ?1 AND author_id = ?2)",
        (user_id, author_id),
        |r| r.get(0),
    )?;
    Ok(exists)
}

pub fn count_followers(conn: &Connection, author_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE author_id = ?1",
        [author_id],
        |r| r.get(0),
    )?;
    Ok(count)
}

pub fn count_followed(conn: &Connection, user_id: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM follows WHERE user_id = ?1",
        [user_id],
        |r| r.get(0),
    )?;
    Ok(count)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        created_at: row.get(3)?,
    })
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_username: row.get(2)?,
        group_slug: row.get(3)?,
        group_title: row.get(4)?,
        text: row.get(5)?,
        image: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn comment_from_row(row: &Row<'_>) -> rusqlite::Result<CommentRow> {
    Ok(CommentRow {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        author_username: row.get(3)?,
        text: row.get(4)?,
        created_at: row.get(5)?,
    })
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
