//! Visibility resolver: which posts a viewer sees in a given browsing context.
//!
//! All views order posts newest first (ties by id) and annotate each post on
//! the page with its comment count using one grouped query.

use tracing::debug;

use scribe_db::queries::{self, PostFilter};
use scribe_db::{Database, models::PostRow};
use scribe_types::api::{FeedResponse, PostDetailResponse, PostSummary, ProfileCard};
use scribe_types::models::Group;

use crate::convert;
use crate::error::{CoreError, Result};
use crate::follow;
use crate::pagination::{Page, Paginator};
use crate::viewer::Viewer;

/// Browsing context for a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Global,
    Group(String),
    Profile(String),
    /// Posts by authors the viewer follows.
    Following,
}

#[derive(Debug)]
pub struct FeedPage {
    pub group: Option<Group>,
    pub profile: Option<ProfileCard>,
    pub page: Page<PostSummary>,
}

impl From<FeedPage> for FeedResponse {
    fn from(feed: FeedPage) -> Self {
        FeedResponse {
            group: feed.group,
            profile: feed.profile,
            posts: feed.page.items,
            page: feed.page.meta,
        }
    }
}

pub fn resolve(
    db: &Database,
    view: &View,
    viewer: &Viewer,
    page: i64,
    per_page: usize,
) -> Result<FeedPage> {
    match view {
        View::Global => Ok(FeedPage {
            group: None,
            profile: None,
            page: load_page(db, PostFilter::All, page, per_page)?,
        }),
        View::Group(slug) => {
            let group = db
                .get_group_by_slug(slug)?
                .ok_or_else(|| CoreError::not_found("group", slug))?;
            let page = load_page(db, PostFilter::Group(group.id), page, per_page)?;

            Ok(FeedPage {
                group: Some(convert::group(group)),
                profile: None,
                page,
            })
        }
        View::Profile(username) => {
            let profile = follow::lookup(db, username)?;
            let card = follow::card_for(db, viewer, &profile)?;
            let page = load_page(db, PostFilter::Author(&profile.id), page, per_page)?;

            Ok(FeedPage {
                group: None,
                profile: Some(card),
                page,
            })
        }
        View::Following => {
            let identity = viewer.require()?;
            let user_id = identity.id.to_string();

            // Following nobody is an explicit empty page, not "everything"
            if db.count_followed(&user_id)? == 0 {
                debug!("{} follows nobody, empty feed", identity.username);
                return Ok(FeedPage {
                    group: None,
                    profile: None,
                    page: Page::empty(),
                });
            }

            Ok(FeedPage {
                group: None,
                profile: None,
                page: load_page(db, PostFilter::FollowedBy(&user_id), page, per_page)?,
            })
        }
    }
}

/// Count, slice and annotate one page on a single read connection.
fn load_page(
    db: &Database,
    filter: PostFilter<'_>,
    requested: i64,
    per_page: usize,
) -> Result<Page<PostSummary>> {
    let page = db.with_conn(|conn| {
        let paginator = Paginator::new(queries::count_posts(conn, filter)?, per_page);
        let window = paginator.window(requested);

        let rows = queries::query_posts(conn, filter, window.limit, window.offset)?;
        let ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let counts = queries::comment_counts(conn, &ids)?;

        Ok(Page {
            items: rows,
            meta: paginator.meta(window.number),
        }
        .map(|row: PostRow| {
            let comment_count = counts.get(&row.id).copied().unwrap_or(0);
            PostSummary {
                post: convert::post(row),
                comment_count,
            }
        }))
    })?;

    Ok(page)
}

/// A single post with its comments, addressed by author and id.
///
/// The post must belong to `username`; a valid id under the wrong author is
/// `NotFound` just like a missing one.
pub fn post_detail(
    db: &Database,
    viewer: &Viewer,
    username: &str,
    post_id: i64,
) -> Result<PostDetailResponse> {
    let profile = follow::lookup(db, username)?;
    let card = follow::card_for(db, viewer, &profile)?;

    let (post, comments) = db.with_conn(|conn| {
        let post = queries::query_post(conn, post_id)?;
        let comments = queries::query_comments(conn, post_id)?;
        Ok((post, comments))
    })?;

    let post = post
        .filter(|row| row.author_id == profile.id)
        .ok_or_else(|| CoreError::not_found("post", post_id))?;

    let comments: Vec<_> = comments.into_iter().map(convert::comment).collect();

    Ok(PostDetailResponse {
        profile: card,
        post: PostSummary {
            post: convert::post(post),
            comment_count: comments.len() as i64,
        },
        comments,
    })
}
