use chrono::{DateTime, Utc};
use tracing::warn;

use yatube_db::models::{AuthorStats, CommentRow, GroupRow, PostRow, UserRow};
use yatube_types::models::{AuthorCard, Comment, Group, GroupRef, Post, UserRef};

/// Parses a stored timestamp. Rows written by this crate are RFC 3339; rows
/// touched by hand in the SQLite shell may use the `datetime('now')` format.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            chrono::NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}

pub fn group_from_row(row: GroupRow) -> Group {
    Group {
        id: row.id,
        title: row.title,
        slug: row.slug,
        description: row.description,
    }
}

pub fn post_from_row(row: PostRow) -> Post {
    let group = match (row.group_id, row.group_slug, row.group_title) {
        (Some(id), Some(slug), Some(title)) => Some(GroupRef { id, slug, title }),
        _ => None,
    };

    Post {
        id: row.id,
        text: row.text,
        pub_date: parse_timestamp(&row.pub_date),
        author: UserRef {
            id: row.author_id,
            username: row.author_username,
        },
        group,
        image: row.image,
        comments_count: row.comments_count,
    }
}

pub fn comment_from_row(row: CommentRow) -> Comment {
    Comment {
        id: row.id,
        post_id: row.post_id,
        text: row.text,
        created: parse_timestamp(&row.created),
        author: UserRef {
            id: row.author_id,
            username: row.author_username,
        },
    }
}

pub fn author_card(user: &UserRow, stats: AuthorStats) -> AuthorCard {
    AuthorCard {
        id: user.id,
        username: user.username.clone(),
        posts_count: stats.posts,
        followers_count: stats.followers,
        following_count: stats.following,
    }
}
