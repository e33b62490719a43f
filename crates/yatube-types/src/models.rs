use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Compact author reference embedded in posts and comments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: i64,
    pub slug: String,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: DateTime<Utc>,
    pub author: UserRef,
    pub group: Option<GroupRef>,
    /// Path relative to the media root, e.g. `posts/<file>.gif`.
    pub image: Option<String>,
    pub comments_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub text: String,
    pub created: DateTime<Utc>,
    pub author: UserRef,
}

/// Author summary shown on the profile and post pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorCard {
    pub id: i64,
    pub username: String,
    pub posts_count: i64,
    pub followers_count: i64,
    pub following_count: i64,
}
