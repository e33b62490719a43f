use crate::Database;
use crate::models::{AuthorStats, CommentRow, GroupRow, PostRow, UserRow};
use anyhow::Result;
use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, Row, ffi};

/// Which posts a listing covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PostScope {
    All,
    Group(i64),
    Author(i64),
    /// Posts of every author the given user follows.
    Feed(i64),
}

impl PostScope {
    fn filter(self) -> (&'static str, Option<i64>) {
        match self {
            Self::All => ("", None),
            Self::Group(id) => ("WHERE p.group_id = ?1", Some(id)),
            Self::Author(id) => ("WHERE p.author_id = ?1", Some(id)),
            Self::Feed(user_id) => (
                "WHERE p.author_id IN (SELECT author_id FROM follows WHERE user_id = ?1)",
                Some(user_id),
            ),
        }
    }
}

const POST_SELECT: &str = "SELECT p.id, p.text, p.pub_date, p.author_id, u.username,
            p.group_id, g.slug, g.title, p.image,
            (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id)
     FROM posts p
     JOIN users u ON u.id = p.author_id
     LEFT JOIN post_groups g ON g.id = p.group_id";

const POST_ORDER: &str = "ORDER BY p.pub_date DESC, p.id DESC";

impl Database {
    // -- Users --

    /// Returns the new user's id, or `None` if the username is taken.
    pub fn create_user(&self, username: &str, password_hash: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (username, password, date_joined) VALUES (?1, ?2, ?3)",
                (username, password_hash, now_timestamp()),
            );
            match inserted {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password, date_joined FROM users WHERE username = ?1",
                [username],
                map_user,
            )
            .optional()
        })
    }

    pub fn get_user_by_id(&self, id: i64) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, username, password, date_joined FROM users WHERE id = ?1",
                [id],
                map_user,
            )
            .optional()
        })
    }

    /// Removes the user together with their posts, comments and follow edges.
    pub fn delete_user(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM users WHERE id = ?1", [id])? > 0))
    }

    pub fn author_stats(&self, user_id: i64) -> Result<AuthorStats> {
        self.with_conn(|conn| {
            let stats = conn.query_row(
                "SELECT
                    (SELECT COUNT(*) FROM posts WHERE author_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE author_id = ?1),
                    (SELECT COUNT(*) FROM follows WHERE user_id = ?1)",
                [user_id],
                |row| {
                    Ok(AuthorStats {
                        posts: row.get(0)?,
                        followers: row.get(1)?,
                        following: row.get(2)?,
                    })
                },
            )?;
            Ok(stats)
        })
    }

    // -- Groups --

    /// Returns the new group's id, or `None` if the slug is taken.
    pub fn create_group(&self, title: &str, slug: &str, description: &str) -> Result<Option<i64>> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO post_groups (title, slug, description) VALUES (?1, ?2, ?3)",
                (title, slug, description),
            );
            match inserted {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn get_group_by_slug(&self, slug: &str) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, title, slug, description FROM post_groups WHERE slug = ?1",
                [slug],
                map_group,
            )
            .optional()
        })
    }

    pub fn get_group_by_id(&self, id: i64) -> Result<Option<GroupRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT id, title, slug, description FROM post_groups WHERE id = ?1",
                [id],
                map_group,
            )
            .optional()
        })
    }

    pub fn list_groups(&self) -> Result<Vec<GroupRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, title, slug, description FROM post_groups ORDER BY title, id",
            )?;
            let rows = stmt
                .query_map([], map_group)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Posts of the group survive with their group cleared.
    pub fn delete_group(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM post_groups WHERE id = ?1", [id])? > 0))
    }

    // -- Posts --

    pub fn create_post(
        &self,
        author_id: i64,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (text, pub_date, author_id, group_id, image)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![text, now_timestamp(), author_id, group_id, image],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Rewrites the editable fields. `pub_date` and the author never change.
    pub fn update_post(
        &self,
        id: i64,
        text: &str,
        group_id: Option<i64>,
        image: Option<&str>,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "UPDATE posts SET text = ?2, group_id = ?3, image = ?4 WHERE id = ?1",
                rusqlite::params![id, text, group_id, image],
            )?;
            Ok(changed > 0)
        })
    }

    /// Looks a post up through its author, mirroring the `/{username}/{post_id}/` URL.
    pub fn get_post(&self, username: &str, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("{POST_SELECT} WHERE p.id = ?1 AND u.username = ?2"),
                rusqlite::params![id, username],
                map_post,
            )
            .optional()
        })
    }

    pub fn get_post_by_id(&self, id: i64) -> Result<Option<PostRow>> {
        self.with_conn(|conn| {
            conn.query_row(&format!("{POST_SELECT} WHERE p.id = ?1"), [id], map_post)
                .optional()
        })
    }

    pub fn delete_post(&self, id: i64) -> Result<bool> {
        self.with_conn(|conn| Ok(conn.execute("DELETE FROM posts WHERE id = ?1", [id])? > 0))
    }

    pub fn count_posts(&self, scope: PostScope) -> Result<u64> {
        self.with_conn(|conn| {
            let (filter, param) = scope.filter();
            let sql = format!("SELECT COUNT(*) FROM posts p {filter}");
            let count: i64 = match param {
                Some(id) => conn.query_row(&sql, [id], |r| r.get(0))?,
                None => conn.query_row(&sql, [], |r| r.get(0))?,
            };
            Ok(count as u64)
        })
    }

    /// Newest first.
    pub fn list_posts(&self, scope: PostScope, limit: u32, offset: u64) -> Result<Vec<PostRow>> {
        self.with_conn(|conn| query_posts(conn, scope, limit, offset))
    }

    // -- Comments --

    pub fn create_comment(&self, post_id: i64, author_id: i64, text: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (post_id, author_id, text, created) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![post_id, author_id, text, now_timestamp()],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Newest first.
    pub fn list_comments(&self, post_id: i64) -> Result<Vec<CommentRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.post_id, c.author_id, u.username, c.text, c.created
                 FROM comments c
                 JOIN users u ON u.id = c.author_id
                 WHERE c.post_id = ?1
                 ORDER BY c.created DESC, c.id DESC",
            )?;

            let rows = stmt
                .query_map([post_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        author_id: row.get(2)?,
                        author_username: row.get(3)?,
                        text: row.get(4)?,
                        created: row.get(5)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }

    // -- Follows --

    /// Returns true if a new edge was created, false if it already existed.
    pub fn follow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO follows (user_id, author_id) VALUES (?1, ?2)",
                [user_id, author_id],
            )?;
            Ok(inserted > 0)
        })
    }

    /// Returns true if an edge was removed.
    pub fn unfollow(&self, user_id: i64, author_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let removed = conn.execute(
                "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
                [user_id, author_id],
            )?;
            Ok(removed > 0)
        })
    }

    pub fn is_following(&self, user_id: i64, author_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let exists: bool = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM follows WHERE user_id = ?1 AND author_id = ?2)",
                [user_id, author_id],
                |r| r.get(0),
            )?;
            Ok(exists)
        })
    }
}

fn query_posts(
    conn: &Connection,
    scope: PostScope,
    limit: u32,
    offset: u64,
) -> Result<Vec<PostRow>> {
    let (filter, param) = scope.filter();
    // LIMIT/OFFSET are bound after the optional scope parameter
    let sql = match param {
        Some(_) => format!("{POST_SELECT} {filter} {POST_ORDER} LIMIT ?2 OFFSET ?3"),
        None => format!("{POST_SELECT} {POST_ORDER} LIMIT ?1 OFFSET ?2"),
    };
    let mut stmt = conn.prepare(&sql)?;

    let offset = offset as i64;
    let rows = match param {
        Some(id) => stmt
            .query_map(rusqlite::params![id, limit, offset], map_post)?
            .collect::<std::result::Result<Vec<_>, _>>()?,
        None => stmt
            .query_map(rusqlite::params![limit, offset], map_post)?
            .collect::<std::result::Result<Vec<_>, _>>()?,
    };

    Ok(rows)
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        password: row.get(2)?,
        date_joined: row.get(3)?,
    })
}

fn map_group(row: &Row<'_>) -> rusqlite::Result<GroupRow> {
    Ok(GroupRow {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
    })
}

fn map_post(row: &Row<'_>) -> rusqlite::Result<PostRow> {
    Ok(PostRow {
        id: row.get(0)?,
        text: row.get(1)?,
        pub_date: row.get(2)?,
        author_id: row.get(3)?,
        author_username: row.get(4)?,
        group_id: row.get(5)?,
        group_slug: row.get(6)?,
        group_title: row.get(7)?,
        image: row.get(8)?,
        comments_count: row.get(9)?,
    })
}

/// Fixed-width RFC 3339 so lexical order matches chronological order.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Only UNIQUE failures; NOT NULL and foreign key failures stay errors.
fn is_unique_violation(e: &rusqlite::Error) -> bool {
    matches!(
        e,
        rusqlite::Error::SqliteFailure(err, _) if err.extended_code == ffi::SQLITE_CONSTRAINT_UNIQUE
    )
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
