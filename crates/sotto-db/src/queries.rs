use crate::Database;
use crate::models::{CommentRow, PostRow, ReactionRow};
use anyhow::Result;

use sotto_types::{Comment, MediaAttachment, Post, ReactionKind};

impl Database {
    // -- Posts --

    pub fn insert_post(
        &self,
        external_message_id: i64,
        chat_ref: &str,
        content: Option<&str>,
        media: Option<&MediaAttachment>,
        topic_ref: Option<i64>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO posts (external_message_id, chat_ref, content, media_kind, media_ref, topic_ref)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                rusqlite::params![
                    external_message_id,
                    chat_ref,
                    content,
                    media.map(|m| m.kind.as_str()),
                    media.map(|m| m.file_id.as_str()),
                    topic_ref,
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn post_by_external_id(&self, external_message_id: i64) -> Result<Option<Post>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, external_message_id, chat_ref, content, media_kind, media_ref, topic_ref, created_at
                 FROM posts WHERE external_message_id = ?1",
            )?;

            let row = stmt
                .query_row([external_message_id], |row| {
                    Ok(PostRow {
                        id: row.get(0)?,
                        external_message_id: row.get(1)?,
                        chat_ref: row.get(2)?,
                        content: row.get(3)?,
                        media_kind: row.get(4)?,
                        media_ref: row.get(5)?,
                        topic_ref: row.get(6)?,
                        created_at: row.get(7)?,
                    })
                })
                .optional()?;

            Ok(row.map(PostRow::into_post))
        })
    }

    // -- Comments --

    pub fn insert_comment(
        &self,
        post_id: i64,
        parent_comment_id: Option<i64>,
        content: Option<&str>,
        media: Option<&MediaAttachment>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO comments (post_id, parent_comment_id, content, media_kind, media_ref)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![
                    post_id,
                    parent_comment_id,
                    content,
                    media.map(|m| m.kind.as_str()),
                    media.map(|m| m.file_id.as_str()),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// All comments for a post in display order: ascending creation time,
    /// ties broken by ascending id.
    pub fn comments_for_post(&self, post_id: i64) -> Result<Vec<Comment>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, post_id, parent_comment_id, content, media_kind, media_ref, created_at
                 FROM comments
                 WHERE post_id = ?1
                 ORDER BY created_at ASC, id ASC",
            )?;

            let rows = stmt
                .query_map([post_id], |row| {
                    Ok(CommentRow {
                        id: row.get(0)?,
                        post_id: row.get(1)?,
                        parent_comment_id: row.get(2)?,
                        content: row.get(3)?,
                        media_kind: row.get(4)?,
                        media_ref: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows.into_iter().map(CommentRow::into_comment).collect())
        })
    }

    pub fn comment_exists(&self, comment_id: i64) -> Result<bool> {
        self.with_conn(|conn| {
            let hit = conn
                .query_row(
                    "SELECT 1 FROM comments WHERE id = ?1",
                    [comment_id],
                    |row| row.get::<_, i64>(0),
                )
                .optional()?;
            Ok(hit.is_some())
        })
    }

    /// Root comments only — replies are excluded from the displayed total.
    pub fn root_comment_count(&self, post_id: i64) -> Result<i64> {
        self.with_conn(|conn| {
            let count = conn.query_row(
                "SELECT COUNT(*) FROM comments WHERE post_id = ?1 AND parent_comment_id IS NULL",
                [post_id],
                |row| row.get(0),
            )?;
            Ok(count)
        })
    }

    // -- Reactions --

    /// Toggle a reaction: removes the row if it exists, inserts otherwise.
    /// Returns true when a row was added, false when removed. The
    /// check-then-act pair is not atomic; the UNIQUE constraint plus
    /// ON CONFLICT DO NOTHING keeps racing toggles from duplicating rows.
    pub fn toggle_reaction(
        &self,
        comment_id: i64,
        user_id: i64,
        kind: ReactionKind,
    ) -> Result<bool> {
        self.with_conn(|conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM reactions WHERE comment_id = ?1 AND user_id = ?2 AND kind = ?3",
                    rusqlite::params![comment_id, user_id, kind.as_str()],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(existing_id) = existing {
                conn.execute("DELETE FROM reactions WHERE id = ?1", [existing_id])?;
                Ok(false)
            } else {
                conn.execute(
                    "INSERT INTO reactions (comment_id, user_id, kind) VALUES (?1, ?2, ?3)
                     ON CONFLICT DO NOTHING",
                    rusqlite::params![comment_id, user_id, kind.as_str()],
                )?;
                Ok(true)
            }
        })
    }

    pub fn reactions_for_comment(&self, comment_id: i64) -> Result<Vec<ReactionRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, comment_id, user_id, kind, created_at
                 FROM reactions WHERE comment_id = ?1",
            )?;
            let rows = stmt
                .query_map([comment_id], map_reaction_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    /// Batch-fetch reactions for a set of comment ids (one query per post
    /// render, not one per comment).
    pub fn reactions_for_comments(&self, comment_ids: &[i64]) -> Result<Vec<ReactionRow>> {
        if comment_ids.is_empty() {
            return Ok(vec![]);
        }

        self.with_conn(|conn| {
            let placeholders: Vec<String> =
                (1..=comment_ids.len()).map(|i| format!("?{}", i)).collect();
            let sql = format!(
                "SELECT id, comment_id, user_id, kind, created_at
                 FROM reactions WHERE comment_id IN ({})",
                placeholders.join(", ")
            );

            let mut stmt = conn.prepare(&sql)?;
            let params: Vec<&dyn rusqlite::types::ToSql> = comment_ids
                .iter()
                .map(|id| id as &dyn rusqlite::types::ToSql)
                .collect();

            let rows = stmt
                .query_map(params.as_slice(), map_reaction_row)?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn map_reaction_row(row: &rusqlite::Row<'_>) -> std::result::Result<ReactionRow, rusqlite::Error> {
    Ok(ReactionRow {
        id: row.get(0)?,
        comment_id: row.get(1)?,
        user_id: row.get(2)?,
        kind: row.get(3)?,
        created_at: row.get(4)?,
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
