//! Database row types — these map directly to SQLite rows. Conversion into
//! the shared domain types (parsing media kinds and timestamps) lives here
//! so callers never see raw column strings.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use sotto_types::{Comment, MediaAttachment, Post};

pub struct PostRow {
    pub id: i64,
    pub external_message_id: i64,
    pub chat_ref: String,
    pub content: Option<String>,
    pub media_kind: Option<String>,
    pub media_ref: Option<String>,
    pub topic_ref: Option<i64>,
    pub created_at: String,
}

pub struct CommentRow {
    pub id: i64,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub content: Option<String>,
    pub media_kind: Option<String>,
    pub media_ref: Option<String>,
    pub created_at: String,
}

pub struct ReactionRow {
    pub id: i64,
    pub comment_id: i64,
    pub user_id: i64,
    pub kind: String,
    pub created_at: String,
}

impl PostRow {
    pub fn into_post(self) -> Post {
        Post {
            id: self.id,
            external_message_id: self.external_message_id,
            chat_ref: self.chat_ref,
            media: parse_media(self.id, "post", &self.media_kind, self.media_ref),
            content: self.content,
            topic_ref: self.topic_ref,
            created_at: parse_timestamp(self.id, "post", &self.created_at),
        }
    }
}

impl CommentRow {
    pub fn into_comment(self) -> Comment {
        Comment {
            id: self.id,
            post_id: self.post_id,
            parent_comment_id: self.parent_comment_id,
            media: parse_media(self.id, "comment", &self.media_kind, self.media_ref),
            content: self.content,
            created_at: parse_timestamp(self.id, "comment", &self.created_at),
        }
    }
}

fn parse_media(
    row_id: i64,
    entity: &str,
    kind: &Option<String>,
    file_id: Option<String>,
) -> Option<MediaAttachment> {
    let kind = kind.as_deref()?;
    match (kind.parse(), file_id) {
        (Ok(kind), Some(file_id)) => Some(MediaAttachment { kind, file_id }),
        (parsed, file_id) => {
            warn!(
                "Corrupt media columns on {} {}: kind={:?} ref_present={}",
                entity,
                row_id,
                parsed.err(),
                file_id.is_some()
            );
            None
        }
    }
}

fn parse_timestamp(row_id: i64, entity: &str, raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| {
            // SQLite stores timestamps as "YYYY-MM-DD HH:MM:SS" without
            // timezone. Parse as naive UTC and convert.
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            warn!("Corrupt created_at '{}' on {} {}: {}", raw, entity, row_id, e);
            DateTime::default()
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sotto_types::MediaKind;

    #[test]
    fn parses_sqlite_timestamp_format() {
        let ts = parse_timestamp(1, "post", "2026-03-01 12:30:00");
        assert_eq!(ts.to_rfc3339(), "2026-03-01T12:30:00+00:00");
    }

    #[test]
    fn corrupt_media_kind_becomes_none() {
        assert!(parse_media(1, "comment", &Some("hologram".into()), Some("f".into())).is_none());
        let media = parse_media(1, "comment", &Some("photo".into()), Some("f".into())).unwrap();
        assert_eq!(media.kind, MediaKind::Photo);
    }
}
