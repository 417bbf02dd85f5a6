use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The five fixed reaction kinds. The wire vocabulary (`as_str`) must never
/// contain `_` — callback payloads use it as the field separator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionKind {
    Love,
    Support,
    Amen,
    Agree,
    Disagree,
}

#[derive(Debug, Error)]
#[error("unknown reaction kind: {0}")]
pub struct ParseReactionKindError(pub String);

impl ReactionKind {
    pub const ALL: [ReactionKind; 5] = [
        ReactionKind::Love,
        ReactionKind::Support,
        ReactionKind::Amen,
        ReactionKind::Agree,
        ReactionKind::Disagree,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionKind::Love => "love",
            ReactionKind::Support => "support",
            ReactionKind::Amen => "amen",
            ReactionKind::Agree => "agree",
            ReactionKind::Disagree => "disagree",
        }
    }

    pub fn emoji(&self) -> &'static str {
        match self {
            ReactionKind::Love => "❤️",
            ReactionKind::Support => "🙌",
            ReactionKind::Amen => "🙏",
            ReactionKind::Agree => "🤝",
            ReactionKind::Disagree => "🙅",
        }
    }
}

impl fmt::Display for ReactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReactionKind {
    type Err = ParseReactionKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "love" => Ok(ReactionKind::Love),
            "support" => Ok(ReactionKind::Support),
            "amen" => Ok(ReactionKind::Amen),
            "agree" => Ok(ReactionKind::Agree),
            "disagree" => Ok(ReactionKind::Disagree),
            other => Err(ParseReactionKindError(other.to_string())),
        }
    }
}

/// Per-comment reaction counts, one slot per kind. Counts are computed fresh
/// from reaction rows — never incremented in place across calls.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTally {
    pub love: u64,
    pub support: u64,
    pub amen: u64,
    pub agree: u64,
    pub disagree: u64,
}

impl ReactionTally {
    pub fn get(&self, kind: ReactionKind) -> u64 {
        match kind {
            ReactionKind::Love => self.love,
            ReactionKind::Support => self.support,
            ReactionKind::Amen => self.amen,
            ReactionKind::Agree => self.agree,
            ReactionKind::Disagree => self.disagree,
        }
    }

    pub fn bump(&mut self, kind: ReactionKind) {
        match kind {
            ReactionKind::Love => self.love += 1,
            ReactionKind::Support => self.support += 1,
            ReactionKind::Amen => self.amen += 1,
            ReactionKind::Agree => self.agree += 1,
            ReactionKind::Disagree => self.disagree += 1,
        }
    }

    pub fn total(&self) -> u64 {
        ReactionKind::ALL.iter().map(|k| self.get(*k)).sum()
    }
}

/// Media variants the channel can deliver. Closed set — dispatch on this
/// enum replaces per-kind branching at every send site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Photo,
    Video,
    Animation,
    Sticker,
    Document,
}

#[derive(Debug, Error)]
#[error("unknown media kind: {0}")]
pub struct ParseMediaKindError(pub String);

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Photo => "photo",
            MediaKind::Video => "video",
            MediaKind::Animation => "animation",
            MediaKind::Sticker => "sticker",
            MediaKind::Document => "document",
        }
    }

    /// Stickers cannot carry a caption; the authoring flow skips the
    /// captioning step for them and delivery omits the caption field.
    pub fn supports_caption(&self) -> bool {
        !matches!(self, MediaKind::Sticker)
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = ParseMediaKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "photo" => Ok(MediaKind::Photo),
            "video" => Ok(MediaKind::Video),
            "animation" => Ok(MediaKind::Animation),
            "sticker" => Ok(MediaKind::Sticker),
            "document" => Ok(MediaKind::Document),
            other => Err(ParseMediaKindError(other.to_string())),
        }
    }
}

/// An opaque media handle plus its kind. The handle is only meaningful to
/// the channel transport that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub kind: MediaKind,
    pub file_id: String,
}

/// A published post. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    /// Channel message id — the external reference users deep-link through.
    pub external_message_id: i64,
    pub chat_ref: String,
    pub content: Option<String>,
    pub media: Option<MediaAttachment>,
    pub topic_ref: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// A stored comment. `parent_comment_id == None` means root comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub parent_comment_id: Option<i64>,
    pub content: Option<String>,
    pub media: Option<MediaAttachment>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_kind_round_trip() {
        for kind in ReactionKind::ALL {
            assert_eq!(kind.as_str().parse::<ReactionKind>().unwrap(), kind);
        }
        assert!("shrug".parse::<ReactionKind>().is_err());
    }

    #[test]
    fn reaction_kind_vocabulary_has_no_separator() {
        // Callback payloads are '_'-separated; a kind containing '_' would
        // make them ambiguous.
        for kind in ReactionKind::ALL {
            assert!(!kind.as_str().contains('_'));
        }
    }

    #[test]
    fn tally_bump_and_get() {
        let mut tally = ReactionTally::default();
        tally.bump(ReactionKind::Agree);
        tally.bump(ReactionKind::Agree);
        tally.bump(ReactionKind::Love);
        assert_eq!(tally.get(ReactionKind::Agree), 2);
        assert_eq!(tally.get(ReactionKind::Love), 1);
        assert_eq!(tally.get(ReactionKind::Disagree), 0);
        assert_eq!(tally.total(), 3);
    }

    #[test]
    fn sticker_is_captionless() {
        assert!(!MediaKind::Sticker.supports_caption());
        assert!(MediaKind::Photo.supports_caption());
    }
}
