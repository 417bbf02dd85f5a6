//! Collaborator seams. The engine never talks to the Bot API directly —
//! it sends through [`ChannelPort`] and checks membership through
//! [`MembershipGate`], so tests can substitute recording fakes.

use anyhow::Result;
use async_trait::async_trait;

use sotto_types::MediaAttachment;
use sotto_types::keyboard::{InlineKeyboardMarkup, ReplyMarkup};

/// Reference to a message the transport just delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub message_id: i64,
}

/// Membership status of a user in the target channel chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    /// Only full members (and above) may publish.
    pub fn can_post(&self) -> bool {
        matches!(
            self,
            MemberStatus::Creator | MemberStatus::Administrator | MemberStatus::Member
        )
    }

    /// Statuses the Bot API reports. Anything unrecognized is `None`;
    /// callers must treat that as non-qualifying.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "creator" => Some(MemberStatus::Creator),
            "administrator" => Some(MemberStatus::Administrator),
            "member" => Some(MemberStatus::Member),
            "restricted" => Some(MemberStatus::Restricted),
            "left" => Some(MemberStatus::Left),
            "kicked" => Some(MemberStatus::Kicked),
            _ => None,
        }
    }
}

/// Outbound messaging surface. One polymorphic `send_media` covers every
/// media kind; `thread_id` targets a forum topic when publishing to the
/// channel chat.
#[async_trait]
pub trait ChannelPort: Send + Sync {
    async fn send_text(
        &self,
        chat: &str,
        thread_id: Option<i64>,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<SentMessage>;

    async fn send_media(
        &self,
        chat: &str,
        thread_id: Option<i64>,
        media: &MediaAttachment,
        caption: Option<&str>,
        markup: Option<ReplyMarkup>,
    ) -> Result<SentMessage>;

    async fn edit_reply_markup(
        &self,
        chat: &str,
        message_id: i64,
        markup: InlineKeyboardMarkup,
    ) -> Result<()>;

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()>;

    async fn bot_username(&self) -> Result<String>;
}

#[async_trait]
pub trait MembershipGate: Send + Sync {
    async fn member_status(&self, chat: &str, user_id: i64) -> Result<MemberStatus>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualifying_statuses() {
        assert!(MemberStatus::Creator.can_post());
        assert!(MemberStatus::Administrator.can_post());
        assert!(MemberStatus::Member.can_post());
        assert!(!MemberStatus::Restricted.can_post());
        assert!(!MemberStatus::Left.can_post());
        assert!(!MemberStatus::Kicked.can_post());
    }

    #[test]
    fn unknown_status_is_none() {
        assert_eq!(MemberStatus::parse("member"), Some(MemberStatus::Member));
        assert_eq!(MemberStatus::parse("lurker"), None);
    }
}
