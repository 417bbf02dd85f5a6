use serde::Serialize;

use crate::callback::CallbackAction;
use crate::models::{ReactionKind, ReactionTally};
use crate::topic::TopicSet;

/// Inline keyboard attached to a channel or chat message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardMarkup {
    pub inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineKeyboardButton {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl InlineKeyboardButton {
    pub fn callback(text: impl Into<String>, data: impl Into<String>) -> Self {
        Self { text: text.into(), callback_data: Some(data.into()), url: None }
    }

    pub fn url(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self { text: text.into(), callback_data: None, url: Some(url.into()) }
    }
}

/// One-tap reply keyboard shown in the private chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplyKeyboardMarkup {
    pub keyboard: Vec<Vec<KeyboardButton>>,
    pub resize_keyboard: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyboardButton {
    pub text: String,
}

impl ReplyKeyboardMarkup {
    pub fn rows(rows: Vec<Vec<&str>>) -> Self {
        Self {
            keyboard: rows
                .into_iter()
                .map(|row| {
                    row.into_iter()
                        .map(|text| KeyboardButton { text: text.to_string() })
                        .collect()
                })
                .collect(),
            resize_keyboard: true,
        }
    }
}

/// Either markup flavor, serialized as the Bot API expects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ReplyMarkup {
    Inline(InlineKeyboardMarkup),
    Reply(ReplyKeyboardMarkup),
}

/// Reaction rows + reply button for one rendered comment. Layout: three
/// kinds, two kinds, reply.
pub fn reaction_keyboard(
    post_external_id: i64,
    comment_id: i64,
    tally: &ReactionTally,
) -> InlineKeyboardMarkup {
    let react = |kind: ReactionKind| {
        InlineKeyboardButton::callback(
            format!("{} {}", kind.emoji(), tally.get(kind)),
            CallbackAction::React { kind, post_external_id, comment_id }.encode(),
        )
    };

    InlineKeyboardMarkup {
        inline_keyboard: vec![
            vec![
                react(ReactionKind::Love),
                react(ReactionKind::Support),
                react(ReactionKind::Amen),
            ],
            vec![react(ReactionKind::Agree), react(ReactionKind::Disagree)],
            vec![InlineKeyboardButton::callback(
                "↩️ Reply",
                CallbackAction::Reply { post_external_id, comment_id }.encode(),
            )],
        ],
    }
}

/// The deep-link counter button attached to the published channel message.
pub fn comment_count_keyboard(
    count: i64,
    bot_username: &str,
    post_external_id: i64,
) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: vec![vec![InlineKeyboardButton::url(
            format!("💬 {count} Comments"),
            format!("https://t.me/{bot_username}?start=comment_{post_external_id}"),
        )]],
    }
}

pub fn main_menu() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup::rows(vec![vec!["📝 Post", "ℹ️ Help"]])
}

pub fn topic_keyboard(topics: &TopicSet) -> ReplyKeyboardMarkup {
    let mut keyboard: Vec<Vec<KeyboardButton>> = topics
        .iter()
        .map(|t| vec![KeyboardButton { text: t.label.clone() }])
        .collect();
    keyboard.push(vec![KeyboardButton { text: "🚫 Cancel".into() }]);
    ReplyKeyboardMarkup { keyboard, resize_keyboard: true }
}

pub fn confirm_keyboard() -> ReplyKeyboardMarkup {
    ReplyKeyboardMarkup::rows(vec![vec!["✅ Submit", "✏️ Edit"], vec!["🚫 Cancel"]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reaction_keyboard_layout_and_payloads() {
        let mut tally = ReactionTally::default();
        tally.bump(ReactionKind::Love);
        let kb = reaction_keyboard(500, 7, &tally);

        assert_eq!(kb.inline_keyboard.len(), 3);
        assert_eq!(kb.inline_keyboard[0].len(), 3);
        assert_eq!(kb.inline_keyboard[1].len(), 2);
        assert_eq!(kb.inline_keyboard[2].len(), 1);

        let love = &kb.inline_keyboard[0][0];
        assert_eq!(love.text, "❤️ 1");
        assert_eq!(love.callback_data.as_deref(), Some("react_love_500_7"));

        let reply = &kb.inline_keyboard[2][0];
        assert_eq!(reply.callback_data.as_deref(), Some("reply_500_7"));
    }

    #[test]
    fn count_keyboard_deep_link() {
        let kb = comment_count_keyboard(3, "sottobot", 812);
        let button = &kb.inline_keyboard[0][0];
        assert_eq!(button.text, "💬 3 Comments");
        assert_eq!(
            button.url.as_deref(),
            Some("https://t.me/sottobot?start=comment_812")
        );
    }

    #[test]
    fn topic_keyboard_ends_with_cancel() {
        let kb = topic_keyboard(&TopicSet::default());
        assert_eq!(kb.keyboard.len(), 4);
        assert_eq!(kb.keyboard.last().unwrap()[0].text, "🚫 Cancel");
    }
}
