//! Recording fakes for the collaborator ports, shared by the core tests.

use std::sync::Mutex;
use std::sync::atomic::{AtomicI64, Ordering};

use anyhow::Result;
use async_trait::async_trait;

use sotto_types::MediaAttachment;
use sotto_types::MediaKind;
use sotto_types::keyboard::{InlineKeyboardMarkup, ReplyMarkup};

use crate::ports::{ChannelPort, MemberStatus, MembershipGate, SentMessage};

#[derive(Debug, Clone)]
pub(crate) enum SentCall {
    Text {
        chat: String,
        thread_id: Option<i64>,
        text: String,
        markup: Option<ReplyMarkup>,
    },
    Media {
        chat: String,
        thread_id: Option<i64>,
        kind: MediaKind,
        file_id: String,
        caption: Option<String>,
        markup: Option<ReplyMarkup>,
    },
    EditMarkup {
        chat: String,
        message_id: i64,
        markup: InlineKeyboardMarkup,
    },
    AnswerCallback {
        callback_id: String,
        text: Option<String>,
    },
}

/// Channel fake that records every outbound call and hands out sequential
/// message ids starting at 1000.
pub(crate) struct RecordingChannel {
    calls: Mutex<Vec<SentCall>>,
    next_message_id: AtomicI64,
}

impl RecordingChannel {
    pub(crate) fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            next_message_id: AtomicI64::new(1000),
        }
    }

    pub(crate) fn calls(&self) -> Vec<SentCall> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SentCall::Text { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_markup_edit(&self) -> Option<(String, i64, InlineKeyboardMarkup)> {
        self.calls().into_iter().rev().find_map(|c| match c {
            SentCall::EditMarkup { chat, message_id, markup } => {
                Some((chat, message_id, markup))
            }
            _ => None,
        })
    }

    pub(crate) fn callback_answers(&self) -> Vec<Option<String>> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SentCall::AnswerCallback { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: SentCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl ChannelPort for RecordingChannel {
    async fn send_text(
        &self,
        chat: &str,
        thread_id: Option<i64>,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<SentMessage> {
        self.record(SentCall::Text {
            chat: chat.to_string(),
            thread_id,
            text: text.to_string(),
            markup,
        });
        Ok(SentMessage { message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst) })
    }

    async fn send_media(
        &self,
        chat: &str,
        thread_id: Option<i64>,
        media: &MediaAttachment,
        caption: Option<&str>,
        markup: Option<ReplyMarkup>,
    ) -> Result<SentMessage> {
        self.record(SentCall::Media {
            chat: chat.to_string(),
            thread_id,
            kind: media.kind,
            file_id: media.file_id.clone(),
            caption: caption.map(str::to_string),
            markup,
        });
        Ok(SentMessage { message_id: self.next_message_id.fetch_add(1, Ordering::SeqCst) })
    }

    async fn edit_reply_markup(
        &self,
        chat: &str,
        message_id: i64,
        markup: InlineKeyboardMarkup,
    ) -> Result<()> {
        self.record(SentCall::EditMarkup { chat: chat.to_string(), message_id, markup });
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        self.record(SentCall::AnswerCallback {
            callback_id: callback_id.to_string(),
            text: text.map(str::to_string),
        });
        Ok(())
    }

    async fn bot_username(&self) -> Result<String> {
        Ok("sottobot".to_string())
    }
}

/// Membership fake whose answer can be swapped mid-test.
pub(crate) struct FakeGate {
    status: Mutex<MemberStatus>,
}

impl FakeGate {
    pub(crate) fn with(status: MemberStatus) -> Self {
        Self { status: Mutex::new(status) }
    }

    pub(crate) fn set(&self, status: MemberStatus) {
        *self.status.lock().unwrap() = status;
    }
}

#[async_trait]
impl MembershipGate for FakeGate {
    async fn member_status(&self, _chat: &str, _user_id: i64) -> Result<MemberStatus> {
        Ok(*self.status.lock().unwrap())
    }
}
