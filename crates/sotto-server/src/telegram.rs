//! Thin Telegram Bot API client. Implements the core's channel and
//! membership ports over HTTPS; every call is a single POST with a JSON
//! payload and an `ApiResponse` envelope.

use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::debug;

use sotto_core::ports::{ChannelPort, MemberStatus, MembershipGate, SentMessage};
use sotto_types::MediaAttachment;
use sotto_types::keyboard::{InlineKeyboardMarkup, ReplyMarkup};

use crate::update::Update;

pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
    username: OnceCell<String>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    message_id: i64,
}

#[derive(Debug, Deserialize)]
struct ApiUser {
    username: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiChatMember {
    status: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("https://api.telegram.org/bot{token}"),
            username: OnceCell::new(),
        }
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: Value) -> Result<T> {
        debug!("Bot API call: {}", method);
        let resp: ApiResponse<T> = self
            .http
            .post(format!("{}/{}", self.base, method))
            .json(&payload)
            .send()
            .await
            .with_context(|| format!("Bot API {method} request failed"))?
            .json()
            .await
            .with_context(|| format!("Bot API {method} returned invalid JSON"))?;

        if !resp.ok {
            bail!(
                "Bot API {} rejected: {}",
                method,
                resp.description.unwrap_or_else(|| "no description".into())
            );
        }
        resp.result
            .ok_or_else(|| anyhow!("Bot API {} returned no result", method))
    }

    pub async fn set_my_commands(&self) -> Result<()> {
        let _: bool = self
            .call(
                "setMyCommands",
                json!({
                    "commands": [
                        { "command": "start", "description": "Start" },
                        { "command": "post", "description": "Create anonymous post" },
                        { "command": "help", "description": "Help" },
                    ]
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn set_webhook(&self, url: &str) -> Result<()> {
        let _: bool = self.call("setWebhook", json!({ "url": url })).await?;
        Ok(())
    }

    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({ "offset": offset, "timeout": timeout_secs }),
        )
        .await
    }
}

fn with_common_fields(
    mut payload: Value,
    thread_id: Option<i64>,
    markup: Option<ReplyMarkup>,
) -> Result<Value> {
    if let Some(thread_id) = thread_id {
        payload["message_thread_id"] = json!(thread_id);
    }
    if let Some(markup) = markup {
        payload["reply_markup"] = serde_json::to_value(&markup)?;
    }
    Ok(payload)
}

#[async_trait]
impl ChannelPort for TelegramClient {
    async fn send_text(
        &self,
        chat: &str,
        thread_id: Option<i64>,
        text: &str,
        markup: Option<ReplyMarkup>,
    ) -> Result<SentMessage> {
        let payload = with_common_fields(
            json!({ "chat_id": chat, "text": text }),
            thread_id,
            markup,
        )?;
        let message: ApiMessage = self.call("sendMessage", payload).await?;
        Ok(SentMessage { message_id: message.message_id })
    }

    async fn send_media(
        &self,
        chat: &str,
        thread_id: Option<i64>,
        media: &MediaAttachment,
        caption: Option<&str>,
        markup: Option<ReplyMarkup>,
    ) -> Result<SentMessage> {
        use sotto_types::MediaKind::*;
        let (method, field) = match media.kind {
            Photo => ("sendPhoto", "photo"),
            Video => ("sendVideo", "video"),
            Animation => ("sendAnimation", "animation"),
            Sticker => ("sendSticker", "sticker"),
            Document => ("sendDocument", "document"),
        };

        let mut payload = json!({ "chat_id": chat, field: media.file_id });
        if media.kind.supports_caption() {
            if let Some(caption) = caption {
                payload["caption"] = json!(caption);
            }
        }
        let payload = with_common_fields(payload, thread_id, markup)?;

        let message: ApiMessage = self.call(method, payload).await?;
        Ok(SentMessage { message_id: message.message_id })
    }

    async fn edit_reply_markup(
        &self,
        chat: &str,
        message_id: i64,
        markup: InlineKeyboardMarkup,
    ) -> Result<()> {
        // The API returns the edited Message (or `true` for inline
        // messages); either way the body is irrelevant here.
        let _: Value = self
            .call(
                "editMessageReplyMarkup",
                json!({
                    "chat_id": chat,
                    "message_id": message_id,
                    "reply_markup": serde_json::to_value(&markup)?,
                }),
            )
            .await?;
        Ok(())
    }

    async fn answer_callback(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut payload = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            payload["text"] = json!(text);
        }
        let _: bool = self.call("answerCallbackQuery", payload).await?;
        Ok(())
    }

    async fn bot_username(&self) -> Result<String> {
        self.username
            .get_or_try_init(|| async {
                let me: ApiUser = self.call("getMe", json!({})).await?;
                me.username
                    .ok_or_else(|| anyhow!("bot account has no username"))
            })
            .await
            .cloned()
    }
}

#[async_trait]
impl MembershipGate for TelegramClient {
    async fn member_status(&self, chat: &str, user_id: i64) -> Result<MemberStatus> {
        let member: ApiChatMember = self
            .call("getChatMember", json!({ "chat_id": chat, "user_id": user_id }))
            .await?;

        // Statuses the API grows later must not qualify by accident.
        Ok(MemberStatus::parse(&member.status).unwrap_or(MemberStatus::Restricted))
    }
}
