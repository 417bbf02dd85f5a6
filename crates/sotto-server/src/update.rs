//! Inbound update wire types and dispatch into the engine. Dispatch is
//! per-update isolated: a failed update is logged and dropped, it never
//! takes the process down.

use serde::Deserialize;
use tracing::error;

use sotto_core::Engine;
use sotto_types::{MediaAttachment, MediaKind};

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub photo: Option<Vec<PhotoSize>>,
    pub video: Option<FileRef>,
    pub animation: Option<FileRef>,
    pub sticker: Option<FileRef>,
    pub document: Option<FileRef>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
pub struct FileRef {
    pub file_id: String,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub data: Option<String>,
    pub message: Option<Message>,
}

/// The attachment carried by a message, if any. Photos arrive as a size
/// ladder; the last entry is the largest rendition.
pub fn extract_media(msg: &Message) -> Option<MediaAttachment> {
    let attach = |kind: MediaKind, file_id: &str| MediaAttachment {
        kind,
        file_id: file_id.to_string(),
    };

    if let Some(best) = msg.photo.as_ref().and_then(|sizes| sizes.last()) {
        return Some(attach(MediaKind::Photo, &best.file_id));
    }
    if let Some(video) = &msg.video {
        return Some(attach(MediaKind::Video, &video.file_id));
    }
    if let Some(animation) = &msg.animation {
        return Some(attach(MediaKind::Animation, &animation.file_id));
    }
    if let Some(sticker) = &msg.sticker {
        return Some(attach(MediaKind::Sticker, &sticker.file_id));
    }
    if let Some(document) = &msg.document {
        return Some(attach(MediaKind::Document, &document.file_id));
    }
    None
}

pub async fn dispatch(engine: &Engine, update: Update) {
    if let Some(msg) = update.message {
        // Authoring happens in private chats only.
        if msg.chat.kind != "private" {
            return;
        }
        let Some(from) = &msg.from else { return };

        let media = extract_media(&msg);
        if let Err(e) = engine
            .handle_message(from.id, &msg.chat.id.to_string(), msg.text.as_deref(), media)
            .await
        {
            error!("Update {} (message) failed: {:#}", update.update_id, e);
        }
    } else if let Some(cb) = update.callback_query {
        let (Some(data), Some(msg)) = (cb.data, cb.message) else {
            return;
        };

        if let Err(e) = engine
            .handle_callback(cb.from.id, &msg.chat.id.to_string(), msg.message_id, &cb.id, &data)
            .await
        {
            error!("Update {} (callback) failed: {:#}", update.update_id, e);
        }
    }
}
