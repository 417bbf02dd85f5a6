//! Presentation of a post and its discussion tree in a private chat. Each
//! comment gets a labeled header followed by its content carrying the
//! reaction keyboard.

use anyhow::Result;

use sotto_types::Post;
use sotto_types::keyboard::{ReplyMarkup, reaction_keyboard};

use crate::ports::ChannelPort;
use crate::tree::{self, CommentNode};

pub async fn send_post(channel: &dyn ChannelPort, chat: &str, post: &Post) -> Result<()> {
    match &post.media {
        Some(media) => {
            let caption = if media.kind.supports_caption() {
                post.content.as_deref()
            } else {
                None
            };
            channel.send_media(chat, None, media, caption, None).await?;
        }
        None => {
            let text = format!("🗣 Post:\n{}", post.content.as_deref().unwrap_or_default());
            channel.send_text(chat, None, &text, None).await?;
        }
    }
    Ok(())
}

pub async fn send_comment_tree(
    channel: &dyn ChannelPort,
    chat: &str,
    post_external_id: i64,
    forest: &[CommentNode],
) -> Result<()> {
    for (label, node) in tree::labeled(forest) {
        channel
            .send_text(chat, None, &format!("💭 Comment {label}:"), None)
            .await?;

        let markup = || {
            Some(ReplyMarkup::Inline(reaction_keyboard(
                post_external_id,
                node.comment.id,
                &node.tally,
            )))
        };

        if let Some(media) = &node.comment.media {
            channel.send_media(chat, None, media, None, markup()).await?;
        }
        if let Some(text) = node.comment.content.as_deref() {
            if !text.is_empty() {
                channel.send_text(chat, None, text, markup()).await?;
            }
        }
    }
    Ok(())
}
