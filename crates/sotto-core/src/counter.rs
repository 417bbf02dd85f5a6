//! Comment-count synchronizer. After any root-comment mutation (and after
//! publish) the displayed counter button on the channel message is rebuilt
//! from a fresh count — there is no cached counter to drift.

use anyhow::Result;
use tracing::debug;

use sotto_db::Database;
use sotto_types::keyboard::comment_count_keyboard;

use crate::ports::ChannelPort;

/// Recount root comments for the post behind `post_external_id` and update
/// its deep-link button. A vanished post is a no-op (`Ok(None)`).
pub async fn refresh_comment_count(
    db: &Database,
    channel: &dyn ChannelPort,
    post_external_id: i64,
) -> Result<Option<i64>> {
    let Some(post) = db.post_by_external_id(post_external_id)? else {
        debug!("Counter refresh skipped, post {} is gone", post_external_id);
        return Ok(None);
    };

    let count = db.root_comment_count(post.id)?;
    let username = channel.bot_username().await?;

    channel
        .edit_reply_markup(
            &post.chat_ref,
            post.external_message_id,
            comment_count_keyboard(count, &username, post.external_message_id),
        )
        .await?;

    Ok(Some(count))
}
