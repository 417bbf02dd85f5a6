//! The per-user conversation state machine. Inbound events (messages,
//! button presses) come in through [`Engine::handle_message`] and
//! [`Engine::handle_callback`]; the engine mutates the user's session,
//! writes through `sotto-db` and speaks through the channel port. Input
//! with no matching transition is silently ignored.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use sotto_db::Database;
use sotto_types::keyboard::{ReplyMarkup, confirm_keyboard, main_menu, topic_keyboard};
use sotto_types::{CallbackAction, MediaAttachment, TopicSet, keyboard::reaction_keyboard};

use crate::counter;
use crate::ports::{ChannelPort, MembershipGate};
use crate::reactions;
use crate::render;
use crate::session::{DraftBody, SessionMap, SessionSlot, Step};
use crate::tally;
use crate::tree;

const CANCEL_SENTINELS: [&str; 3] = ["/cancel", "🚫 Cancel", "❌ Cancel"];
const CAPTION_SKIP_SENTINEL: &str = "Skip";

pub struct EngineConfig {
    /// Chat ref of the shared channel posts are published into.
    pub channel_chat: String,
    pub topics: TopicSet,
}

pub struct Engine {
    db: Arc<Database>,
    channel: Arc<dyn ChannelPort>,
    gate: Arc<dyn MembershipGate>,
    sessions: SessionMap,
    config: EngineConfig,
}

impl Engine {
    pub fn new(
        db: Arc<Database>,
        channel: Arc<dyn ChannelPort>,
        gate: Arc<dyn MembershipGate>,
        config: EngineConfig,
    ) -> Self {
        Self { db, channel, gate, sessions: SessionMap::new(), config }
    }

    /// Live session map, exposed for the expiry sweep.
    pub fn sessions(&self) -> &SessionMap {
        &self.sessions
    }

    /// A message from the user's private chat. `chat` is where replies go.
    pub async fn handle_message(
        &self,
        user_id: i64,
        chat: &str,
        text: Option<&str>,
        media: Option<MediaAttachment>,
    ) -> Result<()> {
        let text = text.map(str::trim).filter(|t| !t.is_empty());

        // The slot mutex is held for the whole event: one user's
        // transitions never interleave.
        let slot = self.sessions.slot(user_id).await;
        let mut session = slot.lock().await;
        session.touch();

        if let Some(t) = text {
            if CANCEL_SENTINELS.contains(&t) {
                session.clear();
                return self
                    .say(chat, "Cancelled.", Some(ReplyMarkup::Reply(main_menu())))
                    .await;
            }
            if t == "/start" {
                return self
                    .say(
                        chat,
                        "Welcome! Choose an action.",
                        Some(ReplyMarkup::Reply(main_menu())),
                    )
                    .await;
            }
            if let Some(arg) = t.strip_prefix("/start comment_") {
                // Malformed deep-link payloads are ignored.
                let Ok(post_external_id) = arg.parse::<i64>() else {
                    debug!("Ignoring malformed deep link: {}", t);
                    return Ok(());
                };
                return self.open_comments(&mut session, chat, post_external_id).await;
            }
            if t == "/help" || t == "ℹ️ Help" {
                return self
                    .say(chat, "Use 📝 Post in private chat to publish anonymously.", None)
                    .await;
            }
            if t == "/post" || t == "📝 Post" {
                session.step = Some(Step::Typing);
                return self
                    .say(chat, "Send text or media for your anonymous post.", None)
                    .await;
            }
        }

        match session.step.clone() {
            Some(Step::Typing) => self.on_typing(&mut session, chat, text, media).await,
            Some(Step::Captioning { attachment }) => {
                self.on_captioning(&mut session, chat, attachment, text).await
            }
            Some(Step::ChoosingTopic { body }) => {
                self.on_choosing_topic(&mut session, chat, body, text).await
            }
            Some(Step::Confirming { body, topic }) => {
                self.on_confirming(&mut session, chat, user_id, body, topic, text).await
            }
            Some(Step::Commenting { post_external_id }) => {
                self.on_commenting(&mut session, chat, post_external_id, text, media).await
            }
            Some(Step::Replying { post_external_id, parent_comment_id }) => {
                self.on_replying(&mut session, chat, post_external_id, parent_comment_id, text, media)
                    .await
            }
            None => Ok(()),
        }
    }

    /// A button press. `chat`/`message_id` locate the pressed keyboard.
    pub async fn handle_callback(
        &self,
        user_id: i64,
        chat: &str,
        message_id: i64,
        callback_id: &str,
        data: &str,
    ) -> Result<()> {
        let Ok(action) = CallbackAction::from_str(data) else {
            debug!("Ignoring malformed callback payload: {}", data);
            return Ok(());
        };

        match action {
            CallbackAction::Reply { post_external_id, comment_id } => {
                let slot = self.sessions.slot(user_id).await;
                let mut session = slot.lock().await;
                session.touch();
                session.step = Some(Step::Replying {
                    post_external_id,
                    parent_comment_id: comment_id,
                });
                drop(session);

                self.channel.answer_callback(callback_id, None).await?;
                self.say(chat, "Write your reply now, or /cancel.", None).await
            }
            CallbackAction::React { kind, post_external_id, comment_id } => {
                // The comment can vanish between render and button press.
                if !self.db.comment_exists(comment_id)? {
                    return self
                        .channel
                        .answer_callback(callback_id, Some("⚠️ Comment not found."))
                        .await;
                }

                let (outcome, tally) = reactions::toggle(&self.db, comment_id, user_id, kind)?;

                self.channel
                    .answer_callback(callback_id, Some(&outcome.describe(kind)))
                    .await?;
                self.channel
                    .edit_reply_markup(
                        chat,
                        message_id,
                        reaction_keyboard(post_external_id, comment_id, &tally),
                    )
                    .await
            }
        }
    }

    // -- Authoring steps --

    async fn on_typing(
        &self,
        session: &mut SessionSlot,
        chat: &str,
        text: Option<&str>,
        media: Option<MediaAttachment>,
    ) -> Result<()> {
        match (media, text) {
            (Some(attachment), _) if attachment.kind.supports_caption() => {
                session.step = Some(Step::Captioning { attachment });
                self.say(chat, "Send caption now, or type Skip.", None).await
            }
            (Some(attachment), _) => {
                // Caption-less kinds go straight to topic selection.
                session.step = Some(Step::ChoosingTopic {
                    body: DraftBody::Media { attachment, caption: None },
                });
                self.prompt_topics(chat).await
            }
            (None, Some(t)) => {
                session.step = Some(Step::ChoosingTopic { body: DraftBody::Text(t.to_string()) });
                self.prompt_topics(chat).await
            }
            (None, None) => Ok(()),
        }
    }

    async fn on_captioning(
        &self,
        session: &mut SessionSlot,
        chat: &str,
        attachment: MediaAttachment,
        text: Option<&str>,
    ) -> Result<()> {
        let Some(t) = text else { return Ok(()) };

        let caption = (t != CAPTION_SKIP_SENTINEL).then(|| t.to_string());
        session.step = Some(Step::ChoosingTopic {
            body: DraftBody::Media { attachment, caption },
        });
        self.prompt_topics(chat).await
    }

    async fn on_choosing_topic(
        &self,
        session: &mut SessionSlot,
        chat: &str,
        body: DraftBody,
        text: Option<&str>,
    ) -> Result<()> {
        // Unrecognized labels cause no transition.
        let Some(topic) = text.and_then(|t| self.config.topics.by_label(t)) else {
            return Ok(());
        };

        let preview = match &body {
            DraftBody::Text(t) => format!("🕵️ Preview:\n\n{t}"),
            DraftBody::Media { .. } => format!("Preview ready. Topic: {}", topic.label),
        };
        session.step = Some(Step::Confirming { body, topic: topic.clone() });

        self.say(chat, &preview, None).await?;
        self.say(chat, "Submit?", Some(ReplyMarkup::Reply(confirm_keyboard()))).await
    }

    async fn on_confirming(
        &self,
        session: &mut SessionSlot,
        chat: &str,
        user_id: i64,
        body: DraftBody,
        topic: sotto_types::Topic,
        text: Option<&str>,
    ) -> Result<()> {
        match text {
            Some("✏️ Edit") => {
                // Discards the whole draft, not just the topic.
                session.step = Some(Step::Typing);
                self.say(chat, "Send new content.", None).await
            }
            Some("✅ Submit") => self.submit(session, chat, user_id, body, topic).await,
            _ => Ok(()),
        }
    }

    async fn submit(
        &self,
        session: &mut SessionSlot,
        chat: &str,
        user_id: i64,
        body: DraftBody,
        topic: sotto_types::Topic,
    ) -> Result<()> {
        let status = self
            .gate
            .member_status(&self.config.channel_chat, user_id)
            .await?;
        if !status.can_post() {
            // Session stays in Confirming so the user can retry.
            return self.say(chat, "🚫 You must be a group member.", None).await;
        }

        let sent = match &body {
            DraftBody::Media { attachment, caption } => {
                let caption = attachment
                    .kind
                    .supports_caption()
                    .then(|| caption.as_deref())
                    .flatten();
                self.channel
                    .send_media(
                        &self.config.channel_chat,
                        Some(topic.thread_id),
                        attachment,
                        caption,
                        None,
                    )
                    .await?
            }
            DraftBody::Text(t) => {
                self.channel
                    .send_text(&self.config.channel_chat, Some(topic.thread_id), t, None)
                    .await?
            }
        };

        self.db.insert_post(
            sent.message_id,
            &self.config.channel_chat,
            body.stored_content(),
            body.media(),
            Some(topic.thread_id),
        )?;
        info!("Published post {} to topic {}", sent.message_id, topic.thread_id);

        // Attach the 0-comment deep-link button. No rollback if this fails;
        // the counter self-heals on the next comment mutation.
        counter::refresh_comment_count(&self.db, self.channel.as_ref(), sent.message_id).await?;

        session.clear();
        self.say(chat, "✅ Posted successfully.", Some(ReplyMarkup::Reply(main_menu())))
            .await
    }

    // -- Commenting --

    async fn open_comments(
        &self,
        session: &mut SessionSlot,
        chat: &str,
        post_external_id: i64,
    ) -> Result<()> {
        let Some(post) = self.db.post_by_external_id(post_external_id)? else {
            return self.say(chat, "⚠️ Post not found.", None).await;
        };

        render::send_post(self.channel.as_ref(), chat, &post).await?;

        let comments = self.db.comments_for_post(post.id)?;
        if comments.is_empty() {
            self.say(chat, "No comments yet. Be the first one.", None).await?;
        } else {
            let ids: Vec<i64> = comments.iter().map(|c| c.id).collect();
            let rows = self.db.reactions_for_comments(&ids)?;
            let tallies = tally::tally_by_comment(&rows);
            let forest = tree::build_forest(comments, &tallies);
            render::send_comment_tree(self.channel.as_ref(), chat, post_external_id, &forest)
                .await?;
        }

        session.step = Some(Step::Commenting { post_external_id });
        self.say(chat, "💬 Write your comment, or /cancel.", None).await
    }

    async fn on_commenting(
        &self,
        session: &mut SessionSlot,
        chat: &str,
        post_external_id: i64,
        text: Option<&str>,
        media: Option<MediaAttachment>,
    ) -> Result<()> {
        if text.is_none() && media.is_none() {
            return Ok(());
        }

        let Some(post) = self.db.post_by_external_id(post_external_id)? else {
            session.clear();
            return self.say(chat, "⚠️ Post not found.", None).await;
        };

        let content = if media.is_some() { None } else { text };
        self.db.insert_comment(post.id, None, content, media.as_ref())?;

        counter::refresh_comment_count(&self.db, self.channel.as_ref(), post_external_id).await?;

        session.clear();
        self.say(chat, "✅ Comment sent.", None).await
    }

    async fn on_replying(
        &self,
        session: &mut SessionSlot,
        chat: &str,
        post_external_id: i64,
        parent_comment_id: i64,
        text: Option<&str>,
        media: Option<MediaAttachment>,
    ) -> Result<()> {
        if text.is_none() && media.is_none() {
            return Ok(());
        }

        let Some(post) = self.db.post_by_external_id(post_external_id)? else {
            session.clear();
            return self.say(chat, "⚠️ Post not found.", None).await;
        };

        let content = if media.is_some() { None } else { text };
        self.db
            .insert_comment(post.id, Some(parent_comment_id), content, media.as_ref())?;

        // Replies never touch the root-comment counter.
        session.clear();
        self.say(chat, "✅ Reply sent.", None).await
    }

    // -- Helpers --

    async fn prompt_topics(&self, chat: &str) -> Result<()> {
        self.say(
            chat,
            "Select topic:",
            Some(ReplyMarkup::Reply(topic_keyboard(&self.config.topics))),
        )
        .await
    }

    async fn say(&self, chat: &str, text: &str, markup: Option<ReplyMarkup>) -> Result<()> {
        self.channel.send_text(chat, None, text, markup).await?;
        Ok(())
    }
}
