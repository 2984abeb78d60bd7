//! Reaction-based confirmation in a Discord channel.

use async_trait::async_trait;
use mirror_interface::{ConfirmationGate, ConfirmationOutcome};
use serenity::builder::{CreateEmbed, CreateEmbedFooter, CreateMessage};
use serenity::client::Context;
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, UserId};
use tracing::{debug, instrument, warn};

use super::handler::embed;
use crate::report::{CANCEL_EMOJI, CONFIRM_EMOJI, PREVIEW_FOOTER, Report, reaction_answer};

/// Posts the preview as an embed and waits for the invoker's ✅ or ❌.
///
/// Reactions from anyone other than the invoker are ignored. The wait is
/// unbounded here; the reconciler wraps it in its confirmation timeout.
pub struct ReactionConfirmation {
    ctx: Context,
    channel_id: ChannelId,
    invoker: UserId,
}

impl ReactionConfirmation {
    /// Bind a gate to the invoking user and channel.
    pub fn new(ctx: Context, channel_id: ChannelId, invoker: UserId) -> Self {
        Self {
            ctx,
            channel_id,
            invoker,
        }
    }

    async fn post_preview(&self, preview: &str) -> serenity::Result<Message> {
        let embed: CreateEmbed =
            embed(&Report::preview(preview)).footer(CreateEmbedFooter::new(PREVIEW_FOOTER));
        let message = self
            .channel_id
            .send_message(&self.ctx.http, CreateMessage::new().embed(embed))
            .await?;

        for emoji in [CONFIRM_EMOJI, CANCEL_EMOJI] {
            if let Err(e) = message.react(&self.ctx.http, emoji).await {
                warn!(error = %e, %emoji, "Failed to add confirmation reaction");
            }
        }
        Ok(message)
    }
}

#[async_trait]
impl ConfirmationGate for ReactionConfirmation {
    #[instrument(skip(self, preview), fields(channel_id = %self.channel_id, invoker = %self.invoker))]
    async fn confirm(&self, preview: &str) -> ConfirmationOutcome {
        let message = match self.post_preview(preview).await {
            Ok(message) => message,
            Err(e) => {
                warn!(error = %e, "Could not post preview, treating as cancelled");
                return ConfirmationOutcome::Rejected;
            }
        };

        let reaction = message
            .await_reaction(&self.ctx)
            .author_id(self.invoker)
            .filter(|reaction| reaction_answer(&reaction.emoji.to_string()).is_some())
            .await;

        match reaction.and_then(|r| reaction_answer(&r.emoji.to_string())) {
            Some(true) => ConfirmationOutcome::Confirmed,
            Some(false) => ConfirmationOutcome::Rejected,
            None => {
                debug!("Reaction collector ended without an answer");
                ConfirmationOutcome::TimedOut
            }
        }
    }
}
