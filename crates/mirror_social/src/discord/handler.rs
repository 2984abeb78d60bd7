//! Serenity event handler for the `mirror` command group.

use chrono::Utc;
use mirror_core::{Snapshot, capture};
use mirror_error::MirrorError;
use mirror_interface::GuildPlatform;
use mirror_reconcile::{ReconcileOptions, Reconciler};
use mirror_storage::{SnapshotStore, attachment_name};
use serenity::all::Ready;
use serenity::async_trait;
use serenity::builder::{CreateAttachment, CreateEmbed, CreateMessage};
use serenity::client::{Context, EventHandler};
use serenity::model::Colour;
use serenity::model::channel::Message;
use serenity::model::gateway::GatewayIntents;
use serenity::model::id::{ChannelId, GuildId};
use tracing::{debug, error, info, instrument, warn};

use super::confirmation::ReactionConfirmation;
use super::error::{DiscordError, DiscordErrorKind, DiscordResult};
use super::guild::SerenityGuild;
use crate::command::{
    HELP_TEXT, MISSING_ATTACHMENT, MirrorCommand, NOT_AUTHORIZED, NOT_JSON,
    is_snapshot_attachment,
};
use crate::report::{ReplyTone, Report};

/// Render a report as an embed.
pub(crate) fn embed(report: &Report) -> CreateEmbed {
    let colour = match report.tone() {
        ReplyTone::Info => Colour::BLURPLE,
        ReplyTone::Success => Colour::DARK_GREEN,
        ReplyTone::Warning => Colour::ORANGE,
    };
    CreateEmbed::new()
        .title(report.title())
        .description(report.body())
        .colour(colour)
}

/// Event handler answering `<prefix>mirror` commands.
pub struct MirrorHandler {
    prefix: String,
    store: SnapshotStore,
    reconciler: Reconciler,
}

impl MirrorHandler {
    /// Create a handler listening for `prefix`.
    pub fn new(prefix: impl Into<String>, store: SnapshotStore, options: ReconcileOptions) -> Self {
        Self {
            prefix: prefix.into(),
            store,
            reconciler: Reconciler::new(options),
        }
    }

    /// Required gateway intents for the bot.
    ///
    /// Message content is needed to read commands; reactions drive
    /// confirmation.
    pub fn intents() -> GatewayIntents {
        GatewayIntents::GUILDS
            | GatewayIntents::GUILD_MESSAGES
            | GatewayIntents::MESSAGE_CONTENT
            | GatewayIntents::GUILD_MESSAGE_REACTIONS
    }

    async fn say(ctx: &Context, channel_id: ChannelId, text: &str) -> DiscordResult<()> {
        channel_id.say(&ctx.http, text).await.map_err(|e| {
            DiscordError::new(DiscordErrorKind::MessageSendFailed(e.to_string()))
        })?;
        Ok(())
    }

    async fn send_report(ctx: &Context, channel_id: ChannelId, report: &Report) -> DiscordResult<()> {
        channel_id
            .send_message(&ctx.http, CreateMessage::new().embed(embed(report)))
            .await
            .map_err(|e| DiscordError::new(DiscordErrorKind::MessageSendFailed(e.to_string())))?;
        Ok(())
    }

    #[instrument(skip(self, ctx, msg), fields(guild_id = %guild_id, author = %msg.author.id))]
    async fn dispatch(
        &self,
        ctx: &Context,
        msg: &Message,
        guild_id: GuildId,
        command: MirrorCommand,
    ) -> DiscordResult<()> {
        let platform = SerenityGuild::new(ctx.http.clone(), guild_id);
        let state = platform.fetch_state().await?;

        let role_ids: Vec<u64> = msg
            .member
            .as_ref()
            .map(|member| member.roles.iter().map(|id| id.get()).collect())
            .unwrap_or_default();
        if !state.member_can_manage(msg.author.id.get(), &role_ids) {
            warn!("Invoker may not manage the guild");
            return Self::say(ctx, msg.channel_id, NOT_AUTHORIZED).await;
        }

        match command {
            MirrorCommand::Help => Self::say(ctx, msg.channel_id, HELP_TEXT).await,
            MirrorCommand::SnapshotPath => {
                let text = format!(
                    "Snapshots are written to: `{}/<guild_id>/YYYY-MM-DDTHH-MM-SS.json`",
                    self.store.root().display()
                );
                Self::say(ctx, msg.channel_id, &text).await
            }
            MirrorCommand::Snapshot => {
                let captured_at = Utc::now();
                let snapshot = capture(&state, captured_at);
                let stored = self.store.save(&snapshot, state.id, captured_at).await?;
                let bytes = snapshot.to_json().map_err(MirrorError::from)?;

                let attachment =
                    CreateAttachment::bytes(bytes, attachment_name(&state.name, stored.timestamp()));
                let content = format!(
                    "✅ Snapshot saved locally: `{}`\n{}\nJSON file attached below.",
                    stored.path().display(),
                    snapshot.summary()
                );
                msg.channel_id
                    .send_message(
                        &ctx.http,
                        CreateMessage::new().content(content).add_file(attachment),
                    )
                    .await
                    .map_err(|e| {
                        DiscordError::new(DiscordErrorKind::MessageSendFailed(e.to_string()))
                    })?;
                info!(path = %stored.path().display(), "Snapshot captured");
                Ok(())
            }
            MirrorCommand::UpdateFromJson => self.update_from_json(ctx, msg, &platform).await,
        }
    }

    async fn update_from_json(
        &self,
        ctx: &Context,
        msg: &Message,
        platform: &SerenityGuild,
    ) -> DiscordResult<()> {
        let Some(attachment) = msg.attachments.first() else {
            return Self::say(ctx, msg.channel_id, MISSING_ATTACHMENT).await;
        };
        if !is_snapshot_attachment(&attachment.filename) {
            return Self::say(ctx, msg.channel_id, NOT_JSON).await;
        }

        let bytes = attachment.download().await.map_err(|e| {
            DiscordError::new(DiscordErrorKind::AttachmentFailed(e.to_string()))
        })?;
        let snapshot = match Snapshot::from_json(&bytes) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                debug!(error = %e, "Rejected snapshot attachment");
                let text = format!("Could not parse JSON: `{}`", e.kind);
                return Self::say(ctx, msg.channel_id, &text).await;
            }
        };

        let gate = ReactionConfirmation::new(ctx.clone(), msg.channel_id, msg.author.id);
        let outcome = self.reconciler.run(&snapshot, platform, &gate).await?;
        info!(%outcome, "Update from JSON finished");
        Self::send_report(ctx, msg.channel_id, &Report::outcome(&outcome)).await
    }
}

#[async_trait]
impl EventHandler for MirrorHandler {
    /// Called when the bot connects to Discord.
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!(
            bot_user = %ready.user.name,
            bot_id = %ready.user.id,
            guilds = ready.guilds.len(),
            prefix = %self.prefix,
            "Bot connected to Discord"
        );
    }

    /// Called for every message the bot can see.
    async fn message(&self, ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }
        let Some(command) = MirrorCommand::parse(&self.prefix, &msg.content) else {
            return;
        };
        let Some(guild_id) = msg.guild_id else {
            debug!(%command, "Ignoring command outside a guild");
            return;
        };

        if let Err(e) = self.dispatch(&ctx, &msg, guild_id, command).await {
            error!(error = %e, %command, "Command failed");
            let text = format!("Command failed: {}", e.kind());
            if let Err(e) = Self::say(&ctx, msg.channel_id, &text).await {
                error!(error = %e, "Failed to report command failure");
            }
        }
    }
}
