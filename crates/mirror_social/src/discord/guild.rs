//! [`GuildPlatform`] over the Discord HTTP API.

use std::sync::Arc;

use async_trait::async_trait;
use mirror_core::{GuildState, LiveChannel, LiveRole, NativeOverwrite};
use mirror_error::{PlatformError, PlatformErrorKind, PlatformResult};
use mirror_interface::{ChannelEdit, ChannelSpec, GuildPlatform, RoleEdit, RoleSpec};
use serenity::builder::{CreateChannel, EditChannel, EditRole};
use serenity::http::{Http, LightMethod, Request, Route};
use serenity::model::id::{ChannelId, GuildId, RoleId};
use serenity::model::permissions::Permissions;
use tracing::{debug, error, info, instrument};

use super::conversions::{
    channel_type, live_channel, live_role, position, role_positions_body, serenity_overwrite,
};
use super::error::platform_error;

/// Reason recorded in the guild's audit log for every change.
pub const AUDIT_LOG_REASON: &str = "guild mirror: reconcile from snapshot";

/// One Discord guild reached through a bot's HTTP client.
#[derive(Clone)]
pub struct SerenityGuild {
    http: Arc<Http>,
    guild_id: GuildId,
}

impl SerenityGuild {
    /// Target `guild_id` with an existing HTTP client.
    ///
    /// Share the bot's client so rate limits are coordinated.
    pub fn new(http: Arc<Http>, guild_id: GuildId) -> Self {
        Self { http, guild_id }
    }

    /// Target `guild_id` with a standalone client for `token`.
    #[instrument(skip(token), fields(token_len = token.as_ref().len()))]
    pub fn with_token(token: impl AsRef<str>, guild_id: u64) -> Self {
        info!(guild_id, "Creating standalone Discord guild client");
        Self {
            http: Arc::new(Http::new(token.as_ref())),
            guild_id: GuildId::new(guild_id),
        }
    }
}

impl std::fmt::Debug for SerenityGuild {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerenityGuild")
            .field("guild_id", &self.guild_id)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl GuildPlatform for SerenityGuild {
    fn guild_id(&self) -> u64 {
        self.guild_id.get()
    }

    #[instrument(skip(self), fields(guild_id = %self.guild_id))]
    async fn fetch_state(&self) -> PlatformResult<GuildState> {
        let guild = self
            .guild_id
            .to_partial_guild(&self.http)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch guild");
                platform_error(e)
            })?;

        let channels = self.guild_id.channels(&self.http).await.map_err(|e| {
            error!(error = %e, "Failed to fetch channels");
            platform_error(e)
        })?;

        let mut state = GuildState {
            id: guild.id.get(),
            name: guild.name.clone(),
            owner_id: guild.owner_id.get(),
            roles: guild.roles.values().map(live_role).collect(),
            channels: channels.values().map(live_channel).collect(),
        };
        state.normalize();
        debug!(
            roles = state.roles.len(),
            channels = state.channels.len(),
            "Fetched guild state"
        );
        Ok(state)
    }

    #[instrument(skip(self, spec), fields(guild_id = %self.guild_id, role = %spec.name))]
    async fn create_role(&self, spec: &RoleSpec) -> PlatformResult<LiveRole> {
        let mut builder = EditRole::new()
            .name(spec.name.clone())
            .colour(spec.color)
            .hoist(spec.hoist)
            .mentionable(spec.mentionable)
            .audit_log_reason(AUDIT_LOG_REASON);
        if let Some(bits) = spec.permissions {
            builder = builder.permissions(Permissions::from_bits_truncate(bits));
        }

        let role = self
            .guild_id
            .create_role(&self.http, builder)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to create role");
                platform_error(e)
            })?;
        Ok(live_role(&role))
    }

    #[instrument(skip(self, edit), fields(guild_id = %self.guild_id))]
    async fn edit_role(&self, role_id: u64, edit: &RoleEdit) -> PlatformResult<LiveRole> {
        let mut builder = EditRole::new().audit_log_reason(AUDIT_LOG_REASON);
        if let Some(color) = edit.color {
            builder = builder.colour(color);
        }
        if let Some(hoist) = edit.hoist {
            builder = builder.hoist(hoist);
        }
        if let Some(mentionable) = edit.mentionable {
            builder = builder.mentionable(mentionable);
        }
        if let Some(bits) = edit.permissions {
            builder = builder.permissions(Permissions::from_bits_truncate(bits));
        }

        let role = self
            .guild_id
            .edit_role(&self.http, RoleId::new(role_id), builder)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to edit role");
                platform_error(e)
            })?;
        Ok(live_role(&role))
    }

    #[instrument(skip(self, positions), fields(guild_id = %self.guild_id, count = positions.len()))]
    async fn set_role_positions(&self, positions: &[(u64, u32)]) -> PlatformResult<()> {
        let body = serde_json::to_vec(&role_positions_body(positions))
            .map_err(|e| PlatformError::new(PlatformErrorKind::Api(e.to_string())))?;
        let request = Request::new(
            Route::GuildRoles {
                guild_id: self.guild_id,
            },
            LightMethod::Patch,
        )
        .body(Some(body));

        let _: serde_json::Value = self.http.fire(request).await.map_err(|e| {
            error!(error = %e, roles = positions.len(), "Failed to reposition roles");
            platform_error(e)
        })?;
        debug!(roles = positions.len(), "Repositioned roles");
        Ok(())
    }

    #[instrument(skip(self), fields(guild_id = %self.guild_id))]
    async fn delete_role(&self, role_id: u64) -> PlatformResult<()> {
        self.guild_id
            .delete_role(&self.http, RoleId::new(role_id))
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to delete role");
                platform_error(e)
            })
    }

    #[instrument(skip(self, spec), fields(guild_id = %self.guild_id, channel = %spec.name, kind = %spec.kind))]
    async fn create_channel(&self, spec: &ChannelSpec) -> PlatformResult<LiveChannel> {
        let mut builder = CreateChannel::new(spec.name.clone())
            .kind(channel_type(spec.kind))
            .audit_log_reason(AUDIT_LOG_REASON);
        if let Some(parent) = spec.parent_id {
            builder = builder.category(ChannelId::new(parent));
        }
        if let Some(rank) = spec.position {
            builder = builder.position(position(rank));
        }
        if let Some(topic) = &spec.topic {
            builder = builder.topic(topic.clone());
        }
        if let Some(nsfw) = spec.nsfw {
            builder = builder.nsfw(nsfw);
        }
        if let Some(delay) = spec.slowmode_delay {
            builder = builder.rate_limit_per_user(position(delay));
        }

        let channel = self
            .guild_id
            .create_channel(&self.http, builder)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to create channel");
                platform_error(e)
            })?;
        Ok(live_channel(&channel))
    }

    #[instrument(skip(self, edit), fields(guild_id = %self.guild_id))]
    async fn edit_channel(
        &self,
        channel_id: u64,
        edit: &ChannelEdit,
    ) -> PlatformResult<LiveChannel> {
        let mut builder = EditChannel::new().audit_log_reason(AUDIT_LOG_REASON);
        if let Some(rank) = edit.position {
            builder = builder.position(position(rank));
        }
        if let Some(parent) = edit.parent_id {
            builder = builder.category(parent.map(ChannelId::new));
        }
        if let Some(topic) = &edit.topic {
            builder = builder.topic(topic.clone());
        }
        if let Some(nsfw) = edit.nsfw {
            builder = builder.nsfw(nsfw);
        }
        if let Some(delay) = edit.slowmode_delay {
            builder = builder.rate_limit_per_user(position(delay));
        }

        let channel = ChannelId::new(channel_id)
            .edit(&self.http, builder)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to edit channel");
                platform_error(e)
            })?;
        Ok(live_channel(&channel))
    }

    #[instrument(skip(self, overwrites), fields(guild_id = %self.guild_id, count = overwrites.len()))]
    async fn set_overwrites(
        &self,
        channel_id: u64,
        overwrites: &[NativeOverwrite],
    ) -> PlatformResult<()> {
        let builder = EditChannel::new()
            .permissions(overwrites.iter().map(serenity_overwrite))
            .audit_log_reason(AUDIT_LOG_REASON);

        ChannelId::new(channel_id)
            .edit(&self.http, builder)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to replace overwrites");
                platform_error(e)
            })?;
        Ok(())
    }
}
