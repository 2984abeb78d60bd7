//! Discord bot client setup and lifecycle management.

use serenity::Client;
use tracing::info;

use super::error::{DiscordError, DiscordErrorKind, DiscordResult};
use super::handler::MirrorHandler;

/// The guild mirror Discord bot.
///
/// # Example
/// ```no_run
/// use mirror_reconcile::ReconcileOptions;
/// use mirror_social::{MirrorBot, MirrorHandler};
/// use mirror_storage::SnapshotStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let token = std::env::var("DISCORD_TOKEN")?;
///     let store = SnapshotStore::new("./data/snapshots")?;
///     let handler = MirrorHandler::new("!", store, ReconcileOptions::default());
///
///     let mut bot = MirrorBot::new(token, handler).await?;
///     bot.start().await?;
///     Ok(())
/// }
/// ```
pub struct MirrorBot {
    client: Client,
}

impl MirrorBot {
    /// Build the serenity client around `handler`.
    ///
    /// # Errors
    /// Returns an error if the Serenity client fails to initialize.
    pub async fn new(token: impl AsRef<str>, handler: MirrorHandler) -> DiscordResult<Self> {
        info!("Initializing guild mirror Discord bot");

        let intents = MirrorHandler::intents();
        info!("Building Serenity client with intents: {:?}", intents);

        let client = Client::builder(token.as_ref(), intents)
            .event_handler(handler)
            .await
            .map_err(|e| {
                DiscordError::new(DiscordErrorKind::ConnectionFailed(format!(
                    "Failed to build client: {}",
                    e
                )))
            })?;

        info!("Serenity client built successfully");
        Ok(Self { client })
    }

    /// Connect and serve events until the client shuts down.
    ///
    /// # Errors
    /// Returns an error if the client fails to start or encounters a fatal error.
    pub async fn start(&mut self) -> DiscordResult<()> {
        info!("Starting Discord bot");

        self.client.start().await.map_err(|e| {
            DiscordError::new(DiscordErrorKind::ConnectionFailed(format!(
                "Client error: {}",
                e
            )))
        })
    }
}
