//! Configuration loading.
//!
//! Sources, later overriding earlier:
//! 1. Bundled defaults (include_str! from guild_mirror.toml)
//! 2. `~/.config/guild_mirror/guild_mirror.toml`
//! 3. `./guild_mirror.toml`
//! 4. `GUILD_MIRROR_*` environment variables, `__` between section and key

use std::path::{Path, PathBuf};

use config::{Config, ConfigBuilder, Environment, File, FileFormat, builder::DefaultState};
use mirror_error::{ConfigError, MirrorResult};
use mirror_reconcile::ReconcileOptions;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Bundled default configuration.
const DEFAULT_CONFIG: &str = include_str!("../../../guild_mirror.toml");

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "GUILD_MIRROR";

/// Environment variable holding the bot token.
pub const TOKEN_VAR: &str = "DISCORD_TOKEN";

/// Where snapshots are stored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StorageConfig {
    /// Root directory of the snapshot store
    pub root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data/snapshots"),
        }
    }
}

/// Chat bot settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BotConfig {
    /// Command prefix
    pub prefix: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            prefix: "!".to_string(),
        }
    }
}

/// Top-level guild mirror configuration.
///
/// # Example
///
/// ```no_run
/// use guild_mirror::MirrorConfig;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let config = MirrorConfig::load()?;
/// println!("Snapshots under {}", config.storage.root.display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct MirrorConfig {
    /// `[storage]` section
    #[serde(default)]
    pub storage: StorageConfig,
    /// `[reconcile]` section
    #[serde(default)]
    pub reconcile: ReconcileOptions,
    /// `[bot]` section
    #[serde(default)]
    pub bot: BotConfig,
}

impl MirrorConfig {
    /// Load configuration from every source.
    ///
    /// User config files are optional and silently skipped when absent.
    #[instrument]
    pub fn load() -> MirrorResult<Self> {
        debug!("Loading configuration with precedence: env > current dir > home dir > bundled defaults");

        let mut builder = Self::defaults();

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/guild_mirror/guild_mirror.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder
            .add_source(File::with_name("guild_mirror").required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        Self::finish(builder)
    }

    /// Load bundled defaults overlaid with one file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> MirrorResult<Self> {
        debug!("Loading configuration from file");
        Self::finish(Self::defaults().add_source(File::from(path.as_ref())))
    }

    /// Load bundled defaults overlaid with TOML text.
    pub fn from_toml_str(overrides: &str) -> MirrorResult<Self> {
        Self::finish(Self::defaults().add_source(File::from_str(overrides, FileFormat::Toml)))
    }

    /// Read the bot token from the environment.
    pub fn token() -> MirrorResult<String> {
        std::env::var(TOKEN_VAR)
            .map_err(|_| ConfigError::new(format!("{} is not set", TOKEN_VAR)).into())
    }

    fn defaults() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml))
    }

    fn finish(builder: ConfigBuilder<DefaultState>) -> MirrorResult<Self> {
        let config = builder
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build configuration: {}", e)))?
            .try_deserialize()
            .map_err(|e| ConfigError::new(format!("Failed to parse configuration: {}", e)))?;
        Ok(config)
    }
}
