use anyhow::{Context, Result};
use std::time::Duration;

const DEFAULT_THUMBNAIL: &str = "https://cdn-icons-png.flaticon.com/512/3659/3659899.png";

#[derive(Debug, Clone)]
pub struct Config {
    // Discord
    pub discord_token: String,
    pub guild_id: Option<u64>, // Para comandos de desarrollo

    // Voz
    pub voice_connect_timeout: Duration,
    pub default_volume: f32,

    // Presentación
    pub player_thumbnail_url: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            // Discord
            discord_token: std::env::var("DISCORD_TOKEN").context("DISCORD_TOKEN no definido")?,
            guild_id: std::env::var("GUILD_ID").ok().and_then(|s| s.parse().ok()),

            // Voz
            voice_connect_timeout: parse_timeout(
                std::env::var("VOICE_CONNECT_TIMEOUT").ok().as_deref(),
                defaults.voice_connect_timeout,
            )?,
            default_volume: std::env::var("DEFAULT_VOLUME")
                .unwrap_or_else(|_| "1.0".to_string())
                .parse()
                .context("DEFAULT_VOLUME inválido")?,

            // Presentación
            player_thumbnail_url: std::env::var("PLAYER_THUMBNAIL_URL")
                .unwrap_or(defaults.player_thumbnail_url),
        };

        config.validate()?;

        Ok(config)
    }

    /// Validates configuration values for correctness.
    ///
    /// # Validation Rules
    ///
    /// - Token must not be blank
    /// - Volume must be between 0.0 and 2.0
    /// - Voice connect timeout must be greater than zero
    pub fn validate(&self) -> Result<()> {
        if self.discord_token.trim().is_empty() {
            anyhow::bail!("DISCORD_TOKEN está vacío");
        }

        if !(0.0..=2.0).contains(&self.default_volume) {
            anyhow::bail!(
                "Default volume must be between 0.0 and 2.0, got: {}",
                self.default_volume
            );
        }

        if self.voice_connect_timeout.is_zero() {
            anyhow::bail!("Voice connect timeout must be greater than 0");
        }

        Ok(())
    }

    /// Returns a summary of the current configuration for logging.
    ///
    /// The token is never included.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Discord: comandos {}\n  \
            Voz: timeout {}, {}% vol",
            self.guild_id
                .map_or("globales".to_string(), |id| format!("en guild {}", id)),
            humantime::format_duration(self.voice_connect_timeout),
            (self.default_volume * 100.0) as u32,
        )
    }
}

/// Duración humantime ("30s", "1m 30s"); vacío o ausente usa `default`.
fn parse_timeout(raw: Option<&str>, default: Duration) -> Result<Duration> {
    match raw.map(str::trim) {
        Some(val) if !val.is_empty() => humantime::parse_duration(val)
            .with_context(|| format!("VOICE_CONNECT_TIMEOUT inválido: {}", val)),
        _ => Ok(default),
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Discord (sin valor por defecto - debe proporcionarse)
            discord_token: String::new(),
            guild_id: None,

            voice_connect_timeout: Duration::from_secs(30),
            default_volume: 1.0,

            player_thumbnail_url: DEFAULT_THUMBNAIL.to_string(),
        }
    }
}
