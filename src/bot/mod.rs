//! # Bot Module
//!
//! Discord event handling for the stream link bot.
//!
//! - Command registration on `ready`
//! - Interaction dispatch: slash commands and player buttons
//! - Session cleanup when the bot is disconnected from voice
//!
//! ## Error Handling
//!
//! Handler errors never reach serenity. [`StreamLinkBot::interaction_create`]
//! logs the full error and answers the user with a short ephemeral message.

use anyhow::Result;
use serenity::{
    all::{Context, EventHandler, GuildId, Interaction, Ready, VoiceState},
    async_trait,
};
use std::sync::Arc;
use tracing::{error, info, warn};

pub mod commands;
pub mod events;
pub mod handlers;

use crate::{config::Config, session::VoiceSessionManager, sources::StreamResolver};

/// Main Discord bot handler.
///
/// ## Fields
///
/// - `config`: Bot configuration
/// - `sessions`: Voice sessions per guild
/// - `resolver`: Turns `/link` URLs into playable streams
pub struct StreamLinkBot {
    config: Arc<Config>,
    pub sessions: Arc<VoiceSessionManager>,
    pub resolver: Arc<dyn StreamResolver>,
}

impl StreamLinkBot {
    pub fn new(
        config: Config,
        sessions: Arc<VoiceSessionManager>,
        resolver: Arc<dyn StreamResolver>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            sessions,
            resolver,
        }
    }

    /// Registers slash commands with Discord.
    ///
    /// Commands go to the guild named by `GUILD_ID` when set (propagation in
    /// seconds), otherwise they are registered globally.
    async fn register_commands(&self, ctx: &Context) -> Result<()> {
        info!("📝 Registrando comandos slash...");

        match self.config.guild_id {
            Some(guild_id) => {
                let guild_id = GuildId::new(guild_id);
                info!("🏠 Registrando comandos para guild específica: {}", guild_id);

                if !ctx.cache.guilds().contains(&guild_id) {
                    warn!("⚠️ El bot no está en la guild especificada: {}", guild_id);
                    return Ok(());
                }

                commands::register_guild_commands(ctx, guild_id).await?;
                info!("✅ Comandos de guild registrados para: {}", guild_id);
            }
            None => {
                info!("🌐 Registrando comandos globalmente");
                commands::register_global_commands(ctx).await?;
                info!("✅ Comandos globales registrados");
            }
        }

        Ok(())
    }
}

#[async_trait]
impl EventHandler for StreamLinkBot {
    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("✅ Bot conectado como {}", ready.user.tag());
        info!("🆔 ID: {}", ready.user.id);
        info!("👂 Servidores: {}", ready.guilds.len());

        if let Err(e) = self.register_commands(&ctx).await {
            error!("Error al registrar comandos: {:?}", e);
        }
    }

    async fn interaction_create(&self, ctx: Context, interaction: Interaction) {
        match interaction {
            Interaction::Command(command) => {
                if let Err(e) = handlers::handle_command(&ctx, &command, self).await {
                    error!("Error al procesar comando /{}: {}", command.data.name, e);
                    handlers::report_command_error(&ctx, &command, &e).await;
                }
            }
            Interaction::Component(component) => {
                if let Err(e) = handlers::handle_component(&ctx, &component, self).await {
                    error!("Error al manejar botón {}: {}", component.data.custom_id, e);
                    handlers::report_component_error(&ctx, &component, &e).await;
                }
            }
            _ => {}
        }
    }

    /// Forgets the guild's session when the bot is disconnected from voice by
    /// someone else (kicked, channel deleted).
    async fn voice_state_update(&self, ctx: Context, old: Option<VoiceState>, new: VoiceState) {
        let current_user_id = ctx.cache.current_user().id;
        if new.user_id != current_user_id || old.is_none() || new.channel_id.is_some() {
            return;
        }

        let Some(guild_id) = new.guild_id else {
            return;
        };
        if !self.sessions.has_session(guild_id) {
            return;
        }

        let still_disconnected = || {
            ctx.cache.guild(guild_id).map_or(true, |guild| {
                guild
                    .voice_states
                    .get(&current_user_id)
                    .and_then(|state| state.channel_id)
                    .is_none()
            })
        };

        if self.sessions.forget_if(guild_id, still_disconnected).await.is_some() {
            info!("🔌 Bot desconectado en guild {}", guild_id);
        }
    }
}
