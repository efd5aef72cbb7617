use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use songbird::{error::JoinError, input::Input, Call, Songbird};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, error, info};

use crate::{
    audio::player::TrackControl,
    error::{BotError, BotResult},
};

/// Abre conexiones de voz.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceGateway: Send + Sync {
    /// Se une al canal y espera a que la conexión esté lista.
    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> BotResult<Arc<dyn VoiceLink>>;
}

/// Una conexión de voz establecida.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoiceLink: Send + Sync {
    fn channel_id(&self) -> ChannelId;

    /// Reproduce `input` reemplazando cualquier otra pista de la conexión.
    async fn play(&self, input: Input, volume: f32) -> BotResult<Arc<dyn TrackControl>>;

    /// Cierra la conexión.
    async fn leave(&self) -> BotResult<()>;
}

/// Gateway respaldado por el manager de Songbird.
pub struct SongbirdGateway {
    manager: Arc<Songbird>,
}

impl SongbirdGateway {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl VoiceGateway for SongbirdGateway {
    async fn join(&self, guild_id: GuildId, channel_id: ChannelId) -> BotResult<Arc<dyn VoiceLink>> {
        match self.manager.join(guild_id, channel_id).await {
            Ok(call) => {
                info!("🔊 Conectado al canal de voz {} en guild {}", channel_id, guild_id);
                Ok(Arc::new(SongbirdLink {
                    manager: self.manager.clone(),
                    call,
                    guild_id,
                    channel_id,
                }))
            }
            Err(e) => {
                error!("Error al obtener handler de voz: {:?}", e);
                Err(BotError::ConnectionFailed(e.to_string()))
            }
        }
    }
}

pub struct SongbirdLink {
    manager: Arc<Songbird>,
    call: Arc<Mutex<Call>>,
    guild_id: GuildId,
    channel_id: ChannelId,
}

#[async_trait]
impl VoiceLink for SongbirdLink {
    fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    async fn play(&self, input: Input, volume: f32) -> BotResult<Arc<dyn TrackControl>> {
        let mut call = self.call.lock().await;
        let handle = call.play_only_input(input);

        if let Err(e) = handle.set_volume(volume) {
            debug!("No se pudo ajustar el volumen: {}", e);
        }

        Ok(Arc::new(handle))
    }

    async fn leave(&self) -> BotResult<()> {
        match self.manager.remove(self.guild_id).await {
            Ok(()) => {
                info!("👋 Desconectado del canal de voz en guild {}", self.guild_id);
                Ok(())
            }
            // Ya desconectado (por ejemplo, expulsado del canal).
            Err(JoinError::NoCall) => Ok(()),
            Err(e) => Err(BotError::internal(e)),
        }
    }
}
