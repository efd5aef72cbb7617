use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId};
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};

use super::{GuildSession, SessionStore};
use crate::{
    audio::{connection::VoiceGateway, player::ToggleOutcome},
    bot::events::{ErrorNotice, PlaybackWatch},
    error::{BotError, BotResult},
    sources::{self, PlaybackRequest, StreamResolver},
};

/// Respuesta visible de `/link`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlaybackReply: Send + Sync {
    /// Muestra el reproductor (embed y botones) antes de resolver el stream.
    async fn show_player(&self, request: &PlaybackRequest) -> BotResult<()>;

    /// Sustituye el reproductor mostrado por un aviso de fallo.
    async fn show_failure(&self, error: &BotError) -> BotResult<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackOutcome {
    Started { title: Option<String> },
    /// Otra reproducción empezó mientras esta se resolvía.
    Superseded,
    /// El stream no se pudo resolver; el usuario ya fue avisado.
    Failed,
}

/// Dueño del ciclo de vida de las sesiones de voz.
///
/// Es el único que modifica el [`SessionStore`]. `start` y `stop` toman el
/// candado de la guild, así que dos `start` simultáneos no pueden dejar una
/// conexión huérfana.
pub struct VoiceSessionManager {
    store: SessionStore<GuildSession>,
    gateway: Arc<dyn VoiceGateway>,
    connect_timeout: Duration,
    default_volume: f32,
}

impl VoiceSessionManager {
    pub fn new(gateway: Arc<dyn VoiceGateway>, connect_timeout: Duration, default_volume: f32) -> Self {
        Self {
            store: SessionStore::new(),
            gateway,
            connect_timeout,
            default_volume,
        }
    }

    pub fn session(&self, guild_id: GuildId) -> BotResult<GuildSession> {
        self.store.get(guild_id).ok_or(BotError::NoActiveSession)
    }

    pub fn has_session(&self, guild_id: GuildId) -> bool {
        self.store.contains(guild_id)
    }

    pub fn active_sessions(&self) -> usize {
        self.store.len()
    }

    /// Conecta el bot al canal de voz del miembro.
    ///
    /// Una sesión previa de la misma guild se cierra antes de conectar.
    pub async fn start(
        &self,
        guild_id: GuildId,
        member_channel: Option<ChannelId>,
    ) -> BotResult<GuildSession> {
        let channel_id = member_channel.ok_or(BotError::NotInVoiceChannel)?;

        let _guard = self.store.lock(guild_id).await;

        if let Some(previous) = self.store.remove(guild_id) {
            info!("♻️ Cerrando sesión previa en guild {}", guild_id);
            if let Err(e) = teardown(&previous).await {
                warn!("Error al cerrar la sesión previa en guild {}: {}", guild_id, e);
            }
        }

        let connection = match tokio::time::timeout(
            self.connect_timeout,
            self.gateway.join(guild_id, channel_id),
        )
        .await
        {
            Ok(Ok(connection)) => connection,
            Ok(Err(BotError::ConnectionFailed(reason))) => {
                return Err(BotError::ConnectionFailed(reason))
            }
            Ok(Err(other)) => return Err(BotError::ConnectionFailed(other.to_string())),
            Err(_) => {
                return Err(BotError::ConnectionFailed(format!(
                    "la conexión no estuvo lista en {}",
                    humantime::format_duration(self.connect_timeout)
                )))
            }
        };

        let session = GuildSession::new(connection);
        self.store.upsert(guild_id, session.clone());

        info!(
            "🎶 Sesión de voz abierta en guild {} (canal {}), {} activas",
            guild_id,
            channel_id,
            self.active_sessions()
        );
        Ok(session)
    }

    /// Detiene el reproductor, cierra la conexión y olvida la sesión.
    pub async fn stop(&self, guild_id: GuildId) -> BotResult<()> {
        let _guard = self.store.lock(guild_id).await;

        let session = self.store.remove(guild_id).ok_or(BotError::NoActiveSession)?;
        teardown(&session).await?;

        info!("🔴 Sesión de voz cerrada en guild {}", guild_id);
        Ok(())
    }

    /// Olvida la sesión tras una desconexión externa, sin tocar la conexión.
    ///
    /// `still_disconnected` se evalúa ya con el candado tomado: si para
    /// entonces el bot volvió a conectarse, la sesión se conserva.
    pub async fn forget_if<F>(&self, guild_id: GuildId, still_disconnected: F) -> Option<GuildSession>
    where
        F: FnOnce() -> bool,
    {
        let _guard = self.store.lock(guild_id).await;

        if !self.store.contains(guild_id) || !still_disconnected() {
            return None;
        }

        let session = self.store.remove(guild_id)?;
        if let Err(e) = session.player.stop() {
            warn!("Error al detener reproducción: {}", e);
        }

        info!("🔌 Sesión olvidada tras desconexión en guild {}", guild_id);
        Some(session)
    }

    /// Flujo completo de `/link`.
    ///
    /// Los errores de validación se devuelven antes de mostrar nada. Un fallo
    /// al resolver el stream se muestra editando la respuesta y devuelve
    /// [`PlaybackOutcome::Failed`].
    pub async fn link<R, P>(
        &self,
        guild_id: GuildId,
        url: Option<&str>,
        resolver: &R,
        reply: &P,
        notice: Option<ErrorNotice>,
    ) -> BotResult<PlaybackOutcome>
    where
        R: StreamResolver + ?Sized,
        P: PlaybackReply + ?Sized,
    {
        let session = self.session(guild_id)?;
        let request = PlaybackRequest::parse(url)?;

        reply.show_player(&request).await?;

        let generation = session.player.begin_playback();

        let stream = match sources::resolve_with_refresh(resolver, &request).await {
            Ok(stream) => stream,
            Err(e) => {
                error!("Error al obtener el stream de {}: {}", request.url(), e);
                reply
                    .show_failure(&BotError::StreamResolutionFailed(e.to_string()))
                    .await?;
                return Ok(PlaybackOutcome::Failed);
            }
        };

        if !session.player.is_current(generation) {
            return Ok(PlaybackOutcome::Superseded);
        }

        let track = session.connection.play(stream.input, self.default_volume).await?;
        track.watch(PlaybackWatch {
            guild_id,
            generation,
            player: Arc::downgrade(&session.player),
            notice,
        })?;

        if !session.player.install(generation, track) {
            return Ok(PlaybackOutcome::Superseded);
        }

        info!(
            "🎵 Reproduciendo {} en guild {}",
            stream.title.as_deref().unwrap_or(request.url()),
            guild_id
        );
        Ok(PlaybackOutcome::Started {
            title: stream.title,
        })
    }

    pub async fn toggle_play_pause(&self, guild_id: GuildId) -> BotResult<ToggleOutcome> {
        self.session(guild_id)?.player.toggle().await
    }

    /// Detiene solo la pista; la conexión y la sesión siguen vivas.
    pub fn stop_playback(&self, guild_id: GuildId) -> BotResult<()> {
        self.session(guild_id)?.player.stop()
    }
}

async fn teardown(session: &GuildSession) -> BotResult<()> {
    let stopped = session.player.stop();
    let left = session.connection.leave().await;
    stopped.and(left)
}
