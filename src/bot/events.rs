use serenity::{
    async_trait,
    http::Http,
    model::id::{ChannelId, GuildId},
};
use songbird::{
    tracks::TrackHandle, Event as VoiceEvent, EventContext, EventHandler as VoiceEventHandler,
    TrackEvent,
};
use std::sync::{Arc, Weak};
use tracing::{debug, error, info};

use crate::{
    audio::player::GuildPlayer,
    error::{BotError, BotResult},
};

const PLAYBACK_ERROR_MESSAGE: &str = "❌ Error al reproducir el audio.";

/// Canal de texto donde avisar de errores del reproductor.
#[derive(Clone)]
pub struct ErrorNotice {
    pub http: Arc<Http>,
    pub channel_id: ChannelId,
}

/// Identifica una reproducción concreta de un reproductor.
///
/// Los listeners que la llevan se cancelan en cuanto el reproductor pasa a
/// otra generación o deja de existir.
#[derive(Clone)]
pub struct PlaybackWatch {
    pub guild_id: GuildId,
    pub generation: u64,
    pub player: Weak<GuildPlayer>,
    pub notice: Option<ErrorNotice>,
}

impl PlaybackWatch {
    pub fn is_current(&self) -> bool {
        self.player
            .upgrade()
            .is_some_and(|player| player.is_current(self.generation))
    }
}

/// Handler para cuando la pista empieza a sonar (solo log)
pub struct NowPlayingLogger {
    pub watch: PlaybackWatch,
}

#[async_trait]
impl VoiceEventHandler for NowPlayingLogger {
    async fn act(&self, _ctx: &EventContext<'_>) -> Option<VoiceEvent> {
        if !self.watch.is_current() {
            debug!(
                "Listener de reproducción {} retirado en guild {}",
                self.watch.generation, self.watch.guild_id
            );
            return Some(VoiceEvent::Cancel);
        }

        info!("▶️ Reproduciendo audio en guild {}", self.watch.guild_id);
        None
    }
}

/// Handler para errores del reproductor
pub struct PlaybackErrorNotifier {
    pub watch: PlaybackWatch,
}

#[async_trait]
impl VoiceEventHandler for PlaybackErrorNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<VoiceEvent> {
        if !self.watch.is_current() {
            return Some(VoiceEvent::Cancel);
        }

        if let EventContext::Track(track_list) = ctx {
            for (state, _handle) in *track_list {
                error!(
                    "❌ Error en el reproductor para guild {}: {:?}",
                    self.watch.guild_id, state.playing
                );
            }
        }

        if let Some(notice) = &self.watch.notice {
            if let Err(e) = notice.channel_id.say(&notice.http, PLAYBACK_ERROR_MESSAGE).await {
                error!("Error al enviar aviso de reproducción: {:?}", e);
            }
        }

        None
    }
}

/// Registra los listeners de una reproducción sobre su pista
pub fn attach_playback_listeners(handle: &TrackHandle, watch: PlaybackWatch) -> BotResult<()> {
    handle
        .add_event(
            VoiceEvent::Track(TrackEvent::Play),
            NowPlayingLogger {
                watch: watch.clone(),
            },
        )
        .map_err(|e| BotError::internal(format!("Error al agregar event handler: {}", e)))?;

    handle
        .add_event(
            VoiceEvent::Track(TrackEvent::Error),
            PlaybackErrorNotifier { watch },
        )
        .map_err(|e| BotError::internal(format!("Error al agregar event handler: {}", e)))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn watch_for(player: &Arc<GuildPlayer>, generation: u64) -> PlaybackWatch {
        PlaybackWatch {
            guild_id: GuildId::new(1),
            generation,
            player: Arc::downgrade(player),
            notice: None,
        }
    }

    #[tokio::test]
    async fn current_listener_stays_registered() {
        let player = Arc::new(GuildPlayer::new());
        let generation = player.begin_playback();

        let logger = NowPlayingLogger {
            watch: watch_for(&player, generation),
        };
        assert!(logger.act(&EventContext::Track(&[])).await.is_none());

        let notifier = PlaybackErrorNotifier {
            watch: watch_for(&player, generation),
        };
        assert!(notifier.act(&EventContext::Track(&[])).await.is_none());
    }

    #[tokio::test]
    async fn stale_listeners_cancel_themselves() {
        let player = Arc::new(GuildPlayer::new());
        let old = player.begin_playback();
        player.begin_playback();

        let logger = NowPlayingLogger {
            watch: watch_for(&player, old),
        };
        assert!(matches!(
            logger.act(&EventContext::Track(&[])).await,
            Some(VoiceEvent::Cancel)
        ));

        let notifier = PlaybackErrorNotifier {
            watch: watch_for(&player, old),
        };
        assert!(matches!(
            notifier.act(&EventContext::Track(&[])).await,
            Some(VoiceEvent::Cancel)
        ));
    }

    #[test]
    fn dropped_player_invalidates_watch() {
        let player = Arc::new(GuildPlayer::new());
        let watch = watch_for(&player, player.begin_playback());
        assert!(watch.is_current());

        drop(player);
        assert!(!watch.is_current());
    }
}
