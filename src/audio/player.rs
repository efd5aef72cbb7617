use async_trait::async_trait;
use parking_lot::Mutex;
use songbird::tracks::{PlayMode, ReadyState, TrackHandle};
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tracing::{debug, info};

use crate::{
    bot::events::{self, PlaybackWatch},
    error::{BotError, BotResult},
};

/// Estado observable del reproductor de una guild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Idle,
    Buffering,
    Playing,
    Paused,
}

/// Resultado de pulsar el botón de play/pausa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Paused,
    Resumed,
    /// Nada que pausar ni reanudar (idle o cargando).
    NothingToToggle,
}

/// Control sobre la pista que está sonando.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TrackControl: Send + Sync {
    async fn status(&self) -> PlayerStatus;
    fn pause(&self) -> BotResult<()>;
    fn resume(&self) -> BotResult<()>;
    fn stop(&self) -> BotResult<()>;
    /// Registra los listeners de esta reproducción.
    fn watch(&self, watch: PlaybackWatch) -> BotResult<()>;
}

#[async_trait]
impl TrackControl for TrackHandle {
    async fn status(&self) -> PlayerStatus {
        match self.get_info().await {
            Ok(state) => match (state.playing, state.ready) {
                (PlayMode::Play, ReadyState::Playable) => PlayerStatus::Playing,
                (PlayMode::Play, _) => PlayerStatus::Buffering,
                (PlayMode::Pause, _) => PlayerStatus::Paused,
                _ => PlayerStatus::Idle,
            },
            // La pista ya terminó y el driver la descartó.
            Err(_) => PlayerStatus::Idle,
        }
    }

    fn pause(&self) -> BotResult<()> {
        TrackHandle::pause(self).map_err(BotError::internal)
    }

    fn resume(&self) -> BotResult<()> {
        TrackHandle::play(self).map_err(BotError::internal)
    }

    fn stop(&self) -> BotResult<()> {
        TrackHandle::stop(self).map_err(BotError::internal)
    }

    fn watch(&self, watch: PlaybackWatch) -> BotResult<()> {
        events::attach_playback_listeners(self, watch)
    }
}

/// Reproductor de audio de una guild: a lo sumo una pista a la vez.
///
/// Cada reproducción recibe un número de generación. Los listeners de una
/// generación anterior se dan de baja solos (ver [`events`]).
pub struct GuildPlayer {
    current: Mutex<Option<Arc<dyn TrackControl>>>,
    generation: AtomicU64,
}

impl GuildPlayer {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation() == generation
    }

    /// Abre una nueva generación de reproducción y la devuelve.
    pub fn begin_playback(&self) -> u64 {
        self.generation.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Instala la pista de `generation` como actual, deteniendo la anterior.
    ///
    /// Si otra reproducción empezó mientras tanto, la pista se detiene y se
    /// devuelve `false`.
    pub fn install(&self, generation: u64, track: Arc<dyn TrackControl>) -> bool {
        let previous = {
            let mut current = self.current.lock();
            if !self.is_current(generation) {
                drop(current);
                let _ = track.stop();
                debug!("Reproducción {} reemplazada antes de empezar", generation);
                return false;
            }
            current.replace(track)
        };

        if let Some(previous) = previous {
            // Puede que el driver ya la haya detenido: ignorar el error.
            let _ = previous.stop();
        }

        true
    }

    fn current_track(&self) -> Option<Arc<dyn TrackControl>> {
        self.current.lock().clone()
    }

    pub async fn status(&self) -> PlayerStatus {
        match self.current_track() {
            Some(track) => track.status().await,
            None => PlayerStatus::Idle,
        }
    }

    pub async fn toggle(&self) -> BotResult<ToggleOutcome> {
        let Some(track) = self.current_track() else {
            return Ok(ToggleOutcome::NothingToToggle);
        };

        match track.status().await {
            PlayerStatus::Playing => {
                track.pause()?;
                info!("⏸️ Reproducción pausada");
                Ok(ToggleOutcome::Paused)
            }
            PlayerStatus::Paused => {
                track.resume()?;
                info!("▶️ Reproducción reanudada");
                Ok(ToggleOutcome::Resumed)
            }
            PlayerStatus::Idle | PlayerStatus::Buffering => Ok(ToggleOutcome::NothingToToggle),
        }
    }

    /// Detiene la pista actual. El reproductor queda en idle.
    ///
    /// También invalida la reproducción que se esté resolviendo: su pista se
    /// descarta al instalarla.
    pub fn stop(&self) -> BotResult<()> {
        let previous = {
            let mut current = self.current.lock();
            self.generation.fetch_add(1, Ordering::AcqRel);
            current.take()
        };

        if let Some(track) = previous {
            // Una pista ya terminada devuelve error al detenerla; no es un fallo.
            if let Err(e) = track.stop() {
                debug!("La pista ya estaba detenida: {}", e);
            }
        }
        info!("⏹️ Reproducción detenida");
        Ok(())
    }
}

impl Default for GuildPlayer {
    fn default() -> Self {
        Self::new()
    }
}
