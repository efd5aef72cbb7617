//! Per-guild voice sessions: the registry and the manager that owns its
//! lifecycle.

pub mod manager;
pub mod store;

use serenity::model::id::ChannelId;
use std::sync::Arc;

use crate::audio::{connection::VoiceLink, player::GuildPlayer};

pub use manager::{PlaybackOutcome, PlaybackReply, VoiceSessionManager};
pub use store::SessionStore;

/// Conexión de voz y reproductor de una guild, registrados siempre juntos.
#[derive(Clone)]
pub struct GuildSession {
    pub connection: Arc<dyn VoiceLink>,
    pub player: Arc<GuildPlayer>,
}

impl GuildSession {
    pub fn new(connection: Arc<dyn VoiceLink>) -> Self {
        Self {
            connection,
            player: Arc::new(GuildPlayer::new()),
        }
    }

    pub fn channel_id(&self) -> ChannelId {
        self.connection.channel_id()
    }
}
