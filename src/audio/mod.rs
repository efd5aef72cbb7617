//! # Audio Module
//!
//! Voice connections and the per-guild audio player.
//!
//! ### [`connection`] - Voice Connections
//! - [`connection::VoiceGateway`] opens a connection to a voice channel
//! - [`connection::VoiceLink`] plays one input at a time and leaves the channel
//! - Songbird-backed implementations for production
//!
//! ### [`player`] - Audio Player
//! - Tracks the current song of a guild and its playback generation
//! - Play/pause toggling and track-level stop

pub mod connection;
pub mod player;
