use parking_lot::RwLock;
use reqwest::StatusCode;
use songbird::input::{HttpRequest, Input};
use tracing::{debug, info};
use url::Url;

use super::{stream_client, ResolveError, ResolvedStream, PROBE_TIMEOUT};

const AUDIO_EXTENSIONS: [&str; 8] = [".mp3", ".wav", ".ogg", ".flac", ".m4a", ".aac", ".opus", ".webm"];

/// Cliente para archivos de audio servidos directamente por HTTP.
pub struct DirectUrlClient {
    http: RwLock<reqwest::Client>,
}

impl DirectUrlClient {
    pub fn new() -> Self {
        Self {
            http: RwLock::new(stream_client()),
        }
    }

    /// `true` si la URL es HTTP(S) y su ruta termina en una extensión de audio.
    pub fn is_direct_audio(url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };

        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }

        let path = parsed.path().to_lowercase();
        AUDIO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
    }

    /// Descarta el cliente HTTP actual (y sus conexiones) y crea uno nuevo.
    pub fn reset_client(&self) {
        *self.http.write() = stream_client();
        debug!("Cliente HTTP de URLs directas recreado");
    }

    /// Comprueba que el archivo sea accesible y prepara su input.
    pub async fn open(&self, url: &str) -> Result<ResolvedStream, ResolveError> {
        let client = self.http.read().clone();

        let response = client
            .head(url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(|e| ResolveError::Failed(format!("HEAD {} falló: {}", url, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ResolveError::Expired(format!("{} respondió {}", url, status)));
        }
        // Algunos servidores no implementan HEAD; el GET del driver decidirá.
        if !status.is_success() && status != StatusCode::METHOD_NOT_ALLOWED {
            return Err(ResolveError::Failed(format!("{} respondió {}", url, status)));
        }

        info!("🎯 Usando URL directa de stream: {}", url);

        let title = Url::parse(url)
            .ok()
            .and_then(|u| u.path_segments()?.next_back().map(str::to_string))
            .filter(|name| !name.is_empty());

        Ok(ResolvedStream {
            input: Input::from(HttpRequest::new(client, url.to_string())),
            title,
        })
    }
}

impl Default for DirectUrlClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_audio_detection() {
        assert!(DirectUrlClient::is_direct_audio("https://cdn.example/track.mp3"));
        assert!(DirectUrlClient::is_direct_audio("http://cdn.example/a/b/SONG.FLAC"));
        assert!(DirectUrlClient::is_direct_audio("https://cdn.example/track.ogg?token=abc"));
        assert!(!DirectUrlClient::is_direct_audio("https://www.youtube.com/watch?v=dQw4w9WgXcQ"));
        assert!(!DirectUrlClient::is_direct_audio("ftp://cdn.example/track.mp3"));
        assert!(!DirectUrlClient::is_direct_audio("track.mp3"));
    }
}
