use async_process::Command;
use parking_lot::RwLock;
use songbird::input::{AudioStreamError, Compose, Input, YoutubeDl};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, info, warn};

use super::{stream_client, ResolveError, ResolvedStream, PROBE_TIMEOUT};

/// Fragmentos de error de yt-dlp que indican firma o sesión caducada.
const EXPIRED_MARKERS: [&str; 7] = [
    "sign in to confirm",
    "signature extraction failed",
    "nsig extraction failed",
    "token",
    "cookies",
    "http error 401",
    "http error 403",
];

/// Cliente para páginas que yt-dlp sabe extraer.
pub struct YtDlpClient {
    http: RwLock<reqwest::Client>,
    expired: AtomicBool,
}

impl YtDlpClient {
    pub fn new() -> Self {
        Self {
            http: RwLock::new(stream_client()),
            expired: AtomicBool::new(false),
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expired.load(Ordering::Acquire)
    }

    /// Prepara el input consultando antes los metadatos, para que una URL
    /// inválida falle aquí y no dentro del driver de voz.
    pub async fn open(&self, url: &str) -> Result<ResolvedStream, ResolveError> {
        let client = self.http.read().clone();
        let mut ytdl = YoutubeDl::new(client, url.to_string());

        debug!("📊 Obteniendo info de: {}", url);

        let metadata = tokio::time::timeout(PROBE_TIMEOUT, ytdl.aux_metadata())
            .await
            .map_err(|_| {
                ResolveError::Failed(format!(
                    "yt-dlp no respondió en {}",
                    humantime::format_duration(PROBE_TIMEOUT)
                ))
            })?;

        match metadata {
            Ok(metadata) => {
                info!(
                    "✅ yt-dlp resolvió {}: {}",
                    url,
                    metadata.title.as_deref().unwrap_or("(sin título)")
                );
                Ok(ResolvedStream {
                    input: Input::from(ytdl),
                    title: metadata.title,
                })
            }
            Err(e) => {
                let error = classify(&e);
                if matches!(error, ResolveError::Expired(_)) {
                    self.expired.store(true, Ordering::Release);
                }
                Err(error)
            }
        }
    }

    /// Limpia la caché de yt-dlp (firmas y tokens de reproductor) y recrea el
    /// cliente HTTP.
    pub async fn refresh(&self) -> Result<(), ResolveError> {
        info!("🔄 Limpiando caché de yt-dlp");

        let output = Command::new("yt-dlp")
            .arg("--rm-cache-dir")
            .output()
            .await
            .map_err(|e| ResolveError::Failed(format!("Error al ejecutar yt-dlp: {}", e)))?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            warn!("❌ yt-dlp --rm-cache-dir falló: {}", error.trim());
            return Err(ResolveError::Failed(format!("yt-dlp error: {}", error.trim())));
        }

        *self.http.write() = stream_client();
        self.expired.store(false, Ordering::Release);
        Ok(())
    }
}

impl Default for YtDlpClient {
    fn default() -> Self {
        Self::new()
    }
}

fn classify(error: &AudioStreamError) -> ResolveError {
    let message = error.to_string();
    if is_expired_message(&message) {
        ResolveError::Expired(message)
    } else {
        ResolveError::Failed(message)
    }
}

fn is_expired_message(message: &str) -> bool {
    let lower = message.to_lowercase();
    EXPIRED_MARKERS.iter().any(|marker| lower.contains(marker))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expired_message_detection() {
        assert!(is_expired_message(
            "ERROR: [youtube] abc: Sign in to confirm you're not a bot"
        ));
        assert!(is_expired_message("ERROR: HTTP Error 403: Forbidden"));
        assert!(is_expired_message("nsig extraction failed: some formats may be missing"));
        assert!(!is_expired_message("ERROR: Unsupported URL: https://example.com"));
        assert!(!is_expired_message("HTTP Error 404: Not Found"));
    }

    #[test]
    fn new_client_is_not_expired() {
        assert!(!YtDlpClient::new().is_expired());
    }
}
