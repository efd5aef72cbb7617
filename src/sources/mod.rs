pub mod direct_url;
pub mod ytdlp;

use async_trait::async_trait;
use songbird::input::Input;
use std::time::Duration;
use thiserror::Error;
use tracing::{info, warn};

pub use direct_url::DirectUrlClient;
pub use ytdlp::YtDlpClient;

use crate::error::{BotError, BotResult};

const PLAYLIST_SUFFIX: &str = ".m3u";

/// Plazo total de las comprobaciones previas (HEAD, metadatos de yt-dlp).
pub(crate) const PROBE_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Tiempo máximo sin recibir datos mientras se descarga el audio.
const STREAM_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Cliente HTTP con el que el driver descarga el audio.
///
/// No lleva plazo total: una pista puede durar horas. Solo se limitan la
/// conexión y los silencios de la descarga.
pub(crate) fn stream_client() -> reqwest::Client {
    stream_client_with_idle(STREAM_IDLE_TIMEOUT)
}

fn stream_client_with_idle(idle: Duration) -> reqwest::Client {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .read_timeout(idle)
        .build()
        .unwrap_or_default()
}

/// Cómo se obtiene el audio de una URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    /// Archivo de audio servido por HTTP.
    DirectFile,
    /// Página que yt-dlp sabe extraer.
    Extracted,
}

/// URL pedida con `/link`, ya validada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackRequest {
    url: String,
    kind: StreamKind,
}

impl PlaybackRequest {
    /// Valida la URL recibida del usuario.
    ///
    /// Las listas `.m3u` se rechazan: no se interpretan listas de reproducción.
    pub fn parse(raw: Option<&str>) -> BotResult<Self> {
        let url = raw.map(str::trim).unwrap_or_default();

        if url.is_empty() {
            return Err(BotError::InvalidUrl);
        }

        if url.ends_with(PLAYLIST_SUFFIX) {
            return Err(BotError::UnsupportedFormat(url.to_string()));
        }

        let kind = if DirectUrlClient::is_direct_audio(url) {
            StreamKind::DirectFile
        } else {
            StreamKind::Extracted
        };

        Ok(Self {
            url: url.to_string(),
            kind,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn kind(&self) -> StreamKind {
        self.kind
    }
}

/// Stream listo para entregarse al reproductor.
pub struct ResolvedStream {
    pub input: Input,
    pub title: Option<String>,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// La credencial de la fuente caducó; refrescarla puede arreglarlo.
    #[error("credencial expirada: {0}")]
    Expired(String),

    #[error("{0}")]
    Failed(String),
}

/// Convierte URLs en streams reproducibles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StreamResolver: Send + Sync {
    /// `true` si ya se sabe que la credencial caducó.
    fn is_expired(&self) -> bool;

    async fn refresh_token(&self) -> Result<(), ResolveError>;

    async fn resolve(&self, request: &PlaybackRequest) -> Result<ResolvedStream, ResolveError>;
}

/// Resuelve `request`, refrescando la credencial a lo sumo una vez.
pub async fn resolve_with_refresh<R>(
    resolver: &R,
    request: &PlaybackRequest,
) -> Result<ResolvedStream, ResolveError>
where
    R: StreamResolver + ?Sized,
{
    let mut refreshed = false;

    if resolver.is_expired() {
        info!("🔑 Credencial expirada, refrescando antes de resolver");
        resolver.refresh_token().await?;
        refreshed = true;
    }

    match resolver.resolve(request).await {
        Err(ResolveError::Expired(reason)) if !refreshed => {
            warn!("🔑 Credencial expirada al resolver {}: {}", request.url(), reason);
            resolver.refresh_token().await?;
            resolver.resolve(request).await.map_err(|e| match e {
                ResolveError::Expired(reason) => {
                    ResolveError::Failed(format!("credencial expirada tras refrescar: {}", reason))
                }
                other => other,
            })
        }
        Err(ResolveError::Expired(reason)) => Err(ResolveError::Failed(format!(
            "credencial expirada tras refrescar: {}",
            reason
        ))),
        other => other,
    }
}

/// Resolver de producción: archivos directos por HTTP, el resto con yt-dlp.
pub struct SourceResolver {
    direct: DirectUrlClient,
    ytdlp: YtDlpClient,
}

impl SourceResolver {
    pub fn new() -> Self {
        Self {
            direct: DirectUrlClient::new(),
            ytdlp: YtDlpClient::new(),
        }
    }
}

impl Default for SourceResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamResolver for SourceResolver {
    fn is_expired(&self) -> bool {
        self.ytdlp.is_expired()
    }

    async fn refresh_token(&self) -> Result<(), ResolveError> {
        self.direct.reset_client();

        match self.ytdlp.refresh().await {
            Err(e) if self.ytdlp.is_expired() => Err(e),
            // La caducidad vino de una URL directa: basta con el cliente nuevo.
            Err(e) => {
                warn!("No se pudo limpiar la caché de yt-dlp: {}", e);
                Ok(())
            }
            Ok(()) => Ok(()),
        }
    }

    async fn resolve(&self, request: &PlaybackRequest) -> Result<ResolvedStream, ResolveError> {
        match request.kind() {
            StreamKind::DirectFile => self.direct.open(request.url()).await,
            StreamKind::Extracted => self.ytdlp.open(request.url()).await,
        }
    }
}
