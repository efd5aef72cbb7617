use thiserror::Error;

/// Errores que puede producir cualquier operación iniciada por un usuario.
///
/// El `Display` de cada variante va al log del operador. Lo que ve el usuario
/// sale siempre de [`BotError::user_message`], que nunca incluye detalles
/// internos.
#[derive(Debug, Error)]
pub enum BotError {
    #[error("el miembro no está en ningún canal de voz")]
    NotInVoiceChannel,

    #[error("no se pudo conectar al canal de voz: {0}")]
    ConnectionFailed(String),

    #[error("no hay sesión de voz activa en esta guild")]
    NoActiveSession,

    #[error("URL vacía o ausente")]
    InvalidUrl,

    #[error("formato no soportado: {0}")]
    UnsupportedFormat(String),

    #[error("no se pudo resolver el stream: {0}")]
    StreamResolutionFailed(String),

    #[error("error interno: {0}")]
    Internal(String),
}

impl BotError {
    pub fn internal(detail: impl std::fmt::Display) -> Self {
        Self::Internal(detail.to_string())
    }

    /// Mensaje corto y genérico para mostrar al usuario.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::NotInVoiceChannel => "❌ Debes estar en un canal de voz para usar este comando.",
            Self::ConnectionFailed(_) => "❌ Error al conectar al canal de voz.",
            Self::NoActiveSession => {
                "❌ El bot no está conectado a un canal de voz. Usa primero `/startbot`."
            }
            Self::InvalidUrl => "❌ Debes proporcionar una URL de audio.",
            Self::UnsupportedFormat(_) => "❌ El formato M3U no está completamente soportado aún.",
            Self::StreamResolutionFailed(_) => {
                "❌ Error al obtener el stream de audio. Verifica la URL."
            }
            Self::Internal(_) => "❌ Ocurrió un error al procesar el comando.",
        }
    }
}

impl From<serenity::Error> for BotError {
    fn from(e: serenity::Error) -> Self {
        Self::Internal(e.to_string())
    }
}

pub type BotResult<T> = Result<T, BotError>;
