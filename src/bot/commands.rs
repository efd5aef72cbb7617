use anyhow::Result;
use serenity::{
    builder::{CreateCommand, CreateCommandOption},
    model::{application::CommandOptionType, id::GuildId},
    prelude::Context,
};

pub const STARTBOT: &str = "startbot";
pub const DETENER: &str = "detener";
pub const LINK: &str = "link";
pub const URL_OPTION: &str = "url";

/// Comandos slash que el bot atiende.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotCommand {
    StartBot,
    Detener,
    Link,
}

impl BotCommand {
    /// Comando con ese nombre exacto, si el bot lo atiende.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            STARTBOT => Some(Self::StartBot),
            DETENER => Some(Self::Detener),
            LINK => Some(Self::Link),
            _ => None,
        }
    }
}

/// Todos los comandos slash del bot
pub fn all_commands() -> Vec<CreateCommand> {
    vec![startbot_command(), detener_command(), link_command()]
}

/// Registra comandos globales
pub async fn register_global_commands(ctx: &Context) -> Result<()> {
    for command in all_commands() {
        ctx.http.create_global_command(&command).await?;
    }

    Ok(())
}

/// Registra comandos para una guild específica (desarrollo)
pub async fn register_guild_commands(ctx: &Context, guild_id: GuildId) -> Result<()> {
    guild_id.set_commands(&ctx.http, all_commands()).await?;

    Ok(())
}

fn startbot_command() -> CreateCommand {
    CreateCommand::new(STARTBOT).description("Inicia el bot en el canal de voz actual")
}

fn detener_command() -> CreateCommand {
    CreateCommand::new(DETENER).description("Detiene el bot y lo desconecta del canal de voz")
}

fn link_command() -> CreateCommand {
    CreateCommand::new(LINK)
        .description("Reproduce audio desde una URL")
        .add_option(
            CreateCommandOption::new(
                CommandOptionType::String,
                URL_OPTION,
                "URL del audio (MP3, M3U, etc.)",
            )
            .required(true),
        )
}
