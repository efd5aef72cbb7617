use async_trait::async_trait;
use serenity::{
    builder::{
        CreateInteractionResponse, CreateInteractionResponseFollowup,
        CreateInteractionResponseMessage, EditInteractionResponse,
    },
    model::{
        application::{CommandInteraction, ComponentInteraction},
        id::{ChannelId, GuildId, UserId},
    },
    prelude::Context,
};
use tracing::{debug, info, warn};

use crate::{
    audio::player::ToggleOutcome,
    bot::{
        commands::{self, BotCommand},
        events::ErrorNotice,
        StreamLinkBot,
    },
    error::{BotError, BotResult},
    session::{PlaybackReply, VoiceSessionManager},
    sources::PlaybackRequest,
    ui::{buttons, buttons::button_ids, embeds},
};

const NO_PLAYER_MESSAGE: &str = "❌ No hay un reproductor activo.";

/// Maneja comandos slash
pub async fn handle_command(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &StreamLinkBot,
) -> BotResult<()> {
    let guild_id = command
        .guild_id
        .ok_or_else(|| BotError::internal("Comando usado fuera de un servidor"))?;

    info!(
        "📝 Comando /{} usado por {} en guild {}",
        command.data.name, command.user.name, guild_id
    );

    match BotCommand::from_name(&command.data.name) {
        Some(BotCommand::StartBot) => handle_startbot(ctx, command, bot, guild_id).await,
        Some(BotCommand::Detener) => handle_detener(ctx, command, bot, guild_id).await,
        Some(BotCommand::Link) => handle_link(ctx, command, bot, guild_id).await,
        None => {
            debug!("Comando /{} ignorado", command.data.name);
            Ok(())
        }
    }
}

/// Botones del reproductor que el bot atiende.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ControlAction {
    PlayPause,
    Stop,
}

impl ControlAction {
    fn from_custom_id(custom_id: &str) -> Option<Self> {
        match custom_id {
            button_ids::PLAY_PAUSE => Some(Self::PlayPause),
            button_ids::STOP => Some(Self::Stop),
            _ => None,
        }
    }
}

/// Ejecuta la acción de un botón y devuelve el texto de la respuesta.
async fn run_control(
    sessions: &VoiceSessionManager,
    guild_id: GuildId,
    action: ControlAction,
) -> BotResult<&'static str> {
    let outcome = match action {
        ControlAction::PlayPause => sessions.toggle_play_pause(guild_id).await.map(toggle_message),
        ControlAction::Stop => sessions.stop_playback(guild_id).map(|()| "⏹️ Audio detenido."),
    };

    component_reply(outcome)
}

/// Sin sesión, el botón responde con el aviso de reproductor inactivo; el
/// resto de errores siguen su curso.
fn component_reply(outcome: BotResult<&'static str>) -> BotResult<&'static str> {
    match outcome {
        Err(BotError::NoActiveSession) => Ok(NO_PLAYER_MESSAGE),
        other => other,
    }
}

/// Maneja interacciones con componentes (botones)
pub async fn handle_component(
    ctx: &Context,
    component: &ComponentInteraction,
    bot: &StreamLinkBot,
) -> BotResult<()> {
    let guild_id = component
        .guild_id
        .ok_or_else(|| BotError::internal("Componente usado fuera de un servidor"))?;

    info!(
        "🔘 Botón {} presionado por {} en guild {}",
        component.data.custom_id, component.user.name, guild_id
    );

    let Some(action) = ControlAction::from_custom_id(&component.data.custom_id) else {
        debug!("Botón {} ignorado", component.data.custom_id);
        return Ok(());
    };

    let content = run_control(&bot.sessions, guild_id, action).await?;

    component
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content(content)
                    .ephemeral(true),
            ),
        )
        .await?;

    Ok(())
}

/// Responde con el mensaje genérico del error, solo visible para el usuario.
///
/// Si la interacción ya tenía respuesta, esta se borra y el aviso va como
/// follow-up efímero.
pub async fn report_command_error(ctx: &Context, command: &CommandInteraction, error: &BotError) {
    let content = error.user_message();

    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(content)
            .ephemeral(true),
    );
    if command.create_response(&ctx.http, response).await.is_ok() {
        return;
    }

    if let Err(e) = command.delete_response(&ctx.http).await {
        debug!("No se pudo borrar la respuesta previa: {:?}", e);
    }
    let followup = CreateInteractionResponseFollowup::new()
        .content(content)
        .ephemeral(true);
    if let Err(e) = command.create_followup(&ctx.http, followup).await {
        warn!("No se pudo informar el error al usuario: {:?}", e);
    }
}

pub async fn report_component_error(
    ctx: &Context,
    component: &ComponentInteraction,
    error: &BotError,
) {
    let response = CreateInteractionResponse::Message(
        CreateInteractionResponseMessage::new()
            .content(error.user_message())
            .ephemeral(true),
    );
    if let Err(e) = component.create_response(&ctx.http, response).await {
        warn!("No se pudo informar el error al usuario: {:?}", e);
    }
}

// Handlers específicos para cada comando

async fn handle_startbot(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &StreamLinkBot,
    guild_id: GuildId,
) -> BotResult<()> {
    let (channel_id, channel_name) =
        member_voice_channel(ctx, guild_id, command.user.id).ok_or(BotError::NotInVoiceChannel)?;

    // Conectar puede tardar más que el plazo de respuesta de Discord
    command.defer(&ctx.http).await?;

    bot.sessions.start(guild_id, Some(channel_id)).await?;

    command
        .edit_response(
            &ctx.http,
            EditInteractionResponse::new().content(format!(
                "🎶 Bot conectado al canal de voz **{}**. Usa `/link <url>` para reproducir audio.",
                channel_name
            )),
        )
        .await?;

    Ok(())
}

async fn handle_detener(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &StreamLinkBot,
    guild_id: GuildId,
) -> BotResult<()> {
    bot.sessions.stop(guild_id).await?;

    command
        .create_response(
            &ctx.http,
            CreateInteractionResponse::Message(
                CreateInteractionResponseMessage::new()
                    .content("🔴 Bot desconectado del canal de voz."),
            ),
        )
        .await?;

    Ok(())
}

async fn handle_link(
    ctx: &Context,
    command: &CommandInteraction,
    bot: &StreamLinkBot,
    guild_id: GuildId,
) -> BotResult<()> {
    let url = command
        .data
        .options
        .iter()
        .find(|opt| opt.name == commands::URL_OPTION)
        .and_then(|opt| opt.value.as_str());

    let reply = InteractionReply {
        ctx,
        command,
        thumbnail: &bot.config.player_thumbnail_url,
    };
    let notice = ErrorNotice {
        http: ctx.http.clone(),
        channel_id: command.channel_id,
    };

    let outcome = bot
        .sessions
        .link(guild_id, url, bot.resolver.as_ref(), &reply, Some(notice))
        .await?;
    debug!("Resultado de /link en guild {}: {:?}", guild_id, outcome);

    Ok(())
}

/// Respuesta de `/link` sobre la interacción de Discord.
struct InteractionReply<'a> {
    ctx: &'a Context,
    command: &'a CommandInteraction,
    thumbnail: &'a str,
}

#[async_trait]
impl PlaybackReply for InteractionReply<'_> {
    async fn show_player(&self, request: &PlaybackRequest) -> BotResult<()> {
        let embed = embeds::create_player_embed(request.url(), self.thumbnail);
        let controls = buttons::create_player_controls(request.url());

        self.command
            .create_response(
                &self.ctx.http,
                CreateInteractionResponse::Message(
                    CreateInteractionResponseMessage::new()
                        .embed(embed)
                        .components(controls),
                ),
            )
            .await?;

        Ok(())
    }

    async fn show_failure(&self, error: &BotError) -> BotResult<()> {
        self.command
            .edit_response(
                &self.ctx.http,
                EditInteractionResponse::new()
                    .content(error.user_message())
                    .embeds(Vec::new())
                    .components(Vec::new()),
            )
            .await?;

        Ok(())
    }
}

// Funciones auxiliares

fn toggle_message(outcome: ToggleOutcome) -> &'static str {
    match outcome {
        ToggleOutcome::Paused => "⏸️ Audio pausado.",
        ToggleOutcome::Resumed => "▶️ Audio reanudado.",
        ToggleOutcome::NothingToToggle => "❌ No hay audio para pausar/reanudar.",
    }
}

/// Canal de voz actual del usuario y su nombre, según la caché.
fn member_voice_channel(ctx: &Context, guild_id: GuildId, user_id: UserId) -> Option<(ChannelId, String)> {
    let guild = guild_id.to_guild_cached(&ctx.cache)?;

    let channel_id = guild.voice_states.get(&user_id)?.channel_id?;
    let name = guild
        .channels
        .get(&channel_id)
        .map(|channel| channel.name.clone())
        .unwrap_or_else(|| channel_id.to_string());

    Some((channel_id, name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::{
        connection::{MockVoiceGateway, MockVoiceLink, VoiceLink},
        player::{MockTrackControl, PlayerStatus},
    };
    use pretty_assertions::assert_eq;
    use std::{sync::Arc, time::Duration};

    const GUILD: GuildId = GuildId::new(7);

    fn idle_manager() -> VoiceSessionManager {
        let mut gateway = MockVoiceGateway::new();
        gateway.expect_join().never();
        VoiceSessionManager::new(Arc::new(gateway), Duration::from_secs(30), 1.0)
    }

    async fn manager_with_session() -> VoiceSessionManager {
        let mut link = MockVoiceLink::new();
        link.expect_channel_id().return_const(ChannelId::new(8));
        link.expect_leave().returning(|| Ok(()));
        let link: Arc<dyn VoiceLink> = Arc::new(link);

        let mut gateway = MockVoiceGateway::new();
        gateway.expect_join().times(1).returning(move |_, _| Ok(link.clone()));

        let manager = VoiceSessionManager::new(Arc::new(gateway), Duration::from_secs(30), 1.0);
        manager.start(GUILD, Some(ChannelId::new(8))).await.unwrap();
        manager
    }

    #[test]
    fn only_player_buttons_are_routed() {
        assert_eq!(ControlAction::from_custom_id("play_pause"), Some(ControlAction::PlayPause));
        assert_eq!(ControlAction::from_custom_id("stop"), Some(ControlAction::Stop));
        assert_eq!(ControlAction::from_custom_id("queue"), None);
        assert_eq!(ControlAction::from_custom_id(""), None);
    }

    #[test]
    fn missing_session_becomes_no_player_message() {
        assert_eq!(
            component_reply(Err(BotError::NoActiveSession)).unwrap(),
            NO_PLAYER_MESSAGE
        );
        assert_eq!(component_reply(Ok("⏸️ Audio pausado.")).unwrap(), "⏸️ Audio pausado.");
    }

    #[test]
    fn other_errors_are_not_masked() {
        assert!(matches!(
            component_reply(Err(BotError::internal("driver caído"))),
            Err(BotError::Internal(_))
        ));
        assert!(matches!(
            component_reply(Err(BotError::NotInVoiceChannel)),
            Err(BotError::NotInVoiceChannel)
        ));
    }

    #[tokio::test]
    async fn buttons_without_session_reply_no_player() {
        let manager = idle_manager();

        for action in [ControlAction::PlayPause, ControlAction::Stop] {
            let content = run_control(&manager, GUILD, action).await.unwrap();
            assert_eq!(content, "❌ No hay un reproductor activo.");
        }
        assert_eq!(manager.active_sessions(), 0);
    }

    #[tokio::test]
    async fn play_pause_button_pauses_current_track() {
        let manager = manager_with_session().await;
        let session = manager.session(GUILD).unwrap();

        let mut track = MockTrackControl::new();
        track.expect_status().return_const(PlayerStatus::Playing);
        track.expect_pause().times(1).returning(|| Ok(()));
        let generation = session.player.begin_playback();
        session.player.install(generation, Arc::new(track));

        let content = run_control(&manager, GUILD, ControlAction::PlayPause).await.unwrap();

        assert_eq!(content, "⏸️ Audio pausado.");
        assert!(manager.has_session(GUILD));
    }

    #[tokio::test]
    async fn stop_button_keeps_session() {
        let manager = manager_with_session().await;

        let content = run_control(&manager, GUILD, ControlAction::Stop).await.unwrap();

        assert_eq!(content, "⏹️ Audio detenido.");
        assert!(manager.has_session(GUILD));
    }

    #[test]
    fn toggle_messages_match_outcomes() {
        assert_eq!(toggle_message(ToggleOutcome::Paused), "⏸️ Audio pausado.");
        assert_eq!(toggle_message(ToggleOutcome::Resumed), "▶️ Audio reanudado.");
        assert!(toggle_message(ToggleOutcome::NothingToToggle).contains("No hay audio"));
    }
}
