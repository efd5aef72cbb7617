use serenity::{
    all::ButtonStyle,
    builder::{CreateActionRow, CreateButton},
};
use url::Url;

/// Longitud máxima que Discord acepta en la URL de un botón de enlace.
const MAX_LINK_URL_LEN: usize = 512;

/// IDs personalizados para los botones
pub mod button_ids {
    pub const PLAY_PAUSE: &str = "play_pause";
    pub const STOP: &str = "stop";
}

/// Fila de controles del reproductor.
///
/// El botón "Abrir en navegador" es un enlace directo y solo se añade si la
/// URL es HTTP(S) y cabe en el límite de Discord; un enlace inválido hace que
/// se rechace el mensaje completo.
pub fn create_player_controls(url: &str) -> Vec<CreateActionRow> {
    let mut buttons = vec![
        CreateButton::new(button_ids::PLAY_PAUSE)
            .label("⏯️ Play/Pause")
            .style(ButtonStyle::Primary),
        CreateButton::new(button_ids::STOP)
            .label("⏹️ Stop")
            .style(ButtonStyle::Danger),
    ];

    if is_linkable(url) {
        buttons.push(CreateButton::new_link(url).label("Abrir en navegador"));
    }

    vec![CreateActionRow::Buttons(buttons)]
}

fn is_linkable(url: &str) -> bool {
    url.len() <= MAX_LINK_URL_LEN
        && Url::parse(url).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}
