use serenity::{
    all::Timestamp,
    builder::{CreateEmbed, CreateEmbedFooter},
};

/// Paleta de colores del bot
pub mod colors {
    use serenity::all::Colour;

    pub const PLAYER_BLUE: Colour = Colour(0x0099FF);
}

/// Footer estandarizado para todos los embeds
const STANDARD_FOOTER: &str = "🎵 Stream Link Bot";

/// Límite de Discord para la descripción de un embed, en caracteres.
const MAX_DESCRIPTION_LEN: usize = 4096;
/// Largo máximo del texto visible del enlace.
const MAX_LINK_LABEL_LEN: usize = 80;

/// Embed del reproductor que acompaña a `/link`.
pub fn create_player_embed(url: &str, thumbnail: &str) -> CreateEmbed {
    CreateEmbed::default()
        .title("Reproductor de Audio")
        .description(now_playing_description(url))
        .color(colors::PLAYER_BLUE)
        .thumbnail(thumbnail)
        .timestamp(Timestamp::now())
        .footer(CreateEmbedFooter::new(STANDARD_FOOTER))
}

/// "Reproduciendo: [texto](url)", con el texto acortado. Si ni así cabe en
/// la descripción, se muestra solo el texto sin enlace.
fn now_playing_description(url: &str) -> String {
    let label = link_label(url);
    let linked = format!("Reproduciendo: [{}]({})", label, url);

    if linked.chars().count() <= MAX_DESCRIPTION_LEN {
        linked
    } else {
        format!("Reproduciendo: {}", label)
    }
}

fn link_label(url: &str) -> String {
    if url.chars().count() <= MAX_LINK_LABEL_LEN {
        return url.to_string();
    }

    let mut label: String = url.chars().take(MAX_LINK_LABEL_LEN - 1).collect();
    label.push('…');
    label
}
