//! Centralized TUI theme built on ratatui's Tailwind CSS palette.

use ratatui::style::Color;
use ratatui::style::palette::tailwind;

/// Visual tokens for every screen.
pub struct Theme {
    // ── Base ──
    /// Primary foreground/text color.
    pub fg: Color,
    /// Dimmed foreground for less prominent text.
    pub fg_dim: Color,
    /// Muted foreground for placeholders and hints.
    pub fg_muted: Color,
    /// Default border color.
    pub border: Color,
    /// Border color for the focused widget.
    pub border_active: Color,

    // ── Semantic ──
    /// Brand accent (header title, logo ring).
    pub accent: Color,
    /// Error text and failed replies.
    pub error: Color,
    /// Transient notices in the status line.
    pub warning: Color,

    // ── Chat ──
    /// "You" label.
    pub user_label: Color,
    /// "ChatGPT" label.
    pub bot_label: Color,
    /// Spinner while a reply streams.
    pub spinner: Color,

    // ── Empty state ──
    /// Logo glyph.
    pub logo: Color,
    /// Suggestion card title.
    pub card_title: Color,
    /// Suggestion card subtitle.
    pub card_subtitle: Color,

    // ── Overlays ──
    /// Highlighted entry in the model dropdown.
    pub dropdown_selected: Color,
    /// Masked secret text in the settings form.
    pub secret: Color,
}

impl Theme {
    /// The default dark theme using Tailwind palette.
    pub const fn default_dark() -> Self {
        Self {
            fg: tailwind::SLATE.c100,
            fg_dim: tailwind::SLATE.c400,
            fg_muted: tailwind::SLATE.c500,
            border: tailwind::SLATE.c700,
            border_active: tailwind::EMERALD.c500,

            accent: tailwind::EMERALD.c400,
            error: tailwind::RED.c500,
            warning: tailwind::AMBER.c400,

            user_label: tailwind::CYAN.c400,
            bot_label: tailwind::EMERALD.c400,
            spinner: tailwind::AMBER.c400,

            logo: tailwind::SLATE.c100,
            card_title: tailwind::SLATE.c100,
            card_subtitle: tailwind::SLATE.c500,

            dropdown_selected: tailwind::EMERALD.c400,
            secret: tailwind::SLATE.c400,
        }
    }
}

/// Global theme instance.
pub const THEME: Theme = Theme::default_dark();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dark_theme_has_distinct_colors() {
        let theme = Theme::default_dark();
        assert_ne!(theme.fg, theme.fg_muted);
        assert_ne!(theme.accent, theme.error);
        assert_ne!(theme.user_label, theme.bot_label);
        assert_ne!(theme.border, theme.border_active);
    }
}
