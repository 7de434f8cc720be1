//! Centralized theme module for TUI color constants and styles

use ratatui::prelude::*;

/// Complete color palette for the TUI
#[derive(Debug, Clone)]
pub struct ThemeColors {
    // Score colors (share of the cell's maximum)
    pub score_high: Color,
    pub score_mid: Color,
    pub score_low: Color,
    pub unscored: Color,

    // Grid
    pub focus: Style,
    pub response_marker: Color,
    pub row_alt_bg: Color,
    pub index_color: Color,

    // Styles
    pub title_style: Style,
    pub header_style: Style,

    // General colors
    pub muted: Color,
    pub title_color: Color,

    // Status bar colors
    pub status_bar_bg: Color,
    pub status_key_color: Color,
    pub flash_success: Color,
    pub flash_error: Color,

    // Popup overlay colors
    pub popup_border: Color,
    pub popup_title: Style,
    pub winner: Style,
}

impl ThemeColors {
    pub fn dark() -> Self {
        Self {
            score_high: Color::Green,
            score_mid: Color::Yellow,
            score_low: Color::Red,
            unscored: Color::DarkGray,
            focus: Style::new().reversed(),
            response_marker: Color::Magenta,
            row_alt_bg: Color::Indexed(235),
            index_color: Color::DarkGray,
            title_style: Style::new().fg(Color::Cyan).bold(),
            header_style: Style::new().bold(),
            muted: Color::Gray,
            title_color: Color::Cyan,
            status_bar_bg: Color::Indexed(236),
            status_key_color: Color::Cyan,
            flash_success: Color::Green,
            flash_error: Color::Red,
            popup_border: Color::Cyan,
            popup_title: Style::new().fg(Color::Cyan).bold(),
            winner: Style::new().fg(Color::Green).bold(),
        }
    }

    /// Monochrome palette for `colors: false`; focus still shows via reverse video.
    pub fn plain() -> Self {
        Self {
            score_high: Color::Reset,
            score_mid: Color::Reset,
            score_low: Color::Reset,
            unscored: Color::Reset,
            focus: Style::new().reversed(),
            response_marker: Color::Reset,
            row_alt_bg: Color::Reset,
            index_color: Color::Reset,
            title_style: Style::new().bold(),
            header_style: Style::new().bold(),
            muted: Color::Reset,
            title_color: Color::Reset,
            status_bar_bg: Color::Reset,
            status_key_color: Color::Reset,
            flash_success: Color::Reset,
            flash_error: Color::Reset,
            popup_border: Color::Reset,
            popup_title: Style::new().bold(),
            winner: Style::new().bold(),
        }
    }

    /// Color for a value based on its share of the maximum
    pub fn score_color(&self, score: f64, max_score: f64) -> Color {
        let percentage = if max_score > 0.0 {
            (score / max_score) * 100.0
        } else {
            0.0
        };

        if percentage >= 70.0 {
            self.score_high
        } else if percentage >= 40.0 {
            self.score_mid
        } else {
            self.score_low
        }
    }
}

impl Default for ThemeColors {
    fn default() -> Self {
        Self::dark()
    }
}

/// Pick the palette from the `colors` setting; `None` means colored.
pub fn resolve_theme(colors: Option<bool>) -> ThemeColors {
    match colors {
        Some(false) => ThemeColors::plain(),
        _ => ThemeColors::dark(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_score_color_thresholds() {
        let theme = ThemeColors::dark();
        assert_eq!(theme.score_color(4.0, 4.0), Color::Green);
        assert_eq!(theme.score_color(2.0, 4.0), Color::Yellow);
        assert_eq!(theme.score_color(1.0, 4.0), Color::Red);
        assert_eq!(theme.score_color(1.0, 0.0), Color::Red);
    }

    #[test]
    fn test_resolve_theme() {
        assert_eq!(resolve_theme(Some(false)).score_high, Color::Reset);
        assert_eq!(resolve_theme(None).score_high, Color::Green);
    }
}
