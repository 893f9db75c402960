//! Colour palettes and the styles the widgets draw with.

use ratatui::style::{Color, Modifier, Style};

use crate::models::Grade;

#[derive(Debug, Clone)]
pub struct ThemeColors {
    pub primary: Color,
    pub accent: Color,

    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    pub background: Color,
    pub bg_highlight: Color,

    pub text: Color,
    pub text_muted: Color,
    pub text_dim: Color,

    /// Again, Hard, Good, Easy.
    pub grades: [Color; 4],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeName {
    Default,
    Paper,
}

impl ThemeName {
    pub const ALL: [ThemeName; 2] = [ThemeName::Default, ThemeName::Paper];

    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeName::Default => "default",
            ThemeName::Paper => "paper",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ThemeName::Default => "Emerald",
            ThemeName::Paper => "Paper",
        }
    }

    /// Unknown names fall back to the default theme.
    pub fn from_name(s: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|name| name.as_str().eq_ignore_ascii_case(s.trim()))
            .unwrap_or(ThemeName::Default)
    }

    pub fn next(&self) -> Self {
        let pos = Self::ALL.iter().position(|n| n == self).unwrap_or(0);
        Self::ALL[(pos + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: ThemeName,
    pub colors: ThemeColors,
}

impl Theme {
    pub fn new(name: ThemeName) -> Self {
        let colors = match name {
            ThemeName::Default => emerald(),
            ThemeName::Paper => paper(),
        };
        Self { name, colors }
    }

    pub fn from_name(name: &str) -> Self {
        Self::new(ThemeName::from_name(name))
    }

    pub fn grade_color(&self, grade: Grade) -> Color {
        self.colors.grades[usize::from(grade.value() - 1)]
    }

    // ══════════════════════════════════════════════════════════════════════
    // Styles
    // ══════════════════════════════════════════════════════════════════════

    pub fn title(&self) -> Style {
        bold(self.colors.text)
    }

    pub fn highlight(&self) -> Style {
        bold(self.colors.primary)
    }

    pub fn selected(&self) -> Style {
        Style::new().fg(self.colors.text).bg(self.colors.bg_highlight)
    }

    pub fn card_front(&self) -> Style {
        bold(self.colors.accent)
    }

    pub fn card_back(&self) -> Style {
        bold(self.colors.success)
    }

    /// Correct option once the answer is revealed.
    pub fn option_correct(&self) -> Style {
        bold(self.colors.success)
    }

    /// The user's pick when it was wrong.
    pub fn option_wrong(&self) -> Style {
        bold(self.colors.error)
    }

    pub fn stats_new(&self) -> Style {
        bold(self.colors.info)
    }

    pub fn stats_learning(&self) -> Style {
        bold(self.colors.warning)
    }

    pub fn stats_due(&self) -> Style {
        bold(self.colors.success)
    }

    pub fn key_hint(&self) -> Style {
        Style::new().fg(self.colors.text_dim)
    }

    pub fn key_highlight(&self) -> Style {
        bold(self.colors.accent)
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::new(ThemeName::Default)
    }
}

fn bold(color: Color) -> Style {
    Style::new().fg(color).add_modifier(Modifier::BOLD)
}

/// Emerald on slate, after the web client.
fn emerald() -> ThemeColors {
    ThemeColors {
        primary: Color::Rgb(16, 185, 129),
        accent: Color::Rgb(52, 211, 153),
        success: Color::Rgb(5, 150, 105),
        warning: Color::Rgb(251, 191, 36),
        error: Color::Rgb(248, 113, 113),
        info: Color::Rgb(96, 165, 250),
        background: Color::Rgb(17, 24, 39),
        bg_highlight: Color::Rgb(55, 65, 81),
        text: Color::Rgb(243, 244, 246),
        text_muted: Color::Rgb(156, 163, 175),
        text_dim: Color::Rgb(107, 114, 128),
        grades: [
            Color::Rgb(239, 68, 68),
            Color::Rgb(251, 191, 36),
            Color::Rgb(16, 185, 129),
            Color::Rgb(59, 130, 246),
        ],
    }
}

/// Light background for bright terminals.
fn paper() -> ThemeColors {
    ThemeColors {
        primary: Color::Rgb(4, 120, 87),
        accent: Color::Rgb(13, 148, 136),
        success: Color::Rgb(21, 128, 61),
        warning: Color::Rgb(180, 83, 9),
        error: Color::Rgb(185, 28, 28),
        info: Color::Rgb(29, 78, 216),
        background: Color::Rgb(250, 250, 249),
        bg_highlight: Color::Rgb(209, 250, 229),
        text: Color::Rgb(28, 25, 23),
        text_muted: Color::Rgb(87, 83, 78),
        text_dim: Color::Rgb(120, 113, 108),
        grades: [
            Color::Rgb(220, 38, 38),
            Color::Rgb(217, 119, 6),
            Color::Rgb(5, 150, 105),
            Color::Rgb(37, 99, 235),
        ],
    }
}

pub mod icons {
    pub const CHECK: &str = "✓";
    pub const CROSS: &str = "✗";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_theme_names_round_trip() {
        for name in ThemeName::ALL {
            assert_eq!(ThemeName::from_name(name.as_str()), name);
        }
        assert_eq!(ThemeName::from_name(" PAPER "), ThemeName::Paper);
        assert_eq!(ThemeName::from_name("kanagawa-wave"), ThemeName::Default);
        assert_eq!(ThemeName::Default.next(), ThemeName::Paper);
        assert_eq!(ThemeName::Paper.next(), ThemeName::Default);
    }

    #[test]
    fn test_grade_colors_are_distinct() {
        for name in ThemeName::ALL {
            let theme = Theme::new(name);
            let colors: Vec<_> = Grade::ALL.iter().map(|g| theme.grade_color(*g)).collect();
            for (i, a) in colors.iter().enumerate() {
                assert!(!colors[i + 1..].contains(a), "{:?} repeats a grade colour", name);
            }
            assert_eq!(theme.grade_color(Grade::Again), theme.colors.grades[0]);
            assert_ne!(theme.colors.background, theme.colors.text);
        }
    }
}
