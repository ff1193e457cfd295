use ratatui::style::{Color, Modifier, Style};
use serde::Deserialize;

use crate::tracker::TaskStatus;

/// Colours used by the dashboard, addressed by role rather than by hue.
#[derive(Debug, Clone)]
pub struct Theme {
    pub border_focused: Color,
    pub border_unfocused: Color,
    pub modal_border: Color,

    pub text_primary: Color,
    pub text_secondary: Color,
    pub text_accent: Color,

    pub status_open: Color,
    pub status_in_progress: Color,
    pub status_blocked: Color,
    pub status_closed: Color,

    pub priority_critical: Color,
    pub priority_high: Color,
    pub priority_medium: Color,
    pub priority_low: Color,

    pub error: Color,
    pub success: Color,

    pub heading: Color,
    pub code: Color,

    pub selection: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            border_focused: Color::Cyan,
            border_unfocused: Color::DarkGray,
            modal_border: Color::Yellow,

            text_primary: Color::White,
            text_secondary: Color::DarkGray,
            text_accent: Color::Cyan,

            status_open: Color::White,
            status_in_progress: Color::Green,
            status_blocked: Color::Red,
            status_closed: Color::DarkGray,

            priority_critical: Color::Red,
            priority_high: Color::Rgb(255, 165, 0),
            priority_medium: Color::Yellow,
            priority_low: Color::DarkGray,

            error: Color::Red,
            success: Color::Green,

            heading: Color::Magenta,
            code: Color::Yellow,

            selection: Color::Cyan,
        }
    }
}

impl Theme {
    pub fn focused_border(&self) -> Style {
        Style::default().fg(self.border_focused)
    }

    pub fn unfocused_border(&self) -> Style {
        Style::default().fg(self.border_unfocused)
    }

    pub fn modal_border_style(&self) -> Style {
        Style::default().fg(self.modal_border)
    }

    pub fn status_style(&self, status: TaskStatus) -> Style {
        let color = match status {
            TaskStatus::Open => self.status_open,
            TaskStatus::InProgress => self.status_in_progress,
            TaskStatus::Blocked => self.status_blocked,
            TaskStatus::Closed => self.status_closed,
        };
        Style::default().fg(color)
    }

    /// P0 is bold on top of its colour; P3 and P4 share the low colour.
    pub fn priority_style(&self, priority: u8) -> Style {
        match priority {
            0 => Style::default()
                .fg(self.priority_critical)
                .add_modifier(Modifier::BOLD),
            1 => Style::default().fg(self.priority_high),
            2 => Style::default().fg(self.priority_medium),
            _ => Style::default().fg(self.priority_low),
        }
    }

    pub fn selected_style(&self) -> Style {
        Style::default()
            .fg(self.selection)
            .add_modifier(Modifier::BOLD | Modifier::REVERSED)
    }

    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error).add_modifier(Modifier::BOLD)
    }

    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success)
    }

    pub fn key_hint_style(&self) -> Style {
        Style::default()
            .fg(self.text_accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn dim_style(&self) -> Style {
        Style::default().fg(self.text_secondary)
    }
}

// ── `[theme]` table ───────────────────────────────────────────────────

/// The `[theme]` section of `config.toml`. Each key names a [`Theme`] slot;
/// unset keys keep the built-in colour.
#[derive(Debug, Default, Deserialize, Clone)]
pub struct ThemeConfig {
    pub border_focused: Option<String>,
    pub border_unfocused: Option<String>,
    pub modal_border: Option<String>,

    pub text_primary: Option<String>,
    pub text_secondary: Option<String>,
    pub text_accent: Option<String>,

    pub status_open: Option<String>,
    pub status_in_progress: Option<String>,
    pub status_blocked: Option<String>,
    pub status_closed: Option<String>,

    pub priority_critical: Option<String>,
    pub priority_high: Option<String>,
    pub priority_medium: Option<String>,
    pub priority_low: Option<String>,

    pub error: Option<String>,
    pub success: Option<String>,

    pub heading: Option<String>,
    pub code: Option<String>,

    pub selection: Option<String>,
}

/// Colour names are case-insensitive and ignore `-`/`_` (`dark-gray`,
/// `LightBlue`). Also accepted: `#rrggbb` and `rgb(r, g, b)`.
fn parse_color(raw: &str) -> Option<Color> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix('#') {
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        return Some(Color::Rgb(channel(0)?, channel(2)?, channel(4)?));
    }
    if let Some(args) = raw.strip_prefix("rgb(").and_then(|r| r.strip_suffix(')')) {
        let channels: Option<Vec<u8>> = args.split(',').map(|p| p.trim().parse().ok()).collect();
        return match channels?.as_slice() {
            &[r, g, b] => Some(Color::Rgb(r, g, b)),
            _ => None,
        };
    }

    let name: String = raw
        .chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .map(|c| c.to_ascii_lowercase())
        .collect();
    let color = match name.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "lightred" => Color::LightRed,
        "lightgreen" => Color::LightGreen,
        "lightyellow" => Color::LightYellow,
        "lightblue" => Color::LightBlue,
        "lightmagenta" => Color::LightMagenta,
        "lightcyan" => Color::LightCyan,
        "reset" | "default" => Color::Reset,
        _ => return None,
    };
    Some(color)
}

fn set_color(slot: &mut Color, key: &str, value: Option<&str>) {
    let Some(value) = value else { return };
    match parse_color(value) {
        Some(color) => *slot = color,
        None => tracing::warn!(key, value, "unknown theme colour, keeping default"),
    }
}

impl ThemeConfig {
    pub fn build(&self) -> Theme {
        let mut theme = Theme::default();
        let slots: [(&mut Color, &str, Option<&str>); 19] = [
            (&mut theme.border_focused, "border_focused", self.border_focused.as_deref()),
            (&mut theme.border_unfocused, "border_unfocused", self.border_unfocused.as_deref()),
            (&mut theme.modal_border, "modal_border", self.modal_border.as_deref()),
            (&mut theme.text_primary, "text_primary", self.text_primary.as_deref()),
            (&mut theme.text_secondary, "text_secondary", self.text_secondary.as_deref()),
            (&mut theme.text_accent, "text_accent", self.text_accent.as_deref()),
            (&mut theme.status_open, "status_open", self.status_open.as_deref()),
            (&mut theme.status_in_progress, "status_in_progress", self.status_in_progress.as_deref()),
            (&mut theme.status_blocked, "status_blocked", self.status_blocked.as_deref()),
            (&mut theme.status_closed, "status_closed", self.status_closed.as_deref()),
            (&mut theme.priority_critical, "priority_critical", self.priority_critical.as_deref()),
            (&mut theme.priority_high, "priority_high", self.priority_high.as_deref()),
            (&mut theme.priority_medium, "priority_medium", self.priority_medium.as_deref()),
            (&mut theme.priority_low, "priority_low", self.priority_low.as_deref()),
            (&mut theme.error, "error", self.error.as_deref()),
            (&mut theme.success, "success", self.success.as_deref()),
            (&mut theme.heading, "heading", self.heading.as_deref()),
            (&mut theme.code, "code", self.code.as_deref()),
            (&mut theme.selection, "selection", self.selection.as_deref()),
        ];
        for (slot, key, value) in slots {
            set_color(slot, key, value);
        }
        theme
    }
}
