//! Theme configuration for the TUI.
//!
//! Light and dark palettes, chosen from the terminal background when
//! possible.

use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::block::BorderType;

use crate::poller::Status;

/// Color and style theme for the TUI.
///
/// Use [`Theme::auto_detect()`] to pick a palette from the terminal
/// background, or [`Theme::dark()`]/[`Theme::light()`] explicitly.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Accent color for highlights, active elements and in-flight fetches.
    pub highlight: Color,
    /// Color for failed fetches.
    pub critical: Color,
    /// Color for a fresh render.
    pub healthy: Color,
    /// Color for borders and separators.
    pub border: Color,
    /// Bars in the monthly chart.
    pub chart: Color,
    pub header: Style,
    pub selected: Style,
    pub tab_active: Style,
    pub tab_inactive: Style,
    pub border_type: BorderType,
}

impl Theme {
    /// Palette for dark terminal backgrounds.
    pub fn dark() -> Self {
        Self {
            highlight: Color::Cyan,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::Gray,
            chart: Color::LightBlue,
            header: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::Gray),
            border_type: BorderType::Rounded,
        }
    }

    /// Palette for light terminal backgrounds.
    pub fn light() -> Self {
        Self {
            highlight: Color::Blue,
            critical: Color::Red,
            healthy: Color::Green,
            border: Color::DarkGray,
            chart: Color::Blue,
            header: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            selected: Style::default().bg(Color::LightBlue).add_modifier(Modifier::BOLD),
            tab_active: Style::default().fg(Color::Blue).add_modifier(Modifier::BOLD),
            tab_inactive: Style::default().fg(Color::DarkGray),
            border_type: BorderType::Rounded,
        }
    }

    /// Auto-detect based on terminal background
    pub fn auto_detect() -> Self {
        match terminal_light::luma() {
            Ok(luma) if luma > 0.5 => Self::light(),
            _ => Self::dark(),
        }
    }

    /// Style for a poller status indicator.
    pub fn status_style(&self, status: Status) -> Style {
        match status {
            Status::Idle => Style::default().add_modifier(Modifier::DIM),
            Status::Fetching => Style::default().fg(self.highlight),
            Status::Updated => Style::default().fg(self.healthy),
            Status::Unchanged => Style::default(),
            Status::Error => Style::default().fg(self.critical).add_modifier(Modifier::BOLD),
        }
    }
}
