use ratatui::style::{Color, Style};

/// Color theme for the checklist.
///
/// All text and UI chrome uses the terminal's default foreground color (Color::Reset).
/// Only functional signals (done marker, errors) get color.
pub struct Theme;

impl Theme {
    // Base — everything defaults to the terminal's own foreground
    pub const FG: Color = Color::Reset;
    pub const DIM: Color = Color::DarkGray;

    // List
    pub const LIST_BORDER: Color = Color::Reset;

    // Functional signal colors
    pub const DONE_MARKER: Color = Color::Green;

    // Status bar
    pub const STATUS_ERROR: Color = Color::Red;

    pub fn dim_style() -> Style {
        Style::default().fg(Self::DIM)
    }

    pub fn status_style() -> Style {
        Style::default().fg(Self::FG)
    }
}
