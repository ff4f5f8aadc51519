use ratatui::style::{Color, Modifier, Style};

/// Theme configuration for the terminal front end
#[derive(Clone, Debug)]
pub struct Theme {
    /// Foreground (text) color for the status bar
    pub status_bar_fg: Color,

    /// Background color for the status bar
    pub status_bar_bg: Color,

    /// Color for the current file name in the status bar
    pub filename_color: Color,

    /// Foreground color for active selection
    pub selection_fg: Color,

    /// Background color for active selection
    pub selection_bg: Color,

    /// Color for detected entities (phone numbers, URLs, e-mail addresses)
    pub entity_color: Color,

    /// Foreground color for image and placeholder cells
    pub placeholder_fg: Color,

    /// Background color for image and placeholder cells
    pub placeholder_bg: Color,

    /// Foreground color for the scrollbar knob
    pub scrollbar_knob_fg: Color,

    /// Foreground color for the scrollbar track
    pub scrollbar_track_fg: Color,

    /// Foreground color for menu items
    pub menu_fg: Color,

    /// Background color for menu
    pub menu_bg: Color,

    /// Foreground color for disabled menu items
    pub menu_disabled_fg: Color,

    /// Foreground color for selected menu entry
    pub menu_selected_fg: Color,

    /// Background color for selected menu entry
    pub menu_selected_bg: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            status_bar_fg: Color::White,
            status_bar_bg: Color::Blue,
            filename_color: Color::LightYellow,
            selection_fg: Color::White,
            selection_bg: Color::LightBlue,
            entity_color: Color::Blue,
            placeholder_fg: Color::Black,
            placeholder_bg: Color::Gray,
            scrollbar_knob_fg: Color::Reset,
            scrollbar_track_fg: Color::DarkGray,
            menu_fg: Color::White,
            menu_bg: Color::Black,
            menu_disabled_fg: Color::DarkGray,
            menu_selected_fg: Color::Black,
            menu_selected_bg: Color::White,
        }
    }
}

impl Theme {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status_bar_style(&self) -> Style {
        Style::default()
            .fg(self.status_bar_fg)
            .bg(self.status_bar_bg)
    }

    pub fn filename_style(&self) -> Style {
        Style::default().fg(self.filename_color)
    }

    pub fn selection_style(&self) -> Style {
        Style::default().fg(self.selection_fg).bg(self.selection_bg)
    }

    /// Detected entities are underlined like links
    pub fn entity_style(&self) -> Style {
        Style::default()
            .fg(self.entity_color)
            .add_modifier(Modifier::UNDERLINED)
    }

    pub fn placeholder_style(&self) -> Style {
        Style::default()
            .fg(self.placeholder_fg)
            .bg(self.placeholder_bg)
    }

    pub fn scrollbar_knob_style(&self) -> Style {
        Style::default().fg(self.scrollbar_knob_fg)
    }

    pub fn scrollbar_track_style(&self) -> Style {
        Style::default().fg(self.scrollbar_track_fg)
    }

    pub fn menu_style(&self) -> Style {
        Style::default().fg(self.menu_fg).bg(self.menu_bg)
    }

    pub fn menu_disabled_style(&self) -> Style {
        Style::default().fg(self.menu_disabled_fg)
    }

    pub fn menu_selected_style(&self) -> Style {
        Style::default()
            .fg(self.menu_selected_fg)
            .bg(self.menu_selected_bg)
    }
}
