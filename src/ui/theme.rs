use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone)]
pub struct Theme {
    pub background_color: Color,
    // Chat message styles
    pub user_prefix_style: Style,
    pub user_text_style: Style,
    pub assistant_text_style: Style,
    pub system_text_style: Style,
    pub tool_text_style: Style,
    // Console-authored text
    pub notice_info_style: Style,
    pub notice_warning_style: Style,
    pub notice_error_style: Style,
    pub preview_style: Style,
    // Chrome
    pub title_style: Style,
    pub tab_active_style: Style,
    pub tab_inactive_style: Style,
    pub tab_busy_style: Style,
    pub badge_style: Style,
    pub sidebar_selected_style: Style,
    pub panel_assigned_style: Style,
    pub border_style: Style,
    pub focus_border_style: Style,
    pub toast_style: Style,
    // Input area
    pub input_text_style: Style,
    pub input_cursor_style: Style,
}

impl Theme {
    pub fn dark_default() -> Self {
        Theme {
            background_color: Color::Black,
            user_prefix_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Cyan),
            assistant_text_style: Style::default().fg(Color::White),
            system_text_style: Style::default().fg(Color::DarkGray),
            tool_text_style: Style::default().fg(Color::Yellow),
            notice_info_style: Style::default().fg(Color::Green),
            notice_warning_style: Style::default().fg(Color::Yellow),
            notice_error_style: Style::default().fg(Color::Red),
            preview_style: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::DIM),
            title_style: Style::default().fg(Color::Gray),
            tab_active_style: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            tab_inactive_style: Style::default().fg(Color::DarkGray),
            tab_busy_style: Style::default().fg(Color::Yellow),
            badge_style: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            sidebar_selected_style: Style::default().add_modifier(Modifier::REVERSED),
            panel_assigned_style: Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
            border_style: Style::default().fg(Color::Gray),
            focus_border_style: Style::default().fg(Color::Cyan),
            toast_style: Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow),
            input_text_style: Style::default().fg(Color::White),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    pub fn light() -> Self {
        Theme {
            background_color: Color::White,
            user_prefix_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::BOLD),
            user_text_style: Style::default().fg(Color::Blue),
            assistant_text_style: Style::default().fg(Color::Black),
            system_text_style: Style::default().fg(Color::Gray),
            tool_text_style: Style::default().fg(Color::Rgb(160, 110, 0)),
            notice_info_style: Style::default().fg(Color::Rgb(0, 120, 0)),
            notice_warning_style: Style::default().fg(Color::Rgb(160, 110, 0)),
            notice_error_style: Style::default().fg(Color::Red),
            preview_style: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::DIM),
            title_style: Style::default().fg(Color::DarkGray),
            tab_active_style: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            tab_inactive_style: Style::default().fg(Color::Gray),
            tab_busy_style: Style::default().fg(Color::Rgb(160, 110, 0)),
            badge_style: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            sidebar_selected_style: Style::default().add_modifier(Modifier::REVERSED),
            panel_assigned_style: Style::default()
                .fg(Color::Rgb(0, 120, 0))
                .add_modifier(Modifier::BOLD),
            border_style: Style::default().fg(Color::Black),
            focus_border_style: Style::default().fg(Color::Blue),
            toast_style: Style::default()
                .fg(Color::White)
                .bg(Color::Rgb(160, 110, 0)),
            input_text_style: Style::default().fg(Color::Black),
            input_cursor_style: Style::default().add_modifier(Modifier::REVERSED),
        }
    }

    /// Resolve a theme by its config name, falling back to dark.
    pub fn from_name(name: &str) -> Self {
        match name {
            "light" => Self::light(),
            _ => Self::dark_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_names_fall_back_to_dark() {
        let theme = Theme::from_name("mauve");
        assert_eq!(theme.background_color, Color::Black);
    }

    #[test]
    fn light_theme_resolves() {
        let theme = Theme::from_name("light");
        assert_eq!(theme.background_color, Color::White);
    }
}
