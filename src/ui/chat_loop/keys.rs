use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::core::workspace::Focus;

/// What a key press asks the console to do. Mapping is pure so the
/// bindings can be tested without a terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    /// Forward to the input textarea.
    Input,
    None,
    Quit,
    ToggleGrid,
    NextTab,
    PrevTab,
    CloseTab,
    SelectTab(usize),
    ReorderLeft,
    ReorderRight,
    FocusSidebar,
    FocusPanel,
    FocusChat,
    CycleFocus,
    Submit,
    InsertNewline,
    TriggerAssistant,
    ScrollUp,
    ScrollDown,
    ScrollToEnd,
    SidebarUp,
    SidebarDown,
    SidebarOpen,
    SidebarNew,
    SidebarDelete,
    PanelUp,
    PanelDown,
    PanelAssign,
    PanelUnassign,
    PanelStopTool,
}

pub fn map_key(focus: Focus, key: KeyEvent) -> KeyAction {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let alt = key.modifiers.contains(KeyModifiers::ALT);

    // Global bindings first; they win in every focus.
    match key.code {
        KeyCode::Char('c') if ctrl => return KeyAction::Quit,
        KeyCode::Char('g') if ctrl => return KeyAction::ToggleGrid,
        KeyCode::Char('n') if ctrl => return KeyAction::NextTab,
        KeyCode::Char('p') if ctrl => return KeyAction::PrevTab,
        KeyCode::Char('w') if ctrl => return KeyAction::CloseTab,
        KeyCode::Char('e') if ctrl => return KeyAction::FocusSidebar,
        KeyCode::Char('t') if ctrl => return KeyAction::FocusPanel,
        KeyCode::Char('r') if ctrl => return KeyAction::TriggerAssistant,
        KeyCode::Left if alt => return KeyAction::ReorderLeft,
        KeyCode::Right if alt => return KeyAction::ReorderRight,
        KeyCode::Char(digit @ '1'..='9') if alt => {
            return KeyAction::SelectTab(digit as usize - '1' as usize)
        }
        KeyCode::Esc => return KeyAction::FocusChat,
        KeyCode::Tab => return KeyAction::CycleFocus,
        _ => {}
    }

    match focus {
        Focus::Sidebar => match key.code {
            KeyCode::Up | KeyCode::Char('k') => KeyAction::SidebarUp,
            KeyCode::Down | KeyCode::Char('j') => KeyAction::SidebarDown,
            KeyCode::Enter => KeyAction::SidebarOpen,
            KeyCode::Char('n') => KeyAction::SidebarNew,
            KeyCode::Char('d') => KeyAction::SidebarDelete,
            _ => KeyAction::None,
        },
        Focus::Panel => match key.code {
            KeyCode::Up | KeyCode::Char('k') => KeyAction::PanelUp,
            KeyCode::Down | KeyCode::Char('j') => KeyAction::PanelDown,
            KeyCode::Enter => KeyAction::PanelAssign,
            KeyCode::Char('u') => KeyAction::PanelUnassign,
            KeyCode::Char('s') => KeyAction::PanelStopTool,
            _ => KeyAction::None,
        },
        Focus::Chat => match key.code {
            KeyCode::Enter if alt => KeyAction::InsertNewline,
            KeyCode::Enter => KeyAction::Submit,
            KeyCode::PageUp => KeyAction::ScrollUp,
            KeyCode::PageDown => KeyAction::ScrollDown,
            KeyCode::End if ctrl => KeyAction::ScrollToEnd,
            _ => KeyAction::Input,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn ctrl_c_quits_in_every_focus() {
        for focus in [Focus::Chat, Focus::Sidebar, Focus::Panel] {
            assert_eq!(
                map_key(focus, key(KeyCode::Char('c'), KeyModifiers::CONTROL)),
                KeyAction::Quit
            );
        }
    }

    #[test]
    fn plain_typing_goes_to_the_input() {
        assert_eq!(
            map_key(Focus::Chat, key(KeyCode::Char('h'), KeyModifiers::NONE)),
            KeyAction::Input
        );
    }

    #[test]
    fn enter_submits_but_alt_enter_inserts_newline() {
        assert_eq!(
            map_key(Focus::Chat, key(KeyCode::Enter, KeyModifiers::NONE)),
            KeyAction::Submit
        );
        assert_eq!(
            map_key(Focus::Chat, key(KeyCode::Enter, KeyModifiers::ALT)),
            KeyAction::InsertNewline
        );
    }

    #[test]
    fn sidebar_has_its_own_bindings() {
        assert_eq!(
            map_key(Focus::Sidebar, key(KeyCode::Enter, KeyModifiers::NONE)),
            KeyAction::SidebarOpen
        );
        assert_eq!(
            map_key(Focus::Sidebar, key(KeyCode::Char('n'), KeyModifiers::NONE)),
            KeyAction::SidebarNew
        );
    }

    #[test]
    fn alt_digits_jump_to_tab_positions() {
        assert_eq!(
            map_key(Focus::Chat, key(KeyCode::Char('3'), KeyModifiers::ALT)),
            KeyAction::SelectTab(2)
        );
    }

    #[test]
    fn alt_arrows_reorder_tabs() {
        assert_eq!(
            map_key(Focus::Chat, key(KeyCode::Left, KeyModifiers::ALT)),
            KeyAction::ReorderLeft
        );
        assert_eq!(
            map_key(Focus::Panel, key(KeyCode::Right, KeyModifiers::ALT)),
            KeyAction::ReorderRight
        );
    }

    #[test]
    fn tab_cycles_focus_in_every_region() {
        for focus in [Focus::Chat, Focus::Sidebar, Focus::Panel] {
            assert_eq!(
                map_key(focus, key(KeyCode::Tab, KeyModifiers::NONE)),
                KeyAction::CycleFocus
            );
        }
    }

    #[test]
    fn esc_returns_focus_to_the_chat() {
        assert_eq!(
            map_key(Focus::Panel, key(KeyCode::Esc, KeyModifiers::NONE)),
            KeyAction::FocusChat
        );
    }
}
