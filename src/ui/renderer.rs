use ratatui::layout::Rect;
use ratatui::style::Style;
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};
use ratatui::Frame;
use tui_textarea::TextArea;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::api::Chat;
use crate::core::message::{MessageRole, NoticeKind};
use crate::core::workspace::{ChatPane, Focus, PanelItem, ViewMode, Workspace};
use crate::ui::layout::{self, ConsoleLayout};
use crate::ui::theme::Theme;

const MAX_GRID_COLUMNS: u16 = 3;
const TAB_LABEL_WIDTH: usize = 16;

/// Draw one frame of the console. Takes the workspace mutably so each pane
/// can record the scroll bound of the frame it was rendered into.
pub fn draw(
    frame: &mut Frame<'_>,
    workspace: &mut Workspace,
    theme: &Theme,
    input: &TextArea<'_>,
    grid_columns: u16,
) {
    let area = frame.area();
    frame.render_widget(
        Block::default().style(Style::default().bg(theme.background_color)),
        area,
    );

    let ConsoleLayout {
        sidebar,
        center,
        panel,
    } = layout::three_pane(area);

    if let Some(sidebar) = sidebar {
        draw_sidebar(frame, workspace, theme, sidebar);
    }
    if let Some(panel) = panel {
        draw_panel(frame, workspace, theme, panel);
    }

    let input_height = (input.lines().len() as u16).clamp(1, 6) + 2;
    let (tab_bar, transcript, input_area) = layout::center_rows(center, input_height);

    draw_tab_bar(frame, workspace, theme, tab_bar);

    let chat_focused = workspace.focus == Focus::Chat;
    match workspace.view_mode {
        ViewMode::Tabbed => match workspace.active_pane_mut() {
            Some(pane) => draw_pane(frame, pane, theme, transcript, chat_focused),
            None => draw_empty_state(frame, theme, transcript),
        },
        ViewMode::Grid => {
            let ids: Vec<_> = workspace.open_ids().collect();
            if ids.is_empty() {
                draw_empty_state(frame, theme, transcript);
            } else {
                let columns = grid_columns.min(MAX_GRID_COLUMNS);
                let cells = layout::grid_cells(transcript, ids.len(), columns);
                let active_id = workspace.tabs.active();
                for (id, cell) in ids.iter().zip(cells) {
                    match workspace.pane_mut(*id) {
                        Some(pane) => {
                            let focused = chat_focused && active_id == Some(*id);
                            draw_pane(frame, pane, theme, cell, focused);
                        }
                        // Pane missing for an open tab: show a placeholder
                        // rather than tearing down the whole frame.
                        None => draw_missing_pane(frame, theme, cell, *id),
                    }
                }
            }
        }
    }

    draw_input(frame, workspace, theme, input, input_area);

    if let Some(toast) = &workspace.toast {
        draw_toast(frame, theme, area, toast);
    }
}

fn draw_sidebar(frame: &mut Frame<'_>, workspace: &Workspace, theme: &Theme, area: Rect) {
    let border_style = if workspace.focus == Focus::Sidebar {
        theme.focus_border_style
    } else {
        theme.border_style
    };
    let items: Vec<ListItem<'_>> = workspace
        .chats
        .iter()
        .map(|chat| ListItem::new(sidebar_line(workspace, chat, theme)))
        .collect();
    let mut state = ListState::default();
    if !workspace.chats.is_empty() {
        state.select(Some(workspace.sidebar_selected.min(workspace.chats.len() - 1)));
    }
    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled("Chats", theme.title_style)),
        )
        .highlight_style(theme.sidebar_selected_style);
    frame.render_stateful_widget(list, area, &mut state);
}

fn sidebar_line<'a>(workspace: &Workspace, chat: &'a Chat, theme: &Theme) -> Line<'a> {
    let mut spans = vec![Span::raw(chat.display_name())];
    if workspace.tabs.contains(chat.id) {
        spans.push(Span::styled(" •", theme.tab_active_style));
    }
    if let Some(counters) = workspace.activity.for_chat(chat.id) {
        let total = counters.total();
        if total > 0 {
            spans.push(Span::styled(format!(" ({total})"), theme.badge_style));
        }
    }
    Line::from(spans)
}

fn draw_tab_bar(frame: &mut Frame<'_>, workspace: &Workspace, theme: &Theme, area: Rect) {
    let mut spans: Vec<Span<'_>> = Vec::new();
    for &id in workspace.tabs.order() {
        let active = workspace.tabs.active() == Some(id);
        let name = workspace
            .pane(id)
            .map(|pane| pane.chat.display_name())
            .or_else(|| workspace.catalog_chat(id).map(Chat::display_name))
            .unwrap_or_else(|| format!("Chat {id}"));
        let label = truncate_label(&name, TAB_LABEL_WIDTH);
        let style = if active {
            theme.tab_active_style
        } else {
            theme.tab_inactive_style
        };
        spans.push(Span::styled(format!(" {label} "), style));
        if workspace.pane(id).is_some_and(|pane| pane.busy) {
            spans.push(Span::styled("⟳ ", theme.tab_busy_style));
        }
        if let Some(counters) = workspace.activity.for_chat(id) {
            let total = counters.total();
            if total > 0 {
                spans.push(Span::styled(format!("{total} "), theme.badge_style));
            }
        }
        spans.push(Span::styled("│", theme.border_style));
    }
    if workspace.view_mode == ViewMode::Grid {
        spans.push(Span::styled(" [grid]", theme.title_style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn truncate_label(name: &str, max_width: usize) -> String {
    if name.width() <= max_width {
        return name.to_string();
    }
    let mut out = String::new();
    let mut width = 0;
    for ch in name.chars() {
        let w = ch.width().unwrap_or(0);
        if width + w > max_width.saturating_sub(1) {
            break;
        }
        width += w;
        out.push(ch);
    }
    out.push('…');
    out
}

fn draw_pane(
    frame: &mut Frame<'_>,
    pane: &mut ChatPane,
    theme: &Theme,
    area: Rect,
    focused: bool,
) {
    let border_style = if focused {
        theme.focus_border_style
    } else {
        theme.border_style
    };
    let mut title = pane.chat.display_name();
    if pane.busy {
        title.push_str(" ⟳");
    }
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(title, theme.title_style));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let mut lines: Vec<Line<'_>> = Vec::new();
    for message in &pane.messages {
        lines.extend(message_lines(message, theme));
    }
    if let Some(preview) = &pane.preview {
        lines.push(Line::from(Span::styled(
            format!("you (sending): {preview}"),
            theme.preview_style,
        )));
    }
    for notice in &pane.notices {
        let style = match notice.kind {
            NoticeKind::Info => theme.notice_info_style,
            NoticeKind::Warning => theme.notice_warning_style,
            NoticeKind::Error => theme.notice_error_style,
        };
        for line in notice.text.lines() {
            lines.push(Line::from(Span::styled(line.to_string(), style)));
        }
    }
    if let Some(error) = &pane.error {
        lines.push(Line::from(Span::styled(
            format!("✗ {error}"),
            theme.notice_error_style,
        )));
    }

    let (scroll, max_scroll) = scroll_for(pane, lines.len(), inner);
    frame.render_widget(
        Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((scroll, 0)),
        inner,
    );
    pane.last_max_scroll = max_scroll;
}

fn message_lines<'a>(message: &'a crate::api::Message, theme: &Theme) -> Vec<Line<'a>> {
    let (prefix, style) = match message.role {
        MessageRole::User => ("you: ", theme.user_text_style),
        MessageRole::Assistant => ("", theme.assistant_text_style),
        MessageRole::System => ("[system] ", theme.system_text_style),
        MessageRole::Tool => ("[tool] ", theme.tool_text_style),
    };
    let mut lines = Vec::new();
    for (index, text) in message.content.lines().enumerate() {
        if index == 0 && !prefix.is_empty() {
            let prefix_style = if message.role == MessageRole::User {
                theme.user_prefix_style
            } else {
                style
            };
            lines.push(Line::from(vec![
                Span::styled(prefix, prefix_style),
                Span::styled(text, style),
            ]));
        } else {
            lines.push(Line::from(Span::styled(text, style)));
        }
    }
    if message.content.is_empty() {
        lines.push(Line::from(Span::styled(prefix, style)));
    }
    lines
}

/// Pin to the bottom while auto-scroll is on; otherwise clamp the manual
/// offset so scrolling past either end is impossible. Returns the applied
/// scroll and the bottom bound.
fn scroll_for(pane: &ChatPane, line_count: usize, inner: Rect) -> (u16, u16) {
    let visible = inner.height.max(1) as usize;
    let max_scroll = line_count.saturating_sub(visible) as u16;
    let scroll = if pane.auto_scroll {
        max_scroll
    } else {
        pane.scroll_offset.min(max_scroll)
    };
    (scroll, max_scroll)
}

fn draw_empty_state(frame: &mut Frame<'_>, theme: &Theme, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(vec![
            Line::from(""),
            Line::from(Span::styled(
                "No chat open. Press Ctrl+E for the sidebar, or /new to start one.",
                theme.system_text_style,
            )),
        ])
        .wrap(Wrap { trim: false }),
        inner,
    );
}

fn draw_missing_pane(frame: &mut Frame<'_>, theme: &Theme, area: Rect, id: crate::api::ChatId) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(theme.border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Paragraph::new(Span::styled(
            format!("Chat {id} unavailable"),
            theme.notice_warning_style,
        )),
        inner,
    );
}

fn draw_panel(frame: &mut Frame<'_>, workspace: &Workspace, theme: &Theme, area: Rect) {
    let border_style = if workspace.focus == Focus::Panel {
        theme.focus_border_style
    } else {
        theme.border_style
    };
    let active_chat = workspace.active_pane().map(|pane| &pane.chat);

    let mut items: Vec<ListItem<'_>> = Vec::new();
    items.push(ListItem::new(Span::styled("Tools", theme.title_style)));
    for (index, tool) in workspace.tools.iter().enumerate() {
        let selected = workspace.panel_selected == Some(PanelItem::Tool(index));
        let assigned = active_chat.is_some_and(|chat| chat.active_tool_id == Some(tool.id));
        let stop = active_chat.is_some_and(|chat| chat.stop_tool_id == Some(tool.id));
        let auto = active_chat.is_some_and(|chat| chat.auto_tool_ids.contains(&tool.id));
        let mut label = format!(" {}", tool.display_name());
        if assigned {
            label.push_str(" ✓");
        }
        if stop {
            label.push_str(" ■");
        }
        if auto {
            label.push_str(" a");
        }
        let style = if selected {
            theme.sidebar_selected_style
        } else if assigned || stop {
            theme.panel_assigned_style
        } else {
            Style::default()
        };
        items.push(ListItem::new(Span::styled(label, style)));
    }
    items.push(ListItem::new(Span::styled("Prompts", theme.title_style)));
    for (index, prompt) in workspace.prompts.iter().enumerate() {
        let selected = workspace.panel_selected == Some(PanelItem::Prompt(index));
        let assigned = active_chat.is_some_and(|chat| chat.system_prompt_id == Some(prompt.id));
        let mut label = format!(" {}", prompt.name);
        if assigned {
            label.push_str(" ✓");
        }
        let style = if selected {
            theme.sidebar_selected_style
        } else if assigned {
            theme.panel_assigned_style
        } else {
            Style::default()
        };
        items.push(ListItem::new(Span::styled(label, style)));
    }

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(Span::styled("Panel", theme.title_style)),
    );
    frame.render_widget(list, area);
}

fn draw_input(
    frame: &mut Frame<'_>,
    workspace: &Workspace,
    theme: &Theme,
    input: &TextArea<'_>,
    area: Rect,
) {
    let border_style = if workspace.focus == Focus::Chat {
        theme.focus_border_style
    } else {
        theme.border_style
    };
    let title = match workspace.tabs.active() {
        Some(_) => "Message (Enter to send, /help for commands)",
        None => "Message (open a chat first)",
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(Span::styled(title, theme.title_style));
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(input, inner);
}

fn draw_toast(frame: &mut Frame<'_>, theme: &Theme, area: Rect, toast: &str) {
    let width = (toast.width() as u16 + 4).min(area.width);
    let rect = Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y,
        width,
        height: 1,
    };
    frame.render_widget(Clear, rect);
    frame.render_widget(
        Paragraph::new(Span::styled(format!("  {toast}  "), theme.toast_style)),
        rect,
    );
}
