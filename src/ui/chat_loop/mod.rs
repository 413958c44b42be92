//! Main console event loop.
//!
//! One task reads terminal events, every remote call runs in its own spawned
//! task, and results come back over a single channel as [`UiEvent`]s. The
//! loop applies them to the workspace and redraws at a capped rate.

mod keys;

use std::error::Error;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join3;
use ratatui::backend::CrosstermBackend;
use ratatui::crossterm::{
    event::{self, DisableBracketedPaste, EnableBracketedPaste, Event, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::style::Style;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tui_textarea::TextArea;

use self::keys::{map_key, KeyAction};
use crate::api::client::ConversationApi;
use crate::api::{Chat, ChatId, LlmConfig, ResearchResult, SystemPrompt, Tool};
use crate::commands::{process_input, CommandEffect, CommandResult};
use crate::core::config::Config;
use crate::core::message::Notice;
use crate::core::workspace::{Focus, PanelItem, Workspace};
use crate::ui::renderer;
use crate::ui::theme::Theme;

const FRAME_DURATION: Duration = Duration::from_millis(33);
const EVENT_WAIT: Duration = Duration::from_millis(50);

/// Result of a remote call, delivered back to the loop.
#[derive(Debug)]
pub enum ApiEvent {
    ChatsListed(Result<Vec<Chat>, String>),
    ChatFetched {
        id: ChatId,
        result: Result<Chat, String>,
    },
    ChatCreated(Result<Chat, String>),
    SendFinished {
        id: ChatId,
        result: Result<Chat, String>,
    },
    Polled {
        id: ChatId,
        result: Result<Chat, String>,
    },
    ChatUpdated {
        id: ChatId,
        config_change: bool,
        result: Result<Chat, String>,
    },
    ChatDeleted {
        id: ChatId,
        result: Result<(), String>,
    },
    HistoryCleared {
        id: ChatId,
        result: Result<Chat, String>,
    },
    ConfigFetched {
        id: ChatId,
        result: Result<LlmConfig, String>,
    },
    ConfigUpdated {
        id: ChatId,
        result: Result<LlmConfig, String>,
    },
    ToolsListed(Result<Vec<Tool>, String>),
    PromptsListed(Result<Vec<SystemPrompt>, String>),
    /// Ok carries the toast text for the completed mutation.
    ToolMutated(Result<String, String>),
    PromptMutated(Result<String, String>),
    SearchFinished(Result<ResearchResult, String>),
    HistoryFetched(Result<Vec<ResearchResult>, String>),
}

#[derive(Debug)]
pub enum UiEvent {
    Crossterm(Event),
    Api(ApiEvent),
}

/// A fetch the loop should run after applying an event, e.g. re-reading the
/// authoritative chat after a failed assignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    RefetchChat(ChatId),
    RefetchTools,
    RefetchPrompts,
}

type Api = Arc<dyn ConversationApi>;
type EventTx = mpsc::UnboundedSender<UiEvent>;

pub async fn run_console(api: Api, config: &Config) -> Result<(), Box<dyn Error>> {
    let theme = Theme::from_name(config.theme());
    let grid_columns = config.grid_columns();
    let mut workspace = Workspace::new(Duration::from_millis(config.poll_interval_ms()));

    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<UiEvent>();

    spawn_effect(api.clone(), CommandEffect::RefreshAll, event_tx.clone());

    // Terminal setup only after the channel plumbing is in place.
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let shutdown = CancellationToken::new();
    let reader_handle = {
        let event_tx = event_tx.clone();
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            while !shutdown.is_cancelled() {
                if let Ok(true) = event::poll(Duration::from_millis(10)) {
                    match event::read() {
                        Ok(ev) => {
                            if event_tx.send(UiEvent::Crossterm(ev)).is_err() {
                                break;
                            }
                        }
                        Err(_) => continue,
                    }
                } else {
                    tokio::task::yield_now().await;
                }
            }
        })
    };

    let mut input = new_input(&theme);
    let mut last_draw = Instant::now() - FRAME_DURATION;
    let mut request_redraw = true;

    let result = loop {
        if workspace.exit_requested {
            break Ok(());
        }

        let now = Instant::now();
        for id in workspace.due_polls(now) {
            spawn_poll(api.clone(), id, event_tx.clone());
        }

        if request_redraw && last_draw.elapsed() >= FRAME_DURATION {
            terminal.draw(|frame| {
                renderer::draw(frame, &mut workspace, &theme, &input, grid_columns)
            })?;
            last_draw = Instant::now();
            request_redraw = false;
        }

        match tokio::time::timeout(EVENT_WAIT, event_rx.recv()).await {
            Ok(Some(UiEvent::Crossterm(event))) => {
                match event {
                    Event::Key(key) if key.kind == KeyEventKind::Press => {
                        workspace.dismiss_toast();
                        handle_key(&api, &event_tx, &mut workspace, &mut input, &theme, key);
                    }
                    Event::Paste(text) => {
                        input.insert_str(&text);
                    }
                    _ => {}
                }
                request_redraw = true;
            }
            Ok(Some(UiEvent::Api(api_event))) => {
                for followup in apply_api_event(&mut workspace, api_event, Instant::now()) {
                    spawn_followup(api.clone(), followup, event_tx.clone());
                }
                request_redraw = true;
            }
            Ok(None) => break Ok(()),
            Err(_) => {
                // Timed out waiting; loop again so due polls fire on time.
            }
        }
    };

    shutdown.cancel();
    let _ = reader_handle.await;
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableBracketedPaste
    )?;
    terminal.show_cursor()?;
    result
}

fn new_input(theme: &Theme) -> TextArea<'static> {
    let mut input = TextArea::default();
    input.set_style(theme.input_text_style);
    input.set_cursor_style(theme.input_cursor_style);
    input.set_cursor_line_style(Style::default());
    input
}

fn handle_key(
    api: &Api,
    event_tx: &EventTx,
    workspace: &mut Workspace,
    input: &mut TextArea<'static>,
    theme: &Theme,
    key: KeyEvent,
) {
    match map_key(workspace.focus, key) {
        KeyAction::Input => {
            input.input(key);
        }
        KeyAction::None => {}
        KeyAction::Quit => workspace.exit_requested = true,
        KeyAction::ToggleGrid => workspace.toggle_view_mode(),
        KeyAction::NextTab => workspace.tabs.select_next(),
        KeyAction::PrevTab => workspace.tabs.select_prev(),
        KeyAction::CloseTab => {
            if let Some(id) = workspace.tabs.active() {
                workspace.close_tab(id);
            }
        }
        KeyAction::SelectTab(index) => {
            if let Some(&id) = workspace.tabs.order().get(index) {
                workspace.tabs.select(id);
            }
        }
        KeyAction::ReorderLeft => {
            if let Some(pos) = workspace.tabs.active().and_then(|id| workspace.tabs.position(id)) {
                if pos > 0 {
                    workspace.reorder_tabs(pos, pos - 1);
                }
            }
        }
        KeyAction::ReorderRight => {
            if let Some(pos) = workspace.tabs.active().and_then(|id| workspace.tabs.position(id)) {
                workspace.reorder_tabs(pos, pos + 1);
            }
        }
        KeyAction::FocusSidebar => workspace.focus = Focus::Sidebar,
        KeyAction::FocusPanel => workspace.focus = Focus::Panel,
        KeyAction::FocusChat => workspace.focus = Focus::Chat,
        KeyAction::CycleFocus => {
            workspace.focus = match workspace.focus {
                Focus::Sidebar => Focus::Chat,
                Focus::Chat => Focus::Panel,
                Focus::Panel => Focus::Sidebar,
            };
        }
        KeyAction::Submit => {
            let text = input.lines().join("\n");
            if text.trim().is_empty() {
                return;
            }
            *input = new_input(theme);
            let result = process_input(workspace, &text);
            dispatch(api, event_tx, workspace, result);
        }
        KeyAction::InsertNewline => {
            input.insert_newline();
        }
        KeyAction::TriggerAssistant => {
            if let Some(id) = workspace.tabs.active() {
                if workspace.begin_send(id, None) {
                    let api = api.clone();
                    let tx = event_tx.clone();
                    tokio::spawn(async move {
                        let result = api
                            .trigger_assistant(id)
                            .await
                            .map_err(|err| err.to_string());
                        let _ = tx.send(UiEvent::Api(ApiEvent::SendFinished { id, result }));
                    });
                }
            }
        }
        KeyAction::ScrollUp => {
            if let Some(pane) = workspace.active_pane_mut() {
                if pane.auto_scroll {
                    // Leave the pin starting from the rendered bottom.
                    pane.auto_scroll = false;
                    pane.scroll_offset = pane.last_max_scroll;
                }
                pane.scroll_offset = pane.scroll_offset.saturating_sub(5);
            }
        }
        KeyAction::ScrollDown => {
            if let Some(pane) = workspace.active_pane_mut() {
                pane.scroll_offset = pane.scroll_offset.saturating_add(5);
                if pane.scroll_offset >= pane.last_max_scroll {
                    pane.auto_scroll = true;
                }
            }
        }
        KeyAction::ScrollToEnd => {
            if let Some(pane) = workspace.active_pane_mut() {
                pane.auto_scroll = true;
            }
        }
        KeyAction::SidebarUp => {
            workspace.sidebar_selected = workspace.sidebar_selected.saturating_sub(1);
        }
        KeyAction::SidebarDown => {
            if workspace.sidebar_selected + 1 < workspace.chats.len() {
                workspace.sidebar_selected += 1;
            }
        }
        KeyAction::SidebarOpen => {
            if let Some(chat) = workspace.chats.get(workspace.sidebar_selected).cloned() {
                let id = chat.id;
                workspace.open_tab(chat);
                // The listing may carry a stale transcript; sync from the
                // authoritative record.
                spawn_followup(api.clone(), Followup::RefetchChat(id), event_tx.clone());
            }
        }
        KeyAction::SidebarNew => {
            dispatch(
                api,
                event_tx,
                workspace,
                CommandResult::Effect(CommandEffect::CreateChat { name: None }),
            );
        }
        KeyAction::SidebarDelete => {
            if let Some(chat) = workspace.chats.get(workspace.sidebar_selected) {
                let id = chat.id;
                dispatch(
                    api,
                    event_tx,
                    workspace,
                    CommandResult::Effect(CommandEffect::DeleteChat { id }),
                );
            }
        }
        KeyAction::PanelUp => workspace.panel_step(false),
        KeyAction::PanelDown => workspace.panel_step(true),
        KeyAction::PanelAssign => {
            let Some(chat) = workspace.tabs.active() else {
                workspace.show_toast("Open a chat before assigning.");
                return;
            };
            let effect = match workspace.panel_selected {
                Some(PanelItem::Tool(_)) => workspace.selected_tool().map(|tool| {
                    CommandEffect::AssignTool {
                        id: chat,
                        tool_id: tool.id,
                    }
                }),
                Some(PanelItem::Prompt(_)) => workspace.selected_prompt().map(|prompt| {
                    CommandEffect::AssignPrompt {
                        id: chat,
                        prompt_id: prompt.id,
                    }
                }),
                None => None,
            };
            if let Some(effect) = effect {
                dispatch(api, event_tx, workspace, CommandResult::Effect(effect));
            }
        }
        KeyAction::PanelUnassign => {
            let Some(chat) = workspace.tabs.active() else {
                return;
            };
            let effect = match workspace.panel_selected {
                Some(PanelItem::Tool(_)) => Some(CommandEffect::UnassignTool { id: chat }),
                Some(PanelItem::Prompt(_)) => Some(CommandEffect::UnassignPrompt { id: chat }),
                None => None,
            };
            if let Some(effect) = effect {
                dispatch(api, event_tx, workspace, CommandResult::Effect(effect));
            }
        }
        KeyAction::PanelStopTool => {
            let Some(chat) = workspace.tabs.active() else {
                return;
            };
            if let Some(tool) = workspace.selected_tool() {
                let effect = CommandEffect::SetStopTool {
                    id: chat,
                    tool_id: tool.id,
                };
                dispatch(api, event_tx, workspace, CommandResult::Effect(effect));
            }
        }
    }
}

fn dispatch(api: &Api, event_tx: &EventTx, workspace: &mut Workspace, result: CommandResult) {
    match result {
        CommandResult::Continue => {}
        CommandResult::SendAsMessage(text) => {
            let Some(id) = workspace.tabs.active() else {
                workspace.show_toast("Open a chat before sending.");
                return;
            };
            let trimmed = text.trim().to_string();
            if !workspace.begin_send(id, Some(&trimmed)) {
                workspace.show_toast("Chat is busy; wait for the current turn.");
                return;
            }
            let api = api.clone();
            let tx = event_tx.clone();
            tokio::spawn(async move {
                let result = api
                    .send_message(id, &trimmed)
                    .await
                    .map_err(|err| err.to_string());
                let _ = tx.send(UiEvent::Api(ApiEvent::SendFinished { id, result }));
            });
        }
        CommandResult::Notice(text) => notify(workspace, Notice::info(text)),
        CommandResult::Effect(effect) => spawn_effect(api.clone(), effect, event_tx.clone()),
    }
}

/// Show text in the active pane, falling back to a toast when no chat is
/// open.
fn notify(workspace: &mut Workspace, notice: Notice) {
    match workspace.active_pane_mut() {
        Some(pane) => pane.push_notice(notice),
        None => workspace.show_toast(notice.text),
    }
}

/// Show text in a specific pane. If that tab was closed before the result
/// arrived, the notice falls back to the active pane or toast instead of
/// being dropped.
fn notify_pane(workspace: &mut Workspace, id: ChatId, notice: Notice) {
    match workspace.pane_mut(id) {
        Some(pane) => pane.push_notice(notice),
        None => notify(workspace, notice),
    }
}

fn spawn_poll(api: Api, id: ChatId, tx: EventTx) {
    tokio::spawn(async move {
        let result = api.fetch_chat(id).await.map_err(|err| err.to_string());
        let _ = tx.send(UiEvent::Api(ApiEvent::Polled { id, result }));
    });
}

fn spawn_followup(api: Api, followup: Followup, tx: EventTx) {
    tokio::spawn(async move {
        let event = match followup {
            Followup::RefetchChat(id) => {
                let result = api.fetch_chat(id).await.map_err(|err| err.to_string());
                ApiEvent::ChatFetched { id, result }
            }
            Followup::RefetchTools => {
                ApiEvent::ToolsListed(api.list_tools().await.map_err(|err| err.to_string()))
            }
            Followup::RefetchPrompts => {
                ApiEvent::PromptsListed(api.list_prompts().await.map_err(|err| err.to_string()))
            }
        };
        let _ = tx.send(UiEvent::Api(event));
    });
}

pub(crate) fn spawn_effect(api: Api, effect: CommandEffect, tx: EventTx) {
    tokio::spawn(async move {
        run_effect(api, effect, tx).await;
    });
}

async fn run_effect(api: Api, effect: CommandEffect, tx: EventTx) {
    let send = |event: ApiEvent| {
        let _ = tx.send(UiEvent::Api(event));
    };
    match effect {
        CommandEffect::CreateChat { name } => {
            let result = match api.create_chat().await {
                Ok(chat) => match name {
                    Some(name) => api.rename_chat(chat.id, &name).await,
                    None => Ok(chat),
                },
                Err(err) => Err(err),
            };
            send(ApiEvent::ChatCreated(result.map_err(|err| err.to_string())));
        }
        CommandEffect::RenameChat { id, name } => {
            let result = api.rename_chat(id, &name).await.map_err(|err| err.to_string());
            send(ApiEvent::ChatUpdated {
                id,
                config_change: false,
                result,
            });
        }
        CommandEffect::ClearHistory { id } => {
            let result = api.clear_history(id).await.map_err(|err| err.to_string());
            send(ApiEvent::HistoryCleared { id, result });
        }
        CommandEffect::DeleteChat { id } => {
            let result = api.delete_chat(id).await.map_err(|err| err.to_string());
            send(ApiEvent::ChatDeleted { id, result });
        }
        CommandEffect::FetchConfig { id } => {
            let result = api.fetch_config(id).await.map_err(|err| err.to_string());
            send(ApiEvent::ConfigFetched { id, result });
        }
        CommandEffect::UpdateConfig { id, update } => {
            let result = api
                .update_config(id, &update)
                .await
                .map_err(|err| err.to_string());
            send(ApiEvent::ConfigUpdated { id, result });
        }
        CommandEffect::ToggleAutoRun { id } => {
            let result = match api.fetch_auto_run(id).await {
                Ok(current) => api.set_auto_run(id, !current).await,
                Err(err) => Err(err),
            };
            send(ApiEvent::ChatUpdated {
                id,
                config_change: true,
                result: result.map_err(|err| err.to_string()),
            });
        }
        CommandEffect::SetAutoRun { id, enabled } => {
            let result = api
                .set_auto_run(id, enabled)
                .await
                .map_err(|err| err.to_string());
            send(ApiEvent::ChatUpdated {
                id,
                config_change: true,
                result,
            });
        }
        CommandEffect::SetAutoTools { id, tool_ids } => {
            let result = api
                .set_auto_tools(id, &tool_ids)
                .await
                .map_err(|err| err.to_string());
            send(ApiEvent::ChatUpdated {
                id,
                config_change: true,
                result,
            });
        }
        CommandEffect::CreateTool { spec } => {
            let result = api
                .create_tool(&spec)
                .await
                .map(|tool| format!("Tool '{}' created.", tool.display_name()))
                .map_err(|err| err.to_string());
            send(ApiEvent::ToolMutated(result));
        }
        CommandEffect::UpdateTool { id, spec } => {
            let result = api
                .update_tool(id, &spec)
                .await
                .map(|tool| format!("Tool '{}' updated.", tool.display_name()))
                .map_err(|err| err.to_string());
            send(ApiEvent::ToolMutated(result));
        }
        CommandEffect::DeleteTool { id, callable } => {
            let result = api
                .delete_tool(id, callable)
                .await
                .map(|_| "Tool deleted.".to_string())
                .map_err(|err| err.to_string());
            send(ApiEvent::ToolMutated(result));
        }
        CommandEffect::AssignTool { id, tool_id } => {
            let result = api
                .assign_tool(id, tool_id)
                .await
                .map_err(|err| err.to_string());
            send(ApiEvent::ChatUpdated {
                id,
                config_change: true,
                result,
            });
        }
        CommandEffect::UnassignTool { id } => {
            let result = api.remove_tool(id).await.map_err(|err| err.to_string());
            send(ApiEvent::ChatUpdated {
                id,
                config_change: true,
                result,
            });
        }
        CommandEffect::SetStopTool { id, tool_id } => {
            let result = api
                .set_stop_tool(id, tool_id)
                .await
                .map_err(|err| err.to_string());
            send(ApiEvent::ChatUpdated {
                id,
                config_change: true,
                result,
            });
        }
        CommandEffect::RemoveStopTool { id } => {
            let result = api.remove_stop_tool(id).await.map_err(|err| err.to_string());
            send(ApiEvent::ChatUpdated {
                id,
                config_change: true,
                result,
            });
        }
        CommandEffect::CreatePrompt { create } => {
            let result = api
                .create_prompt(&create)
                .await
                .map(|prompt| format!("Prompt '{}' created.", prompt.name))
                .map_err(|err| err.to_string());
            send(ApiEvent::PromptMutated(result));
        }
        CommandEffect::DeletePrompt { id } => {
            let result = api
                .delete_prompt(id)
                .await
                .map(|_| "Prompt deleted.".to_string())
                .map_err(|err| err.to_string());
            send(ApiEvent::PromptMutated(result));
        }
        CommandEffect::AssignPrompt { id, prompt_id } => {
            let result = api
                .assign_prompt(id, prompt_id)
                .await
                .map_err(|err| err.to_string());
            send(ApiEvent::ChatUpdated {
                id,
                config_change: true,
                result,
            });
        }
        CommandEffect::UnassignPrompt { id } => {
            let result = api.remove_prompt(id).await.map_err(|err| err.to_string());
            send(ApiEvent::ChatUpdated {
                id,
                config_change: true,
                result,
            });
        }
        CommandEffect::Search { query } => {
            let result = api
                .research_search(&query)
                .await
                .map_err(|err| err.to_string());
            send(ApiEvent::SearchFinished(result));
        }
        CommandEffect::ResearchHistory => {
            let result = api
                .research_history()
                .await
                .map_err(|err| err.to_string());
            send(ApiEvent::HistoryFetched(result));
        }
        CommandEffect::RefreshAll => {
            let (chats, tools, prompts) =
                join3(api.list_chats(), api.list_tools(), api.list_prompts()).await;
            send(ApiEvent::ChatsListed(chats.map_err(|err| err.to_string())));
            send(ApiEvent::ToolsListed(tools.map_err(|err| err.to_string())));
            send(ApiEvent::PromptsListed(
                prompts.map_err(|err| err.to_string()),
            ));
        }
    }
}

fn apply_api_event(workspace: &mut Workspace, event: ApiEvent, now: Instant) -> Vec<Followup> {
    let mut followups = Vec::new();
    match event {
        ApiEvent::ChatsListed(Ok(chats)) => workspace.set_catalog(chats),
        ApiEvent::ChatsListed(Err(err)) => {
            workspace.show_toast(format!("Could not load chats: {err}"))
        }
        ApiEvent::ChatFetched { result: Ok(chat), .. } => workspace.chat_updated(chat),
        ApiEvent::ChatFetched { id, result: Err(err) } => {
            debug!(chat = id, error = %err, "chat fetch failed");
            workspace.show_toast(format!("Could not load chat {id}: {err}"));
        }
        ApiEvent::ChatCreated(Ok(chat)) => {
            workspace.chat_updated(chat.clone());
            workspace.open_tab(chat);
        }
        ApiEvent::ChatCreated(Err(err)) => {
            workspace.show_toast(format!("Could not create chat: {err}"))
        }
        ApiEvent::SendFinished { id, result } => workspace.finish_send(id, result, now),
        ApiEvent::Polled { id, result } => match result {
            Ok(chat) => {
                workspace.apply_refresh(chat, now);
            }
            Err(err) => {
                debug!(chat = id, error = %err, "poll failed");
            }
        },
        ApiEvent::ChatUpdated {
            id,
            config_change,
            result,
        } => match result {
            Ok(chat) => {
                workspace.chat_updated(chat);
                if config_change {
                    workspace.record_config_change(id);
                }
            }
            Err(err) => {
                notify(workspace, Notice::error(err));
                // The local view may now disagree with the server; re-read
                // the authoritative record.
                followups.push(Followup::RefetchChat(id));
            }
        },
        ApiEvent::ChatDeleted { id, result } => match result {
            Ok(()) => {
                workspace.chat_deleted(id);
                workspace.show_toast("Chat deleted.");
            }
            Err(err) => workspace.show_toast(format!("Could not delete chat: {err}")),
        },
        ApiEvent::HistoryCleared { id, result } => match result {
            Ok(chat) => workspace.history_cleared(chat),
            Err(err) => notify_pane(
                workspace,
                id,
                Notice::error(format!("Could not clear history: {err}")),
            ),
        },
        ApiEvent::ConfigFetched { id, result } => {
            let notice = match result {
                Ok(config) => Notice::info(format_config(&config)),
                Err(err) => Notice::error(format!("Could not load config: {err}")),
            };
            notify_pane(workspace, id, notice);
        }
        ApiEvent::ConfigUpdated { id, result } => match result {
            Ok(_) => {
                workspace.record_config_change(id);
                notify_pane(workspace, id, Notice::info("Config updated."));
            }
            Err(err) => notify_pane(
                workspace,
                id,
                Notice::error(format!("Config update failed: {err}")),
            ),
        },
        ApiEvent::ToolsListed(Ok(tools)) => workspace.set_tools(tools),
        ApiEvent::ToolsListed(Err(err)) => {
            workspace.show_toast(format!("Could not load tools: {err}"))
        }
        ApiEvent::PromptsListed(Ok(prompts)) => workspace.set_prompts(prompts),
        ApiEvent::PromptsListed(Err(err)) => {
            workspace.show_toast(format!("Could not load prompts: {err}"))
        }
        ApiEvent::ToolMutated(result) => match result {
            Ok(message) => {
                workspace.show_toast(message);
                followups.push(Followup::RefetchTools);
            }
            Err(err) => notify(workspace, Notice::error(err)),
        },
        ApiEvent::PromptMutated(result) => match result {
            Ok(message) => {
                workspace.show_toast(message);
                followups.push(Followup::RefetchPrompts);
            }
            Err(err) => notify(workspace, Notice::error(err)),
        },
        ApiEvent::SearchFinished(result) => {
            let notice = match result {
                Ok(research) => Notice::info(format_research(&research)),
                Err(err) => Notice::error(format!("Search failed: {err}")),
            };
            notify(workspace, notice);
        }
        ApiEvent::HistoryFetched(result) => {
            let notice = match result {
                Ok(history) if history.is_empty() => {
                    Notice::info("No research searches recorded.")
                }
                Ok(history) => {
                    let mut text = String::from("Research history:\n");
                    for entry in &history {
                        text.push_str(&format!(
                            "  {} ({} results)\n",
                            entry.query,
                            entry.results.len()
                        ));
                    }
                    Notice::info(text)
                }
                Err(err) => Notice::error(format!("Could not load history: {err}")),
            };
            notify(workspace, notice);
        }
    }
    followups
}

fn format_config(config: &LlmConfig) -> String {
    let mut text = String::from("Model config:\n");
    let mut line = |label: &str, value: Option<String>| {
        if let Some(value) = value {
            text.push_str(&format!("  {label}: {value}\n"));
        }
    };
    line("client", config.client.clone());
    line("model", config.model.clone());
    line("temperature", config.temperature.map(|v| v.to_string()));
    line("max_tokens", config.max_tokens.map(|v| v.to_string()));
    line("top_p", config.top_p.map(|v| v.to_string()));
    line(
        "frequency_penalty",
        config.frequency_penalty.map(|v| v.to_string()),
    );
    line(
        "presence_penalty",
        config.presence_penalty.map(|v| v.to_string()),
    );
    line(
        "response_format",
        config.response_format.map(|v| v.as_str().to_string()),
    );
    line("system_prompt", config.system_prompt.clone());
    text
}

fn format_research(research: &ResearchResult) -> String {
    let mut text = format!("Search: {}\n", research.query);
    if research.results.is_empty() {
        text.push_str("  no results\n");
    }
    for result in &research.results {
        text.push_str(&format!("  {} — {}\n", result.title, result.url));
        if let Some(summary) = result
            .summary
            .as_ref()
            .and_then(|summary| summary.summary.as_ref())
        {
            text.push_str(&format!("    {summary}\n"));
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{chat_with_history, test_chat, test_workspace, MockApi};
    use ratatui::crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn listing_errors_surface_as_toasts() {
        let mut ws = test_workspace();
        apply_api_event(
            &mut ws,
            ApiEvent::ChatsListed(Err("connection refused".into())),
            Instant::now(),
        );
        assert!(ws.toast.as_deref().unwrap().contains("connection refused"));
    }

    #[test]
    fn created_chat_is_opened_immediately() {
        let mut ws = test_workspace();
        apply_api_event(
            &mut ws,
            ApiEvent::ChatCreated(Ok(test_chat(4))),
            Instant::now(),
        );
        assert_eq!(ws.tabs.active(), Some(4));
        assert_eq!(ws.chats.len(), 1);
    }

    #[test]
    fn failed_update_requests_a_resync() {
        let mut ws = test_workspace();
        ws.open_tab(test_chat(2));
        let followups = apply_api_event(
            &mut ws,
            ApiEvent::ChatUpdated {
                id: 2,
                config_change: true,
                result: Err("409 conflict".into()),
            },
            Instant::now(),
        );
        assert_eq!(followups, vec![Followup::RefetchChat(2)]);
        assert_eq!(ws.pane(2).unwrap().notices.len(), 1);
    }

    #[test]
    fn successful_assignment_counts_as_config_change() {
        let mut ws = test_workspace();
        ws.open_tab(test_chat(2));
        let mut updated = test_chat(2);
        updated.active_tool_id = Some(9);
        apply_api_event(
            &mut ws,
            ApiEvent::ChatUpdated {
                id: 2,
                config_change: true,
                result: Ok(updated),
            },
            Instant::now(),
        );
        assert_eq!(ws.activity.for_chat(2).unwrap().config_changes, 1);
        assert_eq!(ws.pane(2).unwrap().chat.active_tool_id, Some(9));
    }

    #[test]
    fn pageup_scrolls_away_from_the_bottom() {
        let api: Api = Arc::new(MockApi::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let theme = Theme::dark_default();
        let mut input = new_input(&theme);
        let mut ws = test_workspace();
        ws.open_tab(test_chat(1));
        // As if the last frame rendered a 200-line transcript in 10 rows.
        ws.pane_mut(1).unwrap().last_max_scroll = 190;

        let pageup = KeyEvent::new(KeyCode::PageUp, KeyModifiers::NONE);
        handle_key(&api, &tx, &mut ws, &mut input, &theme, pageup);
        handle_key(&api, &tx, &mut ws, &mut input, &theme, pageup);

        let pane = ws.pane(1).unwrap();
        assert!(!pane.auto_scroll);
        assert_eq!(pane.scroll_offset, 180);
    }

    #[test]
    fn pagedown_repins_at_the_bottom() {
        let api: Api = Arc::new(MockApi::new());
        let (tx, _rx) = mpsc::unbounded_channel();
        let theme = Theme::dark_default();
        let mut input = new_input(&theme);
        let mut ws = test_workspace();
        ws.open_tab(test_chat(1));
        {
            let pane = ws.pane_mut(1).unwrap();
            pane.last_max_scroll = 190;
            pane.auto_scroll = false;
            pane.scroll_offset = 180;
        }

        let pagedown = KeyEvent::new(KeyCode::PageDown, KeyModifiers::NONE);
        handle_key(&api, &tx, &mut ws, &mut input, &theme, pagedown);
        assert!(!ws.pane(1).unwrap().auto_scroll);
        handle_key(&api, &tx, &mut ws, &mut input, &theme, pagedown);
        assert!(ws.pane(1).unwrap().auto_scroll);
    }

    #[test]
    fn config_errors_fall_back_to_a_toast_when_the_pane_is_gone() {
        let mut ws = test_workspace();
        apply_api_event(
            &mut ws,
            ApiEvent::ConfigFetched {
                id: 7,
                result: Err("timeout".into()),
            },
            Instant::now(),
        );
        assert!(ws.toast.as_deref().unwrap().contains("timeout"));
    }

    #[test]
    fn tool_mutation_triggers_a_tool_refetch() {
        let mut ws = test_workspace();
        let followups = apply_api_event(
            &mut ws,
            ApiEvent::ToolMutated(Ok("Tool created.".into())),
            Instant::now(),
        );
        assert_eq!(followups, vec![Followup::RefetchTools]);
        assert_eq!(ws.toast.as_deref(), Some("Tool created."));
    }

    #[test]
    fn search_results_land_in_the_active_pane() {
        let mut ws = test_workspace();
        ws.open_tab(chat_with_history(1, &["hi"]));
        apply_api_event(
            &mut ws,
            ApiEvent::SearchFinished(Ok(ResearchResult {
                query: "rust async".into(),
                timestamp: None,
                results: Vec::new(),
            })),
            Instant::now(),
        );
        let pane = ws.pane(1).unwrap();
        assert!(pane.notices[0].text.contains("rust async"));
        assert_eq!(pane.messages.len(), 1);
    }

    #[tokio::test]
    async fn create_chat_effect_renames_when_a_name_is_given() {
        let api: Api = Arc::new(MockApi::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        run_effect(
            api,
            CommandEffect::CreateChat {
                name: Some("standup".into()),
            },
            tx,
        )
        .await;
        match rx.recv().await {
            Some(UiEvent::Api(ApiEvent::ChatCreated(Ok(chat)))) => {
                assert_eq!(chat.name.as_deref(), Some("standup"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn refresh_all_reports_all_three_listings() {
        let api: Api = Arc::new(MockApi::with_chats(vec![test_chat(1)]));
        let (tx, mut rx) = mpsc::unbounded_channel();
        run_effect(api, CommandEffect::RefreshAll, tx).await;

        let mut saw_chats = false;
        let mut saw_tools = false;
        let mut saw_prompts = false;
        while let Ok(event) = rx.try_recv() {
            match event {
                UiEvent::Api(ApiEvent::ChatsListed(Ok(chats))) => {
                    assert_eq!(chats.len(), 1);
                    saw_chats = true;
                }
                UiEvent::Api(ApiEvent::ToolsListed(Ok(_))) => saw_tools = true,
                UiEvent::Api(ApiEvent::PromptsListed(Ok(_))) => saw_prompts = true,
                other => panic!("unexpected event: {other:?}"),
            }
        }
        assert!(saw_chats && saw_tools && saw_prompts);
    }

    #[tokio::test]
    async fn failed_delete_comes_back_as_an_error_event() {
        let mock = MockApi::with_chats(vec![test_chat(1)]);
        mock.fail_next("boom");
        let api: Api = Arc::new(mock);
        let (tx, mut rx) = mpsc::unbounded_channel();
        run_effect(api, CommandEffect::DeleteChat { id: 1 }, tx).await;
        match rx.recv().await {
            Some(UiEvent::Api(ApiEvent::ChatDeleted { id: 1, result: Err(err) })) => {
                assert!(err.contains("boom"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
