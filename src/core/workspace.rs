use std::collections::HashMap;
use std::time::{Duration, Instant};

use tracing::debug;

use crate::api::{Chat, ChatId, Message, PromptId, SystemPrompt, Tool, ToolId};
use crate::core::activity::ActivityLedger;
use crate::core::message::{MessageRole, Notice};
use crate::core::poll::PollSchedule;
use crate::core::tabs::TabStrip;

/// Which region of the console owns keyboard input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Chat,
    Panel,
}

/// View mode for the open tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Tabbed,
    Grid,
}

/// Which half of the side panel the selection is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelItem {
    Tool(usize),
    Prompt(usize),
}

/// State of one open (or cached) chat pane.
///
/// `messages` is a mirror of the server transcript and is only ever replaced
/// wholesale from a fetched [`Chat`]. Console-authored text lives in
/// `notices` and `error` so a refresh can never clobber it.
#[derive(Debug, Clone)]
pub struct ChatPane {
    pub chat: Chat,
    pub messages: Vec<Message>,
    pub notices: Vec<Notice>,
    /// Outbound message text shown while a send is in flight.
    pub preview: Option<String>,
    /// Error from the last failed send or trigger, cleared on the next one.
    pub error: Option<String>,
    pub busy: bool,
    pub scroll_offset: u16,
    pub auto_scroll: bool,
    /// Bottom scroll bound from the last rendered frame; manual scrolling
    /// starts from here.
    pub last_max_scroll: u16,
    send_snapshot: Option<Vec<Message>>,
}

impl ChatPane {
    pub fn new(chat: Chat) -> Self {
        let messages = chat.history.clone();
        Self {
            chat,
            messages,
            notices: Vec::new(),
            preview: None,
            error: None,
            busy: false,
            scroll_offset: 0,
            auto_scroll: true,
            last_max_scroll: 0,
            send_snapshot: None,
        }
    }

    pub fn push_notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn adopt_chat(&mut self, chat: Chat) {
        self.messages = chat.history.clone();
        self.chat = chat;
    }
}

/// Outcome of applying a polled chat snapshot to its pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// Nothing new; keep polling.
    Unchanged,
    /// Transcript grew or run state flipped; keep polling.
    Updated,
    /// The assistant turn completed; polling for this chat stops.
    Finished,
}

/// The whole client-side session: sidebar catalog, open panes, closed-pane
/// cache, tab order, activity counters, and the poll schedule.
pub struct Workspace {
    /// Sidebar catalog. Summaries only; transcripts live in panes.
    pub chats: Vec<Chat>,
    open: HashMap<ChatId, ChatPane>,
    cache: HashMap<ChatId, ChatPane>,
    pub tabs: TabStrip,
    pub view_mode: ViewMode,
    pub tools: Vec<Tool>,
    pub prompts: Vec<SystemPrompt>,
    pub activity: ActivityLedger,
    pub poll: PollSchedule,
    pub focus: Focus,
    pub sidebar_selected: usize,
    pub panel_selected: Option<PanelItem>,
    /// Transient message shown across the whole console.
    pub toast: Option<String>,
    pub exit_requested: bool,
}

impl Workspace {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            chats: Vec::new(),
            open: HashMap::new(),
            cache: HashMap::new(),
            tabs: TabStrip::default(),
            view_mode: ViewMode::Tabbed,
            tools: Vec::new(),
            prompts: Vec::new(),
            activity: ActivityLedger::default(),
            poll: PollSchedule::new(poll_interval),
            focus: Focus::Chat,
            sidebar_selected: 0,
            panel_selected: None,
            toast: None,
            exit_requested: false,
        }
    }

    pub fn pane(&self, id: ChatId) -> Option<&ChatPane> {
        self.open.get(&id)
    }

    pub fn pane_mut(&mut self, id: ChatId) -> Option<&mut ChatPane> {
        self.open.get_mut(&id)
    }

    pub fn active_pane(&self) -> Option<&ChatPane> {
        self.tabs.active().and_then(|id| self.open.get(&id))
    }

    pub fn active_pane_mut(&mut self) -> Option<&mut ChatPane> {
        self.tabs.active().and_then(|id| self.open.get_mut(&id))
    }

    pub fn open_ids(&self) -> impl Iterator<Item = ChatId> + '_ {
        self.tabs.order().iter().copied()
    }

    pub fn catalog_chat(&self, id: ChatId) -> Option<&Chat> {
        self.chats.iter().find(|chat| chat.id == id)
    }

    // --- catalog -----------------------------------------------------------

    /// Replace the sidebar catalog from a full listing. Open panes keep
    /// their transcripts; only their summary records are updated.
    pub fn set_catalog(&mut self, chats: Vec<Chat>) {
        for chat in &chats {
            if let Some(pane) = self.open.get_mut(&chat.id) {
                pane.chat.name = chat.name.clone();
                pane.chat.is_running = chat.is_running;
            }
        }
        // Tabs for chats deleted elsewhere are closed outright.
        let known: Vec<ChatId> = chats.iter().map(|chat| chat.id).collect();
        let stale: Vec<ChatId> = self
            .tabs
            .order()
            .iter()
            .copied()
            .filter(|id| !known.contains(id))
            .collect();
        for id in stale {
            debug!(chat = id, "closing tab for chat deleted remotely");
            self.chat_deleted(id);
        }
        self.chats = chats;
        if self.sidebar_selected >= self.chats.len() {
            self.sidebar_selected = self.chats.len().saturating_sub(1);
        }
    }

    /// Merge a freshly fetched chat into the catalog and any open pane.
    /// Used after rename, assignment, and auto-run updates.
    pub fn chat_updated(&mut self, chat: Chat) {
        if let Some(slot) = self.chats.iter_mut().find(|c| c.id == chat.id) {
            *slot = chat.clone();
        } else {
            self.chats.push(chat.clone());
        }
        if let Some(pane) = self.open.get_mut(&chat.id) {
            pane.adopt_chat(chat);
        } else if let Some(pane) = self.cache.get_mut(&chat.id) {
            pane.adopt_chat(chat);
        }
    }

    // --- tabs --------------------------------------------------------------

    /// Open a tab for a chat. A pane cached from an earlier close is
    /// restored as-is; otherwise a fresh pane is seeded from the catalog
    /// record (the caller fetches the full transcript separately).
    pub fn open_tab(&mut self, chat: Chat) {
        let id = chat.id;
        if self.open.contains_key(&id) {
            self.tabs.select(id);
        } else if let Some(mut pane) = self.cache.remove(&id) {
            pane.adopt_chat(chat);
            // A pane cached mid-run picks its polling back up.
            let busy = pane.busy;
            self.open.insert(id, pane);
            self.tabs.insert(id);
            if busy {
                self.poll.begin(id, Instant::now());
            }
        } else {
            self.open.insert(id, ChatPane::new(chat));
            self.tabs.insert(id);
        }
        self.focus = Focus::Chat;
    }

    /// Close a tab without deleting the chat. The pane moves to the cache so
    /// reopening restores scroll position, notices, and transcript.
    pub fn close_tab(&mut self, id: ChatId) {
        if let Some(pane) = self.open.remove(&id) {
            self.cache.insert(id, pane);
        }
        self.tabs.remove(id);
        self.poll.stop(id);
    }

    /// Swap two tab positions. Out-of-range requests are ignored.
    pub fn reorder_tabs(&mut self, from: usize, to: usize) -> bool {
        self.tabs.swap(from, to)
    }

    pub fn toggle_view_mode(&mut self) {
        self.view_mode = match self.view_mode {
            ViewMode::Tabbed => ViewMode::Grid,
            ViewMode::Grid => ViewMode::Tabbed,
        };
    }

    // --- lifecycle ---------------------------------------------------------

    /// A chat was deleted (locally or remotely): drop its tab, pane, cache
    /// entry, counters, and poll entry.
    pub fn chat_deleted(&mut self, id: ChatId) {
        self.open.remove(&id);
        self.cache.remove(&id);
        self.tabs.remove(id);
        self.poll.stop(id);
        self.activity.forget_chat(id);
        self.chats.retain(|chat| chat.id != id);
        if self.sidebar_selected >= self.chats.len() {
            self.sidebar_selected = self.chats.len().saturating_sub(1);
        }
    }

    /// The transcript was cleared server-side; empty the mirror at once
    /// rather than waiting for a poll.
    pub fn history_cleared(&mut self, chat: Chat) {
        let id = chat.id;
        self.chat_updated(chat);
        if let Some(pane) = self.open.get_mut(&id) {
            pane.messages.clear();
            pane.scroll_offset = 0;
            pane.auto_scroll = true;
        }
    }

    // --- sending -----------------------------------------------------------

    /// Start a send or trigger. Snapshots the transcript so a failure can
    /// restore it exactly, shows the outbound text as a preview, and marks
    /// the pane busy.
    pub fn begin_send(&mut self, id: ChatId, content: Option<&str>) -> bool {
        let Some(pane) = self.open.get_mut(&id) else {
            return false;
        };
        if pane.busy {
            return false;
        }
        pane.send_snapshot = Some(pane.messages.clone());
        pane.preview = content.map(str::to_string);
        pane.error = None;
        pane.busy = true;
        pane.auto_scroll = true;
        true
    }

    /// Resolve a send or trigger. On success the authoritative chat record
    /// replaces the mirror and new messages are counted; on failure the
    /// snapshot is restored and the error is pinned to the pane. A tab
    /// closed mid-send resolves against its cached pane, so the chat never
    /// stays marked busy past its send.
    pub fn finish_send(&mut self, id: ChatId, result: Result<Chat, String>, now: Instant) {
        let open = self.open.contains_key(&id);
        let pane = if open {
            self.open.get_mut(&id)
        } else {
            self.cache.get_mut(&id)
        };
        let Some(pane) = pane else {
            return;
        };
        match result {
            Ok(chat) => {
                let before = pane
                    .send_snapshot
                    .take()
                    .map(|snapshot| snapshot.len())
                    .unwrap_or(pane.messages.len());
                let new_roles: Vec<MessageRole> = chat
                    .history
                    .iter()
                    .skip(before)
                    .map(|message| message.role)
                    .collect();
                let still_running = chat.is_running;
                pane.preview = None;
                pane.adopt_chat(chat);
                pane.busy = still_running;
                for role in new_roles {
                    self.activity.record_message(id, role);
                }
                // Closed tabs are not polled; reopening re-arms the timer.
                if still_running && open {
                    self.poll.begin(id, now);
                } else {
                    self.poll.stop(id);
                }
            }
            Err(message) => {
                if let Some(snapshot) = pane.send_snapshot.take() {
                    pane.messages = snapshot;
                }
                pane.preview = None;
                pane.busy = false;
                pane.error = Some(message);
                self.poll.stop(id);
            }
        }
    }

    // --- polling -----------------------------------------------------------

    /// Chats that should be refreshed right now. In tabbed mode only the
    /// active tab is polled; grid mode refreshes every busy tab.
    pub fn due_polls(&mut self, now: Instant) -> Vec<ChatId> {
        let due = self.poll.take_due(now);
        match self.view_mode {
            ViewMode::Grid => due,
            ViewMode::Tabbed => {
                let active = self.tabs.active();
                due.into_iter()
                    .filter(|id| Some(*id) == active)
                    .collect()
            }
        }
    }

    /// Apply a polled snapshot. Changes are detected by transcript length
    /// and run state, matching what the service actually mutates.
    pub fn apply_refresh(&mut self, chat: Chat, now: Instant) -> RefreshOutcome {
        let id = chat.id;
        let Some(pane) = self.open.get_mut(&id) else {
            self.poll.stop(id);
            return RefreshOutcome::Finished;
        };
        let grew = chat.history.len() != pane.messages.len();
        let run_changed = chat.is_running != pane.chat.is_running;
        let finished = !chat.is_running;

        if grew || run_changed {
            let before = pane.messages.len();
            let new_roles: Vec<MessageRole> = chat
                .history
                .iter()
                .skip(before)
                .map(|message| message.role)
                .collect();
            pane.adopt_chat(chat);
            pane.busy = !finished;
            if finished {
                pane.preview = None;
            }
            for role in new_roles {
                self.activity.record_message(id, role);
            }
            if finished {
                self.poll.stop(id);
                RefreshOutcome::Finished
            } else {
                self.poll.begin(id, now);
                RefreshOutcome::Updated
            }
        } else if finished && pane.busy {
            // Run ended without new output (e.g. stop tool fired).
            pane.busy = false;
            pane.preview = None;
            self.poll.stop(id);
            RefreshOutcome::Finished
        } else {
            RefreshOutcome::Unchanged
        }
    }

    // --- side panel & misc --------------------------------------------------

    pub fn record_config_change(&mut self, id: ChatId) {
        self.activity.record_config_change(id);
    }

    pub fn show_toast(&mut self, text: impl Into<String>) {
        self.toast = Some(text.into());
    }

    pub fn dismiss_toast(&mut self) {
        self.toast = None;
    }

    pub fn selected_tool(&self) -> Option<&Tool> {
        match self.panel_selected {
            Some(PanelItem::Tool(index)) => self.tools.get(index),
            _ => None,
        }
    }

    pub fn selected_prompt(&self) -> Option<&SystemPrompt> {
        match self.panel_selected {
            Some(PanelItem::Prompt(index)) => self.prompts.get(index),
            _ => None,
        }
    }

    /// Move the panel selection by one step, flowing from the tool list into
    /// the prompt list and stopping at the ends.
    pub fn panel_step(&mut self, down: bool) {
        let tools = self.tools.len();
        let prompts = self.prompts.len();
        if tools == 0 && prompts == 0 {
            self.panel_selected = None;
            return;
        }
        let first = if tools > 0 {
            PanelItem::Tool(0)
        } else {
            PanelItem::Prompt(0)
        };
        let current = match self.panel_selected {
            Some(item) => item,
            None => {
                self.panel_selected = Some(first);
                return;
            }
        };
        let next = match (current, down) {
            (PanelItem::Tool(i), true) if i + 1 < tools => PanelItem::Tool(i + 1),
            (PanelItem::Tool(_), true) if prompts > 0 => PanelItem::Prompt(0),
            (PanelItem::Tool(i), false) if i > 0 => PanelItem::Tool(i - 1),
            (PanelItem::Prompt(i), true) if i + 1 < prompts => PanelItem::Prompt(i + 1),
            (PanelItem::Prompt(i), false) if i > 0 => PanelItem::Prompt(i - 1),
            (PanelItem::Prompt(_), false) if tools > 0 => PanelItem::Tool(tools - 1),
            (item, _) => item,
        };
        self.panel_selected = Some(next);
    }

    pub fn set_tools(&mut self, tools: Vec<Tool>) {
        self.tools = tools;
        self.clamp_panel_selection();
    }

    pub fn set_prompts(&mut self, prompts: Vec<SystemPrompt>) {
        self.prompts = prompts;
        self.clamp_panel_selection();
    }

    fn clamp_panel_selection(&mut self) {
        match self.panel_selected {
            Some(PanelItem::Tool(i)) if i >= self.tools.len() => {
                self.panel_selected = if self.tools.is_empty() {
                    None
                } else {
                    Some(PanelItem::Tool(self.tools.len() - 1))
                };
            }
            Some(PanelItem::Prompt(i)) if i >= self.prompts.len() => {
                self.panel_selected = if self.prompts.is_empty() {
                    None
                } else {
                    Some(PanelItem::Prompt(self.prompts.len() - 1))
                };
            }
            _ => {}
        }
    }

    pub fn tool_name(&self, id: ToolId) -> Option<&str> {
        self.tools
            .iter()
            .find(|tool| tool.id == id)
            .map(Tool::display_name)
    }

    pub fn prompt_name(&self, id: PromptId) -> Option<&str> {
        self.prompts
            .iter()
            .find(|prompt| prompt.id == id)
            .map(|prompt| prompt.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_utils::{chat_with_history, test_chat, test_message, test_workspace};
    use std::time::Duration;

    fn now() -> Instant {
        Instant::now()
    }

    #[test]
    fn open_close_reopen_restores_pane_state() {
        let mut ws = test_workspace();
        let chat = chat_with_history(1, &["hello", "hi there"]);
        ws.chat_updated(chat.clone());
        ws.open_tab(chat.clone());

        {
            let pane = ws.pane_mut(1).unwrap();
            pane.scroll_offset = 5;
            pane.auto_scroll = false;
            pane.push_notice(Notice::info("searched for rust"));
        }

        ws.close_tab(1);
        assert!(ws.pane(1).is_none());
        assert!(!ws.tabs.contains(1));

        ws.open_tab(chat);
        let pane = ws.pane(1).unwrap();
        assert_eq!(pane.scroll_offset, 5);
        assert!(!pane.auto_scroll);
        assert_eq!(pane.notices.len(), 1);
        assert_eq!(pane.messages.len(), 2);
    }

    #[test]
    fn deleting_a_chat_purges_the_cache_too() {
        let mut ws = test_workspace();
        let chat = test_chat(1);
        ws.chat_updated(chat.clone());
        ws.open_tab(chat.clone());
        ws.close_tab(1);

        ws.chat_deleted(1);
        ws.open_tab(chat);
        assert!(ws.pane(1).unwrap().notices.is_empty());
        assert_eq!(ws.pane(1).unwrap().scroll_offset, 0);
    }

    #[test]
    fn failed_send_restores_transcript_and_pins_error() {
        let mut ws = test_workspace();
        let chat = chat_with_history(1, &["first"]);
        ws.open_tab(chat);

        assert!(ws.begin_send(1, Some("second")));
        assert_eq!(ws.pane(1).unwrap().preview.as_deref(), Some("second"));
        assert!(ws.pane(1).unwrap().busy);

        ws.finish_send(1, Err("connection refused".into()), now());
        let pane = ws.pane(1).unwrap();
        assert_eq!(pane.messages.len(), 1);
        assert!(pane.preview.is_none());
        assert!(!pane.busy);
        assert_eq!(pane.error.as_deref(), Some("connection refused"));
        assert!(!ws.poll.is_scheduled(1));
    }

    #[test]
    fn successful_send_adopts_server_transcript_and_counts_messages() {
        let mut ws = test_workspace();
        let chat = chat_with_history(1, &["first"]);
        ws.open_tab(chat);

        ws.begin_send(1, Some("second"));
        let mut reply = chat_with_history(1, &["first", "second"]);
        reply.history.push(test_message(MessageRole::Assistant, "answer"));
        reply.is_running = false;
        ws.finish_send(1, Ok(reply), now());

        let pane = ws.pane(1).unwrap();
        assert_eq!(pane.messages.len(), 3);
        assert!(!pane.busy);
        assert!(pane.error.is_none());
        let counters = ws.activity.for_chat(1).unwrap();
        assert_eq!(counters.messages.user, 1);
        assert_eq!(counters.messages.assistant, 1);
    }

    #[test]
    fn send_into_running_chat_schedules_polling() {
        let mut ws = test_workspace();
        ws.open_tab(test_chat(1));

        ws.begin_send(1, Some("go"));
        let mut reply = chat_with_history(1, &["go"]);
        reply.is_running = true;
        ws.finish_send(1, Ok(reply), now());

        assert!(ws.pane(1).unwrap().busy);
        assert!(ws.poll.is_scheduled(1));
    }

    #[test]
    fn begin_send_is_rejected_while_busy() {
        let mut ws = test_workspace();
        ws.open_tab(test_chat(1));
        assert!(ws.begin_send(1, Some("one")));
        assert!(!ws.begin_send(1, Some("two")));
    }

    #[test]
    fn send_resolves_after_the_tab_was_closed() {
        let mut ws = test_workspace();
        ws.open_tab(test_chat(1));
        assert!(ws.begin_send(1, Some("question")));
        ws.close_tab(1);

        let mut reply = chat_with_history(1, &["question"]);
        reply.history.push(test_message(MessageRole::Assistant, "answer"));
        ws.finish_send(1, Ok(reply), now());

        ws.open_tab(test_chat(1));
        let pane = ws.pane(1).unwrap();
        assert!(!pane.busy);
        assert!(pane.preview.is_none());
        assert_eq!(ws.activity.for_chat(1).unwrap().messages.assistant, 1);
        assert!(ws.begin_send(1, Some("again")));
    }

    #[test]
    fn failed_send_resolves_a_cached_pane_too() {
        let mut ws = test_workspace();
        ws.open_tab(chat_with_history(1, &["first"]));
        ws.begin_send(1, Some("second"));
        ws.close_tab(1);

        ws.finish_send(1, Err("connection refused".into()), now());

        ws.open_tab(test_chat(1));
        let pane = ws.pane(1).unwrap();
        assert!(!pane.busy);
        assert!(pane.preview.is_none());
        assert_eq!(pane.error.as_deref(), Some("connection refused"));
    }

    #[test]
    fn reopening_a_running_chat_rearms_the_poll() {
        let mut ws = test_workspace();
        ws.open_tab(test_chat(1));
        ws.begin_send(1, Some("go"));
        ws.close_tab(1);
        assert!(!ws.poll.is_scheduled(1));

        let mut running = chat_with_history(1, &["go"]);
        running.is_running = true;
        ws.finish_send(1, Ok(running), now());
        assert!(!ws.poll.is_scheduled(1));

        ws.open_tab(test_chat(1));
        assert!(ws.pane(1).unwrap().busy);
        assert!(ws.poll.is_scheduled(1));
    }

    #[test]
    fn refresh_with_no_change_is_unchanged() {
        let mut ws = test_workspace();
        let chat = chat_with_history(1, &["hello"]);
        ws.open_tab(chat.clone());

        assert_eq!(ws.apply_refresh(chat, now()), RefreshOutcome::Unchanged);
    }

    #[test]
    fn refresh_that_finishes_stops_polling() {
        let mut ws = test_workspace();
        let mut chat = chat_with_history(1, &["hello"]);
        chat.is_running = true;
        ws.open_tab(chat.clone());
        ws.pane_mut(1).unwrap().busy = true;
        ws.poll.begin(1, now());

        let mut done = chat.clone();
        done.history
            .push(test_message(MessageRole::Assistant, "finished"));
        done.is_running = false;
        assert_eq!(ws.apply_refresh(done, now()), RefreshOutcome::Finished);
        assert!(!ws.pane(1).unwrap().busy);
        assert!(!ws.poll.is_scheduled(1));
        assert_eq!(ws.activity.for_chat(1).unwrap().messages.assistant, 1);
    }

    #[test]
    fn refresh_finishing_without_output_clears_busy() {
        let mut ws = test_workspace();
        let mut chat = chat_with_history(1, &["hello"]);
        chat.is_running = true;
        ws.open_tab(chat.clone());
        ws.pane_mut(1).unwrap().busy = true;
        ws.poll.begin(1, now());

        let mut done = chat;
        done.is_running = false;
        assert_eq!(ws.apply_refresh(done, now()), RefreshOutcome::Finished);
        assert!(!ws.pane(1).unwrap().busy);
    }

    #[test]
    fn tabbed_mode_only_polls_the_active_tab() {
        let mut ws = test_workspace();
        ws.open_tab(test_chat(1));
        ws.open_tab(test_chat(2));
        let start = now();
        ws.poll.begin(1, start);
        ws.poll.begin(2, start);

        // Chat 2 is active (opened last).
        let due = ws.due_polls(start + Duration::from_millis(300));
        assert_eq!(due, vec![2]);
    }

    #[test]
    fn grid_mode_polls_every_busy_tab() {
        let mut ws = test_workspace();
        ws.open_tab(test_chat(1));
        ws.open_tab(test_chat(2));
        ws.toggle_view_mode();
        assert_eq!(ws.view_mode, ViewMode::Grid);

        let start = now();
        ws.poll.begin(1, start);
        ws.poll.begin(2, start);
        let due = ws.due_polls(start + Duration::from_millis(300));
        assert_eq!(due, vec![1, 2]);
    }

    #[test]
    fn refresh_never_clobbers_notices() {
        let mut ws = test_workspace();
        let chat = chat_with_history(1, &["hello"]);
        ws.open_tab(chat.clone());
        ws.pane_mut(1)
            .unwrap()
            .push_notice(Notice::error("tool create failed"));

        let mut updated = chat;
        updated
            .history
            .push(test_message(MessageRole::Assistant, "reply"));
        ws.apply_refresh(updated, now());
        assert_eq!(ws.pane(1).unwrap().notices.len(), 1);
    }

    #[test]
    fn catalog_listing_closes_tabs_for_remotely_deleted_chats() {
        let mut ws = test_workspace();
        ws.chat_updated(test_chat(1));
        ws.chat_updated(test_chat(2));
        ws.open_tab(test_chat(1));
        ws.open_tab(test_chat(2));

        ws.set_catalog(vec![test_chat(2)]);
        assert!(!ws.tabs.contains(1));
        assert!(ws.tabs.contains(2));
        assert_eq!(ws.chats.len(), 1);
    }

    #[test]
    fn history_cleared_empties_the_mirror_immediately() {
        let mut ws = test_workspace();
        let chat = chat_with_history(1, &["a", "b"]);
        ws.open_tab(chat.clone());

        let mut cleared = chat;
        cleared.history.clear();
        ws.history_cleared(cleared);
        assert!(ws.pane(1).unwrap().messages.is_empty());
    }

    #[test]
    fn panel_selection_flows_from_tools_into_prompts() {
        let mut ws = test_workspace();
        ws.set_tools(vec![crate::utils::test_utils::test_tool(10, "lookup")]);
        ws.set_prompts(vec![crate::utils::test_utils::test_prompt(20, "concise")]);

        ws.panel_step(true);
        assert_eq!(ws.panel_selected, Some(PanelItem::Tool(0)));
        ws.panel_step(true);
        assert_eq!(ws.panel_selected, Some(PanelItem::Prompt(0)));
        ws.panel_step(true);
        assert_eq!(ws.panel_selected, Some(PanelItem::Prompt(0)));
        ws.panel_step(false);
        assert_eq!(ws.panel_selected, Some(PanelItem::Tool(0)));
    }
}
