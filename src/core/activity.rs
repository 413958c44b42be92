use std::collections::HashMap;

use crate::api::ChatId;
use crate::core::message::MessageRole;

/// Per-role message tallies.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RoleCounts {
    pub user: u64,
    pub assistant: u64,
    pub system: u64,
    pub tool: u64,
}

impl RoleCounts {
    pub fn record(&mut self, role: MessageRole) {
        match role {
            MessageRole::User => self.user += 1,
            MessageRole::Assistant => self.assistant += 1,
            MessageRole::System => self.system += 1,
            MessageRole::Tool => self.tool += 1,
        }
    }

    pub fn get(&self, role: MessageRole) -> u64 {
        match role {
            MessageRole::User => self.user,
            MessageRole::Assistant => self.assistant,
            MessageRole::System => self.system,
            MessageRole::Tool => self.tool,
        }
    }

    pub fn sum(&self) -> u64 {
        self.user + self.assistant + self.system + self.tool
    }
}

/// Activity counters for one scope (one chat, or the whole session).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Counters {
    pub messages: RoleCounts,
    pub config_changes: u64,
}

impl Counters {
    /// Messages plus configuration changes.
    pub fn total(&self) -> u64 {
        self.messages.sum() + self.config_changes
    }
}

/// Session-wide activity ledger.
///
/// Every observed message bumps both the global counters and the counters of
/// the chat it belongs to, so the global totals always equal the sum over
/// chats. Entries survive tab close; only chat deletion drops them.
#[derive(Debug, Default, Clone)]
pub struct ActivityLedger {
    global: Counters,
    per_chat: HashMap<ChatId, Counters>,
}

impl ActivityLedger {
    pub fn global(&self) -> &Counters {
        &self.global
    }

    pub fn for_chat(&self, id: ChatId) -> Option<&Counters> {
        self.per_chat.get(&id)
    }

    pub fn record_message(&mut self, id: ChatId, role: MessageRole) {
        self.global.messages.record(role);
        self.per_chat.entry(id).or_default().messages.record(role);
    }

    pub fn record_config_change(&mut self, id: ChatId) {
        self.global.config_changes += 1;
        self.per_chat.entry(id).or_default().config_changes += 1;
    }

    pub fn forget_chat(&mut self, id: ChatId) {
        if let Some(counters) = self.per_chat.remove(&id) {
            let global = &mut self.global;
            for role in MessageRole::all() {
                let n = counters.messages.get(role);
                match role {
                    MessageRole::User => global.messages.user -= n,
                    MessageRole::Assistant => global.messages.assistant -= n,
                    MessageRole::System => global.messages.system -= n,
                    MessageRole::Tool => global.messages.tool -= n,
                }
            }
            global.config_changes -= counters.config_changes;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_count_globally_and_per_chat() {
        let mut ledger = ActivityLedger::default();
        ledger.record_message(1, MessageRole::User);
        ledger.record_message(1, MessageRole::Assistant);
        ledger.record_message(2, MessageRole::User);

        assert_eq!(ledger.global().messages.user, 2);
        assert_eq!(ledger.global().messages.assistant, 1);
        assert_eq!(ledger.for_chat(1).unwrap().messages.sum(), 2);
        assert_eq!(ledger.for_chat(2).unwrap().messages.sum(), 1);
    }

    #[test]
    fn global_total_equals_sum_of_chats() {
        let mut ledger = ActivityLedger::default();
        ledger.record_message(1, MessageRole::User);
        ledger.record_message(2, MessageRole::Assistant);
        ledger.record_config_change(2);

        let per_chat_total: u64 = [1, 2]
            .iter()
            .filter_map(|&id| ledger.for_chat(id))
            .map(Counters::total)
            .sum();
        assert_eq!(ledger.global().total(), per_chat_total);
    }

    #[test]
    fn config_changes_count_separately_from_messages() {
        let mut ledger = ActivityLedger::default();
        ledger.record_config_change(5);
        ledger.record_config_change(5);

        let counters = ledger.for_chat(5).unwrap();
        assert_eq!(counters.config_changes, 2);
        assert_eq!(counters.messages.sum(), 0);
        assert_eq!(counters.total(), 2);
    }

    #[test]
    fn forgetting_a_chat_rolls_back_global_counters() {
        let mut ledger = ActivityLedger::default();
        ledger.record_message(1, MessageRole::User);
        ledger.record_message(2, MessageRole::Tool);
        ledger.record_config_change(2);

        ledger.forget_chat(2);
        assert!(ledger.for_chat(2).is_none());
        assert_eq!(ledger.global().total(), 1);
        assert_eq!(ledger.global().messages.tool, 0);
    }

    #[test]
    fn unknown_chat_has_no_counters() {
        let ledger = ActivityLedger::default();
        assert!(ledger.for_chat(99).is_none());
    }
}
