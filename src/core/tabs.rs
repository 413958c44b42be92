use crate::api::ChatId;

/// Ordered strip of open chat tabs plus the active selection.
///
/// The strip only tracks identity and order; pane content lives in the
/// workspace. Order is a permutation of the open set, so every mutation
/// keeps the two in sync.
#[derive(Debug, Default, Clone)]
pub struct TabStrip {
    order: Vec<ChatId>,
    active: Option<ChatId>,
}

impl TabStrip {
    pub fn order(&self) -> &[ChatId] {
        &self.order
    }

    pub fn active(&self) -> Option<ChatId> {
        self.active
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: ChatId) -> bool {
        self.order.contains(&id)
    }

    pub fn position(&self, id: ChatId) -> Option<usize> {
        self.order.iter().position(|&open| open == id)
    }

    /// Add a tab at the end of the strip and make it active. Opening a chat
    /// that is already open just activates its existing tab.
    pub fn insert(&mut self, id: ChatId) {
        if !self.contains(id) {
            self.order.push(id);
        }
        self.active = Some(id);
    }

    /// Remove a tab. When the active tab is closed the first remaining tab
    /// becomes active; closing the last tab leaves no selection.
    pub fn remove(&mut self, id: ChatId) {
        self.order.retain(|&open| open != id);
        if self.active == Some(id) {
            self.active = self.order.first().copied();
        }
    }

    /// Activate a tab that is already in the strip. Unknown ids are ignored.
    pub fn select(&mut self, id: ChatId) -> bool {
        if self.contains(id) {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    /// Swap the tabs at two positions. Out-of-range indices leave the strip
    /// untouched; the active selection follows the chat, not the slot.
    pub fn swap(&mut self, from: usize, to: usize) -> bool {
        if from >= self.order.len() || to >= self.order.len() || from == to {
            return false;
        }
        self.order.swap(from, to);
        true
    }

    pub fn select_next(&mut self) {
        self.shift(1);
    }

    pub fn select_prev(&mut self) {
        self.shift(-1);
    }

    fn shift(&mut self, delta: isize) {
        if self.order.is_empty() {
            return;
        }
        let current = self
            .active
            .and_then(|id| self.position(id))
            .unwrap_or(0) as isize;
        let len = self.order.len() as isize;
        let next = (current + delta).rem_euclid(len) as usize;
        self.active = Some(self.order[next]);
    }
}
