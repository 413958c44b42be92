use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::api::ChatId;

/// Delay before the first refresh after a send or trigger, giving the
/// service time to persist the user message before we re-read the chat.
pub const SETTLE_DELAY: Duration = Duration::from_millis(200);

/// Default spacing between refreshes of a busy chat.
pub const POLL_INTERVAL: Duration = Duration::from_millis(2000);

/// Refresh schedule for busy chats.
///
/// One entry per chat currently awaiting an assistant turn. The first poll
/// fires after [`SETTLE_DELAY`], later ones at the configured interval, until
/// the workspace reports the chat finished and drops the entry.
#[derive(Debug, Clone)]
pub struct PollSchedule {
    interval: Duration,
    next_due: HashMap<ChatId, Instant>,
}

impl PollSchedule {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            next_due: HashMap::new(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_empty(&self) -> bool {
        self.next_due.is_empty()
    }

    pub fn is_scheduled(&self, id: ChatId) -> bool {
        self.next_due.contains_key(&id)
    }

    /// Start polling a chat. Re-arming an already scheduled chat resets its
    /// settle delay, which is what we want after a second send.
    pub fn begin(&mut self, id: ChatId, now: Instant) {
        self.next_due.insert(id, now + SETTLE_DELAY);
    }

    pub fn stop(&mut self, id: ChatId) {
        self.next_due.remove(&id);
    }

    pub fn clear(&mut self) {
        self.next_due.clear();
    }

    /// Chats whose refresh is due at `now`. Each returned chat is pushed
    /// forward one interval so a slow response cannot pile up requests.
    pub fn take_due(&mut self, now: Instant) -> Vec<ChatId> {
        let mut due: Vec<ChatId> = self
            .next_due
            .iter()
            .filter(|(_, &at)| at <= now)
            .map(|(&id, _)| id)
            .collect();
        due.sort_unstable();
        for id in &due {
            self.next_due.insert(*id, now + self.interval);
        }
        due
    }

    /// Earliest pending deadline, used to size the event-loop timeout.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.next_due.values().min().copied()
    }
}

impl Default for PollSchedule {
    fn default() -> Self {
        Self::new(POLL_INTERVAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_poll_waits_for_settle_delay() {
        let mut schedule = PollSchedule::default();
        let start = Instant::now();
        schedule.begin(7, start);

        assert!(schedule.take_due(start).is_empty());
        assert_eq!(schedule.take_due(start + SETTLE_DELAY), vec![7]);
    }

    #[test]
    fn subsequent_polls_use_the_interval() {
        let mut schedule = PollSchedule::new(Duration::from_secs(2));
        let start = Instant::now();
        schedule.begin(7, start);

        let first = start + SETTLE_DELAY;
        assert_eq!(schedule.take_due(first), vec![7]);
        assert!(schedule.take_due(first + Duration::from_secs(1)).is_empty());
        assert_eq!(schedule.take_due(first + Duration::from_secs(2)), vec![7]);
    }

    #[test]
    fn stop_removes_the_entry() {
        let mut schedule = PollSchedule::default();
        let start = Instant::now();
        schedule.begin(1, start);
        schedule.begin(2, start);
        schedule.stop(1);

        assert!(!schedule.is_scheduled(1));
        let due = schedule.take_due(start + SETTLE_DELAY);
        assert_eq!(due, vec![2]);
    }

    #[test]
    fn multiple_due_chats_come_back_sorted() {
        let mut schedule = PollSchedule::default();
        let start = Instant::now();
        schedule.begin(9, start);
        schedule.begin(3, start);
        schedule.begin(5, start);

        assert_eq!(schedule.take_due(start + SETTLE_DELAY), vec![3, 5, 9]);
    }

    #[test]
    fn rearming_resets_the_settle_delay() {
        let mut schedule = PollSchedule::default();
        let start = Instant::now();
        schedule.begin(1, start);

        let later = start + Duration::from_millis(150);
        schedule.begin(1, later);
        assert!(schedule.take_due(start + SETTLE_DELAY).is_empty());
        assert_eq!(schedule.take_due(later + SETTLE_DELAY), vec![1]);
    }

    #[test]
    fn next_deadline_reports_earliest_entry() {
        let mut schedule = PollSchedule::default();
        assert!(schedule.next_deadline().is_none());

        let start = Instant::now();
        schedule.begin(1, start);
        schedule.begin(2, start + Duration::from_secs(1));
        assert_eq!(schedule.next_deadline(), Some(start + SETTLE_DELAY));
    }
}
