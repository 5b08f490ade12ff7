//! Outgoing anti-flood queue.
//!
//! Lines sent with [`Priority::High`] or [`Priority::Low`] are delayed so
//! that at most one line per priority delay leaves for the server. A queued
//! line remembers which redirect it claimed; the handle is cleared if that
//! redirect is destroyed before the line goes out.

use std::collections::VecDeque;

use serde::Deserialize;

use crate::redirect::RedirectId;

/// Queue a line is sent through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Written at once, never delayed (registration, PONG).
    Immediate,
    /// User commands.
    High,
    /// Automatic replies.
    Low,
}

impl Priority {
    fn slot(self) -> Option<usize> {
        match self {
            Priority::Immediate => None,
            Priority::High => Some(0),
            Priority::Low => Some(1),
        }
    }
}

/// Seconds between two lines of the same priority (0 = no delay).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FloodSettings {
    #[serde(default = "default_delay")]
    pub prio_high: u64,
    #[serde(default = "default_delay")]
    pub prio_low: u64,
}

fn default_delay() -> u64 {
    2
}

impl Default for FloodSettings {
    fn default() -> Self {
        Self {
            prio_high: default_delay(),
            prio_low: default_delay(),
        }
    }
}

/// A line waiting for its anti-flood slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueuedLine {
    pub line: String,
    pub redirect: Option<RedirectId>,
}

/// Two-priority outgoing queue.
#[derive(Debug, Default)]
pub struct OutQueue {
    settings: FloodSettings,
    queues: [VecDeque<QueuedLine>; 2],
    /// When the last delayed-priority line was written.
    last_user_message: i64,
}

impl OutQueue {
    pub fn new(settings: FloodSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    fn delay(&self, slot: usize) -> i64 {
        let delay = if slot == 0 {
            self.settings.prio_high
        } else {
            self.settings.prio_low
        };
        i64::try_from(delay).unwrap_or(i64::MAX)
    }

    /// Whether a line of this priority must wait in the queue.
    pub fn must_queue(&self, priority: Priority, now: i64) -> bool {
        let Some(slot) = priority.slot() else {
            return false;
        };
        let delay = self.delay(slot);
        !self.queues[slot].is_empty()
            || (delay > 0 && now.saturating_sub(self.last_user_message) < delay)
    }

    pub(crate) fn push(&mut self, priority: Priority, line: String, redirect: Option<RedirectId>) {
        if let Some(slot) = priority.slot() {
            self.queues[slot].push_back(QueuedLine { line, redirect });
        }
    }

    /// Record a delayed-priority line written without queueing.
    pub(crate) fn mark_sent(&mut self, priority: Priority, now: i64) {
        if priority.slot().is_some() {
            self.last_user_message = now;
        }
    }

    /// Next line whose delay elapsed, high priority first.
    pub(crate) fn pop_ready(&mut self, now: i64) -> Option<QueuedLine> {
        // Clock went backwards.
        if self.last_user_message > now {
            self.last_user_message = now;
        }
        for slot in 0..self.queues.len() {
            if self.queues[slot].is_empty() {
                continue;
            }
            if now >= self.last_user_message.saturating_add(self.delay(slot)) {
                self.last_user_message = now;
                return self.queues[slot].pop_front();
            }
        }
        None
    }

    /// Clear every queued handle pointing at `id`.
    pub(crate) fn forget(&mut self, id: RedirectId) {
        for queued in self.queues.iter_mut().flatten() {
            if queued.redirect == Some(id) {
                queued.redirect = None;
            }
        }
    }

    pub(crate) fn clear(&mut self) {
        for queue in &mut self.queues {
            queue.clear();
        }
    }

    pub fn len(&self) -> usize {
        self.queues.iter().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.iter().all(VecDeque::is_empty)
    }

    /// Queued lines in send order for one priority.
    pub fn iter(&self, priority: Priority) -> impl Iterator<Item = &QueuedLine> {
        priority
            .slot()
            .map(|slot| self.queues[slot].iter())
            .into_iter()
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(high: u64, low: u64) -> OutQueue {
        OutQueue::new(FloodSettings {
            prio_high: high,
            prio_low: low,
        })
    }

    #[test]
    fn immediate_never_queues() {
        let mut q = queue(10, 10);
        q.mark_sent(Priority::High, 100);
        assert!(!q.must_queue(Priority::Immediate, 100));
        assert!(q.must_queue(Priority::High, 105));
        assert!(!q.must_queue(Priority::High, 110));
    }

    #[test]
    fn non_empty_queue_forces_queueing() {
        let mut q = queue(0, 0);
        assert!(!q.must_queue(Priority::Low, 0));
        q.push(Priority::Low, "PRIVMSG a :b".into(), None);
        assert!(q.must_queue(Priority::Low, 0));
        assert!(!q.must_queue(Priority::High, 0));
    }

    #[test]
    fn pop_respects_delay_and_priority() {
        let mut q = queue(2, 2);
        q.mark_sent(Priority::High, 10);
        q.push(Priority::Low, "low".into(), None);
        q.push(Priority::High, "high".into(), None);
        assert_eq!(q.pop_ready(11), None);
        assert_eq!(q.pop_ready(12).map(|l| l.line), Some("high".to_string()));
        assert_eq!(q.pop_ready(13), None);
        assert_eq!(q.pop_ready(14).map(|l| l.line), Some("low".to_string()));
        assert!(q.is_empty());
    }

    #[test]
    fn forget_clears_handles() {
        let mut q = queue(5, 5);
        q.push(Priority::High, "a".into(), Some(RedirectId(1)));
        q.push(Priority::High, "b".into(), Some(RedirectId(2)));
        q.forget(RedirectId(1));
        let handles: Vec<_> = q.iter(Priority::High).map(|l| l.redirect).collect();
        assert_eq!(handles, vec![None, Some(RedirectId(2))]);
    }

    #[test]
    fn clock_going_backwards_resets() {
        let mut q = queue(2, 2);
        q.mark_sent(Priority::High, 100);
        q.push(Priority::High, "a".into(), None);
        assert_eq!(q.pop_ready(50), None);
        assert!(q.pop_ready(52).is_some());
    }
}
