//! Deterministic timers
//!
//! A virtual clock in milliseconds. Nothing runs until the embedder calls
//! [`TimerQueue::advance`]; due tasks then run in deadline order, ties in
//! scheduling order.

use std::collections::BTreeMap;
use std::time::Duration;

use wisp_dom::{Page, Scheduler, Task};

#[derive(Debug, Default)]
pub struct TimerQueue {
    now: u64,
    seq: u64,
    pending: BTreeMap<(u64, u64), Task>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time in milliseconds
    #[inline]
    pub fn now(&self) -> u64 {
        self.now
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Deadline of the next task
    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.keys().next().map(|&(due, _)| due)
    }

    /// Move the clock forward by `ms`, running every task that falls due.
    /// Returns the number of tasks run.
    pub fn advance(&mut self, page: &mut Page, ms: u64) -> usize {
        let target = self.now.saturating_add(ms);
        let mut ran = 0;
        while let Some(entry) = self.pending.first_entry() {
            let (due, _) = *entry.key();
            if due > target {
                break;
            }
            let task = entry.remove();
            self.now = due;
            tracing::trace!(?task, at = due, "timer fired");
            page.run_task(task);
            ran += 1;
        }
        self.now = target;
        ran
    }

    /// Run everything pending, moving the clock to the last deadline
    pub fn run_until_idle(&mut self, page: &mut Page) -> usize {
        match self.pending.keys().next_back() {
            Some(&(last, _)) => {
                let delta = last.saturating_sub(self.now);
                self.advance(page, delta)
            }
            None => 0,
        }
    }
}

impl Scheduler for TimerQueue {
    fn schedule(&mut self, delay: Duration, task: Task) {
        let ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        let due = self.now.saturating_add(ms);
        self.pending.insert((due, self.seq), task);
        self.seq += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wisp_dom::{AbortReason, ArenaLimits, DomError};

    fn page() -> Page {
        Page::new(ArenaLimits::default(), "about:blank").unwrap()
    }

    #[test]
    fn test_timeout_fires_on_deadline() {
        let mut page = page();
        let mut timers = TimerQueue::new();
        let signal = page.abort_signal_timeout(100, &mut timers);
        assert_eq!(timers.next_deadline(), Some(100));

        assert_eq!(timers.advance(&mut page, 99), 0);
        assert!(!page.signal_aborted(signal));
        assert_eq!(timers.advance(&mut page, 1), 1);
        assert_eq!(page.signal_reason(signal), Some(&AbortReason::Timeout));
        assert_eq!(page.throw_if_aborted(signal), Err(DomError::Timeout));
        assert_eq!(timers.now(), 100);
        assert!(timers.is_empty());
    }

    #[test]
    fn test_deadline_order() {
        let mut page = page();
        let mut timers = TimerQueue::new();
        let late = page.abort_signal_timeout(50, &mut timers);
        let early = page.abort_signal_timeout(10, &mut timers);
        assert_eq!(timers.len(), 2);

        timers.advance(&mut page, 20);
        assert!(page.signal_aborted(early));
        assert!(!page.signal_aborted(late));
        assert_eq!(timers.run_until_idle(&mut page), 1);
        assert!(page.signal_aborted(late));
        assert_eq!(timers.now(), 50);
    }

    #[test]
    fn test_schedule_is_relative_to_now() {
        let mut page = page();
        let mut timers = TimerQueue::new();
        timers.advance(&mut page, 1000);
        page.abort_signal_timeout(5, &mut timers);
        assert_eq!(timers.next_deadline(), Some(1005));
    }
}
