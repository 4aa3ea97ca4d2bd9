//! Scheduler interface
//!
//! The core never keeps time. Work that must happen later is handed to a
//! [`Scheduler`] as a [`Task`]; the embedder calls [`Page::run_task`] when
//! the task is due.

use std::time::Duration;

use crate::abort::{AbortReason, SignalId};
use crate::page::Page;

/// Deferred work the core asks the embedder to run
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Task {
    /// `AbortSignal.timeout` expiry
    AbortSignalTimeout(SignalId),
}

/// Timer source supplied by the embedder
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, task: Task);
}

impl Page {
    /// Run a task previously handed to a [`Scheduler`]
    pub fn run_task(&mut self, task: Task) {
        tracing::trace!(?task, "run task");
        match task {
            Task::AbortSignalTimeout(signal) => self.abort_signal(signal, Some(AbortReason::Timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::ArenaLimits;
    use crate::DomError;

    #[derive(Default)]
    struct Recorder(Vec<(Duration, Task)>);

    impl Scheduler for Recorder {
        fn schedule(&mut self, delay: Duration, task: Task) {
            self.0.push((delay, task));
        }
    }

    #[test]
    fn test_timeout_signal_via_scheduler() {
        let mut page = Page::new(ArenaLimits::default(), "about:blank").unwrap();
        let mut sched = Recorder::default();
        let signal = page.abort_signal_timeout(250, &mut sched);
        assert_eq!(sched.0, vec![(Duration::from_millis(250), Task::AbortSignalTimeout(signal))]);
        assert!(!page.signal_aborted(signal));

        page.run_task(sched.0[0].1);
        assert_eq!(page.throw_if_aborted(signal), Err(DomError::Timeout));
    }
}
