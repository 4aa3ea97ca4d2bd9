//! AbortController / AbortSignal
//!
//! Signal state lives in the page's event registry so that aborting can
//! drop linked listeners and fire `abort` in one step.

use crate::events::{Event, EventInit, EventTarget, ListenerId};
use crate::page::Page;
use crate::scheduler::{Scheduler, Task};
use crate::{DomError, DomResult};

use std::time::Duration;

/// Handle to an abort signal
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SignalId(u32);

impl SignalId {
    #[inline]
    pub fn to_raw(self) -> u32 {
        self.0
    }
}

/// Why a signal was aborted
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AbortReason {
    /// Default `AbortError`
    #[default]
    Abort,
    /// From `AbortSignal.timeout`
    Timeout,
    Custom(String),
}

impl AbortReason {
    /// Exception thrown by `throwIfAborted`
    pub fn to_error(&self) -> DomError {
        match self {
            AbortReason::Abort => DomError::Abort("signal is aborted without reason".into()),
            AbortReason::Timeout => DomError::Timeout,
            AbortReason::Custom(reason) => DomError::Abort(reason.clone()),
        }
    }
}

#[derive(Debug, Default)]
struct SignalState {
    reason: Option<AbortReason>,
    /// Listeners registered with this signal
    linked: Vec<(EventTarget, String, ListenerId)>,
    /// Signals created by `any()` that follow this one
    dependents: Vec<SignalId>,
    /// Non-empty for signals created by `any()`
    sources: Vec<SignalId>,
}

/// State of every signal on a page
#[derive(Debug, Default)]
pub struct AbortSignals {
    slots: Vec<SignalState>,
}

impl AbortSignals {
    fn create(&mut self) -> SignalId {
        let id = SignalId(self.slots.len() as u32);
        self.slots.push(SignalState::default());
        id
    }

    fn state(&self, id: SignalId) -> Option<&SignalState> {
        self.slots.get(id.0 as usize)
    }

    fn state_mut(&mut self, id: SignalId) -> Option<&mut SignalState> {
        self.slots.get_mut(id.0 as usize)
    }

    pub fn is_aborted(&self, id: SignalId) -> bool {
        self.state(id).is_some_and(|s| s.reason.is_some())
    }

    pub fn reason(&self, id: SignalId) -> Option<&AbortReason> {
        self.state(id)?.reason.as_ref()
    }

    pub(crate) fn link(&mut self, id: SignalId, target: EventTarget, event_type: &str, listener: ListenerId) {
        if let Some(state) = self.state_mut(id) {
            state.linked.push((target, event_type.to_string(), listener));
        }
    }

    pub(crate) fn unlink(&mut self, id: SignalId, listener: ListenerId) {
        if let Some(state) = self.state_mut(id) {
            state.linked.retain(|(_, _, l)| *l != listener);
        }
    }

    /// Listeners still registered with `id`
    pub fn linked_count(&self, id: SignalId) -> usize {
        self.state(id).map_or(0, |s| s.linked.len())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// `AbortController`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AbortController {
    signal: SignalId,
}

impl AbortController {
    #[inline]
    pub fn signal(&self) -> SignalId {
        self.signal
    }

    /// `abort(reason)`
    pub fn abort(&self, page: &mut Page, reason: Option<AbortReason>) {
        page.abort_signal(self.signal, reason);
    }
}

impl Page {
    pub fn create_abort_controller(&mut self) -> AbortController {
        AbortController { signal: self.events.signals.create() }
    }

    /// Abort `id` and every dependent signal
    ///
    /// Each newly aborted signal drops the listeners registered with it and
    /// then receives a trusted `abort` event. Aborting twice is a no-op.
    pub fn abort_signal(&mut self, id: SignalId, reason: Option<AbortReason>) {
        let reason = reason.unwrap_or_default();
        let signals = &mut self.events.signals;
        let Some(state) = signals.state_mut(id) else {
            return;
        };
        if state.reason.is_some() {
            return;
        }
        state.reason = Some(reason.clone());
        let mut fired = vec![id];
        for dep in state.dependents.clone() {
            if let Some(dep_state) = signals.state_mut(dep) {
                if dep_state.reason.is_none() {
                    dep_state.reason = Some(reason.clone());
                    fired.push(dep);
                }
            }
        }
        tracing::debug!(signal = id.0, dependents = fired.len() - 1, ?reason, "abort signal");

        for signal in fired {
            let linked = self
                .events
                .signals
                .state_mut(signal)
                .map(|s| std::mem::take(&mut s.linked))
                .unwrap_or_default();
            for (target, event_type, listener) in linked {
                self.events.remove_listener_by_id(target, &event_type, listener);
            }
            let mut event = Event::new_trusted("abort", EventInit::default());
            if let Err(err) = self.dispatch_event(EventTarget::AbortSignal(signal), &mut event) {
                tracing::warn!(signal = signal.0, %err, "abort event not dispatched");
            }
        }
    }

    /// `AbortSignal.abort(reason)`: a signal that starts aborted
    pub fn aborted_signal(&mut self, reason: Option<AbortReason>) -> SignalId {
        let signals = &mut self.events.signals;
        let id = signals.create();
        if let Some(state) = signals.state_mut(id) {
            state.reason = Some(reason.unwrap_or_default());
        }
        id
    }

    /// `AbortSignal.timeout(ms)`: aborted with `Timeout` when the scheduler fires
    pub fn abort_signal_timeout(&mut self, ms: u64, scheduler: &mut dyn Scheduler) -> SignalId {
        let id = self.events.signals.create();
        scheduler.schedule(Duration::from_millis(ms), Task::AbortSignalTimeout(id));
        id
    }

    /// `AbortSignal.any(signals)`
    pub fn abort_signal_any(&mut self, sources: &[SignalId]) -> SignalId {
        let signals = &mut self.events.signals;
        let id = signals.create();
        if let Some(reason) = sources.iter().find_map(|&s| signals.reason(s).cloned()) {
            if let Some(state) = signals.state_mut(id) {
                state.reason = Some(reason);
            }
            return id;
        }
        let mut roots = Vec::new();
        for &source in sources {
            let Some(state) = signals.state(source) else {
                continue;
            };
            if state.sources.is_empty() {
                roots.push(source);
            } else {
                roots.extend(state.sources.iter().copied());
            }
        }
        roots.sort_unstable();
        roots.dedup();
        for &root in &roots {
            if let Some(state) = signals.state_mut(root) {
                state.dependents.push(id);
            }
        }
        if let Some(state) = signals.state_mut(id) {
            state.sources = roots;
        }
        id
    }

    /// `aborted`
    pub fn signal_aborted(&self, id: SignalId) -> bool {
        self.events.signals.is_aborted(id)
    }

    /// `reason`
    pub fn signal_reason(&self, id: SignalId) -> Option<&AbortReason> {
        self.events.signals.reason(id)
    }

    /// `throwIfAborted`
    pub fn throw_if_aborted(&self, id: SignalId) -> DomResult<()> {
        match self.signal_reason(id) {
            Some(reason) => Err(reason.to_error()),
            None => Ok(()),
        }
    }
}
