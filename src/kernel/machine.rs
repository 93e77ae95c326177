//! Minimal state-machine interpreter shared by the file and pane machines.
//!
//! A machine is a tagged-union state plus a pure transition table. Side
//! effects are produced only by entry actions of the state being entered and
//! are returned to the caller, never executed here.

use std::fmt::Debug;

#[derive(Debug)]
pub struct DispatchResult<E> {
    pub effects: Vec<E>,
    pub state_changed: bool,
}

impl<E> DispatchResult<E> {
    pub fn unchanged() -> Self {
        Self {
            effects: Vec::new(),
            state_changed: false,
        }
    }

    pub fn map<F, T>(self, f: F) -> DispatchResult<T>
    where
        F: FnMut(E) -> T,
    {
        DispatchResult {
            effects: self.effects.into_iter().map(f).collect(),
            state_changed: self.state_changed,
        }
    }
}

impl<E> Default for DispatchResult<E> {
    fn default() -> Self {
        Self::unchanged()
    }
}

pub trait StateMachine {
    type State: Copy + Eq + Debug;
    type Event;
    type Effect;

    fn name(&self) -> &'static str;

    fn state(&self) -> Self::State;

    fn set_state(&mut self, state: Self::State);

    /// Transition table. Reads context for guards, never mutates it.
    fn next_state(&self, event: &Self::Event) -> Option<Self::State>;

    /// Entry actions of `entered`, run after the state has been switched.
    fn enter(&mut self, entered: Self::State, event: Self::Event) -> Vec<Self::Effect>;

    /// Holds an event the current state cannot take yet. Returns true when
    /// the event was absorbed into context.
    fn defer(&mut self, _event: &Self::Event) -> bool {
        false
    }

    fn event_name(event: &Self::Event) -> &'static str;

    fn dispatch(&mut self, event: Self::Event) -> DispatchResult<Self::Effect> {
        let from = self.state();
        let Some(to) = self.next_state(&event) else {
            if self.defer(&event) {
                tracing::debug!(
                    machine = self.name(),
                    state = ?from,
                    event = Self::event_name(&event),
                    "event held until state settles"
                );
            } else {
                tracing::debug!(
                    machine = self.name(),
                    state = ?from,
                    event = Self::event_name(&event),
                    "event ignored"
                );
            }
            return DispatchResult::unchanged();
        };

        self.set_state(to);
        tracing::debug!(
            machine = self.name(),
            from = ?from,
            to = ?to,
            event = Self::event_name(&event),
            "transition"
        );
        let effects = self.enter(to, event);
        DispatchResult {
            effects,
            state_changed: from != to,
        }
    }
}
