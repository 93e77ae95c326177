//! Per-pane serializer for structural tab operations.
//!
//! Exactly one command runs per pane. Commands that arrive while one is in
//! flight queue up in arrival order and start as soon as the pane is idle.

use crate::kernel::machine::{DispatchResult, StateMachine};
use crate::kernel::route::OpenSource;
use crate::kernel::language::ViewKind;
use crate::kernel::services::ports::PaneItem;
use crate::models::{PaneId, PaneItemId, WorkspaceId};
use serde::Serialize;
use std::collections::VecDeque;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PaneState {
    Idle,
    Closing,
    Activating,
    Opening,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub path: PathBuf,
    pub view_kind: Option<ViewKind>,
    pub source: Option<OpenSource>,
    pub base_ref: Option<String>,
    pub target_ref: Option<String>,
}

impl OpenRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            view_kind: None,
            source: None,
            base_ref: None,
            target_ref: None,
        }
    }

    pub fn with_view(mut self, view_kind: ViewKind) -> Self {
        self.view_kind = Some(view_kind);
        self
    }

    pub fn with_source(mut self, source: OpenSource) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_diff(mut self, base_ref: impl Into<String>, target_ref: impl Into<String>) -> Self {
        self.base_ref = Some(base_ref.into());
        self.target_ref = Some(target_ref.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaneCommand {
    Close {
        item_id: PaneItemId,
        path: PathBuf,
    },
    Activate(PaneItem),
    Open(OpenRequest),
}

impl PaneCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Close { .. } => "close",
            Self::Activate(_) => "activate",
            Self::Open(_) => "open",
        }
    }

    fn busy_state(&self) -> PaneState {
        match self {
            Self::Close { .. } => PaneState::Closing,
            Self::Activate(_) => PaneState::Activating,
            Self::Open(_) => PaneState::Opening,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaneEvent {
    Command(PaneCommand),
    Settled,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaneEffect {
    Run {
        workspace_id: WorkspaceId,
        pane_id: PaneId,
        command: PaneCommand,
    },
}

#[derive(Debug, Clone)]
pub struct PaneMachine {
    workspace_id: WorkspaceId,
    pane_id: PaneId,
    state: PaneState,
    queue: VecDeque<PaneCommand>,
}

impl PaneMachine {
    pub fn new(workspace_id: WorkspaceId, pane_id: PaneId) -> Self {
        Self {
            workspace_id,
            pane_id,
            state: PaneState::Idle,
            queue: VecDeque::new(),
        }
    }

    pub fn pane_id(&self) -> PaneId {
        self.pane_id
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        self.state == PaneState::Idle && self.queue.is_empty()
    }

    /// Feeds one event, then starts the next queued command if the pane
    /// went idle.
    pub fn handle(&mut self, event: PaneEvent) -> DispatchResult<PaneEffect> {
        let mut result = self.dispatch(event);
        if self.state == PaneState::Idle {
            if let Some(next) = self.queue.pop_front() {
                let started = self.dispatch(PaneEvent::Command(next));
                result.effects.extend(started.effects);
                result.state_changed |= started.state_changed;
            }
        }
        result
    }
}

impl StateMachine for PaneMachine {
    type State = PaneState;
    type Event = PaneEvent;
    type Effect = PaneEffect;

    fn name(&self) -> &'static str {
        "pane"
    }

    fn state(&self) -> PaneState {
        self.state
    }

    fn set_state(&mut self, state: PaneState) {
        self.state = state;
    }

    fn event_name(event: &PaneEvent) -> &'static str {
        match event {
            PaneEvent::Command(command) => command.name(),
            PaneEvent::Settled => "settled",
        }
    }

    fn next_state(&self, event: &PaneEvent) -> Option<PaneState> {
        match (self.state, event) {
            (PaneState::Idle, PaneEvent::Command(command)) => Some(command.busy_state()),
            (PaneState::Idle, PaneEvent::Settled) => None,
            (_, PaneEvent::Settled) => Some(PaneState::Idle),
            (_, PaneEvent::Command(_)) => None,
        }
    }

    fn defer(&mut self, event: &PaneEvent) -> bool {
        match event {
            PaneEvent::Command(command) => {
                self.queue.push_back(command.clone());
                true
            }
            PaneEvent::Settled => false,
        }
    }

    fn enter(&mut self, entered: PaneState, event: PaneEvent) -> Vec<PaneEffect> {
        match (entered, event) {
            (PaneState::Idle, _) => Vec::new(),
            (_, PaneEvent::Command(command)) => vec![PaneEffect::Run {
                workspace_id: self.workspace_id,
                pane_id: self.pane_id,
                command,
            }],
            (_, PaneEvent::Settled) => Vec::new(),
        }
    }
}

#[cfg(test)]
#[path = "../../../tests/unit/kernel/pane/machine.rs"]
mod tests;
