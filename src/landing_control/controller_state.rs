use serde::Serialize;
use std::collections::HashSet;
use std::sync::LazyLock;
use strum_macros::{Display, EnumIter};

/// Lifecycle of the landing loop. Only the control task ever changes it.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Display, EnumIter, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ControllerState {
    Idle,
    Starting,
    Running,
    Stopping,
    Faulted,
}

impl ControllerState {
    /// A new start request is only honoured from a resting state.
    pub fn accepts_start(self) -> bool {
        matches!(self, ControllerState::Idle | ControllerState::Faulted)
    }

    pub fn is_running(self) -> bool { self == ControllerState::Running }

    pub fn can_transition_to(self, next: ControllerState) -> bool {
        ALLOWED_TRANSITIONS.contains(&(self, next))
    }
}

static ALLOWED_TRANSITIONS: LazyLock<HashSet<(ControllerState, ControllerState)>> =
    LazyLock::new(|| {
        use ControllerState::{Faulted, Idle, Running, Starting, Stopping};
        HashSet::from([
            (Idle, Starting),
            (Faulted, Starting),
            (Starting, Running),
            (Starting, Faulted),
            (Starting, Stopping),
            (Running, Running),
            (Running, Faulted),
            (Running, Stopping),
            (Faulted, Stopping),
            (Stopping, Idle),
        ])
    });
