use std::convert::TryFrom;
use std::fmt;

use thiserror::Error;

/// What a destructive action applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmTarget {
    pub id: String,
    pub label: String,
}

impl ConfirmTarget {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfirmState {
    #[default]
    Closed,
    Confirming(ConfirmTarget),
    Working(ConfirmTarget),
    Failed(ConfirmTarget, String),
}

impl fmt::Display for ConfirmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "Closed"),
            Self::Confirming(target) => write!(f, "Confirming({})", target.label),
            Self::Working(target) => write!(f, "Working({})", target.label),
            Self::Failed(target, _) => write!(f, "Failed({})", target.label),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmEvent {
    Open(ConfirmTarget),
    Accept,
    Cancel,
    Done,
    Error(String),
}

impl fmt::Display for ConfirmEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open(target) => write!(f, "Open({})", target.label),
            Self::Accept => write!(f, "Accept"),
            Self::Cancel => write!(f, "Cancel"),
            Self::Done => write!(f, "Done"),
            Self::Error(msg) => write!(f, "Error({msg})"),
        }
    }
}

#[derive(Debug, Error)]
#[error("Invalid transition from {from} with event {event}")]
pub struct ConfirmTransitionError {
    pub from: ConfirmState,
    pub event: ConfirmEvent,
}

struct NextState(ConfirmState);

impl TryFrom<(&ConfirmState, ConfirmEvent)> for NextState {
    type Error = ConfirmTransitionError;

    fn try_from(value: (&ConfirmState, ConfirmEvent)) -> Result<Self, Self::Error> {
        let (current, event) = value;

        let next = match (current, event) {
            (ConfirmState::Closed, ConfirmEvent::Open(target)) => ConfirmState::Confirming(target),
            (ConfirmState::Confirming(_) | ConfirmState::Failed(..), ConfirmEvent::Cancel)
            | (ConfirmState::Working(_), ConfirmEvent::Done) => ConfirmState::Closed,
            // Accept on a failure retries the same target.
            (
                ConfirmState::Confirming(target) | ConfirmState::Failed(target, _),
                ConfirmEvent::Accept,
            ) => ConfirmState::Working(target.clone()),
            (ConfirmState::Working(target), ConfirmEvent::Error(msg)) => {
                ConfirmState::Failed(target.clone(), msg)
            }
            (_, event) => {
                return Err(ConfirmTransitionError {
                    from: current.clone(),
                    event,
                })
            }
        };
        Ok(Self(next))
    }
}

/// Confirmation popup guarding destructive actions.
#[derive(Debug, Clone, Default)]
pub struct ConfirmDialog {
    state: ConfirmState,
}

impl ConfirmDialog {
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn state(&self) -> &ConfirmState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != ConfirmState::Closed
    }

    pub const fn target(&self) -> Option<&ConfirmTarget> {
        match &self.state {
            ConfirmState::Closed => None,
            ConfirmState::Confirming(target)
            | ConfirmState::Working(target)
            | ConfirmState::Failed(target, _) => Some(target),
        }
    }

    /// Applies `event`. On an invalid transition the state is left as is.
    pub fn process(
        &mut self,
        event: ConfirmEvent,
    ) -> Result<&ConfirmState, ConfirmTransitionError> {
        let next = NextState::try_from((&self.state, event))?;
        self.state = next.0;
        Ok(&self.state)
    }
}
