//! State machine for tracking a strategy's lifecycle
//!
//! Every transition is validated and appended to a bounded history so the
//! status surface can report how a target got into its current state.

use crate::core::error::PublishError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum number of transitions kept per strategy
const HISTORY_LIMIT: usize = 64;

/// Strategy lifecycle state
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyState {
    Uninitialized,
    Initializing,
    Ready,
    Publishing,
    Published,
    Failed,
    CleanedUp,
}

impl StrategyState {
    /// Check whether `to` is a legal next state
    pub fn can_transition_to(self, to: StrategyState) -> bool {
        use StrategyState::*;

        matches!(
            (self, to),
            (Uninitialized, Initializing)
                | (CleanedUp, Initializing)
                | (Initializing, Ready)
                | (Initializing, Uninitialized)
                | (Ready, Publishing)
                | (Publishing, Published)
                | (Publishing, Failed)
                | (Published, Ready)
                | (Failed, Ready)
                | (Uninitialized, CleanedUp)
                | (Ready, CleanedUp)
        )
    }
}

/// State transition
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StateTransition {
    pub from: StrategyState,
    pub to: StrategyState,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// State machine for one strategy instance
#[derive(Debug, Clone)]
pub struct StrategyStateMachine {
    target: String,
    current_state: StrategyState,
    transitions: VecDeque<StateTransition>,
}

impl StrategyStateMachine {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            current_state: StrategyState::Uninitialized,
            transitions: VecDeque::new(),
        }
    }

    /// Transition to a new state
    pub fn transition(
        &mut self,
        to: StrategyState,
        note: Option<String>,
    ) -> Result<(), PublishError> {
        if !self.current_state.can_transition_to(to) {
            return Err(PublishError::InvalidState {
                target: self.target.clone(),
                state: format!("{:?} → {:?}", self.current_state, to),
            });
        }

        tracing::debug!(
            platform = %self.target,
            from = ?self.current_state,
            to = ?to,
            "strategy state transition"
        );

        if self.transitions.len() == HISTORY_LIMIT {
            self.transitions.pop_front();
        }
        self.transitions.push_back(StateTransition {
            from: self.current_state,
            to,
            timestamp: Utc::now(),
            note,
        });
        self.current_state = to;

        Ok(())
    }

    pub fn get_state(&self) -> StrategyState {
        self.current_state
    }

    pub fn is_ready(&self) -> bool {
        self.current_state == StrategyState::Ready
    }

    /// Last note recorded on a transition into `Failed` or `Uninitialized`
    pub fn get_last_error(&self) -> Option<&str> {
        self.transitions
            .iter()
            .rev()
            .find(|t| matches!(t.to, StrategyState::Failed | StrategyState::Uninitialized))
            .and_then(|t| t.note.as_deref())
    }

    pub fn transitions(&self) -> impl Iterator<Item = &StateTransition> {
        self.transitions.iter()
    }

    /// Get transition history as human-readable string
    pub fn get_history(&self) -> String {
        self.transitions
            .iter()
            .map(|t| {
                let note = t
                    .note
                    .as_ref()
                    .map(|n| format!(" ({})", n))
                    .unwrap_or_default();
                format!("{}: {:?} → {:?}{}", t.timestamp.to_rfc3339(), t.from, t.to, note)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
