// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a provisioning request.
///
/// Transitions are monotonic along `received -> preparing -> transferring ->
/// ready`; `error` is reachable from any non-terminal state. `ready` and
/// `error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestState {
    Received,
    Preparing,
    Transferring,
    Ready,
    Error,
}

impl RequestState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Received => "received",
            Self::Preparing => "preparing",
            Self::Transferring => "transferring",
            Self::Ready => "ready",
            Self::Error => "error",
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }

    /// Position along the success path; `error` sorts last so that any
    /// observed state sequence is non-decreasing in rank.
    pub fn rank(self) -> u8 {
        match self {
            Self::Received => 0,
            Self::Preparing => 1,
            Self::Transferring => 2,
            Self::Ready => 3,
            Self::Error => 4,
        }
    }

    pub fn can_advance_to(self, next: RequestState) -> bool {
        if self.is_terminal() {
            return false;
        }
        match next {
            Self::Error => true,
            _ => next.rank() > self.rank(),
        }
    }
}

impl std::fmt::Display for RequestState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "received" => Ok(Self::Received),
            "preparing" => Ok(Self::Preparing),
            "transferring" => Ok(Self::Transferring),
            "ready" => Ok(Self::Ready),
            "error" => Ok(Self::Error),
            other => Err(UnknownState(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown request state '{0}'")]
pub struct UnknownState(pub String);

#[derive(Debug, Error)]
#[error("illegal state transition {from} -> {to}")]
pub struct StateTransitionError {
    pub from: RequestState,
    pub to: RequestState,
}

/// A single provisioning request, keyed by a caller-supplied id.
///
/// `info` is an open payload accumulated across the pipeline (account name,
/// encrypted secret, message, step diagnostics); the request store treats it
/// as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub id: String,
    pub owner_contact: String,
    pub source_path: String,
    pub validity_days: u32,
    pub state: RequestState,
    pub info: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TransferRequest {
    pub fn new(
        id: impl Into<String>,
        owner_contact: impl Into<String>,
        source_path: impl Into<String>,
        validity_days: u32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            owner_contact: owner_contact.into(),
            source_path: source_path.into(),
            validity_days,
            state: RequestState::Received,
            info: serde_json::Value::Object(serde_json::Map::new()),
            created_at: now,
            updated_at: now,
        }
    }

    /// Advance the state machine, rejecting regressions and any transition
    /// out of a terminal state.
    pub fn advance(&mut self, next: RequestState) -> Result<(), StateTransitionError> {
        if !self.state.can_advance_to(next) {
            return Err(StateTransitionError {
                from: self.state,
                to: next,
            });
        }
        self.state = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}
