//! Request status and the read model handed to rendering layers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::steps::StepId;

/// Lifecycle status of the generation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    /// No request has run since the last reset.
    #[default]
    Idle,
    /// A request is in flight.
    Active,
    /// The last request completed.
    Completed,
    /// The last request was cancelled.
    Cancelled,
}

impl RequestStatus {
    /// Check if a request is in flight.
    pub fn is_active(self) -> bool {
        self == Self::Active
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// How the collaborator performing the real request saw it end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    Completed,
    Cancelled,
}

impl std::fmt::Display for RequestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Completed => write!(f, "completed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for RequestOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "completed" => Ok(Self::Completed),
            "cancelled" | "canceled" => Ok(Self::Cancelled),
            other => Err(format!("unknown outcome: {other}")),
        }
    }
}

/// Point-in-time view of a form session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormProgressSnapshot {
    /// Identifier of the current form session.
    pub session_id: String,

    /// Current step, possibly the request-completed step.
    pub current_step: StepId,

    /// Request lifecycle status.
    pub status: RequestStatus,

    pub is_request_active: bool,

    /// Request progress, 0-100.
    pub progress: u8,

    /// Position through the declared steps, 0-100.
    pub form_completion_percentage: u8,

    /// Blend of form completion and request progress, 0-100.
    pub overall_progress: u8,

    /// When the current or last request started.
    pub request_started_at: Option<DateTime<Utc>>,

    /// When the last request completed or was cancelled.
    pub request_settled_at: Option<DateTime<Utc>>,
}
