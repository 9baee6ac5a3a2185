//! Request state machine.
//!
//! ```text
//! idle      -> loading
//! loading   -> succeeded
//! loading   -> failed
//! loading   -> loading    (overlapping trigger)
//! succeeded -> loading
//! failed    -> loading
//! ```
//!
//! There is no terminal state; a request can be re-triggered indefinitely.

use std::fmt;
use std::str::FromStr;

use crate::outcome::MealPlanOutcome;

/// Status of the meal plan request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    Idle,
    Loading,
    Succeeded,
    Failed,
}

impl RequestStatus {
    /// Check whether `from -> to` is an edge in the state graph.
    pub fn can_transition(from: Self, to: Self) -> bool {
        matches!(
            (from, to),
            (_, Self::Loading) | (Self::Loading, Self::Succeeded) | (Self::Loading, Self::Failed)
        )
    }

    /// Whether a request has resolved into this status.
    pub fn is_resolved(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}

impl FromStr for RequestStatus {
    type Err = RequestStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "idle" => Ok(Self::Idle),
            "loading" => Ok(Self::Loading),
            "succeeded" => Ok(Self::Succeeded),
            "failed" => Ok(Self::Failed),
            other => Err(RequestStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`RequestStatus`] string.
#[derive(Debug, Clone)]
pub struct RequestStatusParseError(pub String);

impl fmt::Display for RequestStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid request status: {:?}", self.0)
    }
}

impl std::error::Error for RequestStatusParseError {}

// ---------------------------------------------------------------------------

/// Status plus the text to display for it.
///
/// The fields are private so the only way to produce a state is through the
/// lifecycle constructors below. A loading state never carries result text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestState {
    status: RequestStatus,
    result_text: Option<String>,
}

impl RequestState {
    /// State at screen mount.
    pub fn idle() -> Self {
        Self {
            status: RequestStatus::Idle,
            result_text: None,
        }
    }

    pub fn loading() -> Self {
        Self {
            status: RequestStatus::Loading,
            result_text: None,
        }
    }

    /// State after a request resolved with `outcome`.
    pub fn resolved(outcome: &MealPlanOutcome) -> Self {
        match outcome {
            MealPlanOutcome::Success { text } => Self {
                status: RequestStatus::Succeeded,
                result_text: Some(text.clone()),
            },
            MealPlanOutcome::Failure { message } => Self {
                status: RequestStatus::Failed,
                result_text: Some(message.clone()),
            },
        }
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn result_text(&self) -> Option<&str> {
        self.result_text.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.status == RequestStatus::Loading
    }
}

impl Default for RequestState {
    fn default() -> Self {
        Self::idle()
    }
}
