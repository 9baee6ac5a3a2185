//! Result of a single generation request, and how a payload becomes text.

use serde_json::Value;

use crate::backend::BackendError;

/// Name of the payload field carrying the generated plan.
pub const MEAL_PLAN_FIELD: &str = "meal_plan";

/// What a generation request resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MealPlanOutcome {
    Success { text: String },
    Failure { message: String },
}

impl MealPlanOutcome {
    pub fn from_payload(payload: &Value) -> Self {
        Self::Success {
            text: display_text(payload),
        }
    }

    pub fn from_error(err: &BackendError) -> Self {
        Self::Failure {
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// The text shown in place of the result.
    pub fn text(&self) -> &str {
        match self {
            Self::Success { text } => text,
            Self::Failure { message } => message,
        }
    }
}

impl From<Result<Value, BackendError>> for MealPlanOutcome {
    fn from(result: Result<Value, BackendError>) -> Self {
        match result {
            Ok(payload) => Self::from_payload(&payload),
            Err(e) => Self::from_error(&e),
        }
    }
}

/// Render a payload for display.
///
/// A string `meal_plan` field is shown verbatim, any other non-null
/// `meal_plan` value is pretty-printed, and without one the whole payload is
/// pretty-printed.
pub fn display_text(payload: &Value) -> String {
    match payload.get(MEAL_PLAN_FIELD) {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Null) | None => pretty(payload),
        Some(other) => pretty(other),
    }
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
