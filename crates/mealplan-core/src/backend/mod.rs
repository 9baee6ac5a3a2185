//! The `MealPlanBackend` trait -- the adapter interface for the meal plan
//! server.
//!
//! [`HttpBackend`] talks to the real server over HTTP. Tests substitute
//! scripted implementations. The trait is object-safe so the requester can
//! hold an `Arc<dyn MealPlanBackend>`.

mod http;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::config::UserId;
use crate::outcome::display_text;

pub use http::HttpBackend;

/// Default number of history entries requested.
pub const DEFAULT_HISTORY_LIMIT: u32 = 10;

/// Errors returned by a [`MealPlanBackend`].
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("could not reach meal plan server at {url}: {message}")]
    Transport { url: String, message: String },

    #[error("meal plan server returned HTTP {status}{}", detail_suffix(.detail))]
    Status {
        status: u16,
        detail: Option<String>,
    },

    #[error("meal plan server sent an invalid JSON response: {0}")]
    Decode(String),

    #[error("base URL {0} cannot carry a request path")]
    InvalidBaseUrl(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail.as_deref().map(|d| format!(": {d}")).unwrap_or_default()
}

/// Adapter interface for the meal plan server.
#[async_trait]
pub trait MealPlanBackend: Send + Sync {
    /// Ask the server to generate a meal plan for `user_id`.
    ///
    /// The payload is opaque; callers decide how to display it.
    async fn generate(&self, user_id: &UserId) -> Result<Value, BackendError>;

    /// Fetch up to `limit` previously generated plans, newest first.
    async fn history(&self, user_id: &UserId, limit: u32) -> Result<MealPlanHistory, BackendError>;

    /// Probe the server's health endpoint.
    async fn health(&self) -> Result<HealthStatus, BackendError>;
}

// Compile-time assertion: MealPlanBackend must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn MealPlanBackend) {}
};

// ---------------------------------------------------------------------------
// Response types
// ---------------------------------------------------------------------------

/// Body of `GET /users/{id}/mealplans`.
#[derive(Debug, Clone, Deserialize)]
pub struct MealPlanHistory {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user_id: Option<Value>,
    #[serde(default)]
    pub history: Vec<HistoryEntry>,
}

/// One stored meal plan. Column names follow the server's table.
#[derive(Debug, Clone, Deserialize)]
pub struct HistoryEntry {
    pub id: i64,
    #[serde(rename = "Generated_meals", default)]
    pub generated_meals: Option<Value>,
    #[serde(rename = "Ingredients_used", default)]
    pub ingredients_used: Option<Value>,
    #[serde(rename = "User_feedback", default)]
    pub user_feedback: Option<Value>,
    #[serde(rename = "Energy_levels", default)]
    pub energy_levels: Option<String>,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
}

impl HistoryEntry {
    /// The stored plan as display text, if any was saved.
    pub fn meal_plan_text(&self) -> Option<String> {
        match &self.generated_meals {
            None | Some(Value::Null) => None,
            Some(Value::String(raw)) => Some(raw.clone()),
            Some(meals) => Some(display_text(meals)),
        }
    }
}

/// Body of `GET /health`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct HealthStatus {
    pub status: String,
}

impl HealthStatus {
    pub fn is_healthy(&self) -> bool {
        self.status == "healthy"
    }
}
