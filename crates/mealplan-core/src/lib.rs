//! Core of the meal plan client: configuration, the request state machine,
//! the server adapter, and the requester that ties them together.

pub mod backend;
pub mod config;
pub mod outcome;
pub mod requester;
pub mod state;

pub use backend::{BackendError, HttpBackend, MealPlanBackend};
pub use config::{ClientConfig, ConfigError, UserId};
pub use outcome::MealPlanOutcome;
pub use requester::MealPlanRequester;
pub use state::{RequestState, RequestStatus};
