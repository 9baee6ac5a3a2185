use std::env;
use std::fmt;

use reqwest::Url;

/// Errors raised while building a [`ClientConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("unsupported URL scheme {0:?} (expected http or https)")]
    UnsupportedScheme(String),

    #[error("user id must not be empty")]
    EmptyUserId,
}

/// Identifier of the user whose meal plan is requested.
///
/// Stands in for an authenticated user context; it is never derived from a
/// session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Result<Self, ConfigError> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(ConfigError::EmptyUserId);
        }
        Ok(Self(id))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client configuration: which server to talk to, on behalf of which user.
///
/// Reads from `MEALPLAN_BASE_URL` / `MEALPLAN_USER_ID`, falling back to the
/// local development server and the default user when unset.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: Url,
    pub user_id: UserId,
}

impl ClientConfig {
    /// Base URL used when nothing else is configured.
    pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

    /// User id used when nothing else is configured.
    pub const DEFAULT_USER_ID: &str = "Hassan";

    /// Build a config from explicit values (useful for tests and CLI flags).
    pub fn new(base_url: &str, user_id: impl Into<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            base_url: parse_base_url(base_url)?,
            user_id: UserId::new(user_id)?,
        })
    }

    /// Build a config from the environment.
    ///
    /// Priority: env vars, then the compile-time defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_url =
            env::var("MEALPLAN_BASE_URL").unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_owned());
        let user_id =
            env::var("MEALPLAN_USER_ID").unwrap_or_else(|_| Self::DEFAULT_USER_ID.to_owned());
        Self::new(&base_url, user_id)
    }

    /// The generation endpoint, encoded exactly as it is requested.
    pub fn generate_url(&self) -> String {
        join_segments(&self.base_url, &["mealplan", "generate", self.user_id.as_str()])
            .map(String::from)
            .unwrap_or_else(|| self.base_url.to_string())
    }
}

/// Append `segments` to `base`, percent-encoding each one.
///
/// Returns `None` when `base` cannot carry a path.
pub(crate) fn join_segments(base: &Url, segments: &[&str]) -> Option<Url> {
    let mut url = base.clone();
    url.path_segments_mut().ok()?.pop_if_empty().extend(segments);
    Some(url)
}

/// Parse and validate a server base URL.
///
/// The URL must use http(s) and be able to carry path segments.
pub fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|e| ConfigError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        other => return Err(ConfigError::UnsupportedScheme(other.to_owned())),
    }

    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl {
            url: raw.to_owned(),
            reason: "URL cannot carry a path".to_owned(),
        });
    }

    Ok(url)
}
