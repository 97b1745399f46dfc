pub mod checkout;
pub mod expansion;
pub mod league_metrics;
pub mod live_matches;
pub mod login;
pub mod manual_odds;
pub mod news_feed;
pub mod standings;
pub mod upcoming;
pub mod weekly_results;

use crate::api::{ApiResult, Envelope};
use serde::Serialize;
use tracing::warn;

/// View state of a widget whose data is required for the view to make sense
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "state", content = "value", rename_all = "snake_case")]
pub enum LoadState<T> {
    Idle,
    Loaded(T),
    /// Visible error banner text
    Failed(String),
}

impl<T> Default for LoadState<T> {
    fn default() -> Self {
        LoadState::Idle
    }
}

impl<T> LoadState<T> {
    /// Required data: failures become a visible message
    pub fn from_result(what: &str, result: ApiResult<Envelope<T>>) -> Self {
        match result {
            Ok(envelope) => LoadState::Loaded(envelope.data),
            Err(e) => {
                warn!("Failed to load {}: {}", what, e);
                LoadState::Failed(e.user_message())
            }
        }
    }

    pub fn loaded(&self) -> Option<&T> {
        match self {
            LoadState::Loaded(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            LoadState::Failed(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> LoadState<U> {
        match self {
            LoadState::Idle => LoadState::Idle,
            LoadState::Loaded(value) => LoadState::Loaded(f(value)),
            LoadState::Failed(msg) => LoadState::Failed(msg),
        }
    }
}

/// Optional data: failures are logged and downgraded to the empty value
pub fn or_empty<T: Default>(what: &str, result: ApiResult<Envelope<T>>) -> T {
    match result {
        Ok(envelope) => envelope.data,
        Err(e) => {
            warn!("{} unavailable: {}", what, e);
            T::default()
        }
    }
}
