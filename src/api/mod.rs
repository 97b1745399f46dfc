pub mod accessor;
pub mod callable;
pub mod envelope;
pub mod error;
pub mod live_scores;

#[cfg(test)]
pub(crate) mod fake;

pub use accessor::RemoteAccessor;
pub use envelope::Envelope;
pub use error::{AccessorError, ApiResult};

use crate::config::Config;
use callable::CallableClient;
use live_scores::LiveScoresClient;
use once_cell::sync::OnceCell;
use reqwest::Client;
use serde_json::Value;
use std::future::Future;
use std::time::Duration;

/// Remote operations exposed by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    LiveMatches,
    UpcomingMatches,
    Standings,
    NewsFeed,
    TrendingTopics,
    LeagueMetrics,
    HistoricalPredictions,
    PredictMatch,
    VerifyLicense,
    CreateSubscription,
}

impl Operation {
    /// Callable function name
    pub fn name(&self) -> &'static str {
        match self {
            Operation::LiveMatches => "getLiveMatches",
            Operation::UpcomingMatches => "getUpcomingMatches",
            Operation::Standings => "getLeagueStandings",
            Operation::NewsFeed => "getNewsFeed",
            Operation::TrendingTopics => "getTrendingTopics",
            Operation::LeagueMetrics => "getLeagueMetrics",
            Operation::HistoricalPredictions => "getHistoricalPredictions",
            Operation::PredictMatch => "predictMatch",
            Operation::VerifyLicense => "verifyLicense",
            Operation::CreateSubscription => "createSubscription",
        }
    }
}

/// Request/response seam between the accessor and the network.
///
/// One call is one independent, at-most-once request: no retries, caching
/// or batching happen below this trait.
pub trait Transport: Send + Sync + 'static {
    fn call(
        &self,
        operation: Operation,
        payload: Value,
    ) -> impl Future<Output = ApiResult<Envelope<Value>>> + Send;
}

static CLIENT: OnceCell<Client> = OnceCell::new();

/// Process-wide HTTP client; the timeout of the first caller wins
pub fn shared_client(timeout: Duration) -> ApiResult<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(timeout)
            .user_agent(concat!("prediction_widgets/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(AccessorError::from)
    })
}

/// Production transport: callable functions plus the direct live-score POST
#[derive(Debug, Clone)]
pub struct HttpTransport {
    callable: CallableClient,
    live_scores: LiveScoresClient,
}

impl HttpTransport {
    pub fn new(config: &Config) -> ApiResult<Self> {
        let client = shared_client(config.request_timeout)?.clone();
        Ok(Self {
            callable: CallableClient::new(client.clone(), config.functions_base_url.clone()),
            live_scores: LiveScoresClient::new(client, config.live_scores_url.clone()),
        })
    }
}

impl Transport for HttpTransport {
    async fn call(&self, operation: Operation, payload: Value) -> ApiResult<Envelope<Value>> {
        match operation {
            Operation::LiveMatches => self.live_scores.post(payload).await,
            other => self.callable.call(other.name(), payload).await,
        }
    }
}
