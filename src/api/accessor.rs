use super::envelope::Envelope;
use super::error::{AccessorError, ApiResult};
use super::{Operation, Transport};
use crate::models::wire::{
    self, WireHistory, WireLeagueMetrics, WireLicense, WireMatchList, WireNewsFeed,
    WirePrediction, WireStandings, WireSubscription, WireTrending,
};
use crate::models::{
    HistoricalPrediction, LeagueId, LeagueMetrics, LicenseVerification, Match, MatchPrediction,
    NewsItem, PredictionRequest, StandingRow, SubscriptionReceipt, SubscriptionRequest,
    TrendingTopic,
};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Typed accessor: one method per logical backend operation.
///
/// Each method sends one request through the transport, bounded by
/// `timeout`, then decodes and normalizes the `{ data }` envelope.
pub struct RemoteAccessor<T> {
    transport: T,
    timeout: Duration,
}

impl<T: Transport> RemoteAccessor<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    async fn invoke(&self, operation: Operation, payload: Value) -> ApiResult<Envelope<Value>> {
        debug!(operation = operation.name(), "remote call");
        match tokio::time::timeout(self.timeout, self.transport.call(operation, payload)).await {
            Ok(result) => result,
            Err(_) => Err(AccessorError::Timeout(self.timeout)),
        }
    }

    pub async fn fetch_live_matches(&self, league: LeagueId) -> ApiResult<Envelope<Vec<Match>>> {
        self.invoke(Operation::LiveMatches, json!({ "league_id": league }))
            .await?
            .decode::<WireMatchList>()?
            .try_map(wire::into_matches)
    }

    pub async fn fetch_upcoming_matches(
        &self,
        league: LeagueId,
    ) -> ApiResult<Envelope<Vec<Match>>> {
        self.invoke(Operation::UpcomingMatches, json!({ "league_id": league }))
            .await?
            .decode::<WireMatchList>()?
            .try_map(wire::into_matches)
    }

    pub async fn fetch_standings(&self, league: LeagueId) -> ApiResult<Envelope<Vec<StandingRow>>> {
        self.invoke(Operation::Standings, json!({ "league_id": league }))
            .await?
            .decode::<WireStandings>()?
            .try_map(wire::into_standings)
    }

    pub async fn fetch_news_feed(&self, league: LeagueId) -> ApiResult<Envelope<Vec<NewsItem>>> {
        self.invoke(Operation::NewsFeed, json!({ "league_id": league }))
            .await?
            .decode::<WireNewsFeed>()?
            .try_map(wire::into_news)
    }

    pub async fn fetch_trending_topics(
        &self,
        league: LeagueId,
    ) -> ApiResult<Envelope<Vec<TrendingTopic>>> {
        Ok(self
            .invoke(Operation::TrendingTopics, json!({ "league_id": league }))
            .await?
            .decode::<WireTrending>()?
            .map(wire::into_trending))
    }

    pub async fn fetch_league_metrics(
        &self,
        league: LeagueId,
    ) -> ApiResult<Envelope<LeagueMetrics>> {
        Ok(self
            .invoke(Operation::LeagueMetrics, json!({ "league_id": league }))
            .await?
            .decode::<WireLeagueMetrics>()?
            .map(wire::into_league_metrics))
    }

    pub async fn fetch_historical_predictions(
        &self,
        league: LeagueId,
        year: i32,
    ) -> ApiResult<Envelope<Vec<HistoricalPrediction>>> {
        self.invoke(
            Operation::HistoricalPredictions,
            json!({ "league_id": league, "season": year }),
        )
        .await?
        .decode::<WireHistory>()?
        .try_map(wire::into_history)
    }

    pub async fn predict_match(
        &self,
        request: &PredictionRequest,
    ) -> ApiResult<Envelope<MatchPrediction>> {
        let payload =
            serde_json::to_value(request).map_err(|e| AccessorError::Malformed(e.to_string()))?;
        Ok(self
            .invoke(Operation::PredictMatch, payload)
            .await?
            .decode::<WirePrediction>()?
            .map(|p| wire::into_prediction(p, &request.home_team, &request.away_team)))
    }

    /// A `valid: false` answer is reported as [`AccessorError::Server`] with the server's text
    pub async fn verify_license(
        &self,
        license_key: &str,
    ) -> ApiResult<Envelope<LicenseVerification>> {
        let envelope = self
            .invoke(Operation::VerifyLicense, json!({ "license_key": license_key }))
            .await?
            .decode::<WireLicense>()?
            .try_map(wire::into_license)?;
        match envelope.data {
            Ok(verification) => Ok(Envelope::new(verification)),
            Err(message) => Err(AccessorError::Server(message)),
        }
    }

    pub async fn create_subscription(
        &self,
        request: &SubscriptionRequest,
    ) -> ApiResult<Envelope<SubscriptionReceipt>> {
        let payload =
            serde_json::to_value(request).map_err(|e| AccessorError::Malformed(e.to_string()))?;
        Ok(self
            .invoke(Operation::CreateSubscription, payload)
            .await?
            .decode::<WireSubscription>()?
            .map(wire::into_subscription))
    }
}
