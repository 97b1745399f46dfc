use super::manual_odds::ManualOddsBook;
use super::LoadState;
use crate::api::{AccessorError, ApiResult, RemoteAccessor, Transport};
use crate::models::{LeagueId, Match, MatchPrediction, PredictionRequest};
use std::collections::HashMap;
use std::sync::Arc;

/// Upcoming fixtures with on-demand predictions and manual odds entry
pub struct UpcomingMatchesWidget<T> {
    api: Arc<RemoteAccessor<T>>,
    league: Option<LeagueId>,
    view: LoadState<Vec<Match>>,
    odds: ManualOddsBook,
    predictions: HashMap<String, MatchPrediction>,
}

impl<T: Transport> UpcomingMatchesWidget<T> {
    pub fn new(api: Arc<RemoteAccessor<T>>) -> Self {
        Self {
            api,
            league: None,
            view: LoadState::Idle,
            odds: ManualOddsBook::new(),
            predictions: HashMap::new(),
        }
    }

    pub async fn load(&mut self, league: LeagueId) -> &LoadState<Vec<Match>> {
        if self.league != Some(league) {
            self.predictions.clear();
        }
        self.league = Some(league);
        let result = self.api.fetch_upcoming_matches(league).await;
        self.view = LoadState::from_result("upcoming matches", result);
        &self.view
    }

    pub fn view(&self) -> &LoadState<Vec<Match>> {
        &self.view
    }

    pub fn odds(&self) -> &ManualOddsBook {
        &self.odds
    }

    pub fn odds_mut(&mut self) -> &mut ManualOddsBook {
        &mut self.odds
    }

    pub fn find(&self, match_id: &str) -> Option<&Match> {
        self.view.loaded()?.iter().find(|m| m.id == match_id)
    }

    pub fn prediction(&self, match_id: &str) -> Option<&MatchPrediction> {
        self.predictions.get(match_id)
    }

    /// Ask the backend for a prediction, passing manual odds when the user entered any
    pub async fn predict(&mut self, match_id: &str) -> ApiResult<MatchPrediction> {
        let league = self
            .league
            .ok_or_else(|| AccessorError::Validation("Select a league first".to_string()))?;
        let fixture = self
            .find(match_id)
            .ok_or_else(|| AccessorError::Validation(format!("Unknown match {}", match_id)))?;

        let match_date = fixture.match_day();
        let request = PredictionRequest {
            manual_odds: self.odds.odds_for_request(
                &fixture.home.name,
                &fixture.away.name,
                &match_date,
            ),
            home_team: fixture.home.name.clone(),
            away_team: fixture.away.name.clone(),
            league_id: league,
            match_date,
        };

        let prediction = self.api.predict_match(&request).await?.data;
        self.predictions
            .insert(match_id.to_string(), prediction.clone());
        Ok(prediction)
    }
}
