use crate::api::{RemoteAccessor, Transport};
use crate::models::{find_league, supported_leagues, League, LeagueId, LeagueMetrics};
use serde::Serialize;
use tracing::warn;

pub const PLACEHOLDER: &str = "N/A";

/// League dropdown; dependent widgets re-key on the id `select` returns
#[derive(Debug, Clone)]
pub struct LeagueSelector {
    leagues: Vec<League>,
    selected: Option<LeagueId>,
}

impl Default for LeagueSelector {
    fn default() -> Self {
        Self {
            leagues: supported_leagues(),
            selected: None,
        }
    }
}

impl LeagueSelector {
    pub fn new(leagues: Vec<League>) -> Self {
        Self {
            leagues,
            selected: None,
        }
    }

    pub fn leagues(&self) -> &[League] {
        &self.leagues
    }

    pub fn selected(&self) -> Option<&League> {
        let id = self.selected?;
        self.leagues.iter().find(|league| league.id == id)
    }

    /// Returns the id when the selection actually changed
    pub fn select(&mut self, id: LeagueId) -> Option<LeagueId> {
        if self.selected == Some(id) || !self.leagues.iter().any(|league| league.id == id) {
            return None;
        }
        self.selected = Some(id);
        Some(id)
    }
}

/// Display strings for the metrics card
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueMetricsView {
    pub league: String,
    pub accuracy: String,
    pub matches_analyzed: String,
    pub avg_goals: String,
    pub home_win_rate: String,
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| PLACEHOLDER.to_string(), |v| format!("{:.1}%", v * 100.0))
}

impl LeagueMetricsView {
    pub fn placeholder(league: &str) -> Self {
        Self::from_metrics(league, &LeagueMetrics::default())
    }

    pub fn from_metrics(league: &str, metrics: &LeagueMetrics) -> Self {
        Self {
            league: league.to_string(),
            accuracy: percent(metrics.accuracy),
            matches_analyzed: metrics
                .matches_analyzed
                .map_or_else(|| "0".to_string(), |n| n.to_string()),
            avg_goals: metrics
                .avg_goals
                .map_or_else(|| PLACEHOLDER.to_string(), |g| format!("{:.2}", g)),
            home_win_rate: percent(metrics.home_win_rate),
        }
    }
}

/// Metrics for a league. Unknown leagues and failed calls give placeholders.
pub async fn load_league_metrics<T: Transport>(
    api: &RemoteAccessor<T>,
    league: LeagueId,
) -> LeagueMetricsView {
    let Some(known) = find_league(league) else {
        return LeagueMetricsView::placeholder("Unknown league");
    };
    match api.fetch_league_metrics(league).await {
        Ok(envelope) => LeagueMetricsView::from_metrics(&known.name, &envelope.data),
        Err(e) => {
            warn!(%league, "league metrics unavailable: {}", e);
            LeagueMetricsView::placeholder(&known.name)
        }
    }
}
