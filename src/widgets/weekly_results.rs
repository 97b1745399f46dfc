use super::expansion::ExpansionState;
use super::LoadState;
use crate::api::{RemoteAccessor, Transport};
use crate::models::{HistoricalPrediction, LeagueId};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekGroup {
    pub week: u32,
    pub predictions: Vec<HistoricalPrediction>,
}

impl WeekGroup {
    /// Predictions whose match has a final result
    pub fn settled(&self) -> usize {
        self.predictions.iter().filter(|p| p.actual.is_some()).count()
    }

    pub fn correct(&self) -> usize {
        self.predictions.iter().filter(|p| p.correct).count()
    }

    pub fn accuracy(&self) -> Option<f64> {
        let settled = self.settled();
        (settled > 0).then(|| self.correct() as f64 / settled as f64)
    }
}

/// Group by week, latest week first, matches by kickoff inside a week
pub fn group_by_week(predictions: Vec<HistoricalPrediction>) -> Vec<WeekGroup> {
    let mut weeks: BTreeMap<u32, Vec<HistoricalPrediction>> = BTreeMap::new();
    for prediction in predictions {
        weeks.entry(prediction.week).or_default().push(prediction);
    }
    weeks
        .into_iter()
        .rev()
        .map(|(week, mut predictions)| {
            predictions.sort_by_key(|p| p.fixture.date);
            WeekGroup { week, predictions }
        })
        .collect()
}

/// Past predictions for a league season, one collapsible group per week
pub struct WeeklyResultsWidget<T> {
    api: Arc<RemoteAccessor<T>>,
    view: LoadState<Vec<WeekGroup>>,
    expanded: ExpansionState<(LeagueId, i32), u32>,
}

impl<T: Transport> WeeklyResultsWidget<T> {
    pub fn new(api: Arc<RemoteAccessor<T>>) -> Self {
        Self {
            api,
            view: LoadState::Idle,
            expanded: ExpansionState::new(),
        }
    }

    pub async fn load(&mut self, league: LeagueId, year: i32) -> &LoadState<Vec<WeekGroup>> {
        self.expanded.set_context((league, year));
        let result = self.api.fetch_historical_predictions(league, year).await;
        self.view = LoadState::from_result("historical predictions", result).map(group_by_week);
        &self.view
    }

    pub fn view(&self) -> &LoadState<Vec<WeekGroup>> {
        &self.view
    }

    pub fn toggle_week(&mut self, week: u32) -> bool {
        self.expanded.toggle(week)
    }

    pub fn is_expanded(&self, week: u32) -> bool {
        self.expanded.is_expanded(&week)
    }

    /// Accuracy over every settled prediction of the loaded season
    pub fn overall_accuracy(&self) -> Option<f64> {
        let groups = self.view.loaded()?;
        let settled: usize = groups.iter().map(WeekGroup::settled).sum();
        let correct: usize = groups.iter().map(WeekGroup::correct).sum();
        (settled > 0).then(|| correct as f64 / settled as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeReply, FakeTransport};
    use crate::api::Operation;
    use serde_json::{json, Value};

    fn entry(id: u32, week: u32, date: &str, predicted: &str, score: Option<(i32, i32)>) -> Value {
        let status = if score.is_some() { "FT" } else { "NS" };
        let mut value = json!({
            "id": id,
            "home_team": "Home",
            "away_team": "Away",
            "date": date,
            "status": status,
            "week": week,
            "predicted": predicted
        });
        if let Some((home, away)) = score {
            value["home_score"] = json!(home);
            value["away_score"] = json!(away);
        }
        value
    }

    fn history_reply() -> FakeReply {
        FakeReply::Data(json!({"predictions": [
            entry(1, 1, "2023-08-12", "home", Some((2, 0))),
            entry(2, 2, "2023-08-20", "away", Some((1, 1))),
            entry(3, 2, "2023-08-19", "draw", Some((0, 0))),
            entry(4, 3, "2023-08-26", "home", None)
        ]}))
    }

    #[tokio::test]
    async fn test_grouped_latest_week_first() {
        let fake = FakeTransport::new();
        fake.push(Operation::HistoricalPredictions, history_reply());
        let mut results = WeeklyResultsWidget::new(Arc::new(RemoteAccessor::new(fake.clone())));

        let groups = results.load(LeagueId(39), 2023).await.loaded().unwrap().clone();
        let weeks: Vec<u32> = groups.iter().map(|g| g.week).collect();
        assert_eq!(weeks, vec![3, 2, 1]);

        let week_two = &groups[1];
        assert_eq!(week_two.predictions[0].fixture.id, "3");
        assert_eq!(week_two.accuracy(), Some(0.5));
        assert_eq!(groups[0].accuracy(), None);

        let overall = results.overall_accuracy().unwrap();
        assert!((overall - 2.0 / 3.0).abs() < 1e-9);
        assert_eq!(
            fake.calls()[0].1,
            json!({"league_id": 39, "season": 2023})
        );
    }

    #[tokio::test]
    async fn test_expansion_cleared_on_year_or_league_change() {
        let fake = FakeTransport::new();
        fake.always(Operation::HistoricalPredictions, history_reply());
        let mut results = WeeklyResultsWidget::new(Arc::new(RemoteAccessor::new(fake.clone())));

        results.load(LeagueId(39), 2023).await;
        results.toggle_week(2);
        results.load(LeagueId(39), 2023).await;
        assert!(results.is_expanded(2));

        results.load(LeagueId(39), 2022).await;
        assert!(!results.is_expanded(2));

        results.toggle_week(1);
        results.load(LeagueId(61), 2022).await;
        assert!(!results.is_expanded(1));
    }

    #[tokio::test]
    async fn test_failure_is_visible() {
        let fake = FakeTransport::new();
        fake.push(Operation::HistoricalPredictions, FakeReply::Unreachable);
        let mut results = WeeklyResultsWidget::new(Arc::new(RemoteAccessor::new(fake.clone())));
        let view = results.load(LeagueId(39), 2023).await;
        assert_eq!(view.error(), Some(crate::api::error::GENERIC_ERROR_MESSAGE));
    }
}
