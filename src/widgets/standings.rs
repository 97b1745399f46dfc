use super::expansion::ExpansionState;
use super::LoadState;
use crate::api::{RemoteAccessor, Transport};
use crate::models::{LeagueId, StandingRow};
use std::sync::Arc;

/// League table; rows expand to show recent form
pub struct StandingsWidget<T> {
    api: Arc<RemoteAccessor<T>>,
    league: Option<LeagueId>,
    view: LoadState<Vec<StandingRow>>,
    expanded: ExpansionState<LeagueId, String>,
}

impl<T: Transport> StandingsWidget<T> {
    pub fn new(api: Arc<RemoteAccessor<T>>) -> Self {
        Self {
            api,
            league: None,
            view: LoadState::Idle,
            expanded: ExpansionState::new(),
        }
    }

    pub async fn load(&mut self, league: LeagueId) -> &LoadState<Vec<StandingRow>> {
        self.league = Some(league);
        self.expanded.set_context(league);
        let result = self.api.fetch_standings(league).await;
        self.view = LoadState::from_result("standings", result);
        &self.view
    }

    pub fn view(&self) -> &LoadState<Vec<StandingRow>> {
        &self.view
    }

    pub fn league(&self) -> Option<LeagueId> {
        self.league
    }

    pub fn toggle_team(&mut self, team: &str) -> bool {
        self.expanded.toggle(team.to_string())
    }

    pub fn is_expanded(&self, team: &str) -> bool {
        self.expanded.is_expanded(&team.to_string())
    }
}

/// Fixed-width text table
pub fn format_table(rows: &[StandingRow]) -> String {
    let mut out = format!(
        "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>3} {:>4} {:>4}\n",
        "#", "Team", "P", "W", "D", "L", "GD", "Pts"
    );
    for row in rows {
        out.push_str(&format!(
            "{:>3}  {:<24} {:>3} {:>3} {:>3} {:>3} {:>+4} {:>4}\n",
            row.rank,
            row.team.name,
            row.played,
            row.won,
            row.drawn,
            row.lost,
            row.goal_difference(),
            row.points
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeReply, FakeTransport};
    use crate::api::Operation;
    use serde_json::json;

    fn widget(fake: &FakeTransport) -> StandingsWidget<FakeTransport> {
        StandingsWidget::new(Arc::new(RemoteAccessor::new(fake.clone())))
    }

    #[tokio::test]
    async fn test_load_and_expand() {
        let fake = FakeTransport::new();
        fake.always(
            Operation::Standings,
            FakeReply::Data(json!({"standings": [
                {"rank": 1, "team": "Real Madrid", "points": 70, "played": 28, "won": 22, "drawn": 4, "lost": 2, "goals_for": 60, "goals_against": 20},
                {"rank": 2, "team": "Girona", "points": 62}
            ]})),
        );
        let mut standings = widget(&fake);
        let rows = standings.load(LeagueId(140)).await.loaded().unwrap().clone();
        assert_eq!(rows.len(), 2);

        assert!(standings.toggle_team("Girona"));
        assert!(standings.is_expanded("Girona"));

        // reloading the same league keeps expansion, a new league resets it
        standings.load(LeagueId(140)).await;
        assert!(standings.is_expanded("Girona"));
        standings.load(LeagueId(39)).await;
        assert!(!standings.is_expanded("Girona"));

        let table = format_table(&rows);
        assert!(table.contains("Real Madrid"));
        assert!(table.contains("+40"));
    }

    #[tokio::test]
    async fn test_failure_is_visible() {
        let fake = FakeTransport::new();
        fake.push(
            Operation::Standings,
            FakeReply::Data(json!({"error": "Standings not available for this season"})),
        );
        fake.push(Operation::Standings, FakeReply::Data(json!({"table": "n/a"})));
        let mut standings = widget(&fake);

        let view = standings.load(LeagueId(39)).await;
        assert_eq!(view.error(), Some("Standings not available for this season"));

        let view = standings.load(LeagueId(39)).await;
        assert_eq!(view.error(), Some(crate::api::error::GENERIC_ERROR_MESSAGE));
    }
}
