pub mod api;
pub mod config;
pub mod lifecycle;
pub mod models;
pub mod utils;
pub mod widgets;

pub use api::*;
pub use models::*;
pub use utils::*;
pub use widgets::*;

use serde::Serialize;
use widgets::league_metrics::{load_league_metrics, LeagueMetricsView};

/// Everything the league landing page shows at once
#[derive(Debug, Clone, Serialize)]
pub struct LeagueOverview {
    pub league: Option<League>,
    pub metrics: LeagueMetricsView,
    pub standings: LoadState<Vec<StandingRow>>,
    pub upcoming: LoadState<Vec<Match>>,
    pub news: LoadState<Vec<NewsItem>>,
}

/// Fetch the landing-page data for one league. Each part fails independently.
pub async fn fetch_league_overview<T: Transport>(
    api: &RemoteAccessor<T>,
    league: LeagueId,
) -> LeagueOverview {
    let (metrics, standings, upcoming, news) = tokio::join!(
        load_league_metrics(api, league),
        api.fetch_standings(league),
        api.fetch_upcoming_matches(league),
        api.fetch_news_feed(league)
    );

    LeagueOverview {
        league: find_league(league),
        metrics,
        standings: LoadState::from_result("standings", standings),
        upcoming: LoadState::from_result("upcoming matches", upcoming),
        news: LoadState::from_result("news feed", news)
            .map(|items| news_feed::timeline(items, league)),
    }
}
