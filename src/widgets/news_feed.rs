use super::expansion::ExpansionState;
use super::{or_empty, LoadState};
use crate::api::{RemoteAccessor, Transport};
use crate::models::{LeagueId, NewsItem, TrendingTopic};
use std::sync::Arc;

/// Keep items for `league` (and league-agnostic ones), newest first
pub fn timeline(items: Vec<NewsItem>, league: LeagueId) -> Vec<NewsItem> {
    let mut items: Vec<NewsItem> = items
        .into_iter()
        .filter(|item| item.league_id.map_or(true, |id| id == league))
        .collect();
    items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    items
}

/// News timeline plus the optional trending-topics strip
pub struct NewsFeedWidget<T> {
    api: Arc<RemoteAccessor<T>>,
    view: LoadState<Vec<NewsItem>>,
    trending: Vec<TrendingTopic>,
    expanded: ExpansionState<LeagueId, String>,
}

impl<T: Transport> NewsFeedWidget<T> {
    pub fn new(api: Arc<RemoteAccessor<T>>) -> Self {
        Self {
            api,
            view: LoadState::Idle,
            trending: Vec::new(),
            expanded: ExpansionState::new(),
        }
    }

    pub async fn load(&mut self, league: LeagueId) -> &LoadState<Vec<NewsItem>> {
        self.expanded.set_context(league);

        let (news, trending) = tokio::join!(
            self.api.fetch_news_feed(league),
            self.api.fetch_trending_topics(league)
        );
        self.view =
            LoadState::from_result("news feed", news).map(|items| timeline(items, league));
        self.trending = or_empty("trending topics", trending);
        &self.view
    }

    pub fn view(&self) -> &LoadState<Vec<NewsItem>> {
        &self.view
    }

    pub fn trending(&self) -> &[TrendingTopic] {
        &self.trending
    }

    pub fn toggle_item(&mut self, id: &str) -> bool {
        self.expanded.toggle(id.to_string())
    }

    pub fn is_expanded(&self, id: &str) -> bool {
        self.expanded.is_expanded(&id.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeReply, FakeTransport};
    use crate::api::Operation;
    use serde_json::json;

    fn feed_reply() -> FakeReply {
        FakeReply::Data(json!({"feed": [
            {"id": 1, "league_id": 39, "type": "preview", "title": "Derby preview", "timestamp": "2024-03-01T10:00:00Z"},
            {"id": 2, "league_id": 140, "type": "recap", "title": "Clasico recap", "timestamp": "2024-03-03T10:00:00Z"},
            {"id": 3, "league_id": "39", "type": "lineup-change", "title": "Late change", "timestamp": "2024-03-02T10:00:00Z",
             "stats": {"possession": 61}},
            {"id": 4, "type": "transfer", "title": "Window closes", "timestamp": 1709200000}
        ]}))
    }

    #[tokio::test]
    async fn test_filtered_and_sorted_newest_first() {
        let fake = FakeTransport::new();
        fake.push(Operation::NewsFeed, feed_reply());
        fake.push(
            Operation::TrendingTopics,
            FakeReply::Data(json!({"topics": [{"title": "Title race", "mentions": "120"}]})),
        );
        let mut news = NewsFeedWidget::new(Arc::new(RemoteAccessor::new(fake.clone())));

        let items = news.load(LeagueId(39)).await.loaded().unwrap().clone();
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "1", "4"]);
        assert!(items[0].stats.is_some());
        assert_eq!(news.trending()[0].mentions, 120);
    }

    #[tokio::test]
    async fn test_trending_failure_is_silent_but_news_failure_is_not() {
        let fake = FakeTransport::new();
        fake.push(Operation::NewsFeed, feed_reply());
        fake.push(Operation::TrendingTopics, FakeReply::Unreachable);
        fake.push(Operation::NewsFeed, FakeReply::ServerError("Feed offline".into()));
        fake.push(Operation::TrendingTopics, FakeReply::Unreachable);
        let mut news = NewsFeedWidget::new(Arc::new(RemoteAccessor::new(fake.clone())));

        let view = news.load(LeagueId(39)).await;
        assert!(view.loaded().is_some());
        assert!(news.trending().is_empty());

        let view = news.load(LeagueId(39)).await;
        assert_eq!(view.error(), Some("Feed offline"));
    }

    #[tokio::test]
    async fn test_expansion_resets_on_league_change() {
        let fake = FakeTransport::new();
        fake.always(Operation::NewsFeed, feed_reply());
        fake.always(Operation::TrendingTopics, FakeReply::Data(json!({"topics": []})));
        let mut news = NewsFeedWidget::new(Arc::new(RemoteAccessor::new(fake.clone())));

        news.load(LeagueId(39)).await;
        news.toggle_item("1");
        assert!(news.is_expanded("1"));
        news.load(LeagueId(140)).await;
        assert!(!news.is_expanded("1"));
    }
}
