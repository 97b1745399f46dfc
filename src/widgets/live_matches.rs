use crate::api::{ApiResult, Envelope, RemoteAccessor, Transport};
use crate::models::{LeagueId, Match};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;
use tokio_stream::wrappers::IntervalStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

/// Most live matches ever rendered
pub const MAX_LIVE_MATCHES: usize = 15;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(60);

/// Latest applied live list
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LiveSnapshot {
    pub league_id: Option<LeagueId>,
    pub matches: Vec<Match>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Sequence number of the fetch this list came from, 0 before any
    pub sequence: u64,
}

impl LiveSnapshot {
    /// Live matches are cosmetic: an empty list renders nothing at all
    pub fn render(&self) -> Option<&[Match]> {
        if self.matches.is_empty() {
            None
        } else {
            Some(&self.matches)
        }
    }
}

#[derive(Debug, Default)]
struct PollState {
    /// Bumped on every activate/deactivate; fetches from older generations are dropped
    generation: u64,
    next_seq: u64,
    applied_seq: u64,
}

struct Poller<T> {
    api: Arc<RemoteAccessor<T>>,
    state: Arc<Mutex<PollState>>,
    tx: Arc<watch::Sender<LiveSnapshot>>,
}

impl<T> Clone for Poller<T> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            state: Arc::clone(&self.state),
            tx: Arc::clone(&self.tx),
        }
    }
}

impl<T: Transport> Poller<T> {
    fn lock(&self) -> std::sync::MutexGuard<'_, PollState> {
        // state holds plain counters, a poisoned lock is still consistent
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Start a new generation and clear the published list
    fn reset(&self, league: Option<LeagueId>) -> u64 {
        let mut state = self.lock();
        state.generation += 1;
        self.tx.send_replace(LiveSnapshot {
            league_id: league,
            ..LiveSnapshot::default()
        });
        state.generation
    }

    fn current_generation(&self) -> u64 {
        self.lock().generation
    }

    fn begin(&self, generation: u64) -> Option<u64> {
        let mut state = self.lock();
        if state.generation != generation {
            return None;
        }
        state.next_seq += 1;
        Some(state.next_seq)
    }

    async fn fetch_once(&self, league: LeagueId, generation: u64) -> bool {
        let Some(seq) = self.begin(generation) else {
            return false;
        };
        let result = self.api.fetch_live_matches(league).await;
        self.apply(league, generation, seq, result)
    }

    /// Replace the whole list, unless a newer fetch or a new generation got there first
    fn apply(
        &self,
        league: LeagueId,
        generation: u64,
        seq: u64,
        result: ApiResult<Envelope<Vec<Match>>>,
    ) -> bool {
        let mut state = self.lock();
        if state.generation != generation || seq <= state.applied_seq {
            debug!(%league, seq, applied = state.applied_seq, "discarding stale live response");
            return false;
        }
        state.applied_seq = seq;

        let mut matches = match result {
            Ok(envelope) => envelope.data,
            Err(e) => {
                // live data is best effort: log and show nothing
                warn!(%league, "live matches unavailable: {}", e);
                Vec::new()
            }
        };
        matches.truncate(MAX_LIVE_MATCHES);

        self.tx.send_replace(LiveSnapshot {
            league_id: Some(league),
            matches,
            updated_at: Some(Utc::now()),
            sequence: seq,
        });
        true
    }
}

/// Aborts the poll task (and its in-flight fetches) when dropped
struct PollHandle(JoinHandle<()>);

impl Drop for PollHandle {
    fn drop(&mut self) {
        self.0.abort();
    }
}

async fn poll_loop<T: Transport>(
    poller: Poller<T>,
    league: LeagueId,
    generation: u64,
    every: Duration,
) {
    let mut interval = tokio::time::interval(every);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = IntervalStream::new(interval);
    // Fetches may overlap; the sequence guard in `apply` keeps the newest
    let mut inflight = JoinSet::new();

    loop {
        tokio::select! {
            Some(_) = ticks.next() => {
                let poller = poller.clone();
                inflight.spawn(async move {
                    poller.fetch_once(league, generation).await;
                });
            }
            Some(_) = inflight.join_next() => {}
            else => break,
        }
    }
}

/// Keeps the live matches of one league approximately fresh.
///
/// `activate` fetches immediately and then every `interval`; changing league
/// or calling `deactivate` cancels the schedule and every pending fetch.
/// Readers observe results through [`LiveMatchesWidget::subscribe`].
pub struct LiveMatchesWidget<T> {
    poller: Poller<T>,
    interval: Duration,
    active: Option<(LeagueId, PollHandle)>,
}

impl<T: Transport> LiveMatchesWidget<T> {
    pub fn new(api: Arc<RemoteAccessor<T>>) -> Self {
        Self::with_interval(api, DEFAULT_POLL_INTERVAL)
    }

    pub fn with_interval(api: Arc<RemoteAccessor<T>>, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(LiveSnapshot::default());
        Self {
            poller: Poller {
                api,
                state: Arc::new(Mutex::new(PollState::default())),
                tx: Arc::new(tx),
            },
            interval,
            active: None,
        }
    }

    pub fn active_league(&self) -> Option<LeagueId> {
        self.active.as_ref().map(|(league, _)| *league)
    }

    /// Start polling `league`. Re-activating the same league is a no-op.
    pub fn activate(&mut self, league: LeagueId) {
        if self.active_league() == Some(league) {
            return;
        }
        // drop the previous handle first so its task is aborted
        self.active = None;
        let generation = self.poller.reset(Some(league));
        info!(%league, every = ?self.interval, "live polling started");

        let task = tokio::spawn(poll_loop(
            self.poller.clone(),
            league,
            generation,
            self.interval,
        ));
        self.active = Some((league, PollHandle(task)));
    }

    pub fn deactivate(&mut self) {
        if let Some((league, _handle)) = self.active.take() {
            info!(%league, "live polling stopped");
        }
        self.poller.reset(None);
    }

    /// Fetch now, outside the schedule. Returns whether the result was applied.
    pub async fn refresh(&self) -> bool {
        match self.active_league() {
            Some(league) => {
                let generation = self.poller.current_generation();
                self.poller.fetch_once(league, generation).await
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> LiveSnapshot {
        self.poller.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LiveSnapshot> {
        self.poller.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{FakeReply, FakeTransport};
    use crate::api::Operation;
    use serde_json::{json, Value};

    fn matches_json(prefix: &str, count: usize) -> Value {
        let matches: Vec<Value> = (0..count)
            .map(|i| {
                json!({
                    "id": format!("{}-{}", prefix, i),
                    "home_team": format!("Home {}", i),
                    "away_team": format!("Away {}", i),
                    "date": "2024-03-02T15:00:00Z",
                    "status": "2H",
                    "elapsed": 60,
                    "home_score": 1,
                    "away_score": 0
                })
            })
            .collect();
        json!({ "matches": matches })
    }

    fn widget(fake: &FakeTransport) -> LiveMatchesWidget<FakeTransport> {
        LiveMatchesWidget::new(Arc::new(RemoteAccessor::new(fake.clone())))
    }

    fn polled_leagues(fake: &FakeTransport) -> Vec<Value> {
        fake.calls()
            .into_iter()
            .filter(|(op, _)| *op == Operation::LiveMatches)
            .map(|(_, payload)| payload["league_id"].clone())
            .collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_fetch_replaces_list_and_caps() {
        let fake = FakeTransport::new();
        fake.always(Operation::LiveMatches, FakeReply::Data(matches_json("m", 20)));
        let mut live = widget(&fake);
        let mut rx = live.subscribe();

        live.activate(LeagueId(39));
        // first change is the reset, wait for the fetched list
        rx.wait_for(|snap| snap.sequence > 0).await.unwrap();

        let snapshot = live.snapshot();
        assert_eq!(snapshot.league_id, Some(LeagueId(39)));
        assert_eq!(snapshot.matches.len(), MAX_LIVE_MATCHES);
        assert_eq!(snapshot.matches[0].id, "m-0");
        assert_eq!(snapshot.matches[14].id, "m-14");
        assert_eq!(snapshot.render().map(<[Match]>::len), Some(15));
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_payload_renders_nothing() {
        let fake = FakeTransport::new();
        fake.always(
            Operation::LiveMatches,
            FakeReply::Data(json!({"error": "No live fixtures"})),
        );
        let mut live = widget(&fake);
        let mut rx = live.subscribe();

        live.activate(LeagueId(39));
        rx.wait_for(|snap| snap.sequence > 0).await.unwrap();

        let snapshot = live.snapshot();
        assert!(snapshot.matches.is_empty());
        assert!(snapshot.render().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_failure_and_malformed_are_empty() {
        let fake = FakeTransport::new();
        fake.push(Operation::LiveMatches, FakeReply::Data(matches_json("a", 2)));
        fake.push(Operation::LiveMatches, FakeReply::Unreachable);
        fake.push(Operation::LiveMatches, FakeReply::Data(json!({"matches": 3})));
        let mut live = widget(&fake);
        let mut rx = live.subscribe();

        live.activate(LeagueId(39));
        rx.wait_for(|snap| snap.sequence == 1).await.unwrap();
        assert_eq!(live.snapshot().matches.len(), 2);

        rx.wait_for(|snap| snap.sequence >= 2).await.unwrap();
        assert!(live.snapshot().matches.is_empty());

        rx.wait_for(|snap| snap.sequence >= 3).await.unwrap();
        assert!(live.snapshot().render().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_polls_on_fixed_interval() {
        let fake = FakeTransport::new();
        fake.always(Operation::LiveMatches, FakeReply::Data(matches_json("m", 1)));
        let mut live = widget(&fake);

        live.activate(LeagueId(39));
        tokio::time::sleep(Duration::from_secs(181)).await;

        // t = 0, 60, 120, 180
        assert_eq!(fake.call_count(Operation::LiveMatches), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deactivate_stops_polling() {
        let fake = FakeTransport::new();
        fake.always(Operation::LiveMatches, FakeReply::Data(matches_json("m", 3)));
        let mut live = widget(&fake);

        live.activate(LeagueId(39));
        tokio::time::sleep(Duration::from_secs(61)).await;
        assert_eq!(fake.call_count(Operation::LiveMatches), 2);

        live.deactivate();
        assert!(live.active_league().is_none());
        assert!(live.snapshot().render().is_none());

        tokio::time::sleep(Duration::from_secs(600)).await;
        assert_eq!(fake.call_count(Operation::LiveMatches), 2);
        assert!(!live.refresh().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_widget_stops_polling() {
        let fake = FakeTransport::new();
        fake.always(Operation::LiveMatches, FakeReply::Data(matches_json("m", 1)));
        {
            let mut live = widget(&fake);
            live.activate(LeagueId(39));
            tokio::time::sleep(Duration::from_secs(1)).await;
        }
        tokio::time::sleep(Duration::from_secs(300)).await;
        assert_eq!(fake.call_count(Operation::LiveMatches), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_league_change_restarts_schedule() {
        let fake = FakeTransport::new();
        fake.always(Operation::LiveMatches, FakeReply::Data(matches_json("m", 1)));
        let mut live = widget(&fake);

        live.activate(LeagueId(39));
        tokio::time::sleep(Duration::from_secs(30)).await;
        live.activate(LeagueId(39));
        tokio::time::sleep(Duration::from_secs(1)).await;
        live.activate(LeagueId(140));
        tokio::time::sleep(Duration::from_secs(61)).await;

        assert_eq!(
            polled_leagues(&fake),
            vec![json!(39), json!(140), json!(140)]
        );
        assert_eq!(live.snapshot().league_id, Some(LeagueId(140)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_fetch_of_previous_league_is_dropped() {
        let fake = FakeTransport::new();
        fake.push_delayed(
            Operation::LiveMatches,
            Duration::from_secs(30),
            FakeReply::Data(matches_json("old-league", 4)),
        );
        fake.always(Operation::LiveMatches, FakeReply::Data(matches_json("new-league", 1)));
        let mut live = widget(&fake);
        let mut rx = live.subscribe();

        live.activate(LeagueId(39));
        tokio::time::sleep(Duration::from_secs(1)).await;
        live.activate(LeagueId(140));
        rx.wait_for(|snap| snap.sequence > 0).await.unwrap();

        tokio::time::sleep(Duration::from_secs(45)).await;
        let snapshot = live.snapshot();
        assert_eq!(snapshot.league_id, Some(LeagueId(140)));
        assert_eq!(snapshot.matches.len(), 1);
        assert_eq!(snapshot.matches[0].id, "new-league-0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_older_response_is_discarded() {
        let fake = FakeTransport::new();
        // the t=0 fetch answers at t=90, after the t=60 fetch has landed
        fake.push_delayed(
            Operation::LiveMatches,
            Duration::from_secs(90),
            FakeReply::Data(matches_json("slow", 3)),
        );
        fake.always(Operation::LiveMatches, FakeReply::Data(matches_json("fresh", 1)));
        let api = RemoteAccessor::new(fake.clone()).with_timeout(Duration::from_secs(120));
        let mut live = LiveMatchesWidget::new(Arc::new(api));
        live.activate(LeagueId(39));

        tokio::time::sleep(Duration::from_secs(95)).await;

        let snapshot = live.snapshot();
        assert_eq!(fake.call_count(Operation::LiveMatches), 2);
        assert_eq!(snapshot.sequence, 2);
        assert_eq!(snapshot.matches.len(), 1);
        assert_eq!(snapshot.matches[0].id, "fresh-0");
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_refresh_applies() {
        let fake = FakeTransport::new();
        fake.always(Operation::LiveMatches, FakeReply::Data(matches_json("m", 2)));
        let mut live = widget(&fake);
        live.activate(LeagueId(61));
        tokio::time::sleep(Duration::from_secs(1)).await;

        assert!(live.refresh().await);
        assert_eq!(live.snapshot().sequence, 2);
    }
}
