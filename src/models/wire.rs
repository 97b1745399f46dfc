//! Loose response shapes as the backend sends them.
//!
//! Identifiers arrive as numbers or strings, scores sometimes as strings,
//! dates in several formats. Everything here is private to the accessor:
//! each `into_*` function is the single step that turns a wire shape into
//! the typed view-model, or rejects it as malformed.

use super::{
    EmbedDescriptor, HistoricalPrediction, LeagueId, LeagueMetrics, LicenseVerification, Match,
    MatchPrediction, MatchStatus, NewsItem, NewsKind, Outcome, Score, StandingRow,
    SubscriptionReceipt, TeamRef, TrendingTopic,
};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;

/// Number-or-string field
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Flex {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Flex {
    pub fn as_text(&self) -> String {
        match self {
            Flex::Int(v) => v.to_string(),
            Flex::Float(v) => v.to_string(),
            Flex::Text(s) => s.trim().to_string(),
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Flex::Int(v) => Some(*v as f64),
            Flex::Float(v) => Some(*v),
            Flex::Text(s) => s.trim().trim_end_matches('%').parse().ok(),
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Flex::Int(v) => Some(*v),
            Flex::Float(v) if v.fract() == 0.0 => Some(*v as i64),
            Flex::Float(_) => None,
            Flex::Text(s) => s.trim().parse().ok(),
        }
    }

    pub fn as_league_id(&self) -> Option<LeagueId> {
        self.as_i64()
            .and_then(|v| u32::try_from(v).ok())
            .map(LeagueId)
    }
}

fn opt_u32(value: &Option<Flex>) -> Option<u32> {
    value
        .as_ref()
        .and_then(Flex::as_i64)
        .and_then(|v| u32::try_from(v).ok())
}

fn opt_i32(value: &Option<Flex>) -> Option<i32> {
    value
        .as_ref()
        .and_then(Flex::as_i64)
        .and_then(|v| i32::try_from(v).ok())
}

/// Accepts RFC 3339, "YYYY-MM-DD HH:MM:SS", "YYYY-MM-DD" and unix seconds
pub fn parse_timestamp(value: &Flex) -> Option<DateTime<Utc>> {
    match value {
        Flex::Int(secs) => Utc.timestamp_opt(*secs, 0).single(),
        Flex::Float(secs) => Utc.timestamp_opt(*secs as i64, 0).single(),
        Flex::Text(text) => {
            let text = text.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                return Some(dt.with_timezone(&Utc));
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
                return Some(Utc.from_utc_datetime(&dt));
            }
            if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
                return Some(Utc.from_utc_datetime(&dt));
            }
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| Utc.from_utc_datetime(&dt))
        }
    }
}

/// Confidence arrives either as 0..1 or as a percentage
fn normalize_confidence(raw: f64) -> Option<f64> {
    if !raw.is_finite() || raw < 0.0 {
        return None;
    }
    let value = if raw > 1.0 { raw / 100.0 } else { raw };
    (value <= 1.0).then_some(value)
}

fn parse_outcome(raw: &str, home_name: &str, away_name: &str) -> Option<Outcome> {
    let lowered = raw.trim().to_lowercase();
    match lowered.as_str() {
        "home" | "1" | "h" => Some(Outcome::Home),
        "away" | "2" | "a" => Some(Outcome::Away),
        "draw" | "x" | "d" => Some(Outcome::Draw),
        _ if lowered == home_name.trim().to_lowercase() => Some(Outcome::Home),
        _ if lowered == away_name.trim().to_lowercase() => Some(Outcome::Away),
        _ => None,
    }
}

fn outcome_from_score(score: Score) -> Outcome {
    match score.home.cmp(&score.away) {
        std::cmp::Ordering::Greater => Outcome::Home,
        std::cmp::Ordering::Less => Outcome::Away,
        std::cmp::Ordering::Equal => Outcome::Draw,
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WireMatch {
    #[serde(alias = "fixture_id", alias = "match_id")]
    pub id: Flex,
    #[serde(default)]
    pub league_id: Option<Flex>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub home_team_id: Option<Flex>,
    #[serde(default)]
    pub away_team_id: Option<Flex>,
    #[serde(alias = "match_date", alias = "fixture_date")]
    pub date: Flex,
    #[serde(default, alias = "status_short")]
    pub status: Option<String>,
    #[serde(default)]
    pub elapsed: Option<Flex>,
    #[serde(default, alias = "goals_home")]
    pub home_score: Option<Flex>,
    #[serde(default, alias = "goals_away")]
    pub away_score: Option<Flex>,
    #[serde(default)]
    pub predicted_home_score: Option<Flex>,
    #[serde(default)]
    pub predicted_away_score: Option<Flex>,
    #[serde(default)]
    pub predicted_winner: Option<String>,
    #[serde(default)]
    pub confidence: Option<Flex>,
}

impl WireMatch {
    pub fn into_match(self) -> Result<Match, String> {
        let id = self.id.as_text();
        if id.is_empty() {
            return Err("match without id".to_string());
        }
        let date = parse_timestamp(&self.date)
            .ok_or_else(|| format!("match {}: unreadable date {:?}", id, self.date))?;

        let score = match (opt_i32(&self.home_score), opt_i32(&self.away_score)) {
            (Some(home), Some(away)) => Some(Score { home, away }),
            _ => None,
        };

        let prediction = {
            let home_goals = opt_u32(&self.predicted_home_score);
            let away_goals = opt_u32(&self.predicted_away_score);
            let winner = self
                .predicted_winner
                .as_deref()
                .and_then(|w| parse_outcome(w, &self.home_team, &self.away_team));
            let confidence = self
                .confidence
                .as_ref()
                .and_then(Flex::as_f64)
                .and_then(normalize_confidence);
            if home_goals.is_none() && away_goals.is_none() && winner.is_none() && confidence.is_none()
            {
                None
            } else {
                Some(MatchPrediction {
                    home_goals,
                    away_goals,
                    winner,
                    confidence,
                })
            }
        };

        Ok(Match {
            id,
            league_id: self.league_id.as_ref().and_then(Flex::as_league_id),
            home: TeamRef {
                id: self.home_team_id.as_ref().map(Flex::as_text),
                name: self.home_team.trim().to_string(),
            },
            away: TeamRef {
                id: self.away_team_id.as_ref().map(Flex::as_text),
                name: self.away_team.trim().to_string(),
            },
            date,
            status: MatchStatus::from_code(
                self.status.as_deref().unwrap_or_default(),
                opt_u32(&self.elapsed),
            ),
            score,
            prediction,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WireMatchList {
    #[serde(alias = "response", alias = "fixtures")]
    pub matches: Vec<WireMatch>,
}

pub fn into_matches(list: WireMatchList) -> Result<Vec<Match>, String> {
    list.matches.into_iter().map(WireMatch::into_match).collect()
}

#[derive(Debug, Deserialize)]
pub struct WireStandingRow {
    #[serde(alias = "position")]
    pub rank: Flex,
    #[serde(alias = "team_name")]
    pub team: String,
    #[serde(default)]
    pub team_id: Option<Flex>,
    #[serde(default)]
    pub played: Option<Flex>,
    #[serde(default, alias = "win")]
    pub won: Option<Flex>,
    #[serde(default, alias = "draw")]
    pub drawn: Option<Flex>,
    #[serde(default, alias = "lose")]
    pub lost: Option<Flex>,
    #[serde(default)]
    pub goals_for: Option<Flex>,
    #[serde(default)]
    pub goals_against: Option<Flex>,
    pub points: Flex,
    #[serde(default)]
    pub form: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WireStandings {
    #[serde(alias = "table")]
    pub standings: Vec<WireStandingRow>,
}

pub fn into_standings(wire: WireStandings) -> Result<Vec<StandingRow>, String> {
    let mut rows = wire
        .standings
        .into_iter()
        .map(|row| {
            let rank = row
                .rank
                .as_i64()
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| format!("standing row {}: bad rank", row.team))?;
            let points = row
                .points
                .as_i64()
                .and_then(|v| i32::try_from(v).ok())
                .ok_or_else(|| format!("standing row {}: bad points", row.team))?;
            Ok(StandingRow {
                rank,
                team: TeamRef {
                    id: row.team_id.as_ref().map(Flex::as_text),
                    name: row.team.trim().to_string(),
                },
                played: opt_u32(&row.played).unwrap_or_default(),
                won: opt_u32(&row.won).unwrap_or_default(),
                drawn: opt_u32(&row.drawn).unwrap_or_default(),
                lost: opt_u32(&row.lost).unwrap_or_default(),
                goals_for: opt_i32(&row.goals_for).unwrap_or_default(),
                goals_against: opt_i32(&row.goals_against).unwrap_or_default(),
                points,
                form: row.form.unwrap_or_default(),
            })
        })
        .collect::<Result<Vec<_>, String>>()?;
    rows.sort_by_key(|row| row.rank);
    Ok(rows)
}

#[derive(Debug, Deserialize)]
pub struct WireEmbed {
    #[serde(default, alias = "type")]
    pub provider: Option<String>,
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct WireNewsItem {
    pub id: Flex,
    #[serde(default)]
    pub league_id: Option<Flex>,
    #[serde(default, rename = "type", alias = "kind")]
    pub kind: Option<String>,
    pub title: String,
    #[serde(default, alias = "body")]
    pub content: Option<String>,
    #[serde(alias = "created_at", alias = "published_at")]
    pub timestamp: Flex,
    #[serde(default, alias = "statistics")]
    pub stats: Option<serde_json::Value>,
    #[serde(default)]
    pub embed: Option<WireEmbed>,
}

#[derive(Debug, Deserialize)]
pub struct WireNewsFeed {
    #[serde(alias = "news", alias = "items")]
    pub feed: Vec<WireNewsItem>,
}

pub fn into_news(wire: WireNewsFeed) -> Result<Vec<NewsItem>, String> {
    wire.feed
        .into_iter()
        .map(|item| {
            let id = item.id.as_text();
            let timestamp = parse_timestamp(&item.timestamp)
                .ok_or_else(|| format!("news item {}: unreadable timestamp", id))?;
            Ok(NewsItem {
                id,
                league_id: item.league_id.as_ref().and_then(Flex::as_league_id),
                kind: NewsKind::from_tag(item.kind.as_deref().unwrap_or("other")),
                title: item.title,
                content: item.content.unwrap_or_default(),
                timestamp,
                stats: item.stats.filter(|v| !v.is_null()),
                embed: item.embed.map(|e| EmbedDescriptor {
                    provider: e.provider.unwrap_or_else(|| "link".to_string()),
                    url: e.url,
                }),
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct WireTrendingTopic {
    #[serde(alias = "topic")]
    pub title: String,
    #[serde(default, alias = "count")]
    pub mentions: Option<Flex>,
}

#[derive(Debug, Deserialize)]
pub struct WireTrending {
    #[serde(alias = "trending")]
    pub topics: Vec<WireTrendingTopic>,
}

pub fn into_trending(wire: WireTrending) -> Vec<TrendingTopic> {
    wire.topics
        .into_iter()
        .map(|t| TrendingTopic {
            title: t.title,
            mentions: opt_u32(&t.mentions).unwrap_or_default(),
        })
        .collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct WireLeagueMetrics {
    #[serde(default)]
    pub accuracy: Option<Flex>,
    #[serde(default, alias = "total_matches")]
    pub matches_analyzed: Option<Flex>,
    #[serde(default, alias = "average_goals")]
    pub avg_goals: Option<Flex>,
    #[serde(default)]
    pub home_win_rate: Option<Flex>,
}

pub fn into_league_metrics(wire: WireLeagueMetrics) -> LeagueMetrics {
    LeagueMetrics {
        accuracy: wire
            .accuracy
            .as_ref()
            .and_then(Flex::as_f64)
            .and_then(normalize_confidence),
        matches_analyzed: opt_u32(&wire.matches_analyzed),
        avg_goals: wire.avg_goals.as_ref().and_then(Flex::as_f64),
        home_win_rate: wire
            .home_win_rate
            .as_ref()
            .and_then(Flex::as_f64)
            .and_then(normalize_confidence),
    }
}

#[derive(Debug, Deserialize)]
pub struct WireHistoricalPrediction {
    #[serde(flatten)]
    pub fixture: WireMatch,
    #[serde(alias = "round")]
    pub week: Flex,
    #[serde(alias = "predicted_outcome")]
    pub predicted: String,
}

#[derive(Debug, Deserialize)]
pub struct WireHistory {
    #[serde(alias = "results")]
    pub predictions: Vec<WireHistoricalPrediction>,
}

pub fn into_history(wire: WireHistory) -> Result<Vec<HistoricalPrediction>, String> {
    wire.predictions
        .into_iter()
        .map(|entry| {
            let home_name = entry.fixture.home_team.clone();
            let away_name = entry.fixture.away_team.clone();
            // Round labels look like "Regular Season - 12"
            let week = entry
                .week
                .as_text()
                .rsplit(|c: char| !c.is_ascii_digit())
                .find(|part| !part.is_empty())
                .and_then(|digits| digits.parse::<u32>().ok())
                .ok_or_else(|| format!("prediction {}: bad week", entry.fixture.id.as_text()))?;
            let predicted = parse_outcome(&entry.predicted, &home_name, &away_name)
                .ok_or_else(|| format!("prediction for {} vs {}: bad outcome", home_name, away_name))?;
            let fixture = entry.fixture.into_match()?;
            let actual = match fixture.status {
                MatchStatus::Finished => fixture.score.map(outcome_from_score),
                _ => None,
            };
            Ok(HistoricalPrediction {
                correct: actual == Some(predicted),
                fixture,
                week,
                predicted,
                actual,
            })
        })
        .collect()
}

#[derive(Debug, Deserialize)]
pub struct WirePrediction {
    #[serde(default, alias = "home_goals")]
    pub predicted_home_score: Option<Flex>,
    #[serde(default, alias = "away_goals")]
    pub predicted_away_score: Option<Flex>,
    #[serde(default, alias = "winner")]
    pub predicted_winner: Option<String>,
    #[serde(default, alias = "probability")]
    pub confidence: Option<Flex>,
}

pub fn into_prediction(wire: WirePrediction, home: &str, away: &str) -> MatchPrediction {
    MatchPrediction {
        home_goals: opt_u32(&wire.predicted_home_score),
        away_goals: opt_u32(&wire.predicted_away_score),
        winner: wire
            .predicted_winner
            .as_deref()
            .and_then(|w| parse_outcome(w, home, away)),
        confidence: wire
            .confidence
            .as_ref()
            .and_then(Flex::as_f64)
            .and_then(normalize_confidence),
    }
}

#[derive(Debug, Deserialize)]
pub struct WireLicense {
    pub valid: bool,
    #[serde(default, alias = "expiry", alias = "expiration_date")]
    pub expires_at: Option<Flex>,
    #[serde(default, alias = "type")]
    pub subscription_type: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// A `valid: false` answer is a handled rejection: returned as `Err(message)`
pub fn into_license(wire: WireLicense) -> Result<Result<LicenseVerification, String>, String> {
    if !wire.valid {
        return Ok(Err(wire
            .message
            .unwrap_or_else(|| "Invalid license key".to_string())));
    }
    let expires_at = wire
        .expires_at
        .as_ref()
        .and_then(parse_timestamp)
        .ok_or_else(|| "license response without expiry".to_string())?;
    Ok(Ok(LicenseVerification {
        valid: true,
        expires_at,
        subscription_type: wire.subscription_type.unwrap_or_else(|| "standard".to_string()),
        email: wire.email.unwrap_or_default(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct WireSubscription {
    #[serde(alias = "id", alias = "session_id")]
    pub subscription_id: Flex,
    #[serde(default)]
    pub license_key: Option<String>,
    #[serde(default, alias = "url")]
    pub checkout_url: Option<String>,
}

pub fn into_subscription(wire: WireSubscription) -> SubscriptionReceipt {
    SubscriptionReceipt {
        subscription_id: wire.subscription_id.as_text(),
        license_key: wire.license_key,
        checkout_url: wire.checkout_url,
    }
}
