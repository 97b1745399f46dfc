pub mod wire;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque numeric key identifying a competition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeagueId(pub u32);

impl fmt::Display for LeagueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A competition offered in the league selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct League {
    pub id: LeagueId,
    pub name: String,
    pub country: String,
}

impl League {
    fn new(id: u32, name: &str, country: &str) -> Self {
        Self {
            id: LeagueId(id),
            name: name.to_string(),
            country: country.to_string(),
        }
    }
}

/// Leagues the backend produces predictions for
pub fn supported_leagues() -> Vec<League> {
    vec![
        League::new(39, "Premier League", "England"),
        League::new(140, "La Liga", "Spain"),
        League::new(135, "Serie A", "Italy"),
        League::new(78, "Bundesliga", "Germany"),
        League::new(61, "Ligue 1", "France"),
        League::new(2, "UEFA Champions League", "Europe"),
    ]
}

pub fn find_league(id: LeagueId) -> Option<League> {
    supported_leagues().into_iter().find(|league| league.id == id)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRef {
    /// Provider team id, absent for some feeds
    pub id: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub home: i32,
    pub away: i32,
}

/// Live state of a match, parsed from the provider's short status code
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Live { minute: Option<u32> },
    HalfTime,
    Finished,
    Other { label: String },
}

impl MatchStatus {
    pub fn from_code(code: &str, elapsed: Option<u32>) -> Self {
        match code.trim().to_uppercase().as_str() {
            "NS" | "TBD" | "SCHEDULED" | "" => MatchStatus::Scheduled,
            "1H" | "2H" | "ET" | "P" | "BT" | "LIVE" | "IN_PLAY" => {
                MatchStatus::Live { minute: elapsed }
            }
            "HT" | "PAUSED" => MatchStatus::HalfTime,
            "FT" | "AET" | "PEN" | "FINISHED" => MatchStatus::Finished,
            _ => MatchStatus::Other {
                label: code.trim().to_string(),
            },
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, MatchStatus::Live { .. } | MatchStatus::HalfTime)
    }

    pub fn label(&self) -> String {
        match self {
            MatchStatus::Scheduled => "Scheduled".to_string(),
            MatchStatus::Live { minute: Some(m) } => format!("{}'", m),
            MatchStatus::Live { minute: None } => "Live".to_string(),
            MatchStatus::HalfTime => "HT".to_string(),
            MatchStatus::Finished => "FT".to_string(),
            MatchStatus::Other { label } => label.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Home,
    Draw,
    Away,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchPrediction {
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
    pub winner: Option<Outcome>,
    /// Probability between 0 and 1
    pub confidence: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub id: String,
    pub league_id: Option<LeagueId>,
    pub home: TeamRef,
    pub away: TeamRef,
    pub date: DateTime<Utc>,
    pub status: MatchStatus,
    pub score: Option<Score>,
    pub prediction: Option<MatchPrediction>,
}

impl Match {
    /// Calendar day used in manual-odds keys and prediction requests
    pub fn match_day(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn format(&self) -> String {
        let score = match self.score {
            Some(s) => format!("{}-{}", s.home, s.away),
            None => "vs".to_string(),
        };
        format!(
            "{} {} {} [{}]",
            self.home.name,
            score,
            self.away.name,
            self.status.label()
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NewsKind {
    Preview,
    Recap,
    LineupChange,
    Injury,
    Transfer,
    Other(String),
}

impl NewsKind {
    pub fn from_tag(tag: &str) -> Self {
        match tag.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "preview" | "match_preview" => NewsKind::Preview,
            "recap" | "match_recap" | "result" => NewsKind::Recap,
            "lineup_change" | "lineup" | "lineups" => NewsKind::LineupChange,
            "injury" | "injury_update" => NewsKind::Injury,
            "transfer" => NewsKind::Transfer,
            other => NewsKind::Other(other.to_string()),
        }
    }
}

/// Embedded social/video content attached to a news item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbedDescriptor {
    pub provider: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub league_id: Option<LeagueId>,
    pub kind: NewsKind,
    pub title: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub stats: Option<serde_json::Value>,
    pub embed: Option<EmbedDescriptor>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendingTopic {
    pub title: String,
    pub mentions: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandingRow {
    pub rank: u32,
    pub team: TeamRef,
    pub played: u32,
    pub won: u32,
    pub drawn: u32,
    pub lost: u32,
    pub goals_for: i32,
    pub goals_against: i32,
    pub points: i32,
    /// Recent results, most recent last (e.g. "WWDLW")
    pub form: String,
}

impl StandingRow {
    pub fn goal_difference(&self) -> i32 {
        self.goals_for - self.goals_against
    }
}

/// Aggregate model performance for a league; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeagueMetrics {
    /// Share of correctly predicted outcomes, 0 to 1
    pub accuracy: Option<f64>,
    pub matches_analyzed: Option<u32>,
    pub avg_goals: Option<f64>,
    pub home_win_rate: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPrediction {
    pub fixture: Match,
    pub week: u32,
    pub predicted: Outcome,
    pub actual: Option<Outcome>,
    pub correct: bool,
}

/// Locally persisted proof of a validated license key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseSession {
    pub license_key: String,
    pub expires_at: DateTime<Utc>,
    pub subscription_type: String,
    pub email: String,
    pub authenticated_at: DateTime<Utc>,
}

impl LicenseSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}

/// Result of a successful remote license check
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LicenseVerification {
    pub valid: bool,
    pub expires_at: DateTime<Utc>,
    pub subscription_type: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Monthly,
    Quarterly,
    Yearly,
}

impl SubscriptionPlan {
    pub fn duration_days(&self) -> u32 {
        match self {
            SubscriptionPlan::Monthly => 30,
            SubscriptionPlan::Quarterly => 90,
            SubscriptionPlan::Yearly => 365,
        }
    }

    /// Price in EUR
    pub fn amount(&self) -> f64 {
        match self {
            SubscriptionPlan::Monthly => 19.99,
            SubscriptionPlan::Quarterly => 49.99,
            SubscriptionPlan::Yearly => 149.99,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Monthly => "monthly",
            SubscriptionPlan::Quarterly => "quarterly",
            SubscriptionPlan::Yearly => "yearly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRequest {
    pub email: String,
    pub name: String,
    pub subscription_type: String,
    pub duration_days: u32,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionReceipt {
    pub subscription_id: String,
    pub license_key: Option<String>,
    pub checkout_url: Option<String>,
}

/// Decimal odds for both sides; 0.0 means unset
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OddsPair {
    pub home: f64,
    pub away: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    pub home_team: String,
    pub away_team: String,
    pub league_id: LeagueId,
    pub match_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_odds: Option<OddsPair>,
}
