use crate::models::{Match, OddsPair};
use crate::utils::odds::parse_decimal_odds;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Home,
    Away,
}

/// Lookup key built from team ids, falls back to names when an id is missing
pub fn id_key(fixture: &Match) -> String {
    format!(
        "{}-{}-{}",
        fixture.home.id.as_deref().unwrap_or(&fixture.home.name),
        fixture.away.id.as_deref().unwrap_or(&fixture.away.name),
        fixture.match_day()
    )
}

pub fn name_key(home: &str, away: &str, match_day: &str) -> String {
    format!("{}-{}-{}", home.trim(), away.trim(), match_day)
}

/// User-entered decimal odds, keyed per match.
///
/// Every edit is written under both the id key and the name key, since the
/// prediction request side looks odds up by team names only.
#[derive(Debug, Clone, Default)]
pub struct ManualOddsBook {
    entries: HashMap<String, OddsPair>,
}

impl ManualOddsBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Controlled-input handler; returns the parsed value (0.0 when unset/invalid)
    pub fn edit(&mut self, fixture: &Match, side: Side, raw: &str) -> f64 {
        let value = parse_decimal_odds(raw);
        let by_id = id_key(fixture);
        let by_name = name_key(&fixture.home.name, &fixture.away.name, &fixture.match_day());

        let mut pair = self.for_match(fixture);
        match side {
            Side::Home => pair.home = value,
            Side::Away => pair.away = value,
        }
        self.entries.insert(by_id, pair);
        self.entries.insert(by_name, pair);
        value
    }

    pub fn get_by_id(&self, fixture: &Match) -> Option<OddsPair> {
        self.entries.get(&id_key(fixture)).copied()
    }

    pub fn get_by_names(&self, home: &str, away: &str, match_day: &str) -> Option<OddsPair> {
        self.entries.get(&name_key(home, away, match_day)).copied()
    }

    /// Current pair for a match, unset sentinel when nothing was entered
    pub fn for_match(&self, fixture: &Match) -> OddsPair {
        self.get_by_id(fixture)
            .or_else(|| {
                self.get_by_names(&fixture.home.name, &fixture.away.name, &fixture.match_day())
            })
            .unwrap_or_default()
    }

    /// Odds to hand to the prediction request, only when something is set
    pub fn odds_for_request(&self, home: &str, away: &str, match_day: &str) -> Option<OddsPair> {
        self.get_by_names(home, away, match_day)
            .filter(OddsPair::is_set)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
