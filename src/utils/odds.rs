use crate::models::OddsPair;

/// Sentinel for "unset, use the model only"
pub const UNSET_ODDS: f64 = 0.0;

/// Parse user-typed decimal odds.
/// Anything that is not a finite positive number collapses to [`UNSET_ODDS`].
/// A comma decimal separator is accepted ("2,5" -> 2.5).
pub fn parse_decimal_odds(input: &str) -> f64 {
    match input.trim().replace(',', ".").parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => UNSET_ODDS,
    }
}

/// Convert decimal odds to implied probability
/// 2.0 -> 0.5, 4.0 -> 0.25
pub fn decimal_odds_to_probability(odds: f64) -> Option<f64> {
    (odds > 0.0).then(|| 1.0 / odds)
}

/// Bookmaker margin of a two-way market (sum of implied probabilities minus one)
pub fn overround(home: f64, away: f64) -> Option<f64> {
    Some(decimal_odds_to_probability(home)? + decimal_odds_to_probability(away)? - 1.0)
}

impl OddsPair {
    pub fn is_set(&self) -> bool {
        self.home > UNSET_ODDS || self.away > UNSET_ODDS
    }

    /// Implied probabilities with the margin removed, only when both sides are set
    pub fn implied_probabilities(&self) -> Option<(f64, f64)> {
        let home = decimal_odds_to_probability(self.home)?;
        let away = decimal_odds_to_probability(self.away)?;
        let total = home + away;
        Some((home / total, away / total))
    }

    /// Edge of a model probability over the market price for the home side
    pub fn home_edge(&self, model_home_prob: f64) -> Option<f64> {
        self.implied_probabilities()
            .map(|(home, _)| model_home_prob - home)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal_odds() {
        assert_eq!(parse_decimal_odds("2.10"), 2.1);
        assert_eq!(parse_decimal_odds(" 1,85 "), 1.85);
        assert_eq!(parse_decimal_odds("abc"), UNSET_ODDS);
        assert_eq!(parse_decimal_odds(""), UNSET_ODDS);
        assert_eq!(parse_decimal_odds("-1.5"), UNSET_ODDS);
        assert_eq!(parse_decimal_odds("0"), UNSET_ODDS);
        assert_eq!(parse_decimal_odds("inf"), UNSET_ODDS);
        assert_eq!(parse_decimal_odds("NaN"), UNSET_ODDS);
    }

    #[test]
    fn test_decimal_odds_to_probability() {
        let prob = decimal_odds_to_probability(2.0).unwrap();
        assert!((prob - 0.5).abs() < 0.001);
        let prob = decimal_odds_to_probability(4.0).unwrap();
        assert!((prob - 0.25).abs() < 0.001);
        assert!(decimal_odds_to_probability(UNSET_ODDS).is_none());
    }

    #[test]
    fn test_implied_probabilities_remove_margin() {
        let pair = OddsPair {
            home: 1.9,
            away: 1.9,
        };
        let margin = overround(pair.home, pair.away).unwrap();
        assert!(margin > 0.05);

        let (home, away) = pair.implied_probabilities().unwrap();
        assert!((home - 0.5).abs() < 0.001);
        assert!((home + away - 1.0).abs() < 1e-9);

        let half_set = OddsPair {
            home: 2.0,
            away: UNSET_ODDS,
        };
        assert!(half_set.is_set());
        assert!(half_set.implied_probabilities().is_none());
        assert!(!OddsPair::default().is_set());
    }

    #[test]
    fn test_home_edge() {
        let pair = OddsPair {
            home: 2.0,
            away: 2.0,
        };
        let edge = pair.home_edge(0.6).unwrap();
        assert!((edge - 0.1).abs() < 0.001);
    }
}
