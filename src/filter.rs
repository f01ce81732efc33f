//! Train line filtering for the user's `trainFilter` setting.

use crate::departure::Departure;

/// A parsed comma-separated list of train line tokens such as `"S80, REX"`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainFilter {
    tokens: Vec<String>,
}

impl TrainFilter {
    /// Builds a filter from the raw setting. Tokens are trimmed, uppercased
    /// and stripped of whitespace; empty tokens are ignored.
    pub fn parse(setting: Option<&str>) -> Self {
        let tokens = setting
            .unwrap_or_default()
            .split(',')
            .map(normalize)
            .filter(|token| !token.is_empty())
            .collect();
        Self { tokens }
    }

    /// True when the filter lets every departure through.
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Whether the departure's train name contains any of the tokens.
    pub fn matches(&self, departure: &Departure) -> bool {
        if self.is_empty() {
            return true;
        }
        let train = normalize(departure.train());
        self.tokens.iter().any(|token| train.contains(token.as_str()))
    }

    /// Keeps matching departures in their original order.
    pub fn apply(&self, departures: Vec<Departure>) -> Vec<Departure> {
        if self.is_empty() {
            return departures;
        }
        departures.into_iter().filter(|d| self.matches(d)).collect()
    }
}

/// Applies the filter from `setting` and keeps the first `count` results.
pub fn select(departures: Vec<Departure>, setting: Option<&str>, count: usize) -> Vec<Departure> {
    let mut selected = TrainFilter::parse(setting).apply(departures);
    selected.truncate(count);
    selected
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase()
}
