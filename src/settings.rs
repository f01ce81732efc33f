//! Per-button settings as stored by the host application.

use crate::constants::{
    DEFAULT_CYCLE_SECS, DEFAULT_DEPARTURE_COUNT, DEFAULT_REFRESH_SECS, DEFAULT_STATION_ID, FETCH_MULTIPLIER,
    MIN_FETCH_COUNT,
};
use crate::field::Field;
use serde::{Deserialize, Deserializer, Serialize, de};
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;

/// Settings of one button. Every option is optional in the host's JSON
/// payload; missing options take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// EVA number of the departure station.
    pub station_id: String,
    /// Seconds between feed refreshes.
    #[serde(deserialize_with = "number_or_text")]
    pub refresh_interval: u64,
    /// Seconds each departure stays on screen while rotating.
    #[serde(deserialize_with = "number_or_text")]
    pub cycle_interval: u64,
    pub enable_scrolling: bool,
    /// How many departures to rotate through.
    #[serde(deserialize_with = "number_or_text")]
    pub departure_count: usize,
    /// Comma-separated train lines, e.g. "S80, REX".
    pub train_filter: Option<String>,
    pub line1: Field,
    pub line2: Field,
    pub line3: Field,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            station_id: DEFAULT_STATION_ID.to_string(),
            refresh_interval: DEFAULT_REFRESH_SECS,
            cycle_interval: DEFAULT_CYCLE_SECS,
            enable_scrolling: true,
            departure_count: DEFAULT_DEPARTURE_COUNT,
            train_filter: None,
            line1: Field::Train,
            line2: Field::Destination,
            line3: Field::ActualTime,
        }
    }
}

impl Settings {
    /// Parses the host's settings payload.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Refresh period, at least one second.
    pub fn refresh_period(&self) -> Duration {
        Duration::from_secs(self.refresh_interval.max(1))
    }

    /// Rotation period, at least one second.
    pub fn cycle_period(&self) -> Duration {
        Duration::from_secs(self.cycle_interval.max(1))
    }

    /// Line selectors from top to bottom.
    pub fn fields(&self) -> [Field; 3] {
        [self.line1.clone(), self.line2.clone(), self.line3.clone()]
    }

    pub fn shows(&self, field: &Field) -> bool {
        [&self.line1, &self.line2, &self.line3].contains(&field)
    }

    /// Journeys to request from the feed. Over-fetches so the train filter
    /// still finds enough matches at busy stations.
    pub fn fetch_count(&self) -> usize {
        MIN_FETCH_COUNT.max(self.departure_count.saturating_mul(FETCH_MULTIPLIER))
    }
}

/// Property inspectors hand numbers back as strings once they were edited.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

fn number_or_text<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    match NumberOrText::<T>::deserialize(deserializer)? {
        NumberOrText::Number(value) => Ok(value),
        NumberOrText::Text(text) => text
            .trim()
            .parse()
            .map_err(|e| de::Error::custom(format!("invalid number '{text}': {e}"))),
    }
}
