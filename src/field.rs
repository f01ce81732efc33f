//! # Field Module
//!
//! Maps a departure and a line selector from the settings to the text that
//! line shows, its color and an optional right-aligned companion text.

use crate::departure::Departure;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Redundant station-type word appended to many ÖBB destinations.
const STATION_SUFFIX: &str = " Bahnhof";
/// Longest train name shown next to a platform before eliding.
const TRAIN_WITH_PLATFORM_MAX: usize = 6;

/// Text colors used on the button.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    White,
    Yellow,
    Red,
    Green,
}

impl Color {
    /// Hex code as used in the SVG `fill` attribute.
    pub fn hex(&self) -> &'static str {
        match self {
            Color::White => "#FFFFFF",
            Color::Yellow => "#FFFF00",
            Color::Red => "#FF0000",
            Color::Green => "#00FF00",
        }
    }

    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Color::White => (0xFF, 0xFF, 0xFF),
            Color::Yellow => (0xFF, 0xFF, 0x00),
            Color::Red => (0xFF, 0x00, 0x00),
            Color::Green => (0x00, 0xFF, 0x00),
        }
    }
}

/// What a display line shows.
///
/// Selectors arrive as the camelCase names used by the settings UI; anything
/// unrecognized is kept as [`Field::Unknown`] and renders as "N/A".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(from = "String", into = "String")]
pub enum Field {
    Train,
    TrainWithPlatform,
    Destination,
    ScheduledTime,
    ActualTime,
    Platform,
    Delay,
    Unknown(String),
}

impl Field {
    pub fn as_str(&self) -> &str {
        match self {
            Field::Train => "train",
            Field::TrainWithPlatform => "trainWithPlatform",
            Field::Destination => "destination",
            Field::ScheduledTime => "scheduledTime",
            Field::ActualTime => "actualTime",
            Field::Platform => "platform",
            Field::Delay => "delay",
            Field::Unknown(name) => name,
        }
    }
}

impl From<&str> for Field {
    fn from(name: &str) -> Self {
        match name {
            "train" => Field::Train,
            "trainWithPlatform" => Field::TrainWithPlatform,
            "destination" => Field::Destination,
            "scheduledTime" => Field::ScheduledTime,
            "actualTime" => Field::ActualTime,
            "platform" => Field::Platform,
            "delay" => Field::Delay,
            other => Field::Unknown(other.to_string()),
        }
    }
}

impl From<String> for Field {
    fn from(name: String) -> Self {
        Field::from(name.as_str())
    }
}

impl From<Field> for String {
    fn from(field: Field) -> Self {
        field.as_str().to_string()
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolved content of one display line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldText {
    pub text: String,
    pub color: Color,
    pub right_text: Option<String>,
}

impl FieldText {
    fn new(text: impl Into<String>, color: Color) -> Self {
        Self { text: text.into(), color, right_text: None }
    }
}

/// Resolves `field` for `departure`.
///
/// # Examples
///
/// ```
/// use oebb_deck::departure::Departure;
/// use oebb_deck::field::{render, Color, Field};
///
/// let departure = Departure::new(
///     "S 80".into(), "Wien Meidling Bahnhof".into(), "14:05".into(),
///     "14:08".into(), "".into(), "+ 3".into(), true,
/// );
/// let line = render(&departure, &Field::Destination);
/// assert_eq!(line.text, "Wien Meidling");
/// assert_eq!(line.color, Color::White);
/// ```
pub fn render(departure: &Departure, field: &Field) -> FieldText {
    match field {
        Field::Train => FieldText::new(strip_whitespace(departure.train()), Color::White),
        Field::TrainWithPlatform => {
            let mut train = strip_whitespace(departure.train());
            if train.chars().count() > TRAIN_WITH_PLATFORM_MAX {
                train = train.chars().take(TRAIN_WITH_PLATFORM_MAX).collect();
                train.push('…');
            }
            FieldText {
                right_text: platform_number(departure.platform()),
                ..FieldText::new(train, Color::White)
            }
        }
        Field::Destination => {
            let destination = clean_destination(departure.destination());
            if departure.is_cancelled() {
                FieldText::new(format!("Cancelled {destination}"), Color::Yellow)
            } else {
                FieldText::new(destination, Color::White)
            }
        }
        Field::ScheduledTime => FieldText::new(departure.scheduled_time(), Color::White),
        Field::ActualTime => {
            if departure.is_cancelled() {
                FieldText::new("CANCELLED", Color::Red)
            } else if departure.is_delayed() {
                FieldText::new(departure.actual_time(), Color::Yellow)
            } else {
                FieldText::new(departure.actual_time(), Color::White)
            }
        }
        Field::Platform => {
            if departure.platform().is_empty() {
                FieldText::new("", Color::White)
            } else {
                FieldText::new(format!("Pl. {}", departure.platform()), Color::White)
            }
        }
        Field::Delay => {
            if departure.is_cancelled() {
                FieldText::new("CANCELLED", Color::Red)
            } else if departure.is_delayed() {
                FieldText::new(departure.delay(), Color::Yellow)
            } else {
                FieldText::new("On time", Color::Green)
            }
        }
        Field::Unknown(_) => FieldText::new("N/A", Color::White),
    }
}

/// Destination name without the trailing " Bahnhof".
pub fn clean_destination(destination: &str) -> &str {
    let trimmed = destination.trim();
    trimmed.strip_suffix(STATION_SUFFIX).unwrap_or(trimmed)
}

fn strip_whitespace(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Leading platform number ("2A-B" -> "2"), the whole platform when it does
/// not start with a digit, or nothing when unknown.
fn platform_number(platform: &str) -> Option<String> {
    if platform.is_empty() {
        return None;
    }
    let end = platform
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(platform.len());
    if end == 0 {
        Some(platform.to_string())
    } else {
        Some(platform[..end].to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn departure(train: &str, destination: &str, platform: &str, delay: &str, delayed: bool) -> Departure {
        Departure::new(
            train.to_string(),
            destination.to_string(),
            "14:05".to_string(),
            if delayed { "14:08" } else { "14:05" }.to_string(),
            platform.to_string(),
            delay.to_string(),
            delayed,
        )
    }

    fn on_time() -> Departure {
        departure("S 80", "Wien Meidling Bahnhof", "2A-B", "0", false)
    }

    fn delayed() -> Departure {
        departure("S 80", "Wien Meidling Bahnhof", "2", "+ 3", true)
    }

    fn cancelled() -> Departure {
        departure("REX 7", "Wolfsthal Bahnhof", "", "cancel", false)
    }

    #[test]
    fn field_names_round_trip() {
        for name in ["train", "trainWithPlatform", "destination", "scheduledTime", "actualTime", "platform", "delay"] {
            let field = Field::from(name);
            assert!(!matches!(field, Field::Unknown(_)), "{name} should be known");
            assert_eq!(field.as_str(), name);
        }
        assert_eq!(Field::from("operator"), Field::Unknown("operator".to_string()));
    }

    #[test]
    fn field_deserializes_from_json_string() {
        let field: Field = serde_json::from_str(r#""actualTime""#).unwrap();
        assert_eq!(field, Field::ActualTime);
        let unknown: Field = serde_json::from_str(r#""colour""#).unwrap();
        assert_eq!(unknown, Field::Unknown("colour".to_string()));
    }

    #[test]
    fn train_strips_whitespace() {
        let line = render(&on_time(), &Field::Train);
        assert_eq!(line.text, "S80");
        assert_eq!(line.color, Color::White);
        assert_eq!(line.right_text, None);
    }

    #[test]
    fn train_with_platform_uses_leading_digits() {
        let line = render(&on_time(), &Field::TrainWithPlatform);
        assert_eq!(line.text, "S80");
        assert_eq!(line.right_text.as_deref(), Some("2"));
    }

    #[test]
    fn train_with_platform_elides_long_names() {
        let dep = departure("RJX 1234", "Budapest-Keleti", "C", "0", false);
        let line = render(&dep, &Field::TrainWithPlatform);
        assert_eq!(line.text, "RJX123…");
        assert_eq!(line.right_text.as_deref(), Some("C"));
    }

    #[test]
    fn train_with_platform_without_platform() {
        let line = render(&cancelled(), &Field::TrainWithPlatform);
        assert_eq!(line.text, "REX7");
        assert_eq!(line.right_text, None);
    }

    #[test]
    fn destination_drops_station_suffix() {
        let line = render(&delayed(), &Field::Destination);
        assert_eq!(line.text, "Wien Meidling");
        assert_eq!(line.color.hex(), "#FFFFFF");
    }

    #[test]
    fn destination_is_never_truncated() {
        let dep = departure("S 1", "Flughafen Wien Schwechat Terminal 3", "1", "0", false);
        let line = render(&dep, &Field::Destination);
        assert_eq!(line.text, "Flughafen Wien Schwechat Terminal 3");
    }

    #[test]
    fn cancelled_destination_is_prefixed() {
        let line = render(&cancelled(), &Field::Destination);
        assert_eq!(line.text, "Cancelled Wolfsthal");
        assert_eq!(line.color, Color::Yellow);
    }

    #[test]
    fn scheduled_time_is_literal() {
        let line = render(&delayed(), &Field::ScheduledTime);
        assert_eq!(line.text, "14:05");
        assert_eq!(line.color, Color::White);
    }

    #[test]
    fn actual_time_colors() {
        assert_eq!(render(&on_time(), &Field::ActualTime), FieldText::new("14:05", Color::White));
        assert_eq!(render(&delayed(), &Field::ActualTime), FieldText::new("14:08", Color::Yellow));
        assert_eq!(render(&cancelled(), &Field::ActualTime), FieldText::new("CANCELLED", Color::Red));
    }

    #[test]
    fn platform_label() {
        assert_eq!(render(&on_time(), &Field::Platform).text, "Pl. 2A-B");
        assert_eq!(render(&cancelled(), &Field::Platform).text, "");
    }

    #[test]
    fn delay_states() {
        assert_eq!(render(&on_time(), &Field::Delay), FieldText::new("On time", Color::Green));
        assert_eq!(render(&delayed(), &Field::Delay), FieldText::new("+ 3", Color::Yellow));
        assert_eq!(render(&cancelled(), &Field::Delay), FieldText::new("CANCELLED", Color::Red));
    }

    #[test]
    fn unknown_field_is_not_available() {
        let line = render(&on_time(), &Field::Unknown("operator".to_string()));
        assert_eq!(line, FieldText::new("N/A", Color::White));
    }

    #[test]
    fn clean_destination_only_strips_suffix() {
        assert_eq!(clean_destination("  Bahnhof Wels "), "Bahnhof Wels");
        assert_eq!(clean_destination("Wien Westbahnhof"), "Wien Westbahnhof");
        assert_eq!(clean_destination("Linz Bahnhof"), "Linz");
    }
}
