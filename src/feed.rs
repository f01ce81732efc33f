//! # Feed Module
//!
//! Turns the raw text returned by the departure board endpoint into
//! [`Departure`] records.
//!
//! The endpoint answers with a tag soup that is not well-formed XML, so the
//! parser does not try to build a document. It scans for `<Journey ...>`
//! fragments and reads the handful of attributes it needs by pattern. A
//! fragment that cannot be used is skipped; parsing itself never fails.

use crate::departure::{CANCELLED, Departure};
use chrono::{NaiveTime, TimeDelta};
use log::debug;
use std::collections::HashSet;

const JOURNEY_OPEN: &str = "<Journey";
const MISSING: &str = "N/A";
/// Delay code for services with no realtime forecast.
const UNKNOWN_DELAY: &str = "-";
const TIME_FORMAT: &str = "%H:%M";

/// Attributes read from a single `<Journey>` fragment, defaults applied.
#[derive(Debug)]
struct Fragment<'a> {
    train: &'a str,
    destination: &'a str,
    scheduled_time: &'a str,
    delay: &'a str,
    realtime_id: &'a str,
    platform: &'a str,
}

impl<'a> Fragment<'a> {
    fn read(tag: &'a str) -> Self {
        Self {
            train: attribute(tag, "hafasname").unwrap_or(MISSING),
            destination: attribute(tag, "targetLoc").unwrap_or(MISSING),
            scheduled_time: attribute(tag, "fpTime").unwrap_or(MISSING),
            delay: attribute(tag, "delay").unwrap_or("0"),
            realtime_id: attribute(tag, "realtimeID").unwrap_or_default(),
            platform: attribute(tag, "platform").unwrap_or_default(),
        }
    }

    /// Replacement buses carry no platform and would read as cancelled.
    fn is_bus(&self) -> bool {
        self.train
            .get(..3)
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("bus"))
    }

    /// The feed repeats some services under an internal five-digit number
    /// (e.g. "S 23700") next to the passenger-facing name.
    fn is_internal_duplicate(&self) -> bool {
        self.delay == UNKNOWN_DELAY && !self.realtime_id.is_empty() && has_internal_number(self.train)
    }

    fn is_cancelled(&self) -> bool {
        self.delay == CANCELLED || (self.delay == UNKNOWN_DELAY && self.realtime_id.is_empty())
    }
}

/// Parses raw board text into at most `max_count` departures, in feed order.
///
/// Bus services, fragments without a usable departure time and duplicate
/// listings of the same service are dropped. A service without a forecast and
/// without a realtime identifier is treated as cancelled.
///
/// # Examples
///
/// ```
/// use oebb_deck::feed::parse;
///
/// let raw = r#"<Journey hafasname="S 80" targetLoc="Wien Meidling Bahnhof" fpTime="14:05" delay="+ 3" realtimeID="123"/>"#;
/// let departures = parse(raw, 10);
/// assert_eq!(departures.len(), 1);
/// assert_eq!(departures[0].actual_time(), "14:08");
/// assert!(departures[0].is_delayed());
/// ```
pub fn parse(raw: &str, max_count: usize) -> Vec<Departure> {
    let mut departures = Vec::new();
    let mut seen = HashSet::new();

    for tag in journey_tags(raw) {
        if departures.len() >= max_count {
            break;
        }

        let fragment = Fragment::read(tag);
        if fragment.is_bus() {
            debug!("skipping bus service '{}'", fragment.train);
            continue;
        }

        let Some(scheduled) = departure_time(fragment.scheduled_time) else {
            debug!("skipping '{}': unusable departure time '{}'", fragment.train, fragment.scheduled_time);
            continue;
        };

        let key = (fragment.scheduled_time, fragment.destination);
        if seen.contains(&key) {
            debug!("skipping duplicate '{}' at {}", fragment.train, fragment.scheduled_time);
            continue;
        }
        if fragment.is_internal_duplicate() {
            debug!("skipping internal service number '{}'", fragment.train);
            continue;
        }
        seen.insert(key);

        departures.push(normalize(&fragment, scheduled));
    }

    departures
}

fn normalize(fragment: &Fragment<'_>, scheduled: NaiveTime) -> Departure {
    let cancelled = fragment.is_cancelled();
    let minutes = if cancelled { None } else { delay_minutes(fragment.delay) };

    let actual_time = match minutes {
        Some(minutes) => (scheduled + TimeDelta::minutes(i64::from(minutes)))
            .format(TIME_FORMAT)
            .to_string(),
        None => fragment.scheduled_time.to_string(),
    };
    let delay = if cancelled { CANCELLED } else { fragment.delay };

    Departure::new(
        fragment.train.to_string(),
        fragment.destination.to_string(),
        fragment.scheduled_time.to_string(),
        actual_time,
        fragment.platform.to_string(),
        delay.to_string(),
        minutes.is_some(),
    )
}

/// Iterates over `<Journey ...>` fragments, each including its closing `>`.
fn journey_tags(raw: &str) -> impl Iterator<Item = &str> {
    let mut rest = raw;
    std::iter::from_fn(move || {
        loop {
            let start = rest.find(JOURNEY_OPEN)?;
            let body = &rest[start + JOURNEY_OPEN.len()..];
            let end = body.find('>')?;
            if end == 0 {
                rest = &body[1..];
                continue;
            }
            let tag = &rest[start..start + JOURNEY_OPEN.len() + end + 1];
            rest = &body[end + 1..];
            return Some(tag);
        }
    })
}

/// Reads `name="value"` from a tag. Names match case-insensitively and only
/// at the start of an attribute. Empty values count as missing.
fn attribute<'a>(tag: &'a str, name: &str) -> Option<&'a str> {
    let lower = tag.to_ascii_lowercase();
    let needle = format!("{}=\"", name.to_ascii_lowercase());

    let mut from = 0;
    while let Some(pos) = lower[from..].find(&needle) {
        let at = from + pos;
        if at > 0 && lower.as_bytes()[at - 1].is_ascii_whitespace() {
            let value_start = at + needle.len();
            let len = tag[value_start..].find('"')?;
            return Some(&tag[value_start..value_start + len]).filter(|v| !v.is_empty());
        }
        from = at + needle.len();
    }
    None
}

/// Whitespace followed by five digits anywhere in the service name.
fn has_internal_number(train: &str) -> bool {
    let chars: Vec<char> = train.chars().collect();
    chars
        .windows(6)
        .any(|w| w[0].is_whitespace() && w[1..].iter().all(char::is_ascii_digit))
}

/// Parses a zero-padded "HH:MM" literal. Anything that would not format back
/// to the same text ("9:05", "09:5") is rejected.
fn departure_time(literal: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(literal, TIME_FORMAT)
        .ok()
        .filter(|time| time.format(TIME_FORMAT).to_string() == literal)
}

/// Minutes encoded by a "+ N" delay code, if positive.
fn delay_minutes(code: &str) -> Option<u32> {
    let digits = code.trim().strip_prefix('+')?.trim_start();
    let end = digits.find(|c: char| !c.is_ascii_digit()).unwrap_or(digits.len());
    digits[..end].parse::<u32>().ok().filter(|minutes| *minutes > 0)
}
