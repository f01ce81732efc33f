//! # Constants and Configuration Module
//!
//! This module defines the static constants shared by the feed pipeline and
//! the button renderer, and handles loading the optional endpoint override
//! from the environment.
//!
//! The override is loaded lazily and cached on first use so the environment
//! is only consulted once per process.

use once_cell::sync::OnceCell;
use std::env;
use std::fmt;

/// Departure board endpoint of the ÖBB journey planner.
pub const BOARD_URL: &str = "https://fahrplan.oebb.at/bin/stboard.exe/dn";
/// Environment variable that replaces [`BOARD_URL`] when set.
pub const BOARD_URL_VAR: &str = "OEBB_BOARD_URL";

/// Wien Hauptbahnhof.
pub const DEFAULT_STATION_ID: &str = "1290401";
pub const DEFAULT_REFRESH_SECS: u64 = 120;
pub const DEFAULT_CYCLE_SECS: u64 = 10;
pub const DEFAULT_DEPARTURE_COUNT: usize = 1;

/// Lower bound on journeys requested per fetch, so filters still find
/// matches at busy stations.
pub const MIN_FETCH_COUNT: usize = 50;
/// Journeys requested per departure the user wants displayed.
pub const FETCH_MULTIPLIER: usize = 10;

/// Edge length of the square button image in pixels.
pub const IMAGE_SIZE: u32 = 144;
/// Height of each of the three text bands.
pub const BAND_HEIGHT: u32 = 48;
/// Left text margin, also the right margin for right-aligned text.
pub const TEXT_MARGIN: i32 = 10;
/// Baselines of the three lines.
pub const LINE_BASELINES: [u32; 3] = [32, 80, 128];
pub const FONT_FAMILY: &str = "Arial";
pub const LINE_FONT_SIZE: u32 = 24;
pub const COUNTER_FONT_SIZE: u32 = 14;
pub const MESSAGE_FONT_SIZE: u32 = 18;

pub const BAND_DARK: &str = "#000094";
pub const BAND_LIGHT: &str = "#0000ce";

/// Placeholder shown when the filtered board is empty.
pub const NO_DEPARTURES: &str = "No departures";
/// Placeholder shown when the feed could not be fetched.
pub const FETCH_ERROR: &str = "Error";

/// Represents errors that can occur when loading configuration from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The environment variable is set but contains an empty or whitespace-only value.
    EmptyVar(&'static str),
    /// The environment variable does not contain an absolute URL.
    InvalidUrl { var: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    /// Formats the configuration error for display.
    ///
    /// # Examples
    ///
    /// ```
    /// use oebb_deck::constants::ConfigError;
    ///
    /// let empty_error = ConfigError::EmptyVar("OEBB_BOARD_URL");
    /// assert_eq!(
    ///     empty_error.to_string(),
    ///     "Environment variable 'OEBB_BOARD_URL' is set but empty. \
    ///      Unset it to use the default endpoint."
    /// );
    /// ```
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::EmptyVar(var) => write!(
                f,
                "Environment variable '{var}' is set but empty. \
                Unset it to use the default endpoint."
            ),
            ConfigError::InvalidUrl { var, value } => write!(
                f,
                "Environment variable '{var}' must be an absolute URL, got '{value}'."
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

/// A thread-safe, write-once cell caching the resolved endpoint.
static BOARD_URL_CELL: OnceCell<String> = OnceCell::new();

/// Resolves the endpoint from a lookup function.
///
/// An unset variable yields [`BOARD_URL`]; a set variable must hold a
/// non-empty absolute URL.
fn resolve_with<F>(var: &'static str, fetch: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Result<String, env::VarError>,
{
    match fetch(var) {
        Ok(val) => {
            let val = val.trim();
            if val.is_empty() {
                return Err(ConfigError::EmptyVar(var));
            }
            reqwest::Url::parse(val).map_err(|_| ConfigError::InvalidUrl {
                var,
                value: val.to_string(),
            })?;
            Ok(val.to_string())
        }
        Err(_) => Ok(BOARD_URL.to_string()),
    }
}

/// Retrieves the departure board endpoint, honouring `OEBB_BOARD_URL`.
///
/// The value is resolved on the first call and cached for subsequent access.
///
/// # Errors
///
/// Returns `ConfigError` if the override is empty or not a URL.
pub fn board_url() -> Result<&'static str, ConfigError> {
    let value = BOARD_URL_CELL.get_or_try_init(|| resolve_with(BOARD_URL_VAR, |s| env::var(s)))?;
    Ok(value.as_str())
}

/// Eagerly validates the environment configuration.
///
/// Intended to be called at startup to "fail fast".
///
/// # Errors
///
/// Returns `ConfigError` if any override is invalid.
pub fn validate_config() -> Result<(), ConfigError> {
    board_url()?;
    Ok(())
}
