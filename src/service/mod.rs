//! # Service Module
//!
//! This module handles all interactions with the ÖBB departure board. It
//! defines the [`FeedSource`] seam the scheduler fetches through, the HTTP
//! implementation against the live endpoint, and the fetch-and-parse step
//! that turns a response into departures.

use crate::departure::Departure;
use crate::error::FetchError;
use crate::feed;
use once_cell::sync::Lazy;
use std::future::Future;

/// A lazily initialized, shared `reqwest::Client` for making HTTP requests.
/// Using a single client instance is more efficient as it reuses connection pools.
static CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// Product class bitmask the ÖBB board widget sends.
const PRODUCTS_FILTER: &str = "1111110000011";

/// Something that can produce the raw departure board text for a station.
///
/// The text is opaque here; it is handed to [`feed::parse`] unchanged.
pub trait FeedSource: Send + Sync + 'static {
    /// Fetches up to `count` journeys departing from `station_id`.
    fn fetch(&self, station_id: &str, count: usize) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// What to fetch for one refresh.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedRequest {
    pub station_id: String,
    /// Journeys to request and the parser's upper bound.
    pub count: usize,
}

/// Fetches the board from the ÖBB `stboard.exe` endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpFeedSource {
    base_url: String,
}

impl HttpFeedSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl FeedSource for HttpFeedSource {
    async fn fetch(&self, station_id: &str, count: usize) -> Result<String, FetchError> {
        fetch_board(&self.base_url, station_id, count).await
    }
}

/// Performs the actual HTTP GET request against the board endpoint.
///
/// # Arguments
///
/// * `base_url` - The board endpoint.
/// * `station_id` - EVA number of the station.
/// * `count` - The number of journeys to request.
///
/// A non-success status is reported as [`FetchError::Unavailable`]; the
/// board serves maintenance pages that way.
async fn fetch_board(base_url: &str, station_id: &str, count: usize) -> Result<String, FetchError> {
    let count = count.to_string();
    let response = CLIENT
        .get(base_url)
        .query(&[
            ("L", "vs_java3"),
            ("evaId", station_id),
            ("boardType", "dep"),
            ("productsFilter", PRODUCTS_FILTER),
            ("start", "yes"),
            ("showJourneys", count.as_str()),
        ])
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Unavailable(format!("HTTP {status}")));
    }
    Ok(response.text().await?)
}

/// Fetches the board for `request` and parses it into departures.
///
/// # Errors
///
/// Returns the source's error if the board could not be fetched. Malformed
/// board text is not an error; it just yields fewer departures.
pub async fn load_departures<S: FeedSource>(source: &S, request: &FeedRequest) -> Result<Vec<Departure>, FetchError> {
    let raw = source.fetch(&request.station_id, request.count).await?;
    Ok(feed::parse(&raw, request.count))
}
