// Feed models and arrival resolution for the agency real-time API.
//
// Endpoints:
// - Trips list: GET {base_url}/trips/?route_id={routeId}
// - Trip detail: GET {base_url}/trip-update/?trip_id={tripId}
//
// The feed exposes arrivals as a two-level hierarchy (trips, then per-trip
// stop visits), so finding the next arrival at one stop means listing the
// route's trips and fanning out across the per-trip detail endpoint.

use reqwest::blocking;
use reqwest::header;
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::Config;

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum FeedError {
    NetworkError(String),
    ParseError(String),
    ConfigError(String),
}

impl std::fmt::Display for FeedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeedError::NetworkError(e) => write!(f, "Network error: {}", e),
            FeedError::ParseError(e) => write!(f, "Parse error: {}", e),
            FeedError::ConfigError(e) => write!(f, "Config error: {}", e),
        }
    }
}

impl std::error::Error for FeedError {}

pub type Result<T> = std::result::Result<T, FeedError>;

// ============================================================================
// Feed Records
// ============================================================================

/// One vehicle run on the route, from the trips list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct Trip {
    pub trip_id: String,
    pub direction_id: String,
    pub status: String,
}

impl Trip {
    const UNTRACKED_STATUSES: [&'static str; 2] = ["canceled", "no-gps"];

    /// Canceled trips and trips without a GPS fix never produce usable ETAs.
    /// Any other status value, known or not, is kept.
    pub fn is_tracked(&self) -> bool {
        !Self::UNTRACKED_STATUSES
            .iter()
            .any(|s| self.status.eq_ignore_ascii_case(s))
    }
}

/// Detail response for a single trip.
#[derive(Debug, Clone, Deserialize)]
pub struct TripUpdate {
    pub stop_times: Vec<StopTime>,
}

/// One stop visit within a trip.
#[derive(Debug, Clone, Deserialize)]
pub struct StopTime {
    pub stop_id: String,
    pub departed: bool,
    pub eta: i64,
}

// ============================================================================
// Shared Arrival State
// ============================================================================

/// Result of one completed fetch cycle, overwritten as a whole record.
/// `available == false` always carries `eta_epoch == 0` and
/// `eta_minutes == -1`; the constructors below are the only way to build one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrivalState {
    pub available: bool,
    pub eta_epoch: i64,
    pub eta_minutes: i64,
}

impl ArrivalState {
    pub fn unavailable() -> Self {
        ArrivalState {
            available: false,
            eta_epoch: 0,
            eta_minutes: -1,
        }
    }

    /// `eta_minutes` is the ceiling of the remaining time, so a bus 61
    /// seconds out reads as 2 minutes.
    pub fn arriving(eta_epoch: i64, now: i64) -> Self {
        let remaining = eta_epoch.saturating_sub(now).max(0);
        ArrivalState {
            available: true,
            eta_epoch,
            eta_minutes: (remaining + 59) / 60,
        }
    }
}

/// Counts reported in the per-cycle status line.
#[derive(Debug, Clone, Copy, Default)]
pub struct CycleStats {
    pub trips_listed: usize,
    pub trips_qualified: usize,
    pub details_skipped: usize,
}

// ============================================================================
// Feed Source
// ============================================================================

pub trait FeedSource {
    fn trips_for_route(&self, route_id: &str) -> Result<Vec<Trip>>;
    fn trip_update(&self, trip_id: &str) -> Result<TripUpdate>;
}

/// Blocking HTTP implementation of the feed. One client (and connection) per
/// request, released before the next request in the fan-out begins.
pub struct HttpFeed<'a> {
    config: &'a Config,
}

impl<'a> HttpFeed<'a> {
    const USER_AGENT: &'static str = concat!("buswatch/", env!("CARGO_PKG_VERSION"));

    pub fn new(config: &'a Config) -> Self {
        HttpFeed { config }
    }

    fn create_http_client(&self) -> Result<blocking::Client> {
        blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(
                self.config.request_timeout_secs,
            ))
            .build()
            .map_err(|e| FeedError::NetworkError(format!("Failed to create HTTP client: {}", e)))
    }

    fn trips_url(&self, route_id: &str) -> String {
        let mut url = format!("{}/trips/?route_id={}", self.config.base_url, route_id);
        if let Some(key) = &self.config.api_key {
            url.push_str(&format!("&apiKey={}", key));
        }
        url
    }

    fn trip_update_url(&self, trip_id: &str) -> String {
        let mut url = format!("{}/trip-update/?trip_id={}", self.config.base_url, trip_id);
        if let Some(key) = &self.config.api_key {
            url.push_str(&format!("&apiKey={}", key));
        }
        url
    }

    fn get<T: DeserializeOwned>(&self, url: &str, what: &str) -> Result<T> {
        let client = self.create_http_client()?;

        let response = client
            .get(url)
            .header(header::USER_AGENT, Self::USER_AGENT)
            .header(header::ACCEPT, "application/json")
            .send()
            .map_err(|e| FeedError::NetworkError(format!("Failed to fetch {}: {}", what, e)))?;

        if !response.status().is_success() {
            return Err(FeedError::NetworkError(format!(
                "{} request failed with status: {}",
                what,
                response.status()
            )));
        }

        let body = response
            .text()
            .map_err(|e| FeedError::NetworkError(format!("Failed to read {} response: {}", what, e)))?;

        serde_json::from_str(&body)
            .map_err(|e| FeedError::ParseError(format!("Invalid {} JSON: {}", what, e)))
    }
}

impl FeedSource for HttpFeed<'_> {
    fn trips_for_route(&self, route_id: &str) -> Result<Vec<Trip>> {
        self.get(&self.trips_url(route_id), "trips list")
    }

    fn trip_update(&self, trip_id: &str) -> Result<TripUpdate> {
        self.get(&self.trip_update_url(trip_id), "trip update")
    }
}

// ============================================================================
// Arrival Resolution
// ============================================================================

/// One fetch cycle: list the route's trips, fan out to the detail endpoint
/// for every trip on the watched direction that is still tracked, and reduce
/// the matching future stop-times to the soonest ETA.
///
/// A trips-list failure makes the whole cycle unavailable. A per-trip detail
/// failure only skips that trip; the fan-out continues.
pub fn resolve_next_arrival<F: FeedSource>(
    feed: &F,
    config: &Config,
    now: i64,
) -> (ArrivalState, CycleStats) {
    let mut stats = CycleStats::default();

    let trips = match feed.trips_for_route(&config.route_id) {
        Ok(trips) => trips,
        Err(e) => {
            eprintln!("⚠️  Trips list fetch failed: {}", e);
            return (ArrivalState::unavailable(), stats);
        }
    };
    stats.trips_listed = trips.len();

    let mut soonest: Option<i64> = None;

    for trip in trips
        .iter()
        .filter(|t| t.direction_id == config.direction_id && t.is_tracked())
    {
        stats.trips_qualified += 1;

        let update = match feed.trip_update(&trip.trip_id) {
            Ok(update) => update,
            Err(e) => {
                eprintln!("⚠️  Skipping trip {}: {}", trip.trip_id, e);
                stats.details_skipped += 1;
                continue;
            }
        };

        for stop_time in &update.stop_times {
            if stop_time.stop_id == config.stop_id && !stop_time.departed && stop_time.eta > now {
                if soonest.is_none_or(|s| stop_time.eta < s) {
                    soonest = Some(stop_time.eta);
                }
            }
        }
    }

    let state = match soonest {
        Some(eta) => ArrivalState::arriving(eta, now),
        None => ArrivalState::unavailable(),
    };

    (state, stats)
}

// ============================================================================
// Tests
// ============================================================================
