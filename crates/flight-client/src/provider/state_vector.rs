// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Bulk state-vector provider (OpenSky Network `states/all`).
//!
//! The feed takes a rectangle (`lamin`/`lomin`/`lamax`/`lomax`) and answers
//! with positional tuples. A rectangle cannot cross the dateline, so a
//! wrapping box is fetched as two segments and merged.

use log::{debug, info};
use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::cache::{CachePolicy, FetchCache};
use crate::bbox::BoundingBox;
use crate::error::{Error, Result};
use crate::flight::{dedupe_by_icao, normalize_callsign, normalize_icao24, FlightState};
use crate::http::HttpClient;

/// Public OpenSky endpoint.
pub const DEFAULT_BASE_URL: &str = "https://opensky-network.org/api/states/all";

const PROVIDER: &str = "OpenSky";

// Offsets into a state vector tuple
const ICAO24: usize = 0;
const CALLSIGN: usize = 1;
const LAST_CONTACT: usize = 4;
const LONGITUDE: usize = 5;
const LATITUDE: usize = 6;
const ON_GROUND: usize = 8;
const VELOCITY: usize = 9;
const TRUE_TRACK: usize = 10;
const VERTICAL_RATE: usize = 11;
const GEO_ALTITUDE: usize = 13;
const SQUAWK: usize = 14;

#[derive(Debug, Deserialize)]
struct StatesResponse {
    #[serde(default)]
    states: Option<Vec<Vec<Value>>>,
}

fn number_at(row: &[Value], offset: usize) -> Option<f64> {
    match row.get(offset)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        _ => None,
    }
}

fn text_at(row: &[Value], offset: usize) -> Option<&str> {
    row.get(offset)?.as_str()
}

/// Map one positional tuple into the canonical schema.
fn map_state(row: &[Value]) -> Option<FlightState> {
    let Some(icao24) = text_at(row, ICAO24).and_then(normalize_icao24) else {
        debug!("Skipping state vector without icao24");
        return None;
    };

    Some(FlightState {
        icao24,
        callsign: text_at(row, CALLSIGN).and_then(normalize_callsign),
        latitude: number_at(row, LATITUDE),
        longitude: number_at(row, LONGITUDE),
        altitude: number_at(row, GEO_ALTITUDE),
        velocity: number_at(row, VELOCITY),
        heading: number_at(row, TRUE_TRACK),
        vertical_speed: number_at(row, VERTICAL_RATE),
        on_ground: row.get(ON_GROUND).and_then(Value::as_bool),
        squawk: text_at(row, SQUAWK).and_then(normalize_callsign),
        updated: row.get(LAST_CONTACT).and_then(Value::as_i64),
        ..FlightState::default()
    })
}

/// Client for a bulk state-vector feed.
#[derive(Debug)]
pub struct StateVectorClient<C: HttpClient> {
    http: C,
    base_url: Url,
    cache: Mutex<FetchCache>,
}

impl<C: HttpClient> StateVectorClient<C> {
    /// Creates a client for the feed at `base_url`.
    pub fn new(http: C, base_url: &str, policy: CachePolicy) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Configuration(format!("invalid {PROVIDER} base URL: {e}")))?;

        Ok(Self {
            http,
            base_url,
            cache: Mutex::new(FetchCache::new(policy)),
        })
    }

    /// Fetch the flights inside `bbox`, subject to the cache policy.
    pub async fn get_states(&self, bbox: &BoundingBox) -> Result<Vec<FlightState>> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.lookup(bbox) {
            return Ok(cached);
        }

        let started = Instant::now();
        let mapped = if bbox.wraps_dateline() {
            let (mut west, east) = tokio::try_join!(
                self.fetch_segment(bbox.min_lat(), bbox.min_lon(), bbox.max_lat(), 180.0),
                self.fetch_segment(bbox.min_lat(), -180.0, bbox.max_lat(), bbox.max_lon()),
            )?;
            west.extend(east);
            west
        } else {
            self.fetch_segment(bbox.min_lat(), bbox.min_lon(), bbox.max_lat(), bbox.max_lon())
                .await?
        };

        let flights = dedupe_by_icao(mapped);
        info!("{PROVIDER}: fetched {} flights", flights.len());
        cache.store(bbox, started, flights.clone());
        Ok(flights)
    }

    /// Query a single non-wrapping rectangle.
    async fn fetch_segment(
        &self,
        min_lat: f64,
        min_lon: f64,
        max_lat: f64,
        max_lon: f64,
    ) -> Result<Vec<FlightState>> {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("lamin", &min_lat.to_string())
            .append_pair("lomin", &min_lon.to_string())
            .append_pair("lamax", &max_lat.to_string())
            .append_pair("lomax", &max_lon.to_string());

        debug!("{PROVIDER}: requesting {url}");
        let response = self
            .http
            .get(url.as_str())
            .await
            .map_err(|e| Error::upstream(PROVIDER, None, e.to_string()))?;

        if !response.is_success() {
            return Err(Error::upstream(
                PROVIDER,
                Some(response.status),
                format!("HTTP {}", response.status),
            ));
        }

        let parsed: StatesResponse = serde_json::from_slice(&response.body).map_err(|e| {
            Error::upstream(PROVIDER, Some(response.status), format!("invalid response: {e}"))
        })?;

        Ok(parsed
            .states
            .unwrap_or_default()
            .iter()
            .filter_map(|row| map_state(row))
            .collect())
    }
}
