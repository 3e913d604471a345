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

//! Radius-search provider (Aviation Edge flight tracker).
//!
//! The upstream API only understands a center point and a radius, so the
//! viewport is approximated by the circle through its farthest corner,
//! capped at the largest radius the API supports. Requests normally go
//! through the credential-holding proxy, so this client never sees the key.

use log::{debug, info, warn};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::cache::{CachePolicy, FetchCache};
use crate::bbox::BoundingBox;
use crate::error::{Error, Result};
use crate::flight::{dedupe_by_icao, normalize_callsign, normalize_icao24, FlightState};
use crate::http::HttpClient;

/// Proxy route served by the `flightmap` binary.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3001/api/proxy/aviation-edge/flights";

/// Largest search radius the upstream accepts, in km.
pub const MAX_RADIUS_KM: f64 = 500.0;

const PROVIDER: &str = "Aviation Edge";

/// Decode a field, treating a value of the wrong type like a missing one.
///
/// Only the icao24 decides whether a record is usable; a stray string in a
/// numeric field must not drop the whole aircraft.
fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).ok())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawFlight {
    #[serde(deserialize_with = "lenient")]
    aircraft: Option<RawAircraft>,
    #[serde(deserialize_with = "lenient")]
    airline: Option<RawCodes>,
    #[serde(deserialize_with = "lenient")]
    departure: Option<RawCodes>,
    #[serde(deserialize_with = "lenient")]
    arrival: Option<RawCodes>,
    #[serde(deserialize_with = "lenient")]
    flight: Option<RawFlightNumber>,
    #[serde(deserialize_with = "lenient")]
    geography: Option<RawGeography>,
    #[serde(deserialize_with = "lenient")]
    speed: Option<RawSpeed>,
    #[serde(deserialize_with = "lenient")]
    system: Option<RawSystem>,
    #[serde(deserialize_with = "lenient")]
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawAircraft {
    #[serde(deserialize_with = "lenient")]
    icao24: Option<String>,
    #[serde(deserialize_with = "lenient")]
    iata_code: Option<String>,
    #[serde(deserialize_with = "lenient")]
    icao_code: Option<String>,
    #[serde(deserialize_with = "lenient")]
    reg_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawCodes {
    #[serde(deserialize_with = "lenient")]
    iata_code: Option<String>,
    #[serde(deserialize_with = "lenient")]
    icao_code: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawFlightNumber {
    #[serde(deserialize_with = "lenient")]
    icao_number: Option<String>,
    #[serde(deserialize_with = "lenient")]
    iata_number: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawGeography {
    #[serde(deserialize_with = "lenient")]
    latitude: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    longitude: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    altitude: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    direction: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RawSpeed {
    #[serde(deserialize_with = "lenient")]
    horizontal: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    vspeed: Option<f64>,
    #[serde(deserialize_with = "lenient")]
    is_ground: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSystem {
    #[serde(deserialize_with = "lenient")]
    squawk: Option<Value>,
    #[serde(deserialize_with = "lenient")]
    updated: Option<i64>,
}

/// Map one nested flight object into the canonical schema.
fn map_flight(raw: RawFlight) -> Option<FlightState> {
    let aircraft = raw.aircraft.unwrap_or_default();
    let Some(icao24) = aircraft.icao24.as_deref().and_then(normalize_icao24) else {
        debug!("Skipping {PROVIDER} flight without icao24");
        return None;
    };

    let airline = raw.airline.unwrap_or_default();
    let departure = raw.departure.unwrap_or_default();
    let arrival = raw.arrival.unwrap_or_default();
    let flight = raw.flight.unwrap_or_default();
    let geography = raw.geography.unwrap_or_default();
    let speed = raw.speed.unwrap_or_default();
    let system = raw.system.unwrap_or_default();

    let callsign = flight
        .icao_number
        .as_deref()
        .and_then(normalize_callsign)
        .or_else(|| flight.iata_number.as_deref().and_then(normalize_callsign));

    let squawk = match system.squawk {
        Some(Value::String(s)) => normalize_callsign(&s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    };

    Some(FlightState {
        icao24,
        callsign,
        latitude: geography.latitude,
        longitude: geography.longitude,
        altitude: geography.altitude,
        velocity: speed.horizontal,
        heading: geography.direction,
        vertical_speed: speed.vspeed,
        on_ground: speed.is_ground.map(|flag| flag != 0.0),
        status: raw.status,
        squawk,
        updated: system.updated,
        airline_iata: airline.iata_code,
        airline_icao: airline.icao_code,
        flight_iata: flight.iata_number,
        flight_icao: flight.icao_number,
        aircraft_iata: aircraft.iata_code,
        aircraft_icao: aircraft.icao_code,
        aircraft_reg: aircraft.reg_number,
        origin_iata: departure.iata_code,
        origin_icao: departure.icao_code,
        destination_iata: arrival.iata_code,
        destination_icao: arrival.icao_code,
    })
}

/// Radius that covers the box from its center, in whole km.
///
/// Capped at [`MAX_RADIUS_KM`]; flights near the far corners of a larger box
/// are simply not returned. Never below 1 km.
#[must_use]
pub fn search_radius_km(bbox: &BoundingBox) -> f64 {
    bbox.max_corner_distance_km().ceil().clamp(1.0, MAX_RADIUS_KM)
}

/// Pull the `error` message out of a JSON object body.
fn error_message(body: &Value) -> Option<&str> {
    body.as_object()?.get("error")?.as_str()
}

/// Client for a center-plus-radius flight search.
#[derive(Debug)]
pub struct RadiusSearchClient<C: HttpClient> {
    http: C,
    base_url: Url,
    limit: Option<u32>,
    cache: Mutex<FetchCache>,
}

impl<C: HttpClient> RadiusSearchClient<C> {
    /// Creates a client for the endpoint at `base_url`.
    pub fn new(http: C, base_url: &str, limit: Option<u32>, policy: CachePolicy) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| Error::Configuration(format!("invalid {PROVIDER} base URL: {e}")))?;

        Ok(Self {
            http,
            base_url,
            limit,
            cache: Mutex::new(FetchCache::new(policy)),
        })
    }

    /// Fetch the flights around `bbox`, subject to the cache policy.
    pub async fn get_states(&self, bbox: &BoundingBox) -> Result<Vec<FlightState>> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.lookup(bbox) {
            return Ok(cached);
        }

        let started = Instant::now();
        let flights = dedupe_by_icao(self.fetch(bbox).await?);
        info!("{PROVIDER}: fetched {} flights", flights.len());
        cache.store(bbox, started, flights.clone());
        Ok(flights)
    }

    async fn fetch(&self, bbox: &BoundingBox) -> Result<Vec<FlightState>> {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("lat", &bbox.center_latitude().to_string())
                .append_pair("lng", &bbox.center_longitude().to_string())
                .append_pair("distance", &format!("{:.0}", search_radius_km(bbox)));
            if let Some(limit) = self.limit {
                query.append_pair("limit", &limit.to_string());
            }
        }

        let response = self
            .http
            .get(url.as_str())
            .await
            .map_err(|e| Error::upstream(PROVIDER, None, e.to_string()))?;

        let body: Option<Value> = serde_json::from_slice(&response.body).ok();

        if !response.is_success() {
            let message = body
                .as_ref()
                .and_then(error_message)
                .map_or_else(|| format!("HTTP {}", response.status), str::to_string);
            return Err(Error::upstream(PROVIDER, Some(response.status), message));
        }

        let items = match body {
            Some(Value::Array(items)) => items,
            Some(other) => {
                let message = error_message(&other).unwrap_or("unexpected response shape");
                return Err(Error::upstream(PROVIDER, Some(response.status), message));
            }
            None => {
                return Err(Error::upstream(
                    PROVIDER,
                    Some(response.status),
                    "response is not valid JSON",
                ));
            }
        };

        Ok(items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<RawFlight>(item) {
                Ok(raw) => map_flight(raw),
                Err(e) => {
                    warn!("Skipping malformed {PROVIDER} flight: {e}");
                    None
                }
            })
            .collect())
    }
}
