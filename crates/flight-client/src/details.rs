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

//! Per-flight details for the selected aircraft.
//!
//! Details are fetched on demand when a flight is selected and describe its
//! route: origin, destination and the waypoints to draw between them.

use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::flight::FlightState;

/// A geographic point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lon: f64,
}

/// An airport on a flight's route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub code: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

impl Airport {
    #[must_use]
    pub fn position(&self) -> LatLng {
        LatLng {
            lat: self.lat,
            lon: self.lon,
        }
    }
}

/// Route information for one aircraft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightDetails {
    pub icao24: String,
    pub callsign: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<Airport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<Airport>,
    /// Ordered waypoints, possibly empty.
    #[serde(default)]
    pub path: Vec<LatLng>,
}

/// Source of flight details.
pub trait FlightDetailsProvider: Send + Sync {
    /// Look up details for an aircraft; `Ok(None)` when nothing is known.
    fn get_flight_details(
        &self,
        icao24: &str,
    ) -> impl Future<Output = Result<Option<FlightDetails>>> + Send;
}

/// Details served from a fixed table, with an optional artificial latency.
#[derive(Debug, Clone, Default)]
pub struct StaticDetailsProvider {
    details: HashMap<String, FlightDetails>,
    delay: Duration,
}

impl StaticDetailsProvider {
    /// Creates a provider serving the given records, keyed by lowercase `icao24`.
    #[must_use]
    pub fn new(details: impl IntoIterator<Item = FlightDetails>) -> Self {
        Self {
            details: details
                .into_iter()
                .map(|d| (d.icao24.to_lowercase(), d))
                .collect(),
            delay: Duration::ZERO,
        }
    }

    /// Demo routes for two test aircraft.
    #[must_use]
    pub fn sample() -> Self {
        let sfo = Airport {
            code: "KSFO".to_string(),
            name: "San Francisco Intl".to_string(),
            lat: 37.6213,
            lon: -122.3790,
        };
        let den = Airport {
            code: "KDEN".to_string(),
            name: "Denver Intl".to_string(),
            lat: 39.8561,
            lon: -104.6737,
        };
        let lax = Airport {
            code: "KLAX".to_string(),
            name: "Los Angeles Intl".to_string(),
            lat: 33.9416,
            lon: -118.4085,
        };
        let sea = Airport {
            code: "KSEA".to_string(),
            name: "Seattle Tacoma Intl".to_string(),
            lat: 47.4502,
            lon: -122.3088,
        };

        let point = |lat, lon| LatLng { lat, lon };

        Self::new([
            FlightDetails {
                icao24: "abc123".to_string(),
                callsign: Some("TEST123".to_string()),
                path: vec![sfo.position(), point(38.5, -121.5), point(39.1, -120.8)],
                origin: Some(sfo),
                destination: Some(den),
            },
            FlightDetails {
                icao24: "def456".to_string(),
                callsign: Some("TEST456".to_string()),
                path: vec![
                    lax.position(),
                    point(36.5, -120.0),
                    point(39.2, -121.0),
                    point(42.0, -122.0),
                    sea.position(),
                ],
                origin: Some(lax),
                destination: Some(sea),
            },
        ])
    }

    /// Delay every lookup, to exercise loading states.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

impl FlightDetailsProvider for StaticDetailsProvider {
    async fn get_flight_details(&self, icao24: &str) -> Result<Option<FlightDetails>> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        Ok(self.details.get(&icao24.to_lowercase()).cloned())
    }
}

/// Airport coordinates keyed by IATA or ICAO code.
#[derive(Debug, Clone, Default)]
pub struct AirportIndex {
    airports: HashMap<String, LatLng>,
}

impl AirportIndex {
    /// Parse a `{ "CODE": { "lat": .., "lon": .. } }` table.
    pub fn from_json(raw: &str) -> Result<Self> {
        let airports: HashMap<String, LatLng> = serde_json::from_str(raw)
            .map_err(|e| Error::Configuration(format!("invalid airport table: {e}")))?;
        Ok(Self { airports })
    }

    pub fn insert(&mut self, code: impl Into<String>, position: LatLng) {
        self.airports.insert(code.into(), position);
    }

    #[must_use]
    pub fn get(&self, code: &str) -> Option<LatLng> {
        self.airports.get(code).copied()
    }

    /// Resolve an airport, trying the IATA code first and then the ICAO code.
    #[must_use]
    pub fn lookup(&self, iata: Option<&str>, icao: Option<&str>) -> Option<(String, LatLng)> {
        [iata, icao]
            .into_iter()
            .flatten()
            .find_map(|code| self.get(code).map(|pos| (code.to_string(), pos)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.airports.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }
}

/// Derive route details from the codes a provider attached to a flight.
///
/// The path runs origin → current position → destination, skipping whatever
/// is unknown.
#[must_use]
pub fn route_from_state(flight: &FlightState, airports: &AirportIndex) -> FlightDetails {
    let resolve = |iata: &Option<String>, icao: &Option<String>| {
        airports
            .lookup(iata.as_deref(), icao.as_deref())
            .map(|(code, pos)| Airport {
                name: code.clone(),
                code,
                lat: pos.lat,
                lon: pos.lon,
            })
    };

    let origin = resolve(&flight.origin_iata, &flight.origin_icao);
    let destination = resolve(&flight.destination_iata, &flight.destination_icao);

    let current = flight
        .position()
        .map(|(lat, lon)| LatLng { lat, lon });
    let path = origin
        .as_ref()
        .map(Airport::position)
        .into_iter()
        .chain(current)
        .chain(destination.as_ref().map(Airport::position))
        .collect();

    FlightDetails {
        icao24: flight.icao24.clone(),
        callsign: flight.callsign.clone(),
        origin,
        destination,
        path,
    }
}
