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

//! Canonical flight schema shared by every provider.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Per-aircraft state in the canonical schema.
///
/// Every provider maps its upstream payload into this record. Only `icao24`
/// is guaranteed; everything else depends on what the feed reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightState {
    /// ICAO 24-bit address, lowercase hex.
    pub icao24: String,
    /// Trimmed callsign.
    pub callsign: Option<String>,
    /// Latitude in degrees.
    pub latitude: Option<f64>,
    /// Longitude in degrees.
    pub longitude: Option<f64>,
    /// Altitude as reported by the provider.
    pub altitude: Option<f64>,
    /// Ground speed as reported by the provider.
    pub velocity: Option<f64>,
    /// True track in degrees (0-360, north = 0).
    pub heading: Option<f64>,
    pub vertical_speed: Option<f64>,
    pub on_ground: Option<bool>,
    pub status: Option<String>,
    pub squawk: Option<String>,
    /// Last update, epoch seconds.
    pub updated: Option<i64>,
    pub airline_iata: Option<String>,
    pub airline_icao: Option<String>,
    pub flight_iata: Option<String>,
    pub flight_icao: Option<String>,
    pub aircraft_iata: Option<String>,
    pub aircraft_icao: Option<String>,
    pub aircraft_reg: Option<String>,
    pub origin_iata: Option<String>,
    pub origin_icao: Option<String>,
    pub destination_iata: Option<String>,
    pub destination_icao: Option<String>,
}

impl FlightState {
    /// Create a bare record for the given address.
    #[must_use]
    pub fn new(icao24: impl Into<String>) -> Self {
        Self {
            icao24: icao24.into(),
            ..Self::default()
        }
    }

    /// Position as `(lat, lon)` when both coordinates are known.
    #[must_use]
    pub fn position(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lon)) => Some((lat, lon)),
            _ => None,
        }
    }

    /// Label shown next to a marker: callsign, falling back to the address.
    #[must_use]
    pub fn label(&self) -> &str {
        self.callsign.as_deref().unwrap_or(&self.icao24)
    }
}

/// Normalize an ICAO address: trimmed, lowercase, `None` when empty.
pub(crate) fn normalize_icao24(raw: &str) -> Option<String> {
    let icao = raw.trim().to_lowercase();
    if icao.is_empty() {
        None
    } else {
        Some(icao)
    }
}

/// Trim a callsign, treating blank values as absent.
pub(crate) fn normalize_callsign(raw: &str) -> Option<String> {
    let callsign = raw.trim();
    if callsign.is_empty() {
        None
    } else {
        Some(callsign.to_string())
    }
}

/// Collapse records sharing an `icao24`.
///
/// The last occurrence wins; it takes the slot of the first occurrence so the
/// output order stays stable.
#[must_use]
pub fn dedupe_by_icao(flights: Vec<FlightState>) -> Vec<FlightState> {
    let mut index: HashMap<String, usize> = HashMap::with_capacity(flights.len());
    let mut unique: Vec<FlightState> = Vec::with_capacity(flights.len());

    for flight in flights {
        if let Some(&slot) = index.get(&flight.icao24) {
            unique[slot] = flight;
        } else {
            index.insert(flight.icao24.clone(), unique.len());
            unique.push(flight);
        }
    }

    unique
}
