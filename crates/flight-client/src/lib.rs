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

//! Flight data client library for viewport-driven aircraft maps.
//!
//! The library turns a map viewport into a [`BoundingBox`], asks a flight
//! data provider for the aircraft inside it and filters the result back down
//! to what is visible. It has several layers that can be used independently:
//!
//! - **Geometry**: [`BoundingBox`] with longitude normalization and
//!   antimeridian (dateline) handling, plus [`filter_by_bbox`]
//! - **Providers**: a bulk state-vector client and a radius-search client,
//!   each with a short-lived cache, a minimum refetch interval and
//!   deduplication, behind the [`FlightProvider`] facade
//! - **Session**: [`ViewportSession`] discards results for superseded
//!   viewports and keeps the last good list when a fetch fails
//! - **Details**: route information for a selected aircraft
//!
//! # Quick Start
//!
//! ```no_run
//! use std::time::Duration;
//! use flight_client::{BoundingBox, CachePolicy, FlightProvider, ProviderConfig, ReqwestClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let http = ReqwestClient::new(Duration::from_secs(10))?;
//!     let provider = FlightProvider::from_config(&ProviderConfig::opensky(), http, CachePolicy::default())?;
//!
//!     // A box over the Pacific that crosses the antimeridian
//!     let bbox = BoundingBox::new(-10.0, 170.0, 10.0, -170.0)?;
//!     for flight in provider.get_states(&bbox).await? {
//!         println!("{}: {:?}", flight.icao24, flight.position());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Geometry Only
//!
//! ```
//! use flight_client::{filter_by_bbox, BoundingBox, FlightState, RawBounds};
//!
//! // Viewport edges as reported by a map that has been panned past 180°
//! let bbox = BoundingBox::from_raw_bounds(RawBounds {
//!     south: -10.0,
//!     west: 170.0,
//!     north: 10.0,
//!     east: 190.0,
//! })
//! .unwrap();
//! assert!(bbox.wraps_dateline());
//!
//! let flight = FlightState {
//!     latitude: Some(0.0),
//!     longitude: Some(-175.0),
//!     ..FlightState::new("abc123")
//! };
//! assert_eq!(filter_by_bbox(&[flight], &bbox).len(), 1);
//! ```

pub mod bbox;
pub mod details;
pub mod error;
pub mod filter;
pub mod flight;
pub mod http;
pub mod provider;
pub mod session;

#[cfg(test)]
mod testing;

pub use bbox::{haversine_km, normalize_longitude, BoundingBox, RawBounds};
pub use details::{
    route_from_state, Airport, AirportIndex, FlightDetails, FlightDetailsProvider, LatLng,
    StaticDetailsProvider,
};
pub use error::{Error, Result};
pub use filter::filter_by_bbox;
pub use flight::{dedupe_by_icao, FlightState};
pub use http::{HttpClient, HttpResponse, ReqwestClient, TransportError};
pub use provider::{
    load_runtime_provider, CachePolicy, FlightProvider, ProviderConfig, ProviderKind,
    ProviderParams, RadiusSearchClient, RuntimeProviderSelection, StateVectorClient,
};
pub use session::{RequestOutcome, RequestTicket, ViewportSession};
