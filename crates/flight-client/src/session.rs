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

//! Viewport session state.
//!
//! Tracks which viewport request is current, drops results that arrive for
//! superseded requests, and keeps the last good flight list when a fetch
//! fails.

use log::{debug, warn};

use crate::bbox::BoundingBox;
use crate::error::Error;
use crate::filter::filter_by_bbox;
use crate::flight::FlightState;

/// Identifies one viewport request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestTicket(u64);

/// What happened to a finished request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// Result applied; the flight list was replaced.
    Applied,
    /// Request failed; the previous flight list was kept.
    Failed,
    /// A newer request started meanwhile; the result was discarded.
    Superseded,
}

/// Flight state for one map view.
#[derive(Debug, Default)]
pub struct ViewportSession {
    generation: u64,
    bbox: Option<BoundingBox>,
    flights: Vec<FlightState>,
    last_error: Option<String>,
    loading: bool,
}

impl ViewportSession {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request for a new viewport. Any request still in flight
    /// becomes stale.
    pub fn begin(&mut self, bbox: BoundingBox) -> RequestTicket {
        self.generation += 1;
        self.bbox = Some(bbox);
        self.loading = true;
        RequestTicket(self.generation)
    }

    /// Check whether `ticket` belongs to the latest request.
    #[must_use]
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        ticket.0 == self.generation
    }

    /// Apply the result of a request.
    pub fn finish(
        &mut self,
        ticket: RequestTicket,
        result: Result<Vec<FlightState>, Error>,
    ) -> RequestOutcome {
        if !self.is_current(ticket) {
            debug!("Dropping result for superseded request {}", ticket.0);
            return RequestOutcome::Superseded;
        }

        self.loading = false;
        match result {
            Ok(flights) => {
                self.flights = flights;
                self.last_error = None;
                RequestOutcome::Applied
            }
            Err(e) => {
                warn!("Flight request failed, keeping last known flights: {e}");
                self.last_error = Some(e.to_string());
                RequestOutcome::Failed
            }
        }
    }

    #[must_use]
    pub fn bbox(&self) -> Option<&BoundingBox> {
        self.bbox.as_ref()
    }

    /// Every flight from the last successful request.
    #[must_use]
    pub fn flights(&self) -> &[FlightState] {
        &self.flights
    }

    /// Flights inside the current viewport.
    #[must_use]
    pub fn visible_flights(&self) -> Vec<FlightState> {
        self.bbox
            .as_ref()
            .map(|bbox| filter_by_bbox(&self.flights, bbox))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bbox() -> BoundingBox {
        BoundingBox::new(30.0, 170.0, 50.0, -170.0).unwrap()
    }

    fn flight(icao: &str, lat: f64, lon: f64) -> FlightState {
        FlightState {
            latitude: Some(lat),
            longitude: Some(lon),
            ..FlightState::new(icao)
        }
    }

    #[test]
    fn test_applies_current_result() {
        let mut session = ViewportSession::new();
        let ticket = session.begin(bbox());
        assert!(session.is_loading());

        let outcome = session.finish(ticket, Ok(vec![flight("abc123", 40.0, 175.0)]));

        assert_eq!(outcome, RequestOutcome::Applied);
        assert!(!session.is_loading());
        assert_eq!(session.flights().len(), 1);
    }

    #[test]
    fn test_superseded_result_is_dropped() {
        let mut session = ViewportSession::new();
        let stale = session.begin(bbox());
        let current = session.begin(bbox());

        let outcome = session.finish(stale, Ok(vec![flight("abc123", 40.0, 175.0)]));
        assert_eq!(outcome, RequestOutcome::Superseded);
        assert!(session.flights().is_empty());
        assert!(session.is_loading());

        session.finish(current, Ok(vec![flight("def456", 40.0, -175.0)]));
        assert_eq!(session.flights()[0].icao24, "def456");
    }

    #[test]
    fn test_failure_keeps_last_known_flights() {
        let mut session = ViewportSession::new();
        let first = session.begin(bbox());
        session.finish(first, Ok(vec![flight("abc123", 40.0, 175.0)]));

        let second = session.begin(bbox());
        let outcome = session.finish(
            second,
            Err(Error::UpstreamRequest {
                provider: "OpenSky",
                status: Some(503),
                message: "HTTP 503".to_string(),
            }),
        );

        assert_eq!(outcome, RequestOutcome::Failed);
        assert_eq!(session.flights().len(), 1);
        assert!(session.last_error().unwrap().contains("HTTP 503"));
    }

    #[test]
    fn test_visible_flights_are_filtered() {
        let mut session = ViewportSession::new();
        let ticket = session.begin(bbox());
        session.finish(
            ticket,
            Ok(vec![flight("near", 40.0, 175.0), flight("far", 40.0, 0.0)]),
        );

        let visible = session.visible_flights();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].icao24, "near");
    }
}
