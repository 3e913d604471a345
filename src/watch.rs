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

//! Terminal flight watcher.
//!
//! Polls the selected provider for one fixed viewport and logs the flights
//! inside it until cancelled.

use std::time::Duration;

use flight_client::{BoundingBox, FlightProvider, FlightState, HttpClient, RequestOutcome, ViewportSession};
use log::{debug, info, warn};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Poll `provider` every `interval` until `cancel` fires.
///
/// Returns the session so callers can inspect the last state.
pub async fn run<C: HttpClient>(
    provider: &FlightProvider<C>,
    bbox: BoundingBox,
    interval: Duration,
    cancel: CancellationToken,
) -> ViewportSession {
    info!(
        "Watching {} flights in lat {}..{} lon {}..{}{}",
        provider.name(),
        bbox.min_lat(),
        bbox.max_lat(),
        bbox.min_lon(),
        bbox.max_lon(),
        if bbox.wraps_dateline() { " (across the dateline)" } else { "" }
    );

    let mut session = ViewportSession::new();
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let ticket = session.begin(bbox);
        let result = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            result = provider.get_states(&bbox) => result,
        };

        match session.finish(ticket, result) {
            RequestOutcome::Applied => report(&session.visible_flights(), provider.attribution()),
            RequestOutcome::Failed => {
                warn!(
                    "Showing {} flights from the last successful update",
                    session.flights().len()
                );
            }
            RequestOutcome::Superseded => {}
        }
    }

    info!("Flight watch stopped");
    session
}

fn report(flights: &[FlightState], attribution: &str) {
    info!("{} flights in view ({attribution})", flights.len());
    for flight in flights {
        let Some((lat, lon)) = flight.position() else {
            continue;
        };
        debug!(
            "  {:<8} {:>9.4} {:>10.4} alt={:?} hdg={:?}",
            flight.label(),
            lat,
            lon,
            flight.altitude,
            flight.heading
        );
    }
}
