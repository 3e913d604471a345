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

//! Per-client result cache with soft rate limiting.

use std::time::Duration;

use log::debug;
use tokio::time::Instant;

use crate::bbox::BoundingBox;
use crate::flight::FlightState;

/// Timing policy shared by every provider client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    /// How long an identical query is answered from the cache.
    pub cache_window: Duration,
    /// Minimum gap between two network fetches, whatever the query.
    pub min_refetch_interval: Duration,
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self {
            cache_window: Duration::from_secs(10),
            min_refetch_interval: Duration::from_secs(5),
        }
    }
}

/// Equality key for a query. The view center never changes what is fetched,
/// so it is left out.
#[derive(Debug, Clone, Copy, PartialEq)]
struct CacheKey {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
    wraps_dateline: bool,
}

impl From<&BoundingBox> for CacheKey {
    fn from(bbox: &BoundingBox) -> Self {
        Self {
            min_lat: bbox.min_lat(),
            max_lat: bbox.max_lat(),
            min_lon: bbox.min_lon(),
            max_lon: bbox.max_lon(),
            wraps_dateline: bbox.wraps_dateline(),
        }
    }
}

#[derive(Debug)]
struct CacheEntry {
    key: CacheKey,
    fetched_at: Instant,
    flights: Vec<FlightState>,
}

/// Last query, its result, and when it went to the network.
#[derive(Debug)]
pub(crate) struct FetchCache {
    policy: CachePolicy,
    last: Option<CacheEntry>,
}

impl FetchCache {
    pub(crate) fn new(policy: CachePolicy) -> Self {
        Self { policy, last: None }
    }

    /// Answer a query without the network, if the policy allows it.
    ///
    /// An identical box inside the cache window gets the cached result. Any
    /// box inside the refetch interval gets the stale result.
    pub(crate) fn lookup(&self, bbox: &BoundingBox) -> Option<Vec<FlightState>> {
        let entry = self.last.as_ref()?;
        let age = entry.fetched_at.elapsed();

        if entry.key == CacheKey::from(bbox) && age < self.policy.cache_window {
            debug!("Cache hit ({} flights, age {:?})", entry.flights.len(), age);
            return Some(entry.flights.clone());
        }

        if age < self.policy.min_refetch_interval {
            debug!(
                "Refetch suppressed, last fetch {:?} ago; serving {} cached flights",
                age,
                entry.flights.len()
            );
            return Some(entry.flights.clone());
        }

        None
    }

    /// Record a completed network fetch that started at `fetched_at`.
    pub(crate) fn store(&mut self, bbox: &BoundingBox, fetched_at: Instant, flights: Vec<FlightState>) {
        self.last = Some(CacheEntry {
            key: CacheKey::from(bbox),
            fetched_at,
            flights,
        });
    }
}
