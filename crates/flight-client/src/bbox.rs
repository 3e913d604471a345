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

//! Geographic bounding boxes that may wrap across the antimeridian.
//!
//! A [`BoundingBox`] is built fresh from the screen-projected bounds of every
//! viewport change. Longitudes are stored in canonical form, so a viewport
//! that crosses ±180° ends up with `min_lon > max_lon` and
//! [`BoundingBox::wraps_dateline`] set.

use serde::Serialize;

use crate::error::{Error, Result};

/// Mean Earth radius used for great-circle math.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Calculate the great-circle distance between two points using the haversine formula (in km).
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Wrap any longitude into the canonical `-180..180` range.
///
/// Map libraries report bounds past ±180 once the user pans across world
/// copies; this collapses them back onto a single copy.
#[must_use]
pub fn normalize_longitude(lon: f64) -> f64 {
    ((lon % 360.0 + 540.0) % 360.0) - 180.0
}

/// Raw viewport edges as reported by a map widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RawBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

/// Rectangular region of interest, possibly wrapping the dateline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingBox {
    min_lat: f64,
    max_lat: f64,
    min_lon: f64,
    max_lon: f64,
    wraps_dateline: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    view_center_longitude: Option<f64>,
}

impl BoundingBox {
    /// Build a box from canonical edges.
    ///
    /// `min_lon > max_lon` is accepted and marks the box as wrapping the
    /// dateline. Fails when `min_lat > max_lat` or any edge is not finite.
    pub fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Result<Self> {
        if ![min_lat, min_lon, max_lat, max_lon].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidBounds(
                "bounds must be finite numbers".to_string(),
            ));
        }
        if min_lat > max_lat {
            return Err(Error::InvalidBounds(format!(
                "south edge {min_lat} is north of north edge {max_lat}"
            )));
        }

        Ok(Self {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
            wraps_dateline: min_lon > max_lon,
            view_center_longitude: None,
        })
    }

    /// Normalize raw map bounds into a bounding box.
    ///
    /// Longitude ordering is not required: after normalization a western edge
    /// east of the eastern edge yields a wrapping box. A raw span of a full
    /// turn or more covers the whole world.
    pub fn from_raw_bounds(raw: RawBounds) -> Result<Self> {
        let RawBounds {
            south,
            west,
            north,
            east,
        } = raw;

        if ![south, west, north, east].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidBounds(
                "bounds must be finite numbers".to_string(),
            ));
        }

        if east - west >= 360.0 {
            return Self::new(south, -180.0, north, 180.0);
        }

        Self::new(
            south,
            normalize_longitude(west),
            north,
            normalize_longitude(east),
        )
    }

    /// Attach the raw longitude of the visible map center.
    #[must_use]
    pub fn with_view_center(mut self, longitude: f64) -> Self {
        self.view_center_longitude = Some(longitude);
        self
    }

    #[must_use]
    pub fn min_lat(&self) -> f64 {
        self.min_lat
    }

    #[must_use]
    pub fn max_lat(&self) -> f64 {
        self.max_lat
    }

    #[must_use]
    pub fn min_lon(&self) -> f64 {
        self.min_lon
    }

    #[must_use]
    pub fn max_lon(&self) -> f64 {
        self.max_lon
    }

    #[must_use]
    pub fn wraps_dateline(&self) -> bool {
        self.wraps_dateline
    }

    #[must_use]
    pub fn view_center_longitude(&self) -> Option<f64> {
        self.view_center_longitude
    }

    /// Eastern edge expressed east of the western edge (may exceed 180).
    fn unwrapped_max_lon(&self) -> f64 {
        if self.wraps_dateline {
            self.max_lon + 360.0
        } else {
            self.max_lon
        }
    }

    /// Width of the box in degrees of longitude.
    #[must_use]
    pub fn lon_span(&self) -> f64 {
        self.unwrapped_max_lon() - self.min_lon
    }

    #[must_use]
    pub fn center_latitude(&self) -> f64 {
        (self.min_lat + self.max_lat) / 2.0
    }

    /// Center longitude, taken in unwrapped space and folded back into range.
    #[must_use]
    pub fn center_longitude(&self) -> f64 {
        normalize_longitude((self.min_lon + self.unwrapped_max_lon()) / 2.0)
    }

    /// Largest great-circle distance from the center to any corner (in km).
    ///
    /// Eastern corners are measured in both their stored and unwrapped form
    /// and the larger distance wins.
    #[must_use]
    pub fn max_corner_distance_km(&self) -> f64 {
        let center_lat = self.center_latitude();
        let center_lon = self.center_longitude();

        let mut max_distance = 0.0_f64;
        for lat in [self.min_lat, self.max_lat] {
            for lon in [self.min_lon, self.max_lon, self.unwrapped_max_lon()] {
                max_distance = max_distance.max(haversine_km(center_lat, center_lon, lat, lon));
            }
        }
        max_distance
    }

    /// Check whether a point lies inside the box (edges included).
    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        if lat < self.min_lat || lat > self.max_lat {
            return false;
        }
        if self.wraps_dateline {
            lon >= self.min_lon || lon <= self.max_lon
        } else {
            lon >= self.min_lon && lon <= self.max_lon
        }
    }

    /// Shift a longitude onto the world copy nearest the view center.
    ///
    /// Without a view center the longitude is returned unchanged.
    #[must_use]
    pub fn project_longitude(&self, lon: f64) -> f64 {
        match self.view_center_longitude {
            Some(center) => lon + 360.0 * ((center - lon) / 360.0).round(),
            None => lon,
        }
    }
}
