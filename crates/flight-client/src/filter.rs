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

//! Viewport filtering of flight lists.

use crate::bbox::BoundingBox;
use crate::flight::FlightState;

/// Keep the flights whose position falls inside the box.
///
/// Flights without a latitude or longitude never match. Edges are inclusive,
/// and a wrapping box matches longitudes on either side of the dateline.
#[must_use]
pub fn filter_by_bbox(flights: &[FlightState], bbox: &BoundingBox) -> Vec<FlightState> {
    flights
        .iter()
        .filter(|flight| {
            flight
                .position()
                .is_some_and(|(lat, lon)| bbox.contains(lat, lon))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flight(icao: &str, lat: Option<f64>, lon: Option<f64>) -> FlightState {
        FlightState {
            latitude: lat,
            longitude: lon,
            ..FlightState::new(icao)
        }
    }

    #[test]
    fn test_edge_values_are_included() {
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0).unwrap();
        let flights = vec![flight("abc123", Some(10.0), Some(40.0))];
        assert_eq!(filter_by_bbox(&flights, &bbox).len(), 1);
    }

    #[test]
    fn test_missing_coordinates_are_excluded() {
        let bbox = BoundingBox::new(-90.0, -180.0, 90.0, 180.0).unwrap();
        let flights = vec![
            flight("aaa111", None, Some(22.0)),
            flight("bbb222", Some(22.0), None),
            flight("ccc333", None, None),
        ];
        assert!(filter_by_bbox(&flights, &bbox).is_empty());
    }

    #[test]
    fn test_outside_box_is_excluded() {
        let bbox = BoundingBox::new(10.0, 20.0, 30.0, 40.0).unwrap();
        let flights = vec![
            flight("inside", Some(20.0), Some(30.0)),
            flight("north", Some(31.0), Some(30.0)),
            flight("east", Some(20.0), Some(41.0)),
        ];
        let visible = filter_by_bbox(&flights, &bbox);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].icao24, "inside");
    }

    #[test]
    fn test_dateline_wrap() {
        let bbox = BoundingBox::new(30.0, 170.0, 50.0, -170.0).unwrap();
        assert!(bbox.wraps_dateline());

        let flights = vec![
            flight("east", Some(40.0), Some(175.0)),
            flight("west", Some(40.0), Some(-175.0)),
            flight("greenwich", Some(40.0), Some(0.0)),
        ];
        let visible = filter_by_bbox(&flights, &bbox);
        let ids: Vec<_> = visible.iter().map(|f| f.icao24.as_str()).collect();
        assert_eq!(ids, vec!["east", "west"]);
    }
}
