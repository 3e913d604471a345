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

//! Key-hiding proxy for the Aviation Edge flights feed.
//!
//! Browsers and the radius-search client call this server instead of the
//! upstream API. The credential is appended here and never appears in a
//! response body or a log line.

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use flight_client::{Error, HttpClient, HttpResponse};
use log::{debug, error, warn};
use reqwest::Url;
use serde::Deserialize;

/// Route served by the proxy.
pub const FLIGHTS_ROUTE: &str = "/api/proxy/aviation-edge/flights";

/// Largest search radius the proxy forwards, in km.
const MAX_DISTANCE_KM: f64 = 500.0;

const INVALID_QUERY: &str = "Invalid query string";
const MISSING_PARAMS: &str = "Missing required parameters: lat, lng, distance";
const INVALID_LAT: &str = "Invalid lat: must be between -90 and 90";
const INVALID_LNG: &str = "Invalid lng: must be between -180 and 180";
const INVALID_DISTANCE: &str = "Invalid distance: must be greater than 0 and at most 500";
const CONFIGURATION_ERROR: &str = "Server configuration error";
const UPSTREAM_ERROR: &str = "Aviation Edge API error";
const FETCH_FAILED: &str = "Failed to fetch flight data";
const INVALID_UPSTREAM: &str = "Invalid response from Aviation Edge";

/// Shared state for the proxy handlers.
#[derive(Debug)]
pub struct ProxyState<C: HttpClient> {
    http: C,
    upstream: Url,
    api_key: Option<String>,
}

impl<C: HttpClient> ProxyState<C> {
    /// Creates the proxy state. A missing key is not an error here: the
    /// server still starts and answers every request with a 500.
    pub fn new(http: C, upstream: &str, api_key: Option<String>) -> flight_client::Result<Self> {
        let upstream = Url::parse(upstream)
            .map_err(|e| Error::Configuration(format!("invalid upstream URL: {e}")))?;
        Ok(Self {
            http,
            upstream,
            api_key: api_key.filter(|key| !key.is_empty()),
        })
    }
}

/// Query accepted by the flights route. Everything arrives as text so that
/// bad numbers get the documented error instead of an extractor rejection.
#[derive(Debug, Default, Deserialize)]
pub struct FlightsQuery {
    lat: Option<String>,
    lng: Option<String>,
    distance: Option<String>,
    limit: Option<String>,
}

/// A validated search.
#[derive(Debug, Clone, PartialEq)]
struct SearchParams {
    lat: f64,
    lng: f64,
    distance: f64,
    limit: Option<u32>,
}

impl FlightsQuery {
    fn validate(&self) -> Result<SearchParams, &'static str> {
        let (Some(lat), Some(lng), Some(distance)) = (
            non_empty(self.lat.as_deref()),
            non_empty(self.lng.as_deref()),
            non_empty(self.distance.as_deref()),
        ) else {
            return Err(MISSING_PARAMS);
        };

        let lat = parse_finite(lat)
            .filter(|v| (-90.0..=90.0).contains(v))
            .ok_or(INVALID_LAT)?;
        let lng = parse_finite(lng)
            .filter(|v| (-180.0..=180.0).contains(v))
            .ok_or(INVALID_LNG)?;
        let distance = parse_finite(distance)
            .filter(|v| *v > 0.0 && *v <= MAX_DISTANCE_KM)
            .ok_or(INVALID_DISTANCE)?;

        // Anything other than a positive integer is dropped, not rejected.
        let limit = self
            .limit
            .as_deref()
            .and_then(|raw| raw.trim().parse::<u32>().ok())
            .filter(|limit| *limit > 0);

        Ok(SearchParams {
            lat,
            lng,
            distance,
            limit,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_finite(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Build the proxy router.
pub fn router<C: HttpClient + 'static>(state: ProxyState<C>) -> Router {
    Router::new()
        .route(FLIGHTS_ROUTE, get(flights::<C>))
        .with_state(Arc::new(state))
}

async fn flights<C: HttpClient + 'static>(
    State(state): State<Arc<ProxyState<C>>>,
    query: Result<Query<FlightsQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => {
            debug!("Rejecting flight query: {rejection}");
            return error_response(StatusCode::BAD_REQUEST, INVALID_QUERY);
        }
    };
    let params = match query.validate() {
        Ok(params) => params,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let Some(api_key) = state.api_key.as_deref() else {
        error!("Aviation Edge credential is not configured; rejecting flight request");
        return error_response(StatusCode::INTERNAL_SERVER_ERROR, CONFIGURATION_ERROR);
    };

    debug!(
        "Proxying flight search lat={} lng={} distance={} limit={:?}",
        params.lat, params.lng, params.distance, params.limit
    );

    let url = upstream_url(&state.upstream, api_key, &params);
    match state.http.get(url.as_str()).await {
        Ok(response) => relay(response),
        Err(e) => {
            warn!("Aviation Edge request failed: {e}");
            error_response(StatusCode::BAD_GATEWAY, FETCH_FAILED)
        }
    }
}

/// Upstream URL with the credential attached. Never log the result.
fn upstream_url(base: &Url, api_key: &str, params: &SearchParams) -> Url {
    let mut url = base.clone();
    {
        let mut query = url.query_pairs_mut();
        query
            .append_pair("key", api_key)
            .append_pair("lat", &params.lat.to_string())
            .append_pair("lng", &params.lng.to_string())
            .append_pair("distance", &params.distance.to_string());
        if let Some(limit) = params.limit {
            query.append_pair("limit", &limit.to_string());
        }
    }
    url
}

fn relay(response: HttpResponse) -> Response {
    let Ok(status) = StatusCode::from_u16(response.status) else {
        warn!("Aviation Edge returned an unusable status {}", response.status);
        return error_response(StatusCode::BAD_GATEWAY, FETCH_FAILED);
    };

    if !status.is_success() {
        warn!("Aviation Edge returned HTTP {}", status.as_u16());
        return error_response(status, UPSTREAM_ERROR);
    }

    if !response.is_json() {
        warn!(
            "Aviation Edge returned non-JSON content ({})",
            response.content_type.as_deref().unwrap_or("no content type")
        );
        return error_response(StatusCode::BAD_GATEWAY, INVALID_UPSTREAM);
    }

    (
        status,
        [(header::CONTENT_TYPE, "application/json")],
        response.body,
    )
        .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use flight_client::TransportError;
    use tower::ServiceExt;

    use super::*;
    use crate::testing::MockUpstream;

    const SECRET: &str = "s3cr3t-credential";
    const UPSTREAM: &str = "https://aviation-edge.test/v2/public/flights";

    async fn call(upstream: Arc<MockUpstream>, api_key: Option<&str>, query: &str) -> (StatusCode, String) {
        let state = ProxyState::new(upstream, UPSTREAM, api_key.map(str::to_string)).unwrap();
        let request = Request::builder()
            .uri(format!("{FLIGHTS_ROUTE}?{query}"))
            .body(Body::empty())
            .unwrap();

        let response = router(state).oneshot(request).await.unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn error_message(body: &str) -> String {
        let value: serde_json::Value = serde_json::from_str(body).unwrap();
        value["error"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_missing_parameters() {
        let upstream = Arc::new(MockUpstream::default());
        for query in ["lat=40&lng=-74", "lat=40&distance=100", "lat=&lng=-74&distance=100", ""] {
            let (status, body) = call(upstream.clone(), Some(SECRET), query).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert_eq!(error_message(&body), MISSING_PARAMS);
        }
        assert!(upstream.requests().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_query_gets_json_error() {
        let upstream = Arc::new(MockUpstream::default());
        let (status, body) = call(upstream.clone(), Some(SECRET), "lat=40&lat=41&lng=-74&distance=100").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error_message(&body), INVALID_QUERY);
        assert!(upstream.requests().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_lat() {
        let upstream = Arc::new(MockUpstream::default());
        for query in ["lat=91&lng=-74&distance=100", "lat=abc&lng=-74&distance=100", "lat=NaN&lng=0&distance=1"] {
            let (status, body) = call(upstream.clone(), Some(SECRET), query).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(error_message(&body).contains("Invalid lat"));
        }
    }

    #[tokio::test]
    async fn test_invalid_lng() {
        let (status, body) = call(Arc::new(MockUpstream::default()), Some(SECRET), "lat=40&lng=-181&distance=100").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(error_message(&body).contains("Invalid lng"));
    }

    #[tokio::test]
    async fn test_invalid_distance() {
        let upstream = Arc::new(MockUpstream::default());
        for query in ["lat=40&lng=-74&distance=0", "lat=40&lng=-74&distance=-5", "lat=40&lng=-74&distance=501", "lat=40&lng=-74&distance=inf"] {
            let (status, body) = call(upstream.clone(), Some(SECRET), query).await;
            assert_eq!(status, StatusCode::BAD_REQUEST);
            assert!(error_message(&body).contains("Invalid distance"));
        }
    }

    #[tokio::test]
    async fn test_boundary_values_are_accepted() {
        let upstream = Arc::new(MockUpstream::default().json(200, "[]"));
        let (status, _) = call(upstream, Some(SECRET), "lat=-90&lng=180&distance=500").await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_missing_credential() {
        let upstream = Arc::new(MockUpstream::default());
        let (status, body) = call(upstream.clone(), None, "lat=40&lng=-74&distance=100").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error_message(&body), CONFIGURATION_ERROR);
        let lower = body.to_lowercase();
        assert!(!lower.contains("key"));
        assert!(!lower.contains("api"));
        assert!(upstream.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_credential_counts_as_missing() {
        let (status, _) = call(Arc::new(MockUpstream::default()), Some(""), "lat=40&lng=-74&distance=100").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_success_relays_body_and_adds_credential() {
        let payload = r#"[{"aircraft":{"icao24":"ABC123"},"geography":{"latitude":40.1,"longitude":-74.2}}]"#;
        let upstream = Arc::new(MockUpstream::default().json(200, payload));

        let (status, body) = call(upstream.clone(), Some(SECRET), "lat=40&lng=-74&distance=100&limit=50").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, payload);

        let requests = upstream.requests();
        let url = Url::parse(&requests[0]).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("key".to_string(), SECRET.to_string())));
        assert!(pairs.contains(&("lat".to_string(), "40".to_string())));
        assert!(pairs.contains(&("lng".to_string(), "-74".to_string())));
        assert!(pairs.contains(&("distance".to_string(), "100".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "50".to_string())));
    }

    #[tokio::test]
    async fn test_invalid_limit_is_not_forwarded() {
        for limit in ["0", "-3", "ten", "2.5"] {
            let upstream = Arc::new(MockUpstream::default().json(200, "[]"));
            let query = format!("lat=40&lng=-74&distance=100&limit={limit}");
            let (status, _) = call(upstream.clone(), Some(SECRET), &query).await;
            assert_eq!(status, StatusCode::OK);

            let requests = upstream.requests();
            let url = Url::parse(&requests[0]).unwrap();
            assert!(url.query_pairs().all(|(name, _)| name != "limit"));
        }
    }

    #[tokio::test]
    async fn test_upstream_error_status_is_mirrored() {
        let upstream = Arc::new(MockUpstream::default().json(401, &format!(r#"{{"error":"bad key {SECRET}"}}"#)));
        let (status, body) = call(upstream, Some(SECRET), "lat=40&lng=-74&distance=100").await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(error_message(&body), UPSTREAM_ERROR);
        assert!(!body.contains(SECRET));
    }

    #[tokio::test]
    async fn test_transport_failure_hides_message() {
        let upstream = Arc::new(
            MockUpstream::default().respond(Err(TransportError(format!("failed with key {SECRET}")))),
        );
        let (status, body) = call(upstream, Some(SECRET), "lat=40&lng=-74&distance=100").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(error_message(&body), FETCH_FAILED);
        assert!(!body.contains(SECRET));
    }

    #[tokio::test]
    async fn test_non_json_upstream() {
        let upstream = Arc::new(MockUpstream::default().respond(Ok(HttpResponse {
            status: 200,
            content_type: Some("text/html".to_string()),
            body: format!("<html>{SECRET}</html>").into_bytes(),
        })));
        let (status, body) = call(upstream, Some(SECRET), "lat=40&lng=-74&distance=100").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(error_message(&body), INVALID_UPSTREAM);
        assert!(!body.contains(SECRET));
    }
}
