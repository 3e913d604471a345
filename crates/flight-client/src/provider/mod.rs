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

//! Flight data providers.
//!
//! Two upstream families are supported behind one facade:
//!
//! - **State vector** (`"opensky"`): bulk rectangle queries, see [`StateVectorClient`]
//! - **Radius search** (`"aviation-edge"`): center + radius queries, see [`RadiusSearchClient`]
//!
//! [`FlightProvider`] is built from a [`ProviderConfig`] and exposes the same
//! `get_states` contract whichever variant backs it.

pub mod cache;
pub mod radius;
pub mod runtime;
pub mod state_vector;

pub use cache::CachePolicy;
pub use radius::RadiusSearchClient;
pub use runtime::{load_runtime_provider, RuntimeProviderSelection};
pub use state_vector::StateVectorClient;

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::error::{Error, Result};
use crate::flight::FlightState;
use crate::http::HttpClient;

/// Optional provider tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderParams {
    /// Maximum number of flights to request, where supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

/// Provider configuration as stored in the runtime selection file.
///
/// `provider_type` is kept as a string so that an unknown value is reported
/// by [`FlightProvider::from_config`] rather than by the JSON parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub provider_type: String,
    pub base_url: String,
    pub attribution: String,
    #[serde(default)]
    pub params: ProviderParams,
}

impl ProviderConfig {
    /// OpenSky bulk feed. No credential required; used when no selection is available.
    #[must_use]
    pub fn opensky() -> Self {
        Self {
            id: "opensky".to_string(),
            name: "OpenSky".to_string(),
            provider_type: ProviderKind::StateVector.as_str().to_string(),
            base_url: state_vector::DEFAULT_BASE_URL.to_string(),
            attribution: "Data: OpenSky Network".to_string(),
            params: ProviderParams::default(),
        }
    }

    /// Aviation Edge through the proxy at `base_url`.
    #[must_use]
    pub fn aviation_edge(base_url: impl Into<String>) -> Self {
        Self {
            id: "aviation-edge".to_string(),
            name: "Aviation Edge".to_string(),
            provider_type: ProviderKind::RadiusSearch.as_str().to_string(),
            base_url: base_url.into(),
            attribution: "Data: Aviation Edge".to_string(),
            params: ProviderParams { limit: Some(100) },
        }
    }
}

/// Supported provider variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// Bulk rectangle feed.
    StateVector,
    /// Center + radius feed.
    RadiusSearch,
}

impl ProviderKind {
    const STATE_VECTOR: &'static str = "opensky";
    const RADIUS_SEARCH: &'static str = "aviation-edge";

    /// Resolve the `type` field of a provider configuration.
    pub fn from_type(provider_type: &str) -> Result<Self> {
        match provider_type {
            Self::STATE_VECTOR => Ok(Self::StateVector),
            Self::RADIUS_SEARCH => Ok(Self::RadiusSearch),
            other => Err(Error::Configuration(format!(
                "unsupported provider type: {other}"
            ))),
        }
    }

    /// Value used for the `type` field.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::StateVector => Self::STATE_VECTOR,
            Self::RadiusSearch => Self::RADIUS_SEARCH,
        }
    }
}

#[derive(Debug)]
enum ProviderClient<C: HttpClient> {
    StateVector(StateVectorClient<C>),
    RadiusSearch(RadiusSearchClient<C>),
}

/// Provider facade consumed by the map.
#[derive(Debug)]
pub struct FlightProvider<C: HttpClient> {
    id: String,
    name: String,
    attribution: String,
    client: ProviderClient<C>,
}

impl<C: HttpClient> FlightProvider<C> {
    /// Build the client selected by `config`.
    ///
    /// Fails with [`Error::Configuration`] for an unsupported type or an
    /// unusable base URL.
    pub fn from_config(config: &ProviderConfig, http: C, policy: CachePolicy) -> Result<Self> {
        let client = match ProviderKind::from_type(&config.provider_type)? {
            ProviderKind::StateVector => {
                ProviderClient::StateVector(StateVectorClient::new(http, &config.base_url, policy)?)
            }
            ProviderKind::RadiusSearch => ProviderClient::RadiusSearch(RadiusSearchClient::new(
                http,
                &config.base_url,
                config.params.limit,
                policy,
            )?),
        };

        Ok(Self {
            id: config.id.clone(),
            name: config.name.clone(),
            attribution: config.attribution.clone(),
            client,
        })
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn attribution(&self) -> &str {
        &self.attribution
    }

    #[must_use]
    pub fn kind(&self) -> ProviderKind {
        match self.client {
            ProviderClient::StateVector(_) => ProviderKind::StateVector,
            ProviderClient::RadiusSearch(_) => ProviderKind::RadiusSearch,
        }
    }

    /// Fetch the flights for a viewport in the canonical schema.
    pub async fn get_states(&self, bbox: &BoundingBox) -> Result<Vec<FlightState>> {
        match &self.client {
            ProviderClient::StateVector(client) => client.get_states(bbox).await,
            ProviderClient::RadiusSearch(client) => client.get_states(bbox).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::testing::{query_param, MockHttp};

    #[test]
    fn test_unsupported_type_fails_construction() {
        let mut config = ProviderConfig::opensky();
        config.provider_type = "flightradar".to_string();

        let result = FlightProvider::from_config(&config, MockHttp::new(), CachePolicy::default());
        match result {
            Err(Error::Configuration(message)) => assert!(message.contains("flightradar")),
            other => panic!("expected configuration error, got {other:?}"),
        }
    }

    #[test]
    fn test_kind_type_names() {
        for kind in [ProviderKind::StateVector, ProviderKind::RadiusSearch] {
            assert_eq!(ProviderKind::from_type(kind.as_str()).unwrap(), kind);
        }
        assert_eq!(ProviderConfig::opensky().provider_type, "opensky");
        assert_eq!(ProviderConfig::aviation_edge(radius::DEFAULT_BASE_URL).provider_type, "aviation-edge");
    }

    #[test]
    fn test_identity_comes_from_config() {
        let provider =
            FlightProvider::from_config(&ProviderConfig::opensky(), MockHttp::new(), CachePolicy::default())
                .unwrap();
        assert_eq!(provider.id(), "opensky");
        assert_eq!(provider.name(), "OpenSky");
        assert_eq!(provider.attribution(), "Data: OpenSky Network");
        assert_eq!(provider.kind(), ProviderKind::StateVector);
    }

    #[test]
    fn test_config_json_shape() {
        let config: ProviderConfig = serde_json::from_value(json!({
            "id": "aviation-edge",
            "name": "Aviation Edge",
            "type": "aviation-edge",
            "baseUrl": "http://localhost:3001/api/proxy/aviation-edge/flights",
            "attribution": "Data: Aviation Edge",
            "params": { "limit": 25 }
        }))
        .unwrap();

        assert_eq!(config.provider_type, "aviation-edge");
        assert_eq!(config.params.limit, Some(25));
        assert_eq!(ProviderKind::from_type(&config.provider_type).unwrap(), ProviderKind::RadiusSearch);
    }

    #[tokio::test]
    async fn test_radius_provider_dispatch() {
        let http = Arc::new(MockHttp::new());
        http.push_json(200, &json!([{ "aircraft": { "icao24": "abc123" } }]));

        let config = ProviderConfig::aviation_edge(radius::DEFAULT_BASE_URL);
        let provider =
            FlightProvider::from_config(&config, Arc::clone(&http), CachePolicy::default()).unwrap();
        let bbox = BoundingBox::new(37.0, -123.0, 40.0, -120.0).unwrap();
        let flights = provider.get_states(&bbox).await.unwrap();

        assert_eq!(provider.kind(), ProviderKind::RadiusSearch);
        assert_eq!(flights.len(), 1);
        assert_eq!(query_param(&http.requests()[0], "limit").as_deref(), Some("100"));
    }

    #[tokio::test]
    async fn test_state_vector_provider_dispatch() {
        let http = Arc::new(MockHttp::new());
        http.push_json(200, &json!({ "time": 1, "states": [["abc123", "TEST123 "]] }));

        let provider =
            FlightProvider::from_config(&ProviderConfig::opensky(), Arc::clone(&http), CachePolicy::default())
                .unwrap();
        let bbox = BoundingBox::new(37.0, -123.0, 40.0, -120.0).unwrap();
        let flights = provider.get_states(&bbox).await.unwrap();

        assert_eq!(flights[0].callsign.as_deref(), Some("TEST123"));
        assert!(http.requests()[0].starts_with(state_vector::DEFAULT_BASE_URL));
    }
}
