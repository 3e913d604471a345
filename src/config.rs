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

//! Application configuration management.
//!
//! Configuration is stored in TOML format in the platform config directory.
//! Command-line flags override individual values at startup.

use std::path::PathBuf;
use std::time::Duration;

use flight_client::CachePolicy;
use serde::{Deserialize, Serialize};

use crate::proxy::FLIGHTS_ROUTE;

/// Name used for the configuration directory
const APP_NAME: &str = "flightmap";

/// Environment variable holding the Aviation Edge API key
pub const API_KEY_ENV: &str = "AVIATION_EDGE_API_KEY";

/// Default upstream endpoint for the radius flight feed
pub const DEFAULT_AVIATION_EDGE_URL: &str = "https://aviation-edge.com/v2/public/flights";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Address the proxy server binds to, in host:port format
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Upstream Aviation Edge flights endpoint
    #[serde(default = "default_aviation_edge_base_url")]
    pub aviation_edge_base_url: String,

    /// Aviation Edge API key (optional, env var takes precedence)
    #[serde(default)]
    pub aviation_edge_api_key: Option<String>,

    /// Runtime provider selection file
    #[serde(default = "default_runtime_provider_path")]
    pub runtime_provider_path: PathBuf,

    /// How long a fetched flight list is reused for the same viewport
    #[serde(default = "default_cache_window_secs")]
    pub cache_window_secs: u64,

    /// Minimum time between two upstream requests
    #[serde(default = "default_min_refetch_secs")]
    pub min_refetch_secs: u64,

    /// Upstream request timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_listen_address() -> String {
    "127.0.0.1:3001".to_string()
}

fn default_aviation_edge_base_url() -> String {
    DEFAULT_AVIATION_EDGE_URL.to_string()
}

fn default_runtime_provider_path() -> PathBuf {
    PathBuf::from("runtime-provider.json")
}

fn default_cache_window_secs() -> u64 {
    10
}

fn default_min_refetch_secs() -> u64 {
    5
}

fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            listen_address: default_listen_address(),
            aviation_edge_base_url: default_aviation_edge_base_url(),
            aviation_edge_api_key: None,
            runtime_provider_path: default_runtime_provider_path(),
            cache_window_secs: default_cache_window_secs(),
            min_refetch_secs: default_min_refetch_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, "config")
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, "config")
    }

    /// Resolve the Aviation Edge API key from the environment or config
    pub fn resolve_api_key(&self) -> Option<String> {
        resolve_api_key(
            std::env::var(API_KEY_ENV).ok().as_deref(),
            self.aviation_edge_api_key.as_deref(),
        )
    }

    /// Cache timing for provider clients
    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            cache_window: Duration::from_secs(self.cache_window_secs),
            min_refetch_interval: Duration::from_secs(self.min_refetch_secs),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Local proxy route that radius-search providers should point at
    pub fn proxy_flights_url(&self) -> String {
        format!("http://{}{}", self.listen_address, FLIGHTS_ROUTE)
    }
}

/// Pick the environment value first, then the configured one. Empty values
/// count as unset.
fn resolve_api_key(env_key: Option<&str>, config_key: Option<&str>) -> Option<String> {
    env_key
        .filter(|key| !key.is_empty())
        .or(config_key.filter(|key| !key.is_empty()))
        .map(str::to_string)
}
