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

//! Runtime provider selection file.
//!
//! A small JSON document naming the provider to use for the session. It is
//! read once at startup; when it is missing or unreadable the OpenSky feed
//! is used instead.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::ProviderConfig;
use crate::error::{Error, Result};

/// Contents of the selection file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeProviderSelection {
    #[serde(default)]
    pub selected_provider_id: String,
    pub selected_provider: ProviderConfig,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl RuntimeProviderSelection {
    /// Read and parse a selection file.
    pub fn read(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|e| {
            Error::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::parse(&raw)
    }

    /// Parse selection JSON.
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw)
            .map_err(|e| Error::Configuration(format!("invalid provider selection: {e}")))
    }
}

/// Provider configuration for this session.
///
/// Never fails: any problem with the file is logged and the fallback
/// provider is returned.
#[must_use]
pub fn load_runtime_provider(path: &Path) -> ProviderConfig {
    match RuntimeProviderSelection::read(path) {
        Ok(selection) => {
            info!(
                "Using provider '{}' from {}",
                selection.selected_provider.id,
                path.display()
            );
            selection.selected_provider
        }
        Err(e) => {
            warn!("Falling back to default provider: {e}");
            ProviderConfig::opensky()
        }
    }
}
