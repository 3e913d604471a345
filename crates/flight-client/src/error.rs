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

//! Error types shared by every layer of the client.

use thiserror::Error;

/// Errors produced while building viewports or fetching flights.
#[derive(Debug, Error)]
pub enum Error {
    /// Viewport bounds could not be turned into a bounding box.
    #[error("invalid bounds: {0}")]
    InvalidBounds(String),

    /// An upstream request failed or returned an unusable payload.
    #[error("{provider} request failed: {message}")]
    UpstreamRequest {
        /// Name of the provider that issued the request.
        provider: &'static str,
        /// HTTP status code, when a response was received at all.
        status: Option<u16>,
        /// Human-readable failure description.
        message: String,
    },

    /// Provider setup is missing or unsupported.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl Error {
    pub(crate) fn upstream(provider: &'static str, status: Option<u16>, message: impl Into<String>) -> Self {
        Self::UpstreamRequest {
            provider,
            status,
            message: message.into(),
        }
    }
}

/// Result alias for fallible client operations.
pub type Result<T> = std::result::Result<T, Error>;
