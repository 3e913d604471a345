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

//! HTTP client abstraction for testability.
//!
//! Providers and the proxy talk to the network through [`HttpClient`], so
//! tests can substitute a recording client for the real one.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use thiserror::Error;

/// User-Agent sent with every upstream request.
const USER_AGENT: &str = concat!("flightmap/", env!("CARGO_PKG_VERSION"));

/// A fully buffered HTTP response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// Status code.
    pub status: u16,
    /// Value of the `Content-Type` header, if any.
    pub content_type: Option<String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Check for a 2xx status.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check whether the body is declared as JSON.
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("application/json"))
    }
}

/// Transport-level failure: the request never produced a response.
///
/// The message never contains the request URL, which may carry credentials.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Trait for asynchronous HTTP GET requests.
pub trait HttpClient: Send + Sync {
    /// Performs an HTTP GET request and buffers the response.
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<C: HttpClient> HttpClient for Arc<C> {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        (**self).get(url)
    }
}

/// Real HTTP client implementation using reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| TransportError(format!("failed to create HTTP client: {}", e.without_url())))?;

        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    async fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        let response = self.client.get(url).send().await.map_err(strip_url)?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await.map_err(strip_url)?.to_vec();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// reqwest embeds the request URL in its errors; drop it before the error
/// goes anywhere else.
fn strip_url(err: reqwest::Error) -> TransportError {
    TransportError(err.without_url().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_range() {
        let mut response = HttpResponse {
            status: 200,
            content_type: None,
            body: Vec::new(),
        };
        assert!(response.is_success());
        response.status = 204;
        assert!(response.is_success());
        response.status = 429;
        assert!(!response.is_success());
    }

    #[test]
    fn test_is_json() {
        let response = HttpResponse {
            status: 200,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: Vec::new(),
        };
        assert!(response.is_json());

        let html = HttpResponse {
            content_type: Some("text/html".to_string()),
            ..response
        };
        assert!(!html.is_json());
    }
}
