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

//! Recording HTTP client used by unit tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use crate::http::{HttpClient, HttpResponse, TransportError};

/// Returns queued responses in order and records every requested URL.
#[derive(Debug, Default)]
pub(crate) struct MockHttp {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<String>>,
}

impl MockHttp {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_json(&self, status: u16, body: &serde_json::Value) {
        self.responses.lock().unwrap().push_back(Ok(HttpResponse {
            status,
            content_type: Some("application/json".to_string()),
            body: serde_json::to_vec(body).unwrap(),
        }));
    }

    pub(crate) fn push_error(&self, message: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(TransportError(message.to_string())));
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpClient for MockHttp {
    fn get(&self, url: &str) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        self.requests.lock().unwrap().push(url.to_string());
        let next = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError("no response queued".to_string())));
        std::future::ready(next)
    }
}

/// Query parameter value from a recorded URL.
pub(crate) fn query_param(url: &str, name: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    parsed
        .query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}
