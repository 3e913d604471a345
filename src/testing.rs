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

//! Scripted upstream used by the binary's tests.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use flight_client::{HttpClient, HttpResponse, TransportError};

/// Answers requests from a queue and records every URL it was asked for.
#[derive(Debug, Default)]
pub(crate) struct MockUpstream {
    responses: Mutex<VecDeque<Result<HttpResponse, TransportError>>>,
    requests: Mutex<Vec<String>>,
}

impl MockUpstream {
    pub(crate) fn respond(self, response: Result<HttpResponse, TransportError>) -> Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub(crate) fn json(self, status: u16, body: &str) -> Self {
        self.respond(Ok(HttpResponse {
            status,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: body.as_bytes().to_vec(),
        }))
    }

    pub(crate) fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl HttpClient for MockUpstream {
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
