//! Scripted `Transport` double shared by the unit tests.
//!
//! Routes are matched by method and path prefix in registration order. Each
//! route replays its queued responses in order and keeps repeating the last
//! one once the queue is down to a single entry. Every request is recorded so
//! tests can assert on call counts and query parameters.

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::Mutex;

use super::transport::{ApiRequest, ApiResponse, Transport};

struct Route {
    method: Method,
    prefix: String,
    responses: VecDeque<ApiResponse>,
}

#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<Vec<Route>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue responses for requests whose path starts with `prefix`.
    pub fn on(self, method: Method, prefix: &str, responses: Vec<ApiResponse>) -> Self {
        self.routes
            .lock()
            .unwrap()
            .push(Route {
                method,
                prefix: prefix.to_string(),
                responses: responses.into(),
            });
        self
    }

    pub fn on_json(self, method: Method, prefix: &str, bodies: Vec<Value>) -> Self {
        let responses = bodies.into_iter().map(ok_json).collect();
        self.on(method, prefix, responses)
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, prefix: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path.starts_with(prefix))
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &ApiRequest) -> Result<ApiResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let mut routes = self.routes.lock().unwrap();
        let route = routes
            .iter_mut()
            .find(|r| r.method == request.method && request.path.starts_with(&r.prefix))
            .ok_or_else(|| anyhow!("no scripted route for {} {}", request.method, request.path))?;
        let response = if route.responses.len() > 1 {
            route.responses.pop_front()
        } else {
            route.responses.front().cloned()
        };
        response.ok_or_else(|| anyhow!("route {} has no responses", route.prefix))
    }
}

pub fn ok_json(body: Value) -> ApiResponse {
    ApiResponse::new(StatusCode::OK, body.to_string())
}

pub fn status(code: u16, body: Value) -> ApiResponse {
    ApiResponse::new(
        StatusCode::from_u16(code).expect("valid status code"),
        body.to_string(),
    )
}

pub fn no_content() -> ApiResponse {
    ApiResponse::new(StatusCode::NO_CONTENT, "")
}

pub fn user(id: u64, username: &str) -> Value {
    json!({"id": id.to_string(), "username": username})
}

pub fn message(id: u64, channel_id: u64, author_id: u64, hit: bool) -> Value {
    json!({
        "id": id.to_string(),
        "channel_id": channel_id.to_string(),
        "author": {"id": author_id.to_string(), "username": "someone"},
        "content": format!("message {id}"),
        "timestamp": "2024-03-01T12:00:00+00:00",
        "hit": hit,
    })
}

/// A search page where every group is a single hit from `author_id`.
pub fn search_page(total: u64, hits: &[(u64, u64)], author_id: u64) -> Value {
    let groups: Vec<Value> = hits
        .iter()
        .map(|&(id, channel)| json!([message(id, channel, author_id, true)]))
        .collect();
    json!({"total_results": total, "messages": groups})
}

pub fn empty_search() -> Value {
    json!({"total_results": 0, "messages": []})
}
