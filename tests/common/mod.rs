#![allow(dead_code)]

use async_trait::async_trait;
use proxy_probe::config::{Overrides, Settings};
use proxy_probe::error::{Error, Result};
use proxy_probe::http::{HttpResponse, Transport};
use serde_json::Value;
use std::sync::Mutex;
use std::time::Duration;

pub const BASE_URL: &str = "http://proxy.test:7860";

pub const COMPLETION: &str = r#"{"id":"chatcmpl-1","object":"chat.completion","choices":[{"index":0,"message":{"role":"assistant","content":"Health check successful"},"finish_reason":"stop"}]}"#;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub url: String,
    pub body: Value,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone)]
enum Reply {
    Status(u16, String),
    Unreachable(String),
}

/// Scripted transport: answers by URL suffix and records every request.
/// Unscripted paths get a 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Vec<(String, Reply)>,
    calls: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(mut self, path: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes
            .push((path.to_string(), Reply::Status(status, body.into())));
        self
    }

    pub fn unreachable(mut self, path: &str, message: &str) -> Self {
        self.routes
            .push((path.to_string(), Reply::Unreachable(message.to_string())));
        self
    }

    /// Registration that hands out `token`.
    pub fn registering(self, token: &str) -> Self {
        let body = serde_json::json!({ "token": token }).to_string();
        self.on("/auth/register", 200, body)
    }

    pub fn calls(&self) -> Vec<RecordedRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, path: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.url.ends_with(path))
            .count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        self.calls.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            body: body.clone(),
            headers: headers
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });

        let reply = self
            .routes
            .iter()
            .find(|(path, _)| url.ends_with(path.as_str()))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Status(status, body)) => Ok(HttpResponse {
                status,
                body,
                elapsed: Duration::from_millis(5),
            }),
            Some(Reply::Unreachable(message)) => Err(Error::http(message)),
            None => Ok(HttpResponse {
                status: 404,
                body: "Not Found".into(),
                elapsed: Duration::from_millis(1),
            }),
        }
    }
}

/// Settings for alice/1234 against [`BASE_URL`], plus the given environment.
pub fn settings(env: &[(&str, &str)]) -> Settings {
    let mut env: Vec<(String, String)> = env
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    env.push(("PROXY_BASE_URL".into(), BASE_URL.into()));

    let overrides = Overrides {
        username: Some("alice".into()),
        pin: Some("1234".into()),
        ..Default::default()
    };
    Settings::resolve(overrides, |key| {
        env.iter().find(|(k, _)| k == key).map(|(_, v)| v.clone())
    })
    .unwrap()
}
