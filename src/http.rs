use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const USER_AGENT: &str = concat!("proxy-probe/", env!("CARGO_PKG_VERSION"));

/// A completed exchange. Any status the server sent back lands here;
/// only calls that never produced a response become errors.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// Time from sending the request until the response headers arrived.
    pub elapsed: Duration,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Seam between the checker and the network, so probes can run against a
/// scripted transport in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// POST `body` as JSON to `url` with the given extra headers.
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse>;
}

/// The single client shared by every request of a run.
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| Error::http(e.to_string()))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        body: &Value,
        headers: &[(&str, &str)],
    ) -> Result<HttpResponse> {
        let mut req = self.client.post(url).json(body);
        for (k, v) in headers {
            req = req.header(*k, *v);
        }

        let started = Instant::now();
        let resp = req.send().await.map_err(|e| {
            warn!(url, timeout = e.is_timeout(), connect = e.is_connect(), "request failed");
            Error::http(error_chain(&e))
        })?;
        let elapsed = started.elapsed();
        let status = resp.status().as_u16();
        let body = resp.text().await.map_err(|e| Error::http(error_chain(&e)))?;

        debug!(url, status, elapsed_ms = elapsed.as_millis() as u64, "response received");
        Ok(HttpResponse {
            status,
            body,
            elapsed,
        })
    }
}

/// `Display` of `err` followed by each of its sources, joined with `": "`.
/// reqwest keeps the interesting part (refused, timed out, DNS) in the sources.
fn error_chain(err: &dyn std::error::Error) -> String {
    let mut msg = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !msg.ends_with(&text) {
            msg.push_str(": ");
            msg.push_str(&text);
        }
        source = cause.source();
    }
    msg
}

/// Joins a proxy path onto the base URL without doubling the slash.
pub fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{}", base_url.trim_end_matches('/'), path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_paths() {
        assert_eq!(
            endpoint("http://localhost:7860", "/auth/register"),
            "http://localhost:7860/auth/register"
        );
        assert_eq!(
            endpoint("http://localhost:7860/", "/auth/register"),
            "http://localhost:7860/auth/register"
        );
    }

    #[test]
    fn only_200_counts_as_ok() {
        let mut resp = HttpResponse {
            status: 200,
            body: String::new(),
            elapsed: Duration::ZERO,
        };
        assert!(resp.is_ok());
        resp.status = 201;
        assert!(!resp.is_ok());
    }

    #[derive(Debug, thiserror::Error)]
    #[error("error sending request")]
    struct Outer(#[source] std::io::Error);

    #[test]
    fn error_chain_includes_sources() {
        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "Connection refused",
        ));
        assert_eq!(error_chain(&err), "error sending request: Connection refused");
    }

    #[tokio::test]
    async fn unreachable_host_names_the_cause() {
        let client = HttpClient::new(Duration::from_secs(2)).unwrap();
        let err = client
            .post_json("http://127.0.0.1:1/auth/register", &Value::Null, &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Http(_)), "{err:?}");
        let msg = err.to_string();
        assert!(msg.contains("error sending request"), "{msg}");
        assert!(msg.to_lowercase().contains("connection refused"), "{msg}");
    }
}
