//! Provider probes. Every provider goes through the same request path; what
//! differs between them (endpoint, model, key headers, gating) is carried by
//! a [`ProbeSpec`].

use crate::auth::Session;
use crate::config::{Secret, Settings};
use crate::http::{Transport, endpoint};
use serde_json::{Value, json};
use std::fmt;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const HEALTH_PROMPT: &str = "Say 'Health check successful' and nothing else.";
pub const PROBE_MAX_TOKENS: u32 = 10;

/// Backend reachable through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, clap::ValueEnum)]
pub enum Provider {
    Opensource,
    #[value(name = "openai")]
    OpenAi,
    Anthropic,
}

impl Provider {
    pub fn name(self) -> &'static str {
        match self {
            Self::Opensource => "opensource",
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Label used in the status column of the report.
    pub fn label(self) -> &'static str {
        match self {
            Self::Opensource => "Opensource",
            Self::OpenAi => "Openai",
            Self::Anthropic => "Anthropic",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A user-supplied key forwarded to the proxy as a header.
struct KeyHeader {
    header: &'static str,
    /// Value shipped in the sample `.env`; treated as "not configured".
    placeholder: &'static str,
    value: fn(&Settings) -> Option<&Secret>,
}

impl KeyHeader {
    fn resolve<'a>(&self, settings: &'a Settings) -> Option<(&'static str, &'a str)> {
        (self.value)(settings)
            .map(Secret::expose)
            .filter(|v| *v != self.placeholder)
            .map(|v| (self.header, v))
    }
}

/// Everything that distinguishes one provider's probe from another.
pub struct ProbeSpec {
    pub provider: Provider,
    pub path: &'static str,
    pub model: &'static str,
    /// Key without which the probe is skipped, making no network call.
    required: Option<KeyHeader>,
    /// Keys sent only when configured.
    optional: &'static [KeyHeader],
    not_configured: &'static str,
}

fn openai_api_key(s: &Settings) -> Option<&Secret> {
    s.openai_api_key.as_ref()
}

fn openai_org_id(s: &Settings) -> Option<&Secret> {
    s.openai_org_id.as_ref()
}

fn anthropic_api_key(s: &Settings) -> Option<&Secret> {
    s.anthropic_api_key.as_ref()
}

static OPENSOURCE: ProbeSpec = ProbeSpec {
    provider: Provider::Opensource,
    path: "/opensource/v1/chat/completions",
    model: "openai--gpt-oss-120b",
    required: None,
    optional: &[],
    not_configured: "",
};

static OPENAI: ProbeSpec = ProbeSpec {
    provider: Provider::OpenAi,
    path: "/openai/v1/chat/completions",
    model: "gpt-3.5-turbo",
    required: Some(KeyHeader {
        header: "X-User-OpenAI-Key",
        placeholder: "your_openai_api_key_here",
        value: openai_api_key,
    }),
    optional: &[KeyHeader {
        header: "X-User-OpenAI-Org",
        placeholder: "your_openai_org_id_here",
        value: openai_org_id,
    }],
    not_configured: "OpenAI API key not configured",
};

static ANTHROPIC: ProbeSpec = ProbeSpec {
    provider: Provider::Anthropic,
    path: "/anthropic/v1/messages",
    model: "claude-3-haiku-20240307",
    required: Some(KeyHeader {
        header: "X-User-Anthropic-Key",
        placeholder: "your_anthropic_api_key_here",
        value: anthropic_api_key,
    }),
    optional: &[],
    not_configured: "Anthropic API key not configured",
};

impl ProbeSpec {
    pub fn for_provider(provider: Provider) -> &'static ProbeSpec {
        match provider {
            Provider::Opensource => &OPENSOURCE,
            Provider::OpenAi => &OPENAI,
            Provider::Anthropic => &ANTHROPIC,
        }
    }

    /// Provider key headers for this run, or `None` when the provider is
    /// gated and its key is missing or still the placeholder.
    pub fn key_headers<'a>(
        &self,
        settings: &'a Settings,
    ) -> Option<Vec<(&'static str, &'a str)>> {
        let mut headers = Vec::new();
        if let Some(required) = &self.required {
            headers.push(required.resolve(settings)?);
        }
        headers.extend(self.optional.iter().filter_map(|h| h.resolve(settings)));
        Some(headers)
    }

    pub fn request_body(&self) -> Value {
        json!({
            "model": self.model,
            "messages": [{ "role": "user", "content": HEALTH_PROMPT }],
            "max_tokens": PROBE_MAX_TOKENS,
            "stream": false,
        })
    }
}

/// Why a probe failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Gated provider without a usable key; nothing was sent.
    NotConfigured,
    /// No response arrived (timeout, refused connection, DNS).
    Transport,
    /// The proxy answered with something other than 200.
    Status,
    /// 200, but the body was not JSON. Reported with status 0, like a
    /// call that never completed.
    Decode,
}

/// Outcome of one probe. `status_code` is 0 when no response arrived and
/// `elapsed` is zero for every failure.
#[derive(Debug, Clone)]
pub struct ProbeResult {
    pub provider: Provider,
    pub success: bool,
    pub status_code: u16,
    pub elapsed: Duration,
    pub error: Option<String>,
    pub failure: Option<FailureKind>,
    /// Decoded body, kept only for verbose runs.
    pub response: Option<Value>,
}

impl ProbeResult {
    fn passed(
        provider: Provider,
        status_code: u16,
        elapsed: Duration,
        response: Option<Value>,
    ) -> Self {
        Self {
            provider,
            success: true,
            status_code,
            elapsed,
            error: None,
            failure: None,
            response,
        }
    }

    fn failed(
        provider: Provider,
        status_code: u16,
        kind: FailureKind,
        error: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            success: false,
            status_code,
            elapsed: Duration::ZERO,
            error: Some(error.into()),
            failure: Some(kind),
            response: None,
        }
    }
}

/// Send the health prompt to `provider` through the proxy. Never fails:
/// every problem is folded into the returned [`ProbeResult`].
pub async fn probe(
    transport: &dyn Transport,
    settings: &Settings,
    provider: Provider,
    session: &Session,
    verbose: bool,
) -> ProbeResult {
    let spec = ProbeSpec::for_provider(provider);

    let Some(key_headers) = spec.key_headers(settings) else {
        debug!(%provider, "key not configured, skipping request");
        return ProbeResult::failed(provider, 0, FailureKind::NotConfigured, spec.not_configured);
    };

    let bearer = format!("Bearer {}", session.token());
    let mut headers = vec![("Authorization", bearer.as_str())];
    headers.extend(key_headers);

    let url = endpoint(&settings.base_url, spec.path);
    debug!(%provider, url = %url, model = spec.model, "probing");

    let resp = match transport.post_json(&url, &spec.request_body(), &headers).await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(%provider, "probe request failed: {e}");
            return ProbeResult::failed(provider, 0, FailureKind::Transport, e.to_string());
        }
    };

    if !resp.is_ok() {
        warn!(%provider, status = resp.status, "probe rejected");
        return ProbeResult::failed(provider, resp.status, FailureKind::Status, resp.body);
    }

    match serde_json::from_str::<Value>(&resp.body) {
        Ok(body) => {
            info!(%provider, elapsed_ms = resp.elapsed.as_millis() as u64, "probe passed");
            ProbeResult::passed(provider, resp.status, resp.elapsed, verbose.then_some(body))
        }
        Err(e) => {
            warn!(%provider, "probe returned non-JSON body");
            ProbeResult::failed(
                provider,
                0,
                FailureKind::Decode,
                format!("invalid JSON in response: {e}"),
            )
        }
    }
}
