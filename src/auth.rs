//! Registration against the proxy, which hands back the bearer token used
//! by every probe in the run.

use crate::config::Secret;
use crate::error::{Error, Result};
use crate::http::{Transport, endpoint};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

pub const REGISTER_PATH: &str = "/auth/register";

/// The credential obtained from registration. Lives for one run only.
#[derive(Debug, Clone)]
pub struct Session {
    token: Secret,
}

impl Session {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: Secret::new(token),
        }
    }

    pub fn token(&self) -> &str {
        self.token.expose()
    }
}

#[derive(Deserialize)]
struct RegisterResponse {
    token: Option<String>,
}

/// Register `username` with `pin`. One attempt, no retry.
pub async fn register(
    transport: &dyn Transport,
    base_url: &str,
    username: &str,
    pin: &Secret,
) -> Result<Session> {
    let url = endpoint(base_url, REGISTER_PATH);
    let body = json!({ "username": username, "pin": pin.expose() });

    let resp = transport
        .post_json(&url, &body, &[])
        .await
        .map_err(|e| {
            warn!(username, "registration request failed");
            Error::auth(format!("Registration error: {e}"))
        })?;

    if !resp.is_ok() {
        warn!(username, status = resp.status, "registration rejected");
        return Err(Error::auth(format!(
            "Registration failed: {} - {}",
            resp.status, resp.body
        )));
    }

    let token = serde_json::from_str::<RegisterResponse>(&resp.body)
        .ok()
        .and_then(|r| r.token)
        .filter(|t| !t.is_empty());

    match token {
        Some(token) => {
            info!(username, "registered");
            Ok(Session::new(token))
        }
        None => {
            warn!(username, "registration returned no token");
            Err(Error::auth(format!(
                "Registration failed: No token received ({} - {})",
                resp.status, resp.body
            )))
        }
    }
}
