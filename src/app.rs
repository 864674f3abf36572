//! One health-check run: register, optionally show the token, probe each
//! selected provider in order, summarize.

use crate::auth::{self, Session};
use crate::config::Settings;
use crate::error::{Error, Result};
use crate::http::Transport;
use crate::probe::{self, ProbeResult, Provider};
use crate::report::{self, Summary};
use colored::Colorize;
use std::collections::BTreeMap;
use tracing::info;

pub const TITLE: &str = "AI Tools LLM Proxy Health Checker";

/// Per-run switches taken from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub providers: Vec<Provider>,
    pub verbose: bool,
    pub show_token: bool,
    pub token_only: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            providers: default_providers(),
            verbose: false,
            show_token: false,
            token_only: false,
        }
    }
}

/// Providers probed when none is named: only `opensource`.
pub fn default_providers() -> Vec<Provider> {
    vec![Provider::Opensource]
}

#[derive(Debug, Clone)]
pub enum RunOutcome {
    /// Registration failed; no probe ran.
    RegistrationFailed,
    /// Registered and printed the token, probes skipped on request.
    TokenOnly { session: Session },
    /// Probes ran. `shown_token` is set when the token was printed first.
    Checked {
        results: BTreeMap<Provider, ProbeResult>,
        summary: Summary,
        shown_token: Option<Session>,
    },
}

impl RunOutcome {
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::RegistrationFailed => 1,
            Self::TokenOnly { .. } => 0,
            Self::Checked { summary, .. } => summary.exit_code(),
        }
    }
}

pub async fn run(
    settings: &Settings,
    options: &RunOptions,
    transport: &dyn Transport,
) -> Result<RunOutcome> {
    println!("{}", report::header(TITLE));
    println!("{}", format!("Proxy URL: {}", settings.base_url).cyan());
    println!("{}", format!("Username: {}", settings.username).cyan());
    let names: Vec<&str> = options.providers.iter().map(|p| p.name()).collect();
    println!("{}", format!("Providers: {}", names.join(", ")).cyan());

    println!(
        "{}",
        format!("\nRegistering user '{}'...", settings.username).blue()
    );
    let session = match auth::register(
        transport,
        &settings.base_url,
        &settings.username,
        &settings.pin,
    )
    .await
    {
        Ok(session) => {
            println!(
                "{}",
                report::ok(&format!(
                    "Registration successful for user: {}",
                    settings.username
                ))
            );
            session
        }
        Err(Error::Auth(msg)) => {
            println!("{}", report::fail(&msg));
            println!(
                "{}",
                "Registration failed. Cannot proceed with health checks.".red()
            );
            return Ok(RunOutcome::RegistrationFailed);
        }
        Err(e) => return Err(e),
    };

    let show_token = options.show_token || options.token_only;
    if show_token {
        println!("{}", "\nJWT Token:".yellow());
        println!("{}", session.token().white());
    }

    if options.token_only {
        println!("{}", "\nToken-only mode: Skipping health checks.".yellow());
        return Ok(RunOutcome::TokenOnly { session });
    }

    println!("{}", report::header("Health Check Results"));
    let mut results = BTreeMap::new();
    for &provider in &options.providers {
        println!("{}", format!("\nTesting {provider} provider...").blue());
        let result = probe::probe(transport, settings, provider, &session, options.verbose).await;

        println!("{}", report::status_line(&result));
        // Bodies are only captured on verbose runs.
        if let Some(detail) = report::detailed_response(&result) {
            println!("{detail}");
        }
        results.insert(provider, result);
    }

    let summary = Summary::from_results(results.values());
    info!(
        total = summary.total,
        passed = summary.passed,
        failed = summary.failed,
        "health check finished"
    );
    println!("{}", report::header("Summary"));
    println!("{}", summary.render());

    Ok(RunOutcome::Checked {
        results,
        summary,
        shown_token: show_token.then_some(session),
    })
}
