use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use proxy_probe::app::{self, RunOptions};
use proxy_probe::config::{Overrides, Settings};
use proxy_probe::http::HttpClient;
use proxy_probe::probe::Provider;
use std::process::ExitCode;

const EXAMPLES: &str = "\
Examples:
    proxy-probe --username alice --pin 1234                     # Test opensource provider (default)
    proxy-probe --username alice --pin 1234 -v                  # Test opensource with verbose output
    proxy-probe --username alice --pin 1234 --show-token        # Show JWT token after registration
    proxy-probe --username alice --pin 1234 --token-only        # Only register and show token
    proxy-probe --username alice --pin 1234 --provider openai   # Test only OpenAI (requires API key)

    # If DEFAULT_USERNAME and DEFAULT_PIN are set in .env file:
    proxy-probe                                                 # Uses credentials from .env file
    proxy-probe -v                                              # Same, with verbose output";

#[derive(Parser)]
#[command(
    name = "proxy-probe",
    version,
    about = "AI Tools LLM Proxy Health Checker",
    after_help = EXAMPLES
)]
struct Cli {
    /// Show detailed JSON responses
    #[arg(short, long)]
    verbose: bool,

    /// Display the JWT token after registration
    #[arg(long)]
    show_token: bool,

    /// Only register and show token, skip health checks
    #[arg(long)]
    token_only: bool,

    /// Test only this provider (default: opensource)
    #[arg(long, value_enum)]
    provider: Option<Provider>,

    /// Username for authentication (required if not in .env)
    #[arg(long)]
    username: Option<String>,

    /// PIN for authentication (required if not in .env)
    #[arg(long)]
    pin: Option<String>,

    /// Proxy base URL (overrides PROXY_BASE_URL)
    #[arg(long)]
    base_url: Option<String>,

    /// Request timeout in seconds (overrides PROXY_TIMEOUT)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            base_url: self.base_url.clone(),
            timeout_secs: self.timeout,
            username: self.username.clone(),
            pin: self.pin.clone(),
        }
    }

    fn run_options(&self) -> RunOptions {
        RunOptions {
            providers: self
                .provider
                .map(|p| vec![p])
                .unwrap_or_else(app::default_providers),
            verbose: self.verbose,
            show_token: self.show_token,
            token_only: self.token_only,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("proxy_probe=warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let code = exit_code_for(run(&cli, |key| std::env::var(key).ok()).await);
    ExitCode::from(code)
}

/// Errors that escaped the run are reported here and exit 1.
fn exit_code_for(result: Result<u8>) -> u8 {
    match result {
        Ok(code) => code,
        Err(e) => {
            println!("{}", format!("\nUnexpected error: {e:#}").red());
            1
        }
    }
}

async fn run<F>(cli: &Cli, env: F) -> Result<u8>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = match Settings::resolve(cli.overrides(), env) {
        Ok(settings) => settings,
        Err(e) => {
            println!("{}", e.to_string().red());
            return Ok(1);
        }
    };
    let options = cli.run_options();

    // Dropped on every path out of this function, interrupt included.
    let client = HttpClient::new(settings.timeout)?;

    let checks = async {
        let outcome = app::run(&settings, &options, &client).await?;
        Ok::<_, anyhow::Error>(outcome.exit_code())
    };
    until_interrupted(checks, tokio::signal::ctrl_c()).await
}

/// Drives `checks` to completion unless `interrupt` fires first. An
/// interrupt source that fails to install is ignored.
async fn until_interrupted(
    checks: impl Future<Output = Result<u8>>,
    interrupt: impl Future<Output = std::io::Result<()>>,
) -> Result<u8> {
    tokio::select! {
        code = checks => code,
        Ok(()) = interrupt => {
            println!("{}", "\n\nHealth check interrupted by user.".yellow());
            Ok(1)
        }
    }
}
