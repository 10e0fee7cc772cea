//! Command-line argument parsing

use crate::config::CheckerConfig;
use crate::registry::client::{DEFAULT_REGISTRY_URL, DEFAULT_SERVICE, DEFAULT_TOKEN_URL};
use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "registry-notify")]
#[command(about = "Watch Docker registry tags and notify when their content changes")]
#[command(version, author)]
pub struct Args {
    /// Watch configuration file
    #[arg(
        long = "config",
        short = 'c',
        default_value = ".config.json",
        help = "Path to the JSON watch configuration"
    )]
    pub config: String,

    /// File holding the encoded state between runs
    #[arg(
        long = "state-file",
        short = 's',
        default_value = ".registry-notify-state",
        help = "Path to the state file"
    )]
    pub state_file: String,

    /// Maximum concurrent manifest requests
    #[arg(
        long = "concurrency",
        short = 'j',
        default_value = "2",
        help = "Maximum number of manifest requests in flight"
    )]
    pub concurrency: usize,

    /// Timeout in seconds for network operations
    #[arg(
        long = "timeout",
        short = 't',
        default_value = "30",
        help = "Timeout for network operations in seconds"
    )]
    pub timeout: u64,

    #[arg(long = "registry-url", default_value = DEFAULT_REGISTRY_URL, help = "Registry base URL")]
    pub registry_url: String,

    #[arg(long = "token-url", default_value = DEFAULT_TOKEN_URL, help = "Token endpoint URL")]
    pub token_url: String,

    #[arg(long = "service", default_value = DEFAULT_SERVICE, help = "Service name sent with token requests")]
    pub service: String,

    /// Dry run mode (check and notify without saving state)
    #[arg(
        long = "dry-run",
        short = 'n',
        help = "Do not save the new state"
    )]
    pub dry_run: bool,

    /// Verbose output
    #[arg(long = "verbose", short = 'v', help = "Enable verbose output")]
    pub verbose: bool,

    /// Quiet mode
    #[arg(long = "quiet", short = 'q', help = "Only print the report and errors")]
    pub quiet: bool,

    #[arg(long = "pretty", help = "Pretty-print the JSON report")]
    pub pretty: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Args::parse()
    }

    /// Validate arguments
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("Concurrency must be greater than 0".to_string());
        }

        if self.timeout == 0 {
            return Err("Timeout must be greater than 0".to_string());
        }

        if self.verbose && self.quiet {
            return Err("--verbose and --quiet are mutually exclusive".to_string());
        }

        Ok(())
    }

    /// Load overrides from environment variables
    pub fn from_env(mut self) -> Self {
        if let Ok(config) = std::env::var("REGISTRY_NOTIFY_CONFIG") {
            self.config = config;
        }

        if let Ok(state_file) = std::env::var("REGISTRY_NOTIFY_STATE_FILE") {
            self.state_file = state_file;
        }

        if let Ok(concurrency) = std::env::var("REGISTRY_NOTIFY_CONCURRENCY") {
            if let Ok(c) = concurrency.parse() {
                self.concurrency = c;
            }
        }

        if let Ok(timeout) = std::env::var("REGISTRY_NOTIFY_TIMEOUT") {
            if let Ok(t) = timeout.parse() {
                self.timeout = t;
            }
        }

        if std::env::var("REGISTRY_NOTIFY_VERBOSE").is_ok() {
            self.verbose = true;
        }

        self
    }

    pub fn checker_config(&self) -> CheckerConfig {
        CheckerConfig::default()
            .with_registry_url(self.registry_url.as_str())
            .with_token_url(self.token_url.as_str())
            .with_service(self.service.as_str())
            .with_max_concurrent_fetches(self.concurrency)
            .with_timeout(self.timeout)
    }
}
