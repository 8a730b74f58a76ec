use clap::{Parser, Subcommand};

use std::path::PathBuf;

use super::config::TierMode;
use super::constants::{
    ENV_ALLOW_ORIGIN, ENV_AUTH_ENABLED, ENV_AWS_ENDPOINT, ENV_AWS_REGION,
    ENV_BACKEND_TIMEOUT_SECS, ENV_CACHE_EXPIRATION_SECS, ENV_CACHE_LIMIT, ENV_COLD_DATABASE,
    ENV_COLD_TABLE, ENV_CONFIG, ENV_HOST, ENV_HOT_RETENTION_SECS, ENV_HOT_TABLE, ENV_JWT_SECRET,
    ENV_PORT, ENV_TIER_MODE,
};

#[derive(Parser)]
#[command(name = "airlens")]
#[command(version, about = "Tiered telemetry query service", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Server host address
    #[arg(long, short = 'H', global = true, env = ENV_HOST)]
    pub host: Option<String>,

    /// Server port
    #[arg(long, short = 'p', global = true, env = ENV_PORT)]
    pub port: Option<u16>,

    /// Path to config file
    #[arg(long, short = 'c', global = true, env = ENV_CONFIG)]
    pub config: Option<PathBuf>,

    /// Value for the Access-Control-Allow-Origin header
    #[arg(long, global = true, env = ENV_ALLOW_ORIGIN)]
    pub allow_origin: Option<String>,

    /// Enable or disable bearer token verification
    #[arg(long, global = true, env = ENV_AUTH_ENABLED)]
    pub auth_enabled: Option<bool>,

    /// Disable authentication (for development)
    #[arg(long, global = true)]
    pub no_auth: bool,

    /// HS256 secret used to verify bearer tokens
    #[arg(long, global = true, env = ENV_JWT_SECRET, hide_env_values = true)]
    pub jwt_secret: Option<String>,

    // Hot tier options
    /// DynamoDB table holding recent readings
    #[arg(long, global = true, env = ENV_HOT_TABLE)]
    pub hot_table: Option<String>,

    /// Seconds of data retained by the hot tier
    #[arg(long, global = true, env = ENV_HOT_RETENTION_SECS)]
    pub hot_retention_secs: Option<u64>,

    // Cold tier options
    /// Timestream database
    #[arg(long, global = true, env = ENV_COLD_DATABASE)]
    pub cold_database: Option<String>,

    /// Timestream table
    #[arg(long, global = true, env = ENV_COLD_TABLE)]
    pub cold_table: Option<String>,

    // AWS options
    /// AWS region for both tiers
    #[arg(long, global = true, env = ENV_AWS_REGION)]
    pub aws_region: Option<String>,

    /// Custom endpoint for the hot tier (e.g. DynamoDB Local)
    #[arg(long, global = true, env = ENV_AWS_ENDPOINT)]
    pub aws_endpoint: Option<String>,

    // Query options
    /// Tier selection mode (auto or cold)
    #[arg(long, global = true, env = ENV_TIER_MODE, value_parser = parse_tier_mode)]
    pub tier_mode: Option<TierMode>,

    /// Timeout for each backend page request, in seconds
    #[arg(long, global = true, env = ENV_BACKEND_TIMEOUT_SECS)]
    pub backend_timeout_secs: Option<u64>,

    // Cache options
    /// Maximum number of cached responses
    #[arg(long, global = true, env = ENV_CACHE_LIMIT)]
    pub cache_limit: Option<usize>,

    /// Cached response lifetime in seconds
    #[arg(long, global = true, env = ENV_CACHE_EXPIRATION_SECS)]
    pub cache_expiration_secs: Option<u64>,
}

/// Parse tier mode from CLI/env string
fn parse_tier_mode(s: &str) -> Result<TierMode, String> {
    match s.to_lowercase().as_str() {
        "auto" => Ok(TierMode::Auto),
        "cold" => Ok(TierMode::Cold),
        _ => Err(format!(
            "Invalid tier mode '{}'. Valid options: auto, cold",
            s
        )),
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Start the server (default command)
    Start,
    /// Print the effective configuration and exit
    Config,
}

/// Configuration derived from CLI arguments
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub config: Option<PathBuf>,
    pub allow_origin: Option<String>,
    pub auth_enabled: Option<bool>,
    pub no_auth: bool,
    pub jwt_secret: Option<String>,
    pub hot_table: Option<String>,
    pub hot_retention_secs: Option<u64>,
    pub cold_database: Option<String>,
    pub cold_table: Option<String>,
    pub aws_region: Option<String>,
    pub aws_endpoint: Option<String>,
    pub tier_mode: Option<TierMode>,
    pub backend_timeout_secs: Option<u64>,
    pub cache_limit: Option<usize>,
    pub cache_expiration_secs: Option<u64>,
}

/// Parse CLI arguments and return config with command
pub fn parse() -> (CliConfig, Option<Commands>) {
    let cli = Cli::parse();
    let config = CliConfig {
        host: cli.host,
        port: cli.port,
        config: cli.config,
        allow_origin: cli.allow_origin,
        auth_enabled: cli.auth_enabled,
        no_auth: cli.no_auth,
        jwt_secret: cli.jwt_secret,
        hot_table: cli.hot_table,
        hot_retention_secs: cli.hot_retention_secs,
        cold_database: cli.cold_database,
        cold_table: cli.cold_table,
        aws_region: cli.aws_region,
        aws_endpoint: cli.aws_endpoint,
        tier_mode: cli.tier_mode,
        backend_timeout_secs: cli.backend_timeout_secs,
        cache_limit: cli.cache_limit,
        cache_expiration_secs: cli.cache_expiration_secs,
    };
    (config, cli.command)
}
