use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::cli::CliConfig;
use super::constants::{
    APP_DOT_FOLDER, CONFIG_FILE_NAME, DEFAULT_ALLOW_ORIGIN, DEFAULT_BACKEND_TIMEOUT_SECS,
    DEFAULT_CACHE_EXPIRATION_SECS, DEFAULT_CACHE_LIMIT, DEFAULT_HOST, DEFAULT_HOT_RETENTION_SECS,
    DEFAULT_PORT,
};

// =============================================================================
// Tier Mode Enum
// =============================================================================

/// How the query router picks a storage tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TierMode {
    /// Hot tier while `start` is inside the retention window, cold tier otherwise
    #[default]
    Auto,
    /// Always query the cold tier
    Cold,
}

impl fmt::Display for TierMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierMode::Auto => write!(f, "auto"),
            TierMode::Cold => write!(f, "cold"),
        }
    }
}

// =============================================================================
// File Config Structs (JSON deserialization)
// =============================================================================

/// Server configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ServerFileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub allow_origin: Option<String>,
}

/// Authentication configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AuthFileConfig {
    pub enabled: Option<bool>,
}

/// Hot tier configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct HotFileConfig {
    pub table: Option<String>,
    pub retention_secs: Option<u64>,
}

/// Cold tier configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ColdFileConfig {
    pub database: Option<String>,
    pub table: Option<String>,
}

/// AWS configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct AwsFileConfig {
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

/// Query engine configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct QueryFileConfig {
    pub tier_mode: Option<TierMode>,
    pub backend_timeout_secs: Option<u64>,
}

/// Response cache configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CacheFileConfig {
    pub limit: Option<usize>,
    pub expiration_secs: Option<u64>,
}

/// Root config file structure
#[derive(Debug, Default, Clone, Deserialize)]
pub struct FileConfig {
    pub server: Option<ServerFileConfig>,
    pub auth: Option<AuthFileConfig>,
    pub hot: Option<HotFileConfig>,
    pub cold: Option<ColdFileConfig>,
    pub aws: Option<AwsFileConfig>,
    pub query: Option<QueryFileConfig>,
    pub cache: Option<CacheFileConfig>,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// Overwrite `$target` with `$value` when the latter is set
macro_rules! merge_field {
    ($target:expr, $value:expr, $name:literal) => {
        if $value.is_some() {
            tracing::trace!(value = ?$value, concat!("Merging ", $name));
            $target = $value;
        }
    };
}

impl FileConfig {
    /// Load configuration from a JSON file
    fn load_from_file(path: &Path) -> Result<Self> {
        tracing::debug!(path = %path.display(), "Loading config file");
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        tracing::trace!(config = ?config, "Parsed config file");
        Ok(config)
    }

    /// Warn about unknown fields in the config
    fn warn_unknown_fields(&self) {
        if let serde_json::Value::Object(map) = &self.extra
            && !map.is_empty()
        {
            let keys_str: String = map
                .keys()
                .map(|k| k.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            tracing::warn!(
                fields = %keys_str,
                "Unknown fields in config file (possible typos)"
            );
        }
    }

    /// Merge another FileConfig into this one (other takes precedence)
    fn merge(&mut self, other: FileConfig) {
        if let Some(server) = other.server {
            let current = self.server.get_or_insert_with(ServerFileConfig::default);
            merge_field!(current.host, server.host, "server.host");
            merge_field!(current.port, server.port, "server.port");
            merge_field!(current.allow_origin, server.allow_origin, "server.allow_origin");
        }

        if let Some(auth) = other.auth {
            let current = self.auth.get_or_insert_with(AuthFileConfig::default);
            merge_field!(current.enabled, auth.enabled, "auth.enabled");
        }

        if let Some(hot) = other.hot {
            let current = self.hot.get_or_insert_with(HotFileConfig::default);
            merge_field!(current.table, hot.table, "hot.table");
            merge_field!(current.retention_secs, hot.retention_secs, "hot.retention_secs");
        }

        if let Some(cold) = other.cold {
            let current = self.cold.get_or_insert_with(ColdFileConfig::default);
            merge_field!(current.database, cold.database, "cold.database");
            merge_field!(current.table, cold.table, "cold.table");
        }

        if let Some(aws) = other.aws {
            let current = self.aws.get_or_insert_with(AwsFileConfig::default);
            merge_field!(current.region, aws.region, "aws.region");
            merge_field!(current.endpoint, aws.endpoint, "aws.endpoint");
        }

        if let Some(query) = other.query {
            let current = self.query.get_or_insert_with(QueryFileConfig::default);
            merge_field!(current.tier_mode, query.tier_mode, "query.tier_mode");
            merge_field!(
                current.backend_timeout_secs,
                query.backend_timeout_secs,
                "query.backend_timeout_secs"
            );
        }

        if let Some(cache) = other.cache {
            let current = self.cache.get_or_insert_with(CacheFileConfig::default);
            merge_field!(current.limit, cache.limit, "cache.limit");
            merge_field!(
                current.expiration_secs,
                cache.expiration_secs,
                "cache.expiration_secs"
            );
        }

        if let serde_json::Value::Object(extra) = other.extra
            && !extra.is_empty()
        {
            self.extra = serde_json::Value::Object(extra);
        }
    }
}

// =============================================================================
// Resolved Config Structs
// =============================================================================

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub allow_origin: String,
}

#[derive(Clone)]
pub struct AuthConfig {
    pub enabled: bool,
    pub jwt_secret: Option<String>,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("enabled", &self.enabled)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct HotTierConfig {
    pub table: String,
    pub retention_secs: u64,
}

impl HotTierConfig {
    pub fn retention(&self) -> chrono::Duration {
        seconds_delta(self.retention_secs).unwrap_or(chrono::Duration::MAX)
    }
}

#[derive(Debug, Clone)]
pub struct ColdTierConfig {
    pub database: String,
    pub table: String,
}

#[derive(Debug, Clone, Default)]
pub struct AwsConfig {
    pub region: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub tier_mode: TierMode,
    pub backend_timeout_secs: u64,
}

impl QueryConfig {
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout_secs)
    }
}

#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub limit: usize,
    pub expiration_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_CACHE_LIMIT,
            expiration_secs: DEFAULT_CACHE_EXPIRATION_SECS,
        }
    }
}

impl CacheConfig {
    pub fn expiration(&self) -> chrono::Duration {
        seconds_delta(self.expiration_secs).unwrap_or(chrono::Duration::MAX)
    }
}

/// Seconds as a `chrono::Duration`, `None` when out of range
fn seconds_delta(secs: u64) -> Option<chrono::Duration> {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub hot: HotTierConfig,
    pub cold: ColdTierConfig,
    pub aws: AwsConfig,
    pub query: QueryConfig,
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration with priority: CLI/env > local/--config file > profile file > defaults
    pub fn load(cli: &CliConfig) -> Result<Self> {
        Self::load_with_profile(cli, get_profile_config_path())
    }

    fn load_with_profile(cli: &CliConfig, profile_path: Option<PathBuf>) -> Result<Self> {
        tracing::debug!("Loading application configuration");
        tracing::trace!(cli = ?cli, "CLI config");

        let mut file_config = FileConfig::default();
        let mut found_configs: Vec<String> = Vec::new();

        // 1. Load from profile dir (~/.airlens/airlens.json) - skip if not exists
        if let Some(profile_path) = profile_path
            && profile_path.exists()
        {
            let profile_config = FileConfig::load_from_file(&profile_path)?;
            profile_config.warn_unknown_fields();
            file_config.merge(profile_config);
            found_configs.push(profile_path.display().to_string());
        }

        // 2. Load from CLI-specified path OR local directory
        let overlay_path = if let Some(ref path) = cli.config {
            if !path.exists() {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            Some(path.clone())
        } else {
            let local = PathBuf::from(CONFIG_FILE_NAME);
            if local.exists() { Some(local) } else { None }
        };

        if let Some(path) = overlay_path {
            let overlay_config = FileConfig::load_from_file(&path)?;
            overlay_config.warn_unknown_fields();
            file_config.merge(overlay_config);
            found_configs.push(path.display().to_string());
        }

        tracing::debug!(configs = ?found_configs, "Config files loaded");

        Self::resolve(cli, file_config)
    }

    /// Layer configs: defaults -> file config -> CLI/env overrides
    fn resolve(cli: &CliConfig, file_config: FileConfig) -> Result<Self> {
        let file_server = file_config.server.unwrap_or_default();
        let file_auth = file_config.auth.unwrap_or_default();
        let file_hot = file_config.hot.unwrap_or_default();
        let file_cold = file_config.cold.unwrap_or_default();
        let file_aws = file_config.aws.unwrap_or_default();
        let file_query = file_config.query.unwrap_or_default();
        let file_cache = file_config.cache.unwrap_or_default();

        let server = ServerConfig {
            host: cli
                .host
                .clone()
                .or(file_server.host)
                .unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: cli.port.or(file_server.port).unwrap_or(DEFAULT_PORT),
            allow_origin: cli
                .allow_origin
                .clone()
                .or(file_server.allow_origin)
                .unwrap_or_else(|| DEFAULT_ALLOW_ORIGIN.to_string()),
        };

        // auth.enabled: CLI/env > file, --no-auth always wins
        let auth = AuthConfig {
            enabled: if cli.no_auth {
                false
            } else {
                cli.auth_enabled.or(file_auth.enabled).unwrap_or(true)
            },
            jwt_secret: cli.jwt_secret.clone().filter(|s| !s.is_empty()),
        };

        let hot = HotTierConfig {
            table: cli.hot_table.clone().or(file_hot.table).unwrap_or_default(),
            retention_secs: cli
                .hot_retention_secs
                .or(file_hot.retention_secs)
                .unwrap_or(DEFAULT_HOT_RETENTION_SECS),
        };

        let cold = ColdTierConfig {
            database: cli
                .cold_database
                .clone()
                .or(file_cold.database)
                .unwrap_or_default(),
            table: cli.cold_table.clone().or(file_cold.table).unwrap_or_default(),
        };

        let aws = AwsConfig {
            region: cli.aws_region.clone().or(file_aws.region),
            endpoint: cli.aws_endpoint.clone().or(file_aws.endpoint),
        };

        let query = QueryConfig {
            tier_mode: cli.tier_mode.or(file_query.tier_mode).unwrap_or_default(),
            backend_timeout_secs: cli
                .backend_timeout_secs
                .or(file_query.backend_timeout_secs)
                .unwrap_or(DEFAULT_BACKEND_TIMEOUT_SECS),
        };

        let cache = CacheConfig {
            limit: cli
                .cache_limit
                .or(file_cache.limit)
                .unwrap_or(DEFAULT_CACHE_LIMIT),
            expiration_secs: cli
                .cache_expiration_secs
                .or(file_cache.expiration_secs)
                .unwrap_or(DEFAULT_CACHE_EXPIRATION_SECS),
        };

        let config = Self {
            server,
            auth,
            hot,
            cold,
            aws,
            query,
            cache,
        };

        config.validate()?;

        tracing::debug!(
            host = %config.server.host,
            port = config.server.port,
            allow_origin = %config.server.allow_origin,
            auth_enabled = config.auth.enabled,
            hot_table = %config.hot.table,
            hot_retention_secs = config.hot.retention_secs,
            cold_database = %config.cold.database,
            cold_table = %config.cold.table,
            aws_region = ?config.aws.region,
            tier_mode = %config.query.tier_mode,
            backend_timeout_secs = config.query.backend_timeout_secs,
            cache_limit = config.cache.limit,
            cache_expiration_secs = config.cache.expiration_secs,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Validate the configuration for consistency and correctness
    fn validate(&self) -> Result<()> {
        if self.server.host.is_empty() {
            anyhow::bail!("Configuration error: server.host must not be empty");
        }
        if self.server.port == 0 {
            anyhow::bail!("Configuration error: server.port must be greater than 0");
        }
        if self.server.allow_origin.is_empty() {
            anyhow::bail!("Configuration error: server.allow_origin must not be empty");
        }

        if self.auth.enabled && self.auth.jwt_secret.is_none() {
            anyhow::bail!(
                "Configuration error: a JWT secret is required when auth is enabled (set AIRLENS_JWT_SECRET or pass --no-auth)"
            );
        }

        // The hot tier is never consulted in cold-only mode
        if self.query.tier_mode == TierMode::Auto {
            if self.hot.table.is_empty() {
                anyhow::bail!("Configuration error: hot.table is required when query.tier_mode is 'auto'");
            }
            if self.hot.retention_secs == 0 {
                anyhow::bail!("Configuration error: hot.retention_secs must be greater than 0");
            }
        }

        if seconds_delta(self.hot.retention_secs).is_none() {
            anyhow::bail!(
                "Configuration error: hot.retention_secs is too large ({})",
                self.hot.retention_secs
            );
        }

        if self.cold.database.is_empty() || self.cold.table.is_empty() {
            anyhow::bail!("Configuration error: cold.database and cold.table are required");
        }

        if self.query.backend_timeout_secs == 0 {
            anyhow::bail!("Configuration error: query.backend_timeout_secs must be greater than 0");
        }

        if self.cache.limit == 0 {
            anyhow::bail!("Configuration error: cache.limit must be greater than 0");
        }
        if seconds_delta(self.cache.expiration_secs).is_none() {
            anyhow::bail!(
                "Configuration error: cache.expiration_secs is too large ({})",
                self.cache.expiration_secs
            );
        }
        if self.cache.expiration_secs == 0 {
            tracing::warn!("cache.expiration_secs is 0, every cached response expires immediately");
        }

        if !self.auth.enabled && is_all_interfaces(&self.server.host) {
            tracing::warn!(
                host = %self.server.host,
                "Authentication is disabled while binding to all network interfaces"
            );
        }

        Ok(())
    }
}

/// Get the profile config path (~/.airlens/airlens.json)
fn get_profile_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(APP_DOT_FOLDER).join(CONFIG_FILE_NAME))
}

/// Check if host binds to all network interfaces
pub(crate) fn is_all_interfaces(host: &str) -> bool {
    matches!(host, "0.0.0.0" | "::" | "[::]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn base_cli() -> CliConfig {
        CliConfig {
            jwt_secret: Some("secret".to_string()),
            hot_table: Some("readings".to_string()),
            cold_database: Some("sensors".to_string()),
            cold_table: Some("readings".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_tier_mode_serde() {
        let mode: TierMode = serde_json::from_str(r#""cold""#).unwrap();
        assert_eq!(mode, TierMode::Cold);
        assert_eq!(TierMode::Auto.to_string(), "auto");
    }

    #[test]
    fn test_file_config_parse_full() {
        let json = r#"{
            "server": { "host": "0.0.0.0", "port": 8080, "allow_origin": "https://app.example.com" },
            "hot": { "table": "readings", "retention_secs": 3600 },
            "cold": { "database": "sensors", "table": "readings" },
            "query": { "tier_mode": "cold", "backend_timeout_secs": 5 },
            "cache": { "limit": 20, "expiration_secs": 60 }
        }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();

        let server = config.server.as_ref().unwrap();
        assert_eq!(server.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(server.port, Some(8080));
        assert_eq!(config.hot.as_ref().unwrap().retention_secs, Some(3600));
        assert_eq!(
            config.query.as_ref().unwrap().tier_mode,
            Some(TierMode::Cold)
        );
        assert_eq!(config.cache.as_ref().unwrap().limit, Some(20));
    }

    #[test]
    fn test_file_config_parse_extra_fields() {
        let json = r#"{ "server": { "host": "localhost" }, "unknown_field": 123 }"#;
        let config: FileConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.extra.get("unknown_field").unwrap(), 123);
    }

    #[test]
    fn test_file_config_merge() {
        let mut base: FileConfig = serde_json::from_str(
            r#"{ "server": { "host": "127.0.0.1", "port": 9000 }, "cache": { "limit": 5 } }"#,
        )
        .unwrap();
        let overlay: FileConfig =
            serde_json::from_str(r#"{ "server": { "port": 9100 }, "cache": { "expiration_secs": 30 } }"#)
                .unwrap();
        base.merge(overlay);

        let server = base.server.as_ref().unwrap();
        assert_eq!(server.host.as_deref(), Some("127.0.0.1"));
        assert_eq!(server.port, Some(9100));
        let cache = base.cache.as_ref().unwrap();
        assert_eq!(cache.limit, Some(5));
        assert_eq!(cache.expiration_secs, Some(30));
    }

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::resolve(&base_cli(), FileConfig::default()).unwrap();
        assert_eq!(config.server.host, DEFAULT_HOST);
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.server.allow_origin, "*");
        assert!(config.auth.enabled);
        assert_eq!(config.hot.retention_secs, DEFAULT_HOT_RETENTION_SECS);
        assert_eq!(config.query.tier_mode, TierMode::Auto);
        assert_eq!(config.cache.limit, 10);
        assert_eq!(config.cache.expiration_secs, 3600);
    }

    #[test]
    fn test_app_config_cli_overrides_file() {
        let file: FileConfig = serde_json::from_str(
            r#"{ "server": { "port": 7000 }, "hot": { "retention_secs": 100 } }"#,
        )
        .unwrap();
        let cli = CliConfig {
            port: Some(7100),
            ..base_cli()
        };
        let config = AppConfig::resolve(&cli, file).unwrap();
        assert_eq!(config.server.port, 7100);
        assert_eq!(config.hot.retention_secs, 100);
    }

    #[test]
    fn test_app_config_requires_jwt_secret_when_auth_enabled() {
        let cli = CliConfig {
            jwt_secret: None,
            ..base_cli()
        };
        let err = AppConfig::resolve(&cli, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("JWT secret"));

        let cli = CliConfig {
            jwt_secret: None,
            no_auth: true,
            ..base_cli()
        };
        assert!(AppConfig::resolve(&cli, FileConfig::default()).is_ok());
    }

    #[test]
    fn test_app_config_hot_table_optional_in_cold_mode() {
        let cli = CliConfig {
            hot_table: None,
            ..base_cli()
        };
        assert!(AppConfig::resolve(&cli, FileConfig::default()).is_err());

        let cli = CliConfig {
            hot_table: None,
            tier_mode: Some(TierMode::Cold),
            ..base_cli()
        };
        assert!(AppConfig::resolve(&cli, FileConfig::default()).is_ok());
    }

    #[test]
    fn test_app_config_validation_rejects_zero_values() {
        let cli = CliConfig {
            port: Some(0),
            ..base_cli()
        };
        assert!(AppConfig::resolve(&cli, FileConfig::default()).is_err());

        let cli = CliConfig {
            cache_limit: Some(0),
            ..base_cli()
        };
        assert!(AppConfig::resolve(&cli, FileConfig::default()).is_err());

        let cli = CliConfig {
            backend_timeout_secs: Some(0),
            ..base_cli()
        };
        assert!(AppConfig::resolve(&cli, FileConfig::default()).is_err());
    }

    #[test]
    fn test_app_config_rejects_out_of_range_durations() {
        let cli = CliConfig {
            hot_retention_secs: Some(10_000_000_000_000_000),
            ..base_cli()
        };
        let err = AppConfig::resolve(&cli, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("hot.retention_secs"));

        let cli = CliConfig {
            cache_expiration_secs: Some(u64::MAX),
            ..base_cli()
        };
        let err = AppConfig::resolve(&cli, FileConfig::default()).unwrap_err();
        assert!(err.to_string().contains("cache.expiration_secs"));

        let cli = CliConfig {
            hot_retention_secs: Some(30 * 86_400),
            cache_expiration_secs: Some(7_200),
            ..base_cli()
        };
        let config = AppConfig::resolve(&cli, FileConfig::default()).unwrap();
        assert_eq!(config.hot.retention(), chrono::Duration::days(30));
        assert_eq!(config.cache.expiration(), chrono::Duration::hours(2));
    }

    #[test]
    fn test_load_from_config_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{ "server": {{ "port": 6100 }}, "query": {{ "tier_mode": "cold" }} }}"#
        )
        .unwrap();

        let cli = CliConfig {
            config: Some(file.path().to_path_buf()),
            ..base_cli()
        };
        let config = AppConfig::load_with_profile(&cli, None).unwrap();
        assert_eq!(config.server.port, 6100);
        assert_eq!(config.query.tier_mode, TierMode::Cold);
    }

    #[test]
    fn test_load_missing_config_path_fails() {
        let cli = CliConfig {
            config: Some(PathBuf::from("/nonexistent/airlens.json")),
            ..base_cli()
        };
        assert!(AppConfig::load_with_profile(&cli, None).is_err());
    }

    #[test]
    fn test_is_all_interfaces() {
        assert!(is_all_interfaces("0.0.0.0"));
        assert!(is_all_interfaces("::"));
        assert!(!is_all_interfaces("127.0.0.1"));
    }
}
