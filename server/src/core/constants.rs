// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display)
pub const APP_NAME: &str = "AirLens";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "airlens";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".airlens";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "airlens.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "AIRLENS_CONFIG";

// =============================================================================
// Environment Variables - Server
// =============================================================================

/// Environment variable for server host
pub const ENV_HOST: &str = "AIRLENS_HOST";

/// Environment variable for server port
pub const ENV_PORT: &str = "AIRLENS_PORT";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "AIRLENS_LOG";

/// Environment variable for the CORS allowed origin
pub const ENV_ALLOW_ORIGIN: &str = "AIRLENS_ALLOW_ORIGIN";

// =============================================================================
// Server Defaults
// =============================================================================

/// Default server host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default server port
pub const DEFAULT_PORT: u16 = 5490;

/// Default CORS allowed origin
pub const DEFAULT_ALLOW_ORIGIN: &str = "*";

/// Default request body limit (the query API only takes query strings)
pub const DEFAULT_BODY_LIMIT: usize = 64 * 1024;

/// Timeout for graceful shutdown of background tasks
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 30;

// =============================================================================
// Authentication
// =============================================================================

/// Environment variable for the JWT verification secret
pub const ENV_JWT_SECRET: &str = "AIRLENS_JWT_SECRET";

/// Environment variable to toggle bearer token verification
pub const ENV_AUTH_ENABLED: &str = "AIRLENS_AUTH_ENABLED";

/// Subject attached to requests when authentication is disabled
pub const ANONYMOUS_SUBJECT: &str = "anonymous";

// =============================================================================
// Hot Tier (DynamoDB)
// =============================================================================

pub const ENV_HOT_TABLE: &str = "AIRLENS_HOT_TABLE";
pub const ENV_HOT_RETENTION_SECS: &str = "AIRLENS_HOT_RETENTION_SECS";

/// Default hot tier retention window (matches the table TTL): 7 days
pub const DEFAULT_HOT_RETENTION_SECS: u64 = 7 * 24 * 3600;

/// Partition key attribute name
pub const HOT_PARTITION_KEY: &str = "pk";

/// Sort key attribute name (`HH:MM:SS#device`)
pub const HOT_SORT_KEY: &str = "sk";

/// Attribute holding the metric map
pub const HOT_PAYLOAD_ATTR: &str = "payload";

/// Separator between time and device inside the sort key
pub const HOT_SORT_KEY_SEPARATOR: char = '#';

// =============================================================================
// Cold Tier (Timestream)
// =============================================================================

pub const ENV_COLD_DATABASE: &str = "AIRLENS_COLD_DATABASE";
pub const ENV_COLD_TABLE: &str = "AIRLENS_COLD_TABLE";

/// Dimension column holding the device identifier
pub const COLD_DEVICE_COLUMN: &str = "DEVICE_NAME";

// =============================================================================
// AWS
// =============================================================================

pub const ENV_AWS_REGION: &str = "AIRLENS_AWS_REGION";
pub const ENV_AWS_ENDPOINT: &str = "AIRLENS_AWS_ENDPOINT";

// =============================================================================
// Query Engine
// =============================================================================

pub const ENV_TIER_MODE: &str = "AIRLENS_TIER_MODE";
pub const ENV_BACKEND_TIMEOUT_SECS: &str = "AIRLENS_BACKEND_TIMEOUT_SECS";

/// Per-page backend call timeout
pub const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;

/// Spans up to this many seconds are returned unaggregated
pub const AGGREGATION_THRESHOLD_SECS: i64 = 86_400;

/// Bucket width for a one-day span; scales linearly with the span
pub const BASE_BUCKET_SECS: f64 = 300.0;

/// Timestamp format accepted for `start_time` / `end_time`
pub const QUERY_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// Timestamp format used in response records
pub const RECORD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default lookback when `start_time` is omitted
pub const DEFAULT_LOOKBACK_SECS: i64 = 86_400;

/// Maximum devices per query
pub const MAX_DEVICES: usize = 100;

/// Maximum metrics per query
pub const MAX_METRICS: usize = 32;

// =============================================================================
// Response Cache
// =============================================================================

pub const ENV_CACHE_LIMIT: &str = "AIRLENS_CACHE_LIMIT";
pub const ENV_CACHE_EXPIRATION_SECS: &str = "AIRLENS_CACHE_EXPIRATION_SECS";

/// Maximum cached responses per process
pub const DEFAULT_CACHE_LIMIT: usize = 10;

/// Cached responses older than this are treated as misses
pub const DEFAULT_CACHE_EXPIRATION_SECS: u64 = 3600;
