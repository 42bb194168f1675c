// =============================================================================
// Application Identity
// =============================================================================

/// Application name in title case (for display and platform directories)
pub const APP_NAME: &str = "OrgMirror";

/// Application name in lowercase (for paths and identifiers)
pub const APP_NAME_LOWER: &str = "orgmirror";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".orgmirror";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "orgmirror.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "ORGMIRROR_CONFIG";

// =============================================================================
// Environment Variables - Remote API
// =============================================================================

/// Environment variable for the organization name
pub const ENV_ORG: &str = "ORGMIRROR_ORG";

/// Environment variable for the API token
pub const ENV_TOKEN: &str = "ORGMIRROR_TOKEN";

/// Environment variable for the API base URL
pub const ENV_API_BASE: &str = "ORGMIRROR_API_BASE";

/// Environment variable for the inter-page fetch delay (milliseconds)
pub const ENV_PAGE_DELAY_MS: &str = "ORGMIRROR_PAGE_DELAY_MS";

/// Environment variable for the listing page size
pub const ENV_PER_PAGE: &str = "ORGMIRROR_PER_PAGE";

// =============================================================================
// Environment Variables - Diagnostics & Storage
// =============================================================================

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "ORGMIRROR_LOG";

/// Environment variable to override data directory
pub const ENV_DATA_DIR: &str = "ORGMIRROR_DATA_DIR";

// =============================================================================
// SQLite Database
// =============================================================================

/// SQLite database filename
pub const SQLITE_DB_FILENAME: &str = "orgmirror.db";

/// SQLite connection pool max connections
pub const SQLITE_MAX_CONNECTIONS: u32 = 5;

/// SQLite busy timeout in seconds
pub const SQLITE_BUSY_TIMEOUT_SECS: u64 = 30;

/// SQLite cache size (negative = KB, so -64000 = 64MB)
pub const SQLITE_CACHE_SIZE: &str = "-64000";
