//! Configuration types shared across crates.

use crate::error::{Error, Result};
use crate::ordering::{DEFAULT_EXPRESSION_COLUMN, TopN};
use crate::search::DEFAULT_SEARCH_LIMIT;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// HTTP boundary configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Row limit applied to expression requests that do not pass one.
    #[serde(default = "default_row_limit")]
    pub default_row_limit: u32,
    /// Rows shown by the table-info preview.
    #[serde(default = "default_preview_rows")]
    pub preview_rows: u32,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_row_limit() -> u32 {
    50
}

fn default_preview_rows() -> u32 {
    5
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            default_row_limit: default_row_limit(),
            preview_rows: default_preview_rows(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_row_limit == 0 {
            return Err(Error::Config(
                "server.default_row_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// PostgreSQL SSL mode configuration.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PgSslMode {
    /// Disable SSL/TLS entirely.
    Disable,
    /// Prefer SSL/TLS but allow unencrypted connections (default).
    #[default]
    Prefer,
    /// Require SSL/TLS for all connections.
    Require,
}

/// Relational store holding annotation, metadata and matrix tables.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// SQLite database file.
    Sqlite {
        path: PathBuf,
        /// How long a connection waits on a locked database.
        #[serde(default = "default_busy_timeout_secs")]
        busy_timeout_secs: u64,
    },
    /// PostgreSQL database.
    Postgres {
        /// Connection URL. Takes precedence over individual fields.
        url: Option<String>,
        host: Option<String>,
        #[serde(default = "default_pg_port")]
        port: Option<u16>,
        username: Option<String>,
        /// Prefer ISOVIEW_DATABASE__PASSWORD over storing it in the file.
        password: Option<String>,
        database: Option<String>,
        ssl_mode: Option<PgSslMode>,
        #[serde(default = "default_max_connections")]
        max_connections: u32,
        /// Server-side statement timeout in milliseconds.
        #[serde(default = "default_statement_timeout_ms")]
        statement_timeout_ms: Option<u64>,
    },
}

fn default_busy_timeout_secs() -> u64 {
    5
}

fn default_pg_port() -> Option<u16> {
    Some(5432)
}

fn default_max_connections() -> u32 {
    10
}

fn default_statement_timeout_ms() -> Option<u64> {
    Some(30_000)
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::Sqlite {
            path: PathBuf::from("./data/isoview.db"),
            busy_timeout_secs: default_busy_timeout_secs(),
        }
    }
}

impl DatabaseConfig {
    /// Postgres configuration pointing at a connection URL.
    pub fn postgres_url(url: impl Into<String>) -> Self {
        Self::Postgres {
            url: Some(url.into()),
            host: None,
            port: default_pg_port(),
            username: None,
            password: None,
            database: None,
            ssl_mode: None,
            max_connections: default_max_connections(),
            statement_timeout_ms: default_statement_timeout_ms(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            DatabaseConfig::Sqlite { path, .. } => {
                if path.as_os_str().is_empty() {
                    return Err(Error::Config("sqlite path must not be empty".to_string()));
                }
                Ok(())
            }
            DatabaseConfig::Postgres {
                url,
                host,
                database,
                max_connections,
                ..
            } => {
                if *max_connections == 0 {
                    return Err(Error::Config(
                        "postgres max_connections must be greater than zero".to_string(),
                    ));
                }
                match (url.as_ref(), host.as_ref(), database.as_ref()) {
                    (Some(_), _, _) | (None, Some(_), Some(_)) => Ok(()),
                    (None, None, _) => Err(Error::Config(
                        "postgres config requires either 'url' or 'host' + 'database'".to_string(),
                    )),
                    (None, Some(_), None) => Err(Error::Config(
                        "postgres config requires 'database' when using individual fields"
                            .to_string(),
                    )),
                }
            }
        }
    }
}

/// In-memory gene index and search behaviour.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GeneIndexConfig {
    /// Start loading the index in the background at startup.
    #[serde(default = "default_load_on_startup")]
    pub load_on_startup: bool,
    #[serde(default = "default_search_limit")]
    pub search_limit: usize,
}

fn default_load_on_startup() -> bool {
    true
}

fn default_search_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

impl Default for GeneIndexConfig {
    fn default() -> Self {
        Self {
            load_on_startup: default_load_on_startup(),
            search_limit: default_search_limit(),
        }
    }
}

impl GeneIndexConfig {
    pub fn validate(&self) -> Result<()> {
        if self.search_limit == 0 {
            return Err(Error::Config(
                "gene_index.search_limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Defaults for the transcript chart.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderingConfig {
    /// Column summed per transcript to rank transcripts.
    #[serde(default = "default_expression_column")]
    pub expression_column: String,
    /// Window applied when a request does not choose one.
    #[serde(default = "default_top_n")]
    pub default_top_n: TopN,
}

fn default_expression_column() -> String {
    DEFAULT_EXPRESSION_COLUMN.to_string()
}

fn default_top_n() -> TopN {
    TopN::Range(0, 5)
}

impl Default for OrderingConfig {
    fn default() -> Self {
        Self {
            expression_column: default_expression_column(),
            default_top_n: default_top_n(),
        }
    }
}

/// Complete application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub gene_index: GeneIndexConfig,
    #[serde(default)]
    pub ordering: OrderingConfig,
}

impl AppConfig {
    /// Create a test configuration.
    ///
    /// **For testing only.** The index is not loaded at startup so tests
    /// control when the first load happens.
    pub fn for_testing() -> Self {
        Self {
            gene_index: GeneIndexConfig {
                load_on_startup: false,
                ..GeneIndexConfig::default()
            },
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.server.validate()?;
        self.database.validate()?;
        self.gene_index.validate()
    }
}
