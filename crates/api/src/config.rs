use domain::services::code_generator::default_parallelism;
use domain::services::CodeLimits;
use persistence::DatabaseConfig;
use serde::Deserialize;
use shared::hashing::{CodeHasher, HashError};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub codes: CodesConfig,
    #[serde(default)]
    pub hashing: HashingConfig,
    #[serde(default)]
    pub operator: OperatorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Listing, generation and export bounds.
#[derive(Debug, Clone, Deserialize)]
pub struct CodesConfig {
    #[serde(default = "default_page_size")]
    pub default_page_size: u32,

    #[serde(default = "default_max_page_size")]
    pub max_page_size: u32,

    #[serde(default = "default_status_filter_fetch_cap")]
    pub status_filter_fetch_cap: i64,

    #[serde(default = "default_bulk_generation_limit")]
    pub bulk_generation_limit: u32,

    #[serde(default = "default_min_custom_code_length")]
    pub min_custom_code_length: usize,

    #[serde(default = "default_export_row_cap")]
    pub export_row_cap: i64,

    #[serde(default = "default_dashboard_scan_cap")]
    pub dashboard_scan_cap: i64,

    #[serde(default = "default_max_batch_limit")]
    pub max_batch_limit: usize,
}

impl Default for CodesConfig {
    fn default() -> Self {
        Self {
            default_page_size: default_page_size(),
            max_page_size: default_max_page_size(),
            status_filter_fetch_cap: default_status_filter_fetch_cap(),
            bulk_generation_limit: default_bulk_generation_limit(),
            min_custom_code_length: default_min_custom_code_length(),
            export_row_cap: default_export_row_cap(),
            dashboard_scan_cap: default_dashboard_scan_cap(),
            max_batch_limit: default_max_batch_limit(),
        }
    }
}

/// Argon2id cost parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct HashingConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,

    #[serde(default = "default_iterations")]
    pub iterations: u32,

    #[serde(default = "default_parallelism_lanes")]
    pub parallelism: u32,

    /// Concurrent hashing tasks during bulk generation; defaults to the core count.
    #[serde(default)]
    pub max_concurrent: Option<usize>,
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism_lanes(),
            max_concurrent: None,
        }
    }
}

impl HashingConfig {
    pub fn build_hasher(&self) -> Result<CodeHasher, HashError> {
        CodeHasher::new(self.memory_kib, self.iterations, self.parallelism)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct OperatorConfig {
    /// Identity recorded on exports when no `--operator` is given.
    #[serde(default = "default_operator_identity")]
    pub default_identity: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            default_identity: default_operator_identity(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}
fn default_page_size() -> u32 {
    domain::models::DEFAULT_PAGE_SIZE
}
fn default_max_page_size() -> u32 {
    domain::models::MAX_PAGE_SIZE
}
fn default_status_filter_fetch_cap() -> i64 {
    domain::services::STATUS_FILTER_FETCH_CAP
}
fn default_bulk_generation_limit() -> u32 {
    domain::models::BULK_GENERATION_LIMIT
}
fn default_min_custom_code_length() -> usize {
    domain::models::MIN_CUSTOM_CODE_LENGTH
}
fn default_export_row_cap() -> i64 {
    domain::models::MAX_EXPORT_RECORDS
}
fn default_dashboard_scan_cap() -> i64 {
    domain::models::DASHBOARD_SCAN_CAP
}
fn default_max_batch_limit() -> usize {
    domain::services::MAX_BATCH_LIMIT
}
fn default_memory_kib() -> u32 {
    shared::hashing::DEFAULT_MEMORY_KIB
}
fn default_iterations() -> u32 {
    shared::hashing::DEFAULT_ITERATIONS
}
fn default_parallelism_lanes() -> u32 {
    shared::hashing::DEFAULT_PARALLELISM
}
fn default_operator_identity() -> String {
    "operator".to_string()
}

/// Configuration validation error
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Loading order (later sources override earlier):
    /// 1. config/default.toml - base configuration with defaults
    /// 2. config/local.toml - local overrides (optional, not in git)
    /// 3. Environment variables with AC__ prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(config::Environment::with_prefix("AC").separator("__"))
            .build()?;

        let cfg: Self = config.try_deserialize()?;
        cfg.validate()
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        Ok(cfg)
    }

    /// Load configuration for testing with custom overrides.
    ///
    /// This method creates a config entirely from defaults and overrides,
    /// without relying on config files (which may not be accessible during tests).
    #[cfg(test)]
    pub fn load_for_test(overrides: &[(&str, &str)]) -> Result<Self, config::ConfigError> {
        let defaults = r#"
            [database]
            url = ""
            max_connections = 10
            min_connections = 1
            connect_timeout_secs = 10
            idle_timeout_secs = 600
            statement_timeout_ms = 5000

            [logging]
            level = "info"
            format = "json"

            [codes]
            default_page_size = 20
            max_page_size = 50
            status_filter_fetch_cap = 1000
            bulk_generation_limit = 100
            min_custom_code_length = 6
            export_row_cap = 10000
            dashboard_scan_cap = 10000
            max_batch_limit = 100

            [hashing]
            memory_kib = 19456
            iterations = 2
            parallelism = 1

            [operator]
            default_identity = "operator"
        "#;

        let mut builder = config::Config::builder()
            .add_source(config::File::from_str(defaults, config::FileFormat::Toml));

        for (key, value) in overrides {
            builder = builder.set_override(*key, *value)?;
        }

        let cfg: Self = builder.build()?.try_deserialize()?;
        // Skip validation in tests to allow partial configs
        Ok(cfg)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if self.database.url.is_empty() {
            return Err(ConfigValidationError::MissingRequired(
                "AC__DATABASE__URL environment variable must be set".to_string(),
            ));
        }

        if self.database.min_connections > self.database.max_connections {
            return Err(ConfigValidationError::InvalidValue(
                "min_connections cannot exceed max_connections".to_string(),
            ));
        }

        let codes = &self.codes;
        let caps = [
            ("codes.default_page_size", i64::from(codes.default_page_size)),
            ("codes.max_page_size", i64::from(codes.max_page_size)),
            ("codes.status_filter_fetch_cap", codes.status_filter_fetch_cap),
            ("codes.bulk_generation_limit", i64::from(codes.bulk_generation_limit)),
            ("codes.export_row_cap", codes.export_row_cap),
            ("codes.dashboard_scan_cap", codes.dashboard_scan_cap),
            ("codes.max_batch_limit", codes.max_batch_limit as i64),
        ];
        if let Some((name, _)) = caps.iter().find(|(_, value)| *value <= 0) {
            return Err(ConfigValidationError::InvalidValue(format!(
                "{} must be positive",
                name
            )));
        }

        if codes.max_page_size > domain::models::MAX_PAGE_SIZE {
            return Err(ConfigValidationError::InvalidValue(format!(
                "codes.max_page_size cannot exceed {}",
                domain::models::MAX_PAGE_SIZE
            )));
        }

        if codes.min_custom_code_length < domain::models::MIN_CUSTOM_CODE_LENGTH {
            return Err(ConfigValidationError::InvalidValue(format!(
                "codes.min_custom_code_length must be at least {}",
                domain::models::MIN_CUSTOM_CODE_LENGTH
            )));
        }

        if codes.default_page_size > codes.max_page_size {
            return Err(ConfigValidationError::InvalidValue(
                "codes.default_page_size cannot exceed codes.max_page_size".to_string(),
            ));
        }

        if self.hashing.max_concurrent == Some(0) {
            return Err(ConfigValidationError::InvalidValue(
                "hashing.max_concurrent must be positive".to_string(),
            ));
        }

        if self.operator.default_identity.trim().is_empty() {
            return Err(ConfigValidationError::InvalidValue(
                "operator.default_identity cannot be blank".to_string(),
            ));
        }

        Ok(())
    }

    /// Service bounds derived from the `[codes]` and `[hashing]` sections.
    pub fn code_limits(&self) -> CodeLimits {
        CodeLimits {
            default_page_size: self.codes.default_page_size,
            max_page_size: self.codes.max_page_size,
            status_filter_fetch_cap: self.codes.status_filter_fetch_cap,
            bulk_generation_limit: self.codes.bulk_generation_limit,
            min_custom_code_length: self.codes.min_custom_code_length,
            export_row_cap: self.codes.export_row_cap,
            dashboard_scan_cap: self.codes.dashboard_scan_cap,
            max_batch_limit: self.codes.max_batch_limit,
            hashing_parallelism: self
                .hashing
                .max_concurrent
                .unwrap_or_else(default_parallelism),
        }
    }
}
