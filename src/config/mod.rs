use std::env;
use std::num::ParseIntError;
use std::time::Duration;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the audit engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub environment: AppEnvironment,
    pub tolerance: ToleranceConfig,
    pub batch: BatchPacing,
    pub telemetry: TelemetryConfig,
}

impl EngineConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("AUDIT_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let tolerance = ToleranceConfig {
            amount_cents: env_i64("AUDIT_AMOUNT_TOLERANCE_CENTS", 5)?,
            date_window_days: env_i64("AUDIT_DATE_TOLERANCE_DAYS", 2)?,
            timestamp_window_minutes: env_i64("AUDIT_TIMESTAMP_TOLERANCE_MINUTES", 30)?,
            common_fees_cents: env_fee_table("AUDIT_COMMON_FEES_CENTS")?,
        };

        let batch = BatchPacing {
            inter_request_delay: Duration::from_secs(env_u64("AUDIT_BATCH_DELAY_SECS", 20)?),
            rate_limit_pause: Duration::from_secs(env_u64("AUDIT_RATE_LIMIT_PAUSE_SECS", 60)?),
            max_retries: env_u64("AUDIT_BATCH_MAX_RETRIES", 1)? as u32,
            jitter: Duration::from_millis(env_u64("AUDIT_BATCH_JITTER_MS", 500)?),
        };

        let log_level = env::var("AUDIT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            tolerance,
            batch,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Numeric tolerances applied when matching a claimed payment against bank
/// transactions. All currency values are integer centavos.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToleranceConfig {
    pub amount_cents: i64,
    pub date_window_days: i64,
    pub timestamp_window_minutes: i64,
    /// Common boleto service charges a payer may have absorbed on top of the
    /// settled amount.
    pub common_fees_cents: Vec<i64>,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            amount_cents: 5,
            date_window_days: 2,
            timestamp_window_minutes: 30,
            common_fees_cents: vec![250, 300, 150, 500],
        }
    }
}

/// Pacing applied by the batch coordinator when the supplier directory is
/// rate limited.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPacing {
    /// Delay between consecutive lookups on a free-tier credential.
    pub inter_request_delay: Duration,
    /// Base pause after the directory signals an explicit rate limit; grows
    /// exponentially across retries of the same item.
    pub rate_limit_pause: Duration,
    /// Hard ceiling on rate-limit retries per item.
    pub max_retries: u32,
    /// Upper bound of the random jitter added to each backoff pause.
    pub jitter: Duration,
}

impl Default for BatchPacing {
    fn default() -> Self {
        Self {
            inter_request_delay: Duration::from_secs(20),
            rate_limit_pause: Duration::from_secs(60),
            max_retries: 1,
            jitter: Duration::from_millis(500),
        }
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid integer in {variable}: {source}")]
    InvalidInteger {
        variable: &'static str,
        source: ParseIntError,
    },
    #[error("empty fee table in {variable}")]
    EmptyFeeTable { variable: &'static str },
}

fn env_i64(variable: &'static str, default: i64) -> Result<i64, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<i64>()
            .map_err(|source| ConfigError::InvalidInteger { variable, source }),
        Err(_) => Ok(default),
    }
}

fn env_u64(variable: &'static str, default: u64) -> Result<u64, ConfigError> {
    match env::var(variable) {
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .map_err(|source| ConfigError::InvalidInteger { variable, source }),
        Err(_) => Ok(default),
    }
}

fn env_fee_table(variable: &'static str) -> Result<Vec<i64>, ConfigError> {
    match env::var(variable) {
        Ok(raw) => {
            let fees = raw
                .split(',')
                .map(|part| {
                    part.trim()
                        .parse::<i64>()
                        .map_err(|source| ConfigError::InvalidInteger { variable, source })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if fees.is_empty() {
                return Err(ConfigError::EmptyFeeTable { variable });
            }
            Ok(fees)
        }
        Err(_) => Ok(ToleranceConfig::default().common_fees_cents),
    }
}
