use anyhow::Result;
use config::Config;
use serde::Deserialize;
use uuid::Uuid;

use crate::constants::{DEFAULT_MAX_QUERY_WINDOW_DAYS, DEFAULT_RECURRENCE_HORIZON_DAYS};
use crate::error::{CoreError, CoreResult};
use crate::types::{Attribution, Owner};

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub recurrence: RecurrenceConfig,
    pub reminders: ReminderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    SingleOwner,
    Proxy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    pub single_owner: Option<SingleOwnerAuthConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SingleOwnerAuthConfig {
    pub owner_id: Uuid,
    pub department_id: Option<Uuid>,
    pub office_id: Option<Uuid>,
    pub division_id: Option<Uuid>,
}

impl SingleOwnerAuthConfig {
    /// ## Summary
    /// Builds the owner every request is attributed to in single-owner mode.
    #[must_use]
    pub const fn owner(&self) -> Owner {
        Owner::new(self.owner_id).with_attribution(Attribution {
            department_id: self.department_id,
            office_id: self.office_id,
            division_id: self.division_id,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// ## Summary
    /// Returns the bind address in the format "host:port".
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecurrenceConfig {
    /// Days past the query window an unbounded series is expanded to.
    pub default_horizon_days: u32,
    /// Longest listing window accepted, in days.
    pub max_window_days: u32,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            default_horizon_days: DEFAULT_RECURRENCE_HORIZON_DAYS,
            max_window_days: DEFAULT_MAX_QUERY_WINDOW_DAYS,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReminderConfig {
    pub enabled: bool,
    pub hours_ahead: u32,
    pub interval_seconds: u64,
}

impl Settings {
    /// ## Summary
    /// Loads configuration from environment variables and an optional `config.toml`.
    /// Environment variables (prefixed `ALMANAC_`, nested with `__`) take precedence
    /// over file values.
    ///
    /// ## Errors
    /// Returns an error if building the configuration or deserializing it fails,
    /// or if the loaded values are rejected by [`Settings::validate`].
    pub fn load() -> Result<Self> {
        let settings = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8700)?
            .set_default("database.max_connections", 4)?
            .set_default("logging.level", "debug")?
            .set_default("auth.method", "proxy")?
            .set_default(
                "recurrence.default_horizon_days",
                i64::from(DEFAULT_RECURRENCE_HORIZON_DAYS),
            )?
            .set_default(
                "recurrence.max_window_days",
                i64::from(DEFAULT_MAX_QUERY_WINDOW_DAYS),
            )?
            .set_default("reminders.enabled", false)?
            .set_default("reminders.hours_ahead", 24)?
            .set_default("reminders.interval_seconds", 600)?
            // TOML file
            .add_source(config::File::with_name("config.toml").required(false))
            // Env (and `.env` file, loaded into the environment beforehand)
            .add_source(
                config::Environment::with_prefix("ALMANAC")
                    .prefix_separator("_")
                    .separator("__")
                    .ignore_empty(true)
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;
        settings.validate()?;
        Ok(settings)
    }

    /// ## Summary
    /// Rejects values that deserialize fine but cannot be run with.
    ///
    /// ## Errors
    /// `ConfigError` if reminders are enabled with a zero scan interval, or if
    /// the listing window limit is zero.
    pub fn validate(&self) -> CoreResult<()> {
        if self.reminders.enabled && self.reminders.interval_seconds == 0 {
            return Err(CoreError::ConfigError(
                "reminders.interval_seconds must be positive when reminders are enabled".into(),
            ));
        }
        if self.recurrence.max_window_days == 0 {
            return Err(CoreError::ConfigError(
                "recurrence.max_window_days must be positive".into(),
            ));
        }
        Ok(())
    }
}

/// ## Summary
/// Loads configuration from environment variables and `.env` file.
///
/// ## Errors
/// Returns an error if loading or deserializing the configuration fails.
pub fn load_config() -> Result<Settings> {
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!(error = %e, "No .env file loaded");
    }

    Settings::load()
}
