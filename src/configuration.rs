use crate::auth::DEFAULT_REFRESH_TOKEN_TTL_DAYS;
use crate::error::ConfigError;

/// Only this platform may run the destructive admin reset
pub const DEV_PLATFORM: &str = "dev";

/// Upper bound for `auth.refresh_token_ttl_days`, one hundred years
pub const MAX_REFRESH_TOKEN_TTL_DAYS: i64 = 36_500;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
    #[serde(default = "default_platform")]
    pub platform: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
    /// Use the process-local stores instead of Postgres
    #[serde(default)]
    pub in_memory: bool,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

/// Token and password hashing settings
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    /// HMAC secret for access tokens
    pub secret: String,
    #[serde(default = "default_refresh_token_ttl_days")]
    pub refresh_token_ttl_days: i64,
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

impl AuthSettings {
    /// Refresh token lifetime, clamped to `1..=MAX_REFRESH_TOKEN_TTL_DAYS` days
    pub fn refresh_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(
            self.refresh_token_ttl_days
                .clamp(1, MAX_REFRESH_TOKEN_TTL_DAYS),
        )
    }
}

fn default_platform() -> String {
    "production".to_string()
}

fn default_refresh_token_ttl_days() -> i64 {
    DEFAULT_REFRESH_TOKEN_TTL_DAYS
}

fn default_bcrypt_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.secret".to_string()));
        }
        if !(4..=31).contains(&self.auth.bcrypt_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.bcrypt_cost must be between 4 and 31, got {}",
                self.auth.bcrypt_cost
            )));
        }
        if self.auth.refresh_token_ttl_days <= 0 {
            return Err(ConfigError::InvalidValue(
                "auth.refresh_token_ttl_days must be positive".to_string(),
            ));
        }
        if self.auth.refresh_token_ttl_days > MAX_REFRESH_TOKEN_TTL_DAYS {
            return Err(ConfigError::InvalidValue(format!(
                "auth.refresh_token_ttl_days must be at most {}, got {}",
                MAX_REFRESH_TOKEN_TTL_DAYS, self.auth.refresh_token_ttl_days
            )));
        }
        Ok(())
    }

    pub fn allows_reset(&self) -> bool {
        self.platform == DEV_PLATFORM
    }
}

/// Load settings from `configuration.{yaml,toml,json}` and `APP_*` variables
///
/// Nested keys use a double underscore, e.g. `APP_AUTH__SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8080_i64)?
        .set_default("database.host", "localhost")?
        .set_default("database.port", 5432_i64)?
        .set_default("database.username", "postgres")?
        .set_default("database.password", "password")?
        .set_default("database.database_name", "chirpy")?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
