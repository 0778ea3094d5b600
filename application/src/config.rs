//! [`Config`]-related definitions.

use std::time;

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Display, Error};
use secrecy::{ExposeSecret as _, SecretBox, SecretString};
use serde::Deserialize;
use service::{
    command::CreateSuperAdmin,
    domain::account::{DisplayName, Password, Username},
    infra::cache::redis,
};
use smart_default::SmartDefault;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Service configuration.
    pub service: Service,

    /// Postgres configuration.
    pub postgres: Postgres,

    /// Redis configuration.
    pub redis: Redis,

    /// Super-admin account configuration.
    pub super_admin: SuperAdmin,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[default(SecretString::from("secret"))]
    pub jwt_secret: SecretString,

    /// Time an account session lives for.
    #[default(service::Config::DEFAULT_SESSION_TTL)]
    #[serde(with = "humantime_serde")]
    pub session_ttl: time::Duration,
}

impl From<Service> for service::Config {
    fn from(value: Service) -> Self {
        let Service {
            jwt_secret,
            session_ttl,
        } = value;
        Self::from_secret(jwt_secret.expose_secret().as_bytes(), session_ttl)
    }
}

/// Postgres configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Postgres {
    /// Host to connect to.
    #[default("127.0.0.1".to_owned())]
    pub host: String,

    /// Port to connect to.
    #[default(5432)]
    pub port: u16,

    /// User to connect as.
    #[default("postgres".to_owned())]
    pub user: String,

    /// Password to connect with.
    #[default("postgres".to_owned())]
    pub password: String,

    /// Database name to connect to.
    #[default("postgres".to_owned())]
    pub dbname: String,
}

impl From<Postgres> for service::infra::postgres::Config {
    fn from(value: Postgres) -> Self {
        let Postgres {
            host,
            port,
            user,
            password,
            dbname,
        } = value;

        Self {
            host: Some(host),
            port: Some(port),
            user: Some(user),
            password: Some(password),
            dbname: Some(dbname),
            ..Self::default()
        }
    }
}

/// Redis configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Redis {
    /// URL to connect to.
    #[default("redis://127.0.0.1:6379".to_owned())]
    pub url: String,

    /// Maximum number of pooled connections.
    #[default(16)]
    pub pool_size: usize,
}

impl From<Redis> for redis::Config {
    fn from(value: Redis) -> Self {
        let Redis { url, pool_size } = value;

        let mut conf = Self::from_url(url);
        conf.pool = Some(redis::PoolConfig::new(pool_size));
        conf
    }
}

/// Super-admin account configuration.
///
/// The account is created on startup unless it exists already.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct SuperAdmin {
    /// Username of the super-admin.
    #[default("admin".to_owned())]
    pub username: String,

    /// Password of the super-admin.
    #[default(SecretString::from("admin"))]
    pub password: SecretString,

    /// Display name of the super-admin.
    #[default("Super Admin".to_owned())]
    pub display_name: String,
}

impl TryFrom<SuperAdmin> for CreateSuperAdmin {
    type Error = InvalidField;

    fn try_from(value: SuperAdmin) -> Result<Self, Self::Error> {
        let SuperAdmin {
            username,
            password,
            display_name,
        } = value;

        Ok(Self {
            username: Username::new(username)
                .ok_or(InvalidField("super_admin.username"))?,
            password: Password::new(password.expose_secret())
                .map(|p| SecretBox::new(Box::new(p)))
                .ok_or(InvalidField("super_admin.password"))?,
            display_name: DisplayName::new(display_name)
                .ok_or(InvalidField("super_admin.display_name"))?,
        })
    }
}

/// Configured value is not valid.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("invalid `{_0}` value")]
pub struct InvalidField(#[error(not(source))] pub &'static str);

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}
