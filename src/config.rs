use sqlx::postgres::PgConnectOptions;
use std::env;
use std::fmt;
use std::str::FromStr;

use crate::auth::password::DEFAULT_BCRYPT_COST;
use crate::auth::policy::AccessMode;
use crate::error::AppError;

/// Which datastore backs the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(StorageBackend::Postgres),
            "memory" => Ok(StorageBackend::Memory),
            other => Err(format!("unknown storage backend '{}'", other)),
        }
    }
}

/// Where the Postgres database lives.
#[derive(Clone, PartialEq, Eq)]
pub enum DatabaseLocation {
    /// A full connection URL from `DATABASE_URL`.
    Url(String),
    /// Individual `DB_*` settings.
    Parts {
        host: String,
        port: u16,
        user: String,
        password: Option<String>,
        name: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseSettings {
    pub location: DatabaseLocation,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl DatabaseSettings {
    pub fn connect_options(&self) -> Result<PgConnectOptions, AppError> {
        match &self.location {
            DatabaseLocation::Url(url) => PgConnectOptions::from_str(url).map_err(|e| {
                AppError::InternalServerError(format!("Invalid DATABASE_URL: {}", e))
            }),
            DatabaseLocation::Parts {
                host,
                port,
                user,
                password,
                name,
            } => {
                let options = PgConnectOptions::new()
                    .host(host)
                    .port(*port)
                    .username(user)
                    .database(name);
                Ok(match password {
                    Some(password) => options.password(password),
                    None => options,
                })
            }
        }
    }
}

// Credentials stay out of Debug output.
impl fmt::Debug for DatabaseLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseLocation::Url(_) => f.write_str("Url(<redacted>)"),
            DatabaseLocation::Parts {
                host,
                port,
                user,
                name,
                ..
            } => f
                .debug_struct("Parts")
                .field("host", host)
                .field("port", port)
                .field("user", user)
                .field("name", name)
                .finish_non_exhaustive(),
        }
    }
}

/// Longest token lifetime accepted from `JWT_TTL_HOURS`: one hundred years.
pub const MAX_JWT_TTL_HOURS: i64 = 24 * 365 * 100;

/// A required variable was missing or a variable could not be parsed.
#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, reason } => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Process configuration, read once at startup.
#[derive(Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub storage: StorageBackend,
    /// Present whenever `storage` is `Postgres`.
    pub database: Option<DatabaseSettings>,
    pub jwt_secret: String,
    /// `None` issues tokens that never expire.
    pub jwt_ttl: Option<chrono::Duration>,
    pub bcrypt_cost: u32,
    pub access_mode: AccessMode,
    pub enforce_ownership: bool,
}

fn parse<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
    }
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<String, ConfigError> {
    lookup(key)
        .filter(|value| !value.is_empty())
        .ok_or(ConfigError::Missing(key))
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let storage = parse(&lookup, "STORAGE_BACKEND", StorageBackend::Postgres)?;
        let database = match storage {
            StorageBackend::Memory => None,
            StorageBackend::Postgres => Some(Self::database_from_lookup(&lookup)?),
        };

        let jwt_ttl = match parse::<i64>(&lookup, "JWT_TTL_HOURS", 24)? {
            0 => None,
            hours if hours < 0 => {
                return Err(ConfigError::Invalid {
                    key: "JWT_TTL_HOURS",
                    reason: "must not be negative".into(),
                })
            }
            hours if hours > MAX_JWT_TTL_HOURS => {
                return Err(ConfigError::Invalid {
                    key: "JWT_TTL_HOURS",
                    reason: format!("must be at most {}", MAX_JWT_TTL_HOURS),
                })
            }
            hours => Some(chrono::Duration::hours(hours)),
        };

        let bcrypt_cost = parse(&lookup, "BCRYPT_COST", DEFAULT_BCRYPT_COST)?;
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::Invalid {
                key: "BCRYPT_COST",
                reason: "must be between 4 and 31".into(),
            });
        }

        Ok(Self {
            server_host: lookup("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse(&lookup, "SERVER_PORT", 3000)?,
            storage,
            database,
            jwt_secret: required(&lookup, "JWT_SECRET")?,
            jwt_ttl,
            bcrypt_cost,
            access_mode: parse(&lookup, "AUTH_MODE", AccessMode::Authenticated)?,
            enforce_ownership: parse(&lookup, "ENFORCE_OWNERSHIP", false)?,
        })
    }

    fn database_from_lookup(
        lookup: &impl Fn(&str) -> Option<String>,
    ) -> Result<DatabaseSettings, ConfigError> {
        let location = match lookup("DATABASE_URL").filter(|url| !url.is_empty()) {
            Some(url) => DatabaseLocation::Url(url),
            None => DatabaseLocation::Parts {
                host: lookup("DB_HOST").unwrap_or_else(|| "localhost".to_string()),
                port: parse(lookup, "DB_PORT", 5432)?,
                user: required(lookup, "DB_USER")?,
                password: lookup("DB_PASSWORD"),
                name: required(lookup, "DB_NAME")?,
            },
        };

        Ok(DatabaseSettings {
            location,
            max_connections: parse(lookup, "DB_MAX_CONNECTIONS", 10)?,
            acquire_timeout_secs: parse(lookup, "DB_ACQUIRE_TIMEOUT_SECS", 5)?,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_host", &self.server_host)
            .field("server_port", &self.server_port)
            .field("storage", &self.storage)
            .field("database", &self.database)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_ttl", &self.jwt_ttl)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("access_mode", &self.access_mode)
            .field("enforce_ownership", &self.enforce_ownership)
            .finish()
    }
}
