use std::{env::var, fmt::Display, str::FromStr};

use tracing::{info, warn};

const DEV_JWT_SECRET: &str = "dev-only-secret-change-me";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set when MONGODB_URI is configured")]
    Missing(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_addr: String,
    /// `None` runs against the in-memory store.
    pub mongodb_uri: Option<String>,
    pub mongodb_db: String,
    pub jwt_secret: String,
    pub session_ttl_secs: i64,
    pub cookie_secure: bool,
    pub bcrypt_cost: u32,
    pub admin: Option<AdminSeed>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let mongodb_uri = get("MONGODB_URI");
        let jwt_secret = match (get("JWT_SECRET"), &mongodb_uri) {
            (Some(secret), _) => secret,
            (None, Some(_)) => return Err(ConfigError::Missing("JWT_SECRET")),
            (None, None) => {
                warn!("JWT_SECRET not set, using a development secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                name: get("ADMIN_NAME").unwrap_or_else(|| "Administrator".into()),
                email,
                password,
            }),
            _ => None,
        };

        Ok(Self {
            server_addr: get("SERVER_ADDR").unwrap_or_else(|| "127.0.0.1:8080".into()),
            mongodb_uri,
            mongodb_db: get("MONGODB_DB").unwrap_or_else(|| "dealership".into()),
            jwt_secret,
            session_ttl_secs: try_load(&get, "SESSION_TTL_SECS", 3600),
            cookie_secure: try_load(&get, "COOKIE_SECURE", false),
            bcrypt_cost: try_load(&get, "BCRYPT_COST", bcrypt::DEFAULT_COST),
            admin,
        })
    }
}

fn try_load<T>(get: impl Fn(&str) -> Option<String>, key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Some(raw) = get(key) else {
        info!("{key} not set, using default: {default}");
        return default;
    };
    raw.trim().parse().unwrap_or_else(|e| {
        warn!("Invalid {key} value {raw:?}: {e}, using default: {default}");
        default
    })
}
