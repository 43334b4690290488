use std::env;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Path on the identity provider where the signing keys are published.
pub const CERTS_PATH: &str = "/cdn-cgi/access/certs";

/// Errors raised while validating configuration at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub access: AccessMode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Anything that is not an explicit development or staging marker is production.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("development") | Some("dev") => Environment::Development,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Production,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

/// How inbound requests are admitted
#[derive(Debug, Clone)]
pub enum AccessMode {
    /// Fixed placeholder identity, no verification. Development only.
    DevBypass,
    Enforce(AccessConfig),
}

#[derive(Debug, Clone)]
pub struct AccessConfig {
    /// Identity provider host, e.g. `team.cloudflareaccess.com`
    pub team_domain: String,
    pub root_audience: String,
    pub subdomain_audience: String,
    /// Normalized apex domains: lowercase, no trailing dot
    pub root_domains: Vec<String>,
    pub key_cache_ttl: Duration,
    pub key_refresh_interval: Duration,
    pub key_fetch_timeout: Duration,
}

impl AccessConfig {
    /// Expected `iss` claim
    pub fn issuer(&self) -> String {
        format!("https://{}", self.team_domain)
    }

    pub fn certs_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&format!("https://{}{}", self.team_domain, CERTS_PATH)).map_err(|e| {
            ConfigError::Invalid {
                key: "ACCESS_TEAM_DOMAIN",
                reason: e.to_string(),
            }
        })
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build and validate configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let environment = Environment::parse(get("APP_ENV").or_else(|| get("NODE_ENV")).as_deref());

        let server = ServerConfig {
            port: parse_or("PORT", get("PORT"), 3000)?,
        };

        let database = DatabaseConfig {
            url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            max_connections: parse_or("DATABASE_MAX_CONNECTIONS", get("DATABASE_MAX_CONNECTIONS"), 10)?,
            connection_timeout: parse_or("DATABASE_CONNECTION_TIMEOUT", get("DATABASE_CONNECTION_TIMEOUT"), 10)?,
        };

        let access = match environment {
            Environment::Development => AccessMode::DevBypass,
            Environment::Staging | Environment::Production => AccessMode::Enforce(AccessConfig {
                team_domain: normalize_team_domain(
                    &get("ACCESS_TEAM_DOMAIN").ok_or(ConfigError::Missing("ACCESS_TEAM_DOMAIN"))?,
                )?,
                root_audience: required(&get, "ACCESS_ROOT_AUDIENCE")?,
                subdomain_audience: required(&get, "ACCESS_SUBDOMAIN_AUDIENCE")?,
                root_domains: parse_root_domains(
                    &get("ACCESS_ROOT_DOMAINS").ok_or(ConfigError::Missing("ACCESS_ROOT_DOMAINS"))?,
                )?,
                key_cache_ttl: Duration::from_secs(parse_or(
                    "ACCESS_KEY_CACHE_TTL_SECS",
                    get("ACCESS_KEY_CACHE_TTL_SECS"),
                    3600,
                )?),
                key_refresh_interval: Duration::from_secs(parse_or(
                    "ACCESS_KEY_REFRESH_INTERVAL_SECS",
                    get("ACCESS_KEY_REFRESH_INTERVAL_SECS"),
                    30,
                )?),
                key_fetch_timeout: Duration::from_secs(parse_or(
                    "ACCESS_KEY_FETCH_TIMEOUT_SECS",
                    get("ACCESS_KEY_FETCH_TIMEOUT_SECS"),
                    5,
                )?),
            }),
        };

        Ok(Self {
            environment,
            server,
            database,
            access,
        })
    }
}

fn required<G>(get: &G, key: &'static str) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(key).map(|v| v.trim().to_string()).ok_or(ConfigError::Missing(key))
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

fn normalize_team_domain(raw: &str) -> Result<String, ConfigError> {
    let domain = raw
        .trim()
        .trim_start_matches("https://")
        .trim_end_matches('/')
        .to_ascii_lowercase();

    if domain.is_empty() || domain.contains('/') || domain.contains(char::is_whitespace) {
        return Err(ConfigError::Invalid {
            key: "ACCESS_TEAM_DOMAIN",
            reason: format!("'{}' is not a bare hostname", raw),
        });
    }
    Ok(domain)
}

/// Split a comma-separated domain list into normalized entries
pub fn parse_root_domains(raw: &str) -> Result<Vec<String>, ConfigError> {
    let domains: Vec<String> = raw
        .split(',')
        .map(|d| d.trim().trim_end_matches('.').to_ascii_lowercase())
        .filter(|d| !d.is_empty())
        .collect();

    if domains.is_empty() {
        return Err(ConfigError::Invalid {
            key: "ACCESS_ROOT_DOMAINS",
            reason: "no domains listed".to_string(),
        });
    }
    Ok(domains)
}
