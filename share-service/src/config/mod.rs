use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct ShareServiceConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
    pub share: SharePolicyConfig,
    pub smtp: Option<SmtpConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SharePolicyConfig {
    /// Public base URL that share links are minted under.
    pub base_url: String,
    /// Upper TTL bound for new grants. Default 90 days.
    pub max_ttl_hours: i64,
    /// Per-scope caps on projected data.
    pub max_documents: i64,
    pub max_lab_results: i64,
    pub max_vitals: i64,
    /// Per-IP request budget for the public access endpoint, per minute.
    pub access_rate_per_min: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
}

impl ShareServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let smtp = match env::var("SMTP_HOST") {
            Ok(host) => Some(SmtpConfig {
                host,
                port: core_config::get_env("SMTP_PORT", Some("587"))?
                    .parse()
                    .map_err(|e| {
                        AppError::ConfigError(anyhow::anyhow!("invalid SMTP_PORT: {}", e))
                    })?,
                user: core_config::get_env("SMTP_USER", None)?,
                password: core_config::get_env("SMTP_PASSWORD", None)?,
            }),
            Err(_) => None,
        };

        Ok(ShareServiceConfig {
            common,
            mongodb: MongoConfig {
                uri: core_config::get_env("MONGODB_URI", Some("mongodb://localhost:27017"))?,
                database: core_config::get_env("MONGODB_DATABASE", Some("share_db"))?,
            },
            share: SharePolicyConfig {
                base_url: core_config::get_env("SHARE_BASE_URL", Some("http://localhost:8080"))?,
                max_ttl_hours: parse_env("SHARE_MAX_TTL_HOURS", 24 * 90)?,
                max_documents: parse_env("SHARE_MAX_DOCUMENTS", 100)?,
                max_lab_results: parse_env("SHARE_MAX_LAB_RESULTS", 100)?,
                max_vitals: parse_env("SHARE_MAX_VITALS", 50)?,
                access_rate_per_min: parse_env("SHARE_ACCESS_RATE_PER_MIN", 60)?,
            },
            smtp,
        })
    }
}

fn parse_env<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr + ToString,
    T::Err: std::fmt::Display,
{
    let raw = core_config::get_env(key, Some(&default.to_string()))?;
    raw.parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!(format!("invalid {}: {}", key, e)))
    })
}
