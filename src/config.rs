use crate::auth::ServiceAccount;
use crate::error::ConfigError;
use crate::roads::RoadTable;
use std::env;
use std::path::PathBuf;
use url::Url;

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_MAX_UPLOAD_BYTES: u64 = 16 * 1024 * 1024;
const DEFAULT_DETECTION_MODEL: &str = "./ocr/text-detection.rten";
const DEFAULT_RECOGNITION_MODEL: &str = "./ocr/text-recognition.rten";

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub service_account: ServiceAccount,
    pub database_url: Url,
    pub port: u16,
    pub roads: RoadTable,
    pub detection_model: PathBuf,
    pub recognition_model: PathBuf,
    pub max_upload_bytes: u64,
}

impl Config {
    pub fn from_env() -> Result<Config, ConfigError> {
        Config::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Config, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &'static str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(name))
        };

        let service_account =
            ServiceAccount::from_json(&required("FIREBASE_SERVICE_ACCOUNT_JSON")?)?;

        let database_url = required("FIREBASE_DATABASE_URL")?;
        let database_url = Url::parse(database_url.trim()).map_err(|e| ConfigError::Invalid {
            name: "FIREBASE_DATABASE_URL",
            reason: e.to_string(),
        })?;
        if database_url.scheme() != "https" && database_url.scheme() != "http" {
            return Err(ConfigError::Invalid {
                name: "FIREBASE_DATABASE_URL",
                reason: format!("unsupported scheme {}", database_url.scheme()),
            });
        }

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;
        let max_upload_bytes = parse_or(&lookup, "MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?;
        let roads = match lookup("ROADS") {
            Some(list) => RoadTable::parse(&list)?,
            None => RoadTable::default(),
        };

        Ok(Config {
            service_account,
            database_url,
            port,
            roads,
            detection_model: lookup("OCR_DETECTION_MODEL")
                .unwrap_or_else(|| DEFAULT_DETECTION_MODEL.to_string())
                .into(),
            recognition_model: lookup("OCR_RECOGNITION_MODEL")
                .unwrap_or_else(|| DEFAULT_RECOGNITION_MODEL.to_string())
                .into(),
            max_upload_bytes,
        })
    }
}

fn parse_or<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
