//! Runtime settings read from the environment (and `.env`).
//!
//! | variable | meaning |
//! | - | - |
//! | `AMADEUS_API_KEY`, `AMADEUS_API_SECRET` | provider credentials (required) |
//! | `AMADEUS_HOSTNAME` | `test` (default) or `production` |
//! | `STORAGE_TARGETS` | comma-separated profile names, default `CLOUD,HOME` |
//! | `STORAGE_<NAME>_ENDPOINT`, `_ACCESS_KEY`, `_SECRET_KEY`, `_BUCKET` | one profile |
//! | `STORAGE_<NAME>_REGION` | optional, default `us-east-1` |
//! | `TELEGRAM_TOKEN`, `TELEGRAM_CHAT_ID` | optional; both or neither |
//!
//! Parsing goes through a lookup function so it can be tested without
//! touching the process environment.

use crate::data::{AmadeusCredentials, AmadeusHost};
use crate::error::AppError;
use crate::storage::StorageError;
use crate::storage::s3::{DEFAULT_REGION, StorageProfile};

pub const DEFAULT_STORAGE_TARGETS: &str = "CLOUD,HOME";

#[derive(Clone)]
pub struct TelegramConfig {
    pub token: String,
    pub chat_id: i64,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

/// A named storage target and its profile, if the profile is complete.
#[derive(Debug)]
pub struct StorageTarget {
    pub name: String,
    pub profile: Result<StorageProfile, StorageError>,
}

#[derive(Debug)]
pub struct Settings {
    pub amadeus: AmadeusCredentials,
    pub host: AmadeusHost,
    pub storage: Vec<StorageTarget>,
    pub telegram: Option<TelegramConfig>,
}

impl Settings {
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = get("AMADEUS_API_KEY")
            .ok_or_else(|| AppError::config("Missing AMADEUS_API_KEY in environment (.env)."))?;
        let api_secret = get("AMADEUS_API_SECRET")
            .ok_or_else(|| AppError::config("Missing AMADEUS_API_SECRET in environment (.env)."))?;

        let host = match get("AMADEUS_HOSTNAME") {
            Some(raw) => AmadeusHost::parse(&raw).map_err(AppError::config)?,
            None => AmadeusHost::default(),
        };

        let targets = lookup("STORAGE_TARGETS").unwrap_or_else(|| DEFAULT_STORAGE_TARGETS.to_string());
        let storage = targets
            .split(',')
            .map(|name| name.trim().to_ascii_uppercase())
            .filter(|name| !name.is_empty())
            .map(|name| StorageTarget {
                profile: storage_profile(&name, &get),
                name,
            })
            .collect();

        let telegram = match (get("TELEGRAM_TOKEN"), get("TELEGRAM_CHAT_ID")) {
            (Some(token), Some(chat_id)) => {
                let chat_id = chat_id.parse::<i64>().map_err(|_| {
                    AppError::config(format!("TELEGRAM_CHAT_ID '{chat_id}' is not an integer."))
                })?;
                Some(TelegramConfig { token, chat_id })
            }
            (None, None) => None,
            _ => {
                return Err(AppError::config(
                    "Set both TELEGRAM_TOKEN and TELEGRAM_CHAT_ID, or neither.",
                ));
            }
        };

        Ok(Self {
            amadeus: AmadeusCredentials {
                api_key,
                api_secret,
            },
            host,
            storage,
            telegram,
        })
    }
}

fn storage_profile<F>(name: &str, get: &F) -> Result<StorageProfile, StorageError>
where
    F: Fn(&str) -> Option<String>,
{
    let require = |field: &str| {
        let key = format!("STORAGE_{name}_{field}");
        get(&key).ok_or_else(|| StorageError::Config {
            profile: name.to_string(),
            missing: key,
        })
    };

    Ok(StorageProfile {
        name: name.to_string(),
        endpoint: require("ENDPOINT")?,
        access_key: require("ACCESS_KEY")?,
        secret_key: require("SECRET_KEY")?,
        bucket: require("BUCKET")?,
        region: get(&format!("STORAGE_{name}_REGION")).unwrap_or_else(|| DEFAULT_REGION.to_string()),
    })
}
