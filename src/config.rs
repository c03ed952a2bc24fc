use dotenvy::dotenv;
use eyre::{Result, WrapErr, eyre};
use std::env;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::controller::SearchSettings;

pub const DEFAULT_MFAPI_BASE_URL: &str = "https://api.mfapi.in/";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_base_url: Url,
    pub http_timeout: Option<Duration>, // None keeps the transport default
    pub max_retries: u32,               // 0 means exactly one attempt per request
    pub search: SearchSettings,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup instead of the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw_base_url = lookup("MFAPI_BASE_URL").unwrap_or_else(|| DEFAULT_MFAPI_BASE_URL.to_string());
        let api_base_url = parse_base_url(&raw_base_url)?;

        let http_timeout = match lookup("HTTP_TIMEOUT_SECS") {
            Some(raw) => Some(Duration::from_secs(parse_value::<u64>("HTTP_TIMEOUT_SECS", &raw)?)),
            None => None,
        };

        let max_retries = parse_or("HTTP_MAX_RETRIES", lookup("HTTP_MAX_RETRIES"), 0u32)?;

        let defaults = SearchSettings::default();
        let debounce_ms = parse_or(
            "SEARCH_DEBOUNCE_MS",
            lookup("SEARCH_DEBOUNCE_MS"),
            defaults.debounce.as_millis() as u64,
        )?;
        let min_query_len = parse_or("SEARCH_MIN_QUERY_LEN", lookup("SEARCH_MIN_QUERY_LEN"), defaults.min_query_len)?;
        let max_results = parse_or("SEARCH_MAX_RESULTS", lookup("SEARCH_MAX_RESULTS"), defaults.max_results)?;
        if max_results == 0 {
            return Err(eyre!("SEARCH_MAX_RESULTS must be greater than zero"));
        }

        Ok(Config {
            api_base_url,
            http_timeout,
            max_retries,
            search: SearchSettings {
                debounce: Duration::from_millis(debounce_ms),
                min_query_len,
                max_results,
            },
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).wrap_err_with(|| format!("Invalid MFAPI_BASE_URL: {}", raw))?;
    if url.cannot_be_a_base() {
        return Err(eyre!("MFAPI_BASE_URL cannot be used as a base URL: {}", raw));
    }
    // Url::join drops the last segment unless the path ends with '/'
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| eyre!("Invalid {} value '{}': {}", key, raw, e))
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        Some(raw) => parse_value(key, &raw),
        None => Ok(default),
    }
}
