use anyhow::{Result, anyhow};
use std::env;

use crate::utils::ExtractMode;

pub const DEFAULT_API_URL: &str = "https://www.masslottery.com/api/v1/instant-game-prizes";
pub const DEFAULT_DB_PATH: &str = "data/lottery.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub api_url: String,
    pub extract_mode: ExtractMode,
    pub log_filter: String,
}

/// Reads settings from the environment, after loading a `.env` file when
/// one is present.
pub fn load() -> Result<Config> {
    dotenv::dotenv().ok();
    from_lookup(|key| env::var(key).ok())
}

fn from_lookup<F>(lookup: F) -> Result<Config>
where
    F: Fn(&str) -> Option<String>,
{
    let database_url = lookup("LOTTO_DB_PATH").unwrap_or_else(|| DEFAULT_DB_PATH.to_string());
    let api_url = lookup("LOTTO_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let extract_mode = match lookup("LOTTO_EXTRACT_MODE") {
        Some(raw) => raw.parse::<ExtractMode>().map_err(|e| anyhow!(e))?,
        None => ExtractMode::default(),
    };
    let log_filter = lookup("LOTTO_LOG").unwrap_or_else(|| "info".to_string());

    Ok(Config {
        database_url,
        api_url,
        extract_mode,
        log_filter,
    })
}
