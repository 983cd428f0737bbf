use std::env;
use std::path::PathBuf;

use crate::categories::{default_categories, CategoryTable};
use crate::denylist::{denylist_with_extras, AUTOMATED_VOTERS};
use crate::error::{CuratorError, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Identity and credentials
    pub bot_account: String,
    pub refresh_token: String,
    pub client_secret: String,

    // Database
    pub database_url: String,

    // Platform endpoints
    pub steem_rpc_url: String,
    pub steemconnect_host: String,

    // Run behaviour
    pub forced: bool,
    pub dry_run: bool,
    pub total_budget: f64,
    pub batch_size: usize,
    pub min_post_age_hours: i64,
    pub lookup_delay_secs: u64,
    pub lock_ttl_minutes: i64,

    pub categories: CategoryTable,
    pub denylist: Vec<String>,
}

impl Config {
    /// Load configuration from the environment (and `.env` if present).
    /// Missing identity or credentials is a configuration error.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let multiplier = parse_env("DIFFICULTY_MULTIPLIER", 3.0)?;
        let categories = match env::var("CATEGORIES_FILE").ok() {
            Some(path) => CategoryTable::from_json_file(&PathBuf::from(path))?,
            None => default_categories(multiplier),
        };

        let denylist = match env::var("BOT_DENYLIST_FILE").ok() {
            Some(path) => {
                let extra = std::fs::read_to_string(&path).map_err(|e| {
                    CuratorError::Config(format!("cannot read BOT_DENYLIST_FILE {path}: {e}"))
                })?;
                denylist_with_extras(&extra)
            }
            None => AUTOMATED_VOTERS.iter().map(|s| s.to_string()).collect(),
        };

        let config = Self {
            bot_account: required_env("BOT")?,
            refresh_token: required_env("REFRESH_TOKEN")?,
            client_secret: required_env("CLIENT_SECRET")?,
            database_url: required_env("DATABASE_URL")?,
            steem_rpc_url: env::var("STEEM_RPC_URL")
                .unwrap_or_else(|_| "https://api.steemit.com".to_string()),
            steemconnect_host: env::var("STEEMCONNECT_HOST")
                .unwrap_or_else(|_| "https://steemconnect.com".to_string()),
            forced: parse_env("FORCED", false)?,
            dry_run: parse_env("DRY_RUN", false)?,
            total_budget: parse_env("MAX_USABLE_POOL", 1000.0)?,
            batch_size: parse_env("BATCH_SIZE", 5)?,
            min_post_age_hours: parse_env("MIN_POST_AGE_HOURS", 6)?,
            lookup_delay_secs: parse_env("LOOKUP_DELAY_SECS", 3)?,
            lock_ttl_minutes: parse_env("LOCK_TTL_MINUTES", 30)?,
            categories,
            denylist,
        };

        if config.total_budget <= 0.0 {
            return Err(CuratorError::Config(
                "MAX_USABLE_POOL must be positive".to_string(),
            ));
        }
        if config.batch_size == 0 {
            return Err(CuratorError::Config("BATCH_SIZE must be at least 1".to_string()));
        }

        Ok(config)
    }

    /// Log the configuration with secrets reduced to a short preview.
    pub fn log_redacted(&self) {
        fn preview(val: &str) -> String {
            let head: String = val.chars().take(4).collect();
            format!("{head}...({} chars)", val.chars().count())
        }

        tracing::info!("Config loaded:");
        tracing::info!("  BOT: {}", self.bot_account);
        tracing::info!("  REFRESH_TOKEN: {}", preview(&self.refresh_token));
        tracing::info!("  CLIENT_SECRET: {}", preview(&self.client_secret));
        tracing::info!("  DATABASE_URL: {}", preview(&self.database_url));
        tracing::info!("  STEEM_RPC_URL: {}", self.steem_rpc_url);
        tracing::info!("  STEEMCONNECT_HOST: {}", self.steemconnect_host);
        tracing::info!(
            forced = self.forced,
            dry_run = self.dry_run,
            total_budget = self.total_budget,
            batch_size = self.batch_size,
            categories = self.categories.profiles.len(),
            denylist = self.denylist.len(),
            "  Run settings"
        );
    }
}

/// Only the database connection string, for commands that touch nothing else.
pub fn database_url_from_env() -> Result<String> {
    dotenvy::dotenv().ok();
    required_env("DATABASE_URL")
}

fn required_env(key: &str) -> Result<String> {
    match env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CuratorError::Config(format!(
            "{key} environment variable is required"
        ))),
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| CuratorError::Config(format!("{key} has an invalid value: {raw}"))),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_env_falls_back_to_default() {
        assert_eq!(parse_env("CURATOR_TEST_UNSET_KEY", 7usize).unwrap(), 7);
    }

    #[test]
    fn parse_env_rejects_garbage() {
        env::set_var("CURATOR_TEST_BAD_NUMBER", "seven");
        let err = parse_env::<usize>("CURATOR_TEST_BAD_NUMBER", 1).unwrap_err();
        assert!(matches!(err, CuratorError::Config(_)));
        env::remove_var("CURATOR_TEST_BAD_NUMBER");
    }

    #[test]
    fn database_url_loads_without_bot_credentials() {
        env::remove_var("BOT");
        env::remove_var("REFRESH_TOKEN");
        env::set_var("DATABASE_URL", "postgres://localhost/curator");
        assert_eq!(database_url_from_env().unwrap(), "postgres://localhost/curator");
        env::remove_var("DATABASE_URL");
    }

    #[test]
    fn required_env_rejects_blank() {
        env::set_var("CURATOR_TEST_BLANK", "  ");
        assert!(required_env("CURATOR_TEST_BLANK").is_err());
        env::remove_var("CURATOR_TEST_BLANK");
    }
}
