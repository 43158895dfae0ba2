use anyhow::{Context, Result};
use std::env;

const DEFAULT_DATABASE_PATH: &str = "sites.db";

/// Runtime configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub telegram_token: String,
    pub database_path: String,
}

impl Config {
    /// Read configuration from the environment. The bot token is required;
    /// startup fails before any Telegram interaction when it is absent.
    pub fn from_env() -> Result<Self> {
        let telegram_token =
            env::var("TELEGRAM_TOKEN").context("TELEGRAM_TOKEN is not set")?;
        let database_path =
            env::var("DATABASE_PATH").unwrap_or_else(|_| DEFAULT_DATABASE_PATH.to_string());
        Ok(Self {
            telegram_token,
            database_path,
        })
    }
}
