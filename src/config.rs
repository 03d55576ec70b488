use anyhow::{Context, Result};
use std::env;

/// Default trading pair (Upbit market code, quote-base order)
pub const DEFAULT_PAIR: &str = "KRW-BTC";

/// Default reasoning model
pub const DEFAULT_MODEL: &str = "gpt-4.1";

/// Default pause between trading cycles, seconds
pub const DEFAULT_CYCLE_INTERVAL_SECS: u64 = 600;

/// Runtime configuration, sourced from the environment at startup.
///
/// Credentials are never read from globals after this point: the struct is
/// built once in main and passed to the component constructors explicitly.
#[derive(Debug, Clone)]
pub struct Config {
    /// Upbit API key pair
    pub upbit_access_key: String,
    pub upbit_secret_key: String,
    /// Reasoning service credential
    pub openai_api_key: String,
    /// Reasoning model identifier
    pub openai_model: String,
    /// Signal provider credential (headlines). The sentiment index endpoint
    /// is keyless, so this stays optional.
    pub cryptopanic_api_key: Option<String>,
    /// Target trading pair, e.g. "KRW-BTC"
    pub pair: String,
    /// Seconds between trading cycles
    pub cycle_interval_secs: u64,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// `.env` loading (dotenv) is done by the caller before this runs, so the
    /// same loader works in tests with a plain env.
    pub fn from_env() -> Result<Self> {
        let upbit_access_key = env::var("UPBIT_ACCESS_KEY")
            .context("UPBIT_ACCESS_KEY is not set")?;
        let upbit_secret_key = env::var("UPBIT_SECRET_KEY")
            .context("UPBIT_SECRET_KEY is not set")?;
        let openai_api_key = env::var("OPENAI_API_KEY")
            .context("OPENAI_API_KEY is not set")?;

        let openai_model =
            env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        let cryptopanic_api_key = env::var("CRYPTOPANIC_API_KEY").ok();

        let pair = crate::arguments::get_pair_override()
            .or_else(|| env::var("TRADING_PAIR").ok())
            .unwrap_or_else(|| DEFAULT_PAIR.to_string());

        let cycle_interval_secs = match env::var("CYCLE_INTERVAL_SECS") {
            Ok(raw) => raw
                .parse::<u64>()
                .with_context(|| format!("CYCLE_INTERVAL_SECS is not a number: {}", raw))?,
            Err(_) => DEFAULT_CYCLE_INTERVAL_SECS,
        };

        let config = Self {
            upbit_access_key,
            upbit_secret_key,
            openai_api_key,
            openai_model,
            cryptopanic_api_key,
            pair,
            cycle_interval_secs,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.upbit_access_key.trim().is_empty() {
            anyhow::bail!("UPBIT_ACCESS_KEY is empty");
        }
        if self.upbit_secret_key.trim().is_empty() {
            anyhow::bail!("UPBIT_SECRET_KEY is empty");
        }
        if self.openai_api_key.trim().is_empty() {
            anyhow::bail!("OPENAI_API_KEY is empty");
        }
        if !self.pair.contains('-') {
            anyhow::bail!(
                "TRADING_PAIR must be a market code like KRW-BTC, got: {}",
                self.pair
            );
        }
        Ok(())
    }

    /// Base currency of the configured pair ("BTC" for "KRW-BTC")
    pub fn base_currency(&self) -> &str {
        self.pair.split('-').nth(1).unwrap_or(&self.pair)
    }

    /// Quote currency of the configured pair ("KRW" for "KRW-BTC")
    pub fn quote_currency(&self) -> &str {
        self.pair.split('-').next().unwrap_or(&self.pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_split() {
        let config = Config {
            upbit_access_key: "a".to_string(),
            upbit_secret_key: "s".to_string(),
            openai_api_key: "k".to_string(),
            openai_model: DEFAULT_MODEL.to_string(),
            cryptopanic_api_key: None,
            pair: "KRW-BTC".to_string(),
            cycle_interval_secs: DEFAULT_CYCLE_INTERVAL_SECS,
        };

        assert_eq!(config.base_currency(), "BTC");
        assert_eq!(config.quote_currency(), "KRW");
    }

    #[test]
    fn test_validate_rejects_bad_pair() {
        let config = Config {
            upbit_access_key: "a".to_string(),
            upbit_secret_key: "s".to_string(),
            openai_api_key: "k".to_string(),
            openai_model: DEFAULT_MODEL.to_string(),
            cryptopanic_api_key: None,
            pair: "BTCKRW".to_string(),
            cycle_interval_secs: DEFAULT_CYCLE_INTERVAL_SECS,
        };

        assert!(config.validate().is_err());
    }
}
