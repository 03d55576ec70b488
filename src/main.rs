use oraclebot::{
    apis::{llm::openai::OpenAiClient, signals::SignalClient, upbit::UpbitClient},
    arguments::{is_help_requested, is_once_enabled, print_help},
    config::Config,
    cycle::{self, CycleDeps},
    logger::{self, LogTag},
};
use std::time::Duration;

/// Main entry point for oraclebot
///
/// Loads `.env`, builds the provider clients once, then runs trading cycles
/// strictly in sequence: a cycle finishes (or fails) before the next one is
/// scheduled. `--once` runs a single cycle and exits, which is the mode used
/// for supervised dry runs.
#[tokio::main]
async fn main() {
    // .env is optional; a missing file just means the real environment is used
    dotenv::dotenv().ok();

    logger::init();

    if is_help_requested() {
        print_help();
        std::process::exit(0);
    }

    logger::info(LogTag::System, "🚀 oraclebot starting up...");

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            logger::error(LogTag::Config, &format!("configuration error: {:#}", e));
            std::process::exit(1);
        }
    };
    logger::info(
        LogTag::Config,
        &format!(
            "pair={} model={} interval={}s",
            config.pair, config.openai_model, config.cycle_interval_secs
        ),
    );

    let exchange = match UpbitClient::new(
        config.upbit_access_key.clone(),
        config.upbit_secret_key.clone(),
    ) {
        Ok(client) => client,
        Err(e) => {
            logger::error(LogTag::Api, &format!("exchange client init failed: {}", e));
            std::process::exit(1);
        }
    };
    let llm = match OpenAiClient::new(config.openai_api_key.clone()) {
        Ok(client) => client,
        Err(e) => {
            logger::error(LogTag::Api, &format!("llm client init failed: {}", e));
            std::process::exit(1);
        }
    };
    let signals = match SignalClient::new(config.cryptopanic_api_key.clone()) {
        Ok(client) => client,
        Err(e) => {
            logger::error(LogTag::Api, &format!("signal client init failed: {}", e));
            std::process::exit(1);
        }
    };

    let deps = CycleDeps {
        exchange: &exchange,
        llm: &llm,
        signals: &signals,
    };

    if is_once_enabled() {
        logger::info(LogTag::System, "single-cycle mode (--once)");
        match cycle::run_cycle(&config, &deps).await {
            Ok(outcome) => {
                logger::info(
                    LogTag::System,
                    &format!("cycle finished: decision={}", outcome.decision.decision),
                );
                std::process::exit(0);
            }
            Err(e) => {
                logger::error(LogTag::System, &format!("cycle failed: {}", e));
                std::process::exit(1);
            }
        }
    }

    loop {
        // A failed cycle is not retried early; the next scheduled cycle is
        // the retry
        if let Err(e) = cycle::run_cycle(&config, &deps).await {
            logger::error(LogTag::System, &format!("cycle failed: {}", e));
        }

        logger::info(
            LogTag::System,
            &format!("sleeping {}s until next cycle", config.cycle_interval_secs),
        );
        tokio::time::sleep(Duration::from_secs(config.cycle_interval_secs)).await;
    }
}
