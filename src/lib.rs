pub mod aggregator;
pub mod analyst;
pub mod apis;
pub mod arguments;
pub mod collectors;
pub mod config;
pub mod cycle;
pub mod decision; // Resilient parsing of model output
pub mod errors;
pub mod indicators;
pub mod logger;
pub mod trader;
pub mod types;
