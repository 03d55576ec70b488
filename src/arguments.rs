/// Centralized argument handling for oraclebot
///
/// Consolidates command-line argument parsing and debug flag checking so the
/// logger and the runtime can query flags without re-parsing `env::args()`.
///
/// Features:
/// - Centralized CMD_ARGS storage with thread-safe access
/// - Per-module debug flag checks (--debug-<module>)
/// - Run-mode flags (--once) and value flags (--pair)
use once_cell::sync::Lazy;
use std::env;
use std::sync::Mutex;

/// Global command-line arguments storage
/// Thread-safe singleton that stores arguments for access throughout the application
pub static CMD_ARGS: Lazy<Mutex<Vec<String>>> = Lazy::new(|| Mutex::new(env::args().collect()));

/// Sets the global command-line arguments
/// Used by tests to override the default env::args() collection
pub fn set_cmd_args(args: Vec<String>) {
    if let Ok(mut cmd_args) = CMD_ARGS.lock() {
        *cmd_args = args;
    }
}

/// Gets a copy of the current command-line arguments
pub fn get_cmd_args() -> Vec<String> {
    match CMD_ARGS.lock() {
        Ok(args) => args.clone(),
        Err(_) => {
            // Fallback to env::args if mutex is poisoned
            env::args().collect()
        }
    }
}

/// Checks if a specific argument is present in the command line
pub fn has_arg(arg: &str) -> bool {
    get_cmd_args().iter().any(|a| a == arg)
}

/// Gets the value of a command-line argument that follows a flag
/// Returns None if the flag is not found or has no value
pub fn get_arg_value(flag: &str) -> Option<String> {
    let args = get_cmd_args();
    for (i, arg) in args.iter().enumerate() {
        if arg == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
    }
    None
}

// =============================================================================
// RUN MODE FLAGS
// =============================================================================

/// Single-cycle mode: run one trading cycle and exit
pub fn is_once_enabled() -> bool {
    has_arg("--once")
}

/// Help requested
pub fn is_help_requested() -> bool {
    has_arg("--help") || has_arg("-h")
}

/// Trading pair override (otherwise taken from TRADING_PAIR / default)
pub fn get_pair_override() -> Option<String> {
    get_arg_value("--pair")
}

// =============================================================================
// DEBUG FLAG CHECKING FUNCTIONS
// =============================================================================

/// Collector modules debug mode
pub fn is_debug_collectors_enabled() -> bool {
    has_arg("--debug-collectors")
}

/// Indicator engine debug mode
pub fn is_debug_indicators_enabled() -> bool {
    has_arg("--debug-indicators")
}

/// API calls debug mode
pub fn is_debug_api_enabled() -> bool {
    has_arg("--debug-api")
}

/// Analyst (prompt/LLM) debug mode
pub fn is_debug_analyst_enabled() -> bool {
    has_arg("--debug-analyst")
}

/// Decision parser debug mode
pub fn is_debug_decision_enabled() -> bool {
    has_arg("--debug-decision")
}

/// Trader module debug mode
pub fn is_debug_trader_enabled() -> bool {
    has_arg("--debug-trader")
}

/// All-module debug mode
pub fn is_debug_all_enabled() -> bool {
    has_arg("--debug-all")
}

/// Print usage information
pub fn print_help() {
    println!("oraclebot - LLM decision-support trading pipeline");
    println!();
    println!("USAGE:");
    println!("  oraclebot [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("  --once             Run a single trading cycle and exit");
    println!("  --pair <PAIR>      Trading pair override (default KRW-BTC)");
    println!("  --debug-<module>   Enable debug logs for a module");
    println!("                     (collectors, indicators, api, analyst, decision, trader)");
    println!("  --debug-all        Enable debug logs for every module");
    println!("  -h, --help         Show this help");
}
