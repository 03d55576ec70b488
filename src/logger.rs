//! Tagged console logging for oraclebot
//!
//! Provides a small, ergonomic logging API with:
//! - Standard levels (Error/Warning/Info/Debug)
//! - Per-module tags so every line says which stage produced it
//! - Debug gating via --debug-<module> command-line flags
//!
//! ## Usage
//!
//! ```ignore
//! use oraclebot::logger::{self, LogTag};
//!
//! logger::info(LogTag::Trader, "decision dispatched");
//! logger::debug(LogTag::Api, "request body: ..."); // only with --debug-api
//! ```

use crate::arguments;
use chrono::Utc;
use colored::*;
use std::io::{self, Write};

/// Module tag attached to every log line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTag {
    System,
    Config,
    Collector,
    Indicator,
    Api,
    Analyst,
    Decision,
    Trader,
}

impl LogTag {
    /// Tag label shown in the log line
    pub fn as_str(&self) -> &'static str {
        match self {
            LogTag::System => "SYSTEM",
            LogTag::Config => "CONFIG",
            LogTag::Collector => "COLLECTOR",
            LogTag::Indicator => "INDICATOR",
            LogTag::Api => "API",
            LogTag::Analyst => "ANALYST",
            LogTag::Decision => "DECISION",
            LogTag::Trader => "TRADER",
        }
    }

    /// Whether debug output is enabled for this tag
    fn debug_enabled(&self) -> bool {
        if arguments::is_debug_all_enabled() {
            return true;
        }
        match self {
            // System/Config debug lines are only gated by --debug-all
            LogTag::System | LogTag::Config => false,
            LogTag::Collector => arguments::is_debug_collectors_enabled(),
            LogTag::Indicator => arguments::is_debug_indicators_enabled(),
            LogTag::Api => arguments::is_debug_api_enabled(),
            LogTag::Analyst => arguments::is_debug_analyst_enabled(),
            LogTag::Decision => arguments::is_debug_decision_enabled(),
            LogTag::Trader => arguments::is_debug_trader_enabled(),
        }
    }

    fn colored_label(&self) -> ColoredString {
        match self {
            LogTag::System => self.as_str().bold(),
            LogTag::Config => self.as_str().cyan().bold(),
            LogTag::Collector => self.as_str().blue().bold(),
            LogTag::Indicator => self.as_str().magenta().bold(),
            LogTag::Api => self.as_str().bright_green().bold(),
            LogTag::Analyst => self.as_str().cyan().bold(),
            LogTag::Decision => self.as_str().purple().bold(),
            LogTag::Trader => self.as_str().yellow().bold(),
        }
    }
}

/// Log levels ordered by severity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error = 0,
    Warning = 1,
    Info = 2,
    Debug = 3,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warning => "WARNING",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
        }
    }
}

/// Initialize the logger system
///
/// Nothing to configure today beyond the argument store, but all entry points
/// call this once at startup so gating flags are parsed before the first line.
pub fn init() {
    // Force CMD_ARGS initialization before the first log line
    let _ = arguments::get_cmd_args();
}

fn log_internal(tag: LogTag, level: LogLevel, message: &str) {
    if level == LogLevel::Debug && !tag.debug_enabled() {
        return;
    }

    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let line = match level {
        LogLevel::Error => format!(
            "{} {} {} {}",
            "❌".red().bold(),
            format!("[{}]", timestamp).dimmed(),
            tag.colored_label(),
            message.red()
        ),
        LogLevel::Warning => format!(
            "{} {} {} {}",
            "⚠".yellow().bold(),
            format!("[{}]", timestamp).dimmed(),
            tag.colored_label(),
            message.yellow()
        ),
        LogLevel::Info => format!(
            "{} {} {} {}",
            "ℹ".blue().bold(),
            format!("[{}]", timestamp).dimmed(),
            tag.colored_label(),
            message
        ),
        LogLevel::Debug => format!(
            "{} {} {} {}",
            "🐛".purple().bold(),
            format!("[{}]", timestamp).dimmed(),
            tag.colored_label(),
            message.dimmed()
        ),
    };

    println!("{}", line);
    let _ = io::stdout().flush();
}

/// Log at ERROR level (always shown, critical issues)
pub fn error(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Error, message);
}

/// Log at WARNING level (important issues)
pub fn warning(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Warning, message);
}

/// Log at INFO level (standard operations)
pub fn info(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Info, message);
}

/// Log at DEBUG level, shown only with the matching --debug-<module> flag
pub fn debug(tag: LogTag, message: &str) {
    log_internal(tag, LogLevel::Debug, message);
}
