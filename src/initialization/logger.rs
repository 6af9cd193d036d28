//! Logger setup for the CLI and the HTTP server.
//!
//! Records from this crate are printed with the crate prefix stripped
//! (`fetch::cdx` rather than `wayback_redirects::fetch::cdx`). Paging and
//! scheduling chatter is held one level below the requested verbosity so
//! `--log-level debug` stays readable. `RUST_LOG` may still add directives
//! for modules not listed here.

use std::io::Write;

use chrono::{SecondsFormat, Utc};
use colored::*;
use log::{Level, LevelFilter};
use serde_json::json;

use crate::config::LogFormat;
use crate::error_handling::InitializationError;

const CRATE_TARGET: &str = "wayback_redirects";

/// Crate modules that log once per page or per scheduled item.
const CHATTY_MODULES: [&str; 3] = [
    "wayback_redirects::fetch::cdx",
    "wayback_redirects::executor",
    "wayback_redirects::health",
];

/// Dependencies that are only interesting when they fail.
const QUIET_DEPENDENCIES: [(&str, LevelFilter); 6] = [
    ("html5ever", LevelFilter::Error),
    ("selectors", LevelFilter::Warn),
    ("reqwest", LevelFilter::Warn),
    ("hyper", LevelFilter::Warn),
    ("hyper_util", LevelFilter::Warn),
    ("axum", LevelFilter::Info),
];

/// Installs the global logger at `level` in the given `format`.
///
/// Fails with [`InitializationError::LoggerError`] when a logger is already
/// installed.
pub fn init_logger_with(level: LevelFilter, format: LogFormat) -> Result<(), InitializationError> {
    let mut builder = env_logger::Builder::from_default_env();
    builder.filter_level(LevelFilter::Warn);
    for (module, filter) in module_filters(level) {
        builder.filter_module(module, filter);
    }

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{}",
                    json_line(record.level(), record.target(), &record.args().to_string())
                )
            });
        }
        LogFormat::Plain => {
            colored::control::set_override(true);
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{} {:>5} {} {}",
                    Utc::now().format("%H:%M:%S%.3f").to_string().dimmed(),
                    paint(record.level()),
                    short_target(record.target()).cyan(),
                    record.args()
                )
            });
        }
    }

    builder.try_init()?;
    Ok(())
}

/// Per-module filters for a requested crate `level`.
fn module_filters(level: LevelFilter) -> Vec<(&'static str, LevelFilter)> {
    let chatty = match level {
        LevelFilter::Trace => LevelFilter::Trace,
        LevelFilter::Debug => LevelFilter::Info,
        other => other,
    };
    let mut filters: Vec<(&'static str, LevelFilter)> = QUIET_DEPENDENCIES.to_vec();
    filters.push((CRATE_TARGET, level));
    filters.extend(CHATTY_MODULES.iter().map(|module| (*module, chatty)));
    filters
}

/// Target without the crate prefix; foreign targets are returned unchanged.
fn short_target(target: &str) -> &str {
    target
        .strip_prefix(CRATE_TARGET)
        .map(|rest| rest.trim_start_matches("::"))
        .filter(|rest| !rest.is_empty())
        .unwrap_or(target)
}

fn paint(level: Level) -> ColoredString {
    let label = level.as_str();
    match level {
        Level::Error => label.red().bold(),
        Level::Warn => label.yellow(),
        Level::Info => label.green(),
        Level::Debug => label.blue(),
        Level::Trace => label.purple(),
    }
}

/// One JSON object per record.
fn json_line(level: Level, target: &str, message: &str) -> String {
    json!({
        "ts": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        "level": level.as_str(),
        "module": short_target(target),
        "msg": message,
    })
    .to_string()
}
