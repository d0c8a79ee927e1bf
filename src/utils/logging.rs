use env_logger::Builder;
use log::LevelFilter;
use std::io::Write;
use std::str::FromStr;

use crate::models::packet::Protocol;

/// Dependencies that are capped at `warn` unless `RUST_LOG` says otherwise
const NOISY_TARGETS: &[&str] = &["actix_server", "actix_http", "mio"];

/// Build the logger: the crate logs at `level`, every line is tagged with
/// the monitored bus, and `RUST_LOG` directives override both.
pub fn builder(level: LevelFilter, protocol: Protocol) -> Builder {
    let mut builder = Builder::new();
    builder
        .format(move |buf, record| {
            writeln!(
                buf,
                "{} [{:<5}] {} {} - {}",
                chrono::Local::now().format("%H:%M:%S%.3f"),
                record.level(),
                protocol,
                record.target(),
                record.args()
            )
        })
        .filter(None, level);
    for target in NOISY_TARGETS {
        builder.filter(Some(*target), level.min(LevelFilter::Warn));
    }
    builder.parse_default_env();
    builder
}

/// Install the process-wide logger. A second call is ignored.
pub fn init_logger(level: LevelFilter, protocol: Protocol) {
    if builder(level, protocol).try_init().is_err() {
        log::debug!("Logger already initialised");
    }
}

/// Parse a `--log-level` value
pub fn parse_log_level(level: &str) -> Result<LevelFilter, String> {
    LevelFilter::from_str(level.trim()).map_err(|_| {
        format!(
            "unknown log level '{}', expected one of trace, debug, info, warn, error, off",
            level
        )
    })
}
