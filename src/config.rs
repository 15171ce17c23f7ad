//! # Logging Configuration
//!
//! The logger is configured entirely from the environment:
//!
//! - `LOG_LEVEL` selects the filter (`debug`, `info`, `warn`, `error`;
//!   default `info`)
//! - `LOG_FORMAT=json` switches to one-line JSON records; any other value
//!   keeps env_logger's human-readable format
//!
//! Records go to stdout, since the server runs as a foreground process.

use env_logger::{Builder, Env, Target};
use std::io::Write;

/// Initializes the process-wide logger from `LOG_LEVEL` and `LOG_FORMAT`.
///
/// Must be called at most once, before the first log record is emitted.
pub fn init_logging() {
    let env = Env::new().filter_or("LOG_LEVEL", "info");
    let mut builder = Builder::from_env(env);
    builder.target(Target::Stdout);

    if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        builder.format(|buf, record| {
            let line = serde_json::json!({
                "timestamp": buf.timestamp().to_string(),
                "level": record.level().to_string(),
                "message": record.args().to_string(),
                "logger": record.target(),
                "module": record.module_path(),
                "lineNo": record.line(),
            });
            writeln!(buf, "{line}")
        });
    }

    builder.init();
}
