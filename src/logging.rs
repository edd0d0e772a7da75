//! Logging setup

use std::env;

/// Environment variable that switches on debug logging
pub const DEBUG_ENV_VAR: &str = "THERMOCAP_DEBUG";

/// Install the global tracing subscriber
///
/// `RUST_LOG` wins over everything; otherwise the level is `debug` when
/// `debug` is set or `THERMOCAP_DEBUG` is `1`/`true`, and `info` otherwise.
/// Calling this twice is harmless.
pub fn init_logging(debug: bool) {
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| default_level(debug).to_string());

    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(env_filter))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .try_init();
}

fn default_level(debug: bool) -> &'static str {
    let from_env = env::var(DEBUG_ENV_VAR)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    if debug || from_env {
        "debug"
    } else {
        "info"
    }
}
