//! Logging backend installation.

use std::env;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*};

/// Our crate is debug, everything else is warn.
const DEFAULT_FILTER: &str = "warn,rftk=debug";

/// Installs a `tracing` fmt subscriber. Accepts ecosystem-standard `RUST_LOG`
/// filters on top of the default. Calling it twice is harmless; the second
/// install is ignored.
pub fn init_logging() {
    let format = fmt::format().compact().with_line_number(true);
    let stdout_log = fmt::layer().event_format(format);

    let mut filter = DEFAULT_FILTER.to_owned();
    if let Ok(env_filter) = env::var(EnvFilter::DEFAULT_ENV) {
        filter.push(',');
        filter.push_str(&env_filter);
    }

    let subscriber = Registry::default()
        .with(EnvFilter::new(filter))
        .with(stdout_log);
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::debug!("log subscriber already installed");
        return;
    }
    tracing::trace!("installed log subscriber");
}
