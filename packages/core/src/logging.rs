//! Tracing subscriber setup
//!
//! Logs go to stderr so stdout stays free for the procedure stream.

use tracing_subscriber::EnvFilter;

/// Install the global fmt subscriber
///
/// `RUST_LOG` wins when set; otherwise `default_filter` applies. Calling this
/// more than once is harmless: later calls leave the first subscriber in place
/// and return `false`.
pub fn init_logging(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_tolerated() {
        init_logging("warn");
        assert!(!init_logging("debug"));
    }
}
