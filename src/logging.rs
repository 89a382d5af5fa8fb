//! Tracing subscriber setup for the binary
//!
//! `RUST_LOG` wins over the configured level when set. Logs go to stderr so
//! command output on stdout stays clean.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is absent
pub fn default_filter(level: &str) -> String {
    format!("coffee_monitor={},info", level)
}

pub fn init(level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(level).into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_parses() {
        assert_eq!(default_filter("debug"), "coffee_monitor=debug,info");
        assert!(EnvFilter::try_new(default_filter("info")).is_ok());
    }
}
