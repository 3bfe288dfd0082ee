//! Logging init: structured events on stderr so stdout stays free for the preview.

use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "HOARDTOOL_LOG";

/// Default filter directive for a `-v` count.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "warn,hoardtool=info,hoardtool_core=info",
        _ => "info,hoardtool=debug,hoardtool_core=debug",
    }
}

/// Install the global subscriber. `HOARDTOOL_LOG` wins over the verbosity
/// default. A second call leaves the first subscriber in place.
pub fn init_logging(verbosity: u8) {
    let env_filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(false)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::{default_directive, init_logging};

    #[test]
    fn verbosity_raises_core_level() {
        assert_eq!(default_directive(0), "warn");
        assert!(default_directive(1).contains("hoardtool_core=info"));
        assert!(default_directive(5).contains("hoardtool_core=debug"));
    }

    #[test]
    fn init_twice_is_harmless() {
        init_logging(0);
        init_logging(2);
        tracing::debug!("logging initialized twice");
    }
}
