//! Cognate Tools
//!
//! CLI tools for working with LDSL programs.

use tracing_subscriber::{EnvFilter, fmt};

/// Initialize logging with a default filter.
///
/// Use `RUST_LOG` environment variable to override the default filter.
/// Default is `info` for cognate crates and `warn` for others.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(
            "warn,cognate_tools=info,cognate_revision=info,cognate_trainer=info,cognate_compiler=info",
        )
    });

    fmt().with_env_filter(filter).with_target(false).init();
}
