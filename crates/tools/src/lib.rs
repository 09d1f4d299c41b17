//! TUL Tools
//!
//! CLI tools for working with TUL programs.

use tracing_subscriber::{fmt, EnvFilter};

/// Initialize logging with a default filter.
///
/// Use the `RUST_LOG` environment variable to override the default
/// filter. Default is `info` for the compiler crates and `warn` for
/// others.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,tul_compiler=info,tul_tools=info"));

    fmt().with_env_filter(filter).with_target(false).init();
}
