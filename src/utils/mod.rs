use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "expense_engine=info";

/// Initializes the global tracing subscriber.
///
/// `directive` overrides the default `expense_engine=info`; an unparsable
/// directive falls back to the default.
pub fn init_tracing(directive: Option<&str>) {
    TRACING_INIT.call_once(|| {
        let _ = fmt().with_env_filter(build_filter(directive)).try_init();
    });
}

/// `RUST_LOG` plus one extra directive.
pub fn build_filter(directive: Option<&str>) -> EnvFilter {
    let filter = EnvFilter::from_default_env();
    let parsed = directive
        .and_then(|raw| raw.trim().parse().ok())
        .or_else(|| DEFAULT_DIRECTIVE.parse().ok());
    match parsed {
        Some(directive) => filter.add_directive(directive),
        None => filter,
    }
}
