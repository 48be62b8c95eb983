pub mod build_info;

use std::sync::Once;

use tracing_subscriber::{filter::LevelFilter, fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Installs the global fmt subscriber; `RUST_LOG` overrides the `bank_ledger=info` default.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::builder()
            .with_default_directive(LevelFilter::WARN.into())
            .parse_lossy(
                std::env::var("RUST_LOG").unwrap_or_else(|_| "bank_ledger=info".to_string()),
            );

        // A host may already have installed its own subscriber.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
