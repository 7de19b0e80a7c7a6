use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt};

static TRACING_INIT: Once = Once::new();

const DEFAULT_DIRECTIVE: &str = "condo_payments=info";

/// Installs a global fmt subscriber honoring `RUST_LOG`. Safe to call repeatedly;
/// only the first call has an effect, and an already installed subscriber wins.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        let _ = fmt().with_env_filter(filter).try_init();
    });
}
