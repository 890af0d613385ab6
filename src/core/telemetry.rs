use once_cell::sync::OnceCell;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

static INIT: OnceCell<()> = OnceCell::new();

/// Initialize logging for host applications that don't install their own
/// subscriber. Safe to call more than once; later calls are no-ops.
///
/// Respects `RUST_LOG`, defaulting to `info` for this crate.
pub fn init_logging() {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("defi_fund_client=info"));
        let subscriber = FmtSubscriber::builder().with_env_filter(filter).finish();
        // A host app may already have a global subscriber; keep ours quiet then.
        let _ = tracing::subscriber::set_global_default(subscriber);
    });
}
