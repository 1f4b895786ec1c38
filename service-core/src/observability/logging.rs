use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber for a service binary.
///
/// `RUST_LOG` overrides the default directive. Safe to call once per
/// process; later calls are ignored.
pub fn init_tracing(service_name: &str, default_level: &str) {
    // Env-filter targets use the crate name, not the binary name.
    let target = service_name.replace('-', "_");
    let directive = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| format!("{},{}=debug", default_level, target));

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(directive))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
