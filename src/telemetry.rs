use tracing::debug;
use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Installs the global subscriber. Log lines go to stderr so command output
/// on stdout stays clean. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() -> Result<(), SetGlobalDefaultError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let subscriber = Registry::default().with(env_filter).with(fmt_layer);

    tracing::subscriber::set_global_default(subscriber)?;
    debug!("tracing initialized");
    Ok(())
}
