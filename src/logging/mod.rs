use crate::logging::format::Formatter;
use std::io::IsTerminal;
use tracing::Level;
use tracing_subscriber::Layer;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

mod format;

/// Installs the global subscriber.
///
/// Events of this crate and of `tower_http` are kept down to `level`, every
/// other target is limited to warnings.
pub fn registry_logs(level: Level) -> anyhow::Result<()> {
    let app_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .event_format(Formatter::new(std::io::stdout().is_terminal()))
        .with_filter(filter::filter_fn(move |metadata| {
            let target = metadata.target();
            let ours = target.starts_with("device_registry") || target.starts_with("tower_http");
            if ours {
                metadata.level() <= &level
            } else {
                metadata.level() <= &Level::WARN
            }
        }));
    tracing_subscriber::registry()
        .with(app_layer)
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;
    Ok(())
}
