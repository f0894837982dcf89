use tracing::subscriber::set_global_default;
use tracing::subscriber::SetGlobalDefaultError;
use tracing::Subscriber;
use tracing_bunyan_formatter::BunyanFormattingLayer;
use tracing_bunyan_formatter::JsonStorageLayer;
use tracing_log::LogTracer;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

/// Bunyan-formatted JSON logs, filtered by `RUST_LOG` (or `filter_level` if
/// unset). `sink` is a writer factory such as `std::io::stdout` (tests pass
/// `std::io::sink` to stay quiet).
pub fn get_subscriber<Sink>(
    name: &str,
    filter_level: &str,
    sink: Sink,
) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter_level));
    Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(BunyanFormattingLayer::new(name.to_string(), sink))
}

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("could not redirect `log` records")]
    Log(#[from] tracing_log::log::SetLoggerError),
    #[error("a global subscriber was already set")]
    Subscriber(#[from] SetGlobalDefaultError),
}

/// Install `subscriber` globally. Call once, before building the app; `log`
/// records (actix, reqwest) are forwarded into it.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync) -> Result<(), TelemetryError> {
    LogTracer::init()?;
    set_global_default(subscriber)?;
    Ok(())
}
