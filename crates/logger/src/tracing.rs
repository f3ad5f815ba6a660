use std::env::var;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{
    Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
    util::TryInitError,
};

/// Output format of the log layer, selected by `RUST_LOG_FORMAT`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Json,
}

impl LogFormat {
    fn from_env() -> Self {
        match var("RUST_LOG_FORMAT").unwrap_or_default().as_str() {
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

pub fn init() {
    if let Err(error) = try_init(LevelFilter::INFO) {
        ::tracing::warn!("Tracing was already initialised: {error}");
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` refines `level`; failing only if a subscriber is already set.
pub fn try_init(level: LevelFilter) -> Result<(), TryInitError> {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_layer = match LogFormat::from_env() {
        LogFormat::Json => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        LogFormat::Compact => tracing_subscriber::fmt::layer()
            .compact()
            .with_target(false)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(log_layer).try_init()
}
