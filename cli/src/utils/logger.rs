use tracing::{debug, error, info, warn};
use tracing_subscriber::{
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

pub const DEFAULT_LOG_FILTER: &str = "stockpredict=info";

/// Initialize logging; `RUST_LOG` overrides `default_filter`
pub fn init_logger(default_filter: &str) -> anyhow::Result<()> {
    let format_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_timer(ChronoUtc::rfc_3339())
        .with_writer(std::io::stderr)
        .compact();

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))?;

    tracing_subscriber::registry()
        .with(env_filter)
        .with(format_layer)
        .try_init()?;

    Ok(())
}

/// Prefixes every message with a component name, e.g. `HISTORY: ...`
#[derive(Debug, Clone)]
pub struct Logger {
    context: String,
}

impl Logger {
    pub fn new(context: &str) -> Self {
        Self {
            context: context.to_string(),
        }
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn info(&self, message: &str) {
        info!("{}: {}", self.context, message);
    }

    pub fn warn(&self, message: &str) {
        warn!("{}: {}", self.context, message);
    }

    pub fn warn_with_error(&self, message: &str, error: &dyn std::error::Error) {
        warn!("{}: {}: {}", self.context, message, error);
    }

    pub fn error_with_error(&self, message: &str, error: &dyn std::error::Error) {
        error!("{}: {}: {}", self.context, message, error);
    }

    pub fn debug(&self, message: &str) {
        debug!("{}: {}", self.context, message);
    }
}

/// Performance timing helper
pub struct Timer {
    start: std::time::Instant,
    name: String,
}

impl Timer {
    pub fn start(name: &str) -> Self {
        Self {
            start: std::time::Instant::now(),
            name: name.to_string(),
        }
    }

    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    pub fn log_elapsed(&self, context: &str) {
        debug!("{}: {} completed in {:.1}ms", context, self.name, self.elapsed_ms());
    }
}
