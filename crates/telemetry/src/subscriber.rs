use primitives::{get_pretty_print_logs, is_local_environment};
use thiserror::Error;
use tracing_subscriber::{
    fmt::MakeWriter,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to initialize: {0}")]
    Init(#[from] TryInitError),
}

type Result<T> = std::result::Result<T, TelemetryError>;

const DEFAULT_FILTER: &str = "info";

#[derive(Debug)]
pub struct TelemetrySubscriber {}

impl TelemetrySubscriber {
    /// Installs the global subscriber. `RUST_LOG` overrides the default
    /// `info` filter; `debug` lowers it for the whole process.
    pub fn init<W>(out: W, debug: bool) -> Result<()>
    where
        W: for<'s> MakeWriter<'s> + 'static + Sync + Send,
    {
        let is_local_env = is_local_environment();

        let filter = if debug {
            EnvFilter::new("debug")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
        };

        if get_pretty_print_logs() {
            let sub = tracing_subscriber::fmt()
                .with_writer(out)
                .with_env_filter(filter)
                .with_file(is_local_env)
                .with_line_number(is_local_env)
                .with_target(is_local_env)
                .compact()
                .finish();

            sub.try_init()?;
        } else {
            let sub = tracing_subscriber::fmt()
                .with_writer(out)
                .with_env_filter(filter)
                .with_file(is_local_env)
                .with_line_number(is_local_env)
                .json()
                .with_current_span(false)
                .flatten_event(true)
                .with_span_list(false)
                .finish();

            sub.try_init()?;
        }

        Ok(())
    }
}
