use std::path::Path;

use config::{Config, Environment, File};
use coordinator::CoordinatorConfig;
use telemetry::debug;

use crate::result::Result;

const ENV_PREFIX: &str = "BALLOT";

/// Builds the coordinator configuration. Unset keys keep their defaults,
/// `BALLOT_*` variables override the file.
pub fn load(path: Option<&Path>) -> Result<CoordinatorConfig> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        debug!(path = %path.display(), "reading config file");
        builder = builder.add_source(File::from(path).required(true));
    }

    let config = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()?
        .try_deserialize::<CoordinatorConfig>()?;

    Ok(config)
}
