pub mod config;
pub mod devnet;
pub mod election;

use serde::Serialize;

use crate::{
    cli::{Args, Commands},
    result::{CliError, Result},
};

pub async fn exec(args: Args) -> Result<()> {
    telemetry::debug!("args: {:?}", args);

    let config = config::load(args.config.as_deref())?;

    match args.command {
        Some(Commands::Start(opts)) => election::start(config, opts).await,
        Some(Commands::Vote(opts)) => election::vote(config, opts).await,
        Some(Commands::Result(opts)) => election::result(config, opts).await,
        Some(Commands::Devnet(opts)) => devnet::exec(config, opts).await,
        None => Err(CliError::NoSubcommand),
    }
}

pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);

    Ok(())
}
