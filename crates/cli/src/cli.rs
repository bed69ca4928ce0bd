use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{
    devnet::DevnetOpts,
    election::{ResultOpts, StartOpts, VoteOpts},
};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, arg_required_else_help(true))]
pub struct Args {
    /// Sets a custom config file
    #[clap(short, long, value_parser, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Turn debugging information on
    #[clap(short, long, default_value = "false")]
    pub debug: bool,

    #[clap(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start a new election on the contract
    Start(StartOpts),

    /// Cast a vote in an election
    Vote(VoteOpts),

    /// Print the current tally of an election
    Result(ResultOpts),

    /// Run a development node hosting the election contract
    Devnet(DevnetOpts),
}
