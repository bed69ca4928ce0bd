use clap::Parser;
use coordinator::{
    query_result, CancellationToken, CoordinatorConfig, ElectionCoordinator, Response, Submitted,
    TallyView,
};
use election_rpc::RpcContractBinding;
use primitives::{CandidateId, ElectionId, VoteRequest, VoterKey};
use serde::Serialize;
use telemetry::info;
use wallet::EnvCredentials;

use crate::{
    commands::print_json,
    result::{CliError, Result},
};

#[derive(Parser, Debug)]
pub struct StartOpts {
    /// Identifier the contract expects for the new election
    #[clap(value_parser)]
    pub election_id: u64,
}

#[derive(Parser, Debug)]
pub struct VoteOpts {
    #[clap(value_parser)]
    pub election_id: u64,

    /// Candidate to vote for, omitted votes are tallied by the contract
    #[clap(long, value_parser)]
    pub candidate: Option<u64>,

    /// Deduplication key, derived from the signing identity when not given
    #[clap(long, value_parser)]
    pub voter_key: Option<String>,
}

#[derive(Parser, Debug)]
pub struct ResultOpts {
    #[clap(value_parser)]
    pub election_id: u64,
}

/// Cancels the returned token on Ctrl-C. Submissions already on their way
/// still complete.
fn cancel_on_interrupt() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupted, cancelling");
            token.cancel();
        }
    });

    cancel
}

async fn connect(
    config: CoordinatorConfig,
) -> std::result::Result<ElectionCoordinator, Response<Submitted>> {
    ElectionCoordinator::connect(config, &EnvCredentials::default())
        .await
        .map_err(|err| Response::from(Err::<Submitted, _>(err)))
}

fn report<T: Serialize>(response: Response<T>) -> Result<()> {
    print_json(&response)?;

    match response {
        Response::Ok(_) => Ok(()),
        Response::Err(report) => Err(CliError::OperationFailed(report.error_kind)),
    }
}

pub async fn start(config: CoordinatorConfig, opts: StartOpts) -> Result<()> {
    let coordinator = match connect(config).await {
        Ok(coordinator) => coordinator,
        Err(response) => return report(response),
    };

    let response = coordinator
        .start_election_response(ElectionId(opts.election_id), &cancel_on_interrupt())
        .await;

    report(response)
}

pub async fn vote(config: CoordinatorConfig, opts: VoteOpts) -> Result<()> {
    let coordinator = match connect(config).await {
        Ok(coordinator) => coordinator,
        Err(response) => return report(response),
    };

    let election_id = ElectionId(opts.election_id);
    let voter_key = opts
        .voter_key
        .map(VoterKey::new)
        .unwrap_or_else(|| coordinator.voter_key(election_id));

    let mut request = VoteRequest::new(election_id, voter_key);
    if let Some(candidate) = opts.candidate {
        request = request.with_candidate(CandidateId(candidate));
    }

    let response = coordinator
        .vote_response(request, &cancel_on_interrupt())
        .await;

    report(response)
}

/// Reads go straight to the binding, no credential is loaded.
pub async fn result(config: CoordinatorConfig, opts: ResultOpts) -> Result<()> {
    let binding = RpcContractBinding::new(
        config.rpc_url.clone(),
        config.contract_address,
        config.request_timeout(),
    );

    let response: Response<TallyView> = query_result(&binding, ElectionId(opts.election_id))
        .await
        .map(TallyView::from)
        .into();

    report(response)
}
