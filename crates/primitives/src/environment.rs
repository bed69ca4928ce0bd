pub const BALLOT_ENVIRONMENT_VAR_NAME: &str = "BALLOT_ENVIRONMENT";
pub const BALLOT_PRETTY_PRINT_LOGS_VAR_NAME: &str = "BALLOT_PRETTY_PRINT_LOGS";
pub const BALLOT_PRIVATE_KEY_VAR_NAME: &str = "BALLOT_PRIVATE_KEY";

/// True unless `BALLOT_ENVIRONMENT` names a deployed network.
pub fn is_local_environment() -> bool {
    std::env::var(BALLOT_ENVIRONMENT_VAR_NAME)
        .map(|environ| is_local(&environ))
        .unwrap_or(true)
}

pub fn get_pretty_print_logs() -> bool {
    std::env::var(BALLOT_PRETTY_PRINT_LOGS_VAR_NAME)
        .ok()
        .and_then(|pretty| pretty.parse().ok())
        .unwrap_or(false)
}

fn is_local(environ: &str) -> bool {
    matches!(environ.trim(), "" | "local" | "dev")
}
