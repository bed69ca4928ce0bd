//! Serializable responses for the UI layer. No library error crosses this
//! boundary; failures are reported as an [`ErrorReport`].

use primitives::{ElectionId, ElectionResult, Tally, TxHash, TxStatus, VoteRequest};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::{CoordinatorError, ElectionCoordinator, ErrorKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submitted {
    pub tx_hash: TxHash,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TallyView {
    pub election_id: ElectionId,
    pub tally: Tally,
    pub total_votes: u64,
}

impl From<ElectionResult> for TallyView {
    fn from(result: ElectionResult) -> Self {
        Self {
            election_id: result.election_id,
            total_votes: result.total_votes(),
            tally: result.tally,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorReport {
    pub error_kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<TxHash>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TxStatus>,
}

impl From<&CoordinatorError> for ErrorReport {
    fn from(err: &CoordinatorError) -> Self {
        let status = match err {
            CoordinatorError::DuplicateSubmission { status, .. } => *status,
            CoordinatorError::Timeout { .. } => Some(TxStatus::Pending),
            CoordinatorError::Reverted { .. } => Some(TxStatus::Failed),
            _ => None,
        };

        Self {
            error_kind: err.kind(),
            message: err.to_string(),
            tx_hash: err.tx_hash().cloned(),
            status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response<T> {
    Ok(T),
    Err(ErrorReport),
}

impl<T> Response<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }
}

impl<T> From<Result<T, CoordinatorError>> for Response<T> {
    fn from(result: Result<T, CoordinatorError>) -> Self {
        match result {
            Ok(value) => Response::Ok(value),
            Err(err) => Response::Err(ErrorReport::from(&err)),
        }
    }
}

impl ElectionCoordinator {
    pub async fn start_election_response(
        &self,
        election_id: ElectionId,
        cancel: &CancellationToken,
    ) -> Response<Submitted> {
        self.start_election(election_id, cancel)
            .await
            .map(|tx_hash| Submitted { tx_hash })
            .into()
    }

    pub async fn vote_response(
        &self,
        request: VoteRequest,
        cancel: &CancellationToken,
    ) -> Response<Submitted> {
        self.vote(request, cancel)
            .await
            .map(|tx_hash| Submitted { tx_hash })
            .into()
    }

    pub async fn result_response(&self, election_id: ElectionId) -> Response<TallyView> {
        self.get_result(election_id)
            .await
            .map(TallyView::from)
            .into()
    }
}

#[cfg(test)]
mod tests {
    use primitives::{CandidateId, Fingerprint};
    use serde_json::json;

    use super::*;

    #[test]
    fn duplicate_submission_report_carries_the_existing_transaction() {
        let err = CoordinatorError::DuplicateSubmission {
            fingerprint: Fingerprint::start(ElectionId(1)),
            tx_hash: Some(TxHash::new("0xabc")),
            status: Some(TxStatus::Confirmed),
        };

        let response: Response<Submitted> = Err(err).into();

        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({
                "errorKind": "DuplicateSubmissionError",
                "message": "start:1 was already submitted as 0xabc (Confirmed)",
                "txHash": "0xabc",
                "status": "Confirmed",
            })
        );
    }

    #[test]
    fn network_errors_omit_transaction_fields() {
        let response: Response<Submitted> =
            Err(CoordinatorError::Network("connection refused".into())).into();

        assert_eq!(
            serde_json::to_value(response).unwrap(),
            json!({
                "errorKind": "NetworkError",
                "message": "network unavailable: connection refused",
            })
        );
    }

    #[test]
    fn successes_serialize_in_camel_case() {
        let submitted: Response<Submitted> = Ok(Submitted {
            tx_hash: TxHash::new("0x1"),
        })
        .into();
        assert_eq!(
            serde_json::to_value(submitted).unwrap(),
            json!({ "txHash": "0x1" })
        );

        let mut result = ElectionResult {
            election_id: ElectionId(1),
            tally: Tally::new(),
        };
        result.tally.insert(CandidateId(2), 3);

        let view: Response<TallyView> = Ok(TallyView::from(result)).into();
        assert_eq!(
            serde_json::to_value(view).unwrap(),
            json!({ "electionId": 1, "tally": { "2": 3 }, "totalVotes": 3 })
        );
    }
}
