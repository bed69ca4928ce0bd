use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{Address, Fingerprint};

/// Identifies an election. Assigned by the contract, never by this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElectionId(pub u64);

#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CandidateId(pub u64);

impl fmt::Display for ElectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for ElectionId {
    fn from(id: u64) -> Self {
        ElectionId(id)
    }
}

impl From<u64> for CandidateId {
    fn from(id: u64) -> Self {
        CandidateId(id)
    }
}

/// Opaque per-voter deduplication key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoterKey(String);

impl VoterKey {
    pub fn new(key: impl Into<String>) -> Self {
        VoterKey(key.into())
    }

    /// Derives the key a session identity uses for one election:
    /// hex(sha256("<address>:<election id>")).
    pub fn derive(identity: &Address, election_id: ElectionId) -> Self {
        let digest = Sha256::digest(format!("{identity}:{election_id}").as_bytes());
        VoterKey(hex::encode(digest))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VoterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub election_id: ElectionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<CandidateId>,
    pub voter_key: VoterKey,
}

impl VoteRequest {
    pub fn new(election_id: ElectionId, voter_key: VoterKey) -> Self {
        Self {
            election_id,
            candidate_id: None,
            voter_key,
        }
    }

    pub fn with_candidate(mut self, candidate_id: CandidateId) -> Self {
        self.candidate_id = Some(candidate_id);
        self
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::vote(self.election_id, &self.voter_key)
    }
}

pub type Tally = BTreeMap<CandidateId, u64>;

/// Snapshot of an election's tally as read from the contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionResult {
    pub election_id: ElectionId,
    pub tally: Tally,
}

impl ElectionResult {
    pub fn total_votes(&self) -> u64 {
        self.tally.values().sum()
    }

    pub fn votes_for(&self, candidate_id: CandidateId) -> u64 {
        self.tally.get(&candidate_id).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate_mock_account_keypair;

    #[test]
    fn voter_key_is_deterministic_per_identity_and_election() {
        let (_, pk_a) = generate_mock_account_keypair(b"alice");
        let (_, pk_b) = generate_mock_account_keypair(b"bob");
        let alice = Address::new(pk_a);
        let bob = Address::new(pk_b);

        let first = VoterKey::derive(&alice, ElectionId(1));

        assert_eq!(first, VoterKey::derive(&alice, ElectionId(1)));
        assert_ne!(first, VoterKey::derive(&alice, ElectionId(2)));
        assert_ne!(first, VoterKey::derive(&bob, ElectionId(1)));
    }

    #[test]
    fn vote_request_uses_camel_case_and_omits_missing_candidate() {
        let request = VoteRequest::new(ElectionId(1), VoterKey::new("A"));

        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json, serde_json::json!({ "electionId": 1, "voterKey": "A" }));
    }

    #[test]
    fn tally_is_keyed_by_candidate() {
        let json = serde_json::json!({ "electionId": 4, "tally": { "0": 2, "7": 1 } });

        let result: ElectionResult = serde_json::from_value(json).unwrap();

        assert_eq!(result.total_votes(), 3);
        assert_eq!(result.votes_for(CandidateId(7)), 1);
        assert_eq!(result.votes_for(CandidateId(9)), 0);
    }
}
