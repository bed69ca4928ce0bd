use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{ElectionId, VoterKey};

/// Deterministic key identifying one logical write request for deduplication.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fingerprint(String);

impl Fingerprint {
    pub fn start(election_id: ElectionId) -> Self {
        Fingerprint(format!("start:{election_id}"))
    }

    pub fn vote(election_id: ElectionId, voter_key: &VoterKey) -> Self {
        Fingerprint(format!("vote:{election_id}:{voter_key}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprints_follow_method_and_key() {
        assert_eq!(Fingerprint::start(ElectionId(1)).as_str(), "start:1");
        assert_eq!(
            Fingerprint::vote(ElectionId(1), &VoterKey::new("A")).as_str(),
            "vote:1:A"
        );
    }
}
