use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::Error;

/// The fixed set of contract methods this client knows how to invoke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Method {
    StartElection,
    Vote,
    GetResult,
}

impl Method {
    pub fn name(&self) -> &'static str {
        match self {
            Method::StartElection => "startElection",
            Method::Vote => "vote",
            Method::GetResult => "getResult",
        }
    }

    /// Read-only methods are answered by a call and never signed.
    pub fn is_read_only(&self) -> bool {
        matches!(self, Method::GetResult)
    }

    /// Inclusive range of positional arguments accepted by the contract ABI.
    pub fn arity(&self) -> (usize, usize) {
        match self {
            Method::StartElection => (1, 1),
            // candidate id is optional, see VoteRequest
            Method::Vote => (1, 2),
            Method::GetResult => (1, 1),
        }
    }

    pub fn accepts_arity(&self, len: usize) -> bool {
        let (min, max) = self.arity();
        (min..=max).contains(&len)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "startElection" => Ok(Method::StartElection),
            "vote" => Ok(Method::Vote),
            "getResult" => Ok(Method::GetResult),
            _ => Err(Error::UnknownMethod(s.to_string())),
        }
    }
}
