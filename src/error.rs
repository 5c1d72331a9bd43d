//! Error taxonomy for the export flow.
//!
//! Every variant is terminal for the current flow step. Callers should treat
//! anything other than [`Error::NoStatementData`] as grounds for a full
//! restart from an anonymous session, since token and cookie state is stale
//! after a mid-flow failure.

use crate::client::Stage;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Connection failure or timeout from the underlying transport.
    #[error("network failure: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },

    /// The portal answered with a non-success status. Never retried.
    #[error("unexpected HTTP status {status} from {path}")]
    Status { status: u16, path: String },

    /// An expected hidden field or page element was absent. Usually means
    /// the portal returned an error page instead of the expected form, or
    /// its markup changed.
    #[error("page is missing expected element {field:?}")]
    MalformedPage { field: &'static str },

    /// The challenge question is not in the caller-supplied table.
    /// Submitting guessed letters is worse than failing, so this aborts
    /// before any submission.
    #[error("challenge question not present in the answer table: {question:?}")]
    UnknownChallengeQuestion { question: String },

    /// The challenge layout does not match the known protocol (required
    /// slot count other than two, or a slot beyond the answer length).
    #[error("unsupported challenge layout: {reason}")]
    ChallengeFormat { reason: String },

    /// The export POST was accepted but the server rendered an HTML page
    /// instead of a file: no transactions matched the criteria.
    #[error("no statement data matched the export criteria")]
    NoStatementData,

    /// Criteria range checks failed before submission.
    #[error("invalid export criteria: {reason}")]
    InvalidCriteria { reason: String },

    /// An operation was invoked outside its place in the flow.
    #[error("operation requires stage {expected:?} but the client is {actual:?}")]
    WrongStage { expected: Stage, actual: Stage },
}
