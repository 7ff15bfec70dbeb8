use maci_crypto::{FieldError, KeyError, PoseidonError};
use maci_ledger::{AccumulatorError, PollId};

#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError
{
    /// The ledger rejected an operation.
    #[error("ledger: {0}")]
    Ledger(#[from] maci_ledger::Error),

    #[error(transparent)]
    Accumulator(#[from] AccumulatorError),

    #[error(transparent)]
    Hash(#[from] PoseidonError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// The descriptor names a key other than the one derived from our secret.
    #[error("deployment descriptor is stale: declares {declared}, secret key derives {derived}")]
    StaleDescriptor { declared: String, derived: String },

    #[error("poll {0} does not exist")]
    PollDoesNotExist(PollId),

    #[error("voting period of poll {0} is not over")]
    VotingPeriodNotOver(PollId),

    /// The replayed state disagrees with the root the ledger snapshotted.
    #[error("replayed state root does not match the ledger")]
    StateRootMismatch,

    /// A locally computed commitment disagrees with the ledger.
    #[error("{0} commitment does not match the ledger")]
    CommitmentMismatch(&'static str),

    /// Fewer or more messages were read back than the ledger accumulated.
    #[error("read {actual} messages, the ledger accumulated {expected}")]
    MessageCountMismatch { expected: u64, actual: u64 },

    /// The ledger expects a different batch than the one replayed.
    #[error("batch mismatch: ledger expects [{expected_start}, {expected_end}), replayed [{start}, {end})")]
    BatchMismatch { expected_start: u64, expected_end: u64, start: u64, end: u64 },

    /// A snarkjs artifact could not be converted.
    #[error("malformed artifact: {0}")]
    MalformedArtifact(String),

    #[error("prover failed: {0}")]
    Prover(String),

    #[error("tally overflow")]
    TallyOverflow,

    #[error("results of poll {0} were not recorded")]
    MissingResults(PollId),
}
