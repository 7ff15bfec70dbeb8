use maci_crypto::PoseidonError;

use crate::accumulator::AccumulatorError;

/// Broad classes of ledger failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind
{
    AccessControl,
    PhaseViolation,
    InputValidation,
    IntegrityViolation,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error
{
    /// The call was not signed.
    #[error("origin is not signed")]
    BadOrigin,

    /// Only the deployer may call this.
    #[error("caller is not the owner")]
    NotOwner,

    /// Only the poll coordinator may call this.
    #[error("caller is not the poll coordinator")]
    NotCoordinator,

    /// The voting window has closed.
    #[error("voting period is over")]
    VotingPeriodOver,

    /// The voting window is still open.
    #[error("voting period is not over")]
    VotingPeriodNotOver,

    /// Not every message batch has been processed.
    #[error("message processing is not complete")]
    ProcessingNotComplete,

    /// Processing cannot complete before a single batch was processed.
    #[error("no message batches have been processed")]
    NoBatchesProcessed,

    /// Processing was already completed.
    #[error("message processing is already complete")]
    ProcessingAlreadyComplete,

    /// Every message batch has been processed.
    #[error("all message batches have been processed")]
    AllBatchesProcessed,

    /// Every tally batch has been verified.
    #[error("all tally batches have been verified")]
    AllTallyBatchesProcessed,

    /// Not every tally batch has been verified.
    #[error("tally is not complete")]
    TallyNotComplete,

    /// The state accumulator was already merged for this poll.
    #[error("state accumulator already merged")]
    StateAqAlreadyMerged,

    /// The state accumulator has not been merged for this poll.
    #[error("state accumulator not merged")]
    StateAqNotMerged,

    /// The message accumulator was already merged.
    #[error("message accumulator already merged")]
    MessageAqAlreadyMerged,

    /// The message accumulator has not been merged.
    #[error("message accumulator not merged")]
    MessageAqNotMerged,

    /// The final merge requires sub-roots to be merged first.
    #[error("sub-roots have not been merged")]
    SubRootsNotMerged,

    /// The accumulator is mid-merge and rejects new leaves.
    #[error("accumulator merge in progress")]
    MergeInProgress,

    /// Results were already published for this poll.
    #[error("results already published")]
    ResultsAlreadyPublished,

    /// A value is not less than the field order.
    #[error("value is not less than the field order")]
    FieldOverflow,

    /// Poll duration must be positive.
    #[error("poll duration is zero")]
    ZeroDuration,

    /// Tree depths must be positive.
    #[error("tree depth is zero")]
    ZeroTreeDepth,

    /// Tree depths are inconsistent or exceed configured limits.
    #[error("invalid tree depths")]
    InvalidTreeDepths,

    /// The key is not a valid point in the prime order subgroup.
    #[error("invalid public key")]
    InvalidPublicKey,

    /// The coordinator account is the zero account.
    #[error("coordinator is the zero address")]
    ZeroAddress,

    /// A merge must take at least one step.
    #[error("merge step count is zero")]
    ZeroBatchCount,

    /// The verify key does not decode or does not fit the circuit.
    #[error("malformed verify key")]
    MalformedVerifyKey,

    /// The proof does not decode.
    #[error("malformed proof")]
    MalformedProof,

    /// The accumulator has no room for another leaf.
    #[error("tree is full")]
    TreeFull,

    /// The gatekeeper refused the sign-up.
    #[error("sign-up rejected by gatekeeper")]
    SignUpRejected,

    /// More results were supplied than the vote option tree holds.
    #[error("too many vote options")]
    TooManyVoteOptions,

    /// A leaf index lies outside the tree.
    #[error("leaf index {0} is out of range")]
    IndexOutOfRange(u64),

    /// Poll does not exist.
    #[error("poll does not exist")]
    PollDoesNotExist,

    /// The proof does not verify against the public inputs.
    #[error("invalid proof")]
    InvalidProof,

    /// Supplied values do not hash to the verified commitment.
    #[error("commitment mismatch")]
    CommitmentMismatch,

    /// Supplied votes do not hash to the supplied results root.
    #[error("results root mismatch")]
    ResultsRootMismatch,

    /// More voters were claimed than signed up.
    #[error("more voters than sign-ups")]
    TooManyVoters,

    /// A hash invocation failed.
    #[error(transparent)]
    Hash(#[from] PoseidonError),
}

impl Error
{
    pub fn kind(&self) -> ErrorKind
    {
        use Error::*;
        match self
        {
            BadOrigin | NotOwner | NotCoordinator => ErrorKind::AccessControl,

            VotingPeriodOver
            | VotingPeriodNotOver
            | ProcessingNotComplete
            | NoBatchesProcessed
            | ProcessingAlreadyComplete
            | AllBatchesProcessed
            | AllTallyBatchesProcessed
            | TallyNotComplete
            | StateAqAlreadyMerged
            | StateAqNotMerged
            | MessageAqAlreadyMerged
            | MessageAqNotMerged
            | SubRootsNotMerged
            | MergeInProgress
            | ResultsAlreadyPublished => ErrorKind::PhaseViolation,

            FieldOverflow
            | ZeroDuration
            | ZeroTreeDepth
            | InvalidTreeDepths
            | InvalidPublicKey
            | ZeroAddress
            | ZeroBatchCount
            | MalformedVerifyKey
            | MalformedProof
            | TreeFull
            | SignUpRejected
            | TooManyVoteOptions
            | IndexOutOfRange(_)
            | PollDoesNotExist => ErrorKind::InputValidation,

            InvalidProof
            | CommitmentMismatch
            | ResultsRootMismatch
            | TooManyVoters
            | Hash(_) => ErrorKind::IntegrityViolation,
        }
    }

    /// Maps a failure of the shared state accumulator.
    pub(crate) fn state_aq(error: AccumulatorError) -> Error
    {
        match error
        {
            AccumulatorError::AlreadyMerged => Error::StateAqAlreadyMerged,
            other => Error::from(other),
        }
    }

    /// Maps a failure of a poll's message accumulator.
    pub(crate) fn message_aq(error: AccumulatorError) -> Error
    {
        match error
        {
            AccumulatorError::AlreadyMerged => Error::MessageAqAlreadyMerged,
            other => Error::from(other),
        }
    }
}

impl From<AccumulatorError> for Error
{
    fn from(error: AccumulatorError) -> Self
    {
        match error
        {
            AccumulatorError::FieldOverflow => Error::FieldOverflow,
            AccumulatorError::TreeFull => Error::TreeFull,
            AccumulatorError::AlreadyMerged => Error::StateAqAlreadyMerged,
            AccumulatorError::MergeInProgress => Error::MergeInProgress,
            AccumulatorError::SubRootsNotMerged => Error::SubRootsNotMerged,
            AccumulatorError::ZeroSteps => Error::ZeroBatchCount,
            AccumulatorError::IndexOutOfRange(index) => Error::IndexOutOfRange(index),
            AccumulatorError::Hash(e) => Error::Hash(e),
        }
    }
}
