use ark_bn254::Fr;
use ark_ff::Zero;

use crate::types::{CommitmentIndex, StateIndex, Timestamp, VoteMode};

/// Number of public inputs of the message processing circuit.
pub const PROCESS_INPUTS: usize = 8;

/// Number of public inputs of the tally circuit.
pub const TALLY_INPUTS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commitment
{
    /// The number of verified processing batches and the current state and
    /// ballot commitment.
    pub process: (CommitmentIndex, Fr),

    /// The number of verified tally batches and the current tally commitment.
    pub tally: (CommitmentIndex, Fr),

    /// The expected number of process commitments.
    pub expected_process: CommitmentIndex,

    /// The expected number of tally commitments.
    pub expected_tally: CommitmentIndex,

    /// Set once every processing batch has been verified and frozen.
    pub processing_complete: bool,
}

impl Default for Commitment
{
    fn default() -> Self
    {
        Commitment {
            process: (0, Fr::zero()),
            tally: (0, Fr::zero()),
            expected_process: 0,
            expected_tally: 0,
            processing_complete: false,
        }
    }
}

/// The verified outcome of a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TallyResult
{
    /// The results of the tally per option.
    pub per_option_votes: Vec<u128>,

    /// The number of voters counted.
    pub total_voters: u64,

    /// Root of the vote option tree over `per_option_votes`.
    pub tally_results_root: Fr,

    /// The total credits spent.
    pub total_spent: u128,

    /// Root of the vote option tree of credits spent per option.
    pub per_option_spent_root: Fr,

    pub verified: bool,
}

/// Public inputs of one message processing batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessInputs
{
    pub num_sign_ups: u64,
    pub poll_end_timestamp: Timestamp,
    pub message_root: Fr,
    pub batch_start_index: u64,
    pub batch_end_index: u64,
    pub coordinator_public_key_hash: Fr,
    pub current_sb_commitment: Fr,
    pub new_sb_commitment: Fr,
}

impl ProcessInputs
{
    pub fn to_vec(&self) -> Vec<Fr>
    {
        vec![
            Fr::from(self.num_sign_ups),
            Fr::from(self.poll_end_timestamp),
            self.message_root,
            Fr::from(self.batch_start_index),
            Fr::from(self.batch_end_index),
            self.coordinator_public_key_hash,
            self.current_sb_commitment,
            self.new_sb_commitment,
        ]
    }
}

/// Public inputs of one tally batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TallyInputs
{
    pub sb_commitment: Fr,
    pub current_tally_commitment: Fr,
    pub new_tally_commitment: Fr,
    pub batch_start_index: StateIndex,
    pub num_sign_ups: u64,
    pub mode: VoteMode,
}

impl TallyInputs
{
    pub fn to_vec(&self) -> Vec<Fr>
    {
        vec![
            self.sb_commitment,
            self.current_tally_commitment,
            self.new_tally_commitment,
            Fr::from(self.batch_start_index),
            Fr::from(self.num_sign_ups),
            self.mode.as_input(),
        ]
    }
}

/// The `[start, end)` message indices of batch `batch` of `batch_size`.
pub fn message_batch_range(batch: CommitmentIndex, batch_size: u64, num_messages: u64) -> (u64, u64)
{
    let start = batch as u64 * batch_size;
    (start, num_messages.min(start + batch_size))
}

/// Batches needed to cover `items`; at least one.
pub fn batch_count(items: u64, batch_size: u64) -> CommitmentIndex
{
    items.div_ceil(batch_size.max(1)).max(1) as CommitmentIndex
}
