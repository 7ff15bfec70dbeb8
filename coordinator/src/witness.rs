//! Circuit witnesses. Field elements are decimal strings, the encoding
//! circom witness generators read.

use ark_bn254::Fr;
use serde::{Deserialize, Serialize};

use maci_crypto::field::{fr_to_decimal_string, fr_from_u128};
use maci_crypto::PrivateKey;
use maci_ledger::accumulator::MerklePath;
use maci_ledger::{Ballot, StateLeaf};

use crate::processor::{BatchOutcome, MessageStep};
use crate::tally::Tally;

fn dec(value: &Fr) -> String
{
    fr_to_decimal_string(value)
}

fn dec_all(values: &[Fr]) -> Vec<String>
{
    values.iter().map(dec).collect()
}

fn dec_u128(values: &[u128]) -> Vec<String>
{
    values.iter().map(|v| dec(&fr_from_u128(*v))).collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathWitness
{
    pub indices: Vec<u8>,
    pub siblings: Vec<Vec<String>>,
}

impl From<&MerklePath> for PathWitness
{
    fn from(path: &MerklePath) -> Self
    {
        PathWitness {
            indices: path.indices.clone(),
            siblings: path.siblings.iter().map(|level| dec_all(level)).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateLeafWitness
{
    pub public_key: [String; 2],
    pub voice_credit_balance: String,
    pub timestamp: String,
}

impl From<&StateLeaf> for StateLeafWitness
{
    fn from(leaf: &StateLeaf) -> Self
    {
        StateLeafWitness {
            public_key: [dec(&leaf.public_key.x), dec(&leaf.public_key.y)],
            voice_credit_balance: dec(&fr_from_u128(leaf.voice_credit_balance)),
            timestamp: leaf.timestamp.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotWitness
{
    pub nonce: String,
    pub votes: Vec<String>,
}

impl From<&Ballot> for BallotWitness
{
    fn from(ballot: &Ballot) -> Self
    {
        BallotWitness { nonce: ballot.nonce.to_string(), votes: dec_u128(&ballot.votes) }
    }
}

/// One message and the leaf it addressed before it was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageWitness
{
    pub index: u64,
    pub data: Vec<String>,
    pub enc_public_key: [String; 2],
    pub state_index: u64,
    pub state_leaf: StateLeafWitness,
    pub state_path: PathWitness,
    pub ballot: BallotWitness,
    pub ballot_path: PathWitness,
    pub accepted: bool,
}

impl From<&MessageStep> for MessageWitness
{
    fn from(step: &MessageStep) -> Self
    {
        let key = &step.record.enc_public_key;
        MessageWitness {
            index: step.record.index,
            data: dec_all(&step.record.message.data),
            enc_public_key: [dec(&key.x), dec(&key.y)],
            state_index: step.before.state_index,
            state_leaf: StateLeafWitness::from(&step.before.state_leaf),
            state_path: PathWitness::from(&step.before.state_path),
            ballot: BallotWitness::from(&step.before.ballot),
            ballot_path: PathWitness::from(&step.before.ballot_path),
            accepted: step.accepted,
        }
    }
}

/// Witness of one message processing batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessWitness
{
    pub public_inputs: Vec<String>,
    pub coordinator_private_key: String,
    pub batch_start_index: u64,
    pub batch_end_index: u64,
    pub current_state_root: String,
    pub current_ballot_root: String,
    pub new_state_root: String,
    pub new_ballot_root: String,

    /// In processing order, highest index first.
    pub messages: Vec<MessageWitness>,
}

/// Roots bracketing a batch.
#[derive(Debug, Clone, Copy)]
pub struct Roots
{
    pub state_root: Fr,
    pub ballot_root: Fr,
}

impl ProcessWitness
{
    pub fn new(
        public_inputs: &[Fr],
        coordinator_key: &PrivateKey,
        outcome: &BatchOutcome,
        current: Roots,
        new: Roots
    ) -> ProcessWitness
    {
        ProcessWitness {
            public_inputs: dec_all(public_inputs),
            coordinator_private_key: coordinator_key.scalar().to_string(),
            batch_start_index: outcome.batch_start_index,
            batch_end_index: outcome.batch_end_index,
            current_state_root: dec(&current.state_root),
            current_ballot_root: dec(&current.ballot_root),
            new_state_root: dec(&new.state_root),
            new_ballot_root: dec(&new.ballot_root),
            messages: outcome.steps.iter().map(MessageWitness::from).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallySums
{
    pub votes: Vec<String>,
    pub spent: Vec<String>,
    pub total_spent: String,
}

impl From<&Tally> for TallySums
{
    fn from(tally: &Tally) -> Self
    {
        TallySums {
            votes: dec_u128(&tally.votes),
            spent: dec_u128(&tally.spent),
            total_spent: dec(&fr_from_u128(tally.total_spent)),
        }
    }
}

/// Witness of one tally batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TallyWitness
{
    pub public_inputs: Vec<String>,
    pub batch_start_index: u64,
    pub state_root: String,
    pub ballot_root: String,
    pub ballots: Vec<BallotWitness>,

    /// Path of the batch's first ballot; the batch is a complete subtree.
    pub ballot_path: PathWitness,

    pub current: TallySums,
    pub new: TallySums,
}

impl TallyWitness
{
    pub fn new(
        public_inputs: &[Fr],
        batch_start_index: u64,
        final_roots: Roots,
        ballots: &[Ballot],
        ballot_path: &MerklePath,
        current: &Tally,
        new: &Tally
    ) -> TallyWitness
    {
        TallyWitness {
            public_inputs: dec_all(public_inputs),
            batch_start_index,
            state_root: dec(&final_roots.state_root),
            ballot_root: dec(&final_roots.ballot_root),
            ballots: ballots.iter().map(BallotWitness::from).collect(),
            ballot_path: PathWitness::from(ballot_path),
            current: TallySums::from(current),
            new: TallySums::from(new),
        }
    }
}
