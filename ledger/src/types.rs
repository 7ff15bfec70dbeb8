use ark_bn254::Fr;
use ark_ff::{MontFp, Zero};
use serde::{Deserialize, Serialize};

use maci_crypto::field::fr_from_u128;
use maci_crypto::{CryptoContext, FieldBytes, Point, PoseidonError, MESSAGE_DATA_LENGTH};

use crate::accumulator::{tree::zeroes, QuinaryTree, AccumulatorError, ARITY};

pub type Timestamp = u64;
pub type Duration = Timestamp;
pub type PollId = u32;
pub type StateIndex = u64;
pub type HashBytes = FieldBytes;
pub type CommitmentIndex = u32;
pub type CommitmentData = HashBytes;
pub type MessageData = [HashBytes; MESSAGE_DATA_LENGTH];

/// Coordinates of a public key nobody knows the private key for. It keys the
/// blank leaf at state index zero.
const PAD_KEY_X: Fr = MontFp!("10457101036533406547632367118273992217979173478358440826365724437999023779287");
const PAD_KEY_Y: Fr = MontFp!("19824078218392094440610104313265183977899662750282163392862422243483260492317");

/// How a vote weight is charged against a voter's credits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VoteMode
{
    /// A weight of `w` costs `w * w` credits.
    Quadratic,

    /// A weight of `w` costs `w` credits.
    Linear,
}

impl VoteMode
{
    /// The credit cost of a vote weight, or `None` on overflow.
    pub fn cost(&self, weight: u128) -> Option<u128>
    {
        match self
        {
            VoteMode::Quadratic => weight.checked_mul(weight),
            VoteMode::Linear => Some(weight),
        }
    }

    /// The value the tally circuit receives for this mode.
    pub fn as_input(&self) -> Fr
    {
        match self
        {
            VoteMode::Quadratic => Fr::zero(),
            VoteMode::Linear => Fr::from(1u64),
        }
    }
}

/// Tree depths fixed at deployment. Each must match the circuits the
/// verifying keys were generated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeDepths
{
    /// Depth of the message tree; at most `5^depth` messages.
    pub message_tree_depth: u8,

    /// Messages per processing batch is `5^message_batch_depth`.
    pub message_batch_depth: u8,

    /// At most `5^vote_option_tree_depth` vote options.
    pub vote_option_tree_depth: u8,

    /// State leaves per tally batch is `5^int_state_tree_depth`.
    pub int_state_tree_depth: u8,
}

impl TreeDepths
{
    pub fn message_batch_size(&self) -> u64
    {
        capacity(self.message_batch_depth)
    }

    pub fn tally_batch_size(&self) -> u64
    {
        capacity(self.int_state_tree_depth)
    }

    pub fn max_vote_options(&self) -> u64
    {
        capacity(self.vote_option_tree_depth)
    }
}

/// Number of leaves of a full quinary tree of `depth`, saturating.
pub fn capacity(depth: u8) -> u64
{
    (ARITY as u64).checked_pow(depth as u32).unwrap_or(u64::MAX)
}

/// A registered voter as committed to in the state tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateLeaf
{
    pub public_key: Point,
    pub voice_credit_balance: u128,
    pub timestamp: Timestamp,
}

impl StateLeaf
{
    /// The leaf at index zero.
    pub fn blank() -> StateLeaf
    {
        StateLeaf {
            public_key: Point { x: PAD_KEY_X, y: PAD_KEY_Y },
            voice_credit_balance: 0,
            timestamp: 0,
        }
    }

    /// `poseidon4([x, y, balance, timestamp])`.
    pub fn hash(&self, ctx: &CryptoContext) -> Result<Fr, PoseidonError>
    {
        ctx.hash(&[
            self.public_key.x,
            self.public_key.y,
            fr_from_u128(self.voice_credit_balance),
            Fr::from(self.timestamp),
        ])
    }
}

/// A voter's current votes within one poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ballot
{
    /// Nonce of the last accepted command, zero if none.
    pub nonce: u64,

    /// Weight per vote option.
    pub votes: Vec<u128>,
}

impl Ballot
{
    pub fn blank(vote_option_tree_depth: u8) -> Ballot
    {
        Ballot { nonce: 0, votes: vec![0; capacity(vote_option_tree_depth) as usize] }
    }

    /// Root of the vote option tree over `votes`.
    pub fn vote_option_root(&self, ctx: &CryptoContext, vote_option_tree_depth: u8) -> Result<Fr, AccumulatorError>
    {
        let mut tree = QuinaryTree::new(ctx, vote_option_tree_depth, Fr::zero())?;
        for (i, weight) in self.votes.iter().enumerate()
        {
            if *weight != 0 { tree.update(ctx, i as u64, fr_from_u128(*weight))?; }
        }
        Ok(tree.root())
    }

    /// `poseidon2([nonce, vote_option_root])`.
    pub fn hash(&self, ctx: &CryptoContext, vote_option_tree_depth: u8) -> Result<Fr, AccumulatorError>
    {
        let root = self.vote_option_root(ctx, vote_option_tree_depth)?;
        Ok(ctx.hash(&[Fr::from(self.nonce), root])?)
    }
}

/// Hash of a ballot with no votes and nonce zero.
pub fn blank_ballot_hash(ctx: &CryptoContext, vote_option_tree_depth: u8) -> Result<Fr, PoseidonError>
{
    let vote_option_root = zeroes(ctx, Fr::zero(), vote_option_tree_depth)?[vote_option_tree_depth as usize];
    ctx.hash(&[Fr::zero(), vote_option_root])
}

/// Root of a ballot tree of `state_tree_depth` in which every ballot is blank.
pub fn empty_ballot_root(
    ctx: &CryptoContext,
    state_tree_depth: u8,
    vote_option_tree_depth: u8
) -> Result<Fr, PoseidonError>
{
    let blank = blank_ballot_hash(ctx, vote_option_tree_depth)?;
    Ok(zeroes(ctx, blank, state_tree_depth)?[state_tree_depth as usize])
}

/// `poseidon3([state_root, ballot_root, 0])`, the commitment chained through
/// message processing.
pub fn state_commitment(ctx: &CryptoContext, state_root: Fr, ballot_root: Fr) -> Result<Fr, PoseidonError>
{
    ctx.hash(&[state_root, ballot_root, Fr::zero()])
}

/// `poseidon3([tally_results_root, total_spent, per_option_spent_root])`.
pub fn tally_commitment(
    ctx: &CryptoContext,
    tally_results_root: Fr,
    total_spent: Fr,
    per_option_spent_root: Fr
) -> Result<Fr, PoseidonError>
{
    ctx.hash(&[tally_results_root, total_spent, per_option_spent_root])
}
