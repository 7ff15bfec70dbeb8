//! Off-chain replay of a poll: the state leaves, ballots and their trees as
//! the processing circuit sees them.

use std::sync::Arc;

use ark_bn254::Fr;

use maci_crypto::{Command, CryptoContext, Point, PublicKey, Signature};
use maci_ledger::accumulator::MerklePath;
use maci_ledger::{
    blank_ballot_hash,
    state_commitment,
    Ballot,
    PollId,
    QuinaryTree,
    StateIndex,
    StateLeaf,
    TreeDepths,
    VoteMode
};

use crate::client::SignUpRecord;
use crate::error::CoordinatorError;

/// Why a command was ignored during replay.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandRejection
{
    #[error("state index {0} is not a registered voter")]
    InvalidStateIndex(StateIndex),

    #[error("command targets poll {actual}, expected {expected}")]
    PollMismatch { expected: u64, actual: u64 },

    #[error("signature does not verify against the current key")]
    InvalidSignature,

    #[error("nonce {nonce} does not exceed the last accepted nonce {last}")]
    StaleNonce { nonce: u64, last: u64 },

    #[error("vote option {0} is out of range")]
    InvalidVoteOption(u64),

    #[error("new public key is not a valid point")]
    InvalidNewKey,

    #[error("vote weight costs more than the available credits")]
    InsufficientCredits,
}

/// A state leaf and ballot with their paths, taken before a command applies.
#[derive(Debug, Clone)]
pub struct LeafSnapshot
{
    pub state_index: StateIndex,
    pub state_leaf: StateLeaf,
    pub state_path: MerklePath,
    pub ballot: Ballot,
    pub ballot_path: MerklePath,
}

pub struct PollReplay
{
    ctx: Arc<CryptoContext>,
    poll_id: PollId,
    tree_depths: TreeDepths,
    mode: VoteMode,

    /// Leaves by state index, index zero being the blank leaf.
    leaves: Vec<StateLeaf>,

    /// Balances at sign-up. Each accepted command is charged against these.
    original_balances: Vec<u128>,

    ballots: Vec<Ballot>,
    state_tree: QuinaryTree,
    ballot_tree: QuinaryTree,
}

impl PollReplay
{
    /// Rebuilds the state tree from the first `num_sign_ups` sign-ups.
    pub fn new(
        ctx: Arc<CryptoContext>,
        poll_id: PollId,
        state_tree_depth: u8,
        tree_depths: TreeDepths,
        mode: VoteMode,
        sign_ups: &[SignUpRecord],
        num_sign_ups: u64
    ) -> Result<PollReplay, CoordinatorError>
    {
        let mut leaves = vec![StateLeaf::blank()];
        leaves.extend(sign_ups.iter().take(num_sign_ups as usize).map(|record| StateLeaf {
            public_key: record.public_key,
            voice_credit_balance: record.voice_credit_balance,
            timestamp: record.timestamp,
        }));

        let mut state_tree = QuinaryTree::new(&ctx, state_tree_depth, Fr::default())?;
        for leaf in &leaves
        {
            state_tree.insert(&ctx, leaf.hash(&ctx)?)?;
        }

        let blank = blank_ballot_hash(&ctx, tree_depths.vote_option_tree_depth)?;
        let ballot_tree = QuinaryTree::new(&ctx, state_tree_depth, blank)?;
        let ballots = vec![Ballot::blank(tree_depths.vote_option_tree_depth); leaves.len()];
        let original_balances = leaves.iter().map(|leaf| leaf.voice_credit_balance).collect();

        Ok(PollReplay {
            ctx,
            poll_id,
            tree_depths,
            mode,
            leaves,
            original_balances,
            ballots,
            state_tree,
            ballot_tree,
        })
    }

    pub fn ctx(&self) -> &CryptoContext
    {
        &self.ctx
    }

    pub fn tree_depths(&self) -> &TreeDepths
    {
        &self.tree_depths
    }

    pub fn mode(&self) -> VoteMode
    {
        self.mode
    }

    pub fn num_sign_ups(&self) -> u64
    {
        self.leaves.len() as u64 - 1
    }

    pub fn leaf(&self, index: StateIndex) -> Option<&StateLeaf>
    {
        self.leaves.get(index as usize)
    }

    pub fn ballot(&self, index: StateIndex) -> Option<&Ballot>
    {
        self.ballots.get(index as usize)
    }

    pub fn ballots(&self) -> &[Ballot]
    {
        &self.ballots
    }

    pub fn state_root(&self) -> Fr
    {
        self.state_tree.root()
    }

    pub fn ballot_root(&self) -> Fr
    {
        self.ballot_tree.root()
    }

    pub fn ballot_path(&self, index: StateIndex) -> Result<MerklePath, CoordinatorError>
    {
        Ok(self.ballot_tree.path(index)?)
    }

    /// `poseidon3([state_root, ballot_root, 0])`.
    pub fn sb_commitment(&self) -> Result<Fr, CoordinatorError>
    {
        Ok(state_commitment(&self.ctx, self.state_root(), self.ballot_root())?)
    }

    /// The leaf a command addresses, or the blank leaf if it addresses nobody.
    pub fn snapshot(&self, state_index: StateIndex) -> Result<LeafSnapshot, CoordinatorError>
    {
        let index = if state_index <= self.num_sign_ups() { state_index } else { 0 };
        Ok(LeafSnapshot {
            state_index: index,
            state_leaf: self.leaves[index as usize],
            state_path: self.state_tree.path(index)?,
            ballot: self.ballots[index as usize].clone(),
            ballot_path: self.ballot_tree.path(index)?,
        })
    }

    /// Checks a decrypted command against the current state and returns the
    /// credit cost of its vote.
    ///
    /// Messages are replayed newest first, so a nonce only has to exceed the
    /// last accepted one. Requiring `last + 1` would let the older of two
    /// commands with nonces 1 and 2 win.
    pub fn validate(&self, command: &Command, signature: &Signature) -> Result<u128, CommandRejection>
    {
        let index = command.state_index;
        if index == 0 || index > self.num_sign_ups()
        {
            Err(CommandRejection::InvalidStateIndex(index))?
        }
        if command.poll_id != self.poll_id as u64
        {
            Err(CommandRejection::PollMismatch { expected: self.poll_id as u64, actual: command.poll_id })?
        }

        let current = PublicKey(self.leaves[index as usize].public_key);
        command
            .verify_signature(&self.ctx, signature, &current)
            .map_err(|_| CommandRejection::InvalidSignature)?;

        let last = self.ballots[index as usize].nonce;
        if command.nonce <= last
        {
            Err(CommandRejection::StaleNonce { nonce: command.nonce, last })?
        }

        if command.vote_option_index >= self.tree_depths.max_vote_options()
        {
            Err(CommandRejection::InvalidVoteOption(command.vote_option_index))?
        }

        self.ctx
            .curve()
            .validate(command.new_public_key.point())
            .map_err(|_| CommandRejection::InvalidNewKey)?;

        let Some(cost) = self.mode.cost(command.new_vote_weight as u128) else { Err(CommandRejection::InsufficientCredits)? };
        if cost > self.original_balances[index as usize] { Err(CommandRejection::InsufficientCredits)? }

        Ok(cost)
    }

    /// Replaces the voter's key and ballot with those of an accepted command.
    pub fn apply(&mut self, command: &Command, cost: u128) -> Result<(), CoordinatorError>
    {
        let index = command.state_index as usize;
        let depth = self.tree_depths.vote_option_tree_depth;

        let leaf = &mut self.leaves[index];
        leaf.public_key = *command.new_public_key.point();
        leaf.voice_credit_balance = self.original_balances[index] - cost;
        let leaf_hash = leaf.hash(&self.ctx)?;

        let mut ballot = Ballot::blank(depth);
        ballot.nonce = command.nonce;
        ballot.votes[command.vote_option_index as usize] = command.new_vote_weight as u128;
        let ballot_hash = ballot.hash(&self.ctx, depth)?;
        self.ballots[index] = ballot;

        self.state_tree.update(&self.ctx, index as u64, leaf_hash)?;
        self.ballot_tree.update(&self.ctx, index as u64, ballot_hash)?;
        Ok(())
    }

    /// The key currently on record for a voter.
    pub fn public_key(&self, index: StateIndex) -> Option<Point>
    {
        self.leaf(index).map(|leaf| leaf.public_key)
    }
}
