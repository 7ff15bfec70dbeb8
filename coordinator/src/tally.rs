use ark_bn254::Fr;
use ark_ff::Zero;

use maci_crypto::field::fr_from_u128;
use maci_crypto::CryptoContext;
use maci_ledger::{tally_commitment, Ballot, QuinaryTree, TallyResult, VoteMode};

use crate::error::CoordinatorError;

/// Running sums over the ballots tallied so far.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tally
{
    /// Sum of weights per vote option.
    pub votes: Vec<u128>,

    /// Credits spent per vote option.
    pub spent: Vec<u128>,

    pub total_spent: u128,

    /// Ballots with at least one accepted command.
    pub total_voters: u64,

    vote_option_tree_depth: u8,
}

fn vote_option_root(ctx: &CryptoContext, depth: u8, values: &[u128]) -> Result<Fr, CoordinatorError>
{
    let mut tree = QuinaryTree::new(ctx, depth, Fr::zero())?;
    for value in values
    {
        tree.insert(ctx, fr_from_u128(*value))?;
    }
    Ok(tree.root())
}

impl Tally
{
    pub fn new(vote_option_tree_depth: u8, max_vote_options: u64) -> Tally
    {
        Tally {
            votes: vec![0; max_vote_options as usize],
            spent: vec![0; max_vote_options as usize],
            total_spent: 0,
            total_voters: 0,
            vote_option_tree_depth,
        }
    }

    /// Adds a batch of ballots.
    pub fn add_batch(&mut self, ballots: &[Ballot], mode: VoteMode) -> Result<(), CoordinatorError>
    {
        for ballot in ballots
        {
            if ballot.nonce == 0 { continue; }
            self.total_voters += 1;

            for (option, weight) in ballot.votes.iter().enumerate()
            {
                let cost = mode.cost(*weight).ok_or(CoordinatorError::TallyOverflow)?;
                let (Some(votes), Some(spent)) = (self.votes.get_mut(option), self.spent.get_mut(option))
                    else { Err(CoordinatorError::TallyOverflow)? };

                *votes = votes.checked_add(*weight).ok_or(CoordinatorError::TallyOverflow)?;
                *spent = spent.checked_add(cost).ok_or(CoordinatorError::TallyOverflow)?;
                self.total_spent = self.total_spent.checked_add(cost).ok_or(CoordinatorError::TallyOverflow)?;
            }
        }
        Ok(())
    }

    pub fn results_root(&self, ctx: &CryptoContext) -> Result<Fr, CoordinatorError>
    {
        vote_option_root(ctx, self.vote_option_tree_depth, &self.votes)
    }

    pub fn spent_root(&self, ctx: &CryptoContext) -> Result<Fr, CoordinatorError>
    {
        vote_option_root(ctx, self.vote_option_tree_depth, &self.spent)
    }

    /// `poseidon3([results_root, total_spent, spent_root])`.
    pub fn commitment(&self, ctx: &CryptoContext) -> Result<Fr, CoordinatorError>
    {
        Ok(tally_commitment(
            ctx,
            self.results_root(ctx)?,
            fr_from_u128(self.total_spent),
            self.spent_root(ctx)?
        )?)
    }

    /// The values `publish_results` opens the final commitment with.
    pub fn to_result(&self, ctx: &CryptoContext) -> Result<TallyResult, CoordinatorError>
    {
        Ok(TallyResult {
            per_option_votes: self.votes.clone(),
            total_voters: self.total_voters,
            tally_results_root: self.results_root(ctx)?,
            total_spent: self.total_spent,
            per_option_spent_root: self.spent_root(ctx)?,
            verified: false,
        })
    }
}
