use ark_bn254::Fr;
use ark_ff::Zero;

use maci_crypto::field::fr_from_u128;
use maci_crypto::CryptoContext;

use crate::accumulator::QuinaryTree;
use crate::error::Error;
use crate::poll::{
    batch_count,
    message_batch_range,
    Poll,
    PollPhase,
    ProcessInputs,
    TallyInputs,
    TallyResult
};
use crate::types::{empty_ballot_root, state_commitment, tally_commitment, Timestamp};

/// State transitions of a single poll. Each consumes the poll and returns the
/// successor, so a failed transition leaves the stored poll untouched.
pub trait PollProvider: Sized
{
    fn consume_message(
        self,
        ctx: &CryptoContext,
        now: Timestamp,
        leaf: Fr
    ) -> Result<(u64, Self), Error>;

    fn merge_message_sub_roots(
        self,
        ctx: &CryptoContext,
        now: Timestamp,
        steps: u32
    ) -> Result<Self, Error>;

    fn merge_messages(self, ctx: &CryptoContext, now: Timestamp) -> Result<Self, Error>;

    fn adopt_state(
        self,
        ctx: &CryptoContext,
        now: Timestamp,
        state_root: Fr,
        num_sign_ups: u64,
        state_tree_depth: u8
    ) -> Result<Self, Error>;

    fn process_inputs(&self, ctx: &CryptoContext, new_sb_commitment: Fr) -> Result<ProcessInputs, Error>;

    fn commit_process_batch(self, new_sb_commitment: Fr) -> Self;

    fn complete_processing(self) -> Result<Self, Error>;

    fn tally_inputs(&self, new_tally_commitment: Fr) -> Result<TallyInputs, Error>;

    fn commit_tally_batch(self, new_tally_commitment: Fr) -> Self;

    fn publish_results(
        self,
        ctx: &CryptoContext,
        votes: Vec<u128>,
        total_voters: u64,
        tally_results_root: Fr,
        total_spent: u128,
        per_option_spent_root: Fr
    ) -> Result<Self, Error>;

    fn is_voting_period(&self, now: Timestamp) -> bool;

    fn is_merged(&self) -> bool;

    fn is_fulfilled(&self) -> bool;
}

impl<AccountId> Poll<AccountId>
{
    fn ensure_voting_over(&self, now: Timestamp) -> Result<(), Error>
    {
        if self.phase(now) == PollPhase::Voting { Err(Error::VotingPeriodNotOver)? }
        Ok(())
    }

    /// Enters `Processing` once both accumulators are merged.
    fn advance(mut self, now: Timestamp) -> Self
    {
        if self.phase(now) == PollPhase::Merging && self.state_aq_merged() && self.message_aq_merged()
        {
            self.state.phase = PollPhase::Processing;
        }
        self
    }

    fn ensure_processing(&self) -> Result<(), Error>
    {
        if !self.state_aq_merged() { Err(Error::StateAqNotMerged)? }
        if !self.message_aq_merged() { Err(Error::MessageAqNotMerged)? }
        if self.state.outcome.is_some() { Err(Error::ResultsAlreadyPublished)? }
        Ok(())
    }
}

impl<AccountId> PollProvider for Poll<AccountId>
{
    fn consume_message(
        mut self,
        ctx: &CryptoContext,
        now: Timestamp,
        leaf: Fr
    ) -> Result<(u64, Self), Error>
    {
        if !self.is_voting_period(now) { Err(Error::VotingPeriodOver)? }

        let (index, messages) = self.state.messages.enqueue_fr(ctx, leaf).map_err(Error::message_aq)?;
        self.state.messages = messages;

        Ok((index, self))
    }

    fn merge_message_sub_roots(
        mut self,
        ctx: &CryptoContext,
        now: Timestamp,
        steps: u32
    ) -> Result<Self, Error>
    {
        self.ensure_voting_over(now)?;
        if self.message_aq_merged() { Err(Error::MessageAqAlreadyMerged)? }

        self.state.messages = self.state.messages
            .merge_sub_roots(ctx, steps)
            .map_err(Error::message_aq)?;

        Ok(self)
    }

    fn merge_messages(mut self, ctx: &CryptoContext, now: Timestamp) -> Result<Self, Error>
    {
        self.ensure_voting_over(now)?;
        if self.message_aq_merged() { Err(Error::MessageAqAlreadyMerged)? }

        self.state.messages = self.state.messages.merge(ctx).map_err(Error::message_aq)?;

        let batch_size = self.config.tree_depths.message_batch_size();
        self.state.commitment.expected_process = batch_count(self.state.messages.count(), batch_size);

        Ok(self.advance(now))
    }

    fn adopt_state(
        mut self,
        ctx: &CryptoContext,
        now: Timestamp,
        state_root: Fr,
        num_sign_ups: u64,
        state_tree_depth: u8
    ) -> Result<Self, Error>
    {
        self.ensure_voting_over(now)?;
        if self.state_aq_merged() { Err(Error::StateAqAlreadyMerged)? }

        let ballot_root = empty_ballot_root(
            ctx,
            state_tree_depth,
            self.config.tree_depths.vote_option_tree_depth
        )?;

        self.state.state_root = Some(state_root);
        self.state.num_sign_ups = num_sign_ups;
        self.state.commitment.process = (0, state_commitment(ctx, state_root, ballot_root)?);

        Ok(self.advance(now))
    }

    fn process_inputs(&self, ctx: &CryptoContext, new_sb_commitment: Fr) -> Result<ProcessInputs, Error>
    {
        self.ensure_processing()?;

        let commitment = &self.state.commitment;
        if commitment.processing_complete { Err(Error::ProcessingAlreadyComplete)? }
        if commitment.process.0 >= commitment.expected_process { Err(Error::AllBatchesProcessed)? }

        let Some(message_root) = self.state.messages.root() else { Err(Error::MessageAqNotMerged)? };

        // Batches are consumed from the last to the first.
        let batch = commitment.expected_process - 1 - commitment.process.0;
        let (batch_start_index, batch_end_index) = message_batch_range(
            batch,
            self.config.tree_depths.message_batch_size(),
            self.state.messages.count()
        );

        let key = &self.config.coordinator_public_key;

        Ok(ProcessInputs {
            num_sign_ups: self.state.num_sign_ups,
            poll_end_timestamp: self.ends_at(),
            message_root,
            batch_start_index,
            batch_end_index,
            coordinator_public_key_hash: ctx.hash(&[key.x, key.y])?,
            current_sb_commitment: commitment.process.1,
            new_sb_commitment,
        })
    }

    fn commit_process_batch(mut self, new_sb_commitment: Fr) -> Self
    {
        let (count, _) = self.state.commitment.process;
        self.state.commitment.process = (count + 1, new_sb_commitment);
        self
    }

    fn complete_processing(mut self) -> Result<Self, Error>
    {
        self.ensure_processing()?;

        let commitment = &mut self.state.commitment;
        if commitment.processing_complete { Err(Error::ProcessingAlreadyComplete)? }
        if commitment.process.0 == 0 { Err(Error::NoBatchesProcessed)? }
        if commitment.process.0 < commitment.expected_process { Err(Error::ProcessingNotComplete)? }

        // The blank leaf at index zero is tallied along with the voters.
        let batch_size = self.config.tree_depths.tally_batch_size();
        commitment.processing_complete = true;
        commitment.tally = (0, Fr::zero());
        commitment.expected_tally = batch_count(self.state.num_sign_ups + 1, batch_size);

        Ok(self)
    }

    fn tally_inputs(&self, new_tally_commitment: Fr) -> Result<TallyInputs, Error>
    {
        self.ensure_processing()?;

        let commitment = &self.state.commitment;
        if !commitment.processing_complete { Err(Error::ProcessingNotComplete)? }
        if commitment.tally.0 >= commitment.expected_tally { Err(Error::AllTallyBatchesProcessed)? }

        Ok(TallyInputs {
            sb_commitment: commitment.process.1,
            current_tally_commitment: commitment.tally.1,
            new_tally_commitment,
            batch_start_index: commitment.tally.0 as u64 * self.config.tree_depths.tally_batch_size(),
            num_sign_ups: self.state.num_sign_ups,
            mode: self.config.mode,
        })
    }

    fn commit_tally_batch(mut self, new_tally_commitment: Fr) -> Self
    {
        let (count, _) = self.state.commitment.tally;
        self.state.commitment.tally = (count + 1, new_tally_commitment);
        self
    }

    fn publish_results(
        mut self,
        ctx: &CryptoContext,
        votes: Vec<u128>,
        total_voters: u64,
        tally_results_root: Fr,
        total_spent: u128,
        per_option_spent_root: Fr
    ) -> Result<Self, Error>
    {
        self.ensure_processing()?;

        let commitment = &self.state.commitment;
        if !commitment.processing_complete || commitment.tally.0 < commitment.expected_tally
        {
            Err(Error::TallyNotComplete)?
        }
        if total_voters > self.state.num_sign_ups { Err(Error::TooManyVoters)? }

        let depth = self.config.tree_depths.vote_option_tree_depth;
        if votes.len() as u64 > self.config.tree_depths.max_vote_options() { Err(Error::TooManyVoteOptions)? }

        let mut tree = QuinaryTree::new(ctx, depth, Fr::zero())?;
        for weight in &votes
        {
            tree.insert(ctx, fr_from_u128(*weight))?;
        }
        if tree.root() != tally_results_root { Err(Error::ResultsRootMismatch)? }

        let expected = tally_commitment(ctx, tally_results_root, fr_from_u128(total_spent), per_option_spent_root)?;
        if expected != commitment.tally.1 { Err(Error::CommitmentMismatch)? }

        self.state.outcome = Some(TallyResult {
            per_option_votes: votes,
            total_voters,
            tally_results_root,
            total_spent,
            per_option_spent_root,
            verified: true,
        });
        self.state.phase = PollPhase::Finalized;

        Ok(self)
    }

    fn is_voting_period(&self, now: Timestamp) -> bool
    {
        self.phase(now) == PollPhase::Voting
    }

    fn is_merged(&self) -> bool
    {
        self.state_aq_merged() && self.message_aq_merged()
    }

    /// Returns true iff the poll outcome has been committed.
    fn is_fulfilled(&self) -> bool
    {
        self.state.outcome.is_some()
    }
}
