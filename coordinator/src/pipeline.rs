//! Drives a poll from the end of voting to published results: merge both
//! accumulators, replay and prove every message batch, then tally and publish.

use std::sync::Arc;

use maci_crypto::{CryptoContext, PrivateKey, PublicKey};
use maci_ledger::{batch_count, message_batch_range, MergePhase, PollId, PollPhase, TallyResult};

use crate::client::{LedgerClient, PollView};
use crate::config::{CoordinatorConfig, DeploymentDescriptor};
use crate::error::CoordinatorError;
use crate::processor::{decrypt_messages, process_batch};
use crate::prover::{Circuit, Prover};
use crate::state::PollReplay;
use crate::tally::Tally;
use crate::witness::{ProcessWitness, Roots, TallyWitness};

/// Summary of a coordinated poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollOutcome
{
    pub poll_id: PollId,

    /// The results as recorded by the ledger.
    pub result: TallyResult,

    /// Commands applied across all batches.
    pub accepted_messages: usize,

    /// Batches submitted by this run.
    pub process_batches: u32,
    pub tally_batches: u32,
}

pub struct Coordinator<P: Prover>
{
    ctx: Arc<CryptoContext>,
    private_key: PrivateKey,
    config: CoordinatorConfig,
    prover: P,
}

fn roots(replay: &PollReplay) -> Roots
{
    Roots { state_root: replay.state_root(), ballot_root: replay.ballot_root() }
}

impl<P: Prover> Coordinator<P>
{
    pub fn new(ctx: Arc<CryptoContext>, private_key: PrivateKey, config: CoordinatorConfig, prover: P) -> Self
    {
        Coordinator { ctx, private_key, config, prover }
    }

    pub fn public_key(&self) -> PublicKey
    {
        self.private_key.public_key(&self.ctx)
    }

    /// Coordinates the poll named by `descriptor`. Batches the ledger has
    /// already verified are replayed locally but not resubmitted.
    pub fn run<L: LedgerClient>(
        &self,
        ledger: &mut L,
        descriptor: &DeploymentDescriptor
    ) -> Result<PollOutcome, CoordinatorError>
    {
        let public_key = descriptor.check(&self.ctx, &self.private_key)?;
        let poll_id = descriptor.poll_id;

        let view = ledger.poll(poll_id)?;
        if view.coordinator_public_key != *public_key.point()
        {
            Err(CoordinatorError::StaleDescriptor {
                declared: PublicKey(view.coordinator_public_key).serialize(),
                derived: public_key.serialize(),
            })?
        }
        if view.phase == PollPhase::Voting { Err(CoordinatorError::VotingPeriodNotOver(poll_id))? }

        self.merge(ledger, &view)?;

        let view = ledger.poll(poll_id)?;
        let (replay, accepted_messages, process_batches) = self.process(ledger, &view)?;

        let view = ledger.poll(poll_id)?;
        let (tally, tally_batches) = self.tally(ledger, &view, &replay)?;

        if ledger.results(poll_id).is_none()
        {
            ledger.publish_results(poll_id, &tally.to_result(&self.ctx)?)?;
        }
        let result = ledger.results(poll_id).ok_or(CoordinatorError::MissingResults(poll_id))?;

        tracing::info!(poll_id, total_voters = result.total_voters, votes = ?result.per_option_votes, "results published");
        Ok(PollOutcome { poll_id, result, accepted_messages, process_batches, tally_batches })
    }

    fn merge<L: LedgerClient>(&self, ledger: &mut L, view: &PollView) -> Result<(), CoordinatorError>
    {
        let poll_id = view.poll_id;

        if !view.state_aq_merged()
        {
            while !matches!(ledger.state_aq_phase(), MergePhase::SubRootsMerged | MergePhase::Merged)
            {
                ledger.merge_state_aq_sub_roots(poll_id, self.config.merge_steps)?;
            }
            ledger.merge_state_aq(poll_id)?;
            tracing::info!(poll_id, "state accumulator merged");
        }

        if !view.message_aq_merged
        {
            while ledger.message_aq_phase(poll_id)? != MergePhase::SubRootsMerged
            {
                ledger.merge_message_aq_sub_roots(poll_id, self.config.merge_steps)?;
            }
            ledger.merge_message_aq(poll_id)?;
            tracing::info!(poll_id, "message accumulator merged");
        }

        Ok(())
    }

    fn process<L: LedgerClient>(
        &self,
        ledger: &mut L,
        view: &PollView
    ) -> Result<(PollReplay, usize, u32), CoordinatorError>
    {
        let poll_id = view.poll_id;
        let verified = view.commitment.process.0;

        let mut replay = PollReplay::new(
            self.ctx.clone(),
            poll_id,
            view.state_tree_depth,
            view.tree_depths,
            view.mode,
            &ledger.sign_ups()?,
            view.num_sign_ups
        )?;
        if Some(replay.state_root()) != view.state_root { Err(CoordinatorError::StateRootMismatch)? }
        if verified == 0 && replay.sb_commitment()? != view.commitment.process.1
        {
            Err(CoordinatorError::CommitmentMismatch("state"))?
        }

        let messages = ledger.messages(poll_id)?;
        if messages.len() as u64 != view.num_messages
        {
            Err(CoordinatorError::MessageCountMismatch { expected: view.num_messages, actual: messages.len() as u64 })?
        }
        let decrypted = decrypt_messages(&self.ctx, &self.private_key, messages, self.config.parallel);

        let batch_size = view.tree_depths.message_batch_size();
        let mut accepted = 0;
        let mut submitted = 0;

        for (position, batch) in (0..view.commitment.expected_process).rev().enumerate()
        {
            let (start, end) = message_batch_range(batch, batch_size, view.num_messages);
            let current = roots(&replay);
            let outcome = process_batch(&mut replay, start, &decrypted[start as usize..end as usize])?;
            let commitment = replay.sb_commitment()?;
            accepted += outcome.accepted();

            let position = position as u32;
            if position < verified
            {
                if position + 1 == verified && commitment != view.commitment.process.1
                {
                    Err(CoordinatorError::CommitmentMismatch("state"))?
                }
                continue;
            }

            let inputs = ledger.process_inputs(poll_id, commitment)?;
            if (inputs.batch_start_index, inputs.batch_end_index) != (start, end)
            {
                Err(CoordinatorError::BatchMismatch {
                    expected_start: inputs.batch_start_index,
                    expected_end: inputs.batch_end_index,
                    start,
                    end,
                })?
            }

            let public_inputs = inputs.to_vec();
            let witness = ProcessWitness::new(&public_inputs, &self.private_key, &outcome, current, roots(&replay));
            let proof = self.prover.prove(Circuit::Process, &public_inputs, &serde_json::to_value(&witness)?)?;
            ledger.process_messages(poll_id, commitment, proof)?;
            submitted += 1;

            tracing::info!(poll_id, batch, start, end, accepted = outcome.accepted(), "message batch processed");
        }

        if !view.commitment.processing_complete
        {
            ledger.complete_processing(poll_id)?;
            tracing::info!(poll_id, "processing complete");
        }

        Ok((replay, accepted, submitted))
    }

    fn tally<L: LedgerClient>(
        &self,
        ledger: &mut L,
        view: &PollView,
        replay: &PollReplay
    ) -> Result<(Tally, u32), CoordinatorError>
    {
        let poll_id = view.poll_id;
        let depths = view.tree_depths;
        let batch_size = depths.tally_batch_size();
        let leaves = replay.num_sign_ups() + 1;
        let (verified, verified_commitment) = view.commitment.tally;

        let final_roots = roots(replay);
        let mut tally = Tally::new(depths.vote_option_tree_depth, depths.max_vote_options());
        let mut submitted = 0;

        for batch in 0..batch_count(leaves, batch_size)
        {
            let start = batch as u64 * batch_size;
            let end = leaves.min(start + batch_size);
            let ballots = &replay.ballots()[start as usize..end as usize];

            let current = tally.clone();
            tally.add_batch(ballots, view.mode)?;
            let commitment = tally.commitment(&self.ctx)?;

            if batch < verified
            {
                if batch + 1 == verified && commitment != verified_commitment
                {
                    Err(CoordinatorError::CommitmentMismatch("tally"))?
                }
                continue;
            }

            let inputs = ledger.tally_inputs(poll_id, commitment)?;
            if inputs.batch_start_index != start
            {
                Err(CoordinatorError::BatchMismatch {
                    expected_start: inputs.batch_start_index,
                    expected_end: leaves.min(inputs.batch_start_index + batch_size),
                    start,
                    end,
                })?
            }

            let public_inputs = inputs.to_vec();
            let witness = TallyWitness::new(
                &public_inputs,
                start,
                final_roots,
                ballots,
                &replay.ballot_path(start)?,
                &current,
                &tally
            );
            let proof = self.prover.prove(Circuit::Tally, &public_inputs, &serde_json::to_value(&witness)?)?;
            ledger.tally_votes(poll_id, commitment, proof)?;
            submitted += 1;

            tracing::info!(poll_id, batch, start, end, "tally batch verified");
        }

        Ok((tally, submitted))
    }
}
