//! The ledger side of a collusion resistant voting protocol: voter sign-up,
//! encrypted message publication, accumulator merging, and verification of
//! message processing and tally proofs.

use std::collections::BTreeMap;
use std::sync::Arc;

use maci_crypto::field::{fr_from_be_bytes, fr_to_be_bytes};
use maci_crypto::{CryptoContext, Fr, Message};

pub mod accumulator;
pub mod error;
pub mod gatekeeper;
pub mod poll;
pub mod types;
pub mod verifier;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(test)]
mod tests;

pub use accumulator::{AccQueue, AccumulatorError, MergePhase, QuinaryTree};
pub use error::{Error, ErrorKind};
pub use poll::*;
pub use types::*;

use gatekeeper::{InitialVoiceCreditProxy, SignUpGatekeeper};
use verifier::{ProofVerifier, VerifierError};

/// Permit access to the current time.
pub trait UnixTime
{
    fn now() -> core::time::Duration;
}

/// The host clock.
pub struct SystemClock;

impl UnixTime for SystemClock
{
    fn now() -> core::time::Duration
    {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
    }
}

pub trait Config
{
    /// The identity of a caller. `Default` is the zero account.
    type AccountId: Clone + Eq + Default + core::fmt::Debug;

    /// Permit access to the current timestamp.
    type TimeProvider: UnixTime;

    /// Checks processing and tally proofs.
    type Verifier: ProofVerifier;

    /// Decides who may sign up.
    type Gatekeeper: SignUpGatekeeper<Self::AccountId>;

    /// Allocates initial voice credits.
    type VoiceCreditProxy: InitialVoiceCreditProxy<Self::AccountId>;

    /// Depth of the state tree shared by every poll.
    const STATE_TREE_DEPTH: u8;

    /// The maximum message tree depth.
    const MAX_TREE_DEPTH: u8;

    /// The maximum vote option tree depth.
    const MAX_VOTE_OPTION_TREE_DEPTH: u8;
}

/// The caller of an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin<AccountId>
{
    Signed(AccountId),
    None,
}

impl<AccountId> Origin<AccountId>
{
    pub fn signed(who: AccountId) -> Self
    {
        Origin::Signed(who)
    }

    pub fn none() -> Self
    {
        Origin::None
    }
}

fn ensure_signed<AccountId>(origin: Origin<AccountId>) -> Result<AccountId, Error>
{
    let Origin::Signed(who) = origin else { Err(Error::BadOrigin)? };
    Ok(who)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event<AccountId>
{
    /// A voter signed up.
    SignUp {
        /// The index of the voter's state leaf.
        state_index: StateIndex,
        /// The voter's public key.
        public_key: PublicKey,
        /// The voter's initial credits.
        voice_credit_balance: u128,
        /// The time of the sign-up.
        timestamp: Timestamp,
    },

    /// A new poll was deployed.
    PollDeployed {
        /// The poll index.
        poll_id: PollId,
        /// The poll coordinator.
        coordinator: AccountId,
        /// The key messages are encrypted to.
        coordinator_public_key: PublicKey,
        /// The time the poll was deployed.
        deploy_time: Timestamp,
        /// The length of the voting window.
        duration: Duration,
        tree_depths: TreeDepths,
        mode: VoteMode,
    },

    /// An encrypted message was published to a poll.
    MessagePublished {
        poll_id: PollId,
        /// The index of the message leaf.
        index: u64,
        /// The ciphertext.
        data: MessageData,
        /// Ephemeral public key used to encrypt the message.
        enc_pub_key: PublicKey,
    },

    /// The state accumulator was merged for a poll.
    StateAqMerged {
        poll_id: PollId,
        state_root: HashBytes,
        num_sign_ups: u64,
    },

    /// A poll's message accumulator was merged.
    MessageAqMerged {
        poll_id: PollId,
        message_root: HashBytes,
        num_messages: u64,
    },

    /// A message processing batch was verified.
    BatchProcessed {
        poll_id: PollId,
        /// The index of the batch within the message tree.
        batch_index: CommitmentIndex,
        commitment: HashBytes,
    },

    /// Every processing batch has been verified.
    ProcessingComplete {
        poll_id: PollId,
        commitment: HashBytes,
    },

    /// A tally batch was verified.
    TallyBatchVerified {
        poll_id: PollId,
        batch_index: CommitmentIndex,
        commitment: HashBytes,
    },

    /// Poll results were verified and stored.
    ResultsPublished {
        poll_id: PollId,
        votes: Vec<u128>,
        total_voters: u64,
    },
}

pub struct Maci<T: Config>
{
    /// The account permitted to deploy polls.
    owner: T::AccountId,

    ctx: Arc<CryptoContext>,

    /// The accumulator of state leaves shared by every poll.
    state_aq: AccQueue,

    /// The number of registered voters.
    num_sign_ups: u64,

    /// Map of ids to polls.
    polls: BTreeMap<PollId, Poll<T::AccountId>>,

    next_poll_id: PollId,

    events: Vec<Event<T::AccountId>>,
}

impl<T: Config> Maci<T>
{
    /// Creates the ledger and occupies state index zero with the blank leaf.
    pub fn new(ctx: Arc<CryptoContext>, owner: T::AccountId) -> Result<Maci<T>, Error>
    {
        let blank = StateLeaf::blank().hash(&ctx)?;
        let (_, state_aq) = AccQueue::new(&ctx, T::STATE_TREE_DEPTH)?
            .enqueue_fr(&ctx, blank)
            .map_err(Error::state_aq)?;

        Ok(Maci {
            owner,
            ctx,
            state_aq,
            num_sign_ups: 0,
            polls: BTreeMap::new(),
            next_poll_id: 0,
            events: Vec::new(),
        })
    }

    fn now() -> Timestamp
    {
        T::TimeProvider::now().as_secs()
    }

    fn deposit_event(&mut self, event: Event<T::AccountId>)
    {
        self.events.push(event);
    }

    fn get_poll(&self, poll_id: PollId) -> Result<&Poll<T::AccountId>, Error>
    {
        let Some(poll) = self.polls.get(&poll_id) else { Err(Error::PollDoesNotExist)? };
        Ok(poll)
    }

    /// Resolves a poll whose coordinator is the signer of `origin`.
    fn coordinated_poll(
        &self,
        origin: Origin<T::AccountId>,
        poll_id: PollId
    ) -> Result<&Poll<T::AccountId>, Error>
    {
        let sender = ensure_signed(origin)?;
        let poll = self.get_poll(poll_id)?;
        if poll.coordinator != sender { Err(Error::NotCoordinator)? }
        Ok(poll)
    }

    fn verify(key: &VerifyKey, proof: &ProofData, inputs: &[Fr]) -> Result<(), Error>
    {
        let valid = T::Verifier::verify(key, proof, inputs).map_err(|e| match e {
            VerifierError::MalformedVerifyKey => Error::MalformedVerifyKey,
            VerifierError::MalformedProof => Error::MalformedProof,
        })?;
        if !valid { Err(Error::InvalidProof)? }
        Ok(())
    }

    /// Register the caller as a voter.
    ///
    /// - `public_key`: The voter's initial public key.
    /// - `gate_data`: Evidence for the sign-up gatekeeper.
    /// - `credit_data`: Evidence for the voice credit proxy.
    ///
    /// Emits `SignUp`.
    pub fn sign_up(
        &mut self,
        origin: Origin<T::AccountId>,
        public_key: PublicKey,
        gate_data: Vec<u8>,
        credit_data: Vec<u8>
    ) -> Result<StateIndex, Error>
    {
        let sender = ensure_signed(origin)?;
        let point = public_key.to_point(&self.ctx)?;

        if !T::Gatekeeper::register(&sender, &gate_data) { Err(Error::SignUpRejected)? }

        let leaf = StateLeaf {
            public_key: point,
            voice_credit_balance: T::VoiceCreditProxy::voice_credits(&sender, &credit_data),
            timestamp: Self::now(),
        };

        let (state_index, state_aq) = self.state_aq
            .clone()
            .enqueue_fr(&self.ctx, leaf.hash(&self.ctx)?)
            .map_err(Error::state_aq)?;

        self.state_aq = state_aq;
        self.num_sign_ups += 1;

        tracing::info!(state_index, "voter signed up");
        self.deposit_event(Event::SignUp {
            state_index,
            public_key,
            voice_credit_balance: leaf.voice_credit_balance,
            timestamp: leaf.timestamp,
        });

        Ok(state_index)
    }

    /// Deploy a new poll. Only the owner may deploy.
    ///
    /// - `title`: A human readable title.
    /// - `duration`: The length of the voting window in seconds.
    /// - `coordinator`: The account which processes and tallies the poll.
    /// - `coordinator_public_key`: The key voters encrypt their messages to.
    /// - `verifying_keys`: Keys for the processing and tally circuits.
    /// - `tree_depths`: The depths the circuits were compiled for.
    /// - `mode`: How vote weights are charged.
    ///
    /// Emits `PollDeployed`.
    pub fn deploy_poll(
        &mut self,
        origin: Origin<T::AccountId>,
        title: String,
        duration: Duration,
        coordinator: T::AccountId,
        coordinator_public_key: PublicKey,
        verifying_keys: VerifyingKeys,
        tree_depths: TreeDepths,
        mode: VoteMode
    ) -> Result<PollId, Error>
    {
        let sender = ensure_signed(origin)?;
        if sender != self.owner { Err(Error::NotOwner)? }

        if duration == 0 { Err(Error::ZeroDuration)? }

        let TreeDepths { message_tree_depth, message_batch_depth, vote_option_tree_depth, int_state_tree_depth } = tree_depths;
        if [message_tree_depth, message_batch_depth, vote_option_tree_depth, int_state_tree_depth].contains(&0)
        {
            Err(Error::ZeroTreeDepth)?
        }

        if coordinator == T::AccountId::default() { Err(Error::ZeroAddress)? }

        if message_tree_depth > T::MAX_TREE_DEPTH
            || message_batch_depth > message_tree_depth
            || vote_option_tree_depth > T::MAX_VOTE_OPTION_TREE_DEPTH
            || int_state_tree_depth > T::STATE_TREE_DEPTH
        {
            Err(Error::InvalidTreeDepths)?
        }

        let point = coordinator_public_key.to_point(&self.ctx)?;

        if !T::Verifier::validate_key(&verifying_keys.process, PROCESS_INPUTS)
            || !T::Verifier::validate_key(&verifying_keys.tally, TALLY_INPUTS)
        {
            Err(Error::MalformedVerifyKey)?
        }

        let messages = AccQueue::new(&self.ctx, message_tree_depth)?;

        let poll_id = self.next_poll_id;
        let created_at = Self::now();
        self.polls.insert(poll_id, Poll {
            index: poll_id,
            title,
            coordinator: coordinator.clone(),
            created_at,
            config: PollConfiguration {
                duration,
                tree_depths,
                mode,
                coordinator_public_key: point,
                verifying_keys,
            },
            state: PollState {
                phase: PollPhase::Voting,
                messages,
                state_root: None,
                num_sign_ups: 0,
                commitment: Commitment::default(),
                outcome: None,
            },
        });
        self.next_poll_id += 1;

        // Sign-ups reopen until this poll merges the state accumulator.
        self.state_aq = self.state_aq.clone().reset_merge();

        tracing::info!(poll_id, duration, "poll deployed");
        self.deposit_event(Event::PollDeployed {
            poll_id,
            coordinator,
            coordinator_public_key,
            deploy_time: created_at,
            duration,
            tree_depths,
            mode,
        });

        Ok(poll_id)
    }

    /// Publish an encrypted command to a poll during its voting window.
    ///
    /// - `poll_id`: The poll.
    /// - `data`: The ciphertext.
    /// - `enc_pub_key`: The ephemeral key the ciphertext was encrypted with.
    ///
    /// Emits `MessagePublished`.
    pub fn publish_message(
        &mut self,
        origin: Origin<T::AccountId>,
        poll_id: PollId,
        data: MessageData,
        enc_pub_key: PublicKey
    ) -> Result<u64, Error>
    {
        ensure_signed(origin)?;
        let poll = self.get_poll(poll_id)?;

        let now = Self::now();
        if !poll.is_voting_period(now) { Err(Error::VotingPeriodOver)? }

        let mut elements = [Fr::default(); maci_crypto::MESSAGE_DATA_LENGTH];
        for (element, bytes) in elements.iter_mut().zip(data.iter())
        {
            *element = fr_from_be_bytes(bytes).map_err(|_| Error::FieldOverflow)?;
        }
        let enc_point = enc_pub_key.to_point(&self.ctx)?;

        let leaf = Message { data: elements }.hash(&self.ctx, &enc_point)?;
        let (index, poll) = poll.clone().consume_message(&self.ctx, now, leaf)?;
        self.polls.insert(poll_id, poll);

        tracing::debug!(poll_id, index, "message published");
        self.deposit_event(Event::MessagePublished { poll_id, index, data, enc_pub_key });

        Ok(index)
    }

    /// Perform at most `steps` sub-root merges of the state accumulator.
    /// A no-op if another poll already merged it.
    pub fn merge_state_aq_sub_roots(
        &mut self,
        origin: Origin<T::AccountId>,
        poll_id: PollId,
        steps: u32
    ) -> Result<(), Error>
    {
        let poll = self.coordinated_poll(origin, poll_id)?;
        if steps == 0 { Err(Error::ZeroBatchCount)? }
        if poll.is_voting_period(Self::now()) { Err(Error::VotingPeriodNotOver)? }
        if poll.state_aq_merged() { Err(Error::StateAqAlreadyMerged)? }

        if self.state_aq.is_merged() { return Ok(()) }

        self.state_aq = self.state_aq
            .clone()
            .merge_sub_roots(&self.ctx, steps)
            .map_err(Error::state_aq)?;

        tracing::debug!(poll_id, phase = ?self.state_aq.phase(), "state sub-roots merged");
        Ok(())
    }

    /// Complete the state accumulator merge and snapshot the state root and
    /// sign-up count into the poll.
    ///
    /// Emits `StateAqMerged`.
    pub fn merge_state_aq(
        &mut self,
        origin: Origin<T::AccountId>,
        poll_id: PollId
    ) -> Result<(), Error>
    {
        let poll = self.coordinated_poll(origin, poll_id)?;
        let now = Self::now();
        if poll.is_voting_period(now) { Err(Error::VotingPeriodNotOver)? }
        if poll.state_aq_merged() { Err(Error::StateAqAlreadyMerged)? }

        let state_aq = if self.state_aq.is_merged()
        {
            self.state_aq.clone()
        }
        else
        {
            self.state_aq.clone().merge(&self.ctx).map_err(Error::state_aq)?
        };
        let Some(state_root) = state_aq.root() else { Err(Error::StateAqNotMerged)? };

        let poll = poll.clone().adopt_state(
            &self.ctx,
            now,
            state_root,
            self.num_sign_ups,
            T::STATE_TREE_DEPTH
        )?;

        self.polls.insert(poll_id, poll);
        self.state_aq = state_aq;

        tracing::info!(poll_id, num_sign_ups = self.num_sign_ups, "state accumulator merged");
        self.deposit_event(Event::StateAqMerged {
            poll_id,
            state_root: fr_to_be_bytes(&state_root),
            num_sign_ups: self.num_sign_ups,
        });

        Ok(())
    }

    /// Perform at most `steps` sub-root merges of a poll's message accumulator.
    pub fn merge_message_aq_sub_roots(
        &mut self,
        origin: Origin<T::AccountId>,
        poll_id: PollId,
        steps: u32
    ) -> Result<(), Error>
    {
        let poll = self.coordinated_poll(origin, poll_id)?
            .clone()
            .merge_message_sub_roots(&self.ctx, Self::now(), steps)?;

        tracing::debug!(poll_id, phase = ?poll.state.messages.phase(), "message sub-roots merged");
        self.polls.insert(poll_id, poll);
        Ok(())
    }

    /// Complete the merge of a poll's message accumulator.
    ///
    /// Emits `MessageAqMerged`.
    pub fn merge_message_aq(
        &mut self,
        origin: Origin<T::AccountId>,
        poll_id: PollId
    ) -> Result<(), Error>
    {
        let poll = self.coordinated_poll(origin, poll_id)?
            .clone()
            .merge_messages(&self.ctx, Self::now())?;

        let message_root = poll.state.messages.root_bytes().unwrap_or_default();
        let num_messages = poll.state.messages.count();
        self.polls.insert(poll_id, poll);

        tracing::info!(poll_id, num_messages, "message accumulator merged");
        self.deposit_event(Event::MessageAqMerged { poll_id, message_root, num_messages });

        Ok(())
    }

    /// Verify one batch of message processing and advance the state and
    /// ballot commitment.
    ///
    /// - `new_sb_commitment`: The commitment after the batch.
    /// - `proof`: A proof over the processing public inputs.
    ///
    /// Emits `BatchProcessed`.
    pub fn process_messages(
        &mut self,
        origin: Origin<T::AccountId>,
        poll_id: PollId,
        new_sb_commitment: HashBytes,
        proof: ProofData
    ) -> Result<(), Error>
    {
        let poll = self.coordinated_poll(origin, poll_id)?;
        let commitment = fr_from_be_bytes(&new_sb_commitment).map_err(|_| Error::FieldOverflow)?;

        let inputs = poll.process_inputs(&self.ctx, commitment)?;
        Self::verify(&poll.config.verifying_keys.process, &proof, &inputs.to_vec())?;

        let batch_index = poll.state.commitment.expected_process - 1 - poll.state.commitment.process.0;
        let poll = poll.clone().commit_process_batch(commitment);
        self.polls.insert(poll_id, poll);

        tracing::info!(poll_id, batch_index, "message batch verified");
        self.deposit_event(Event::BatchProcessed { poll_id, batch_index, commitment: new_sb_commitment });

        Ok(())
    }

    /// Freeze the final state and ballot commitment once every batch is processed.
    ///
    /// Emits `ProcessingComplete`.
    pub fn complete_processing(
        &mut self,
        origin: Origin<T::AccountId>,
        poll_id: PollId
    ) -> Result<(), Error>
    {
        let poll = self.coordinated_poll(origin, poll_id)?.clone().complete_processing()?;
        let commitment = fr_to_be_bytes(&poll.state.commitment.process.1);
        self.polls.insert(poll_id, poll);

        tracing::info!(poll_id, "message processing complete");
        self.deposit_event(Event::ProcessingComplete { poll_id, commitment });

        Ok(())
    }

    /// Verify one tally batch and advance the tally commitment.
    ///
    /// Emits `TallyBatchVerified`.
    pub fn tally_votes(
        &mut self,
        origin: Origin<T::AccountId>,
        poll_id: PollId,
        new_tally_commitment: HashBytes,
        proof: ProofData
    ) -> Result<(), Error>
    {
        let poll = self.coordinated_poll(origin, poll_id)?;
        let commitment = fr_from_be_bytes(&new_tally_commitment).map_err(|_| Error::FieldOverflow)?;

        let inputs = poll.tally_inputs(commitment)?;
        Self::verify(&poll.config.verifying_keys.tally, &proof, &inputs.to_vec())?;

        let batch_index = poll.state.commitment.tally.0;
        let poll = poll.clone().commit_tally_batch(commitment);
        self.polls.insert(poll_id, poll);

        tracing::info!(poll_id, batch_index, "tally batch verified");
        self.deposit_event(Event::TallyBatchVerified { poll_id, batch_index, commitment: new_tally_commitment });

        Ok(())
    }

    /// Publish the plaintext results of a fully tallied poll. The votes must
    /// hash to `tally_results_root` and, together with the spent values, open
    /// the verified tally commitment.
    ///
    /// Emits `ResultsPublished`.
    pub fn publish_results(
        &mut self,
        origin: Origin<T::AccountId>,
        poll_id: PollId,
        votes: Vec<u128>,
        total_voters: u64,
        tally_results_root: HashBytes,
        total_spent: u128,
        per_option_spent_root: HashBytes
    ) -> Result<(), Error>
    {
        let poll = self.coordinated_poll(origin, poll_id)?;
        let tally_results_root = fr_from_be_bytes(&tally_results_root).map_err(|_| Error::FieldOverflow)?;
        let per_option_spent_root = fr_from_be_bytes(&per_option_spent_root).map_err(|_| Error::FieldOverflow)?;

        let poll = poll.clone().publish_results(
            &self.ctx,
            votes.clone(),
            total_voters,
            tally_results_root,
            total_spent,
            per_option_spent_root
        )?;
        self.polls.insert(poll_id, poll);

        tracing::info!(poll_id, total_voters, "results published");
        self.deposit_event(Event::ResultsPublished { poll_id, votes, total_voters });

        Ok(())
    }

    pub fn owner(&self) -> &T::AccountId
    {
        &self.owner
    }

    pub fn ctx(&self) -> &Arc<CryptoContext>
    {
        &self.ctx
    }

    pub fn num_sign_ups(&self) -> u64
    {
        self.num_sign_ups
    }

    pub fn state_aq(&self) -> &AccQueue
    {
        &self.state_aq
    }

    pub fn poll(&self, poll_id: PollId) -> Option<&Poll<T::AccountId>>
    {
        self.polls.get(&poll_id)
    }

    pub fn poll_count(&self) -> u32
    {
        self.next_poll_id
    }

    /// The effective phase of a poll at the current time.
    pub fn poll_phase(&self, poll_id: PollId) -> Option<PollPhase>
    {
        self.polls.get(&poll_id).map(|poll| poll.phase(Self::now()))
    }

    pub fn results(&self, poll_id: PollId) -> Option<&TallyResult>
    {
        self.polls.get(&poll_id).and_then(|poll| poll.state.outcome.as_ref())
    }

    pub fn events(&self) -> &[Event<T::AccountId>]
    {
        &self.events
    }
}
