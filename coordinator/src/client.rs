//! The coordinator's view of the ledger.

use ark_bn254::Fr;

use maci_crypto::field::{fr_from_be_bytes, fr_to_be_bytes};
use maci_crypto::{Message, Point, MESSAGE_DATA_LENGTH};
use maci_ledger::{
    Commitment,
    Config,
    Event,
    Maci,
    MergePhase,
    Origin,
    PollId,
    PollPhase,
    PollProvider,
    ProcessInputs,
    ProofData,
    StateIndex,
    TallyInputs,
    TallyResult,
    Timestamp,
    TreeDepths,
    VoteMode
};

use crate::error::CoordinatorError;

/// The parts of a poll the coordinator reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollView
{
    pub poll_id: PollId,
    pub phase: PollPhase,
    pub tree_depths: TreeDepths,
    pub mode: VoteMode,

    /// Depth of the shared state tree.
    pub state_tree_depth: u8,

    pub coordinator_public_key: Point,
    pub ends_at: Timestamp,

    /// Sign-ups covered by the snapshotted state root.
    pub num_sign_ups: u64,
    pub state_root: Option<Fr>,
    pub message_aq_merged: bool,
    pub num_messages: u64,
    pub commitment: Commitment,
}

impl PollView
{
    pub fn state_aq_merged(&self) -> bool
    {
        self.state_root.is_some()
    }
}

/// A voter registration as recorded by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignUpRecord
{
    pub state_index: StateIndex,
    pub public_key: Point,
    pub voice_credit_balance: u128,
    pub timestamp: Timestamp,
}

/// A published message with its ephemeral key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageRecord
{
    pub index: u64,
    pub message: Message,
    pub enc_public_key: Point,
}

/// Reads and transactions the coordinator pipeline needs.
pub trait LedgerClient
{
    fn poll(&self, poll_id: PollId) -> Result<PollView, CoordinatorError>;

    fn state_aq_phase(&self) -> MergePhase;

    fn message_aq_phase(&self, poll_id: PollId) -> Result<MergePhase, CoordinatorError>;

    /// Every sign-up, ordered by state index.
    fn sign_ups(&self) -> Result<Vec<SignUpRecord>, CoordinatorError>;

    /// Every message of a poll, ordered by index.
    fn messages(&self, poll_id: PollId) -> Result<Vec<MessageRecord>, CoordinatorError>;

    fn process_inputs(&self, poll_id: PollId, new_sb_commitment: Fr) -> Result<ProcessInputs, CoordinatorError>;

    fn tally_inputs(&self, poll_id: PollId, new_tally_commitment: Fr) -> Result<TallyInputs, CoordinatorError>;

    fn results(&self, poll_id: PollId) -> Option<TallyResult>;

    fn merge_state_aq_sub_roots(&mut self, poll_id: PollId, steps: u32) -> Result<(), CoordinatorError>;

    fn merge_state_aq(&mut self, poll_id: PollId) -> Result<(), CoordinatorError>;

    fn merge_message_aq_sub_roots(&mut self, poll_id: PollId, steps: u32) -> Result<(), CoordinatorError>;

    fn merge_message_aq(&mut self, poll_id: PollId) -> Result<(), CoordinatorError>;

    fn process_messages(&mut self, poll_id: PollId, commitment: Fr, proof: ProofData) -> Result<(), CoordinatorError>;

    fn complete_processing(&mut self, poll_id: PollId) -> Result<(), CoordinatorError>;

    fn tally_votes(&mut self, poll_id: PollId, commitment: Fr, proof: ProofData) -> Result<(), CoordinatorError>;

    fn publish_results(&mut self, poll_id: PollId, result: &TallyResult) -> Result<(), CoordinatorError>;
}

/// An in-process ledger driven as `account`. Sign-ups and messages are read
/// back from the ledger's event log, so events must not have been drained.
pub struct LocalLedger<'a, T: Config>
{
    ledger: &'a mut Maci<T>,
    account: T::AccountId,
}

impl<'a, T: Config> LocalLedger<'a, T>
{
    pub fn new(ledger: &'a mut Maci<T>, account: T::AccountId) -> Self
    {
        LocalLedger { ledger, account }
    }

    fn origin(&self) -> Origin<T::AccountId>
    {
        Origin::signed(self.account.clone())
    }

    fn get_poll(&self, poll_id: PollId) -> Result<&maci_ledger::Poll<T::AccountId>, CoordinatorError>
    {
        self.ledger.poll(poll_id).ok_or(CoordinatorError::PollDoesNotExist(poll_id))
    }
}

fn to_point(key: &maci_ledger::PublicKey) -> Result<Point, CoordinatorError>
{
    Ok(Point { x: fr_from_be_bytes(&key.x)?, y: fr_from_be_bytes(&key.y)? })
}

impl<'a, T: Config> LedgerClient for LocalLedger<'a, T>
{
    fn poll(&self, poll_id: PollId) -> Result<PollView, CoordinatorError>
    {
        let poll = self.get_poll(poll_id)?;
        let phase = self.ledger.poll_phase(poll_id).ok_or(CoordinatorError::PollDoesNotExist(poll_id))?;

        Ok(PollView {
            poll_id,
            phase,
            tree_depths: poll.config.tree_depths,
            mode: poll.config.mode,
            state_tree_depth: T::STATE_TREE_DEPTH,
            coordinator_public_key: poll.config.coordinator_public_key,
            ends_at: poll.ends_at(),
            num_sign_ups: poll.state.num_sign_ups,
            state_root: poll.state.state_root,
            message_aq_merged: poll.message_aq_merged(),
            num_messages: poll.state.messages.count(),
            commitment: poll.state.commitment.clone(),
        })
    }

    fn state_aq_phase(&self) -> MergePhase
    {
        self.ledger.state_aq().phase()
    }

    fn message_aq_phase(&self, poll_id: PollId) -> Result<MergePhase, CoordinatorError>
    {
        Ok(self.get_poll(poll_id)?.state.messages.phase())
    }

    fn sign_ups(&self) -> Result<Vec<SignUpRecord>, CoordinatorError>
    {
        let mut records = Vec::new();
        for event in self.ledger.events()
        {
            let Event::SignUp { state_index, public_key, voice_credit_balance, timestamp } = event else { continue };
            records.push(SignUpRecord {
                state_index: *state_index,
                public_key: to_point(public_key)?,
                voice_credit_balance: *voice_credit_balance,
                timestamp: *timestamp,
            });
        }
        Ok(records)
    }

    fn messages(&self, poll_id: PollId) -> Result<Vec<MessageRecord>, CoordinatorError>
    {
        let mut records = Vec::new();
        for event in self.ledger.events()
        {
            let Event::MessagePublished { poll_id: id, index, data, enc_pub_key } = event else { continue };
            if *id != poll_id { continue; }

            let mut elements = [Fr::default(); MESSAGE_DATA_LENGTH];
            for (element, bytes) in elements.iter_mut().zip(data.iter())
            {
                *element = fr_from_be_bytes(bytes)?;
            }
            records.push(MessageRecord {
                index: *index,
                message: Message { data: elements },
                enc_public_key: to_point(enc_pub_key)?,
            });
        }
        Ok(records)
    }

    fn process_inputs(&self, poll_id: PollId, new_sb_commitment: Fr) -> Result<ProcessInputs, CoordinatorError>
    {
        Ok(self.get_poll(poll_id)?.process_inputs(self.ledger.ctx(), new_sb_commitment)?)
    }

    fn tally_inputs(&self, poll_id: PollId, new_tally_commitment: Fr) -> Result<TallyInputs, CoordinatorError>
    {
        Ok(self.get_poll(poll_id)?.tally_inputs(new_tally_commitment)?)
    }

    fn results(&self, poll_id: PollId) -> Option<TallyResult>
    {
        self.ledger.results(poll_id).cloned()
    }

    fn merge_state_aq_sub_roots(&mut self, poll_id: PollId, steps: u32) -> Result<(), CoordinatorError>
    {
        let origin = self.origin();
        Ok(self.ledger.merge_state_aq_sub_roots(origin, poll_id, steps)?)
    }

    fn merge_state_aq(&mut self, poll_id: PollId) -> Result<(), CoordinatorError>
    {
        let origin = self.origin();
        Ok(self.ledger.merge_state_aq(origin, poll_id)?)
    }

    fn merge_message_aq_sub_roots(&mut self, poll_id: PollId, steps: u32) -> Result<(), CoordinatorError>
    {
        let origin = self.origin();
        Ok(self.ledger.merge_message_aq_sub_roots(origin, poll_id, steps)?)
    }

    fn merge_message_aq(&mut self, poll_id: PollId) -> Result<(), CoordinatorError>
    {
        let origin = self.origin();
        Ok(self.ledger.merge_message_aq(origin, poll_id)?)
    }

    fn process_messages(&mut self, poll_id: PollId, commitment: Fr, proof: ProofData) -> Result<(), CoordinatorError>
    {
        let origin = self.origin();
        Ok(self.ledger.process_messages(origin, poll_id, fr_to_be_bytes(&commitment), proof)?)
    }

    fn complete_processing(&mut self, poll_id: PollId) -> Result<(), CoordinatorError>
    {
        let origin = self.origin();
        Ok(self.ledger.complete_processing(origin, poll_id)?)
    }

    fn tally_votes(&mut self, poll_id: PollId, commitment: Fr, proof: ProofData) -> Result<(), CoordinatorError>
    {
        let origin = self.origin();
        Ok(self.ledger.tally_votes(origin, poll_id, fr_to_be_bytes(&commitment), proof)?)
    }

    fn publish_results(&mut self, poll_id: PollId, result: &TallyResult) -> Result<(), CoordinatorError>
    {
        let origin = self.origin();
        Ok(self.ledger.publish_results(
            origin,
            poll_id,
            result.per_option_votes.clone(),
            result.total_voters,
            fr_to_be_bytes(&result.tally_results_root),
            result.total_spent,
            fr_to_be_bytes(&result.per_option_spent_root)
        )?)
    }
}
