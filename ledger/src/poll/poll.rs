use ark_bn254::Fr;

use crate::accumulator::AccQueue;
use crate::poll::{Commitment, PollConfiguration, TallyResult};
use crate::types::{PollId, Timestamp};

/// Lifecycle of a poll. Phases only ever advance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PollPhase
{
    /// Messages are accepted.
    Voting,

    /// The window has closed; accumulators are being merged.
    Merging,

    /// Both accumulators are merged; batches are being proven.
    Processing,

    /// Results have been published.
    Finalized,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Poll<AccountId>
{
    /// The poll id.
    pub index: PollId,

    pub title: String,

    /// The account permitted to merge, process and tally.
    pub coordinator: AccountId,

    /// The poll deployment time (in seconds).
    pub created_at: Timestamp,

    /// The poll config.
    pub config: PollConfiguration,

    /// The mutable poll state.
    pub state: PollState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollState
{
    /// The stored phase. `Voting` lapses into `Merging` once the window ends.
    pub phase: PollPhase,

    /// The accumulator of message leaves.
    pub messages: AccQueue,

    /// The state root adopted when the state accumulator was merged.
    pub state_root: Option<Fr>,

    /// The number of sign-ups covered by `state_root`.
    pub num_sign_ups: u64,

    /// The current proof commitments.
    pub commitment: Commitment,

    /// The final result of the poll.
    pub outcome: Option<TallyResult>,
}

impl<AccountId> Poll<AccountId>
{
    /// The end of the voting window.
    pub fn ends_at(&self) -> Timestamp
    {
        self.created_at.saturating_add(self.config.duration)
    }

    /// The effective phase at `now`.
    pub fn phase(&self, now: Timestamp) -> PollPhase
    {
        match self.state.phase
        {
            PollPhase::Voting if now >= self.ends_at() => PollPhase::Merging,
            phase => phase,
        }
    }

    pub fn state_aq_merged(&self) -> bool
    {
        self.state.state_root.is_some()
    }

    pub fn message_aq_merged(&self) -> bool
    {
        self.state.messages.is_merged()
    }
}
