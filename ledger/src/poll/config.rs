use maci_crypto::Point;

use crate::poll::VerifyingKeys;
use crate::types::{Duration, TreeDepths, VoteMode};

/// Immutable poll parameters fixed at deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfiguration
{
    /// The number of seconds for which the voting period is active.
    pub duration: Duration,

    /// The depths the circuits were compiled for.
    pub tree_depths: TreeDepths,

    /// How vote weights are charged.
    pub mode: VoteMode,

    /// The coordinator's public key, validated at deployment.
    pub coordinator_public_key: Point,

    /// Keys for the processing and tally circuits.
    pub verifying_keys: VerifyingKeys,
}
