use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use maci_crypto::{CryptoContext, PrivateKey, PublicKey};
use maci_ledger::PollId;

use crate::error::CoordinatorError;

fn default_merge_steps() -> u32
{
    16
}

fn default_parallel() -> bool
{
    true
}

/// Runtime options of the coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoordinatorConfig
{
    /// Sub-root merge steps submitted per ledger call.
    #[serde(default = "default_merge_steps")]
    pub merge_steps: u32,

    /// Decrypt messages on the rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,

    /// Commands invoked to generate proofs, if proofs are produced externally.
    #[serde(default)]
    pub prover: Option<ProverConfig>,
}

impl Default for CoordinatorConfig
{
    fn default() -> Self
    {
        CoordinatorConfig {
            merge_steps: default_merge_steps(),
            parallel: default_parallel(),
            prover: None,
        }
    }
}

impl CoordinatorConfig
{
    pub fn from_json(json: &str) -> Result<CoordinatorConfig, CoordinatorError>
    {
        Ok(serde_json::from_str(json)?)
    }
}

/// An external proving command per circuit. The witness and proof paths are
/// appended to the arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProverConfig
{
    pub process_command: Vec<String>,
    pub tally_command: Vec<String>,

    /// Directory witnesses and proofs are written to.
    pub work_dir: PathBuf,
}

/// What a poll deployment published for its coordinator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentDescriptor
{
    pub poll_id: PollId,

    /// The serialized public key the poll was deployed with.
    pub coordinator_public_key: String,
}

impl DeploymentDescriptor
{
    pub fn from_json(json: &str) -> Result<DeploymentDescriptor, CoordinatorError>
    {
        Ok(serde_json::from_str(json)?)
    }

    /// Checks the declared key against the one derived from `private_key`.
    pub fn check(&self, ctx: &CryptoContext, private_key: &PrivateKey) -> Result<PublicKey, CoordinatorError>
    {
        let derived = private_key.public_key(ctx);
        let declared = PublicKey::deserialize(ctx, &self.coordinator_public_key).ok();

        if declared != Some(derived)
        {
            Err(CoordinatorError::StaleDescriptor {
                declared: self.coordinator_public_key.clone(),
                derived: derived.serialize(),
            })?
        }
        Ok(derived)
    }
}
