use std::fs;
use std::process::Command;

use ark_bn254::Fr;

use maci_ledger::ProofData;

use crate::config::ProverConfig;
use crate::error::CoordinatorError;
use crate::snarkjs;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Circuit
{
    Process,
    Tally,
}

impl Circuit
{
    pub fn name(&self) -> &'static str
    {
        match self
        {
            Circuit::Process => "process",
            Circuit::Tally => "tally",
        }
    }
}

/// Produces a proof for a circuit from its public inputs and witness.
pub trait Prover
{
    fn prove(
        &self,
        circuit: Circuit,
        public_inputs: &[Fr],
        witness: &serde_json::Value
    ) -> Result<ProofData, CoordinatorError>;
}

/// Runs an external command per proof. The command receives the witness
/// path and the path to write a snarkjs proof to.
pub struct ExternalProver
{
    config: ProverConfig,
}

impl ExternalProver
{
    pub fn new(config: ProverConfig) -> Self
    {
        ExternalProver { config }
    }
}

impl Prover for ExternalProver
{
    fn prove(
        &self,
        circuit: Circuit,
        _public_inputs: &[Fr],
        witness: &serde_json::Value
    ) -> Result<ProofData, CoordinatorError>
    {
        let argv = match circuit
        {
            Circuit::Process => &self.config.process_command,
            Circuit::Tally => &self.config.tally_command,
        };
        let Some((program, args)) = argv.split_first() else {
            Err(CoordinatorError::Prover(format!("no command configured for {}", circuit.name())))?
        };

        fs::create_dir_all(&self.config.work_dir)?;
        let witness_path = self.config.work_dir.join(format!("{}_witness.json", circuit.name()));
        let proof_path = self.config.work_dir.join(format!("{}_proof.json", circuit.name()));
        fs::write(&witness_path, serde_json::to_vec(witness)?)?;

        tracing::debug!(circuit = circuit.name(), program = %program, "invoking prover");
        let status = Command::new(program)
            .args(args)
            .arg(&witness_path)
            .arg(&proof_path)
            .status()?;
        if !status.success()
        {
            Err(CoordinatorError::Prover(format!("{} prover exited with {status}", circuit.name())))?
        }

        snarkjs::proof_from_json(&fs::read_to_string(&proof_path)?)
    }
}
