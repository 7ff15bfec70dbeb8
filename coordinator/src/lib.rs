//! The off-chain coordinator. Reads sign-ups and encrypted messages from the
//! ledger, replays them privately, and submits proofs of each processing and
//! tally batch followed by the final results.

pub mod client;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod processor;
pub mod prover;
pub mod snarkjs;
pub mod state;
pub mod tally;
pub mod witness;

#[cfg(test)]
mod tests;

pub use client::{LedgerClient, LocalLedger, MessageRecord, PollView, SignUpRecord};
pub use config::{CoordinatorConfig, DeploymentDescriptor, ProverConfig};
pub use error::CoordinatorError;
pub use pipeline::{Coordinator, PollOutcome};
pub use prover::{Circuit, ExternalProver, Prover};
pub use state::{CommandRejection, PollReplay};
pub use tally::Tally;
