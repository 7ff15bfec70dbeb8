//! A test runtime: a settable clock, a verifier that accepts digests of the
//! public inputs in place of real proofs, and small tree limits.

use std::cell::Cell;
use std::sync::Arc;

use ark_bn254::Fr;
use sha2::{Digest, Sha256};

use maci_crypto::field::fr_to_be_bytes;
use maci_crypto::CryptoContext;

use crate::gatekeeper::{ConstantInitialVoiceCreditProxy, FreeForAllGatekeeper};
use crate::poll::{ProofData, VerifyKey, VerifyingKeys, PROCESS_INPUTS, TALLY_INPUTS};
use crate::types::{Timestamp, TreeDepths, VoteMode};
use crate::verifier::{ProofVerifier, VerifierError};
use crate::{Config, Maci, UnixTime};

pub const OWNER: u64 = 1;
pub const COORDINATOR: u64 = 2;
pub const INITIAL_VOICE_CREDITS: u128 = 100;
pub const GENESIS: Timestamp = 1_700_000_000;

thread_local! {
    static NOW: Cell<Timestamp> = const { Cell::new(GENESIS) };
}

/// A clock the test thread controls.
pub struct MockTime;

impl MockTime
{
    pub fn get() -> Timestamp
    {
        NOW.with(|now| now.get())
    }

    pub fn set(timestamp: Timestamp)
    {
        NOW.with(|now| now.set(timestamp));
    }

    pub fn advance(seconds: u64)
    {
        Self::set(Self::get() + seconds);
    }
}

impl UnixTime for MockTime
{
    fn now() -> core::time::Duration
    {
        core::time::Duration::from_secs(Self::get())
    }
}

/// Accepts a proof iff `pi_a` is the sha256 digest of the public inputs.
pub struct DigestVerifier;

pub fn inputs_digest(inputs: &[Fr]) -> Vec<u8>
{
    let mut hasher = Sha256::new();
    for input in inputs
    {
        hasher.update(fr_to_be_bytes(input));
    }
    hasher.finalize().to_vec()
}

pub fn digest_proof(inputs: &[Fr]) -> ProofData
{
    ProofData { pi_a: inputs_digest(inputs), pi_b: Vec::new(), pi_c: Vec::new() }
}

impl ProofVerifier for DigestVerifier
{
    fn validate_key(key: &VerifyKey, num_inputs: usize) -> bool
    {
        key.gamma_abc_g1.len() == num_inputs + 1
    }

    fn verify(key: &VerifyKey, proof: &ProofData, inputs: &[Fr]) -> Result<bool, VerifierError>
    {
        if key.gamma_abc_g1.len() != inputs.len() + 1 { Err(VerifierError::MalformedVerifyKey)? }
        if proof.pi_a.len() != 32 { Err(VerifierError::MalformedProof)? }
        Ok(proof.pi_a == inputs_digest(inputs))
    }
}

fn verify_key(num_inputs: usize) -> VerifyKey
{
    VerifyKey {
        alpha_g1: Vec::new(),
        beta_g2: Vec::new(),
        gamma_g2: Vec::new(),
        delta_g2: Vec::new(),
        gamma_abc_g1: vec![Vec::new(); num_inputs + 1],
    }
}

/// Keys accepted by `DigestVerifier`.
pub fn verifying_keys() -> VerifyingKeys
{
    VerifyingKeys { process: verify_key(PROCESS_INPUTS), tally: verify_key(TALLY_INPUTS) }
}

pub fn tree_depths() -> TreeDepths
{
    TreeDepths {
        message_tree_depth: 2,
        message_batch_depth: 1,
        vote_option_tree_depth: 1,
        int_state_tree_depth: 1,
    }
}

pub const DEFAULT_MODE: VoteMode = VoteMode::Quadratic;

pub struct Test;

impl Config for Test
{
    type AccountId = u64;
    type TimeProvider = MockTime;
    type Verifier = DigestVerifier;
    type Gatekeeper = FreeForAllGatekeeper;
    type VoiceCreditProxy = ConstantInitialVoiceCreditProxy<INITIAL_VOICE_CREDITS>;

    const STATE_TREE_DEPTH: u8 = 3;
    const MAX_TREE_DEPTH: u8 = 10;
    const MAX_VOTE_OPTION_TREE_DEPTH: u8 = 3;
}

pub type Ledger = Maci<Test>;

/// A fresh ledger owned by `OWNER` with the clock reset to `GENESIS`.
pub fn new_test_ext() -> Ledger
{
    MockTime::set(GENESIS);
    let ctx = Arc::new(CryptoContext::new().expect("poseidon parameters"));
    Maci::new(ctx, OWNER).expect("blank state leaf")
}
