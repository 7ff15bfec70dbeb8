mod pipeline;

use std::sync::Arc;

use ark_bn254::Fr;
use rand::{rngs::StdRng, Rng, SeedableRng};

use maci_crypto::field::fr_to_be_bytes;
use maci_crypto::{Command, CryptoContext, Keypair, PrivateKey, PublicKey, MESSAGE_DATA_LENGTH};
use maci_ledger::mock::{digest_proof, tree_depths, verifying_keys, Ledger, MockTime, COORDINATOR, OWNER};
use maci_ledger::{Origin, PollId, ProofData, StateIndex, VoteMode};

use crate::config::{CoordinatorConfig, DeploymentDescriptor};
use crate::error::CoordinatorError;
use crate::pipeline::Coordinator;
use crate::prover::{Circuit, Prover};

pub const DURATION: u64 = 100;
pub const COORDINATOR_SEED: u8 = 200;

/// Proves by digesting the public inputs, as the mock ledger verifies.
pub struct DigestProver;

impl Prover for DigestProver
{
    fn prove(
        &self,
        _circuit: Circuit,
        public_inputs: &[Fr],
        _witness: &serde_json::Value
    ) -> Result<ProofData, CoordinatorError>
    {
        Ok(digest_proof(public_inputs))
    }
}

pub fn init_tracing()
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn keypair(ctx: &CryptoContext, seed: u8) -> Keypair
{
    Keypair::new(ctx, PrivateKey::from_seed(ctx, &[seed; 32]).unwrap())
}

/// A voter's account, current key and state index.
pub struct Voter
{
    pub account: u64,
    pub keypair: Keypair,
    pub state_index: StateIndex,
}

pub struct Scenario
{
    pub ledger: Ledger,
    pub poll_id: PollId,
    pub coordinator: Keypair,
    pub voters: Vec<Voter>,
    pub rng: StdRng,
}

impl Scenario
{
    /// Signs up `voters` voters and deploys a poll.
    pub fn new(voters: u64, mode: VoteMode) -> Scenario
    {
        init_tracing();
        let mut ledger = maci_ledger::mock::new_test_ext();
        let ctx = ledger.ctx().clone();
        let coordinator = keypair(&ctx, COORDINATOR_SEED);

        let voters = (0..voters)
            .map(|i| {
                let account = 10 + i;
                let keypair = keypair(&ctx, account as u8);
                let key = maci_ledger::PublicKey::from(&keypair.public_key);
                let state_index = ledger.sign_up(Origin::signed(account), key, vec![], vec![]).unwrap();
                Voter { account, keypair, state_index }
            })
            .collect();

        let poll_id = ledger
            .deploy_poll(
                Origin::signed(OWNER),
                "proposal".into(),
                DURATION,
                COORDINATOR,
                maci_ledger::PublicKey::from(&coordinator.public_key),
                verifying_keys(),
                tree_depths(),
                mode
            )
            .unwrap();

        Scenario { ledger, poll_id, coordinator, voters, rng: StdRng::seed_from_u64(42) }
    }

    pub fn ctx(&self) -> Arc<CryptoContext>
    {
        self.ledger.ctx().clone()
    }

    /// Publishes a command for voter `voter`, signed with `signer` and
    /// rotating to `new_key`.
    pub fn publish_signed(
        &mut self,
        voter: usize,
        signer: &PrivateKey,
        new_key: PublicKey,
        option: u64,
        weight: u64,
        nonce: u64
    )
    {
        let ctx = self.ctx();
        let command = Command {
            state_index: self.voters[voter].state_index,
            new_public_key: new_key,
            vote_option_index: option,
            new_vote_weight: weight,
            nonce,
            poll_id: self.poll_id as u64,
            salt: Fr::from(self.rng.gen::<u64>()),
        };
        let (message, enc) = command.seal(&ctx, signer, &self.coordinator.public_key, &mut self.rng).unwrap();
        self.publish_raw(self.voters[voter].account, message.data, enc);
    }

    /// Publishes a vote that keeps the voter's key.
    pub fn vote(&mut self, voter: usize, option: u64, weight: u64, nonce: u64)
    {
        let signer = self.voters[voter].keypair.private_key.clone();
        let key = self.voters[voter].keypair.public_key;
        self.publish_signed(voter, &signer, key, option, weight, nonce);
    }

    pub fn publish_raw(&mut self, account: u64, data: [Fr; MESSAGE_DATA_LENGTH], enc: PublicKey)
    {
        let data = data.map(|element| fr_to_be_bytes(&element));
        self.ledger
            .publish_message(Origin::signed(account), self.poll_id, data, maci_ledger::PublicKey::from(&enc))
            .unwrap();
    }

    /// Publishes ciphertext nobody can decrypt.
    pub fn publish_garbage(&mut self)
    {
        let ctx = self.ctx();
        let data = core::array::from_fn(|i| Fr::from(1000 + i as u64));
        let enc = Keypair::generate(&ctx, &mut self.rng).unwrap().public_key;
        self.publish_raw(99, data, enc);
    }

    pub fn end_voting(&self)
    {
        MockTime::advance(DURATION);
    }

    pub fn coordinator(&self, config: CoordinatorConfig) -> Coordinator<DigestProver>
    {
        Coordinator::new(self.ctx(), self.coordinator.private_key.clone(), config, DigestProver)
    }

    pub fn descriptor(&self) -> DeploymentDescriptor
    {
        DeploymentDescriptor {
            poll_id: self.poll_id,
            coordinator_public_key: self.coordinator.public_key.serialize(),
        }
    }
}
