mod accumulator;
mod groth16;

use ark_bn254::Fr;

use maci_crypto::field::fr_to_be_bytes;
use maci_crypto::{Keypair, PrivateKey, MESSAGE_DATA_LENGTH};

use crate::mock::*;
use crate::poll::{PollProvider, PublicKey};
use crate::types::{Duration, MessageData, PollId, StateIndex, TreeDepths, VoteMode};
use crate::Origin;

pub const DURATION: Duration = 100;

/// Routes ledger logs to the test harness. `RUST_LOG` selects the level.
pub fn init_tracing()
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn keypair(ledger: &Ledger, seed: u8) -> Keypair
{
    Keypair::new(ledger.ctx(), PrivateKey::from_seed(ledger.ctx(), &[seed; 32]).unwrap())
}

pub fn public_key(ledger: &Ledger, seed: u8) -> PublicKey
{
    PublicKey::from(&keypair(ledger, seed).public_key)
}

pub fn coordinator_key(ledger: &Ledger) -> PublicKey
{
    public_key(ledger, 200)
}

pub fn deploy_with(ledger: &mut Ledger, tree_depths: TreeDepths, mode: VoteMode) -> PollId
{
    init_tracing();
    let key = coordinator_key(ledger);
    ledger
        .deploy_poll(
            Origin::signed(OWNER),
            "proposal".into(),
            DURATION,
            COORDINATOR,
            key,
            verifying_keys(),
            tree_depths,
            mode
        )
        .unwrap()
}

pub fn deploy(ledger: &mut Ledger) -> PollId
{
    deploy_with(ledger, tree_depths(), DEFAULT_MODE)
}

pub fn sign_up(ledger: &mut Ledger, who: u64) -> StateIndex
{
    let key = public_key(ledger, who as u8);
    ledger.sign_up(Origin::signed(who), key, Vec::new(), Vec::new()).unwrap()
}

/// Message data the ledger accepts without being able to read it.
pub fn message_data(seed: u64) -> MessageData
{
    let mut data = [[0u8; 32]; MESSAGE_DATA_LENGTH];
    for (i, element) in data.iter_mut().enumerate()
    {
        *element = fr_to_be_bytes(&Fr::from(seed * 100 + i as u64));
    }
    data
}

pub fn publish(ledger: &mut Ledger, poll_id: PollId, seed: u64) -> u64
{
    let enc = public_key(ledger, 100 + seed as u8);
    ledger.publish_message(Origin::signed(10), poll_id, message_data(seed), enc).unwrap()
}

pub fn end_voting()
{
    MockTime::advance(DURATION);
}

pub fn merge(ledger: &mut Ledger, poll_id: PollId)
{
    let coordinator = || Origin::signed(COORDINATOR);
    ledger.merge_state_aq_sub_roots(coordinator(), poll_id, 64).unwrap();
    ledger.merge_state_aq(coordinator(), poll_id).unwrap();
    ledger.merge_message_aq_sub_roots(coordinator(), poll_id, 64).unwrap();
    ledger.merge_message_aq(coordinator(), poll_id).unwrap();
}

/// Submits a valid proof for the next processing batch.
pub fn process_batch(ledger: &mut Ledger, poll_id: PollId, new_sb_commitment: Fr)
{
    let poll = ledger.poll(poll_id).unwrap();
    let inputs = poll.process_inputs(ledger.ctx(), new_sb_commitment).unwrap();
    let proof = digest_proof(&inputs.to_vec());
    ledger
        .process_messages(Origin::signed(COORDINATOR), poll_id, fr_to_be_bytes(&new_sb_commitment), proof)
        .unwrap();
}

/// Submits a valid proof for the next tally batch.
pub fn tally_batch(ledger: &mut Ledger, poll_id: PollId, new_tally_commitment: Fr)
{
    let poll = ledger.poll(poll_id).unwrap();
    let inputs = poll.tally_inputs(new_tally_commitment).unwrap();
    let proof = digest_proof(&inputs.to_vec());
    ledger
        .tally_votes(Origin::signed(COORDINATOR), poll_id, fr_to_be_bytes(&new_tally_commitment), proof)
        .unwrap();
}
