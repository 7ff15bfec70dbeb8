use maci_ledger::mock::{MockTime, COORDINATOR};
use maci_ledger::{PollPhase, VoteMode};

use crate::client::LocalLedger;
use crate::config::{CoordinatorConfig, DeploymentDescriptor};
use crate::error::CoordinatorError;
use crate::tests::{keypair, Scenario};

fn run(scenario: &mut Scenario, config: CoordinatorConfig) -> Result<crate::PollOutcome, CoordinatorError>
{
    let coordinator = scenario.coordinator(config);
    let descriptor = scenario.descriptor();
    let mut client = LocalLedger::new(&mut scenario.ledger, COORDINATOR);
    coordinator.run(&mut client, &descriptor)
}

#[test]
fn coordinates_poll_to_published_results()
{
    let mut scenario = Scenario::new(3, VoteMode::Quadratic);
    scenario.vote(0, 0, 1, 1);
    scenario.publish_garbage();
    scenario.vote(1, 0, 1, 1);
    scenario.publish_garbage();
    scenario.vote(2, 1, 1, 1);
    scenario.publish_garbage();
    scenario.end_voting();

    let outcome = run(&mut scenario, CoordinatorConfig::default()).unwrap();

    assert_eq!(outcome.result.per_option_votes, vec![2, 1, 0, 0, 0]);
    assert_eq!(outcome.result.total_voters, 3);
    assert_eq!(outcome.result.total_spent, 3);
    assert!(outcome.result.verified);
    assert_eq!(outcome.accepted_messages, 3);
    assert_eq!(outcome.process_batches, 2);
    assert_eq!(outcome.tally_batches, 1);
    assert_eq!(scenario.ledger.poll_phase(scenario.poll_id), Some(PollPhase::Finalized));
}

#[test]
fn empty_poll_publishes_zero_results()
{
    let mut scenario = Scenario::new(2, VoteMode::Quadratic);
    scenario.end_voting();

    let outcome = run(&mut scenario, CoordinatorConfig::default()).unwrap();

    assert_eq!(outcome.result.per_option_votes, vec![0; 5]);
    assert_eq!(outcome.result.total_voters, 0);
    assert_eq!(outcome.result.total_spent, 0);
    assert_eq!(outcome.process_batches, 1);
}

#[test]
fn latest_nonce_overrides_earlier_votes()
{
    let mut scenario = Scenario::new(1, VoteMode::Quadratic);
    scenario.vote(0, 0, 3, 1);
    scenario.vote(0, 1, 2, 2);
    scenario.end_voting();

    let outcome = run(&mut scenario, CoordinatorConfig::default()).unwrap();

    assert_eq!(outcome.result.per_option_votes, vec![0, 2, 0, 0, 0]);
    assert_eq!(outcome.result.total_spent, 4);
    assert_eq!(outcome.accepted_messages, 1);
}

#[test]
fn key_change_invalidates_messages_signed_with_the_old_key()
{
    let mut scenario = Scenario::new(1, VoteMode::Quadratic);
    let ctx = scenario.ctx();
    let old = scenario.voters[0].keypair.clone();
    let new = keypair(&ctx, 77);

    // Published first but replayed last, against the rotated key.
    scenario.publish_signed(0, &old.private_key, old.public_key, 0, 1, 5);
    scenario.publish_signed(0, &old.private_key, new.public_key, 1, 1, 1);
    scenario.end_voting();

    let outcome = run(&mut scenario, CoordinatorConfig::default()).unwrap();

    assert_eq!(outcome.result.per_option_votes, vec![0, 1, 0, 0, 0]);
    assert_eq!(outcome.accepted_messages, 1);
}

#[test]
fn invalid_commands_are_skipped()
{
    let mut scenario = Scenario::new(2, VoteMode::Quadratic);
    let ctx = scenario.ctx();
    let stranger = keypair(&ctx, 55);
    let key = scenario.voters[0].keypair.public_key;

    // Signed by someone else.
    scenario.publish_signed(0, &stranger.private_key, key, 0, 1, 1);
    // Costs 121 of 100 credits.
    scenario.vote(0, 2, 11, 2);
    // Out of range option.
    scenario.vote(1, 5, 1, 3);
    // The only valid command.
    scenario.vote(1, 3, 10, 2);
    scenario.end_voting();

    let outcome = run(&mut scenario, CoordinatorConfig::default()).unwrap();

    assert_eq!(outcome.result.per_option_votes, vec![0, 0, 0, 10, 0]);
    assert_eq!(outcome.result.total_spent, 100);
    assert_eq!(outcome.result.total_voters, 1);
    assert_eq!(outcome.accepted_messages, 1);
}

#[test]
fn linear_mode_charges_the_weight()
{
    let mut scenario = Scenario::new(3, VoteMode::Linear);
    scenario.vote(0, 0, 40, 1);
    scenario.vote(1, 1, 100, 1);
    scenario.vote(2, 4, 7, 1);
    scenario.end_voting();

    let outcome = run(&mut scenario, CoordinatorConfig::default()).unwrap();

    let votes = outcome.result.per_option_votes;
    assert_eq!(votes, vec![40, 100, 0, 0, 7]);
    assert_eq!(outcome.result.total_spent, votes.iter().sum::<u128>());
}

#[test]
fn quadratic_mode_charges_the_square()
{
    let mut scenario = Scenario::new(2, VoteMode::Quadratic);
    scenario.vote(0, 0, 3, 1);
    scenario.vote(1, 1, 4, 1);
    scenario.end_voting();

    let outcome = run(&mut scenario, CoordinatorConfig::default()).unwrap();

    assert_eq!(outcome.result.per_option_votes, vec![3, 4, 0, 0, 0]);
    assert_eq!(outcome.result.total_spent, 9 + 16);
}

#[test]
fn tally_spans_several_batches()
{
    // Five voters and the blank leaf fill two tally batches of five.
    let mut scenario = Scenario::new(5, VoteMode::Quadratic);
    for voter in 0..5
    {
        scenario.vote(voter, voter as u64, 1, 1);
    }
    scenario.end_voting();

    let outcome = run(&mut scenario, CoordinatorConfig::default()).unwrap();

    assert_eq!(outcome.result.per_option_votes, vec![1; 5]);
    assert_eq!(outcome.result.total_voters, 5);
    assert_eq!(outcome.tally_batches, 2);
}

#[test]
fn sequential_and_parallel_decryption_agree()
{
    let cast = |scenario: &mut Scenario| {
        scenario.vote(0, 1, 2, 1);
        scenario.publish_garbage();
        scenario.vote(1, 2, 3, 1);
        scenario.vote(0, 4, 1, 2);
        scenario.end_voting();
    };

    let mut parallel = Scenario::new(2, VoteMode::Quadratic);
    cast(&mut parallel);
    let parallel = run(&mut parallel, CoordinatorConfig::default()).unwrap();

    let mut sequential = Scenario::new(2, VoteMode::Quadratic);
    cast(&mut sequential);
    let config = CoordinatorConfig { parallel: false, ..CoordinatorConfig::default() };
    let sequential = run(&mut sequential, config).unwrap();

    assert_eq!(parallel.result, sequential.result);
    assert_eq!(parallel.result.per_option_votes, vec![0, 0, 3, 0, 1]);
}

#[test]
fn rerun_resubmits_nothing()
{
    let mut scenario = Scenario::new(2, VoteMode::Quadratic);
    scenario.vote(0, 0, 2, 1);
    scenario.vote(1, 1, 1, 1);
    scenario.end_voting();

    let first = run(&mut scenario, CoordinatorConfig::default()).unwrap();
    let second = run(&mut scenario, CoordinatorConfig::default()).unwrap();

    assert_eq!(first.result, second.result);
    assert_eq!(second.process_batches, 0);
    assert_eq!(second.tally_batches, 0);
    assert_eq!(second.accepted_messages, 2);
}

#[test]
fn merges_in_single_steps()
{
    let mut scenario = Scenario::new(3, VoteMode::Quadratic);
    scenario.vote(2, 2, 5, 1);
    scenario.end_voting();

    let config = CoordinatorConfig { merge_steps: 1, ..CoordinatorConfig::default() };
    let outcome = run(&mut scenario, config).unwrap();

    assert_eq!(outcome.result.per_option_votes, vec![0, 0, 5, 0, 0]);
}

#[test]
fn refuses_to_run_during_voting()
{
    let mut scenario = Scenario::new(1, VoteMode::Quadratic);
    scenario.vote(0, 0, 1, 1);

    let result = run(&mut scenario, CoordinatorConfig::default());
    assert!(matches!(result, Err(CoordinatorError::VotingPeriodNotOver(id)) if id == scenario.poll_id));

    MockTime::advance(crate::tests::DURATION);
    assert!(run(&mut scenario, CoordinatorConfig::default()).is_ok());
}

#[test]
fn stale_descriptor_is_rejected()
{
    let mut scenario = Scenario::new(1, VoteMode::Quadratic);
    scenario.end_voting();
    let ctx = scenario.ctx();
    let coordinator = scenario.coordinator(CoordinatorConfig::default());

    let other = keypair(&ctx, 201).public_key.serialize();
    let descriptor = DeploymentDescriptor { poll_id: scenario.poll_id, coordinator_public_key: other };
    let mut client = LocalLedger::new(&mut scenario.ledger, COORDINATOR);
    assert!(matches!(
        coordinator.run(&mut client, &descriptor),
        Err(CoordinatorError::StaleDescriptor { .. })
    ));

    let descriptor = DeploymentDescriptor { poll_id: scenario.poll_id, coordinator_public_key: "macipk.zz".into() };
    assert!(matches!(
        coordinator.run(&mut client, &descriptor),
        Err(CoordinatorError::StaleDescriptor { .. })
    ));
}

#[test]
fn key_the_poll_was_not_deployed_with_is_rejected()
{
    let mut scenario = Scenario::new(1, VoteMode::Quadratic);
    scenario.end_voting();
    let ctx = scenario.ctx();

    // A consistent descriptor, but for a key the poll does not use.
    let imposter = keypair(&ctx, 201);
    let coordinator = crate::Coordinator::new(
        ctx.clone(),
        imposter.private_key.clone(),
        CoordinatorConfig::default(),
        crate::tests::DigestProver
    );
    let descriptor = DeploymentDescriptor {
        poll_id: scenario.poll_id,
        coordinator_public_key: imposter.public_key.serialize(),
    };

    let mut client = LocalLedger::new(&mut scenario.ledger, COORDINATOR);
    assert!(matches!(
        coordinator.run(&mut client, &descriptor),
        Err(CoordinatorError::StaleDescriptor { .. })
    ));
}

#[test]
fn unknown_poll_is_reported()
{
    let mut scenario = Scenario::new(1, VoteMode::Quadratic);
    scenario.end_voting();
    let coordinator = scenario.coordinator(CoordinatorConfig::default());
    let descriptor = DeploymentDescriptor { poll_id: 9, ..scenario.descriptor() };

    let mut client = LocalLedger::new(&mut scenario.ledger, COORDINATOR);
    assert!(coordinator.run(&mut client, &descriptor).is_err());
}
