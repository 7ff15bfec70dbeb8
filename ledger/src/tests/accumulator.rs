use ark_bn254::Fr;
use ark_ff::Zero;

use maci_crypto::field::fr_to_be_bytes;
use maci_crypto::CryptoContext;

use crate::accumulator::{AccQueue, AccumulatorError, MergePhase, QuinaryTree};
use crate::{Error, ErrorKind};

fn context() -> CryptoContext
{
    CryptoContext::new().unwrap()
}

fn leaf(i: u64) -> Fr
{
    Fr::from(i * 7 + 3)
}

fn filled(ctx: &CryptoContext, depth: u8, count: u64) -> AccQueue
{
    let mut queue = AccQueue::new(ctx, depth).unwrap();
    for i in 0..count
    {
        let (index, next) = queue.enqueue_fr(ctx, leaf(i)).unwrap();
        assert_eq!(index, i);
        queue = next;
    }
    queue
}

fn reference_root(ctx: &CryptoContext, depth: u8, count: u64) -> Fr
{
    let mut tree = QuinaryTree::new(ctx, depth, Fr::zero()).unwrap();
    for i in 0..count
    {
        tree.insert(ctx, leaf(i)).unwrap();
    }
    tree.root()
}

/// The merged root must match the full tree over the same leaves.
#[test]
fn merged_root_matches_full_tree()
{
    let ctx = context();
    for count in [0, 1, 4, 5, 6, 24, 25, 26, 31, 125]
    {
        let queue = filled(&ctx, 3, count)
            .merge_sub_roots(&ctx, 1_000)
            .unwrap()
            .merge(&ctx)
            .unwrap();

        assert_eq!(queue.root(), Some(reference_root(&ctx, 3, count)), "count {count}");
        assert_eq!(queue.count(), count);
    }
}

/// Sub-root merging may be spread over many calls of a single step.
#[test]
fn merge_sub_roots_in_steps()
{
    let ctx = context();
    let mut queue = filled(&ctx, 3, 13);

    let mut calls = 0;
    while queue.phase() != MergePhase::SubRootsMerged
    {
        queue = queue.merge_sub_roots(&ctx, 1).unwrap();
        calls += 1;
        assert!(calls < 20);
    }
    assert!(calls > 1);

    // Further sub-root merges are a no-op.
    let queue = queue.clone().merge_sub_roots(&ctx, 3).unwrap();
    assert_eq!(queue.phase(), MergePhase::SubRootsMerged);

    let queue = queue.merge(&ctx).unwrap();
    assert_eq!(queue.root(), Some(reference_root(&ctx, 3, 13)));
}

#[test]
fn merge_phase_errors()
{
    let ctx = context();
    let queue = filled(&ctx, 2, 3);

    assert_eq!(queue.clone().merge_sub_roots(&ctx, 0).unwrap_err(), AccumulatorError::ZeroSteps);
    assert_eq!(queue.clone().merge(&ctx).unwrap_err(), AccumulatorError::SubRootsNotMerged);

    let merged = queue.merge_sub_roots(&ctx, 10).unwrap().merge(&ctx).unwrap();
    assert!(merged.is_merged());
    assert_eq!(merged.clone().merge(&ctx).unwrap_err(), AccumulatorError::AlreadyMerged);
    assert_eq!(merged.clone().merge_sub_roots(&ctx, 1).unwrap_err(), AccumulatorError::AlreadyMerged);
    assert_eq!(merged.enqueue_fr(&ctx, Fr::from(1u64)).unwrap_err(), AccumulatorError::AlreadyMerged);
}

#[test]
fn enqueue_rejected_mid_merge()
{
    let ctx = context();
    let queue = filled(&ctx, 2, 7).merge_sub_roots(&ctx, 1).unwrap();
    assert_eq!(queue.phase(), MergePhase::MergingSubRoots);
    assert_eq!(queue.enqueue_fr(&ctx, Fr::from(1u64)).unwrap_err(), AccumulatorError::MergeInProgress);
}

#[test]
fn enqueue_rejects_full_tree_and_overflow()
{
    let ctx = context();
    let queue = filled(&ctx, 1, 5);
    assert_eq!(queue.clone().enqueue_fr(&ctx, Fr::from(1u64)).unwrap_err(), AccumulatorError::TreeFull);

    let queue = AccQueue::new(&ctx, 1).unwrap();
    assert_eq!(queue.enqueue(&ctx, &[0xff; 32]).unwrap_err(), AccumulatorError::FieldOverflow);
}

/// Resetting reopens the queue and the next merge covers the new leaves.
#[test]
fn reset_merge_reopens()
{
    let ctx = context();
    let merged = filled(&ctx, 2, 4).merge_sub_roots(&ctx, 10).unwrap().merge(&ctx).unwrap();

    let reopened = merged.reset_merge().reset_merge();
    assert_eq!(reopened.phase(), MergePhase::Open);
    assert_eq!(reopened.root(), None);

    let (index, reopened) = reopened.enqueue(&ctx, &fr_to_be_bytes(&leaf(4))).unwrap();
    assert_eq!(index, 4);

    let merged = reopened.merge_sub_roots(&ctx, 10).unwrap().merge(&ctx).unwrap();
    assert_eq!(merged.root(), Some(reference_root(&ctx, 2, 5)));
}

#[test]
fn tree_paths_verify()
{
    let ctx = context();
    let mut tree = QuinaryTree::new(&ctx, 3, Fr::zero()).unwrap();
    for i in 0..17
    {
        tree.insert(&ctx, leaf(i)).unwrap();
    }
    tree.update(&ctx, 60, Fr::from(5u64)).unwrap();
    assert_eq!(tree.len(), 61);

    for index in [0, 4, 16, 30, 60, 124]
    {
        let path = tree.path(index).unwrap();
        assert!(QuinaryTree::verify_path(&ctx, tree.leaf(index), &path, tree.root()).unwrap());
        assert!(!QuinaryTree::verify_path(&ctx, Fr::from(999u64), &path, tree.root()).unwrap());
    }

    assert_eq!(tree.path(125).unwrap_err(), AccumulatorError::IndexOutOfRange(125));
    assert_eq!(tree.update(&ctx, 125, Fr::zero()).unwrap_err(), AccumulatorError::IndexOutOfRange(125));

    let error = Error::from(tree.path(125).unwrap_err());
    assert_eq!(error, Error::IndexOutOfRange(125));
    assert_eq!(error.kind(), ErrorKind::InputValidation);
}
