//! An append-only quinary merkle accumulator whose root is computed in two
//! amortized phases: sub-root merging and the final merge to full depth.

pub mod tree;

use ark_bn254::Fr;
use ark_ff::Zero;

use maci_crypto::field::{fr_from_be_bytes, fr_to_be_bytes};
use maci_crypto::{CryptoContext, PoseidonError};

use crate::types::{capacity, HashBytes};

pub use tree::{MerklePath, QuinaryTree};

/// Children per node.
pub const ARITY: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccumulatorError
{
    /// The leaf is not a canonical field element.
    #[error("leaf is not less than the field order")]
    FieldOverflow,

    /// Every leaf of the tree is occupied.
    #[error("the tree is full")]
    TreeFull,

    /// The root has been frozen.
    #[error("the accumulator has already been merged")]
    AlreadyMerged,

    /// Leaves may not be enqueued while a merge is underway.
    #[error("a merge is in progress")]
    MergeInProgress,

    /// `merge` requires the sub-roots to be merged first.
    #[error("sub-roots have not been merged")]
    SubRootsNotMerged,

    /// A merge must take at least one step.
    #[error("merge step count must be positive")]
    ZeroSteps,

    #[error("leaf index {0} is outside of the tree")]
    IndexOutOfRange(u64),

    #[error(transparent)]
    Hash(#[from] PoseidonError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergePhase
{
    /// Accepting leaves.
    Open,

    /// Folding the subtree stack; more steps are needed.
    MergingSubRoots,

    /// A single subtree covers every leaf.
    SubRootsMerged,

    /// The full depth root is frozen.
    Merged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccQueue
{
    /// The maximal depth of the tree.
    depth: u8,

    /// The number of enqueued leaves.
    count: u64,

    /// The (level, hash) pairs of the complete subtrees, left to right.
    stack: Vec<(u8, Fr)>,

    /// Working copy of `stack` folded by `merge_sub_roots`.
    merge_stack: Vec<(u8, Fr)>,

    /// Roots of the all-zero subtrees per level.
    zeroes: Vec<Fr>,

    phase: MergePhase,

    /// The subtree covering every leaf, once sub-roots are merged.
    sub_root: Option<(u8, Fr)>,

    /// The root of the tree of maximal depth which contains the leaves and
    /// zeros elsewhere.
    root: Option<Fr>,
}

impl AccQueue
{
    pub fn new(ctx: &CryptoContext, depth: u8) -> Result<AccQueue, AccumulatorError>
    {
        Ok(AccQueue {
            depth,
            count: 0,
            stack: Vec::new(),
            merge_stack: Vec::new(),
            zeroes: tree::zeroes(ctx, Fr::zero(), depth)?,
            phase: MergePhase::Open,
            sub_root: None,
            root: None,
        })
    }

    pub fn depth(&self) -> u8
    {
        self.depth
    }

    pub fn count(&self) -> u64
    {
        self.count
    }

    pub fn phase(&self) -> MergePhase
    {
        self.phase
    }

    pub fn is_merged(&self) -> bool
    {
        self.phase == MergePhase::Merged
    }

    pub fn root(&self) -> Option<Fr>
    {
        self.root
    }

    pub fn root_bytes(&self) -> Option<HashBytes>
    {
        self.root.as_ref().map(fr_to_be_bytes)
    }

    /// Consumes a new leaf and produces the resultant partially merged tree
    /// along with the index of the leaf.
    pub fn enqueue(
        self,
        ctx: &CryptoContext,
        leaf: &HashBytes
    ) -> Result<(u64, Self), AccumulatorError>
    {
        let leaf = fr_from_be_bytes(leaf).map_err(|_| AccumulatorError::FieldOverflow)?;
        self.enqueue_fr(ctx, leaf)
    }

    pub fn enqueue_fr(
        mut self,
        ctx: &CryptoContext,
        leaf: Fr
    ) -> Result<(u64, Self), AccumulatorError>
    {
        match self.phase
        {
            MergePhase::Open => {},
            MergePhase::Merged => Err(AccumulatorError::AlreadyMerged)?,
            _ => Err(AccumulatorError::MergeInProgress)?,
        }
        if self.count >= capacity(self.depth) { Err(AccumulatorError::TreeFull)? }

        self.stack.push((0, leaf));

        loop
        {
            // We need at least `ARITY` nodes in order to compute a subtree root.
            let size = self.stack.len();
            if size < ARITY { break; }

            let subtree = &self.stack[size - ARITY..];
            let level = subtree[0].0;

            // If the subtree is full compute the corresponding subtree root.
            if !subtree.iter().all(|&(l, _)| l == level) { break; }

            let children: Vec<Fr> = subtree.iter().map(|&(_, hash)| hash).collect();
            let hash = ctx.hash(&children)?;

            self.stack.truncate(size - ARITY);
            self.stack.push((level + 1, hash));
        }

        let index = self.count;
        self.count += 1;
        Ok((index, self))
    }

    /// Performs at most `steps` folds of the subtree stack, padding each
    /// incomplete subtree with zeros, until one subtree covers every leaf.
    pub fn merge_sub_roots(
        mut self,
        ctx: &CryptoContext,
        steps: u32
    ) -> Result<Self, AccumulatorError>
    {
        if steps == 0 { Err(AccumulatorError::ZeroSteps)? }

        match self.phase
        {
            MergePhase::Merged => Err(AccumulatorError::AlreadyMerged)?,
            MergePhase::SubRootsMerged => return Ok(self),
            MergePhase::Open => {
                self.merge_stack = self.stack.clone();
                if self.merge_stack.is_empty() { self.merge_stack.push((0, self.zeroes[0])); }
                self.phase = MergePhase::MergingSubRoots;
            },
            MergePhase::MergingSubRoots => {},
        }

        let mut remaining = steps;
        while self.merge_stack.len() > 1 && remaining > 0
        {
            let Some(&(level, _)) = self.merge_stack.last() else { break };

            let run = self.merge_stack
                .iter()
                .rev()
                .take_while(|(l, _)| *l == level)
                .take(ARITY)
                .count();

            let size = self.merge_stack.len();
            let mut children: Vec<Fr> = self.merge_stack[size - run..]
                .iter()
                .map(|&(_, hash)| hash)
                .collect();
            children.resize(ARITY, self.zeroes[level as usize]);

            let hash = ctx.hash(&children)?;
            self.merge_stack.truncate(size - run);
            self.merge_stack.push((level + 1, hash));
            remaining -= 1;
        }

        if self.merge_stack.len() == 1
        {
            self.sub_root = self.merge_stack.pop();
            self.phase = MergePhase::SubRootsMerged;
        }

        Ok(self)
    }

    /// Extends the merged subtree with zero siblings up to the full depth and
    /// freezes the root.
    pub fn merge(mut self, ctx: &CryptoContext) -> Result<Self, AccumulatorError>
    {
        match self.phase
        {
            MergePhase::Merged => Err(AccumulatorError::AlreadyMerged)?,
            MergePhase::SubRootsMerged => {},
            _ => Err(AccumulatorError::SubRootsNotMerged)?,
        }
        let Some((level, mut hash)) = self.sub_root else { Err(AccumulatorError::SubRootsNotMerged)? };

        for l in level..self.depth
        {
            let mut children = [self.zeroes[l as usize]; ARITY];
            children[0] = hash;
            hash = ctx.hash(&children)?;
        }

        self.root = Some(hash);
        self.phase = MergePhase::Merged;
        Ok(self)
    }

    /// Discards merge progress and any frozen root so that leaves may be
    /// enqueued again.
    pub fn reset_merge(mut self) -> Self
    {
        self.merge_stack.clear();
        self.sub_root = None;
        self.root = None;
        self.phase = MergePhase::Open;
        self
    }
}
