use std::collections::BTreeMap;

use ark_bn254::Fr;

use maci_crypto::{CryptoContext, PoseidonError};

use crate::accumulator::{AccumulatorError, ARITY};
use crate::types::capacity;

/// Roots of the all-zero subtrees: `zeroes[0] = zero_leaf` and
/// `zeroes[l + 1] = poseidon5([zeroes[l]; 5])`.
pub fn zeroes(ctx: &CryptoContext, zero_leaf: Fr, depth: u8) -> Result<Vec<Fr>, PoseidonError>
{
    let mut out = Vec::with_capacity(depth as usize + 1);
    out.push(zero_leaf);
    for level in 0..depth as usize
    {
        out.push(ctx.hash(&[out[level]; ARITY])?);
    }
    Ok(out)
}

/// The siblings of a leaf at every level, bottom up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerklePath
{
    /// Position of the node among its siblings at each level.
    pub indices: Vec<u8>,

    /// The other four children at each level, in order.
    pub siblings: Vec<[Fr; ARITY - 1]>,
}

/// A full-depth quinary merkle tree storing only non-zero subtrees.
#[derive(Debug, Clone)]
pub struct QuinaryTree
{
    depth: u8,

    zeroes: Vec<Fr>,

    /// Nodes per level, `nodes[0]` being the leaves. Missing entries are zero subtrees.
    nodes: Vec<BTreeMap<u64, Fr>>,

    /// Index the next `insert` writes to.
    next_index: u64,
}

impl QuinaryTree
{
    pub fn new(ctx: &CryptoContext, depth: u8, zero_leaf: Fr) -> Result<QuinaryTree, PoseidonError>
    {
        Ok(QuinaryTree {
            depth,
            zeroes: zeroes(ctx, zero_leaf, depth)?,
            nodes: vec![BTreeMap::new(); depth as usize + 1],
            next_index: 0,
        })
    }

    pub fn depth(&self) -> u8
    {
        self.depth
    }

    pub fn capacity(&self) -> u64
    {
        capacity(self.depth)
    }

    /// Number of leaves written, counting any gaps left by `update`.
    pub fn len(&self) -> u64
    {
        self.next_index
    }

    pub fn is_empty(&self) -> bool
    {
        self.next_index == 0
    }

    pub fn zeroes(&self) -> &[Fr]
    {
        &self.zeroes
    }

    fn node(&self, level: usize, index: u64) -> Fr
    {
        self.nodes[level].get(&index).copied().unwrap_or(self.zeroes[level])
    }

    pub fn leaf(&self, index: u64) -> Fr
    {
        self.node(0, index)
    }

    pub fn root(&self) -> Fr
    {
        self.node(self.depth as usize, 0)
    }

    /// Appends a leaf and returns its index.
    pub fn insert(&mut self, ctx: &CryptoContext, leaf: Fr) -> Result<u64, AccumulatorError>
    {
        let index = self.next_index;
        if index >= self.capacity() { Err(AccumulatorError::TreeFull)? }
        self.update(ctx, index, leaf)?;
        Ok(index)
    }

    /// Overwrites the leaf at `index` and rehashes its ancestors.
    pub fn update(&mut self, ctx: &CryptoContext, index: u64, leaf: Fr) -> Result<(), AccumulatorError>
    {
        if index >= self.capacity() { Err(AccumulatorError::IndexOutOfRange(index))? }

        self.nodes[0].insert(index, leaf);
        let mut position = index;
        for level in 0..self.depth as usize
        {
            let parent = position / ARITY as u64;
            let first = parent * ARITY as u64;
            let children: Vec<Fr> = (first..first + ARITY as u64)
                .map(|i| self.node(level, i))
                .collect();
            self.nodes[level + 1].insert(parent, ctx.hash(&children)?);
            position = parent;
        }

        self.next_index = self.next_index.max(index + 1);
        Ok(())
    }

    pub fn path(&self, index: u64) -> Result<MerklePath, AccumulatorError>
    {
        if index >= self.capacity() { Err(AccumulatorError::IndexOutOfRange(index))? }

        let mut indices = Vec::with_capacity(self.depth as usize);
        let mut siblings = Vec::with_capacity(self.depth as usize);
        let mut position = index;
        for level in 0..self.depth as usize
        {
            let offset = position % ARITY as u64;
            let first = position - offset;
            let mut others = [Fr::default(); ARITY - 1];
            let mut slot = 0;
            for i in first..first + ARITY as u64
            {
                if i == position { continue; }
                others[slot] = self.node(level, i);
                slot += 1;
            }
            indices.push(offset as u8);
            siblings.push(others);
            position /= ARITY as u64;
        }

        Ok(MerklePath { indices, siblings })
    }

    /// Recomputes the root from a leaf and its path.
    pub fn verify_path(ctx: &CryptoContext, leaf: Fr, path: &MerklePath, root: Fr) -> Result<bool, PoseidonError>
    {
        if path.indices.len() != path.siblings.len() { return Ok(false) }

        let mut node = leaf;
        for (offset, others) in path.indices.iter().zip(path.siblings.iter())
        {
            let offset = *offset as usize;
            if offset >= ARITY { return Ok(false) }

            let mut children = Vec::with_capacity(ARITY);
            children.extend_from_slice(&others[..offset]);
            children.push(node);
            children.extend_from_slice(&others[offset..]);
            node = ctx.hash(&children)?;
        }

        Ok(node == root)
    }
}
