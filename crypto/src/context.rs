use ark_bn254::Fr;

use crate::babyjub::BabyJubJub;
use crate::hash::{Poseidon, PoseidonError, MAX_WIDTH, MIN_WIDTH};

/// Cryptographic backends, constructed once and passed by reference into every
/// primitive. Holds no mutable state, so a single context may be shared across
/// threads and polls.
pub struct CryptoContext
{
    /// Permutations indexed by `width - MIN_WIDTH`.
    poseidon: Vec<Poseidon>,

    curve: BabyJubJub,
}

impl CryptoContext
{
    pub fn new() -> Result<CryptoContext, PoseidonError>
    {
        let poseidon = (MIN_WIDTH..=MAX_WIDTH)
            .map(Poseidon::new_circom)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(CryptoContext { poseidon, curve: BabyJubJub::new() })
    }

    pub fn curve(&self) -> &BabyJubJub
    {
        &self.curve
    }

    fn permutation(&self, width: usize) -> Result<&Poseidon, PoseidonError>
    {
        width
            .checked_sub(MIN_WIDTH)
            .and_then(|i| self.poseidon.get(i))
            .ok_or(PoseidonError::InvalidWidth { width, min: MIN_WIDTH, max: MAX_WIDTH })
    }

    /// Poseidon hash of one to five inputs.
    pub fn hash(&self, inputs: &[Fr]) -> Result<Fr, PoseidonError>
    {
        if inputs.is_empty() || inputs.len() >= MAX_WIDTH
        {
            Err(PoseidonError::InvalidNumberOfInputs { inputs: inputs.len(), max_limit: MAX_WIDTH - 1 })?
        }
        self.permutation(inputs.len() + 1)?.hash(inputs)
    }

    pub fn hash_left_right(&self, left: Fr, right: Fr) -> Result<Fr, PoseidonError>
    {
        self.hash(&[left, right])
    }

    /// Full Poseidon permutation of a state whose width selects the parameters.
    pub fn permute(&self, state: &mut [Fr]) -> Result<(), PoseidonError>
    {
        self.permutation(state.len())?.permute(state)
    }
}
