use ark_bn254::Fr;
use ark_ff::{Field, Zero};
use light_poseidon::{parameters::bn254_x5, PoseidonParameters};

/// Smallest supported permutation width (one input).
pub const MIN_WIDTH: usize = 2;

/// Largest supported permutation width (five inputs).
pub const MAX_WIDTH: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PoseidonError
{
    #[error("invalid number of inputs: {inputs}, the maximum is {max_limit}")]
    InvalidNumberOfInputs {
        inputs: usize,
        max_limit: usize,
    },

    #[error("permutation state has width {width}, expected one of {min}..={max}")]
    InvalidWidth {
        width: usize,
        min: usize,
        max: usize,
    },

    #[error("failed to load round constants: {0}")]
    Parameters(String),
}

/// A circom compatible Poseidon permutation of fixed width.
pub struct Poseidon
{
    params: PoseidonParameters<Fr>,
}

impl Poseidon
{
    /// Loads the circom round constants and MDS matrix for `width`.
    pub fn new_circom(width: usize) -> Result<Poseidon, PoseidonError>
    {
        if !(MIN_WIDTH..=MAX_WIDTH).contains(&width)
        {
            Err(PoseidonError::InvalidWidth { width, min: MIN_WIDTH, max: MAX_WIDTH })?
        }

        let params = bn254_x5::get_poseidon_parameters::<Fr>(width as u8)
            .map_err(|e| PoseidonError::Parameters(e.to_string()))?;

        Ok(Poseidon { params })
    }

    pub fn width(&self) -> usize
    {
        self.params.width
    }

    #[inline(always)]
    fn apply_ark(&self, state: &mut [Fr], round: usize)
    {
        state.iter_mut().enumerate().for_each(|(i, a)| {
            *a += self.params.ark[round * self.params.width + i];
        });
    }

    #[inline(always)]
    fn apply_sbox_full(&self, state: &mut [Fr])
    {
        state.iter_mut().for_each(|a| {
            *a = a.pow([self.params.alpha]);
        });
    }

    #[inline(always)]
    fn apply_sbox_partial(&self, state: &mut [Fr])
    {
        state[0] = state[0].pow([self.params.alpha]);
    }

    #[inline(always)]
    fn apply_mds(&self, state: &mut [Fr])
    {
        let mixed: Vec<Fr> = (0..state.len())
            .map(|i| {
                state
                    .iter()
                    .enumerate()
                    .fold(Fr::zero(), |acc, (j, a)| acc + *a * self.params.mds[i][j])
            })
            .collect();
        state.copy_from_slice(&mixed);
    }

    /// Applies the full permutation in place. The capacity element is `state[0]`.
    pub fn permute(&self, state: &mut [Fr]) -> Result<(), PoseidonError>
    {
        if state.len() != self.params.width
        {
            Err(PoseidonError::InvalidWidth {
                width: state.len(),
                min: self.params.width,
                max: self.params.width
            })?
        }

        let all_rounds = self.params.full_rounds + self.params.partial_rounds;
        let half_rounds = self.params.full_rounds / 2;

        for round in 0..half_rounds
        {
            self.apply_ark(state, round);
            self.apply_sbox_full(state);
            self.apply_mds(state);
        }

        for round in half_rounds..half_rounds + self.params.partial_rounds
        {
            self.apply_ark(state, round);
            self.apply_sbox_partial(state);
            self.apply_mds(state);
        }

        for round in half_rounds + self.params.partial_rounds..all_rounds
        {
            self.apply_ark(state, round);
            self.apply_sbox_full(state);
            self.apply_mds(state);
        }

        Ok(())
    }

    /// Hashes exactly `width - 1` inputs with a zero domain tag.
    pub fn hash(&self, inputs: &[Fr]) -> Result<Fr, PoseidonError>
    {
        if inputs.len() != self.params.width - 1
        {
            Err(PoseidonError::InvalidNumberOfInputs {
                inputs: inputs.len(),
                max_limit: self.params.width - 1,
            })?
        }

        let mut state = Vec::with_capacity(self.params.width);
        state.push(Fr::zero());
        state.extend_from_slice(inputs);
        self.permute(&mut state)?;

        Ok(state[0])
    }
}
