//! Poseidon duplex-sponge authenticated encryption.
//!
//! Compatible with the circom `PoseidonDecrypt` template: the state has width
//! four (rate three, capacity one), plaintext is absorbed by field addition,
//! and a single field element tag is appended to the ciphertext.

use ark_bn254::Fr;
use ark_ff::{One, Zero};

use crate::context::CryptoContext;
use crate::ecdh::SharedKey;
use crate::hash::PoseidonError;

const RATE: usize = 3;
const WIDTH: usize = RATE + 1;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CipherError
{
    #[error("ciphertext has {actual} elements, expected {expected}")]
    MalformedCiphertext {
        actual: usize,
        expected: usize,
    },

    #[error("padding elements are not zero")]
    InvalidPadding,

    #[error("authentication tag does not match")]
    AuthenticationFailed,

    #[error(transparent)]
    Hash(#[from] PoseidonError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Plaintext(pub Vec<Fr>);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ciphertext(pub Vec<Fr>);

/// Length of the plaintext after zero padding to a multiple of the rate.
pub fn padded_length(length: usize) -> usize
{
    length.div_ceil(RATE) * RATE
}

/// Length of the ciphertext, including the tag, for a plaintext of `length`.
pub fn ciphertext_length(length: usize) -> usize
{
    padded_length(length) + 1
}

fn initial_state(key: &SharedKey, nonce: u128, length: usize) -> [Fr; WIDTH]
{
    let two_pow_128 = Fr::from(u128::MAX) + Fr::one();
    let [k0, k1] = key.as_array();
    [Fr::zero(), k0, k1, Fr::from(nonce) + Fr::from(length as u64) * two_pow_128]
}

pub fn encrypt(
    ctx: &CryptoContext,
    plaintext: &Plaintext,
    key: &SharedKey,
    nonce: u128
) -> Result<Ciphertext, CipherError>
{
    let length = plaintext.0.len();
    let mut message = plaintext.0.clone();
    message.resize(padded_length(length), Fr::zero());

    let mut state = initial_state(key, nonce, length);
    let mut ciphertext = Vec::with_capacity(ciphertext_length(length));

    for block in message.chunks(RATE)
    {
        ctx.permute(&mut state)?;
        for (j, value) in block.iter().enumerate()
        {
            state[j + 1] += value;
            ciphertext.push(state[j + 1]);
        }
    }

    ctx.permute(&mut state)?;
    ciphertext.push(state[1]);

    Ok(Ciphertext(ciphertext))
}

/// Decrypts a ciphertext whose plaintext length is carried out of band.
pub fn decrypt(
    ctx: &CryptoContext,
    ciphertext: &Ciphertext,
    key: &SharedKey,
    nonce: u128,
    length: usize
) -> Result<Plaintext, CipherError>
{
    let expected = ciphertext_length(length);
    if ciphertext.0.len() != expected
    {
        Err(CipherError::MalformedCiphertext { actual: ciphertext.0.len(), expected })?
    }

    let (body, tag) = ciphertext.0.split_at(expected - 1);
    let mut state = initial_state(key, nonce, length);
    let mut message = Vec::with_capacity(body.len());

    for block in body.chunks(RATE)
    {
        ctx.permute(&mut state)?;
        for (j, value) in block.iter().enumerate()
        {
            message.push(*value - state[j + 1]);
            state[j + 1] = *value;
        }
    }

    ctx.permute(&mut state)?;
    if state[1] != tag[0] { Err(CipherError::AuthenticationFailed)? }

    if message[length..].iter().any(|v| !v.is_zero()) { Err(CipherError::InvalidPadding)? }

    message.truncate(length);
    Ok(Plaintext(message))
}
