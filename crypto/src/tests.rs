mod eddsa;
mod poseidon;

use ark_bn254::Fr;

use crate::context::CryptoContext;
use crate::field::fr_from_decimal_str;
use crate::keys::{Keypair, PrivateKey};

pub fn context() -> CryptoContext
{
    CryptoContext::new().unwrap()
}

/// A deterministic keypair derived from a one byte seed.
pub fn keypair(ctx: &CryptoContext, seed: u8) -> Keypair
{
    Keypair::new(ctx, PrivateKey::from_seed(ctx, &[seed; 32]).unwrap())
}

pub fn keypair_from_seed(ctx: &CryptoContext, seed: &[u8]) -> Keypair
{
    Keypair::new(ctx, PrivateKey::from_seed(ctx, seed).unwrap())
}

pub fn fr(value: &str) -> Fr
{
    fr_from_decimal_str(value).unwrap()
}
