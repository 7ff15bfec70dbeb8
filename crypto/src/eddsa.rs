//! EdDSA over Baby Jubjub with Poseidon as the challenge hash.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use sha2::{Digest, Sha512};

use crate::babyjub::Point;
use crate::context::CryptoContext;
use crate::field::fr_to_biguint;
use crate::hash::PoseidonError;
use crate::keys::{PrivateKey, PublicKey};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignatureError
{
    #[error("signature scalar is not less than the subgroup order")]
    ScalarOutOfRange,

    #[error("signature or public key point is invalid")]
    InvalidPoint,

    #[error("signature does not verify")]
    Invalid,

    #[error(transparent)]
    Hash(#[from] PoseidonError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature
{
    pub r8: Point,
    pub s: BigUint,
}

impl Signature
{
    /// The scalar as a field element, as it is carried in command plaintexts.
    pub fn s_field(&self) -> Fr
    {
        Fr::from_le_bytes_mod_order(&self.s.to_bytes_le())
    }

    pub fn from_fields(r8x: Fr, r8y: Fr, s: Fr) -> Signature
    {
        Signature { r8: Point { x: r8x, y: r8y }, s: fr_to_biguint(&s) }
    }
}

fn challenge(
    ctx: &CryptoContext,
    r8: &Point,
    public_key: &Point,
    message: &Fr
) -> Result<BigUint, PoseidonError>
{
    let h = ctx.hash(&[r8.x, r8.y, public_key.x, public_key.y, *message])?;
    Ok(fr_to_biguint(&h))
}

pub fn sign(ctx: &CryptoContext, private_key: &PrivateKey, message: &Fr) -> Result<Signature, PoseidonError>
{
    let order = ctx.curve().order();

    let mut hasher = Sha512::new();
    hasher.update(private_key.prefix());
    hasher.update(message.into_bigint().to_bytes_le());
    let r = BigUint::from_bytes_le(&hasher.finalize()) % order;

    let r8 = ctx.curve().mul_base(&r);
    let public_key = private_key.public_key(ctx);
    let h = challenge(ctx, &r8, public_key.point(), message)?;
    let s = (r + h * private_key.scalar()) % order;

    Ok(Signature { r8, s })
}

/// Checks `S * Base8 == R8 + H(R8, A, M) * A`.
pub fn verify(
    ctx: &CryptoContext,
    message: &Fr,
    signature: &Signature,
    public_key: &PublicKey
) -> Result<(), SignatureError>
{
    if &signature.s >= ctx.curve().order() { Err(SignatureError::ScalarOutOfRange)? }

    let a = public_key.point();
    if !signature.r8.is_on_curve() || !a.is_on_curve() || a.is_identity()
    {
        Err(SignatureError::InvalidPoint)?
    }

    let h = challenge(ctx, &signature.r8, a, message)?;
    let lhs = ctx.curve().mul_base(&signature.s);
    let rhs = signature.r8.add(&a.mul_scalar(&h));

    if lhs != rhs { Err(SignatureError::Invalid)? }
    Ok(())
}
