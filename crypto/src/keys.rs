use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};
use sha2::{Digest, Sha512};

use crate::babyjub::{CurveError, Point};
use crate::context::CryptoContext;
use crate::field::FieldBytes;

const PRIVATE_KEY_PREFIX: &str = "macisk.";
const PUBLIC_KEY_PREFIX: &str = "macipk.";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum KeyError
{
    #[error("derived scalar is zero")]
    DegenerateKey,

    #[error("malformed serialized key: {0}")]
    Malformed(String),

    #[error(transparent)]
    Curve(#[from] CurveError),
}

/// A secret key: the seed it was derived from, the clamped scalar, and the
/// upper half of the seed digest which keys signature nonces.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey
{
    seed: Vec<u8>,
    scalar: BigUint,
    prefix: [u8; 32],
}

impl core::fmt::Debug for PrivateKey
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result
    {
        f.write_str("PrivateKey(..)")
    }
}

impl PrivateKey
{
    /// Derives a key from an arbitrary seed: sha512, keep the low 32 bytes,
    /// clamp them as in RFC 8032, read little-endian and reduce modulo the
    /// subgroup order.
    pub fn from_seed(ctx: &CryptoContext, seed: &[u8]) -> Result<PrivateKey, KeyError>
    {
        let digest = Sha512::digest(seed);

        let mut low = [0u8; 32];
        low.copy_from_slice(&digest[..32]);
        low[0] &= 0xf8;
        low[31] &= 0x7f;
        low[31] |= 0x40;

        let scalar = BigUint::from_bytes_le(&low) % ctx.curve().order();
        if scalar == BigUint::default() { Err(KeyError::DegenerateKey)? }

        let mut prefix = [0u8; 32];
        prefix.copy_from_slice(&digest[32..]);

        Ok(PrivateKey { seed: seed.to_vec(), scalar, prefix })
    }

    /// Generates a fresh key from 32 random bytes.
    pub fn generate<R: RngCore + CryptoRng>(ctx: &CryptoContext, rng: &mut R) -> Result<PrivateKey, KeyError>
    {
        let mut seed = [0u8; 32];
        rng.fill_bytes(&mut seed);
        PrivateKey::from_seed(ctx, &seed)
    }

    /// Deterministically derives a key from an externally produced signature,
    /// e.g. a wallet signature over a fixed message.
    pub fn from_signature(ctx: &CryptoContext, signature: &[u8]) -> Result<PrivateKey, KeyError>
    {
        PrivateKey::from_seed(ctx, signature)
    }

    pub fn scalar(&self) -> &BigUint
    {
        &self.scalar
    }

    pub(crate) fn prefix(&self) -> &[u8; 32]
    {
        &self.prefix
    }

    pub fn public_key(&self, ctx: &CryptoContext) -> PublicKey
    {
        PublicKey(ctx.curve().mul_base(&self.scalar))
    }

    pub fn serialize(&self) -> String
    {
        format!("{}{}", PRIVATE_KEY_PREFIX, hex::encode(&self.seed))
    }

    pub fn deserialize(ctx: &CryptoContext, value: &str) -> Result<PrivateKey, KeyError>
    {
        let Some(encoded) = value.strip_prefix(PRIVATE_KEY_PREFIX) else { Err(KeyError::Malformed(value.into()))? };
        let seed = hex::decode(encoded).map_err(|_| KeyError::Malformed(value.into()))?;
        PrivateKey::from_seed(ctx, &seed)
    }
}

/// A public key: a point in the prime order subgroup other than the identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey(pub Point);

impl PublicKey
{
    /// Validates an untrusted point as a public key.
    pub fn from_point(ctx: &CryptoContext, point: Point) -> Result<PublicKey, KeyError>
    {
        ctx.curve().validate(&point)?;
        Ok(PublicKey(point))
    }

    pub fn point(&self) -> &Point
    {
        &self.0
    }

    pub fn as_array(&self) -> [ark_bn254::Fr; 2]
    {
        [self.0.x, self.0.y]
    }

    /// `poseidon2([x, y])`, the form in which coordinator keys enter circuits.
    pub fn hash(&self, ctx: &CryptoContext) -> Result<ark_bn254::Fr, crate::hash::PoseidonError>
    {
        ctx.hash(&self.as_array())
    }

    pub fn serialize(&self) -> String
    {
        format!("{}{}", PUBLIC_KEY_PREFIX, hex::encode(self.0.compress()))
    }

    pub fn deserialize(ctx: &CryptoContext, value: &str) -> Result<PublicKey, KeyError>
    {
        let Some(encoded) = value.strip_prefix(PUBLIC_KEY_PREFIX) else { Err(KeyError::Malformed(value.into()))? };
        let bytes: FieldBytes = hex::decode(encoded)
            .map_err(|_| KeyError::Malformed(value.into()))?
            .try_into()
            .map_err(|_| KeyError::Malformed(value.into()))?;
        PublicKey::from_point(ctx, Point::decompress(&bytes)?)
    }
}

/// A private key together with its public key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keypair
{
    pub private_key: PrivateKey,
    pub public_key: PublicKey,
}

impl Keypair
{
    pub fn new(ctx: &CryptoContext, private_key: PrivateKey) -> Keypair
    {
        let public_key = private_key.public_key(ctx);
        Keypair { private_key, public_key }
    }

    pub fn generate<R: RngCore + CryptoRng>(ctx: &CryptoContext, rng: &mut R) -> Result<Keypair, KeyError>
    {
        Ok(Keypair::new(ctx, PrivateKey::generate(ctx, rng)?))
    }
}
