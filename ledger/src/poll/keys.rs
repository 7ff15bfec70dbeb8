use serde::{Deserialize, Serialize};

use maci_crypto::field::{fr_from_be_bytes, fr_to_be_bytes};
use maci_crypto::{CryptoContext, Point};

use crate::error::Error;
use crate::types::HashBytes;

/// A zk verification key, each element an uncompressed arkworks point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyKey
{
    pub alpha_g1: Vec<u8>,
    pub beta_g2: Vec<u8>,
    pub gamma_g2: Vec<u8>,
    pub delta_g2: Vec<u8>,
    pub gamma_abc_g1: Vec<Vec<u8>>,
}

/// A serialized groth16 proof.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofData
{
    pub pi_a: Vec<u8>,
    pub pi_b: Vec<u8>,
    pub pi_c: Vec<u8>,
}

/// A pair of verification keys for message processing and tally verification circuits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKeys
{
    /// The verifying key for the message processing circuit.
    pub process: VerifyKey,

    /// The verifying key for the tally circuit.
    pub tally: VerifyKey,
}

/// A public key used to facilitate secret sharing between participants and coordinators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PublicKey
{
    /// The big-endian x-coordinate of the public key.
    pub x: HashBytes,

    /// The big-endian y-coordinate of the public key.
    pub y: HashBytes,
}

impl PublicKey
{
    /// Decodes and validates the key as a point in the prime order subgroup.
    pub fn to_point(&self, ctx: &CryptoContext) -> Result<Point, Error>
    {
        let x = fr_from_be_bytes(&self.x).map_err(|_| Error::FieldOverflow)?;
        let y = fr_from_be_bytes(&self.y).map_err(|_| Error::FieldOverflow)?;
        let point = Point { x, y };
        ctx.curve().validate(&point).map_err(|_| Error::InvalidPublicKey)?;
        Ok(point)
    }
}

impl From<&Point> for PublicKey
{
    fn from(point: &Point) -> Self
    {
        PublicKey { x: fr_to_be_bytes(&point.x), y: fr_to_be_bytes(&point.y) }
    }
}

impl From<&maci_crypto::PublicKey> for PublicKey
{
    fn from(key: &maci_crypto::PublicKey) -> Self
    {
        PublicKey::from(key.point())
    }
}
