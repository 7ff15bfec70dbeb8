use ark_bn254::Fr;

use crate::babyjub::Point;
use crate::context::CryptoContext;
use crate::keys::{KeyError, PrivateKey, PublicKey};

/// The output of a Diffie-Hellman exchange, used as a two element cipher key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedKey(pub Point);

impl SharedKey
{
    pub fn as_array(&self) -> [Fr; 2]
    {
        [self.0.x, self.0.y]
    }
}

/// Computes `scalar(sk) * pub`. The counterparty key is revalidated so that an
/// identity or small order key can never collapse the exchange.
pub fn shared_key(
    ctx: &CryptoContext,
    private_key: &PrivateKey,
    public_key: &PublicKey
) -> Result<SharedKey, KeyError>
{
    ctx.curve().validate(public_key.point())?;

    let point = public_key.point().mul_scalar(private_key.scalar());
    if point.is_identity() { Err(KeyError::DegenerateKey)? }

    Ok(SharedKey(point))
}
