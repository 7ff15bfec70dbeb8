//! Conversions between external representations and the BN254 scalar field.
//!
//! Every value that enters the protocol from outside (ledger calldata, JSON
//! artifacts, key strings) passes through these functions. Values at or above
//! the field order are rejected rather than reduced.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use num_traits::Num;

/// Number of bytes in a serialized field element.
pub const FIELD_BYTES: usize = 32;

/// A big-endian serialized field element.
pub type FieldBytes = [u8; FIELD_BYTES];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError
{
    /// The value is not a canonical residue.
    #[error("value is not less than the field order")]
    Overflow,

    /// The string could not be parsed as a number.
    #[error("malformed numeric string: {0}")]
    MalformedString(String),
}

/// The order of the BN254 scalar field.
pub fn modulus() -> BigUint
{
    BigUint::from_bytes_be(&Fr::MODULUS.to_bytes_be())
}

/// Converts a big-endian byte array into a field element, rejecting
/// values which are not less than the field order.
pub fn fr_from_be_bytes(bytes: &FieldBytes) -> Result<Fr, FieldError>
{
    if BigUint::from_bytes_be(bytes) >= modulus() { Err(FieldError::Overflow)? }
    Ok(Fr::from_be_bytes_mod_order(bytes))
}

/// Serializes a field element as a big-endian byte array.
pub fn fr_to_be_bytes(value: &Fr) -> FieldBytes
{
    let bytes = value.into_bigint().to_bytes_be();
    let mut out = [0u8; FIELD_BYTES];
    out[FIELD_BYTES - bytes.len()..].copy_from_slice(&bytes);
    out
}

/// Converts an arbitrary precision integer into a field element, rejecting
/// values which are not less than the field order.
pub fn fr_from_biguint(value: &BigUint) -> Result<Fr, FieldError>
{
    if value >= &modulus() { Err(FieldError::Overflow)? }
    Ok(Fr::from_le_bytes_mod_order(&value.to_bytes_le()))
}

pub fn fr_to_biguint(value: &Fr) -> BigUint
{
    BigUint::from_bytes_be(&value.into_bigint().to_bytes_be())
}

/// Parses a base 10 string such as those emitted by snarkjs.
pub fn fr_from_decimal_str(value: &str) -> Result<Fr, FieldError>
{
    let n = BigUint::from_str_radix(value, 10)
        .map_err(|_| FieldError::MalformedString(value.into()))?;
    fr_from_biguint(&n)
}

pub fn fr_to_decimal_string(value: &Fr) -> String
{
    fr_to_biguint(value).to_string()
}

pub fn fr_from_u128(value: u128) -> Fr
{
    Fr::from(value)
}

/// Interprets a field element as a `u128`, failing if it does not fit.
pub fn fr_to_u128(value: &Fr) -> Option<u128>
{
    let bytes = fr_to_be_bytes(value);
    if bytes[..16].iter().any(|b| *b != 0) { return None }
    let mut low = [0u8; 16];
    low.copy_from_slice(&bytes[16..]);
    Some(u128::from_be_bytes(low))
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn rejects_modulus()
    {
        let mut bytes = [0u8; 32];
        let m = modulus().to_bytes_be();
        bytes[32 - m.len()..].copy_from_slice(&m);
        assert_eq!(fr_from_be_bytes(&bytes), Err(FieldError::Overflow));
        assert_eq!(fr_from_be_bytes(&[0xff; 32]), Err(FieldError::Overflow));
    }

    #[test]
    fn accepts_largest_residue()
    {
        let largest = modulus() - 1u32;
        let value = fr_from_biguint(&largest).unwrap();
        assert_eq!(value, -Fr::from(1u64));
        assert_eq!(fr_to_biguint(&value), largest);
    }

    #[test]
    fn decimal_strings()
    {
        let value = fr_from_decimal_str("12345678901234567890").unwrap();
        assert_eq!(fr_to_decimal_string(&value), "12345678901234567890");
        assert!(fr_from_decimal_str("0x12").is_err());
        assert_eq!(
            fr_from_decimal_str(&modulus().to_string()),
            Err(FieldError::Overflow)
        );
    }

    #[test]
    fn u128_bounds()
    {
        assert_eq!(fr_to_u128(&fr_from_u128(u128::MAX)), Some(u128::MAX));
        assert_eq!(fr_to_u128(&(fr_from_u128(u128::MAX) + Fr::from(1u64))), None);
    }
}
