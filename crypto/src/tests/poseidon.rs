use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};

use super::context;
use crate::field::fr_from_decimal_str;
use crate::hash::{Poseidon, PoseidonError};

/// Check the hash of `1` as a prime field element.
#[test]
fn fr_one()
{
    let hasher = Poseidon::new_circom(3).unwrap();

    let expected = [
        0, 122, 243, 70, 226, 211, 4, 39, 158, 121, 224, 169, 243, 2, 63, 119, 18, 148, 167, 138,
        203, 112, 231, 63, 144, 175, 226, 124, 173, 64, 30, 129,
    ];

    let input = Fr::from_be_bytes_mod_order(&[1u8]);
    let hash = hasher.hash(&[input, input]).unwrap();
    assert_eq!(hash.into_bigint().to_bytes_be(), expected);

    let input = Fr::from_be_bytes_mod_order(&[0u8, 0u8, 1u8]);
    let hash = hasher.hash(&[input, input]).unwrap();
    assert_eq!(hash.into_bigint().to_bytes_be(), expected);
}

/// Checks the hash of field elements built from byte slices of ones and twos.
#[test]
fn bytes_ones_twos()
{
    let ctx = context();
    let input1 = Fr::from_be_bytes_mod_order(&[1u8; 32]);
    let input2 = Fr::from_be_bytes_mod_order(&[2u8; 32]);
    let hash = ctx.hash(&[input1, input2]).unwrap();
    assert_eq!(
        hash.into_bigint().to_bytes_be(),
        [
            13, 84, 225, 147, 143, 138, 140, 28, 125, 235, 94, 3, 85, 242, 99, 25, 32, 123, 132,
            254, 156, 162, 206, 27, 38, 231, 53, 200, 41, 130, 25, 144
        ]
    );
}

/// circomlibjs `poseidon([1, 2])`.
#[test]
fn circomlib_one_two()
{
    let ctx = context();
    let expected = fr_from_decimal_str(
        "7853200120776062878684798364095072458815029376092732009249414926327459813530"
    ).unwrap();
    assert_eq!(ctx.hash_left_right(Fr::from(1u64), Fr::from(2u64)).unwrap(), expected);
}

#[test]
fn input_count_bounds()
{
    let ctx = context();
    assert_eq!(
        ctx.hash(&[]),
        Err(PoseidonError::InvalidNumberOfInputs { inputs: 0, max_limit: 5 })
    );
    assert_eq!(
        ctx.hash(&[Fr::from(1u64); 6]),
        Err(PoseidonError::InvalidNumberOfInputs { inputs: 6, max_limit: 5 })
    );
    for n in 1..=5
    {
        assert!(ctx.hash(&vec![Fr::from(1u64); n]).is_ok());
    }
}

#[test]
fn arity_changes_output()
{
    let ctx = context();
    let one = Fr::from(1u64);
    assert_ne!(ctx.hash(&[one, one]).unwrap(), ctx.hash(&[one, one, one]).unwrap());
    assert_ne!(ctx.hash(&[one]).unwrap(), ctx.hash(&[one, Fr::from(0u64)]).unwrap());
}

#[test]
fn unsupported_widths()
{
    assert!(matches!(Poseidon::new_circom(1), Err(PoseidonError::InvalidWidth { .. })));
    assert!(matches!(Poseidon::new_circom(7), Err(PoseidonError::InvalidWidth { .. })));

    let ctx = context();
    let mut state = [Fr::from(0u64); 7];
    assert!(matches!(ctx.permute(&mut state), Err(PoseidonError::InvalidWidth { .. })));
}
