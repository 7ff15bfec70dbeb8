use ark_bn254::Fr;
use num_bigint::BigUint;
use proptest::prelude::*;

use super::{context, fr, keypair, keypair_from_seed};
use crate::babyjub::Point;
use crate::eddsa::{self, Signature, SignatureError};
use crate::field::fr_to_biguint;

fn scalar(value: &str) -> BigUint
{
    BigUint::parse_bytes(value.as_bytes(), 10).unwrap()
}

#[test]
fn sign_and_verify()
{
    let ctx = context();
    let pair = keypair(&ctx, 4);
    let message = Fr::from(123456789u64);

    let signature = eddsa::sign(&ctx, &pair.private_key, &message).unwrap();
    assert_eq!(eddsa::verify(&ctx, &message, &signature, &pair.public_key), Ok(()));

    // Signing is deterministic.
    assert_eq!(eddsa::sign(&ctx, &pair.private_key, &message).unwrap(), signature);
}

#[test]
fn altered_inputs_fail()
{
    let ctx = context();
    let pair = keypair(&ctx, 4);
    let message = Fr::from(42u64);
    let signature = eddsa::sign(&ctx, &pair.private_key, &message).unwrap();

    assert_eq!(
        eddsa::verify(&ctx, &(message + Fr::from(1u64)), &signature, &pair.public_key),
        Err(SignatureError::Invalid)
    );
    assert_eq!(
        eddsa::verify(&ctx, &message, &signature, &keypair(&ctx, 5).public_key),
        Err(SignatureError::Invalid)
    );

    for bit in [0u64, 1, 17, 200]
    {
        let mut flipped = signature.clone();
        flipped.s ^= BigUint::from(1u8) << bit;
        assert!(eddsa::verify(&ctx, &message, &flipped, &pair.public_key).is_err());
    }

    let mut moved = signature.clone();
    moved.r8 = moved.r8.add(ctx.curve().base8());
    assert_eq!(eddsa::verify(&ctx, &message, &moved, &pair.public_key), Err(SignatureError::Invalid));
}

#[test]
fn scalar_must_be_reduced()
{
    let ctx = context();
    let pair = keypair(&ctx, 4);
    let message = Fr::from(42u64);
    let mut signature = eddsa::sign(&ctx, &pair.private_key, &message).unwrap();

    // S + l is an equivalent scalar but is not canonical.
    signature.s += ctx.curve().order();
    assert_eq!(
        eddsa::verify(&ctx, &message, &signature, &pair.public_key),
        Err(SignatureError::ScalarOutOfRange)
    );
}

#[test]
fn matches_reference_signature()
{
    let ctx = context();
    let seed: Vec<u8> = (0u8..32).collect();
    let pair = keypair_from_seed(&ctx, &seed);
    assert_eq!(
        pair.public_key.as_array(),
        [
            fr("18764351737570239033904382688033741051244337651402037146463669820145352483668"),
            fr("18025424894192605539468605376088368640020941821399299951509013794774446822363"),
        ]
    );

    let message = Fr::from(1234u64);
    let expected = Signature {
        r8: Point {
            x: fr("2837933623836793263059613795826380502977756560548457685340329472141320449991"),
            y: fr("7524327501947979129207435386284837500801619408528405147882496427898494100292"),
        },
        s: scalar("335662962720649802939200939433120997881833337594805309547305689401463413716"),
    };
    assert_eq!(eddsa::sign(&ctx, &pair.private_key, &message).unwrap(), expected);
    assert_eq!(eddsa::verify(&ctx, &message, &expected, &pair.public_key), Ok(()));
}

/// A circomlibjs signature, checked against its circuit identity
/// `S * Base8 == R8 + 8 * H(R8, A, M) * A`.
#[test]
fn circomlib_signature_identity()
{
    let ctx = context();
    let message = Fr::from(42649378395939397566720u128);
    let a = Point {
        x: fr("13277427435165878497778222415993513565335242147425444199013288855685581939618"),
        y: fr("13622229784656158136036771217484571176836296686641868549125388198837476602820"),
    };
    let r8 = Point {
        x: fr("11384336176656855268977457483345535180380036354188103142384839473266348197733"),
        y: fr("15383486972088797283337779941324724402501462225528836549661220478783371668959"),
    };
    let s = scalar("1672775540645840396591609181675628451599263765380031905495115170613215233181");

    assert!(ctx.curve().validate(&a).is_ok());
    assert!(ctx.curve().validate(&r8).is_ok());

    let h = fr_to_biguint(&ctx.hash(&[r8.x, r8.y, a.x, a.y, message]).unwrap());
    let lhs = ctx.curve().mul_base(&s);
    let rhs = r8.add(&a.mul_scalar(&(h * BigUint::from(8u8))));
    assert_eq!(lhs, rhs);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn verifies_only_the_signed_message(
        seed in any::<[u8; 32]>(),
        message in any::<u128>(),
        other in any::<u128>(),
    )
    {
        prop_assume!(message != other);

        let ctx = context();
        let pair = keypair_from_seed(&ctx, &seed);
        let message = Fr::from(message);
        let signature = eddsa::sign(&ctx, &pair.private_key, &message).unwrap();

        prop_assert_eq!(eddsa::verify(&ctx, &message, &signature, &pair.public_key), Ok(()));
        prop_assert_eq!(
            eddsa::verify(&ctx, &Fr::from(other), &signature, &pair.public_key),
            Err(SignatureError::Invalid)
        );
    }
}
