//! Baby Jubjub, the twisted Edwards curve embedded in the BN254 scalar field.
//!
//! Points use the circom parameterization `a = 168700`, `d = 168696`, and the
//! generator of the prime order subgroup is `Base8`.

use ark_bn254::Fr;
use ark_ff::{Field, MontFp, One, Zero};
use num_bigint::BigUint;
use num_traits::Num;

use crate::field::{fr_from_biguint, fr_to_biguint, modulus, FieldBytes};

const COEFF_A: Fr = MontFp!("168700");
const COEFF_D: Fr = MontFp!("168696");

const BASE8_X: Fr = MontFp!("5299619240641551281634865583518297030282874472190772894086521144482721001553");
const BASE8_Y: Fr = MontFp!("16950150798460657717958625567821834550301663161624707787222815936182638968203");

const SUBGROUP_ORDER: &str = "2736030358979909402780800718157159386076813972158567259200215660948447373041";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CurveError
{
    #[error("point is not on the curve")]
    NotOnCurve,

    #[error("point is the identity element")]
    Identity,

    #[error("point is not in the prime order subgroup")]
    NotInSubgroup,

    #[error("compressed point does not decode to a curve point")]
    InvalidCompression,
}

/// An affine point on Baby Jubjub.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point
{
    pub x: Fr,
    pub y: Fr,
}

impl Point
{
    /// Constructs a point, checking that it lies on the curve.
    pub fn new(x: Fr, y: Fr) -> Result<Point, CurveError>
    {
        let point = Point { x, y };
        if !point.is_on_curve() { Err(CurveError::NotOnCurve)? }
        Ok(point)
    }

    /// The neutral element `(0, 1)`.
    pub fn identity() -> Point
    {
        Point { x: Fr::zero(), y: Fr::one() }
    }

    pub fn is_identity(&self) -> bool
    {
        self.x.is_zero() && self.y.is_one()
    }

    pub fn is_on_curve(&self) -> bool
    {
        let x2 = self.x.square();
        let y2 = self.y.square();
        COEFF_A * x2 + y2 == Fr::one() + COEFF_D * x2 * y2
    }

    /// Complete twisted Edwards addition.
    pub fn add(&self, other: &Point) -> Point
    {
        let x1x2 = self.x * other.x;
        let y1y2 = self.y * other.y;
        let dxy = COEFF_D * x1x2 * y1y2;

        // The denominators never vanish for points on the curve since `a` is a
        // square and `d` is not.
        let x = (self.x * other.y + self.y * other.x) * (Fr::one() + dxy).inverse().unwrap_or_default();
        let y = (y1y2 - COEFF_A * x1x2) * (Fr::one() - dxy).inverse().unwrap_or_default();

        Point { x, y }
    }

    pub fn double(&self) -> Point
    {
        self.add(self)
    }

    /// Double-and-add scalar multiplication, most significant bit first.
    pub fn mul_scalar(&self, scalar: &BigUint) -> Point
    {
        let mut acc = Point::identity();
        for i in (0..scalar.bits()).rev()
        {
            acc = acc.double();
            if scalar.bit(i) { acc = acc.add(self); }
        }
        acc
    }

    /// Packs the point into 32 bytes: `y` little-endian with the sign of `x`
    /// stored in the most significant bit.
    pub fn compress(&self) -> FieldBytes
    {
        let mut out = [0u8; 32];
        let y = fr_to_biguint(&self.y).to_bytes_le();
        out[..y.len()].copy_from_slice(&y);
        if is_negative(&self.x) { out[31] |= 0x80; }
        out
    }

    pub fn decompress(bytes: &FieldBytes) -> Result<Point, CurveError>
    {
        let mut buf = *bytes;
        let negative = buf[31] & 0x80 != 0;
        buf[31] &= 0x7f;

        let y = fr_from_biguint(&BigUint::from_bytes_le(&buf))
            .map_err(|_| CurveError::InvalidCompression)?;

        let y2 = y.square();
        let denominator = (COEFF_A - COEFF_D * y2).inverse().ok_or(CurveError::InvalidCompression)?;
        let x2 = (Fr::one() - y2) * denominator;
        let Some(mut x) = x2.sqrt() else { Err(CurveError::InvalidCompression)? };

        if is_negative(&x) != negative { x = -x; }

        Point::new(x, y)
    }
}

fn is_negative(value: &Fr) -> bool
{
    let half: BigUint = (modulus() - 1u32) >> 1;
    fr_to_biguint(value) > half
}

/// Curve constants shared by key derivation, key exchange and signatures.
#[derive(Debug, Clone)]
pub struct BabyJubJub
{
    base8: Point,
    order: BigUint,
}

impl BabyJubJub
{
    pub fn new() -> BabyJubJub
    {
        BabyJubJub {
            base8: Point { x: BASE8_X, y: BASE8_Y },
            order: BigUint::from_str_radix(SUBGROUP_ORDER, 10).unwrap_or_default(),
        }
    }

    /// The generator of the prime order subgroup.
    pub fn base8(&self) -> &Point
    {
        &self.base8
    }

    /// The order `l` of the prime order subgroup.
    pub fn order(&self) -> &BigUint
    {
        &self.order
    }

    pub fn mul_base(&self, scalar: &BigUint) -> Point
    {
        self.base8.mul_scalar(scalar)
    }

    /// Checks that `point` is on the curve, is not the identity, and lies in
    /// the prime order subgroup.
    pub fn validate(&self, point: &Point) -> Result<(), CurveError>
    {
        if !point.is_on_curve() { Err(CurveError::NotOnCurve)? }
        if point.is_identity() { Err(CurveError::Identity)? }
        if !point.mul_scalar(&self.order).is_identity() { Err(CurveError::NotInSubgroup)? }
        Ok(())
    }
}

impl Default for BabyJubJub
{
    fn default() -> Self
    {
        BabyJubJub::new()
    }
}
