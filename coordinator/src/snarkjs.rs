//! Conversion of snarkjs verification keys and proofs (decimal projective
//! coordinates) into uncompressed arkworks encodings the ledger verifies.

use std::str::FromStr;

use ark_bn254::{Fq, Fq2, G1Affine, G1Projective, G2Affine, G2Projective};
use ark_ff::{BigInteger256, PrimeField};
use ark_serialize::CanonicalSerialize;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

use maci_ledger::{ProofData, VerifyKey};

use crate::error::CoordinatorError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnarkjsVerifyingKey
{
    pub vk_alpha_1: [String; 3],
    pub vk_beta_2: [[String; 2]; 3],
    pub vk_gamma_2: [[String; 2]; 3],
    pub vk_delta_2: [[String; 2]; 3],
    #[serde(rename = "IC", alias = "ic")]
    pub ic: Vec<[String; 3]>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnarkjsProof
{
    pub pi_a: [String; 3],
    pub pi_b: [[String; 2]; 3],
    pub pi_c: [String; 3],
}

fn malformed(what: &str) -> CoordinatorError
{
    CoordinatorError::MalformedArtifact(what.into())
}

fn serialize_point<T: CanonicalSerialize>(point: &T) -> Result<Vec<u8>, CoordinatorError>
{
    let mut bytes = Vec::new();
    point
        .serialize_uncompressed(&mut bytes)
        .map_err(|_| malformed("point serialization"))?;
    Ok(bytes)
}

fn fq_from_str(s: &str) -> Result<Fq, CoordinatorError>
{
    let value = BigUint::from_str(s).map_err(|_| malformed(s))?;
    let value = BigInteger256::try_from(value).map_err(|_| malformed(s))?;
    Fq::from_bigint(value).ok_or_else(|| malformed(s))
}

fn g1_to_bytes(els: &[String; 3]) -> Result<Vec<u8>, CoordinatorError>
{
    let g1 = G1Affine::from(G1Projective::new_unchecked(
        fq_from_str(&els[0])?,
        fq_from_str(&els[1])?,
        fq_from_str(&els[2])?,
    ));
    if !g1.is_on_curve() || !g1.is_in_correct_subgroup_assuming_on_curve()
    {
        Err(malformed("g1 point is not on the curve"))?
    }

    serialize_point(&g1)
}

fn g2_to_bytes(els: &[[String; 2]; 3]) -> Result<Vec<u8>, CoordinatorError>
{
    let x = Fq2::new(fq_from_str(&els[0][0])?, fq_from_str(&els[0][1])?);
    let y = Fq2::new(fq_from_str(&els[1][0])?, fq_from_str(&els[1][1])?);
    let z = Fq2::new(fq_from_str(&els[2][0])?, fq_from_str(&els[2][1])?);
    let g2 = G2Affine::from(G2Projective::new_unchecked(x, y, z));
    if !g2.is_on_curve() || !g2.is_in_correct_subgroup_assuming_on_curve()
    {
        Err(malformed("g2 point is not on the curve"))?
    }

    serialize_point(&g2)
}

pub fn convert_verifying_key(vkey: &SnarkjsVerifyingKey) -> Result<VerifyKey, CoordinatorError>
{
    Ok(VerifyKey {
        alpha_g1: g1_to_bytes(&vkey.vk_alpha_1)?,
        beta_g2: g2_to_bytes(&vkey.vk_beta_2)?,
        gamma_g2: g2_to_bytes(&vkey.vk_gamma_2)?,
        delta_g2: g2_to_bytes(&vkey.vk_delta_2)?,
        gamma_abc_g1: vkey.ic.iter().map(g1_to_bytes).collect::<Result<_, _>>()?,
    })
}

pub fn convert_proof(proof: &SnarkjsProof) -> Result<ProofData, CoordinatorError>
{
    Ok(ProofData {
        pi_a: g1_to_bytes(&proof.pi_a)?,
        pi_b: g2_to_bytes(&proof.pi_b)?,
        pi_c: g1_to_bytes(&proof.pi_c)?,
    })
}

pub fn verifying_key_from_json(json: &str) -> Result<VerifyKey, CoordinatorError>
{
    convert_verifying_key(&serde_json::from_str(json)?)
}

pub fn proof_from_json(json: &str) -> Result<ProofData, CoordinatorError>
{
    convert_proof(&serde_json::from_str(json)?)
}
