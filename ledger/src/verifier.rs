use ark_bn254::{Bn254, Fr, G1Affine, G2Affine};
use ark_crypto_primitives::snark::SNARK;
use ark_groth16::{Groth16, Proof, VerifyingKey};
use ark_serialize::CanonicalDeserialize;

use crate::poll::{ProofData, VerifyKey};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifierError
{
    #[error("verify key does not decode or has the wrong number of inputs")]
    MalformedVerifyKey,

    #[error("proof does not decode")]
    MalformedProof,
}

/// Checks a proof against a verifying key and public inputs.
pub trait ProofVerifier
{
    /// Returns true iff `key` decodes and accepts exactly `num_inputs` public inputs.
    fn validate_key(key: &VerifyKey, num_inputs: usize) -> bool;

    fn verify(key: &VerifyKey, proof: &ProofData, inputs: &[Fr]) -> Result<bool, VerifierError>;
}

/// Groth16 over BN254 with keys and proofs in arkworks uncompressed encoding.
pub struct Groth16Verifier;

fn g1(bytes: &[u8]) -> Option<G1Affine>
{
    G1Affine::deserialize_uncompressed(bytes).ok()
}

fn g2(bytes: &[u8]) -> Option<G2Affine>
{
    G2Affine::deserialize_uncompressed(bytes).ok()
}

fn decode_key(key: &VerifyKey) -> Option<VerifyingKey<Bn254>>
{
    let gamma_abc_g1 = key.gamma_abc_g1
        .iter()
        .map(|g| g1(g))
        .collect::<Option<Vec<_>>>()?;

    Some(VerifyingKey::<Bn254> {
        alpha_g1: g1(&key.alpha_g1)?,
        beta_g2: g2(&key.beta_g2)?,
        gamma_g2: g2(&key.gamma_g2)?,
        delta_g2: g2(&key.delta_g2)?,
        gamma_abc_g1,
    })
}

fn decode_proof(proof: &ProofData) -> Option<Proof<Bn254>>
{
    Some(Proof::<Bn254> {
        a: g1(&proof.pi_a)?,
        b: g2(&proof.pi_b)?,
        c: g1(&proof.pi_c)?,
    })
}

impl ProofVerifier for Groth16Verifier
{
    fn validate_key(key: &VerifyKey, num_inputs: usize) -> bool
    {
        key.gamma_abc_g1.len() == num_inputs + 1 && decode_key(key).is_some()
    }

    fn verify(key: &VerifyKey, proof: &ProofData, inputs: &[Fr]) -> Result<bool, VerifierError>
    {
        let Some(verify_key) = decode_key(key) else { Err(VerifierError::MalformedVerifyKey)? };
        if verify_key.gamma_abc_g1.len() != inputs.len() + 1 { Err(VerifierError::MalformedVerifyKey)? }

        let Some(proof) = decode_proof(proof) else { Err(VerifierError::MalformedProof)? };

        let pvk = Groth16::<Bn254>::process_vk(&verify_key).map_err(|_| VerifierError::MalformedVerifyKey)?;
        Ok(Groth16::<Bn254>::verify_with_processed_vk(&pvk, inputs, &proof).unwrap_or(false))
    }
}
