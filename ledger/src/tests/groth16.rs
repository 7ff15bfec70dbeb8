use ark_bn254::{Bn254, Fr};
use ark_crypto_primitives::snark::{CircuitSpecificSetupSNARK, SNARK};
use ark_groth16::{Groth16, Proof, VerifyingKey};
use ark_relations::lc;
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError, Variable};
use ark_serialize::CanonicalSerialize;
use rand::{rngs::StdRng, SeedableRng};

use crate::poll::{ProofData, VerifyKey};
use crate::verifier::{Groth16Verifier, ProofVerifier, VerifierError};

/// Knowledge of a square root of the first public input. Every other input
/// is bound by a trivial constraint.
#[derive(Clone)]
struct SquareRoot
{
    root: Fr,
    inputs: Vec<Fr>,
}

impl ConstraintSynthesizer<Fr> for SquareRoot
{
    fn generate_constraints(self, cs: ConstraintSystemRef<Fr>) -> Result<(), SynthesisError>
    {
        let mut inputs = Vec::with_capacity(self.inputs.len());
        for value in self.inputs
        {
            inputs.push(cs.new_input_variable(|| Ok(value))?);
        }
        let root = cs.new_witness_variable(|| Ok(self.root))?;

        cs.enforce_constraint(lc!() + root, lc!() + root, lc!() + inputs[0])?;
        for input in &inputs[1..]
        {
            cs.enforce_constraint(lc!() + *input, lc!() + Variable::One, lc!() + *input)?;
        }
        Ok(())
    }
}

fn to_bytes<T: CanonicalSerialize>(value: &T) -> Vec<u8>
{
    let mut bytes = Vec::new();
    value.serialize_uncompressed(&mut bytes).unwrap();
    bytes
}

fn encode_key(key: &VerifyingKey<Bn254>) -> VerifyKey
{
    VerifyKey {
        alpha_g1: to_bytes(&key.alpha_g1),
        beta_g2: to_bytes(&key.beta_g2),
        gamma_g2: to_bytes(&key.gamma_g2),
        delta_g2: to_bytes(&key.delta_g2),
        gamma_abc_g1: key.gamma_abc_g1.iter().map(to_bytes).collect(),
    }
}

fn encode_proof(proof: &Proof<Bn254>) -> ProofData
{
    ProofData { pi_a: to_bytes(&proof.a), pi_b: to_bytes(&proof.b), pi_c: to_bytes(&proof.c) }
}

fn inputs() -> Vec<Fr>
{
    let mut inputs = vec![Fr::from(49u64)];
    inputs.extend((1..8u64).map(|i| Fr::from(i * 1000)));
    inputs
}

fn setup() -> (VerifyKey, ProofData)
{
    let mut rng = StdRng::seed_from_u64(7);
    let circuit = SquareRoot { root: Fr::from(7u64), inputs: inputs() };

    let (pk, vk) = Groth16::<Bn254>::circuit_specific_setup(circuit.clone(), &mut rng).unwrap();
    let proof = Groth16::<Bn254>::prove(&pk, circuit, &mut rng).unwrap();

    (encode_key(&vk), encode_proof(&proof))
}

#[test]
fn groth16_accepts_valid_proof()
{
    let (key, proof) = setup();

    assert!(Groth16Verifier::validate_key(&key, 8));
    assert!(!Groth16Verifier::validate_key(&key, 6));
    assert_eq!(Groth16Verifier::verify(&key, &proof, &inputs()), Ok(true));
}

#[test]
fn groth16_rejects_other_inputs()
{
    let (key, proof) = setup();

    let mut altered = inputs();
    altered[5] += Fr::from(1u64);
    assert_eq!(Groth16Verifier::verify(&key, &proof, &altered), Ok(false));
}

#[test]
fn groth16_malformed_inputs()
{
    let (key, proof) = setup();

    assert_eq!(
        Groth16Verifier::verify(&key, &proof, &inputs()[..6]),
        Err(VerifierError::MalformedVerifyKey)
    );

    let mut broken = proof.clone();
    broken.pi_b.truncate(10);
    assert_eq!(Groth16Verifier::verify(&key, &broken, &inputs()), Err(VerifierError::MalformedProof));

    let mut broken_key = key.clone();
    broken_key.alpha_g1 = vec![0xff; 64];
    assert!(!Groth16Verifier::validate_key(&broken_key, 8));
    assert_eq!(Groth16Verifier::verify(&broken_key, &proof, &inputs()), Err(VerifierError::MalformedVerifyKey));
}
