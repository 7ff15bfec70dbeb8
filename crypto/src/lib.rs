//! Cryptographic primitives shared by the ledger and the coordinator: Poseidon
//! hashing over BN254, Baby Jubjub keys, ECDH, the Poseidon duplex cipher,
//! EdDSA-Poseidon signatures, and the voter command format.

#[cfg(test)]
mod tests;

pub mod babyjub;
pub mod cipher;
pub mod command;
pub mod context;
pub mod ecdh;
pub mod eddsa;
pub mod field;
pub mod hash;
pub mod keys;

pub use ark_bn254::Fr;
pub use babyjub::{BabyJubJub, CurveError, Point};
pub use cipher::{CipherError, Ciphertext, Plaintext};
pub use command::{Command, CommandError, Message, PackedValues, MESSAGE_DATA_LENGTH};
pub use context::CryptoContext;
pub use ecdh::{shared_key, SharedKey};
pub use eddsa::{Signature, SignatureError};
pub use field::{FieldBytes, FieldError, FIELD_BYTES};
pub use hash::PoseidonError;
pub use keys::{KeyError, Keypair, PrivateKey, PublicKey};
