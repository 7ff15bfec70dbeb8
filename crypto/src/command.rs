//! Voter commands: packing, signing, and encryption into ledger messages.

use ark_bn254::Fr;
use ark_ff::PrimeField;
use num_bigint::BigUint;
use rand::{CryptoRng, RngCore};

use crate::babyjub::Point;
use crate::cipher::{self, Ciphertext, CipherError, Plaintext};
use crate::context::CryptoContext;
use crate::ecdh::{self, SharedKey};
use crate::eddsa::{self, Signature, SignatureError};
use crate::field::fr_to_biguint;
use crate::hash::PoseidonError;
use crate::keys::{KeyError, Keypair, PrivateKey, PublicKey};

/// Width in bits of each slot of a packed command.
pub const PACKED_SLOT_BITS: u32 = 50;

/// Number of slots in a packed command.
pub const PACKED_SLOTS: u32 = 5;

/// Plaintext elements: packed values, new key (x, y), salt, R8 (x, y), S.
pub const COMMAND_PLAINTEXT_LENGTH: usize = 7;

/// Ciphertext elements of an encrypted command, including the tag.
pub const MESSAGE_DATA_LENGTH: usize = 10;

/// Messages are encrypted under a fresh ephemeral key, so the nonce is fixed.
pub const MESSAGE_NONCE: u128 = 0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError
{
    #[error("{0} does not fit in {PACKED_SLOT_BITS} bits")]
    FieldOverflow(&'static str),

    #[error("packed command has bits set above the last slot")]
    PackedOverflow,

    #[error(transparent)]
    Cipher(#[from] CipherError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Hash(#[from] PoseidonError),
}

/// A plaintext instruction from a voter: cast a vote, change keys, or both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command
{
    pub state_index: u64,
    pub new_public_key: PublicKey,
    pub vote_option_index: u64,
    pub new_vote_weight: u64,
    pub nonce: u64,
    pub poll_id: u64,
    pub salt: Fr,
}

/// The five packed slots of a command, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PackedValues
{
    pub state_index: u64,
    pub vote_option_index: u64,
    pub new_vote_weight: u64,
    pub nonce: u64,
    pub poll_id: u64,
}

impl PackedValues
{
    pub fn pack(&self) -> Result<Fr, CommandError>
    {
        let slots = [
            (self.state_index, "state index"),
            (self.vote_option_index, "vote option index"),
            (self.new_vote_weight, "vote weight"),
            (self.nonce, "nonce"),
            (self.poll_id, "poll id"),
        ];

        let mut packed = BigUint::default();
        for (i, (value, name)) in slots.iter().enumerate()
        {
            if *value >> PACKED_SLOT_BITS != 0 { Err(CommandError::FieldOverflow(*name))? }
            packed |= BigUint::from(*value) << (i as u32 * PACKED_SLOT_BITS);
        }

        Ok(Fr::from_le_bytes_mod_order(&packed.to_bytes_le()))
    }

    pub fn unpack(packed: &Fr) -> Result<PackedValues, CommandError>
    {
        let value = fr_to_biguint(packed);
        if value.bits() > (PACKED_SLOTS * PACKED_SLOT_BITS) as u64 { Err(CommandError::PackedOverflow)? }

        let mask = (BigUint::from(1u8) << PACKED_SLOT_BITS) - 1u8;
        let slot = |i: u32| -> u64 {
            let digits = ((&value >> (i * PACKED_SLOT_BITS)) & &mask).to_u64_digits();
            digits.first().copied().unwrap_or(0)
        };

        Ok(PackedValues {
            state_index: slot(0),
            vote_option_index: slot(1),
            new_vote_weight: slot(2),
            nonce: slot(3),
            poll_id: slot(4),
        })
    }
}

impl Command
{
    pub fn packed_values(&self) -> PackedValues
    {
        PackedValues {
            state_index: self.state_index,
            vote_option_index: self.vote_option_index,
            new_vote_weight: self.new_vote_weight,
            nonce: self.nonce,
            poll_id: self.poll_id,
        }
    }

    /// The single field element a voter signs:
    /// `poseidon4([packed, new_key.x, new_key.y, salt])`.
    pub fn hash(&self, ctx: &CryptoContext) -> Result<Fr, CommandError>
    {
        let packed = self.packed_values().pack()?;
        let [x, y] = self.new_public_key.as_array();
        Ok(ctx.hash(&[packed, x, y, self.salt])?)
    }

    pub fn sign(&self, ctx: &CryptoContext, private_key: &PrivateKey) -> Result<Signature, CommandError>
    {
        Ok(eddsa::sign(ctx, private_key, &self.hash(ctx)?)?)
    }

    pub fn verify_signature(
        &self,
        ctx: &CryptoContext,
        signature: &Signature,
        public_key: &PublicKey
    ) -> Result<(), SignatureError>
    {
        let hash = self.hash(ctx).map_err(|_| SignatureError::Invalid)?;
        eddsa::verify(ctx, &hash, signature, public_key)
    }

    fn to_plaintext(&self, signature: &Signature) -> Result<Plaintext, CommandError>
    {
        let [x, y] = self.new_public_key.as_array();
        Ok(Plaintext(vec![
            self.packed_values().pack()?,
            x,
            y,
            self.salt,
            signature.r8.x,
            signature.r8.y,
            signature.s_field(),
        ]))
    }

    /// Encrypts a signed command under a key shared with the coordinator.
    pub fn encrypt(
        &self,
        ctx: &CryptoContext,
        signature: &Signature,
        shared_key: &SharedKey
    ) -> Result<Message, CommandError>
    {
        let ciphertext = cipher::encrypt(ctx, &self.to_plaintext(signature)?, shared_key, MESSAGE_NONCE)?;
        let data: [Fr; MESSAGE_DATA_LENGTH] = ciphertext.0
            .try_into()
            .map_err(|v: Vec<Fr>| CipherError::MalformedCiphertext { actual: v.len(), expected: MESSAGE_DATA_LENGTH })?;
        Ok(Message { data })
    }

    /// Signs with the voter's current key and encrypts for the coordinator
    /// under a freshly generated ephemeral key. Returns the message and the
    /// ephemeral public key to publish alongside it.
    pub fn seal<R: RngCore + CryptoRng>(
        &self,
        ctx: &CryptoContext,
        voter_key: &PrivateKey,
        coordinator_key: &PublicKey,
        rng: &mut R
    ) -> Result<(Message, PublicKey), CommandError>
    {
        let signature = self.sign(ctx, voter_key)?;
        let ephemeral = Keypair::generate(ctx, rng)?;
        let shared_key = ecdh::shared_key(ctx, &ephemeral.private_key, coordinator_key)?;
        Ok((self.encrypt(ctx, &signature, &shared_key)?, ephemeral.public_key))
    }

    /// Decrypts and unpacks a message. The new public key and the signature
    /// are returned unvalidated; callers check them against ledger state.
    pub fn decrypt(
        ctx: &CryptoContext,
        message: &Message,
        shared_key: &SharedKey
    ) -> Result<(Command, Signature), CommandError>
    {
        let ciphertext = Ciphertext(message.data.to_vec());
        let plaintext = cipher::decrypt(ctx, &ciphertext, shared_key, MESSAGE_NONCE, COMMAND_PLAINTEXT_LENGTH)?.0;

        let values = PackedValues::unpack(&plaintext[0])?;
        let command = Command {
            state_index: values.state_index,
            new_public_key: PublicKey(Point { x: plaintext[1], y: plaintext[2] }),
            vote_option_index: values.vote_option_index,
            new_vote_weight: values.new_vote_weight,
            nonce: values.nonce,
            poll_id: values.poll_id,
            salt: plaintext[3],
        };
        let signature = Signature::from_fields(plaintext[4], plaintext[5], plaintext[6]);

        Ok((command, signature))
    }
}

/// An encrypted command as it is published to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message
{
    pub data: [Fr; MESSAGE_DATA_LENGTH],
}

impl Message
{
    /// The message accumulator leaf:
    /// `poseidon4([poseidon5(data[..5]), poseidon5(data[5..]), enc.x, enc.y])`.
    pub fn hash(&self, ctx: &CryptoContext, enc_public_key: &Point) -> Result<Fr, PoseidonError>
    {
        let left = ctx.hash(&self.data[..5])?;
        let right = ctx.hash(&self.data[5..])?;
        ctx.hash(&[left, right, enc_public_key.x, enc_public_key.y])
    }
}
