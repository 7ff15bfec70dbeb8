use rayon::prelude::*;

use maci_crypto::{shared_key, Command, CommandError, CryptoContext, PrivateKey, PublicKey, Signature};

use crate::client::MessageRecord;
use crate::error::CoordinatorError;
use crate::state::{CommandRejection, LeafSnapshot, PollReplay};

/// A message together with the outcome of decrypting it.
#[derive(Debug, Clone)]
pub struct DecryptedMessage
{
    pub record: MessageRecord,
    pub command: Result<(Command, Signature), CommandError>,
}

fn decrypt(ctx: &CryptoContext, private_key: &PrivateKey, record: MessageRecord) -> DecryptedMessage
{
    let command = shared_key(ctx, private_key, &PublicKey(record.enc_public_key))
        .map_err(CommandError::from)
        .and_then(|key| Command::decrypt(ctx, &record.message, &key));

    DecryptedMessage { record, command }
}

/// Decrypts every message. Order is preserved.
pub fn decrypt_messages(
    ctx: &CryptoContext,
    private_key: &PrivateKey,
    records: Vec<MessageRecord>,
    parallel: bool
) -> Vec<DecryptedMessage>
{
    if parallel
    {
        records.into_par_iter().map(|record| decrypt(ctx, private_key, record)).collect()
    }
    else
    {
        records.into_iter().map(|record| decrypt(ctx, private_key, record)).collect()
    }
}

/// The effect of one message on the replayed state.
#[derive(Debug, Clone)]
pub struct MessageStep
{
    pub record: MessageRecord,

    /// The addressed leaf before the message applied.
    pub before: LeafSnapshot,

    /// Set iff the command was applied.
    pub accepted: bool,
}

/// A replayed batch, steps in processing order.
#[derive(Debug, Clone)]
pub struct BatchOutcome
{
    pub batch_start_index: u64,
    pub batch_end_index: u64,
    pub steps: Vec<MessageStep>,
}

impl BatchOutcome
{
    pub fn accepted(&self) -> usize
    {
        self.steps.iter().filter(|step| step.accepted).count()
    }
}

/// Why a message had no effect.
#[derive(Debug, thiserror::Error)]
enum Skipped
{
    #[error("{0}")]
    Undecryptable(#[from] CommandError),

    #[error("{0}")]
    Rejected(#[from] CommandRejection),
}

/// Replays `messages` (one batch, ascending indices) from the highest index
/// down. Invalid messages leave the state unchanged.
pub fn process_batch(
    replay: &mut PollReplay,
    batch_start_index: u64,
    messages: &[DecryptedMessage]
) -> Result<BatchOutcome, CoordinatorError>
{
    let mut steps = Vec::with_capacity(messages.len());

    for message in messages.iter().rev()
    {
        let index = message.record.index;

        let checked = match &message.command
        {
            Ok((command, signature)) => replay
                .validate(command, signature)
                .map(|cost| (command, cost))
                .map_err(Skipped::from),
            Err(e) => Err(Skipped::from(e.clone())),
        };

        let target = match &message.command
        {
            Ok((command, _)) if checked.is_ok() => command.state_index,
            _ => 0,
        };
        let before = replay.snapshot(target)?;

        let accepted = match checked
        {
            Ok((command, cost)) => {
                replay.apply(command, cost)?;
                tracing::debug!(index, state_index = command.state_index, nonce = command.nonce, "command applied");
                true
            },
            Err(reason) => {
                tracing::warn!(index, %reason, "message skipped");
                false
            },
        };

        steps.push(MessageStep { record: message.record, before, accepted });
    }

    Ok(BatchOutcome {
        batch_start_index,
        batch_end_index: batch_start_index + messages.len() as u64,
        steps,
    })
}
