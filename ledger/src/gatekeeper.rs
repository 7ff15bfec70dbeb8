//! Sign-up eligibility and initial voice credit allocation.

/// Decides whether an account may sign up.
pub trait SignUpGatekeeper<AccountId>
{
    fn register(who: &AccountId, data: &[u8]) -> bool;
}

/// Determines the voice credits a new voter starts with.
pub trait InitialVoiceCreditProxy<AccountId>
{
    fn voice_credits(who: &AccountId, data: &[u8]) -> u128;
}

/// Admits every account.
pub struct FreeForAllGatekeeper;

impl<AccountId> SignUpGatekeeper<AccountId> for FreeForAllGatekeeper
{
    fn register(_who: &AccountId, _data: &[u8]) -> bool
    {
        true
    }
}

/// Grants every voter the same balance.
pub struct ConstantInitialVoiceCreditProxy<const CREDITS: u128>;

impl<AccountId, const CREDITS: u128> InitialVoiceCreditProxy<AccountId> for ConstantInitialVoiceCreditProxy<CREDITS>
{
    fn voice_credits(_who: &AccountId, _data: &[u8]) -> u128
    {
        CREDITS
    }
}
