use crate::types::AgeCategory;

/// Wallets younger than this many days are `New`.
pub const NEW_WALLET_DAYS: u32 = 7;
/// Wallets younger than this many days (and not `New`) are `Recent`.
pub const RECENT_WALLET_DAYS: u32 = 90;

/// Buckets a wallet's age. The boundaries are fixed and independent of any
/// market's threshold policy.
///
/// An unknown age maps to `New`: a wallet whose first activity cannot be found
/// is treated as maximally suspicious.
pub fn classify_age(age_days: Option<u32>) -> AgeCategory {
    match age_days {
        None => AgeCategory::New,
        Some(days) if days < NEW_WALLET_DAYS => AgeCategory::New,
        Some(days) if days < RECENT_WALLET_DAYS => AgeCategory::Recent,
        Some(_) => AgeCategory::Established,
    }
}
