use cosmwasm_std::{OverflowError, StdError, Uint128};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("Unauthorized")]
    Unauthorized {},

    #[error("Lock {lock_id} not found")]
    LockNotFound { lock_id: u64 },

    #[error("Synthetic lock {suffix} of lock {lock_id} not found")]
    SyntheticLockNotFound { lock_id: u64, suffix: String },

    #[error("Invalid coins: {reason}")]
    InvalidCoins { reason: String },

    #[error("Invalid lock duration {duration}s")]
    InvalidDuration { duration: u64 },

    #[error("Lock {lock_id} is already unlocking")]
    LockAlreadyUnlocking { lock_id: u64 },

    #[error("Lock {lock_id} is not unlocking")]
    LockNotUnlocking { lock_id: u64 },

    #[error("Lock {lock_id} has not finished unlocking")]
    LockNotMatured { lock_id: u64 },

    #[error("Synthetic lock {suffix} of lock {lock_id} is already unlocking")]
    SyntheticLockAlreadyUnlocking { lock_id: u64, suffix: String },

    #[error("Insufficient {denom} in lock: held {held}, requested {requested}")]
    InsufficientFunds {
        denom: String,
        held: Uint128,
        requested: Uint128,
    },

    #[error("Synthetic lock {suffix} of lock {lock_id} already exists")]
    DuplicateSuffix { lock_id: u64, suffix: String },

    #[error("Synthetic lock suffix cannot be empty")]
    InvalidSuffix {},

    #[error("Token {token} is not accepted")]
    UnsupportedToken { token: String },
}
