use cosmwasm_schema::{cw_serde, QueryResponses};
use cosmwasm_std::{Addr, Coin, Timestamp, Uint128};
use cw20::Cw20ReceiveMsg;

use crate::state::{Config, Lock, LockStatus, SyntheticLock};

#[cw_serde]
pub struct InstantiateMsg {
    /// Max lock duration in seconds
    pub max_lock_duration: u64,
    pub force_unlock_allowed_addresses: Vec<String>,
    pub synthetic_lock_managers: Vec<String>,
    pub cw20_tokens: Vec<String>,
}

#[cw_serde]
pub enum ExecuteMsg {
    /// Lock the sent funds for `duration` seconds
    LockTokens { duration: u64 },
    /// Add the sent funds to a bonded lock
    AddToLock { lock_id: u64 },
    /// Start unlocking every bonded lock of the sender
    BeginUnlockingAll {},
    /// Start unlocking a lock, or only `coins` of it
    BeginUnlocking {
        lock_id: u64,
        coins: Option<Vec<Coin>>,
    },
    /// Only for force_unlock_allowed_addresses. Release without waiting
    ForceUnlock {
        lock_id: u64,
        coins: Option<Vec<Coin>>,
    },
    /// Release one of the sender's locks that finished unlocking
    FinalizeRelease { lock_id: u64 },
    /// Release locks and synthetic locks that finished unlocking
    ReleaseMatured { limit: Option<u32> },
    /// Only for synthetic_lock_managers
    CreateSyntheticLock {
        lock_id: u64,
        suffix: String,
        duration: u64,
    },
    /// Only for synthetic_lock_managers
    BeginUnlockingSynthetic { lock_id: u64, suffix: String },
    /// Only for synthetic_lock_managers
    DeleteSyntheticLock { lock_id: u64, suffix: String },
    /// Only for admin
    UpdateConfig {
        admin: Option<String>,
        max_lock_duration: Option<u64>,
        force_unlock_allowed_addresses: Option<Vec<String>>,
        synthetic_lock_managers: Option<Vec<String>>,
        cw20_tokens: Option<Vec<String>>,
    },
    /// This accepts a properly-encoded ReceiveMsg from a cw20 contract
    Receive(Cw20ReceiveMsg),
}

#[cw_serde]
pub enum ReceiveMsg {
    LockTokens { duration: u64 },
    AddToLock { lock_id: u64 },
}

/// Called by the chain at block boundaries.
#[cw_serde]
pub enum SudoMsg {
    ReleaseMatured { limit: Option<u32> },
}

#[cw_serde]
#[derive(QueryResponses)]
pub enum QueryMsg {
    /// Coins held by all locks
    #[returns(CoinsResponse)]
    ModuleBalance {},
    /// Coins held by locks not done unlocking
    #[returns(CoinsResponse)]
    ModuleLockedAmount {},
    #[returns(CoinsResponse)]
    AccountUnlockableCoins { owner: String },
    #[returns(CoinsResponse)]
    AccountUnlockingCoins { owner: String },
    #[returns(CoinsResponse)]
    AccountLockedCoins { owner: String },
    /// Bonded locks and unlocking locks ending after `timestamp`
    #[returns(LocksResponse)]
    AccountLockedPastTime { owner: String, timestamp: Timestamp },
    /// Bonded locks only
    #[returns(LocksResponse)]
    AccountLockedPastTimeNotUnlockingOnly { owner: String, timestamp: Timestamp },
    /// Unlocking locks ending at or before `timestamp`
    #[returns(LocksResponse)]
    AccountUnlockedBeforeTime { owner: String, timestamp: Timestamp },
    #[returns(LocksResponse)]
    AccountLockedPastTimeDenom {
        owner: String,
        timestamp: Timestamp,
        denom: String,
    },
    #[returns(LockResponse)]
    LockedById { lock_id: u64 },
    #[returns(SyntheticLocksResponse)]
    SyntheticLocksByLockId { lock_id: u64 },
    #[returns(SyntheticLocksResponse)]
    SyntheticLocksLongerDuration { suffix: String, duration: u64 },
    #[returns(LocksResponse)]
    AccountLockedLongerDuration { owner: String, duration: u64 },
    #[returns(LocksResponse)]
    AccountLockedLongerDurationNotUnlockingOnly { owner: String, duration: u64 },
    #[returns(LocksResponse)]
    AccountLockedLongerDurationDenom {
        owner: String,
        duration: u64,
        denom: String,
    },
    #[returns(LocksResponse)]
    AccountLockedDuration { owner: String, duration: u64 },
    #[returns(AmountResponse)]
    TotalLockedOfDenom { denom: String, min_duration: u64 },
    /// Requires pagination. Lists all locks by id.
    #[returns(LocksResponse)]
    AllLocks {
        start_after: Option<u64>,
        limit: Option<u32>,
    },
    #[returns(NextLockIdResponse)]
    NextLockId {},
    #[returns(Config)]
    Config {},
}

#[cw_serde]
pub struct LockInfo {
    pub id: u64,
    pub owner: Addr,
    pub duration: u64,
    pub end_time: Option<Timestamp>,
    pub status: LockStatus,
    pub coins: Vec<Coin>,
}

impl From<Lock> for LockInfo {
    fn from(lock: Lock) -> LockInfo {
        LockInfo {
            status: lock.status(),
            id: lock.id,
            owner: lock.owner,
            duration: lock.duration,
            end_time: lock.end_time,
            coins: lock.coins,
        }
    }
}

#[cw_serde]
pub struct LockResponse {
    pub lock: LockInfo,
}

#[cw_serde]
pub struct LocksResponse {
    pub locks: Vec<LockInfo>,
}

#[cw_serde]
pub struct SyntheticLockInfo {
    pub underlying_lock_id: u64,
    pub suffix: String,
    pub duration: u64,
    pub end_time: Option<Timestamp>,
    pub status: LockStatus,
    /// Coins of the underlying lock with suffixed denoms
    pub coins: Vec<Coin>,
}

impl SyntheticLockInfo {
    pub fn new(synth: SyntheticLock, coins: Vec<Coin>) -> Self {
        SyntheticLockInfo {
            status: synth.status(),
            underlying_lock_id: synth.underlying_lock_id,
            suffix: synth.suffix,
            duration: synth.duration,
            end_time: synth.end_time,
            coins,
        }
    }
}

#[cw_serde]
pub struct SyntheticLocksResponse {
    pub synthetic_locks: Vec<SyntheticLockInfo>,
}

#[cw_serde]
pub struct CoinsResponse {
    pub coins: Vec<Coin>,
}

#[cw_serde]
pub struct AmountResponse {
    pub amount: Uint128,
}

#[cw_serde]
pub struct NextLockIdResponse {
    pub lock_id: u64,
}
