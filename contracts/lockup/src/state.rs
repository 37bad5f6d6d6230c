use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use cosmwasm_std::{Addr, Coin, StdResult, Storage, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

use crate::error::ContractError;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct Config {
    pub admin: Addr,
    /// Max lock duration in seconds
    pub max_lock_duration: u64,
    /// Accounts allowed to skip the unlocking period
    pub force_unlock_allowed_addresses: Vec<Addr>,
    /// Accounts allowed to create and remove synthetic locks
    pub synthetic_lock_managers: Vec<Addr>,
    /// cw20 contracts accepted through `Receive`
    pub cw20_tokens: Vec<Addr>,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LockStatus {
    Bonded,
    Unlocking,
}

/// Escrowed coins of one owner. `end_time` is only set once unlocking began.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct Lock {
    pub id: u64,
    pub owner: Addr,
    /// Lock duration in seconds
    pub duration: u64,
    pub end_time: Option<Timestamp>,
    /// Sorted by denom, every amount is positive
    pub coins: Vec<Coin>,
}

impl Lock {
    pub fn status(&self) -> LockStatus {
        match self.end_time {
            Some(_) => LockStatus::Unlocking,
            None => LockStatus::Bonded,
        }
    }

    pub fn is_unlocking(&self) -> bool {
        self.end_time.is_some()
    }

    /// Unlocking and its end time is not after `now`.
    pub fn is_matured(&self, now: Timestamp) -> bool {
        matches!(self.end_time, Some(end) if end <= now)
    }

    pub fn amount_of(&self, denom: &str) -> Uint128 {
        self.coins
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
            .unwrap_or_default()
    }
}

/// Overlay on a lock, keyed by (underlying lock id, suffix). Holds no coins.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, JsonSchema)]
pub struct SyntheticLock {
    pub underlying_lock_id: u64,
    pub suffix: String,
    pub duration: u64,
    pub end_time: Option<Timestamp>,
}

impl SyntheticLock {
    pub fn status(&self) -> LockStatus {
        match self.end_time {
            Some(_) => LockStatus::Unlocking,
            None => LockStatus::Bonded,
        }
    }

    /// Denom of a base coin as seen through this overlay.
    pub fn synthetic_denom(&self, denom: &str) -> String {
        format!("{}{}", denom, self.suffix)
    }
}

pub const CONFIG: Item<Config> = Item::new("config");
pub const LAST_LOCK_ID: Item<u64> = Item::new("last_lock_id");
pub const LOCKS: Map<u64, Lock> = Map::new("locks");

/// (owner, denom, duration) -> lock ids
pub const DURATION_INDEX: Map<(&Addr, &str, u64), Vec<u64>> = Map::new("duration_index");
/// (denom, duration) -> amount held by all locks
pub const DENOM_TOTALS: Map<(&str, u64), Uint128> = Map::new("denom_totals");
/// end time nanos -> unlocking lock ids
pub const UNLOCK_QUEUE: Map<u64, Vec<u64>> = Map::new("unlock_queue");
/// (owner, end time nanos) -> unlocking lock ids
pub const ACCOUNT_UNLOCK_QUEUE: Map<(&Addr, u64), Vec<u64>> = Map::new("account_unlock_queue");

pub const SYNTHETIC_LOCKS: Map<(u64, &str), SyntheticLock> = Map::new("synthetic_locks");
/// (suffix, duration) -> underlying lock ids
pub const SYNTHETIC_DURATION_INDEX: Map<(&str, u64), Vec<u64>> =
    Map::new("synthetic_duration_index");
/// end time nanos -> (underlying lock id, suffix)
pub const SYNTHETIC_UNLOCK_QUEUE: Map<u64, Vec<(u64, String)>> =
    Map::new("synthetic_unlock_queue");

/// Allocates the next lock id. Ids start at 1 and are never reused.
pub fn next_lock_id(store: &mut dyn Storage) -> StdResult<u64> {
    let id = LAST_LOCK_ID.may_load(store)?.unwrap_or_default() + 1;
    LAST_LOCK_ID.save(store, &id)?;
    Ok(id)
}

pub fn load_lock(store: &dyn Storage, lock_id: u64) -> Result<Lock, ContractError> {
    LOCKS
        .may_load(store, lock_id)?
        .ok_or(ContractError::LockNotFound { lock_id })
}

/// End of the unlocking period started at `now`.
pub fn unlock_end_time(now: Timestamp, duration: u64) -> Result<Timestamp, ContractError> {
    duration
        .checked_mul(1_000_000_000)
        .and_then(|nanos| now.nanos().checked_add(nanos))
        .map(Timestamp::from_nanos)
        .ok_or(ContractError::InvalidDuration { duration })
}

/// Inserts `id` into an ascending id set, keeping it sorted and unique.
pub fn insert_sorted<T: Ord>(set: &mut Vec<T>, id: T) {
    if let Err(pos) = set.binary_search(&id) {
        set.insert(pos, id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::coin;
    use cosmwasm_std::testing::MockStorage;

    #[test]
    fn lock_ids_are_sequential() {
        let mut store = MockStorage::new();
        assert_eq!(1, next_lock_id(&mut store).unwrap());
        assert_eq!(2, next_lock_id(&mut store).unwrap());
        assert_eq!(3, next_lock_id(&mut store).unwrap());
    }

    #[test]
    fn status_follows_end_time() {
        let mut lock = Lock {
            id: 1,
            owner: Addr::unchecked("alice"),
            duration: 10,
            end_time: None,
            coins: vec![coin(5, "uosmo")],
        };
        assert_eq!(LockStatus::Bonded, lock.status());
        assert!(!lock.is_matured(Timestamp::from_seconds(100)));

        lock.end_time = Some(Timestamp::from_seconds(50));
        assert_eq!(LockStatus::Unlocking, lock.status());
        assert!(lock.is_matured(Timestamp::from_seconds(50)));
        assert!(!lock.is_matured(Timestamp::from_seconds(49)));
        assert_eq!(Uint128::new(5), lock.amount_of("uosmo"));
        assert_eq!(Uint128::zero(), lock.amount_of("uion"));
    }

    #[test]
    fn end_time_overflow() {
        let now = Timestamp::from_seconds(100);
        assert_eq!(
            Timestamp::from_seconds(704_900),
            unlock_end_time(now, 604_800).unwrap()
        );
        match unlock_end_time(now, u64::MAX) {
            Err(ContractError::InvalidDuration { duration }) => assert_eq!(u64::MAX, duration),
            _ => panic!("Must return InvalidDuration error"),
        }
    }

    #[test]
    fn sorted_set_insert() {
        let mut set = vec![1u64, 5];
        insert_sorted(&mut set, 3);
        insert_sorted(&mut set, 5);
        insert_sorted(&mut set, 0);
        assert_eq!(vec![0, 1, 3, 5], set);
    }
}
