use cosmwasm_std::{Addr, Coin, Order, StdResult, Storage, Timestamp, Uint128};
use cw_storage_plus::Bound;

use crate::balance::sum_coins;
use crate::duration_index;
use crate::state::{Lock, LOCKS};
use crate::unlock_queue;

const DEFAULT_LIMIT: u32 = 10;
const MAX_LIMIT: u32 = 30;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DurationCmp {
    AtLeast(u64),
    Exactly(u64),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TimeCmp {
    /// Bonded, or unlocking with end time strictly after the timestamp.
    LockedPast(Timestamp),
    /// Unlocking with end time at or before the timestamp.
    UnlockedBefore(Timestamp),
}

/// Predicate over the locks of one account. Every field left unset matches.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LockFilter {
    pub duration: Option<DurationCmp>,
    pub denom: Option<String>,
    pub time: Option<TimeCmp>,
    /// Only bonded locks, skipping those already unlocking.
    pub not_unlocking_only: bool,
}

impl LockFilter {
    pub fn matches(&self, lock: &Lock) -> bool {
        let duration_ok = match self.duration {
            None => true,
            Some(DurationCmp::AtLeast(min)) => lock.duration >= min,
            Some(DurationCmp::Exactly(duration)) => lock.duration == duration,
        };
        let denom_ok = match &self.denom {
            None => true,
            Some(denom) => !lock.amount_of(denom).is_zero(),
        };
        let status_ok = !(self.not_unlocking_only && lock.is_unlocking());
        let time_ok = match (self.time, lock.end_time) {
            (None, _) => true,
            (Some(TimeCmp::LockedPast(_)), None) => true,
            (Some(TimeCmp::LockedPast(time)), Some(end)) => end > time,
            (Some(TimeCmp::UnlockedBefore(_)), None) => false,
            (Some(TimeCmp::UnlockedBefore(time)), Some(end)) => end <= time,
        };
        duration_ok && denom_ok && status_ok && time_ok
    }
}

/// Locks of `owner` matching `filter`. Ordered by (end time, id) for
/// `UnlockedBefore`, by (duration, id) otherwise.
pub fn account_locks(
    store: &dyn Storage,
    owner: &Addr,
    filter: &LockFilter,
) -> StdResult<Vec<Lock>> {
    let candidates = match (filter.time, &filter.denom, filter.duration) {
        (Some(TimeCmp::UnlockedBefore(time)), _, _) => {
            unlock_queue::account_ending_at_or_before(store, owner, time)?
        }
        (_, Some(denom), duration) => {
            let min = match duration {
                Some(DurationCmp::AtLeast(d)) | Some(DurationCmp::Exactly(d)) => d,
                None => 0,
            };
            duration_index::longer_than_denom(store, owner, denom, min)?
        }
        (_, None, Some(DurationCmp::Exactly(duration))) => {
            duration_index::exact_duration(store, owner, duration)?
        }
        (_, None, Some(DurationCmp::AtLeast(min))) => {
            duration_index::longer_than(store, owner, min)?
        }
        (_, None, None) => duration_index::longer_than(store, owner, 0)?,
    };

    let mut locks = vec![];
    for lock_id in candidates {
        let lock = LOCKS.load(store, lock_id)?;
        if filter.matches(&lock) {
            locks.push(lock);
        }
    }
    Ok(locks)
}

/// Coins of `owner` that finished unlocking and wait to be released.
pub fn account_unlockable_coins(
    store: &dyn Storage,
    owner: &Addr,
    now: Timestamp,
) -> StdResult<Vec<Coin>> {
    sum_locks(store, unlock_queue::account_ending_at_or_before(store, owner, now)?)
}

/// Coins of `owner` still inside their unlocking period.
pub fn account_unlocking_coins(
    store: &dyn Storage,
    owner: &Addr,
    now: Timestamp,
) -> StdResult<Vec<Coin>> {
    sum_locks(store, unlock_queue::account_ending_after(store, owner, now)?)
}

/// Coins of `owner` that are bonded or not done unlocking.
pub fn account_locked_coins(
    store: &dyn Storage,
    owner: &Addr,
    now: Timestamp,
) -> StdResult<Vec<Coin>> {
    let filter = LockFilter {
        time: Some(TimeCmp::LockedPast(now)),
        ..LockFilter::default()
    };
    let locks = account_locks(store, owner, &filter)?;
    Ok(sum_coins(locks.iter().map(|l| l.coins.as_slice()))?)
}

/// Coins escrowed by every lock, bonded or unlocking.
pub fn module_balance(store: &dyn Storage) -> StdResult<Vec<Coin>> {
    duration_index::all_totals(store)
}

/// Module balance minus the coins of locks that finished unlocking.
pub fn module_locked_amount(store: &dyn Storage, now: Timestamp) -> StdResult<Vec<Coin>> {
    let mut locked = duration_index::all_totals(store)?;
    let matured = sum_locks(store, unlock_queue::due_for_release(store, now, None)?)?;
    for coin in matured {
        if let Some(total) = locked.iter_mut().find(|c| c.denom == coin.denom) {
            total.amount = total.amount.checked_sub(coin.amount)?;
        }
    }
    locked.retain(|c| !c.amount.is_zero());
    Ok(locked)
}

/// Amount of `denom` held by locks with duration >= `min_duration`.
pub fn total_locked_of_denom(
    store: &dyn Storage,
    denom: &str,
    min_duration: u64,
) -> StdResult<Uint128> {
    duration_index::total_of_denom(store, denom, min_duration)
}

/// Every lock by ascending id.
pub fn all_locks(
    store: &dyn Storage,
    start_after: Option<u64>,
    limit: Option<u32>,
) -> StdResult<Vec<Lock>> {
    let limit = limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT) as usize;
    let start = start_after.map(Bound::exclusive);
    LOCKS
        .range(store, start, None, Order::Ascending)
        .take(limit)
        .map(|item| item.map(|(_, lock)| lock))
        .collect()
}

fn sum_locks(store: &dyn Storage, lock_ids: Vec<u64>) -> StdResult<Vec<Coin>> {
    let locks = lock_ids
        .into_iter()
        .map(|id| LOCKS.load(store, id))
        .collect::<StdResult<Vec<_>>>()?;
    Ok(sum_coins(locks.iter().map(|l| l.coins.as_slice()))?)
}
