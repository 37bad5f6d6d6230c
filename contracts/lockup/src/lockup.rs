use cosmwasm_std::{Addr, Coin, Storage, Timestamp};

use crate::balance::{add_coins, normalize_coins, sub_coins};
use crate::duration_index;
use crate::error::ContractError;
use crate::state::{load_lock, next_lock_id, unlock_end_time, Lock, LOCKS};
use crate::synthetic;
use crate::unlock_queue;

/// Rejects durations above the configured maximum.
pub fn validate_duration(duration: u64, max_duration: u64) -> Result<(), ContractError> {
    if duration > max_duration {
        return Err(ContractError::InvalidDuration { duration });
    }
    Ok(())
}

/// Stores a new bonded lock and registers it in the duration index.
pub fn create_lock(
    store: &mut dyn Storage,
    owner: Addr,
    coins: Vec<Coin>,
    duration: u64,
    max_duration: u64,
) -> Result<Lock, ContractError> {
    let coins = normalize_coins(coins)?;
    validate_duration(duration, max_duration)?;

    let lock = Lock {
        id: next_lock_id(store)?,
        owner,
        duration,
        end_time: None,
        coins,
    };
    save_new_lock(store, &lock)?;
    Ok(lock)
}

/// Adds coins to a bonded lock, keeping its id.
pub fn add_tokens(
    store: &mut dyn Storage,
    lock_id: u64,
    coins: Vec<Coin>,
) -> Result<Lock, ContractError> {
    let coins = normalize_coins(coins)?;
    let lock = load_lock(store, lock_id)?;
    if lock.is_unlocking() {
        return Err(ContractError::LockAlreadyUnlocking { lock_id });
    }
    let merged = add_coins(&lock.coins, &coins)?;

    replace_coins(store, &lock, merged)
}

/// Starts the unlocking period of a bonded lock.
///
/// Without `coins`, or with the whole coin set, the lock itself moves to
/// unlocking. With a strict subset, the subset is split off into a new lock
/// that starts unlocking right away while the original stays bonded.
/// Returns the lock that is now unlocking.
pub fn begin_unlocking(
    store: &mut dyn Storage,
    now: Timestamp,
    lock_id: u64,
    coins: Option<Vec<Coin>>,
) -> Result<Lock, ContractError> {
    let lock = load_lock(store, lock_id)?;
    if lock.is_unlocking() {
        return Err(ContractError::LockAlreadyUnlocking { lock_id });
    }
    let end_time = unlock_end_time(now, lock.duration)?;

    match split_coins(&lock, coins)? {
        None => {
            let unlocking = Lock {
                end_time: Some(end_time),
                ..lock
            };
            unlock_queue::insert(store, &unlocking.owner, end_time, unlocking.id)?;
            LOCKS.save(store, unlocking.id, &unlocking)?;
            Ok(unlocking)
        }
        Some((remaining, subset)) => {
            replace_coins(store, &lock, remaining)?;
            let unlocking = Lock {
                id: next_lock_id(store)?,
                owner: lock.owner,
                duration: lock.duration,
                end_time: Some(end_time),
                coins: subset,
            };
            save_new_lock(store, &unlocking)?;
            Ok(unlocking)
        }
    }
}

/// Starts unlocking every bonded lock of `owner`.
pub fn begin_unlocking_all(
    store: &mut dyn Storage,
    now: Timestamp,
    owner: &Addr,
) -> Result<Vec<Lock>, ContractError> {
    let mut bonded = vec![];
    for lock_id in duration_index::longer_than(store, owner, 0)? {
        let lock = load_lock(store, lock_id)?;
        if !lock.is_unlocking() {
            unlock_end_time(now, lock.duration)?;
            bonded.push(lock.id);
        }
    }

    bonded
        .into_iter()
        .map(|lock_id| begin_unlocking(store, now, lock_id, None))
        .collect()
}

/// Deletes a lock whose unlocking period is over. Returns the released lock
/// so its coins can be credited to the owner.
pub fn finalize_release(
    store: &mut dyn Storage,
    now: Timestamp,
    lock_id: u64,
) -> Result<Lock, ContractError> {
    let lock = load_lock(store, lock_id)?;
    if !lock.is_unlocking() {
        return Err(ContractError::LockNotUnlocking { lock_id });
    }
    if !lock.is_matured(now) {
        return Err(ContractError::LockNotMatured { lock_id });
    }

    delete_lock(store, &lock)?;
    Ok(lock)
}

/// Releases up to `limit` locks due at `now`, oldest end time first.
/// Due locks rejected by `releasable` stay queued for their owner.
pub fn release_matured<F>(
    store: &mut dyn Storage,
    now: Timestamp,
    limit: Option<usize>,
    releasable: F,
) -> Result<Vec<Lock>, ContractError>
where
    F: Fn(&Lock) -> bool,
{
    let mut released = vec![];
    for lock_id in unlock_queue::due_for_release(store, now, None)? {
        if limit.map_or(false, |limit| released.len() >= limit) {
            break;
        }
        if releasable(&load_lock(store, lock_id)?) {
            released.push(finalize_release(store, now, lock_id)?);
        }
    }
    Ok(released)
}

/// Releases coins of a lock without waiting for its unlocking period, from
/// either state. The caller is trusted to have checked the permission.
///
/// A strict subset is split off under a new lock id and released at once,
/// while the rest keeps its status and end time. Returns the released part.
pub fn force_unlock(
    store: &mut dyn Storage,
    lock_id: u64,
    coins: Option<Vec<Coin>>,
) -> Result<Lock, ContractError> {
    let lock = load_lock(store, lock_id)?;

    match split_coins(&lock, coins)? {
        None => {
            delete_lock(store, &lock)?;
            Ok(lock)
        }
        Some((remaining, subset)) => {
            replace_coins(store, &lock, remaining)?;
            Ok(Lock {
                id: next_lock_id(store)?,
                coins: subset,
                ..lock
            })
        }
    }
}

/// Removes a lock with every index entry and synthetic lock pointing at it.
pub fn delete_lock(store: &mut dyn Storage, lock: &Lock) -> Result<(), ContractError> {
    synthetic::delete_all(store, lock.id)?;
    duration_index::unindex_lock(store, lock)?;
    if let Some(end_time) = lock.end_time {
        unlock_queue::remove(store, &lock.owner, end_time, lock.id)?;
    }
    LOCKS.remove(store, lock.id);
    Ok(())
}

fn save_new_lock(store: &mut dyn Storage, lock: &Lock) -> Result<(), ContractError> {
    duration_index::index_lock(store, lock)?;
    if let Some(end_time) = lock.end_time {
        unlock_queue::insert(store, &lock.owner, end_time, lock.id)?;
    }
    LOCKS.save(store, lock.id, lock)?;
    Ok(())
}

fn replace_coins(
    store: &mut dyn Storage,
    lock: &Lock,
    coins: Vec<Coin>,
) -> Result<Lock, ContractError> {
    let updated = Lock {
        coins,
        ..lock.clone()
    };
    duration_index::unindex_lock(store, lock)?;
    duration_index::index_lock(store, &updated)?;
    LOCKS.save(store, updated.id, &updated)?;
    Ok(updated)
}

/// `None` when `coins` covers the whole lock, otherwise the
/// (remaining, requested) split.
fn split_coins(
    lock: &Lock,
    coins: Option<Vec<Coin>>,
) -> Result<Option<(Vec<Coin>, Vec<Coin>)>, ContractError> {
    let coins = match coins {
        Some(coins) if !coins.is_empty() => normalize_coins(coins)?,
        _ => return Ok(None),
    };
    let remaining = sub_coins(&lock.coins, &coins)?;
    if remaining.is_empty() {
        Ok(None)
    } else {
        Ok(Some((remaining, coins)))
    }
}
