use cosmwasm_std::{Coin, Order, StdResult, Storage, Timestamp};
use cw_storage_plus::Bound;

use crate::error::ContractError;
use crate::lockup::validate_duration;
use crate::state::{
    insert_sorted, load_lock, unlock_end_time, SyntheticLock, LOCKS, SYNTHETIC_DURATION_INDEX,
    SYNTHETIC_LOCKS, SYNTHETIC_UNLOCK_QUEUE,
};

pub fn load_synthetic(
    store: &dyn Storage,
    lock_id: u64,
    suffix: &str,
) -> Result<SyntheticLock, ContractError> {
    SYNTHETIC_LOCKS
        .may_load(store, (lock_id, suffix))?
        .ok_or_else(|| ContractError::SyntheticLockNotFound {
            lock_id,
            suffix: suffix.to_string(),
        })
}

/// Attaches a bonded synthetic lock to an existing lock.
pub fn create_synthetic(
    store: &mut dyn Storage,
    lock_id: u64,
    suffix: &str,
    duration: u64,
    max_duration: u64,
) -> Result<SyntheticLock, ContractError> {
    if suffix.is_empty() {
        return Err(ContractError::InvalidSuffix {});
    }
    validate_duration(duration, max_duration)?;
    load_lock(store, lock_id)?;
    if SYNTHETIC_LOCKS.has(store, (lock_id, suffix)) {
        return Err(ContractError::DuplicateSuffix {
            lock_id,
            suffix: suffix.to_string(),
        });
    }

    let synth = SyntheticLock {
        underlying_lock_id: lock_id,
        suffix: suffix.to_string(),
        duration,
        end_time: None,
    };
    SYNTHETIC_LOCKS.save(store, (lock_id, suffix), &synth)?;

    let mut ids = SYNTHETIC_DURATION_INDEX
        .may_load(store, (suffix, duration))?
        .unwrap_or_default();
    insert_sorted(&mut ids, lock_id);
    SYNTHETIC_DURATION_INDEX.save(store, (suffix, duration), &ids)?;

    Ok(synth)
}

/// Starts the synthetic lock's own unlocking period. The underlying lock is
/// left untouched.
pub fn begin_unlocking_synthetic(
    store: &mut dyn Storage,
    now: Timestamp,
    lock_id: u64,
    suffix: &str,
) -> Result<SyntheticLock, ContractError> {
    let synth = load_synthetic(store, lock_id, suffix)?;
    if synth.end_time.is_some() {
        return Err(ContractError::SyntheticLockAlreadyUnlocking {
            lock_id,
            suffix: suffix.to_string(),
        });
    }
    let end_time = unlock_end_time(now, synth.duration)?;

    let synth = SyntheticLock {
        end_time: Some(end_time),
        ..synth
    };
    let key = end_time.nanos();
    let mut queued = SYNTHETIC_UNLOCK_QUEUE
        .may_load(store, key)?
        .unwrap_or_default();
    insert_sorted(&mut queued, (lock_id, suffix.to_string()));
    SYNTHETIC_UNLOCK_QUEUE.save(store, key, &queued)?;
    SYNTHETIC_LOCKS.save(store, (lock_id, suffix), &synth)?;

    Ok(synth)
}

pub fn delete_synthetic(
    store: &mut dyn Storage,
    lock_id: u64,
    suffix: &str,
) -> Result<SyntheticLock, ContractError> {
    let synth = load_synthetic(store, lock_id, suffix)?;
    remove(store, &synth)?;
    Ok(synth)
}

/// Deletes every synthetic lock of `lock_id`.
pub fn delete_all(
    store: &mut dyn Storage,
    lock_id: u64,
) -> Result<Vec<SyntheticLock>, ContractError> {
    let synths = by_lock_id(store, lock_id)?;
    for synth in &synths {
        remove(store, synth)?;
    }
    Ok(synths)
}

/// Synthetic locks of `lock_id`, ordered by suffix.
pub fn by_lock_id(store: &dyn Storage, lock_id: u64) -> StdResult<Vec<SyntheticLock>> {
    SYNTHETIC_LOCKS
        .prefix(lock_id)
        .range(store, None, None, Order::Ascending)
        .map(|item| item.map(|(_, synth)| synth))
        .collect()
}

/// Synthetic locks with `suffix` and duration >= `min_duration`, ordered by
/// (duration, underlying lock id).
pub fn longer_than(
    store: &dyn Storage,
    suffix: &str,
    min_duration: u64,
) -> StdResult<Vec<SyntheticLock>> {
    let mut found = vec![];
    for item in SYNTHETIC_DURATION_INDEX.prefix(suffix).range(
        store,
        Some(Bound::inclusive(min_duration)),
        None,
        Order::Ascending,
    ) {
        let (_, ids) = item?;
        for lock_id in ids {
            found.push(SYNTHETIC_LOCKS.load(store, (lock_id, suffix))?);
        }
    }
    Ok(found)
}

/// Unlocking synthetic locks with end time <= `now`.
pub fn due_for_release(
    store: &dyn Storage,
    now: Timestamp,
    limit: Option<usize>,
) -> StdResult<Vec<(u64, String)>> {
    let mut found = vec![];
    for item in SYNTHETIC_UNLOCK_QUEUE.range(
        store,
        None,
        Some(Bound::inclusive(now.nanos())),
        Order::Ascending,
    ) {
        let (_, keys) = item?;
        found.extend(keys);
        if let Some(limit) = limit {
            if found.len() >= limit {
                found.truncate(limit);
                break;
            }
        }
    }
    Ok(found)
}

/// Deletes synthetic locks whose unlocking period is over.
pub fn release_matured(
    store: &mut dyn Storage,
    now: Timestamp,
    limit: Option<usize>,
) -> Result<Vec<SyntheticLock>, ContractError> {
    due_for_release(store, now, limit)?
        .into_iter()
        .map(|(lock_id, suffix)| delete_synthetic(store, lock_id, &suffix))
        .collect()
}

/// Coins of the underlying lock under this overlay's denoms.
pub fn synthetic_coins(store: &dyn Storage, synth: &SyntheticLock) -> StdResult<Vec<Coin>> {
    let lock = LOCKS.load(store, synth.underlying_lock_id)?;
    Ok(lock
        .coins
        .iter()
        .map(|c| Coin {
            denom: synth.synthetic_denom(&c.denom),
            amount: c.amount,
        })
        .collect())
}

fn remove(store: &mut dyn Storage, synth: &SyntheticLock) -> StdResult<()> {
    let lock_id = synth.underlying_lock_id;
    let suffix = synth.suffix.as_str();
    SYNTHETIC_LOCKS.remove(store, (lock_id, suffix));

    let key = (suffix, synth.duration);
    let mut ids = SYNTHETIC_DURATION_INDEX
        .may_load(store, key)?
        .unwrap_or_default();
    ids.retain(|id| *id != lock_id);
    if ids.is_empty() {
        SYNTHETIC_DURATION_INDEX.remove(store, key);
    } else {
        SYNTHETIC_DURATION_INDEX.save(store, key, &ids)?;
    }

    if let Some(end_time) = synth.end_time {
        let key = end_time.nanos();
        let mut queued = SYNTHETIC_UNLOCK_QUEUE
            .may_load(store, key)?
            .unwrap_or_default();
        queued.retain(|(id, s)| !(*id == lock_id && s == suffix));
        if queued.is_empty() {
            SYNTHETIC_UNLOCK_QUEUE.remove(store, key);
        } else {
            SYNTHETIC_UNLOCK_QUEUE.save(store, key, &queued)?;
        }
    }
    Ok(())
}
