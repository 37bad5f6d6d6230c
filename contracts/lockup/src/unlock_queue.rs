use cosmwasm_std::{Addr, Order, StdResult, Storage, Timestamp};
use cw_storage_plus::Bound;

use crate::state::{insert_sorted, ACCOUNT_UNLOCK_QUEUE, UNLOCK_QUEUE};

pub fn insert(
    store: &mut dyn Storage,
    owner: &Addr,
    end_time: Timestamp,
    lock_id: u64,
) -> StdResult<()> {
    let end = end_time.nanos();

    let mut ids = UNLOCK_QUEUE.may_load(store, end)?.unwrap_or_default();
    insert_sorted(&mut ids, lock_id);
    UNLOCK_QUEUE.save(store, end, &ids)?;

    let mut ids = ACCOUNT_UNLOCK_QUEUE
        .may_load(store, (owner, end))?
        .unwrap_or_default();
    insert_sorted(&mut ids, lock_id);
    ACCOUNT_UNLOCK_QUEUE.save(store, (owner, end), &ids)
}

/// `end_time` must be the exact time the lock was queued with.
pub fn remove(
    store: &mut dyn Storage,
    owner: &Addr,
    end_time: Timestamp,
    lock_id: u64,
) -> StdResult<()> {
    let end = end_time.nanos();

    let mut ids = UNLOCK_QUEUE.may_load(store, end)?.unwrap_or_default();
    ids.retain(|id| *id != lock_id);
    if ids.is_empty() {
        UNLOCK_QUEUE.remove(store, end);
    } else {
        UNLOCK_QUEUE.save(store, end, &ids)?;
    }

    let mut ids = ACCOUNT_UNLOCK_QUEUE
        .may_load(store, (owner, end))?
        .unwrap_or_default();
    ids.retain(|id| *id != lock_id);
    if ids.is_empty() {
        ACCOUNT_UNLOCK_QUEUE.remove(store, (owner, end));
        Ok(())
    } else {
        ACCOUNT_UNLOCK_QUEUE.save(store, (owner, end), &ids)
    }
}

/// Unlocking locks with end time <= `now`, ordered by (end time, id).
pub fn due_for_release(
    store: &dyn Storage,
    now: Timestamp,
    limit: Option<usize>,
) -> StdResult<Vec<u64>> {
    let mut found = vec![];
    for item in UNLOCK_QUEUE.range(
        store,
        None,
        Some(Bound::inclusive(now.nanos())),
        Order::Ascending,
    ) {
        let (_, ids) = item?;
        found.extend(ids);
        if let Some(limit) = limit {
            if found.len() >= limit {
                found.truncate(limit);
                break;
            }
        }
    }
    Ok(found)
}

/// Unlocking locks of `owner` ending strictly after `time`.
pub fn account_ending_after(
    store: &dyn Storage,
    owner: &Addr,
    time: Timestamp,
) -> StdResult<Vec<u64>> {
    collect(
        store,
        owner,
        Some(Bound::exclusive(time.nanos())),
        None,
    )
}

/// Unlocking locks of `owner` ending at or before `time`.
pub fn account_ending_at_or_before(
    store: &dyn Storage,
    owner: &Addr,
    time: Timestamp,
) -> StdResult<Vec<u64>> {
    collect(
        store,
        owner,
        None,
        Some(Bound::inclusive(time.nanos())),
    )
}

fn collect(
    store: &dyn Storage,
    owner: &Addr,
    min: Option<Bound<u64>>,
    max: Option<Bound<u64>>,
) -> StdResult<Vec<u64>> {
    let mut found = vec![];
    for item in ACCOUNT_UNLOCK_QUEUE
        .prefix(owner)
        .range(store, min, max, Order::Ascending)
    {
        let (_, ids) = item?;
        found.extend(ids);
    }
    Ok(found)
}
