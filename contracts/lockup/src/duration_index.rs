use std::collections::BTreeSet;

use cosmwasm_std::{Addr, Coin, Order, StdResult, Storage, Uint128};
use cw_storage_plus::Bound;

use crate::error::ContractError;
use crate::state::{insert_sorted, Lock, DENOM_TOTALS, DURATION_INDEX};

pub fn insert(
    store: &mut dyn Storage,
    owner: &Addr,
    denom: &str,
    duration: u64,
    lock_id: u64,
) -> StdResult<()> {
    let key = (owner, denom, duration);
    let mut ids = DURATION_INDEX.may_load(store, key)?.unwrap_or_default();
    insert_sorted(&mut ids, lock_id);
    DURATION_INDEX.save(store, key, &ids)
}

pub fn remove(
    store: &mut dyn Storage,
    owner: &Addr,
    denom: &str,
    duration: u64,
    lock_id: u64,
) -> StdResult<()> {
    let key = (owner, denom, duration);
    let mut ids = DURATION_INDEX.may_load(store, key)?.unwrap_or_default();
    ids.retain(|id| *id != lock_id);
    if ids.is_empty() {
        DURATION_INDEX.remove(store, key);
        Ok(())
    } else {
        DURATION_INDEX.save(store, key, &ids)
    }
}

/// Registers every denom of `lock` and adds its coins to the denom totals.
pub fn index_lock(store: &mut dyn Storage, lock: &Lock) -> Result<(), ContractError> {
    for coin in &lock.coins {
        insert(store, &lock.owner, &coin.denom, lock.duration, lock.id)?;
        let key = (coin.denom.as_str(), lock.duration);
        let total = DENOM_TOTALS.may_load(store, key)?.unwrap_or_default();
        DENOM_TOTALS.save(store, key, &total.checked_add(coin.amount)?)?;
    }
    Ok(())
}

/// Inverse of `index_lock`.
pub fn unindex_lock(store: &mut dyn Storage, lock: &Lock) -> Result<(), ContractError> {
    for coin in &lock.coins {
        remove(store, &lock.owner, &coin.denom, lock.duration, lock.id)?;
        let key = (coin.denom.as_str(), lock.duration);
        let total = DENOM_TOTALS
            .may_load(store, key)?
            .unwrap_or_default()
            .checked_sub(coin.amount)?;
        if total.is_zero() {
            DENOM_TOTALS.remove(store, key);
        } else {
            DENOM_TOTALS.save(store, key, &total)?;
        }
    }
    Ok(())
}

/// Locks of `owner` in any denom with duration >= `min_duration`, ordered by
/// (duration, id).
pub fn longer_than(store: &dyn Storage, owner: &Addr, min_duration: u64) -> StdResult<Vec<u64>> {
    let mut found = BTreeSet::new();
    for item in DURATION_INDEX
        .sub_prefix(owner)
        .range(store, None, None, Order::Ascending)
    {
        let ((_, duration), ids) = item?;
        if duration >= min_duration {
            found.extend(ids.into_iter().map(|id| (duration, id)));
        }
    }
    Ok(found.into_iter().map(|(_, id)| id).collect())
}

/// Locks of `owner` holding `denom` with duration >= `min_duration`.
pub fn longer_than_denom(
    store: &dyn Storage,
    owner: &Addr,
    denom: &str,
    min_duration: u64,
) -> StdResult<Vec<u64>> {
    let mut found = vec![];
    for item in DURATION_INDEX.prefix((owner, denom)).range(
        store,
        Some(Bound::inclusive(min_duration)),
        None,
        Order::Ascending,
    ) {
        let (_, ids) = item?;
        found.extend(ids);
    }
    Ok(found)
}

/// Locks of `owner` in any denom with exactly `duration`.
pub fn exact_duration(store: &dyn Storage, owner: &Addr, duration: u64) -> StdResult<Vec<u64>> {
    let mut found = BTreeSet::new();
    for item in DURATION_INDEX
        .sub_prefix(owner)
        .range(store, None, None, Order::Ascending)
    {
        let ((_, lock_duration), ids) = item?;
        if lock_duration == duration {
            found.extend(ids);
        }
    }
    Ok(found.into_iter().collect())
}

/// Amount of `denom` held by locks with duration >= `min_duration`.
pub fn total_of_denom(store: &dyn Storage, denom: &str, min_duration: u64) -> StdResult<Uint128> {
    DENOM_TOTALS
        .prefix(denom)
        .range(
            store,
            Some(Bound::inclusive(min_duration)),
            None,
            Order::Ascending,
        )
        .try_fold(Uint128::zero(), |acc, item| {
            let (_, amount) = item?;
            Ok(acc.checked_add(amount)?)
        })
}

/// Coins held by every lock, sorted by denom.
pub fn all_totals(store: &dyn Storage) -> StdResult<Vec<Coin>> {
    let mut totals: Vec<Coin> = vec![];
    // keys are grouped by denom but ordered by its length prefix first
    for item in DENOM_TOTALS.range(store, None, None, Order::Ascending) {
        let ((denom, _), amount) = item?;
        match totals.last_mut() {
            Some(last) if last.denom == denom => last.amount = last.amount.checked_add(amount)?,
            _ => totals.push(Coin { denom, amount }),
        }
    }
    totals.sort_by(|a, b| a.denom.cmp(&b.denom));
    Ok(totals)
}
