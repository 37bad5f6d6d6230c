#[cfg(not(feature = "library"))]
use cosmwasm_std::entry_point;
use cosmwasm_std::{
    from_binary, to_binary, Addr, Api, Binary, Coin, CosmosMsg, Deps, DepsMut, Env, MessageInfo,
    Response, StdResult,
};

use crate::balance::{check_native, cw20_denom, send_tokens, CW20_DENOM_PREFIX};
use crate::error::ContractError;
use crate::lockup;
use crate::msg::{
    AmountResponse, CoinsResponse, ExecuteMsg, InstantiateMsg, LockInfo, LockResponse,
    LocksResponse, NextLockIdResponse, QueryMsg, ReceiveMsg, SudoMsg, SyntheticLockInfo,
    SyntheticLocksResponse,
};
use crate::query::{
    account_locked_coins, account_locks, account_unlockable_coins, account_unlocking_coins,
    all_locks, module_balance, module_locked_amount, total_locked_of_denom, DurationCmp,
    LockFilter, TimeCmp,
};
use crate::state::{load_lock, Config, CONFIG, LAST_LOCK_ID, LOCKS};
use crate::synthetic;

use cw2::set_contract_version;
use cw20::{Cw20CoinVerified, Cw20ReceiveMsg};

// version info for migration info
const CONTRACT_NAME: &str = "crates.io:cw-disper-lockup";
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, ContractError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let config = Config {
        admin: info.sender.clone(),
        max_lock_duration: msg.max_lock_duration,
        force_unlock_allowed_addresses: validate_addrs(
            deps.api,
            msg.force_unlock_allowed_addresses,
        )?,
        synthetic_lock_managers: validate_addrs(deps.api, msg.synthetic_lock_managers)?,
        cw20_tokens: validate_addrs(deps.api, msg.cw20_tokens)?,
    };
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "instantiate")
        .add_attribute("admin", info.sender))
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    msg: ExecuteMsg,
) -> Result<Response, ContractError> {
    match msg {
        ExecuteMsg::LockTokens { duration } => {
            check_native(&info.funds)?;
            try_lock(deps, info.sender, info.funds, duration)
        }
        ExecuteMsg::AddToLock { lock_id } => {
            check_native(&info.funds)?;
            try_add_to_lock(deps, &info.sender, info.funds, lock_id)
        }
        ExecuteMsg::BeginUnlockingAll {} => try_begin_unlocking_all(deps, env, info),
        ExecuteMsg::BeginUnlocking { lock_id, coins } => {
            try_begin_unlocking(deps, env, info, lock_id, coins)
        }
        ExecuteMsg::ForceUnlock { lock_id, coins } => try_force_unlock(deps, info, lock_id, coins),
        ExecuteMsg::FinalizeRelease { lock_id } => try_finalize_release(deps, env, info, lock_id),
        ExecuteMsg::ReleaseMatured { limit } => release_matured(deps, env, limit),
        ExecuteMsg::CreateSyntheticLock {
            lock_id,
            suffix,
            duration,
        } => try_create_synthetic(deps, info, lock_id, suffix, duration),
        ExecuteMsg::BeginUnlockingSynthetic { lock_id, suffix } => {
            try_begin_unlocking_synthetic(deps, env, info, lock_id, suffix)
        }
        ExecuteMsg::DeleteSyntheticLock { lock_id, suffix } => {
            try_delete_synthetic(deps, info, lock_id, suffix)
        }
        ExecuteMsg::UpdateConfig {
            admin,
            max_lock_duration,
            force_unlock_allowed_addresses,
            synthetic_lock_managers,
            cw20_tokens,
        } => try_update_config(
            deps,
            info,
            admin,
            max_lock_duration,
            force_unlock_allowed_addresses,
            synthetic_lock_managers,
            cw20_tokens,
        ),
        ExecuteMsg::Receive(msg) => try_receive(deps, info, msg),
    }
}

/// Block-boundary hook of the chain.
#[cfg_attr(not(feature = "library"), entry_point)]
pub fn sudo(deps: DepsMut, env: Env, msg: SudoMsg) -> Result<Response, ContractError> {
    match msg {
        SudoMsg::ReleaseMatured { limit } => release_matured(deps, env, limit),
    }
}

pub fn try_lock(
    deps: DepsMut,
    owner: Addr,
    funds: Vec<Coin>,
    duration: u64,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    let lock = lockup::create_lock(
        deps.storage,
        owner,
        funds,
        duration,
        config.max_lock_duration,
    )?;

    let res = Response::new()
        .add_attribute("action", "lock_tokens")
        .add_attribute("owner", &lock.owner)
        .add_attribute("lock_id", lock.id.to_string())
        .add_attribute("duration", lock.duration.to_string())
        .add_attribute("amount", coins_to_string(&lock.coins));
    Ok(res)
}

pub fn try_add_to_lock(
    deps: DepsMut,
    sender: &Addr,
    funds: Vec<Coin>,
    lock_id: u64,
) -> Result<Response, ContractError> {
    let lock = load_lock(deps.storage, lock_id)?;
    if lock.owner != *sender {
        return Err(ContractError::Unauthorized {});
    }

    let added = coins_to_string(&funds);
    let lock = lockup::add_tokens(deps.storage, lock_id, funds)?;

    let res = Response::new()
        .add_attribute("action", "add_to_lock")
        .add_attribute("owner", sender)
        .add_attribute("lock_id", lock.id.to_string())
        .add_attribute("amount", added);
    Ok(res)
}

pub fn try_begin_unlocking_all(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
) -> Result<Response, ContractError> {
    let unlocking = lockup::begin_unlocking_all(deps.storage, env.block.time, &info.sender)?;
    let ids: Vec<String> = unlocking.iter().map(|lock| lock.id.to_string()).collect();

    let res = Response::new()
        .add_attribute("action", "begin_unlocking_all")
        .add_attribute("owner", info.sender)
        .add_attribute("lock_ids", ids.join(","));
    Ok(res)
}

pub fn try_begin_unlocking(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    lock_id: u64,
    coins: Option<Vec<Coin>>,
) -> Result<Response, ContractError> {
    let lock = load_lock(deps.storage, lock_id)?;
    if lock.owner != info.sender {
        return Err(ContractError::Unauthorized {});
    }

    let unlocking = lockup::begin_unlocking(deps.storage, env.block.time, lock_id, coins)?;
    let end_time = unlocking.end_time.map(|t| t.seconds()).unwrap_or_default();

    let res = Response::new()
        .add_attribute("action", "begin_unlocking")
        .add_attribute("owner", info.sender)
        .add_attribute("lock_id", lock_id.to_string())
        .add_attribute("unlocking_lock_id", unlocking.id.to_string())
        .add_attribute("end_time", end_time.to_string())
        .add_attribute("amount", coins_to_string(&unlocking.coins));
    Ok(res)
}

pub fn try_force_unlock(
    deps: DepsMut,
    info: MessageInfo,
    lock_id: u64,
    coins: Option<Vec<Coin>>,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if !config.force_unlock_allowed_addresses.contains(&info.sender) {
        return Err(ContractError::Unauthorized {});
    }

    let released = lockup::force_unlock(deps.storage, lock_id, coins)?;
    let messages = send_tokens(deps.api, &released.owner, &released.coins)?;

    let res = Response::new()
        .add_attribute("action", "force_unlock")
        .add_attribute("sender", info.sender)
        .add_attribute("owner", &released.owner)
        .add_attribute("lock_id", lock_id.to_string())
        .add_attribute("released_lock_id", released.id.to_string())
        .add_attribute("amount", coins_to_string(&released.coins))
        .add_messages(messages);
    Ok(res)
}

/// Pays out one matured lock to its owner, apart from the sweep.
pub fn try_finalize_release(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    lock_id: u64,
) -> Result<Response, ContractError> {
    let lock = load_lock(deps.storage, lock_id)?;
    if lock.owner != info.sender {
        return Err(ContractError::Unauthorized {});
    }

    let released = lockup::finalize_release(deps.storage, env.block.time, lock_id)?;
    let messages = send_tokens(deps.api, &released.owner, &released.coins)?;

    let res = Response::new()
        .add_attribute("action", "finalize_release")
        .add_attribute("owner", &released.owner)
        .add_attribute("lock_id", lock_id.to_string())
        .add_attribute("amount", coins_to_string(&released.coins))
        .add_messages(messages);
    Ok(res)
}

pub fn release_matured(
    deps: DepsMut,
    env: Env,
    limit: Option<u32>,
) -> Result<Response, ContractError> {
    let now = env.block.time;
    let limit = limit.map(|l| l as usize);

    let config = CONFIG.load(deps.storage)?;
    let released = lockup::release_matured(deps.storage, now, limit, |lock| {
        cw20_tokens_allowed(&config, &lock.coins)
    })?;
    let synthetic = synthetic::release_matured(deps.storage, now, limit)?;

    let mut messages: Vec<CosmosMsg> = vec![];
    for lock in &released {
        messages.append(&mut send_tokens(deps.api, &lock.owner, &lock.coins)?);
    }
    let ids: Vec<String> = released.iter().map(|lock| lock.id.to_string()).collect();

    let res = Response::new()
        .add_attribute("action", "release_matured")
        .add_attribute("lock_ids", ids.join(","))
        .add_attribute("synthetic_locks", synthetic.len().to_string())
        .add_messages(messages);
    Ok(res)
}

pub fn try_create_synthetic(
    deps: DepsMut,
    info: MessageInfo,
    lock_id: u64,
    suffix: String,
    duration: u64,
) -> Result<Response, ContractError> {
    let config = only_synthetic_manager(deps.as_ref(), &info.sender)?;
    let synth = synthetic::create_synthetic(
        deps.storage,
        lock_id,
        &suffix,
        duration,
        config.max_lock_duration,
    )?;

    let res = Response::new()
        .add_attribute("action", "create_synthetic_lock")
        .add_attribute("lock_id", lock_id.to_string())
        .add_attribute("suffix", synth.suffix)
        .add_attribute("duration", synth.duration.to_string());
    Ok(res)
}

pub fn try_begin_unlocking_synthetic(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    lock_id: u64,
    suffix: String,
) -> Result<Response, ContractError> {
    only_synthetic_manager(deps.as_ref(), &info.sender)?;
    let synth =
        synthetic::begin_unlocking_synthetic(deps.storage, env.block.time, lock_id, &suffix)?;
    let end_time = synth.end_time.map(|t| t.seconds()).unwrap_or_default();

    let res = Response::new()
        .add_attribute("action", "begin_unlocking_synthetic")
        .add_attribute("lock_id", lock_id.to_string())
        .add_attribute("suffix", synth.suffix)
        .add_attribute("end_time", end_time.to_string());
    Ok(res)
}

pub fn try_delete_synthetic(
    deps: DepsMut,
    info: MessageInfo,
    lock_id: u64,
    suffix: String,
) -> Result<Response, ContractError> {
    only_synthetic_manager(deps.as_ref(), &info.sender)?;
    synthetic::delete_synthetic(deps.storage, lock_id, &suffix)?;

    let res = Response::new()
        .add_attribute("action", "delete_synthetic_lock")
        .add_attribute("lock_id", lock_id.to_string())
        .add_attribute("suffix", suffix);
    Ok(res)
}

pub fn try_update_config(
    deps: DepsMut,
    info: MessageInfo,
    admin: Option<String>,
    max_lock_duration: Option<u64>,
    force_unlock_allowed_addresses: Option<Vec<String>>,
    synthetic_lock_managers: Option<Vec<String>>,
    cw20_tokens: Option<Vec<String>>,
) -> Result<Response, ContractError> {
    let mut config = CONFIG.load(deps.storage)?;
    if info.sender != config.admin {
        return Err(ContractError::Unauthorized {});
    }

    if let Some(admin) = admin {
        config.admin = deps.api.addr_validate(&admin)?;
    }
    if let Some(max_lock_duration) = max_lock_duration {
        config.max_lock_duration = max_lock_duration;
    }
    if let Some(addrs) = force_unlock_allowed_addresses {
        config.force_unlock_allowed_addresses = validate_addrs(deps.api, addrs)?;
    }
    if let Some(addrs) = synthetic_lock_managers {
        config.synthetic_lock_managers = validate_addrs(deps.api, addrs)?;
    }
    if let Some(addrs) = cw20_tokens {
        config.cw20_tokens = validate_addrs(deps.api, addrs)?;
    }
    CONFIG.save(deps.storage, &config)?;

    Ok(Response::new()
        .add_attribute("action", "update_config")
        .add_attribute("admin", config.admin))
}

pub fn try_receive(
    deps: DepsMut,
    info: MessageInfo,
    wrapper: Cw20ReceiveMsg,
) -> Result<Response, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if !config.cw20_tokens.contains(&info.sender) {
        return Err(ContractError::UnsupportedToken {
            token: info.sender.into(),
        });
    }

    let msg: ReceiveMsg = from_binary(&wrapper.msg)?;
    let token = Cw20CoinVerified {
        address: info.sender,
        amount: wrapper.amount,
    };
    let funds = vec![Coin {
        denom: cw20_denom(&token),
        amount: token.amount,
    }];
    let sender = deps.api.addr_validate(&wrapper.sender)?;
    match msg {
        ReceiveMsg::LockTokens { duration } => try_lock(deps, sender, funds, duration),
        ReceiveMsg::AddToLock { lock_id } => try_add_to_lock(deps, &sender, funds, lock_id),
    }
}

/// Every cw20 coin of the set belongs to a token still on the allow-list.
fn cw20_tokens_allowed(config: &Config, coins: &[Coin]) -> bool {
    coins.iter().all(|c| {
        !c.denom.starts_with(CW20_DENOM_PREFIX)
            || config
                .cw20_tokens
                .iter()
                .any(|token| c.denom[CW20_DENOM_PREFIX.len()..] == *token.as_str())
    })
}

fn only_synthetic_manager(deps: Deps, sender: &Addr) -> Result<Config, ContractError> {
    let config = CONFIG.load(deps.storage)?;
    if !config.synthetic_lock_managers.contains(sender) {
        return Err(ContractError::Unauthorized {});
    }
    Ok(config)
}

fn validate_addrs(api: &dyn Api, addrs: Vec<String>) -> StdResult<Vec<Addr>> {
    addrs.iter().map(|addr| api.addr_validate(addr)).collect()
}

fn coins_to_string(coins: &[Coin]) -> String {
    let coins: Vec<String> = coins.iter().map(|c| c.to_string()).collect();
    coins.join(",")
}

#[cfg_attr(not(feature = "library"), entry_point)]
pub fn query(deps: Deps, env: Env, msg: QueryMsg) -> StdResult<Binary> {
    let now = env.block.time;
    match msg {
        QueryMsg::ModuleBalance {} => to_binary(&CoinsResponse {
            coins: module_balance(deps.storage)?,
        }),
        QueryMsg::ModuleLockedAmount {} => to_binary(&CoinsResponse {
            coins: module_locked_amount(deps.storage, now)?,
        }),
        QueryMsg::AccountUnlockableCoins { owner } => {
            let owner = deps.api.addr_validate(&owner)?;
            to_binary(&CoinsResponse {
                coins: account_unlockable_coins(deps.storage, &owner, now)?,
            })
        }
        QueryMsg::AccountUnlockingCoins { owner } => {
            let owner = deps.api.addr_validate(&owner)?;
            to_binary(&CoinsResponse {
                coins: account_unlocking_coins(deps.storage, &owner, now)?,
            })
        }
        QueryMsg::AccountLockedCoins { owner } => {
            let owner = deps.api.addr_validate(&owner)?;
            to_binary(&CoinsResponse {
                coins: account_locked_coins(deps.storage, &owner, now)?,
            })
        }
        QueryMsg::AccountLockedPastTime { owner, timestamp } => {
            let filter = LockFilter {
                time: Some(TimeCmp::LockedPast(timestamp)),
                ..LockFilter::default()
            };
            to_binary(&query_account_locks(deps, owner, filter)?)
        }
        QueryMsg::AccountLockedPastTimeNotUnlockingOnly { owner, timestamp } => {
            let filter = LockFilter {
                time: Some(TimeCmp::LockedPast(timestamp)),
                not_unlocking_only: true,
                ..LockFilter::default()
            };
            to_binary(&query_account_locks(deps, owner, filter)?)
        }
        QueryMsg::AccountUnlockedBeforeTime { owner, timestamp } => {
            let filter = LockFilter {
                time: Some(TimeCmp::UnlockedBefore(timestamp)),
                ..LockFilter::default()
            };
            to_binary(&query_account_locks(deps, owner, filter)?)
        }
        QueryMsg::AccountLockedPastTimeDenom {
            owner,
            timestamp,
            denom,
        } => {
            let filter = LockFilter {
                time: Some(TimeCmp::LockedPast(timestamp)),
                denom: Some(denom),
                ..LockFilter::default()
            };
            to_binary(&query_account_locks(deps, owner, filter)?)
        }
        QueryMsg::LockedById { lock_id } => to_binary(&query_lock(deps, lock_id)?),
        QueryMsg::SyntheticLocksByLockId { lock_id } => {
            let synths = synthetic::by_lock_id(deps.storage, lock_id)?;
            to_binary(&to_synthetic_response(deps, synths)?)
        }
        QueryMsg::SyntheticLocksLongerDuration { suffix, duration } => {
            let synths = synthetic::longer_than(deps.storage, &suffix, duration)?;
            to_binary(&to_synthetic_response(deps, synths)?)
        }
        QueryMsg::AccountLockedLongerDuration { owner, duration } => {
            let filter = LockFilter {
                duration: Some(DurationCmp::AtLeast(duration)),
                ..LockFilter::default()
            };
            to_binary(&query_account_locks(deps, owner, filter)?)
        }
        QueryMsg::AccountLockedLongerDurationNotUnlockingOnly { owner, duration } => {
            let filter = LockFilter {
                duration: Some(DurationCmp::AtLeast(duration)),
                not_unlocking_only: true,
                ..LockFilter::default()
            };
            to_binary(&query_account_locks(deps, owner, filter)?)
        }
        QueryMsg::AccountLockedLongerDurationDenom {
            owner,
            duration,
            denom,
        } => {
            let filter = LockFilter {
                duration: Some(DurationCmp::AtLeast(duration)),
                denom: Some(denom),
                ..LockFilter::default()
            };
            to_binary(&query_account_locks(deps, owner, filter)?)
        }
        QueryMsg::AccountLockedDuration { owner, duration } => {
            let filter = LockFilter {
                duration: Some(DurationCmp::Exactly(duration)),
                ..LockFilter::default()
            };
            to_binary(&query_account_locks(deps, owner, filter)?)
        }
        QueryMsg::TotalLockedOfDenom {
            denom,
            min_duration,
        } => to_binary(&AmountResponse {
            amount: total_locked_of_denom(deps.storage, &denom, min_duration)?,
        }),
        QueryMsg::AllLocks { start_after, limit } => {
            let locks = all_locks(deps.storage, start_after, limit)?;
            to_binary(&LocksResponse {
                locks: locks.into_iter().map(LockInfo::from).collect(),
            })
        }
        QueryMsg::NextLockId {} => to_binary(&NextLockIdResponse {
            lock_id: LAST_LOCK_ID.may_load(deps.storage)?.unwrap_or_default() + 1,
        }),
        QueryMsg::Config {} => to_binary(&CONFIG.load(deps.storage)?),
    }
}

fn query_lock(deps: Deps, lock_id: u64) -> StdResult<LockResponse> {
    let lock = LOCKS.load(deps.storage, lock_id)?;
    Ok(LockResponse { lock: lock.into() })
}

fn query_account_locks(deps: Deps, owner: String, filter: LockFilter) -> StdResult<LocksResponse> {
    let owner = deps.api.addr_validate(&owner)?;
    let locks = account_locks(deps.storage, &owner, &filter)?;
    Ok(LocksResponse {
        locks: locks.into_iter().map(LockInfo::from).collect(),
    })
}

fn to_synthetic_response(
    deps: Deps,
    synths: Vec<crate::state::SyntheticLock>,
) -> StdResult<SyntheticLocksResponse> {
    let synthetic_locks: StdResult<Vec<_>> = synths
        .into_iter()
        .map(|synth| {
            let coins = synthetic::synthetic_coins(deps.storage, &synth)?;
            Ok(SyntheticLockInfo::new(synth, coins))
        })
        .collect();

    Ok(SyntheticLocksResponse {
        synthetic_locks: synthetic_locks?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::LockStatus;
    use cosmwasm_std::testing::{mock_dependencies, mock_env, mock_info};
    use cosmwasm_std::{coin, coins, BankMsg, StdError, SubMsg, Timestamp, Uint128, WasmMsg};
    use cw20::Cw20ExecuteMsg;

    const WEEK: u64 = 604_800;

    fn setup(deps: DepsMut) {
        let msg = InstantiateMsg {
            max_lock_duration: 4 * WEEK,
            force_unlock_allowed_addresses: vec!["governance".into()],
            synthetic_lock_managers: vec!["superfluid".into()],
            cw20_tokens: vec!["token".into()],
        };
        let info = mock_info("creator", &[]);
        let _res = instantiate(deps, mock_env(), info, msg).unwrap();
    }

    fn env_at(seconds: u64) -> Env {
        let mut env = mock_env();
        env.block.time = Timestamp::from_seconds(seconds);
        env
    }

    fn lock_info(deps: Deps, lock_id: u64) -> LockInfo {
        let res = query(deps, mock_env(), QueryMsg::LockedById { lock_id }).unwrap();
        let value: LockResponse = from_binary(&res).unwrap();
        value.lock
    }

    #[test]
    fn proper_initialization() {
        let mut deps = mock_dependencies();

        let msg = InstantiateMsg {
            max_lock_duration: WEEK,
            force_unlock_allowed_addresses: vec!["governance".into()],
            synthetic_lock_managers: vec![],
            cw20_tokens: vec![],
        };
        let info = mock_info("creator", &coins(1000, "earth"));

        // we can just call .unwrap() to assert this was a success
        let res = instantiate(deps.as_mut(), mock_env(), info, msg).unwrap();
        assert_eq!(0, res.messages.len());

        let res = query(deps.as_ref(), mock_env(), QueryMsg::Config {}).unwrap();
        let value: Config = from_binary(&res).unwrap();
        assert_eq!("creator", value.admin.as_str());
        assert_eq!(WEEK, value.max_lock_duration);
        assert_eq!(
            vec![Addr::unchecked("governance")],
            value.force_unlock_allowed_addresses
        );

        let res = query(deps.as_ref(), mock_env(), QueryMsg::NextLockId {}).unwrap();
        let value: NextLockIdResponse = from_binary(&res).unwrap();
        assert_eq!(1, value.lock_id);
    }

    #[test]
    fn lock_tokens() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        // empty funds
        let info = mock_info("anyone", &[]);
        let msg = ExecuteMsg::LockTokens { duration: WEEK };
        let res = execute(deps.as_mut(), mock_env(), info, msg);
        match res {
            Err(ContractError::InvalidCoins { .. }) => {}
            _ => panic!("Must return InvalidCoins error"),
        }

        // too long
        let info = mock_info("anyone", &coins(100, "uosmo"));
        let msg = ExecuteMsg::LockTokens {
            duration: 4 * WEEK + 1,
        };
        let res = execute(deps.as_mut(), mock_env(), info.clone(), msg);
        match res {
            Err(ContractError::InvalidDuration { .. }) => {}
            _ => panic!("Must return InvalidDuration error"),
        }

        // lock funds
        let msg = ExecuteMsg::LockTokens { duration: WEEK };
        let res = execute(deps.as_mut(), mock_env(), info, msg).unwrap();
        assert_eq!(0, res.messages.len());
        assert_eq!("1", res.attributes[2].value);

        let value = lock_info(deps.as_ref(), 1);
        assert_eq!("anyone", value.owner.as_str());
        assert_eq!(WEEK, value.duration);
        assert_eq!(LockStatus::Bonded, value.status);
        assert_eq!(None, value.end_time);
        assert_eq!(coins(100, "uosmo"), value.coins);

        let res = query(deps.as_ref(), mock_env(), QueryMsg::NextLockId {}).unwrap();
        let value: NextLockIdResponse = from_binary(&res).unwrap();
        assert_eq!(2, value.lock_id);
    }

    #[test]
    fn add_to_lock() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        let info = mock_info("anyone", &coins(2, "token"));
        let msg = ExecuteMsg::LockTokens { duration: WEEK };
        let _res = execute(deps.as_mut(), mock_env(), info, msg).unwrap();

        // try increase lock invalid id
        let info = mock_info("anyone", &coins(5, "token"));
        let msg = ExecuteMsg::AddToLock { lock_id: 2 };
        let res = execute(deps.as_mut(), mock_env(), info.clone(), msg);
        match res {
            Err(ContractError::LockNotFound { lock_id }) => assert_eq!(2, lock_id),
            _ => panic!("Must return LockNotFound error"),
        }

        // only owner
        let other = mock_info("other", &coins(5, "token"));
        let msg = ExecuteMsg::AddToLock { lock_id: 1 };
        let res = execute(deps.as_mut(), mock_env(), other, msg);
        match res {
            Err(ContractError::Unauthorized {}) => {}
            _ => panic!("Must return Unauthorized error"),
        }

        let msg = ExecuteMsg::AddToLock { lock_id: 1 };
        let res = execute(deps.as_mut(), mock_env(), info, msg).unwrap();
        assert_eq!(0, res.messages.len());
        assert_eq!(coins(7, "token"), lock_info(deps.as_ref(), 1).coins);
    }

    #[test]
    fn unlock_and_release() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        let info = mock_info("anyone", &coins(100, "uosmo"));
        let msg = ExecuteMsg::LockTokens { duration: WEEK };
        let _res = execute(deps.as_mut(), env_at(0), info, msg).unwrap();

        // only the owner can begin unlocking
        let msg = ExecuteMsg::BeginUnlocking {
            lock_id: 1,
            coins: None,
        };
        let res = execute(deps.as_mut(), env_at(100), mock_info("other", &[]), msg);
        match res {
            Err(ContractError::Unauthorized {}) => {}
            _ => panic!("Must return Unauthorized error"),
        }

        let msg = ExecuteMsg::BeginUnlocking {
            lock_id: 1,
            coins: None,
        };
        let _res = execute(deps.as_mut(), env_at(100), mock_info("anyone", &[]), msg).unwrap();
        let value = lock_info(deps.as_ref(), 1);
        assert_eq!(LockStatus::Unlocking, value.status);
        assert_eq!(Some(Timestamp::from_seconds(100 + WEEK)), value.end_time);

        // nothing due yet
        let msg = ExecuteMsg::ReleaseMatured { limit: None };
        let auth_info = mock_info("cranker", &[]);
        let res = execute(deps.as_mut(), env_at(99 + WEEK), auth_info.clone(), msg).unwrap();
        assert_eq!(0, res.messages.len());

        let msg = ExecuteMsg::ReleaseMatured { limit: None };
        let res = execute(deps.as_mut(), env_at(100 + WEEK), auth_info, msg).unwrap();
        assert_eq!(1, res.messages.len());
        assert_eq!(
            res.messages[0],
            SubMsg::new(CosmosMsg::Bank(BankMsg::Send {
                to_address: "anyone".into(),
                amount: coins(100, "uosmo")
            }))
        );

        // should lock completed
        let msg = QueryMsg::LockedById { lock_id: 1 };
        let res = query(deps.as_ref(), mock_env(), msg);
        match res {
            StdResult::Err(StdError::NotFound { .. }) => {}
            _ => panic!("Must return StdError::NotFound error"),
        }
    }

    #[test]
    fn partial_unlock_splits_lock() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        let funds = vec![coin(10, "uion"), coin(100, "uosmo")];
        let msg = ExecuteMsg::LockTokens { duration: WEEK };
        let _res = execute(deps.as_mut(), env_at(0), mock_info("anyone", &funds), msg).unwrap();

        let msg = ExecuteMsg::BeginUnlocking {
            lock_id: 1,
            coins: Some(coins(101, "uosmo")),
        };
        let res = execute(deps.as_mut(), env_at(0), mock_info("anyone", &[]), msg);
        match res {
            Err(ContractError::InsufficientFunds { .. }) => {}
            _ => panic!("Must return InsufficientFunds error"),
        }

        let msg = ExecuteMsg::BeginUnlocking {
            lock_id: 1,
            coins: Some(coins(30, "uosmo")),
        };
        let res = execute(deps.as_mut(), env_at(0), mock_info("anyone", &[]), msg).unwrap();
        assert_eq!("2", res.attributes[3].value);

        let kept = lock_info(deps.as_ref(), 1);
        assert_eq!(LockStatus::Bonded, kept.status);
        assert_eq!(vec![coin(10, "uion"), coin(70, "uosmo")], kept.coins);
        let split = lock_info(deps.as_ref(), 2);
        assert_eq!(LockStatus::Unlocking, split.status);
        assert_eq!(coins(30, "uosmo"), split.coins);

        let res = query(deps.as_ref(), env_at(0), QueryMsg::ModuleBalance {}).unwrap();
        let value: CoinsResponse = from_binary(&res).unwrap();
        assert_eq!(funds, value.coins);

        // the bonded remainder can still be unlocked in one go
        let msg = ExecuteMsg::BeginUnlockingAll {};
        let _res = execute(deps.as_mut(), env_at(10), mock_info("anyone", &[]), msg).unwrap();
        assert_eq!(LockStatus::Unlocking, lock_info(deps.as_ref(), 1).status);
    }

    #[test]
    fn force_unlock() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        let msg = ExecuteMsg::LockTokens { duration: WEEK };
        let info = mock_info("anyone", &coins(100, "uosmo"));
        let _res = execute(deps.as_mut(), env_at(0), info, msg).unwrap();

        let msg = ExecuteMsg::ForceUnlock {
            lock_id: 1,
            coins: Some(coins(40, "uosmo")),
        };
        let res = execute(deps.as_mut(), env_at(0), mock_info("anyone", &[]), msg.clone());
        match res {
            Err(ContractError::Unauthorized {}) => {}
            _ => panic!("Must return Unauthorized error"),
        }

        let res = execute(deps.as_mut(), env_at(0), mock_info("governance", &[]), msg).unwrap();
        assert_eq!(
            res.messages[0],
            SubMsg::new(CosmosMsg::Bank(BankMsg::Send {
                to_address: "anyone".into(),
                amount: coins(40, "uosmo")
            }))
        );
        assert_eq!("2", res.attributes[4].value);
        assert_eq!(coins(60, "uosmo"), lock_info(deps.as_ref(), 1).coins);

        // the released part used up an id
        let res = query(deps.as_ref(), env_at(0), QueryMsg::NextLockId {}).unwrap();
        let value: NextLockIdResponse = from_binary(&res).unwrap();
        assert_eq!(3, value.lock_id);

        let msg = ExecuteMsg::ForceUnlock {
            lock_id: 1,
            coins: None,
        };
        let res = execute(deps.as_mut(), env_at(0), mock_info("governance", &[]), msg).unwrap();
        assert_eq!(1, res.messages.len());

        let res = query(deps.as_ref(), env_at(0), QueryMsg::ModuleBalance {}).unwrap();
        let value: CoinsResponse = from_binary(&res).unwrap();
        assert!(value.coins.is_empty());
    }

    #[test]
    fn cw20_lock_and_release() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        let msg = ExecuteMsg::Receive(Cw20ReceiveMsg {
            sender: "anyone".into(),
            amount: Uint128::new(50),
            msg: to_binary(&ReceiveMsg::LockTokens { duration: WEEK }).unwrap(),
        });
        let _res = execute(deps.as_mut(), env_at(0), mock_info("token", &[]), msg).unwrap();

        let value = lock_info(deps.as_ref(), 1);
        assert_eq!("anyone", value.owner.as_str());
        assert_eq!(coins(50, "cw20:token"), value.coins);

        let msg = ExecuteMsg::Receive(Cw20ReceiveMsg {
            sender: "anyone".into(),
            amount: Uint128::new(5),
            msg: to_binary(&ReceiveMsg::AddToLock { lock_id: 1 }).unwrap(),
        });
        let _res = execute(deps.as_mut(), env_at(0), mock_info("token", &[]), msg).unwrap();

        let msg = ExecuteMsg::BeginUnlocking {
            lock_id: 1,
            coins: None,
        };
        let _res = execute(deps.as_mut(), env_at(0), mock_info("anyone", &[]), msg).unwrap();

        let res = sudo(
            deps.as_mut(),
            env_at(WEEK),
            SudoMsg::ReleaseMatured { limit: None },
        )
        .unwrap();
        assert_eq!(
            res.messages[0],
            SubMsg::new(CosmosMsg::Wasm(WasmMsg::Execute {
                contract_addr: "token".into(),
                msg: to_binary(&Cw20ExecuteMsg::Transfer {
                    recipient: "anyone".into(),
                    amount: Uint128::new(55),
                })
                .unwrap(),
                funds: vec![],
            }))
        );
    }

    #[test]
    fn synthetic_locks() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        let msg = ExecuteMsg::LockTokens { duration: 2 * WEEK };
        let info = mock_info("anyone", &coins(100, "gamm/pool/1"));
        let _res = execute(deps.as_mut(), env_at(0), info, msg).unwrap();

        let create = ExecuteMsg::CreateSyntheticLock {
            lock_id: 1,
            suffix: "/superbonding".into(),
            duration: 2 * WEEK,
        };
        let res = execute(deps.as_mut(), env_at(0), mock_info("anyone", &[]), create.clone());
        match res {
            Err(ContractError::Unauthorized {}) => {}
            _ => panic!("Must return Unauthorized error"),
        }
        let manager = mock_info("superfluid", &[]);
        let _res = execute(deps.as_mut(), env_at(0), manager.clone(), create.clone()).unwrap();
        let res = execute(deps.as_mut(), env_at(0), manager.clone(), create);
        match res {
            Err(ContractError::DuplicateSuffix { .. }) => {}
            _ => panic!("Must return DuplicateSuffix error"),
        }

        let msg = QueryMsg::SyntheticLocksByLockId { lock_id: 1 };
        let res = query(deps.as_ref(), env_at(0), msg).unwrap();
        let value: SyntheticLocksResponse = from_binary(&res).unwrap();
        assert_eq!(1, value.synthetic_locks.len());
        assert_eq!(
            coins(100, "gamm/pool/1/superbonding"),
            value.synthetic_locks[0].coins
        );
        assert_eq!(LockStatus::Bonded, value.synthetic_locks[0].status);

        let msg = ExecuteMsg::BeginUnlockingSynthetic {
            lock_id: 1,
            suffix: "/superbonding".into(),
        };
        let _res = execute(deps.as_mut(), env_at(0), manager, msg).unwrap();
        assert_eq!(LockStatus::Bonded, lock_info(deps.as_ref(), 1).status);

        // the synthetic lock goes away with the base lock
        let msg = ExecuteMsg::ForceUnlock {
            lock_id: 1,
            coins: None,
        };
        let _res = execute(deps.as_mut(), env_at(0), mock_info("governance", &[]), msg).unwrap();
        let msg = QueryMsg::SyntheticLocksByLockId { lock_id: 1 };
        let res = query(deps.as_ref(), env_at(0), msg).unwrap();
        let value: SyntheticLocksResponse = from_binary(&res).unwrap();
        assert!(value.synthetic_locks.is_empty());
    }

    #[test]
    fn account_queries() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        for (amount, duration) in &[(10u128, WEEK), (20, 2 * WEEK), (30, 3 * WEEK)] {
            let info = mock_info("anyone", &coins(*amount, "uosmo"));
            let msg = ExecuteMsg::LockTokens {
                duration: *duration,
            };
            let _res = execute(deps.as_mut(), env_at(0), info, msg).unwrap();
        }
        let msg = ExecuteMsg::BeginUnlocking {
            lock_id: 1,
            coins: None,
        };
        let _res = execute(deps.as_mut(), env_at(0), mock_info("anyone", &[]), msg).unwrap();

        let locks = |msg: QueryMsg, seconds: u64| -> Vec<u64> {
            let res = query(deps.as_ref(), env_at(seconds), msg).unwrap();
            let value: LocksResponse = from_binary(&res).unwrap();
            value.locks.into_iter().map(|l| l.id).collect()
        };
        let owner = String::from("anyone");

        let msg = QueryMsg::AccountLockedLongerDuration {
            owner: owner.clone(),
            duration: 2 * WEEK,
        };
        assert_eq!(vec![2, 3], locks(msg, 0));
        let msg = QueryMsg::AccountLockedLongerDurationNotUnlockingOnly {
            owner: owner.clone(),
            duration: 0,
        };
        assert_eq!(vec![2, 3], locks(msg, 0));
        let msg = QueryMsg::AccountLockedLongerDurationDenom {
            owner: owner.clone(),
            duration: 0,
            denom: "uosmo".into(),
        };
        assert_eq!(vec![1, 2, 3], locks(msg, 0));
        let msg = QueryMsg::AccountLockedDuration {
            owner: owner.clone(),
            duration: WEEK,
        };
        assert_eq!(vec![1], locks(msg, 0));

        let ends = Timestamp::from_seconds(WEEK);
        let msg = QueryMsg::AccountLockedPastTime {
            owner: owner.clone(),
            timestamp: ends.minus_seconds(1),
        };
        assert_eq!(vec![1, 2, 3], locks(msg, 0));
        let msg = QueryMsg::AccountLockedPastTime {
            owner: owner.clone(),
            timestamp: ends,
        };
        assert_eq!(vec![2, 3], locks(msg, 0));
        let msg = QueryMsg::AccountUnlockedBeforeTime {
            owner: owner.clone(),
            timestamp: ends,
        };
        assert_eq!(vec![1], locks(msg, 0));
        let msg = QueryMsg::AccountLockedPastTimeNotUnlockingOnly {
            owner: owner.clone(),
            timestamp: ends.minus_seconds(1),
        };
        assert_eq!(vec![2, 3], locks(msg, 0));
        let msg = QueryMsg::AccountLockedPastTimeDenom {
            owner: owner.clone(),
            timestamp: ends.minus_seconds(1),
            denom: "uion".into(),
        };
        assert!(locks(msg, 0).is_empty());

        let coins_at = |msg: QueryMsg, seconds: u64| -> Vec<Coin> {
            let res = query(deps.as_ref(), env_at(seconds), msg).unwrap();
            let value: CoinsResponse = from_binary(&res).unwrap();
            value.coins
        };
        let msg = QueryMsg::AccountUnlockingCoins {
            owner: owner.clone(),
        };
        assert_eq!(coins(10, "uosmo"), coins_at(msg, WEEK - 1));
        let msg = QueryMsg::AccountUnlockableCoins {
            owner: owner.clone(),
        };
        assert_eq!(coins(10, "uosmo"), coins_at(msg, WEEK));
        let msg = QueryMsg::AccountLockedCoins { owner };
        assert_eq!(coins(50, "uosmo"), coins_at(msg, WEEK));
        assert_eq!(coins(50, "uosmo"), coins_at(QueryMsg::ModuleLockedAmount {}, WEEK));
        assert_eq!(coins(60, "uosmo"), coins_at(QueryMsg::ModuleBalance {}, WEEK));

        let msg = QueryMsg::TotalLockedOfDenom {
            denom: "uosmo".into(),
            min_duration: 2 * WEEK,
        };
        let res = query(deps.as_ref(), env_at(0), msg).unwrap();
        let value: AmountResponse = from_binary(&res).unwrap();
        assert_eq!(Uint128::new(50), value.amount);

        let msg = QueryMsg::AllLocks {
            start_after: Some(1),
            limit: None,
        };
        assert_eq!(vec![2, 3], locks(msg, 0));
    }

    #[test]
    fn update_config() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        let msg = ExecuteMsg::UpdateConfig {
            admin: None,
            max_lock_duration: Some(WEEK),
            force_unlock_allowed_addresses: None,
            synthetic_lock_managers: Some(vec![]),
            cw20_tokens: Some(vec!["token".into(), "other_token".into()]),
        };
        let res = execute(deps.as_mut(), mock_env(), mock_info("anyone", &[]), msg.clone());
        match res {
            Err(ContractError::Unauthorized {}) => {}
            _ => panic!("Must return Unauthorized error"),
        }
        let _res = execute(deps.as_mut(), mock_env(), mock_info("creator", &[]), msg).unwrap();

        let res = query(deps.as_ref(), mock_env(), QueryMsg::Config {}).unwrap();
        let value: Config = from_binary(&res).unwrap();
        assert_eq!(WEEK, value.max_lock_duration);
        assert!(value.synthetic_lock_managers.is_empty());
        assert_eq!(2, value.cw20_tokens.len());
        assert_eq!(
            vec![Addr::unchecked("governance")],
            value.force_unlock_allowed_addresses
        );

        let msg = ExecuteMsg::LockTokens { duration: 2 * WEEK };
        let res = execute(deps.as_mut(), mock_env(), mock_info("anyone", &coins(1, "a")), msg);
        match res {
            Err(ContractError::InvalidDuration { .. }) => {}
            _ => panic!("Must return InvalidDuration error"),
        }
    }

    #[test]
    fn receive_only_from_listed_tokens() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        // a wallet posing as a cw20 contract
        let msg = ExecuteMsg::Receive(Cw20ReceiveMsg {
            sender: "attacker".into(),
            amount: Uint128::new(1),
            msg: to_binary(&ReceiveMsg::LockTokens { duration: 0 }).unwrap(),
        });
        let res = execute(deps.as_mut(), env_at(0), mock_info("attacker_wallet", &[]), msg);
        match res {
            Err(ContractError::UnsupportedToken { token }) => assert_eq!("attacker_wallet", token),
            _ => panic!("Must return UnsupportedToken error"),
        }

        // bank funds cannot pose as cw20 tokens either
        let msg = ExecuteMsg::LockTokens { duration: 0 };
        let info = mock_info("attacker", &coins(1, "cw20:attacker_wallet"));
        let res = execute(deps.as_mut(), env_at(0), info, msg);
        match res {
            Err(ContractError::InvalidCoins { .. }) => {}
            _ => panic!("Must return InvalidCoins error"),
        }

        let res = query(deps.as_ref(), env_at(0), QueryMsg::NextLockId {}).unwrap();
        let value: NextLockIdResponse = from_binary(&res).unwrap();
        assert_eq!(1, value.lock_id);
    }

    #[test]
    fn sweep_skips_delisted_tokens() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        let msg = ExecuteMsg::Receive(Cw20ReceiveMsg {
            sender: "holder".into(),
            amount: Uint128::new(1),
            msg: to_binary(&ReceiveMsg::LockTokens { duration: 0 }).unwrap(),
        });
        let _res = execute(deps.as_mut(), env_at(0), mock_info("token", &[]), msg).unwrap();
        let msg = ExecuteMsg::BeginUnlocking {
            lock_id: 1,
            coins: None,
        };
        let _res = execute(deps.as_mut(), env_at(0), mock_info("holder", &[]), msg).unwrap();

        let msg = ExecuteMsg::LockTokens { duration: 10 };
        let info = mock_info("honest", &coins(100, "uosmo"));
        let _res = execute(deps.as_mut(), env_at(0), info, msg).unwrap();
        let msg = ExecuteMsg::BeginUnlocking {
            lock_id: 2,
            coins: None,
        };
        let _res = execute(deps.as_mut(), env_at(0), mock_info("honest", &[]), msg).unwrap();

        let msg = ExecuteMsg::UpdateConfig {
            admin: None,
            max_lock_duration: None,
            force_unlock_allowed_addresses: None,
            synthetic_lock_managers: None,
            cw20_tokens: Some(vec![]),
        };
        let _res = execute(deps.as_mut(), env_at(0), mock_info("creator", &[]), msg).unwrap();

        // the token lock sits first in the queue but does not hold up the sweep
        let msg = SudoMsg::ReleaseMatured { limit: Some(1) };
        let res = sudo(deps.as_mut(), env_at(10), msg).unwrap();
        assert_eq!(
            res.messages,
            vec![SubMsg::new(CosmosMsg::Bank(BankMsg::Send {
                to_address: "honest".into(),
                amount: coins(100, "uosmo")
            }))]
        );
        assert_eq!(LockStatus::Unlocking, lock_info(deps.as_ref(), 1).status);
    }

    #[test]
    fn finalize_release_by_owner() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        let msg = ExecuteMsg::LockTokens { duration: WEEK };
        let info = mock_info("anyone", &coins(100, "uosmo"));
        let _res = execute(deps.as_mut(), env_at(0), info, msg).unwrap();

        let msg = ExecuteMsg::FinalizeRelease { lock_id: 1 };
        let res = execute(deps.as_mut(), env_at(0), mock_info("anyone", &[]), msg);
        match res {
            Err(ContractError::LockNotUnlocking { lock_id }) => assert_eq!(1, lock_id),
            _ => panic!("Must return LockNotUnlocking error"),
        }

        let msg = ExecuteMsg::BeginUnlocking {
            lock_id: 1,
            coins: None,
        };
        let _res = execute(deps.as_mut(), env_at(0), mock_info("anyone", &[]), msg).unwrap();

        let msg = ExecuteMsg::FinalizeRelease { lock_id: 1 };
        let res = execute(deps.as_mut(), env_at(WEEK - 1), mock_info("anyone", &[]), msg);
        match res {
            Err(ContractError::LockNotMatured { .. }) => {}
            _ => panic!("Must return LockNotMatured error"),
        }

        let msg = ExecuteMsg::FinalizeRelease { lock_id: 1 };
        let res = execute(deps.as_mut(), env_at(WEEK), mock_info("other", &[]), msg);
        match res {
            Err(ContractError::Unauthorized {}) => {}
            _ => panic!("Must return Unauthorized error"),
        }

        let msg = ExecuteMsg::FinalizeRelease { lock_id: 1 };
        let res = execute(deps.as_mut(), env_at(WEEK), mock_info("anyone", &[]), msg).unwrap();
        assert_eq!(
            res.messages,
            vec![SubMsg::new(CosmosMsg::Bank(BankMsg::Send {
                to_address: "anyone".into(),
                amount: coins(100, "uosmo")
            }))]
        );

        let msg = ExecuteMsg::FinalizeRelease { lock_id: 1 };
        let res = execute(deps.as_mut(), env_at(WEEK), mock_info("anyone", &[]), msg);
        match res {
            Err(ContractError::LockNotFound { .. }) => {}
            _ => panic!("Must return LockNotFound error"),
        }
    }

    #[test]
    fn module_balance_sorted_by_denom() {
        let mut deps = mock_dependencies();
        setup(deps.as_mut());

        let funds = vec![coin(1, "ibc/ABCDEF"), coin(2, "uosmo")];
        let msg = ExecuteMsg::LockTokens { duration: WEEK };
        let _res = execute(deps.as_mut(), env_at(0), mock_info("anyone", &funds), msg).unwrap();

        let res = query(deps.as_ref(), env_at(0), QueryMsg::ModuleBalance {}).unwrap();
        let value: CoinsResponse = from_binary(&res).unwrap();
        assert_eq!(funds, value.coins);

        let res = query(deps.as_ref(), env_at(0), QueryMsg::ModuleLockedAmount {}).unwrap();
        let value: CoinsResponse = from_binary(&res).unwrap();
        assert_eq!(funds, value.coins);
    }
}
