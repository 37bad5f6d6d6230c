use cosmwasm_std::{
    to_binary, Addr, Api, BankMsg, Coin, CosmosMsg, OverflowError, StdResult, WasmMsg,
};
use cw20::{Cw20CoinVerified, Cw20ExecuteMsg};

use crate::error::ContractError;

pub const CW20_DENOM_PREFIX: &str = "cw20:";

/// Denom under which a cw20 token is locked.
pub fn cw20_denom(token: &Cw20CoinVerified) -> String {
    format!("{}{}", CW20_DENOM_PREFIX, token.address)
}

/// Rejects bank funds whose denom would be paid out as a cw20 transfer.
pub fn check_native(coins: &[Coin]) -> Result<(), ContractError> {
    match coins.iter().find(|c| c.denom.starts_with(CW20_DENOM_PREFIX)) {
        Some(coin) => Err(ContractError::InvalidCoins {
            reason: format!("native denom {} uses the cw20 prefix", coin.denom),
        }),
        None => Ok(()),
    }
}

/// Validates a coin set and returns it sorted by denom.
pub fn normalize_coins(mut coins: Vec<Coin>) -> Result<Vec<Coin>, ContractError> {
    if coins.is_empty() {
        return Err(ContractError::InvalidCoins {
            reason: "no coins sent".into(),
        });
    }
    if let Some(zero) = coins.iter().find(|c| c.amount.is_zero()) {
        return Err(ContractError::InvalidCoins {
            reason: format!("zero amount of {}", zero.denom),
        });
    }
    coins.sort_by(|a, b| a.denom.cmp(&b.denom));
    if let Some(pair) = coins.windows(2).find(|w| w[0].denom == w[1].denom) {
        return Err(ContractError::InvalidCoins {
            reason: format!("duplicate denom {}", pair[0].denom),
        });
    }
    Ok(coins)
}

/// Merges `add` into `held` denom-wise.
pub fn add_coins(held: &[Coin], add: &[Coin]) -> Result<Vec<Coin>, OverflowError> {
    let mut merged = held.to_vec();
    for token in add {
        match merged.iter_mut().find(|c| c.denom == token.denom) {
            Some(exist) => exist.amount = exist.amount.checked_add(token.amount)?,
            None => merged.push(token.clone()),
        }
    }
    merged.sort_by(|a, b| a.denom.cmp(&b.denom));
    Ok(merged)
}

/// Removes `sub` from `held`, dropping denoms that reach zero.
pub fn sub_coins(held: &[Coin], sub: &[Coin]) -> Result<Vec<Coin>, ContractError> {
    let mut left = held.to_vec();
    for token in sub {
        let exist = left.iter_mut().find(|c| c.denom == token.denom);
        let held_amount = exist.as_ref().map(|c| c.amount).unwrap_or_default();
        match exist {
            Some(exist) if exist.amount >= token.amount => exist.amount -= token.amount,
            _ => {
                return Err(ContractError::InsufficientFunds {
                    denom: token.denom.clone(),
                    held: held_amount,
                    requested: token.amount,
                })
            }
        }
    }
    left.retain(|c| !c.amount.is_zero());
    Ok(left)
}

/// Sums coin sets denom-wise, sorted by denom.
pub fn sum_coins<'a>(
    sets: impl IntoIterator<Item = &'a [Coin]>,
) -> Result<Vec<Coin>, OverflowError> {
    sets.into_iter()
        .try_fold(vec![], |acc: Vec<Coin>, set| add_coins(&acc, set))
}

/// Messages crediting `coins` to `to`: bank send for native denoms, cw20
/// transfer for `cw20:` denoms. The token address must be a valid address.
pub fn send_tokens(api: &dyn Api, to: &Addr, coins: &[Coin]) -> StdResult<Vec<CosmosMsg>> {
    let (cw20_coins, native_coins): (Vec<&Coin>, Vec<&Coin>) = coins
        .iter()
        .partition(|c| c.denom.starts_with(CW20_DENOM_PREFIX));

    let mut msgs: Vec<CosmosMsg> = if native_coins.is_empty() {
        vec![]
    } else {
        vec![BankMsg::Send {
            to_address: to.into(),
            amount: native_coins.into_iter().cloned().collect(),
        }
        .into()]
    };

    let cw20_msgs: StdResult<Vec<_>> = cw20_coins
        .into_iter()
        .map(|c| {
            let msg = Cw20ExecuteMsg::Transfer {
                recipient: to.into(),
                amount: c.amount,
            };
            let token = api.addr_validate(&c.denom[CW20_DENOM_PREFIX.len()..])?;
            let exec = WasmMsg::Execute {
                contract_addr: token.into(),
                msg: to_binary(&msg)?,
                funds: vec![],
            };
            Ok(exec.into())
        })
        .collect();
    msgs.append(&mut cw20_msgs?);
    Ok(msgs)
}
