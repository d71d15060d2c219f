//! # Mock AMM
//!
//! A single-pair constant-product pool exposing the router and factory
//! surfaces of [`amm_interface`]. The contract is its own pool address:
//! reserves are the token balances it holds, and pool shares are tracked in
//! an internal ledger read through a SEP-41 style `balance`.
//!
//! Swaps charge the usual 0.3 % fee. Deadlines and minimum amounts are
//! enforced so tests can drive the slippage and expiry failure paths of the
//! contracts that call it.

#![no_std]

use amm_interface::{get_amount_out, math::sqrt, optimal_deposit};
use soroban_sdk::{
    contract, contracterror, contractimpl, contracttype, token, vec, Address, Env, Vec,
};


#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    PairNotFound = 1,
    Expired = 2,
    InsufficientAmount = 3,
    InsufficientLiquidity = 4,
    InsufficientOutput = 5,
    InsufficientShares = 6,
    InvalidPath = 7,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum DataKey {
    TokenA,
    TokenB,
    ReserveA,
    ReserveB,
    TotalShares,
    Shares(Address),
}

#[contract]
pub struct MockAmm;

#[contractimpl]
impl MockAmm {
    pub fn __constructor(env: Env, token_a: Address, token_b: Address) {
        let storage = env.storage().instance();
        storage.set(&DataKey::TokenA, &token_a);
        storage.set(&DataKey::TokenB, &token_b);
        storage.set(&DataKey::ReserveA, &0i128);
        storage.set(&DataKey::ReserveB, &0i128);
        storage.set(&DataKey::TotalShares, &0i128);
    }

    // ─────────────────────────────────────────────────────────
    // Factory surface
    // ─────────────────────────────────────────────────────────

    pub fn get_pair(env: Env, token_a: Address, token_b: Address) -> Result<Address, Error> {
        orientation(&env, &token_a, &token_b)?;
        Ok(env.current_contract_address())
    }

    // ─────────────────────────────────────────────────────────
    // Router surface
    // ─────────────────────────────────────────────────────────

    pub fn router_pair_for(env: Env, token_a: Address, token_b: Address) -> Result<Address, Error> {
        Self::get_pair(env, token_a, token_b)
    }

    pub fn get_reserves(env: Env, token_a: Address, token_b: Address) -> Result<(i128, i128), Error> {
        let flipped = orientation(&env, &token_a, &token_b)?;
        Ok(oriented(reserves(&env), flipped))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        env: Env,
        token_a: Address,
        token_b: Address,
        amount_a_desired: i128,
        amount_b_desired: i128,
        amount_a_min: i128,
        amount_b_min: i128,
        to: Address,
        deadline: u64,
    ) -> Result<(i128, i128, i128), Error> {
        check_deadline(&env, deadline)?;
        to.require_auth();
        let flipped = orientation(&env, &token_a, &token_b)?;
        let (reserve_a, reserve_b) = oriented(reserves(&env), flipped);

        let (amount_a, amount_b) =
            optimal_deposit(amount_a_desired, amount_b_desired, reserve_a, reserve_b)
                .ok_or(Error::InsufficientAmount)?;
        if amount_a < amount_a_min || amount_b < amount_b_min {
            return Err(Error::InsufficientAmount);
        }

        let total = total_shares(&env);
        let shares = if total == 0 {
            sqrt(amount_a * amount_b)
        } else {
            (amount_a * total / reserve_a).min(amount_b * total / reserve_b)
        };
        if shares <= 0 {
            return Err(Error::InsufficientLiquidity);
        }

        let pool = env.current_contract_address();
        token::Client::new(&env, &token_a).transfer(&to, &pool, &amount_a);
        token::Client::new(&env, &token_b).transfer(&to, &pool, &amount_b);

        set_reserves(
            &env,
            oriented((reserve_a + amount_a, reserve_b + amount_b), flipped),
        );
        env.storage()
            .instance()
            .set(&DataKey::TotalShares, &(total + shares));
        let key = DataKey::Shares(to);
        let held: i128 = env.storage().persistent().get(&key).unwrap_or(0);
        env.storage().persistent().set(&key, &(held + shares));

        Ok((amount_a, amount_b, shares))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity(
        env: Env,
        token_a: Address,
        token_b: Address,
        liquidity: i128,
        amount_a_min: i128,
        amount_b_min: i128,
        to: Address,
        deadline: u64,
    ) -> Result<(i128, i128), Error> {
        check_deadline(&env, deadline)?;
        to.require_auth();
        let flipped = orientation(&env, &token_a, &token_b)?;

        let key = DataKey::Shares(to.clone());
        let held: i128 = env.storage().persistent().get(&key).unwrap_or(0);
        if liquidity <= 0 || liquidity > held {
            return Err(Error::InsufficientShares);
        }

        let total = total_shares(&env);
        let (reserve_a, reserve_b) = oriented(reserves(&env), flipped);
        let amount_a = liquidity * reserve_a / total;
        let amount_b = liquidity * reserve_b / total;
        if amount_a < amount_a_min || amount_b < amount_b_min {
            return Err(Error::InsufficientOutput);
        }

        env.storage().persistent().set(&key, &(held - liquidity));
        env.storage()
            .instance()
            .set(&DataKey::TotalShares, &(total - liquidity));
        set_reserves(
            &env,
            oriented((reserve_a - amount_a, reserve_b - amount_b), flipped),
        );

        let pool = env.current_contract_address();
        if amount_a > 0 {
            token::Client::new(&env, &token_a).transfer(&pool, &to, &amount_a);
        }
        if amount_b > 0 {
            token::Client::new(&env, &token_b).transfer(&pool, &to, &amount_b);
        }

        Ok((amount_a, amount_b))
    }

    pub fn swap_exact_tokens_for_tokens(
        env: Env,
        amount_in: i128,
        amount_out_min: i128,
        path: Vec<Address>,
        to: Address,
        deadline: u64,
    ) -> Result<Vec<i128>, Error> {
        check_deadline(&env, deadline)?;
        to.require_auth();
        if path.len() != 2 {
            return Err(Error::InvalidPath);
        }
        let token_in = path.get(0).ok_or(Error::InvalidPath)?;
        let token_out = path.get(1).ok_or(Error::InvalidPath)?;
        let flipped = orientation(&env, &token_in, &token_out)?;
        let (reserve_in, reserve_out) = oriented(reserves(&env), flipped);

        let amount_out = get_amount_out(amount_in, reserve_in, reserve_out)
            .ok_or(Error::InsufficientLiquidity)?;
        if amount_out < amount_out_min {
            return Err(Error::InsufficientOutput);
        }

        let pool = env.current_contract_address();
        token::Client::new(&env, &token_in).transfer(&to, &pool, &amount_in);
        token::Client::new(&env, &token_out).transfer(&pool, &to, &amount_out);

        set_reserves(
            &env,
            oriented((reserve_in + amount_in, reserve_out - amount_out), flipped),
        );

        Ok(vec![&env, amount_in, amount_out])
    }

    // ─────────────────────────────────────────────────────────
    // Pool-share ledger
    // ─────────────────────────────────────────────────────────

    pub fn balance(env: Env, owner: Address) -> i128 {
        env.storage()
            .persistent()
            .get(&DataKey::Shares(owner))
            .unwrap_or(0)
    }

    pub fn total_shares(env: Env) -> i128 {
        total_shares(&env)
    }
}

/// `Ok(false)` when `(token_a, token_b)` matches the stored pair order,
/// `Ok(true)` when it is reversed.
fn orientation(env: &Env, token_a: &Address, token_b: &Address) -> Result<bool, Error> {
    let storage = env.storage().instance();
    let stored_a: Address = storage.get(&DataKey::TokenA).ok_or(Error::PairNotFound)?;
    let stored_b: Address = storage.get(&DataKey::TokenB).ok_or(Error::PairNotFound)?;
    if *token_a == stored_a && *token_b == stored_b {
        Ok(false)
    } else if *token_a == stored_b && *token_b == stored_a {
        Ok(true)
    } else {
        Err(Error::PairNotFound)
    }
}

fn oriented(pair: (i128, i128), flipped: bool) -> (i128, i128) {
    if flipped {
        (pair.1, pair.0)
    } else {
        pair
    }
}

fn reserves(env: &Env) -> (i128, i128) {
    let storage = env.storage().instance();
    (
        storage.get(&DataKey::ReserveA).unwrap_or(0),
        storage.get(&DataKey::ReserveB).unwrap_or(0),
    )
}

fn set_reserves(env: &Env, (reserve_a, reserve_b): (i128, i128)) {
    let storage = env.storage().instance();
    storage.set(&DataKey::ReserveA, &reserve_a);
    storage.set(&DataKey::ReserveB, &reserve_b);
}

fn total_shares(env: &Env) -> i128 {
    env.storage()
        .instance()
        .get(&DataKey::TotalShares)
        .unwrap_or(0)
}

fn check_deadline(env: &Env, deadline: u64) -> Result<(), Error> {
    if env.ledger().timestamp() > deadline {
        return Err(Error::Expired);
    }
    Ok(())
}
