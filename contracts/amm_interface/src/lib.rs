//! # AMM Interface
//!
//! The crowdfund contracts treat the automated market maker as an opaque
//! service. This crate holds everything they need to talk to it:
//!
//! | Item                   | Purpose                                              |
//! |------------------------|------------------------------------------------------|
//! | [`AmmRouterClient`]    | swap / add liquidity / remove liquidity / reserves   |
//! | [`AmmFactoryClient`]   | pool lookup for a token pair                         |
//! | [`math`]               | constant-product quote helpers used to size deposits |
//! | [`authorize_transfers`]| pre-authorises the token pulls a router performs     |
//!
//! The router signatures follow the Soroswap router so any router exposing
//! that surface can be substituted per call.

#![no_std]

use soroban_sdk::{contractclient, Address, Env, Vec};

mod auth;
pub mod math;

pub use auth::authorize_transfers;
pub use math::{get_amount_out, optimal_deposit, quote};

/// Router surface consumed by the crowdfund contracts.
#[allow(dead_code)]
#[contractclient(name = "AmmRouterClient")]
pub trait AmmRouter {
    /// Swap exactly `amount_in` of `path[0]` for at least `amount_out_min`
    /// of the last token in `path`. Tokens are pulled from `to`.
    fn swap_exact_tokens_for_tokens(
        env: Env,
        amount_in: i128,
        amount_out_min: i128,
        path: Vec<Address>,
        to: Address,
        deadline: u64,
    ) -> Vec<i128>;

    /// Deposit both tokens and mint pool shares to `to`.
    ///
    /// Returns `(amount_a, amount_b, shares)`.
    fn add_liquidity(
        env: Env,
        token_a: Address,
        token_b: Address,
        amount_a_desired: i128,
        amount_b_desired: i128,
        amount_a_min: i128,
        amount_b_min: i128,
        to: Address,
        deadline: u64,
    ) -> (i128, i128, i128);

    /// Burn `liquidity` pool shares held by `to` and return the underlying
    /// tokens to `to`.
    ///
    /// Returns `(amount_a, amount_b)`.
    fn remove_liquidity(
        env: Env,
        token_a: Address,
        token_b: Address,
        liquidity: i128,
        amount_a_min: i128,
        amount_b_min: i128,
        to: Address,
        deadline: u64,
    ) -> (i128, i128);

    /// Current reserves, ordered as `(token_a, token_b)`.
    fn get_reserves(env: Env, token_a: Address, token_b: Address) -> (i128, i128);

    /// Pool address the router settles `token_a`/`token_b` against.
    fn router_pair_for(env: Env, token_a: Address, token_b: Address) -> Address;
}

/// Pair registry surface.
#[allow(dead_code)]
#[contractclient(name = "AmmFactoryClient")]
pub trait AmmFactory {
    fn get_pair(env: Env, token_a: Address, token_b: Address) -> Address;
}
