//! # Liquidity routing
//!
//! The two places the protocol touches the AMM:
//!
//! - [`route_contribution`]: half of a contribution is swapped into the
//!   asset token and the pair is deposited into the project's pool.
//! - [`release`]: the project's pool shares are withdrawn and everything
//!   attributed to the project is paid to the manufacturer.
//!
//! Neither function writes project state. They return what the caller must
//! commit, so the ledger is only updated after every external call in the
//! invocation has returned.
//!
//! The router pulls tokens from this contract one call deeper than our own
//! invocation, so each pull is pre-authorised with
//! [`amm_interface::authorize_transfers`] for exactly the amount the router
//! will move.
//!
//! Routers are supplied by callers and the contract holds the balances of
//! every project, so a router's reported amounts are never taken on trust.
//! The contract's backing, asset and pool-share balances are read around
//! each router call, and a call whose measured movement differs from what it
//! reports fails with [`Error::AmmMismatch`]. Only measured amounts reach
//! the ledger.

use amm_interface::{authorize_transfers, optimal_deposit, AmmFactoryClient, AmmRouterClient};
use soroban_sdk::{token, vec, Address, Env};

use crate::types::{BackingTerms, Payout, ProjectState};
use crate::Error;

/// Ledger deltas produced by one routed contribution.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Routed {
    /// Pool shares minted to the contract.
    pub shares: i128,
    /// Backing token kept in custody (rounding remainder and unmatched side).
    pub custody_added: i128,
    /// New asset-token residual after the deposit.
    pub asset_residual: i128,
}

/// Contract balances a router call can move.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
struct Holdings {
    backing: i128,
    asset: i128,
    shares: i128,
}

impl Holdings {
    /// Pool shares are read through the pool's SEP-41 `balance`.
    fn read(env: &Env, terms: &BackingTerms) -> Self {
        let this = env.current_contract_address();
        Holdings {
            backing: token::Client::new(env, &terms.backing_token).balance(&this),
            asset: token::Client::new(env, &terms.asset_token).balance(&this),
            shares: token::Client::new(env, &terms.pool).balance(&this),
        }
    }
}

/// `minuend - subtrahend`, failing on overflow.
fn checked_diff(minuend: i128, subtrahend: i128) -> Result<i128, Error> {
    minuend.checked_sub(subtrahend).ok_or(Error::Overflow)
}

/// Swap half of `amount` into the asset token and deposit the pair.
///
/// `amount` must already be held by the contract. When `amount / 2` is zero
/// nothing is routed and the whole contribution stays in custody.
pub fn route_contribution(
    env: &Env,
    router: &Address,
    terms: &BackingTerms,
    amount: i128,
    min_asset_out: i128,
    asset_residual: i128,
) -> Result<Routed, Error> {
    let half = amount / 2;
    if half == 0 {
        return Ok(Routed {
            shares: 0,
            custody_added: amount,
            asset_residual,
        });
    }

    let this = env.current_contract_address();
    let now = env.ledger().timestamp();
    let router = AmmRouterClient::new(env, router);
    let backing = &terms.backing_token;
    let asset = &terms.asset_token;

    let before_swap = Holdings::read(env, terms);
    authorize_transfers(env, &[(backing.clone(), terms.pool.clone(), half)]);
    let amounts = router.swap_exact_tokens_for_tokens(
        &half,
        &min_asset_out,
        &vec![env, backing.clone(), asset.clone()],
        &this,
        &now,
    );
    let reported_out = amounts.last().ok_or(Error::EmptySwapResult)?;
    let after_swap = Holdings::read(env, terms);

    let asset_out = checked_diff(after_swap.asset, before_swap.asset)?;
    if checked_diff(before_swap.backing, after_swap.backing)? != half
        || asset_out != reported_out
        || asset_out < min_asset_out
    {
        return Err(Error::AmmMismatch);
    }
    let available_asset = asset_residual
        .checked_add(asset_out)
        .ok_or(Error::Overflow)?;

    let (reserve_backing, reserve_asset) = router.get_reserves(backing, asset);
    let (deposit_backing, deposit_asset) =
        optimal_deposit(half, available_asset, reserve_backing, reserve_asset)
            .ok_or(Error::NoLiquidityMinted)?;

    authorize_transfers(
        env,
        &[
            (backing.clone(), terms.pool.clone(), deposit_backing),
            (asset.clone(), terms.pool.clone(), deposit_asset),
        ],
    );
    let (reported_backing, reported_asset, reported_shares) = router.add_liquidity(
        backing,
        asset,
        &deposit_backing,
        &deposit_asset,
        &deposit_backing,
        &deposit_asset,
        &this,
        &now,
    );
    let after_deposit = Holdings::read(env, terms);

    let used_backing = checked_diff(after_swap.backing, after_deposit.backing)?;
    let used_asset = checked_diff(after_swap.asset, after_deposit.asset)?;
    let shares = checked_diff(after_deposit.shares, after_swap.shares)?;
    if used_backing != reported_backing
        || used_asset != reported_asset
        || shares != reported_shares
        || used_backing > deposit_backing
        || used_asset > deposit_asset
    {
        return Err(Error::AmmMismatch);
    }
    if shares <= 0 {
        return Err(Error::NoLiquidityMinted);
    }

    let custody_added = amount
        .checked_sub(half)
        .and_then(|kept| kept.checked_sub(used_backing))
        .ok_or(Error::Overflow)?;
    let asset_residual = available_asset
        .checked_sub(used_asset)
        .ok_or(Error::Overflow)?;

    Ok(Routed {
        shares,
        custody_added,
        asset_residual,
    })
}

/// Withdraw the project's pool shares and pay the manufacturer.
///
/// The factory must still resolve the pair to the pool recorded at
/// `start_backing`, and the withdrawal must burn exactly the project's
/// shares. Zero amounts are not transferred.
#[allow(clippy::too_many_arguments)]
pub fn release(
    env: &Env,
    router: &Address,
    factory: &Address,
    terms: &BackingTerms,
    state: &ProjectState,
    manufacturer: &Address,
    min_backing_out: i128,
    min_asset_out: i128,
) -> Result<Payout, Error> {
    let backing = &terms.backing_token;
    let asset = &terms.asset_token;

    let pool = AmmFactoryClient::new(env, factory).get_pair(backing, asset);
    if pool != terms.pool {
        return Err(Error::PoolMismatch);
    }

    let (mut backing_paid, mut asset_paid) = (state.custody_backing, state.asset_residual);

    if state.total_liquidity > 0 {
        let this = env.current_contract_address();
        let before = Holdings::read(env, terms);
        // Routers that keep shares as a token pull them back to the pool.
        authorize_transfers(
            env,
            &[(terms.pool.clone(), terms.pool.clone(), state.total_liquidity)],
        );
        let (reported_backing, reported_asset) = AmmRouterClient::new(env, router)
            .remove_liquidity(
                backing,
                asset,
                &state.total_liquidity,
                &min_backing_out,
                &min_asset_out,
                &this,
                &env.ledger().timestamp(),
            );
        let after = Holdings::read(env, terms);

        let withdrawn_backing = checked_diff(after.backing, before.backing)?;
        let withdrawn_asset = checked_diff(after.asset, before.asset)?;
        if withdrawn_backing != reported_backing
            || withdrawn_asset != reported_asset
            || checked_diff(before.shares, after.shares)? != state.total_liquidity
        {
            return Err(Error::AmmMismatch);
        }
        backing_paid = backing_paid
            .checked_add(withdrawn_backing)
            .ok_or(Error::Overflow)?;
        asset_paid = asset_paid
            .checked_add(withdrawn_asset)
            .ok_or(Error::Overflow)?;
    }

    pay(env, backing, manufacturer, backing_paid);
    pay(env, asset, manufacturer, asset_paid);

    Ok(Payout {
        backing_paid,
        asset_paid,
    })
}

fn pay(env: &Env, token: &Address, to: &Address, amount: i128) {
    if amount > 0 {
        token::Client::new(env, token).transfer(&env.current_contract_address(), to, &amount);
    }
}
