//! # Liquidity Seeder
//!
//! A single-use helper bound to one crowdfund project. Before backing
//! closes, the project's proposer uses it to make the initial deposit into
//! the AMM pool, so the pool has a price by the time backers arrive.
//!
//! Tokens are pulled from the proposer's prior allowances (the seeder is the
//! spender). Pool shares are minted to the seeder itself, never to the
//! project. Tokens the pool ratio does not take are returned to the
//! proposer.

#![no_std]

use amm_interface::{authorize_transfers, optimal_deposit, AmmRouterClient};
use soroban_sdk::{
    contract, contractclient, contracterror, contractimpl, contracttype, symbol_short, token,
    Address, Env,
};


#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    AlreadySeeded     = 1,
    BackingClosed     = 2,
    InvalidAmount     = 3,
    SlippageExceeded  = 4,
    NoLiquidityMinted = 5,
    NotInitialized    = 6,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
enum DataKey {
    Proposer,
    Project,
    ProjectId,
    Shares,
    Seeded,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LiquiditySeeded {
    pub project_id: u64,
    pub token_a: Address,
    pub token_b: Address,
    pub amount_a: i128,
    pub amount_b: i128,
    pub shares: i128,
}

/// The slice of the crowdfund contract the seeder reads.
#[allow(dead_code)]
#[contractclient(name = "ProjectViewClient")]
pub trait ProjectView {
    fn backing_close_time(env: Env, project_id: u64) -> u64;
}

#[contract]
pub struct LiquiditySeeder;

#[contractimpl]
impl LiquiditySeeder {
    pub fn __constructor(env: Env, proposer: Address, project: Address, project_id: u64) {
        let storage = env.storage().instance();
        storage.set(&DataKey::Proposer, &proposer);
        storage.set(&DataKey::Project, &project);
        storage.set(&DataKey::ProjectId, &project_id);
        storage.set(&DataKey::Shares, &0i128);
        storage.set(&DataKey::Seeded, &false);
    }

    /// Deposit up to `amount_a`/`amount_b` into the `token_a`/`token_b` pool.
    ///
    /// Only the proposer may call, once, and only while the bound project's
    /// backing window has not closed. Returns the shares minted.
    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        env: Env,
        token_a: Address,
        token_b: Address,
        router: Address,
        amount_a: i128,
        amount_b: i128,
        min_a: i128,
        min_b: i128,
    ) -> Result<i128, Error> {
        let proposer: Address = read(&env, &DataKey::Proposer)?;
        proposer.require_auth();

        if read::<bool>(&env, &DataKey::Seeded)? {
            return Err(Error::AlreadySeeded);
        }
        let project: Address = read(&env, &DataKey::Project)?;
        let project_id: u64 = read(&env, &DataKey::ProjectId)?;
        let close_time = ProjectViewClient::new(&env, &project).backing_close_time(&project_id);
        let now = env.ledger().timestamp();
        if close_time != 0 && now >= close_time {
            return Err(Error::BackingClosed);
        }
        if amount_a <= 0 || amount_b <= 0 {
            return Err(Error::InvalidAmount);
        }

        let this = env.current_contract_address();
        let client_a = token::Client::new(&env, &token_a);
        let client_b = token::Client::new(&env, &token_b);
        client_a.transfer_from(&this, &proposer, &this, &amount_a);
        client_b.transfer_from(&this, &proposer, &this, &amount_b);

        let router = AmmRouterClient::new(&env, &router);
        let (reserve_a, reserve_b) = router.get_reserves(&token_a, &token_b);
        let (deposit_a, deposit_b) = optimal_deposit(amount_a, amount_b, reserve_a, reserve_b)
            .ok_or(Error::NoLiquidityMinted)?;
        if deposit_a < min_a || deposit_b < min_b {
            return Err(Error::SlippageExceeded);
        }

        let pool = router.router_pair_for(&token_a, &token_b);
        authorize_transfers(
            &env,
            &[
                (token_a.clone(), pool.clone(), deposit_a),
                (token_b.clone(), pool, deposit_b),
            ],
        );
        let (used_a, used_b, shares) = router.add_liquidity(
            &token_a, &token_b, &deposit_a, &deposit_b, &deposit_a, &deposit_b, &this, &now,
        );
        if shares <= 0 {
            return Err(Error::NoLiquidityMinted);
        }

        if amount_a > used_a {
            client_a.transfer(&this, &proposer, &(amount_a - used_a));
        }
        if amount_b > used_b {
            client_b.transfer(&this, &proposer, &(amount_b - used_b));
        }

        let storage = env.storage().instance();
        storage.set(&DataKey::Shares, &shares);
        storage.set(&DataKey::Seeded, &true);

        env.events().publish(
            (symbol_short!("seeded"), project_id),
            LiquiditySeeded {
                project_id,
                token_a,
                token_b,
                amount_a: used_a,
                amount_b: used_b,
                shares,
            },
        );
        Ok(shares)
    }

    pub fn proposer(env: Env) -> Result<Address, Error> {
        read(&env, &DataKey::Proposer)
    }

    pub fn project(env: Env) -> Result<Address, Error> {
        read(&env, &DataKey::Project)
    }

    pub fn project_id(env: Env) -> Result<u64, Error> {
        read(&env, &DataKey::ProjectId)
    }

    /// Pool shares minted by the seed deposit (0 before seeding).
    pub fn shares(env: Env) -> Result<i128, Error> {
        read(&env, &DataKey::Shares)
    }

    pub fn is_seeded(env: Env) -> Result<bool, Error> {
        read(&env, &DataKey::Seeded)
    }
}

fn read<V>(env: &Env, key: &DataKey) -> Result<V, Error>
where
    V: soroban_sdk::TryFromVal<Env, soroban_sdk::Val>,
{
    env.storage()
        .instance()
        .get(key)
        .ok_or(Error::NotInitialized)
}
