//! # Crowdfund Protocol Contract
//!
//! A single Soroban contract, `CrowdfundProtocol`, that acts as the project
//! factory and hosts every project's lifecycle:
//!
//! | Phase        | Entry Point(s)                                     |
//! |--------------|----------------------------------------------------|
//! | Creation     | `create_project`, `register_seeder`                |
//! | Backing      | `start_backing`, `back_project`                    |
//! | Approval     | `start_approval`, `approve_project`                |
//! | Finalisation | [`CrowdfundProtocol::finalise_project`]            |
//! | Queries      | `get_project`, `get_projects`, `get_phase`, ...    |
//!
//! ## Architecture
//!
//! Storage access is delegated to [`storage`], AMM interaction to
//! [`routing`] and phase derivation to [`phase`]. This file holds the entry
//! points, guards and event emissions.
//!
//! Every entry point returns `Result`. An `Err`, or a panic inside a token or
//! AMM call, rolls back the whole invocation, so ledger fields are written
//! only after every external call of the invocation has returned.

#![no_std]

use soroban_sdk::{
    contract, contractclient, contracterror, contractimpl, token, Address, Env, String, Vec,
};

pub mod events;
mod phase;
mod routing;
mod storage;
mod types;

#[cfg(test)]
mod invariants;
#[cfg(test)]
mod test_backer_count;
#[cfg(test)]
mod test_events;
#[cfg(test)]
mod test_routing;

pub use types::{BackingTerms, Phase, Project, ProjectConfig};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    ProjectNotFound         = 1,
    NotProposer             = 2,
    NotBacker               = 3,
    BackingAlreadyStarted   = 4,
    BackingNotOpen          = 5,
    BackingNotClosed        = 6,
    ApprovalAlreadyStarted  = 7,
    ApprovalNotOpen         = 8,
    AlreadyApproved         = 9,
    ApprovalNotStarted      = 10,
    ApprovalNotClosed       = 11,
    AlreadyProcessed        = 12,
    BelowMinimumBacking     = 13,
    InvalidAmount           = 14,
    InvalidDuration         = 15,
    InvalidPair             = 16,
    PoolMismatch            = 17,
    EmptySwapResult         = 18,
    NoLiquidityMinted       = 19,
    Overflow                = 20,
    AmmMismatch             = 21,
    SeederAlreadyRegistered = 22,
    SeederMismatch          = 23,
}

/// Failure classes callers can branch on without matching every code.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// Wrong caller for a proposer-only action, or a non-backer voting.
    Authorization,
    /// A phase guard was violated.
    State,
    /// Contribution below the project's minimum.
    InsufficientAmount,
    /// The AMM did not settle the way the project expects.
    Transfer,
    /// Malformed arguments.
    InvalidInput,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NotProposer | Error::NotBacker => ErrorKind::Authorization,
            Error::ProjectNotFound
            | Error::BackingAlreadyStarted
            | Error::BackingNotOpen
            | Error::BackingNotClosed
            | Error::ApprovalAlreadyStarted
            | Error::ApprovalNotOpen
            | Error::AlreadyApproved
            | Error::ApprovalNotStarted
            | Error::ApprovalNotClosed
            | Error::AlreadyProcessed
            | Error::SeederAlreadyRegistered => ErrorKind::State,
            Error::BelowMinimumBacking => ErrorKind::InsufficientAmount,
            Error::PoolMismatch
            | Error::EmptySwapResult
            | Error::NoLiquidityMinted
            | Error::AmmMismatch => ErrorKind::Transfer,
            Error::InvalidAmount
            | Error::InvalidDuration
            | Error::InvalidPair
            | Error::Overflow
            | Error::SeederMismatch => ErrorKind::InvalidInput,
        }
    }
}

/// Binding a liquidity seeder reports about itself.
#[allow(dead_code)]
#[contractclient(name = "SeederBindingClient")]
pub trait SeederBinding {
    fn proposer(env: Env) -> Address;
    fn project(env: Env) -> Address;
    fn project_id(env: Env) -> u64;
}

#[contract]
pub struct CrowdfundProtocol;

#[contractimpl]
impl CrowdfundProtocol {
    // ─────────────────────────────────────────────────────────
    // Factory
    // ─────────────────────────────────────────────────────────

    /// Register a new project and return its id.
    ///
    /// - `proposer` must authorise and becomes the only address able to
    ///   drive the project's phase transitions.
    /// - `manufacturer` receives the funds if backers approve.
    pub fn create_project(
        env: Env,
        proposer: Address,
        description: String,
        manufacturer: Address,
    ) -> Result<u64, Error> {
        proposer.require_auth();

        let id = storage::get_and_increment_project_id(&env)?;
        let config = ProjectConfig {
            id,
            proposer: proposer.clone(),
            description,
            manufacturer: manufacturer.clone(),
        };
        storage::save_new_project(&env, &config);

        events::emit_project_created(&env, id, proposer, manufacturer);
        Ok(id)
    }

    /// Every project id, in creation order.
    pub fn get_projects(env: Env) -> Vec<u64> {
        let mut ids = Vec::new(&env);
        for id in 0..storage::project_count(&env) {
            ids.push_back(id);
        }
        ids
    }

    /// The id of the `index`-th project created.
    pub fn created_projects(env: Env, index: u32) -> Result<u64, Error> {
        let index = u64::from(index);
        if index >= storage::project_count(&env) {
            return Err(Error::ProjectNotFound);
        }
        Ok(index)
    }

    pub fn project_count(env: Env) -> u64 {
        storage::project_count(&env)
    }

    /// Bind the project's liquidity seeder. Once per project, before backing
    /// starts.
    ///
    /// The seeder must have been constructed for this contract, this project
    /// id and this proposer.
    pub fn register_seeder(
        env: Env,
        project_id: u64,
        proposer: Address,
        seeder: Address,
    ) -> Result<(), Error> {
        require_proposer(&env, project_id, &proposer)?;
        let state = storage::load_project_state(&env, project_id)?;
        if state.backing_close_time != 0 {
            return Err(Error::BackingAlreadyStarted);
        }
        if storage::get_seeder(&env, project_id).is_some() {
            return Err(Error::SeederAlreadyRegistered);
        }

        let binding = SeederBindingClient::new(&env, &seeder);
        if binding.project() != env.current_contract_address()
            || binding.project_id() != project_id
            || binding.proposer() != proposer
        {
            return Err(Error::SeederMismatch);
        }

        storage::set_seeder(&env, project_id, &seeder);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Backing
    // ─────────────────────────────────────────────────────────

    /// Open the backing window for `duration` seconds and fix the AMM pair.
    ///
    /// Can run once per project. No tokens move.
    #[allow(clippy::too_many_arguments)]
    pub fn start_backing(
        env: Env,
        project_id: u64,
        proposer: Address,
        duration: u64,
        minimum_backing: i128,
        pool: Address,
        backing_token: Address,
        asset_token: Address,
    ) -> Result<(), Error> {
        require_proposer(&env, project_id, &proposer)?;
        let mut state = storage::load_project_state(&env, project_id)?;
        if state.backing_close_time != 0 {
            return Err(Error::BackingAlreadyStarted);
        }

        let close_time = phase::close_time(env.ledger().timestamp(), duration)?;
        if minimum_backing < 0 {
            return Err(Error::InvalidAmount);
        }
        if backing_token == asset_token {
            return Err(Error::InvalidPair);
        }

        storage::save_backing_terms(
            &env,
            project_id,
            &BackingTerms {
                pool,
                backing_token,
                asset_token,
                minimum_backing,
            },
        );
        state.backing_close_time = close_time;
        storage::save_project_state(&env, project_id, &state);

        events::emit_backing_started(&env, project_id, close_time, duration);
        Ok(())
    }

    /// Contribute `amount` of the backing token.
    ///
    /// The backer must have approved this contract for at least `amount`.
    /// Half of the contribution is swapped through `router` (receiving at
    /// least `min_asset_out`) and the pair is deposited into the pool.
    pub fn back_project(
        env: Env,
        project_id: u64,
        backer: Address,
        amount: i128,
        min_asset_out: i128,
        router: Address,
    ) -> Result<(), Error> {
        backer.require_auth();

        let mut state = storage::load_project_state(&env, project_id)?;
        if !state.backing_open(env.ledger().timestamp()) {
            return Err(Error::BackingNotOpen);
        }
        let terms = storage::load_backing_terms(&env, project_id)?;
        if amount < terms.minimum_backing {
            return Err(Error::BelowMinimumBacking);
        }
        if amount <= 0 {
            return Err(Error::InvalidAmount);
        }

        let this = env.current_contract_address();
        token::Client::new(&env, &terms.backing_token).transfer_from(
            &this, &backer, &this, &amount,
        );
        let routed = routing::route_contribution(
            &env,
            &router,
            &terms,
            amount,
            min_asset_out,
            state.asset_residual,
        )?;

        // External calls are done; commit the ledger.
        let previous = storage::get_backing(&env, project_id, &backer);
        if previous == 0 {
            state.backers_count = state.backers_count.checked_add(1).ok_or(Error::Overflow)?;
        }
        let backing = previous.checked_add(amount).ok_or(Error::Overflow)?;
        state.total_backing = state.total_backing.checked_add(amount).ok_or(Error::Overflow)?;
        state.total_liquidity = state
            .total_liquidity
            .checked_add(routed.shares)
            .ok_or(Error::Overflow)?;
        state.custody_backing = state
            .custody_backing
            .checked_add(routed.custody_added)
            .ok_or(Error::Overflow)?;
        state.asset_residual = routed.asset_residual;

        storage::set_backing(&env, project_id, &backer, backing);
        storage::save_project_state(&env, project_id, &state);

        events::emit_backing_created(&env, project_id, backer, amount);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Approval
    // ─────────────────────────────────────────────────────────

    /// Open the approval window. Requires the backing window to have closed.
    pub fn start_approval(
        env: Env,
        project_id: u64,
        proposer: Address,
        duration: u64,
    ) -> Result<(), Error> {
        require_proposer(&env, project_id, &proposer)?;
        let mut state = storage::load_project_state(&env, project_id)?;
        let now = env.ledger().timestamp();
        if !state.backing_closed(now) {
            return Err(Error::BackingNotClosed);
        }
        if state.approval_close_time != 0 {
            return Err(Error::ApprovalAlreadyStarted);
        }

        let close_time = phase::close_time(now, duration)?;
        state.approval_close_time = close_time;
        storage::save_project_state(&env, project_id, &state);

        events::emit_approval_started(&env, project_id, close_time, duration);
        Ok(())
    }

    /// Vote to release the funds. The vote weighs the backer's contribution.
    pub fn approve_project(env: Env, project_id: u64, backer: Address) -> Result<(), Error> {
        backer.require_auth();

        let mut state = storage::load_project_state(&env, project_id)?;
        if !state.approval_open(env.ledger().timestamp()) {
            return Err(Error::ApprovalNotOpen);
        }
        let weight = storage::get_backing(&env, project_id, &backer);
        if weight <= 0 {
            return Err(Error::NotBacker);
        }
        if storage::has_approved(&env, project_id, &backer) {
            return Err(Error::AlreadyApproved);
        }

        state.total_approval = state.total_approval.checked_add(weight).ok_or(Error::Overflow)?;
        storage::set_approved(&env, project_id, &backer);
        storage::save_project_state(&env, project_id, &state);

        events::emit_approval_created(&env, project_id, backer);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Finalisation
    // ─────────────────────────────────────────────────────────

    /// Settle the project once the approval window has closed.
    ///
    /// With any approval weight at all, the project's pool shares are
    /// withdrawn through `router` and everything attributed to the project
    /// is paid to the manufacturer. Without approvals nothing moves and the
    /// project stays not finalised. Either way the project is processed and
    /// cannot be finalised again.
    #[allow(clippy::too_many_arguments)]
    pub fn finalise_project(
        env: Env,
        project_id: u64,
        proposer: Address,
        router: Address,
        factory: Address,
        min_backing_out: i128,
        min_asset_out: i128,
    ) -> Result<(), Error> {
        let config = require_proposer(&env, project_id, &proposer)?;
        let mut state = storage::load_project_state(&env, project_id)?;
        if state.approval_close_time == 0 {
            return Err(Error::ApprovalNotStarted);
        }
        if !state.approval_closed(env.ledger().timestamp()) {
            return Err(Error::ApprovalNotClosed);
        }
        if state.processed {
            return Err(Error::AlreadyProcessed);
        }

        let released = state.total_approval > 0;
        let mut payout = types::Payout::default();
        if released {
            let terms = storage::load_backing_terms(&env, project_id)?;
            payout = routing::release(
                &env,
                &router,
                &factory,
                &terms,
                &state,
                &config.manufacturer,
                min_backing_out,
                min_asset_out,
            )?;
            state.total_liquidity = 0;
            state.custody_backing = 0;
            state.asset_residual = 0;
            state.project_not_finalised = false;
        }
        // TODO: add a backer-initiated `claim_refund` for processed projects
        // that stayed not finalised; their custody is left untouched here.
        state.processed = true;
        storage::save_project_state(&env, project_id, &state);

        events::emit_project_finalised(&env, project_id, released, payout);
        Ok(())
    }

    // ─────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────

    pub fn get_project(env: Env, project_id: u64) -> Result<Project, Error> {
        storage::load_project(&env, project_id)
    }

    /// Pair identity and minimum; `BackingNotOpen` before `start_backing`.
    pub fn get_backing_terms(env: Env, project_id: u64) -> Result<BackingTerms, Error> {
        storage::load_project_config(&env, project_id)?;
        storage::load_backing_terms(&env, project_id)
    }

    /// The registered liquidity seeder, if any.
    pub fn seeder_of(env: Env, project_id: u64) -> Option<Address> {
        storage::get_seeder(&env, project_id)
    }

    pub fn backing_of(env: Env, project_id: u64, backer: Address) -> i128 {
        storage::get_backing(&env, project_id, &backer)
    }

    pub fn has_approved(env: Env, project_id: u64, backer: Address) -> bool {
        storage::has_approved(&env, project_id, &backer)
    }

    pub fn get_phase(env: Env, project_id: u64) -> Result<Phase, Error> {
        let state = storage::load_project_state(&env, project_id)?;
        Ok(state.phase(env.ledger().timestamp()))
    }

    pub fn backing_close_time(env: Env, project_id: u64) -> Result<u64, Error> {
        Ok(storage::load_project_state(&env, project_id)?.backing_close_time)
    }

    pub fn approval_close_time(env: Env, project_id: u64) -> Result<u64, Error> {
        Ok(storage::load_project_state(&env, project_id)?.approval_close_time)
    }
}

/// Authenticate `proposer` and check it owns `project_id`.
fn require_proposer(env: &Env, project_id: u64, proposer: &Address) -> Result<ProjectConfig, Error> {
    proposer.require_auth();
    let config = storage::load_project_config(env, project_id)?;
    if config.proposer != *proposer {
        return Err(Error::NotProposer);
    }
    Ok(config)
}
