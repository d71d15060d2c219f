//! # Storage
//!
//! Provides typed helpers over Soroban's two storage tiers used by the
//! crowdfund protocol:
//!
//! ## Instance storage (contract-lifetime TTL)
//!
//! | Key            | Type  | Description                       |
//! |----------------|-------|-----------------------------------|
//! | `ProjectCount` | `u64` | Auto-increment project ID counter |
//!
//! Instance TTL is bumped by **7 days** whenever it falls below 1 day remaining.
//!
//! ## Persistent storage (per-entry TTL)
//!
//! | Key                    | Type            | Description                         |
//! |------------------------|-----------------|-------------------------------------|
//! | `ProjConfig(id)`       | `ProjectConfig` | Immutable project configuration     |
//! | `ProjTerms(id)`        | `BackingTerms`  | Pair identity and minimum backing   |
//! | `ProjState(id)`        | `ProjectState`  | Mutable phase and tally state       |
//! | `ProjSeeder(id)`       | `Address`       | Registered liquidity seeder         |
//! | `Backing(id, backer)`  | `i128`          | Cumulative contribution of a backer |
//! | `Approval(id, backer)` | `bool`          | Vote cast by a backer               |
//!
//! Persistent TTL is bumped by **30 days** whenever it falls below 7 days remaining.
//!
//! A missing `Backing` entry reads as zero and a missing `Approval` entry as
//! `false`; neither is ever deleted.

use soroban_sdk::{contracttype, Address, Env};

use crate::types::{BackingTerms, Project, ProjectConfig, ProjectState};
use crate::Error;

// ── TTL Constants ────────────────────────────────────────────────────

/// Approximate ledgers per day (~5 seconds per ledger).
const DAY_IN_LEDGERS: u32 = 17_280;

/// Instance storage: bump by 7 days when below 1 day remaining.
const INSTANCE_BUMP_AMOUNT: u32 = 7 * DAY_IN_LEDGERS;
const INSTANCE_LIFETIME_THRESHOLD: u32 = DAY_IN_LEDGERS;

/// Persistent storage: bump by 30 days when below 7 days remaining.
const PERSISTENT_BUMP_AMOUNT: u32 = 30 * DAY_IN_LEDGERS;
const PERSISTENT_LIFETIME_THRESHOLD: u32 = 7 * DAY_IN_LEDGERS;

// ── Storage Keys ─────────────────────────────────────────────────────

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DataKey {
    /// Global auto-increment counter for project IDs (Instance).
    ProjectCount,
    /// Immutable project configuration keyed by ID (Persistent).
    ProjConfig(u64),
    /// Backing terms keyed by ID, present once backing started (Persistent).
    ProjTerms(u64),
    /// Mutable project state keyed by ID (Persistent).
    ProjState(u64),
    /// Liquidity seeder bound to the project, set at most once (Persistent).
    ProjSeeder(u64),
    /// Cumulative contribution per (project, backer) (Persistent).
    Backing(u64, Address),
    /// Approval vote per (project, backer) (Persistent).
    Approval(u64, Address),
}

// ── Instance Storage Helpers ─────────────────────────────────────────

fn bump_instance(env: &Env) {
    env.storage()
        .instance()
        .extend_ttl(INSTANCE_LIFETIME_THRESHOLD, INSTANCE_BUMP_AMOUNT);
}

/// Reads, increments, and stores the project counter.
/// Returns the ID to use for the *current* project (pre-increment value).
pub fn get_and_increment_project_id(env: &Env) -> Result<u64, Error> {
    bump_instance(env);
    let current = project_count(env);
    let next = current.checked_add(1).ok_or(Error::Overflow)?;
    env.storage().instance().set(&DataKey::ProjectCount, &next);
    Ok(current)
}

/// Number of projects created so far.
pub fn project_count(env: &Env) -> u64 {
    env.storage()
        .instance()
        .get(&DataKey::ProjectCount)
        .unwrap_or(0)
}

// ── Persistent Storage Helpers ───────────────────────────────────────

fn bump_persistent(env: &Env, key: &DataKey) {
    env.storage()
        .persistent()
        .extend_ttl(key, PERSISTENT_LIFETIME_THRESHOLD, PERSISTENT_BUMP_AMOUNT);
}

fn write<V>(env: &Env, key: &DataKey, value: &V)
where
    V: soroban_sdk::IntoVal<Env, soroban_sdk::Val>,
{
    env.storage().persistent().set(key, value);
    bump_persistent(env, key);
}

/// Save the immutable config and a fresh state for a new project.
pub fn save_new_project(env: &Env, config: &ProjectConfig) {
    write(env, &DataKey::ProjConfig(config.id), config);
    write(env, &DataKey::ProjState(config.id), &ProjectState::default());
}

/// Load only the immutable project configuration.
pub fn load_project_config(env: &Env, id: u64) -> Result<ProjectConfig, Error> {
    let key = DataKey::ProjConfig(id);
    let config: ProjectConfig = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::ProjectNotFound)?;
    bump_persistent(env, &key);
    Ok(config)
}

/// Load only the mutable project state.
pub fn load_project_state(env: &Env, id: u64) -> Result<ProjectState, Error> {
    let key = DataKey::ProjState(id);
    let state: ProjectState = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::ProjectNotFound)?;
    bump_persistent(env, &key);
    Ok(state)
}

/// Save only the mutable project state.
pub fn save_project_state(env: &Env, id: u64, state: &ProjectState) {
    write(env, &DataKey::ProjState(id), state);
}

/// Load the backing terms of a project whose backing has started.
pub fn load_backing_terms(env: &Env, id: u64) -> Result<BackingTerms, Error> {
    let key = DataKey::ProjTerms(id);
    let terms: BackingTerms = env
        .storage()
        .persistent()
        .get(&key)
        .ok_or(Error::BackingNotOpen)?;
    bump_persistent(env, &key);
    Ok(terms)
}

pub fn save_backing_terms(env: &Env, id: u64, terms: &BackingTerms) {
    write(env, &DataKey::ProjTerms(id), terms);
}

/// Load the full `Project` by combining config and state.
pub fn load_project(env: &Env, id: u64) -> Result<Project, Error> {
    let config = load_project_config(env, id)?;
    let state = load_project_state(env, id)?;
    Ok(Project {
        id: config.id,
        proposer: config.proposer,
        description: config.description,
        manufacturer: config.manufacturer,
        backing_close_time: state.backing_close_time,
        approval_close_time: state.approval_close_time,
        total_backing: state.total_backing,
        backers_count: state.backers_count,
        total_approval: state.total_approval,
        total_liquidity: state.total_liquidity,
        custody_backing: state.custody_backing,
        asset_residual: state.asset_residual,
        project_not_finalised: state.project_not_finalised,
        processed: state.processed,
    })
}

pub fn get_seeder(env: &Env, id: u64) -> Option<Address> {
    let key = DataKey::ProjSeeder(id);
    let seeder: Option<Address> = env.storage().persistent().get(&key);
    if seeder.is_some() {
        bump_persistent(env, &key);
    }
    seeder
}

pub fn set_seeder(env: &Env, id: u64, seeder: &Address) {
    write(env, &DataKey::ProjSeeder(id), seeder);
}

// ── Backer Ledger ────────────────────────────────────────────────────

/// Cumulative contribution of `backer` to project `id` (zero if none).
pub fn get_backing(env: &Env, id: u64, backer: &Address) -> i128 {
    let key = DataKey::Backing(id, backer.clone());
    match env.storage().persistent().get::<DataKey, i128>(&key) {
        Some(amount) => {
            bump_persistent(env, &key);
            amount
        }
        None => 0,
    }
}

pub fn set_backing(env: &Env, id: u64, backer: &Address, amount: i128) {
    write(env, &DataKey::Backing(id, backer.clone()), &amount);
}

pub fn has_approved(env: &Env, id: u64, backer: &Address) -> bool {
    env.storage()
        .persistent()
        .get(&DataKey::Approval(id, backer.clone()))
        .unwrap_or(false)
}

pub fn set_approved(env: &Env, id: u64, backer: &Address) {
    write(env, &DataKey::Approval(id, backer.clone()), &true);
}
