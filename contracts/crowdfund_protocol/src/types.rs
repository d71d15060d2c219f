//! # Types
//!
//! Shared data structures used across all modules of the crowdfund protocol.
//!
//! ## Design decisions
//!
//! ### Config / Terms / State split
//!
//! A project is stored as three ledger entries:
//!
//! - [`ProjectConfig`]: written once by `create_project`; never mutated.
//! - [`BackingTerms`]: written once by `start_backing`; never mutated.
//! - [`ProjectState`]: the mutable aggregate: phase close times, the backing
//!   and approval tallies, and the project's attributed custody.
//!
//! Per-backer contributions and votes live in their own keyed entries (see
//! `storage.rs`) so a backing writes only two small entries.
//!
//! ### Phase is derived
//!
//! [`Phase`] is never stored. It is computed from the two close times, the
//! ledger clock and the `processed` flag:
//!
//! ```text
//! Created ──► Backing ──► BackingClosed ──► Approval ──► ApprovalClosed ──► Processed
//! ```
//!
//! Close times are written once and never reset, so the phase only moves
//! forward.

use soroban_sdk::{contracttype, Address, String};

/// Lifecycle phase of a project, derived from its state and the ledger clock.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Phase {
    /// Created; backing not started.
    Created,
    /// Accepting contributions.
    Backing,
    /// Backing window elapsed; approval not started.
    BackingClosed,
    /// Accepting approval votes.
    Approval,
    /// Approval window elapsed; awaiting finalisation.
    ApprovalClosed,
    /// Finalisation has run (released or left unfinalised).
    Processed,
}

/// Immutable project configuration, written once at creation.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectConfig {
    pub id: u64,
    pub proposer: Address,
    pub description: String,
    pub manufacturer: Address,
}

/// AMM pair identity and contribution threshold, fixed by `start_backing`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BackingTerms {
    pub pool: Address,
    pub backing_token: Address,
    pub asset_token: Address,
    pub minimum_backing: i128,
}

/// Mutable project state.
///
/// `custody_backing` and `asset_residual` are the parts of the contract's
/// token balances attributed to this project that are not inside the pool:
/// rounding remainders and the unmatched side of each deposit.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectState {
    pub backing_close_time: u64,
    pub approval_close_time: u64,
    pub total_backing: i128,
    pub backers_count: u32,
    pub total_approval: i128,
    pub total_liquidity: i128,
    pub custody_backing: i128,
    pub asset_residual: i128,
    pub project_not_finalised: bool,
    pub processed: bool,
}

impl Default for ProjectState {
    fn default() -> Self {
        ProjectState {
            backing_close_time: 0,
            approval_close_time: 0,
            total_backing: 0,
            backers_count: 0,
            total_approval: 0,
            total_liquidity: 0,
            custody_backing: 0,
            asset_residual: 0,
            project_not_finalised: true,
            processed: false,
        }
    }
}

/// Full representation of a project.
///
/// Used as the public API return type; reconstructed from the config and
/// state entries. Backing terms have their own view.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Project {
    /// Sequential identifier assigned by `create_project`.
    pub id: u64,
    /// Sole authority for phase transitions.
    pub proposer: Address,
    pub description: String,
    /// Payout destination when the project is approved.
    pub manufacturer: Address,
    /// 0 until backing starts.
    pub backing_close_time: u64,
    /// 0 until approval starts.
    pub approval_close_time: u64,
    pub total_backing: i128,
    pub backers_count: u32,
    /// Sum of the contributions of approving backers.
    pub total_approval: i128,
    /// Pool shares held for this project.
    pub total_liquidity: i128,
    pub custody_backing: i128,
    pub asset_residual: i128,
    pub project_not_finalised: bool,
    pub processed: bool,
}

/// Amounts paid to the manufacturer by a releasing finalisation.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Payout {
    pub backing_paid: i128,
    pub asset_paid: i128,
}
