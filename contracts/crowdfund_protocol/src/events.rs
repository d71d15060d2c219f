//! Event payloads and emitters.
//!
//! Every event is published under the topic `(symbol, project_id)` so an
//! indexer can filter a single project's history by its second topic.

use soroban_sdk::{contracttype, symbol_short, Address, Env};

use crate::types::Payout;

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectCreated {
    pub project_id: u64,
    pub proposer: Address,
    pub manufacturer: Address,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BackingStarted {
    pub project_id: u64,
    pub close_time: u64,
    pub duration: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BackingCreated {
    pub project_id: u64,
    pub backer: Address,
    pub amount: i128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApprovalStarted {
    pub project_id: u64,
    pub close_time: u64,
    pub duration: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ApprovalCreated {
    pub project_id: u64,
    pub backer: Address,
}

/// `released` is `false` when no backer approved and custody was kept.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ProjectFinalised {
    pub project_id: u64,
    pub released: bool,
    pub backing_paid: i128,
    pub asset_paid: i128,
}

pub fn emit_project_created(env: &Env, project_id: u64, proposer: Address, manufacturer: Address) {
    env.events().publish(
        (symbol_short!("created"), project_id),
        ProjectCreated {
            project_id,
            proposer,
            manufacturer,
        },
    );
}

pub fn emit_backing_started(env: &Env, project_id: u64, close_time: u64, duration: u64) {
    env.events().publish(
        (symbol_short!("bk_start"), project_id),
        BackingStarted {
            project_id,
            close_time,
            duration,
        },
    );
}

pub fn emit_backing_created(env: &Env, project_id: u64, backer: Address, amount: i128) {
    env.events().publish(
        (symbol_short!("backed"), project_id),
        BackingCreated {
            project_id,
            backer,
            amount,
        },
    );
}

pub fn emit_approval_started(env: &Env, project_id: u64, close_time: u64, duration: u64) {
    env.events().publish(
        (symbol_short!("ap_start"), project_id),
        ApprovalStarted {
            project_id,
            close_time,
            duration,
        },
    );
}

pub fn emit_approval_created(env: &Env, project_id: u64, backer: Address) {
    env.events().publish(
        (symbol_short!("approved"), project_id),
        ApprovalCreated { project_id, backer },
    );
}

pub fn emit_project_finalised(env: &Env, project_id: u64, released: bool, payout: Payout) {
    env.events().publish(
        (symbol_short!("finalised"), project_id),
        ProjectFinalised {
            project_id,
            released,
            backing_paid: payout.backing_paid,
            asset_paid: payout.asset_paid,
        },
    );
}
