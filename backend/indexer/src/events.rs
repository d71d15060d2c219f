//! Canonical event types emitted by the crowdfund protocol contract.
//!
//! These mirror the payloads in `contracts/crowdfund_protocol/src/events.rs`.

use serde::{Deserialize, Serialize};

/// All recognised event kinds from the crowdfund contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A project was registered (`created` topic).
    ProjectCreated,
    /// The backing window opened (`bk_start` topic).
    BackingStarted,
    /// A backer contributed (`backed` topic).
    BackingCreated,
    /// The approval window opened (`ap_start` topic).
    ApprovalStarted,
    /// A backer voted to release the funds (`approved` topic).
    ApprovalCreated,
    /// Finalisation ran (`finalised` topic).
    ProjectFinalised,
    /// An event from this contract that we don't recognise yet.
    Unknown,
}

impl EventKind {
    /// Parse the leading topic symbol string produced by Soroban into an [`EventKind`].
    pub fn from_topic(topic: &str) -> Self {
        match topic {
            "created" => Self::ProjectCreated,
            "bk_start" => Self::BackingStarted,
            "backed" => Self::BackingCreated,
            "ap_start" => Self::ApprovalStarted,
            "approved" => Self::ApprovalCreated,
            "finalised" => Self::ProjectFinalised,
            _ => Self::Unknown,
        }
    }

    /// Short identifier stored in the `event_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProjectCreated => "project_created",
            Self::BackingStarted => "backing_started",
            Self::BackingCreated => "backing_created",
            Self::ApprovalStarted => "approval_started",
            Self::ApprovalCreated => "approval_created",
            Self::ProjectFinalised => "project_finalised",
            Self::Unknown => "unknown",
        }
    }

    /// Inverse of [`EventKind::as_str`].
    pub fn from_stored(s: &str) -> Self {
        match s {
            "project_created" => Self::ProjectCreated,
            "backing_started" => Self::BackingStarted,
            "backing_created" => Self::BackingCreated,
            "approval_started" => Self::ApprovalStarted,
            "approval_created" => Self::ApprovalCreated,
            "project_finalised" => Self::ProjectFinalised,
            _ => Self::Unknown,
        }
    }
}

/// A fully decoded crowdfund event, ready to be stored in the database.
///
/// `actor` is the proposer for `created` and the backer for `backed` and
/// `approved`. `amount` is the contribution for `backed` and the backing
/// token paid out for `finalised`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrowdfundEvent {
    pub event_id: String,
    pub event_type: String,
    pub project_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub close_time: Option<i64>,
    pub released: Option<bool>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
}

/// A raw event record as stored in / read from the database.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct EventRecord {
    pub id: i64,
    pub event_id: String,
    pub event_type: String,
    pub project_id: Option<String>,
    pub actor: Option<String>,
    pub amount: Option<String>,
    pub close_time: Option<i64>,
    pub released: Option<bool>,
    pub ledger: i64,
    pub timestamp: i64,
    pub contract_id: String,
    pub tx_hash: Option<String>,
    pub created_at: i64,
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        EventKind::from_stored(&self.event_type)
    }
}
