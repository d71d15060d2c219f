//! Per-project tallies rebuilt from indexed events.
//!
//! The contract is the source of truth; this is a read model for frontends
//! that want the headline figures without an RPC simulation per project.
//! Amounts are `i128` on chain and are carried as decimal strings.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::events::{EventKind, EventRecord};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectSummary {
    pub project_id: String,
    pub proposer: Option<String>,
    pub backing_close_time: Option<i64>,
    pub approval_close_time: Option<i64>,
    pub total_backing: String,
    pub backers: usize,
    pub approvals: usize,
    /// Sum of the contributions of approving backers.
    pub approved_weight: String,
    pub finalised: bool,
    /// `None` until finalisation has been indexed.
    pub released: Option<bool>,
    pub backing_paid: Option<String>,
    pub event_count: usize,
}

/// Fold a project's events, in ledger order, into a summary.
///
/// Amounts that fail to parse are counted as zero.
pub fn summarise(project_id: &str, events: &[EventRecord]) -> ProjectSummary {
    let mut summary = ProjectSummary {
        project_id: project_id.to_string(),
        ..ProjectSummary::default()
    };
    let mut backings: BTreeMap<&str, i128> = BTreeMap::new();
    let mut approvers: BTreeSet<&str> = BTreeSet::new();
    let mut total: i128 = 0;

    for ev in events {
        summary.event_count += 1;
        match ev.kind() {
            EventKind::ProjectCreated => summary.proposer = ev.actor.clone(),
            EventKind::BackingStarted => summary.backing_close_time = ev.close_time,
            EventKind::ApprovalStarted => summary.approval_close_time = ev.close_time,
            EventKind::BackingCreated => {
                let amount = parse_amount(ev.amount.as_deref());
                total = total.saturating_add(amount);
                if let Some(backer) = ev.actor.as_deref() {
                    let entry = backings.entry(backer).or_insert(0);
                    *entry = entry.saturating_add(amount);
                }
            }
            EventKind::ApprovalCreated => {
                if let Some(backer) = ev.actor.as_deref() {
                    approvers.insert(backer);
                }
            }
            EventKind::ProjectFinalised => {
                summary.finalised = true;
                summary.released = ev.released;
                summary.backing_paid = ev.amount.clone();
            }
            EventKind::Unknown => {}
        }
    }

    let weight = approvers
        .iter()
        .filter_map(|a| backings.get(a))
        .fold(0i128, |acc, v| acc.saturating_add(*v));

    summary.total_backing = total.to_string();
    summary.backers = backings.values().filter(|v| **v > 0).count();
    summary.approvals = approvers.len();
    summary.approved_weight = weight.to_string();
    summary
}

fn parse_amount(raw: Option<&str>) -> i128 {
    raw.and_then(|s| s.parse().ok()).unwrap_or(0)
}
