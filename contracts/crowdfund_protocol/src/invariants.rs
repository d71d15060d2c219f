extern crate std;

use mock_amm::MockAmmClient;
use soroban_sdk::{token, Address};

use crate::types::{Phase, Project};
use crate::CrowdfundProtocolClient;

/// Ledger tallies agree with the per-backer entries of `backers`.
///
/// `backers` must list every address that ever backed the project.
pub fn assert_backer_ledger(client: &CrowdfundProtocolClient, project_id: u64, backers: &[Address]) {
    let project = client.get_project(&project_id);

    let mut sum = 0i128;
    let mut approved = 0i128;
    let mut count = 0u32;
    for backer in backers {
        let amount = client.backing_of(&project_id, backer);
        assert!(amount >= 0, "negative backing for project {}", project_id);
        sum += amount;
        if amount > 0 {
            count += 1;
        }
        if client.has_approved(&project_id, backer) {
            approved += amount;
        }
    }

    assert_eq!(
        project.total_backing, sum,
        "project {}: total_backing {} != sum of backings {}",
        project_id, project.total_backing, sum
    );
    assert_eq!(
        project.backers_count, count,
        "project {}: backers_count {} != distinct backers {}",
        project_id, project.backers_count, count
    );
    assert_eq!(
        project.total_approval, approved,
        "project {}: total_approval {} != approving weight {}",
        project_id, project.total_approval, approved
    );
    assert!(
        project.total_approval <= project.total_backing,
        "project {}: approval {} exceeds backing {}",
        project_id,
        project.total_approval,
        project.total_backing
    );
}

/// The contract's token balances and pool shares are exactly what a single
/// hosted project has attributed to itself.
pub fn assert_custody_matches(
    client: &CrowdfundProtocolClient,
    project_id: u64,
    backing: &token::Client,
    asset: &token::Client,
    amm: &MockAmmClient,
) {
    let project = client.get_project(&project_id);
    assert_eq!(backing.balance(&client.address), project.custody_backing);
    assert_eq!(asset.balance(&client.address), project.asset_residual);
    assert_eq!(amm.balance(&client.address), project.total_liquidity);
}

fn rank(phase: Phase) -> u32 {
    match phase {
        Phase::Created => 0,
        Phase::Backing => 1,
        Phase::BackingClosed => 2,
        Phase::Approval => 3,
        Phase::ApprovalClosed => 4,
        Phase::Processed => 5,
    }
}

/// Phases only move forward.
pub fn assert_phase_forward(before: Phase, after: Phase) {
    assert!(
        rank(after) >= rank(before),
        "phase regressed from {:?} to {:?}",
        before,
        after
    );
}

/// Fields written once stay as written.
pub fn assert_write_once_fields(before: &Project, after: &Project) {
    assert_eq!(before.id, after.id);
    assert_eq!(before.proposer, after.proposer);
    assert_eq!(before.description, after.description);
    assert_eq!(before.manufacturer, after.manufacturer);
    if before.backing_close_time != 0 {
        assert_eq!(before.backing_close_time, after.backing_close_time);
    }
    if before.approval_close_time != 0 {
        assert_eq!(before.approval_close_time, after.approval_close_time);
    }
    if before.processed {
        assert!(after.processed);
    }
}

/// Run every per-project check.
pub fn assert_all_project_invariants(
    client: &CrowdfundProtocolClient,
    project_id: u64,
    backers: &[Address],
) {
    assert_backer_ledger(client, project_id, backers);
    let project = client.get_project(&project_id);
    assert!(project.total_liquidity >= 0);
    assert!(project.custody_backing >= 0);
    assert!(project.asset_residual >= 0);
    if !project.project_not_finalised {
        assert!(project.processed, "released before processing");
    }
}
