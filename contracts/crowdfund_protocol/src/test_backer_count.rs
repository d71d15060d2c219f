extern crate std;

use soroban_sdk::{testutils::Address as _, Address, String};

use crate::invariants::assert_backer_ledger;
use crate::test::{Fixture, BACKING_WINDOW, TOKEN};

fn second_project(f: &Fixture) -> u64 {
    let id = f.client.create_project(
        &f.proposer,
        &String::from_str(&f.env, "Second batch"),
        &f.manufacturer,
    );
    f.client.start_backing(
        &id,
        &f.proposer,
        &BACKING_WINDOW,
        &0,
        &f.amm.address,
        &f.backing.address,
        &f.asset.address,
    );
    id
}

#[test]
fn test_backers_count_starts_at_zero() {
    let f = Fixture::backing(0);
    assert_eq!(f.client.get_project(&f.project_id).backers_count, 0);
}

#[test]
fn test_backers_count_increments_for_new_backer() {
    let f = Fixture::backing(0);
    let alice = f.funded_backer(5 * TOKEN);

    f.back(&alice, 5 * TOKEN);

    assert_eq!(f.client.get_project(&f.project_id).backers_count, 1);
}

#[test]
fn test_backers_count_ignores_repeat_backing() {
    let f = Fixture::backing(0);
    let alice = f.funded_backer(9 * TOKEN);

    f.back(&alice, 3 * TOKEN);
    f.back(&alice, 3 * TOKEN);
    f.back(&alice, 3 * TOKEN);

    let project = f.client.get_project(&f.project_id);
    assert_eq!(project.backers_count, 1);
    assert_eq!(project.total_backing, 9 * TOKEN);
}

#[test]
fn test_backers_count_tracks_many_backers() {
    let f = Fixture::backing(0);
    let backers: std::vec::Vec<Address> = (0..5).map(|_| f.funded_backer(2 * TOKEN)).collect();

    for backer in &backers {
        f.back(backer, TOKEN);
    }
    f.back(&backers[0], TOKEN);

    assert_eq!(f.client.get_project(&f.project_id).backers_count, 5);
    assert_backer_ledger(&f.client, f.project_id, &backers);
}

#[test]
fn test_failed_backing_does_not_count() {
    let f = Fixture::backing(2 * TOKEN);
    let alice = f.funded_backer(TOKEN);

    let result = f
        .client
        .try_back_project(&f.project_id, &alice, &TOKEN, &0, &f.amm.address);
    assert!(result.is_err());

    assert_eq!(f.client.get_project(&f.project_id).backers_count, 0);
}

#[test]
fn test_backers_count_is_per_project() {
    let f = Fixture::backing(0);
    let other = second_project(&f);
    let alice = f.funded_backer(4 * TOKEN);
    let bob = Address::generate(&f.env);
    f.fund(&bob, 2 * TOKEN);

    f.back(&alice, 2 * TOKEN);
    f.client
        .back_project(&other, &alice, &(2 * TOKEN), &0, &f.amm.address);
    f.client
        .back_project(&other, &bob, &(2 * TOKEN), &0, &f.amm.address);

    assert_eq!(f.client.get_project(&f.project_id).backers_count, 1);
    assert_eq!(f.client.get_project(&other).backers_count, 2);
    assert_eq!(f.client.backing_of(&f.project_id, &bob), 0);
    assert_backer_ledger(&f.client, f.project_id, &[alice.clone(), bob.clone()]);
    assert_backer_ledger(&f.client, other, &[alice, bob]);
}
