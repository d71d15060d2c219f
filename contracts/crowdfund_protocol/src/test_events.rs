extern crate std;

use soroban_sdk::{
    symbol_short,
    testutils::{Address as _, Events},
    vec, Address, IntoVal, String, Symbol, TryIntoVal, Val,
};

use crate::events::{
    ApprovalCreated, ApprovalStarted, BackingCreated, BackingStarted, ProjectCreated,
    ProjectFinalised,
};
use crate::test::{Fixture, APPROVAL_WINDOW, BACKING_WINDOW, TOKEN};

fn last_event(f: &Fixture) -> (Address, soroban_sdk::Vec<Val>, Val) {
    f.env.events().all().last().expect("No events found")
}

fn expected_topics(f: &Fixture, topic: Symbol) -> soroban_sdk::Vec<Val> {
    vec![&f.env, topic.into_val(&f.env), f.project_id.into_val(&f.env)]
}

#[test]
fn test_project_created_event() {
    let f = Fixture::created();
    let id = f.client.create_project(
        &f.proposer,
        &String::from_str(&f.env, "Another"),
        &f.manufacturer,
    );

    let (contract, topics, data) = last_event(&f);
    assert_eq!(contract, f.client.address);
    assert_eq!(
        topics,
        vec![&f.env, symbol_short!("created").into_val(&f.env), id.into_val(&f.env)]
    );
    let event: ProjectCreated = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        event,
        ProjectCreated {
            project_id: id,
            proposer: f.proposer.clone(),
            manufacturer: f.manufacturer.clone(),
        }
    );
}

#[test]
fn test_backing_started_event() {
    let f = Fixture::backing(TOKEN);

    let (contract, topics, data) = last_event(&f);
    assert_eq!(contract, f.client.address);
    assert_eq!(topics, expected_topics(&f, symbol_short!("bk_start")));
    let event: BackingStarted = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        event,
        BackingStarted {
            project_id: f.project_id,
            close_time: f.client.backing_close_time(&f.project_id),
            duration: BACKING_WINDOW,
        }
    );
}

#[test]
fn test_backing_created_event() {
    let f = Fixture::backing(TOKEN);
    let alice = f.funded_backer(4 * TOKEN);
    f.back(&alice, 4 * TOKEN);

    let (contract, topics, data) = last_event(&f);
    assert_eq!(contract, f.client.address);
    assert_eq!(topics, expected_topics(&f, symbol_short!("backed")));
    let event: BackingCreated = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        event,
        BackingCreated {
            project_id: f.project_id,
            backer: alice,
            amount: 4 * TOKEN,
        }
    );
}

#[test]
fn test_backing_transfers_precede_backing_event() {
    let f = Fixture::backing(TOKEN);
    let alice = f.funded_backer(4 * TOKEN);
    f.back(&alice, 4 * TOKEN);

    let transfer = Symbol::new(&f.env, "transfer");
    let mut movements: std::vec::Vec<(usize, Address, Address, i128)> = std::vec::Vec::new();
    let mut backed_at = None;
    for (index, (contract, topics, data)) in f.env.events().all().iter().enumerate() {
        if contract == f.backing.address {
            let name: Symbol = topics.get(0).unwrap().into_val(&f.env);
            if name != transfer {
                continue;
            }
            let from: Address = topics.get(1).unwrap().into_val(&f.env);
            let to: Address = topics.get(2).unwrap().into_val(&f.env);
            if from == alice || from == f.client.address {
                let amount: i128 = data.into_val(&f.env);
                movements.push((index, from, to, amount));
            }
        } else if contract == f.client.address {
            backed_at = Some(index);
        }
    }

    let backed_at = backed_at.unwrap();
    let (first_at, from, to, amount) = movements[0].clone();
    assert_eq!((from, to, amount), (alice, f.client.address.clone(), 4 * TOKEN));
    let (second_at, from, to, amount) = movements[1].clone();
    assert_eq!(
        (from, to, amount),
        (f.client.address.clone(), f.amm.address.clone(), 2 * TOKEN)
    );
    assert!(first_at < second_at && second_at < backed_at);
}

#[test]
fn test_approval_events() {
    let f = Fixture::backing(TOKEN);
    let alice = f.funded_backer(TOKEN);
    f.back(&alice, TOKEN);
    f.into_approval();

    let (_, topics, data) = last_event(&f);
    assert_eq!(topics, expected_topics(&f, symbol_short!("ap_start")));
    let started: ApprovalStarted = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        started,
        ApprovalStarted {
            project_id: f.project_id,
            close_time: f.client.approval_close_time(&f.project_id),
            duration: APPROVAL_WINDOW,
        }
    );

    f.client.approve_project(&f.project_id, &alice);
    let (_, topics, data) = last_event(&f);
    assert_eq!(topics, expected_topics(&f, symbol_short!("approved")));
    let approved: ApprovalCreated = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        approved,
        ApprovalCreated {
            project_id: f.project_id,
            backer: alice,
        }
    );
}

#[test]
fn test_finalised_event_reports_payout() {
    let f = Fixture::backing(TOKEN);
    let alice = f.funded_backer(20 * TOKEN);
    f.back(&alice, 20 * TOKEN);
    f.into_approval();
    f.client.approve_project(&f.project_id, &alice);
    f.advance(APPROVAL_WINDOW);
    f.finalise();

    let (contract, topics, data) = last_event(&f);
    assert_eq!(contract, f.client.address);
    assert_eq!(topics, expected_topics(&f, symbol_short!("finalised")));
    let event: ProjectFinalised = data.try_into_val(&f.env).unwrap();
    assert!(event.released);
    assert_eq!(event.backing_paid, f.backing.balance(&f.manufacturer));
    assert_eq!(event.asset_paid, f.asset.balance(&f.manufacturer));
}

#[test]
fn test_finalised_event_without_release() {
    let f = Fixture::backing(TOKEN);
    let alice = f.funded_backer(TOKEN);
    f.back(&alice, TOKEN);
    f.into_approval();
    f.advance(APPROVAL_WINDOW);
    f.finalise();

    let (_, topics, data) = last_event(&f);
    assert_eq!(topics, expected_topics(&f, symbol_short!("finalised")));
    let event: ProjectFinalised = data.try_into_val(&f.env).unwrap();
    assert_eq!(
        event,
        ProjectFinalised {
            project_id: f.project_id,
            released: false,
            backing_paid: 0,
            asset_paid: 0,
        }
    );
}

#[test]
fn test_failed_call_emits_nothing_new() {
    let f = Fixture::backing(2 * TOKEN);
    let alice = f.funded_backer(TOKEN);
    let _ = f
        .client
        .try_back_project(&f.project_id, &alice, &TOKEN, &0, &f.amm.address);

    let backed = f
        .env
        .events()
        .all()
        .iter()
        .filter(|(contract, topics, _)| {
            *contract == f.client.address
                && topics == &expected_topics(&f, symbol_short!("backed"))
        })
        .count();
    assert_eq!(backed, 0);
}

#[test]
fn test_events_are_scoped_by_project() {
    let f = Fixture::created();
    let stranger = Address::generate(&f.env);
    let second = f.client.create_project(
        &stranger,
        &String::from_str(&f.env, "Stranger's project"),
        &f.manufacturer,
    );
    let (_, topics, _) = last_event(&f);
    let id: u64 = topics.get(1).unwrap().into_val(&f.env);
    assert_eq!(id, second);
    assert_ne!(id, f.project_id);
}
