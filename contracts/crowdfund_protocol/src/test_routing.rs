extern crate std;

use mock_amm::MockAmmClient;
use soroban_sdk::{
    contract, contractimpl, contracttype,
    testutils::{Address as _, MockAuth, MockAuthInvoke},
    vec, Address, Env, IntoVal, String, Vec,
};

use crate::invariants::{assert_all_project_invariants, assert_custody_matches};
use crate::test::{Fixture, APPROVAL_WINDOW, BACKING_WINDOW, TOKEN};
use crate::{Error, ErrorKind};

// ── A router that forwards to the real pool but misreports ───────────

#[contracttype]
#[derive(Clone)]
enum RouterKey {
    Pool,
    Bonus,
    ClaimedShares,
}

/// Forwards every call to `pool`, then inflates what it reports: swap output
/// and withdrawn backing by `bonus`. When `claimed_shares` is nonzero,
/// `add_liquidity` moves nothing and reports that many shares.
#[contract]
pub struct LyingRouter;

#[contractimpl]
impl LyingRouter {
    pub fn __constructor(env: Env, pool: Address, bonus: i128, claimed_shares: i128) {
        let storage = env.storage().instance();
        storage.set(&RouterKey::Pool, &pool);
        storage.set(&RouterKey::Bonus, &bonus);
        storage.set(&RouterKey::ClaimedShares, &claimed_shares);
    }

    pub fn swap_exact_tokens_for_tokens(
        env: Env,
        amount_in: i128,
        amount_out_min: i128,
        path: Vec<Address>,
        to: Address,
        deadline: u64,
    ) -> Vec<i128> {
        let amounts =
            pool(&env).swap_exact_tokens_for_tokens(&amount_in, &amount_out_min, &path, &to, &deadline);
        let out = amounts.get(1).unwrap() + read(&env, &RouterKey::Bonus);
        vec![&env, amount_in, out]
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_liquidity(
        env: Env,
        token_a: Address,
        token_b: Address,
        amount_a_desired: i128,
        amount_b_desired: i128,
        amount_a_min: i128,
        amount_b_min: i128,
        to: Address,
        deadline: u64,
    ) -> (i128, i128, i128) {
        let claimed = read(&env, &RouterKey::ClaimedShares);
        if claimed > 0 {
            return (0, 0, claimed);
        }
        pool(&env).add_liquidity(
            &token_a,
            &token_b,
            &amount_a_desired,
            &amount_b_desired,
            &amount_a_min,
            &amount_b_min,
            &to,
            &deadline,
        )
    }

    #[allow(clippy::too_many_arguments)]
    pub fn remove_liquidity(
        env: Env,
        token_a: Address,
        token_b: Address,
        liquidity: i128,
        amount_a_min: i128,
        amount_b_min: i128,
        to: Address,
        deadline: u64,
    ) -> (i128, i128) {
        let (a, b) = pool(&env).remove_liquidity(
            &token_a,
            &token_b,
            &liquidity,
            &amount_a_min,
            &amount_b_min,
            &to,
            &deadline,
        );
        (a + read(&env, &RouterKey::Bonus), b)
    }

    pub fn get_reserves(env: Env, token_a: Address, token_b: Address) -> (i128, i128) {
        pool(&env).get_reserves(&token_a, &token_b)
    }

    pub fn router_pair_for(env: Env, token_a: Address, token_b: Address) -> Address {
        pool(&env).router_pair_for(&token_a, &token_b)
    }
}

fn pool(env: &Env) -> MockAmmClient<'_> {
    let address: Address = env.storage().instance().get(&RouterKey::Pool).unwrap();
    MockAmmClient::new(env, &address)
}

fn read(env: &Env, key: &RouterKey) -> i128 {
    env.storage().instance().get(key).unwrap()
}

fn lying_router(f: &Fixture, bonus: i128, claimed_shares: i128) -> Address {
    f.env
        .register(LyingRouter, (f.amm.address.clone(), bonus, claimed_shares))
}

// ── Misreporting routers ─────────────────────────────────────────────

#[test]
fn test_claimed_shares_must_be_minted() {
    let f = Fixture::backing(0);
    let victim = f.funded_backer(100 * TOKEN);
    f.back(&victim, 100 * TOKEN);
    let victim_shares = f.client.get_project(&f.project_id).total_liquidity;
    assert!(victim_shares > 0);

    // A second project on the same contract tries to book the victim's shares.
    let attacker = Address::generate(&f.env);
    let attack_id = f.client.create_project(
        &attacker,
        &String::from_str(&f.env, "Not a kiln"),
        &attacker,
    );
    f.client.start_backing(
        &attack_id,
        &attacker,
        &BACKING_WINDOW,
        &0,
        &f.amm.address,
        &f.backing.address,
        &f.asset.address,
    );
    f.fund(&attacker, 2 * TOKEN);
    let router = lying_router(&f, 0, victim_shares);

    let result = f
        .client
        .try_back_project(&attack_id, &attacker, &(2 * TOKEN), &0, &router);
    assert_eq!(result, Err(Ok(Error::AmmMismatch)));
    assert_eq!(Error::AmmMismatch.kind(), ErrorKind::Transfer);

    let attack = f.client.get_project(&attack_id);
    assert_eq!(attack.total_liquidity, 0);
    assert_eq!(attack.total_backing, 0);
    assert_eq!(f.backing.balance(&attacker), 2 * TOKEN);

    // The victim project still owns every share the contract holds.
    assert_custody_matches(&f.client, f.project_id, &f.backing, &f.asset, &f.amm);
    f.into_approval();
    f.client.approve_project(&f.project_id, &victim);
    f.advance(APPROVAL_WINDOW);
    f.finalise();
    assert!(f.backing.balance(&f.manufacturer) > 0);
    assert_eq!(f.amm.balance(&f.client.address), 0);
}

#[test]
fn test_inflated_swap_output_is_rejected() {
    let f = Fixture::backing(0);
    let backer = f.funded_backer(10 * TOKEN);
    let router = lying_router(&f, TOKEN, 0);

    let result = f
        .client
        .try_back_project(&f.project_id, &backer, &(10 * TOKEN), &0, &router);
    assert_eq!(result, Err(Ok(Error::AmmMismatch)));
    assert_eq!(f.client.backing_of(&f.project_id, &backer), 0);
    assert_eq!(f.backing.balance(&backer), 10 * TOKEN);
}

#[test]
fn test_honest_forwarding_router_is_accepted() {
    let f = Fixture::backing(0);
    let backer = f.funded_backer(10 * TOKEN);
    let router = lying_router(&f, 0, 0);

    f.client
        .back_project(&f.project_id, &backer, &(10 * TOKEN), &0, &router);

    assert!(f.client.get_project(&f.project_id).total_liquidity > 0);
    assert_custody_matches(&f.client, f.project_id, &f.backing, &f.asset, &f.amm);
    assert_all_project_invariants(&f.client, f.project_id, &[backer]);
}

#[test]
fn test_inflated_withdrawal_is_rejected() {
    let f = Fixture::backing(0);
    let backer = f.funded_backer(100 * TOKEN);
    f.back(&backer, 100 * TOKEN);
    f.into_approval();
    f.client.approve_project(&f.project_id, &backer);
    f.advance(APPROVAL_WINDOW);

    let router = lying_router(&f, TOKEN, 0);
    let result = f.client.try_finalise_project(
        &f.project_id,
        &f.proposer,
        &router,
        &f.amm.address,
        &0,
        &0,
    );
    assert_eq!(result, Err(Ok(Error::AmmMismatch)));
    assert!(!f.client.get_project(&f.project_id).processed);
    assert_eq!(f.backing.balance(&f.manufacturer), 0);

    f.finalise();
    assert!(!f.client.get_project(&f.project_id).project_not_finalised);
}

// ── The contract's own authorisation of router pulls ─────────────────

#[test]
fn test_back_project_with_only_backer_signing() {
    let f = Fixture::backing(0);
    let amount = 100 * TOKEN;
    let backer = f.funded_backer(amount);

    // Nested pulls into the pool are covered only by the contract's own
    // pre-authorisation from here on.
    f.env.mock_auths(&[MockAuth {
        address: &backer,
        invoke: &MockAuthInvoke {
            contract: &f.client.address,
            fn_name: "back_project",
            args: (f.project_id, backer.clone(), amount, 0i128, f.amm.address.clone())
                .into_val(&f.env),
            sub_invokes: &[],
        },
    }]);
    f.back(&backer, amount);

    let project = f.client.get_project(&f.project_id);
    assert_eq!(project.total_backing, amount);
    assert!(project.total_liquidity > 0);
    assert_custody_matches(&f.client, f.project_id, &f.backing, &f.asset, &f.amm);
}

#[test]
fn test_finalise_with_only_proposer_signing() {
    let f = Fixture::backing(0);
    let backer = f.funded_backer(100 * TOKEN);
    f.back(&backer, 100 * TOKEN);
    f.into_approval();
    f.client.approve_project(&f.project_id, &backer);
    f.advance(APPROVAL_WINDOW);

    f.env.mock_auths(&[MockAuth {
        address: &f.proposer,
        invoke: &MockAuthInvoke {
            contract: &f.client.address,
            fn_name: "finalise_project",
            args: (
                f.project_id,
                f.proposer.clone(),
                f.amm.address.clone(),
                f.amm.address.clone(),
                0i128,
                0i128,
            )
                .into_val(&f.env),
            sub_invokes: &[],
        },
    }]);
    f.finalise();

    let project = f.client.get_project(&f.project_id);
    assert!(!project.project_not_finalised);
    assert!(f.backing.balance(&f.manufacturer) > 0);
    assert!(f.asset.balance(&f.manufacturer) > 0);
    assert_eq!(f.amm.balance(&f.client.address), 0);
}
