use soroban_sdk::{
    auth::{ContractContext, InvokerContractAuthEntry, SubContractInvocation},
    vec, Address, Env, IntoVal, Symbol, Vec,
};

/// Authorise `token.transfer(current_contract, to, amount)` for each entry.
///
/// A router pulls tokens from its `to` argument one call deeper than the
/// contract invoking it, so the invoker's automatic authorisation does not
/// reach those transfers. Entries with a non-positive amount are skipped.
pub fn authorize_transfers(env: &Env, transfers: &[(Address, Address, i128)]) {
    let this = env.current_contract_address();
    let mut entries: Vec<InvokerContractAuthEntry> = Vec::new(env);

    for (token, to, amount) in transfers.iter() {
        if *amount <= 0 {
            continue;
        }
        entries.push_back(InvokerContractAuthEntry::Contract(SubContractInvocation {
            context: ContractContext {
                contract: token.clone(),
                fn_name: Symbol::new(env, "transfer"),
                args: vec![
                    env,
                    this.clone().into_val(env),
                    to.clone().into_val(env),
                    (*amount).into_val(env),
                ],
            },
            sub_invocations: Vec::new(env),
        }));
    }

    if !entries.is_empty() {
        env.authorize_as_current_contract(entries);
    }
}
