//! Who owns which unit. Trait records outlive a burn; ownership does not.

use soroban_sdk::{Address, Env};

use crate::error::Error;
use crate::events;
use crate::storage::{self, DataKey};

pub fn owner_of(e: &Env, id: u32) -> Option<Address> {
    e.storage().persistent().get(&DataKey::UnitOwner(id))
}

pub fn exists(e: &Env, id: u32) -> bool {
    e.storage().persistent().has(&DataKey::UnitOwner(id))
}

pub fn balance_of(e: &Env, owner: &Address) -> u32 {
    e.storage().persistent().get(&DataKey::Balance(owner.clone())).unwrap_or(0)
}

fn put_balance(e: &Env, owner: &Address, n: u32) {
    e.storage().persistent().set(&DataKey::Balance(owner.clone()), &n);
}

pub fn approved(e: &Env, id: u32) -> Option<Address> {
    e.storage().persistent().get(&DataKey::Approved(id))
}

pub fn is_operator(e: &Env, owner: &Address, operator: &Address) -> bool {
    e.storage()
        .persistent()
        .get(&DataKey::Operator(owner.clone(), operator.clone()))
        .unwrap_or(false)
}

/// Owner, approved spender, or operator of the owner.
pub fn is_authorized(e: &Env, caller: &Address, id: u32) -> bool {
    let Some(owner) = owner_of(e, id) else {
        return false;
    };
    owner == *caller
        || approved(e, id).map_or(false, |a| a == *caller)
        || is_operator(e, &owner, caller)
}

pub fn create(e: &Env, owner: &Address, id: u32) {
    e.storage().persistent().set(&DataKey::UnitOwner(id), owner);
    put_balance(e, owner, balance_of(e, owner) + 1);
    storage::put_live_units(e, storage::live_units(e) + 1);
}

pub fn burn(e: &Env, id: u32) -> Result<(), Error> {
    let owner = owner_of(e, id).ok_or(Error::UnitNotFound)?;
    e.storage().persistent().remove(&DataKey::UnitOwner(id));
    e.storage().persistent().remove(&DataKey::Approved(id));
    put_balance(e, &owner, balance_of(e, &owner) - 1);
    storage::put_live_units(e, storage::live_units(e) - 1);
    events::burned(e, &owner, id);
    Ok(())
}

pub fn approve(e: &Env, caller: &Address, spender: &Address, id: u32) -> Result<(), Error> {
    let owner = owner_of(e, id).ok_or(Error::UnitNotFound)?;
    if owner != *caller && !is_operator(e, &owner, caller) {
        return Err(Error::NotAuthorized);
    }
    e.storage().persistent().set(&DataKey::Approved(id), spender);
    Ok(())
}

pub fn set_operator(e: &Env, owner: &Address, operator: &Address, approved: bool) {
    let key = DataKey::Operator(owner.clone(), operator.clone());
    if approved {
        e.storage().persistent().set(&key, &true);
    } else {
        e.storage().persistent().remove(&key);
    }
}

pub fn transfer(e: &Env, caller: &Address, to: &Address, id: u32) -> Result<(), Error> {
    let owner = owner_of(e, id).ok_or(Error::UnitNotFound)?;
    if !is_authorized(e, caller, id) {
        return Err(Error::NotAuthorized);
    }
    if *to == e.current_contract_address() {
        return Err(Error::InvalidRecipient);
    }
    e.storage().persistent().remove(&DataKey::Approved(id));
    e.storage().persistent().set(&DataKey::UnitOwner(id), to);
    put_balance(e, &owner, balance_of(e, &owner) - 1);
    put_balance(e, to, balance_of(e, to) + 1);
    events::transferred(e, &owner, to, id);
    Ok(())
}
