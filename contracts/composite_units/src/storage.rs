use soroban_sdk::{contracttype, Address, Env};
use soroban_token_sdk::metadata::TokenMetadata;

use crate::error::Error;
use crate::types::{Deployment, MintTerms, Palette, PaymentMedium, PoolLedger, UnitRecord};

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Owner,
    Metadata,
    Deployment,
    Terms,
    Ledger,
    Medium,
    NextId,
    LiveUnits,
    Unit(u32),
    Palette(u32),
    UnitOwner(u32),
    Approved(u32),
    Operator(Address, Address),
    Balance(Address),
}

pub fn is_initialized(e: &Env) -> bool {
    e.storage().instance().has(&DataKey::Deployment)
}

pub fn get_owner(e: &Env) -> Result<Address, Error> {
    e.storage().instance().get(&DataKey::Owner).ok_or(Error::NotInitialized)
}

pub fn put_owner(e: &Env, owner: &Address) {
    e.storage().instance().set(&DataKey::Owner, owner);
}

pub fn get_metadata(e: &Env) -> Result<TokenMetadata, Error> {
    e.storage().instance().get(&DataKey::Metadata).ok_or(Error::NotInitialized)
}

pub fn put_metadata(e: &Env, md: &TokenMetadata) {
    e.storage().instance().set(&DataKey::Metadata, md);
}

pub fn get_deployment(e: &Env) -> Result<Deployment, Error> {
    e.storage().instance().get(&DataKey::Deployment).ok_or(Error::NotInitialized)
}

pub fn put_deployment(e: &Env, d: &Deployment) {
    e.storage().instance().set(&DataKey::Deployment, d);
}

pub fn get_terms(e: &Env) -> Result<MintTerms, Error> {
    e.storage().instance().get(&DataKey::Terms).ok_or(Error::NotInitialized)
}

pub fn put_terms(e: &Env, t: &MintTerms) {
    e.storage().instance().set(&DataKey::Terms, t);
}

pub fn get_ledger(e: &Env) -> Result<PoolLedger, Error> {
    e.storage().instance().get(&DataKey::Ledger).ok_or(Error::NotInitialized)
}

pub fn put_ledger(e: &Env, l: &PoolLedger) {
    e.storage().instance().set(&DataKey::Ledger, l);
}

pub fn get_medium(e: &Env) -> Option<PaymentMedium> {
    e.storage().instance().get(&DataKey::Medium)
}

pub fn put_medium(e: &Env, m: &PaymentMedium) {
    e.storage().instance().set(&DataKey::Medium, m);
}

/// Last allocated unit id; doubles as the mint counter.
pub fn total_minted(e: &Env) -> u32 {
    e.storage().instance().get(&DataKey::NextId).unwrap_or(0)
}

pub fn next_id(e: &Env) -> u32 {
    let n = total_minted(e) + 1;
    e.storage().instance().set(&DataKey::NextId, &n);
    n
}

pub fn live_units(e: &Env) -> u32 {
    e.storage().instance().get(&DataKey::LiveUnits).unwrap_or(0)
}

pub fn put_live_units(e: &Env, n: u32) {
    e.storage().instance().set(&DataKey::LiveUnits, &n);
}

pub fn get_unit(e: &Env, id: u32) -> Option<UnitRecord> {
    e.storage().persistent().get(&DataKey::Unit(id))
}

pub fn put_unit(e: &Env, id: u32, rec: &UnitRecord) {
    e.storage().persistent().set(&DataKey::Unit(id), rec);
}

pub fn get_palette(e: &Env, id: u32) -> Option<Palette> {
    e.storage().persistent().get(&DataKey::Palette(id))
}

pub fn put_palette(e: &Env, id: u32, p: &Palette) {
    e.storage().persistent().set(&DataKey::Palette(id), p);
}
