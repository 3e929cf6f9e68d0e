#![no_std]
//! Collectible units that merge into rarer units, with a prize pool paid to
//! holders of fully merged units showing the current winning color.

use soroban_sdk::{contract, contractimpl, log, symbol_short, Address, Env, String, Vec};
use soroban_token_sdk::metadata::TokenMetadata;

mod composite;
mod error;
mod events;
mod palette;
mod pool;
mod registry;
mod seed;
mod storage;
mod tables;
mod types;

pub use error::Error;
pub use types::{AccountingMode, Deployment, Magnitude, MintTerms, Palette, PaymentMedium, PoolLedger, UnitRecord};

use composite::{Resolver, StoredTraits};
use tables::{color_at, index_of_canonical, index_of_color, DivisorTable};

/// Upper bound for the per-mint batch limit.
pub const MAX_BATCH_LIMIT: u32 = 20;

#[contract]
pub struct CompositeUnits;

impl CompositeUnits {
    fn require_owner(e: &Env) -> Result<Address, Error> {
        let owner = storage::get_owner(e)?;
        owner.require_auth();
        Ok(owner)
    }

    fn live_unit(e: &Env, id: u32) -> Result<UnitRecord, Error> {
        if !registry::exists(e, id) {
            return Err(Error::UnitNotFound);
        }
        storage::get_unit(e, id).ok_or(Error::UnitNotFound)
    }

    fn check_terms(terms: &MintTerms) -> Result<(), Error> {
        if terms.price < 0 || terms.batch_limit == 0 || terms.batch_limit > MAX_BATCH_LIMIT {
            return Err(Error::InvalidLimit);
        }
        Ok(())
    }

    fn check_shares(owner_share: u32, winner_share: u32) -> Result<(), Error> {
        if owner_share > pool::MAX_OWNER_SHARE
            || winner_share < pool::MIN_WINNER_SHARE
            || winner_share > pool::MAX_WINNER_SHARE
        {
            return Err(Error::InvalidPercentage);
        }
        Ok(())
    }
}

#[contractimpl]
impl CompositeUnits {
    /// One-time initializer. The deployment shape cannot change afterwards.
    pub fn init(
        e: Env,
        owner: Address,
        name: String,
        symbol: String,
        deployment: Deployment,
        terms: MintTerms,
        owner_share_percent: u32,
        winner_share_percent: u32,
    ) -> Result<(), Error> {
        if storage::is_initialized(&e) {
            return Err(Error::AlreadyInitialized);
        }
        Self::check_terms(&terms)?;
        Self::check_shares(owner_share_percent, winner_share_percent)?;

        storage::put_owner(&e, &owner);
        storage::put_metadata(&e, &TokenMetadata { decimal: 0, name, symbol });
        storage::put_deployment(&e, &deployment);
        storage::put_terms(&e, &terms);
        storage::put_ledger(
            &e,
            &PoolLedger {
                total_deposited: 0,
                actual_available: 0,
                total_withdrawn_by_owner: 0,
                owner_share_percent,
                winner_share_percent,
                winning_trait_index: 0,
                last_claim_ts: 0,
            },
        );
        Ok(())
    }

    // ---- minting, merging, burning ----

    /// Mint `count` fresh units to `recipient`, paid for by `payer`.
    pub fn mint(e: Env, payer: Address, recipient: Address, count: u32) -> Result<Vec<u32>, Error> {
        payer.require_auth();
        let deployment = storage::get_deployment(&e)?;
        let terms = storage::get_terms(&e)?;
        if count == 0 || count > terms.batch_limit {
            return Err(Error::InvalidMintCount);
        }
        if recipient == e.current_contract_address() {
            return Err(Error::InvalidRecipient);
        }
        let cost = terms.price.checked_mul(count as i128).ok_or(Error::InsufficientPayment)?;
        pool::collect_mint(&e, &deployment, &payer, cost)?;

        let mut ids = Vec::new(&e);
        for _ in 0..count {
            let id = storage::next_id(&e);
            let ctx = seed::MintContext::capture(&e, id, &payer, storage::total_minted(&e));
            let unit_seed = seed::derive_mint_seed(&e, &ctx);
            storage::put_unit(
                &e,
                id,
                &UnitRecord {
                    depth: 0,
                    ancestry: Vec::new(&e),
                    bands: Vec::new(&e),
                    gradients: Vec::new(&e),
                    seed: unit_seed,
                },
            );
            if deployment.palette {
                storage::put_palette(&e, id, &palette::init_palette(&e, unit_seed));
            }
            registry::create(&e, &recipient, id);
            events::minted(&e, &recipient, id, unit_seed);
            ids.push_back(id);
        }
        log!(&e, "minted {} units to {}", count, recipient);
        Ok(ids)
    }

    /// Merge `burn_id` into `keep_id`; returns the unit count at the new depth.
    pub fn composite_units(e: Env, caller: Address, keep_id: u32, burn_id: u32) -> Result<u32, Error> {
        caller.require_auth();
        let deployment = storage::get_deployment(&e)?;
        composite::composite(&e, &deployment, &caller, keep_id, burn_id)
    }

    pub fn burn_unit(e: Env, caller: Address, unit_id: u32) -> Result<(), Error> {
        caller.require_auth();
        if !registry::exists(&e, unit_id) {
            return Err(Error::UnitNotFound);
        }
        if !registry::is_authorized(&e, &caller, unit_id) {
            return Err(Error::NotAuthorized);
        }
        registry::burn(&e, unit_id)
    }

    // ---- prize pool ----

    pub fn claim_prize(e: Env, caller: Address, unit_id: u32) -> Result<i128, Error> {
        caller.require_auth();
        let deployment = storage::get_deployment(&e)?;
        pool::claim(&e, &deployment, &caller, unit_id)
    }

    pub fn deposit_funds(e: Env, from: Address, amount: i128) -> Result<(), Error> {
        from.require_auth();
        let deployment = storage::get_deployment(&e)?;
        pool::deposit(&e, &deployment, &from, amount)
    }

    /// Retroactive mode only: pay out the owner's currently withdrawable share.
    pub fn withdraw_owner_share(e: Env) -> Result<i128, Error> {
        Self::require_owner(&e)?;
        let deployment = storage::get_deployment(&e)?;
        pool::withdraw_owner_share(&e, &deployment)
    }

    /// Send the whole held balance to the owner and zero the ledger.
    pub fn emergency_sweep(e: Env) -> Result<i128, Error> {
        Self::require_owner(&e)?;
        let deployment = storage::get_deployment(&e)?;
        pool::emergency_sweep(&e, &deployment)
    }

    // ---- owner configuration ----

    pub fn set_mint_price(e: Env, price: i128) -> Result<(), Error> {
        Self::require_owner(&e)?;
        let mut terms = storage::get_terms(&e)?;
        terms.price = price;
        Self::check_terms(&terms)?;
        storage::put_terms(&e, &terms);
        events::config_changed(&e, symbol_short!("price"));
        Ok(())
    }

    pub fn set_batch_limit(e: Env, batch_limit: u32) -> Result<(), Error> {
        Self::require_owner(&e)?;
        let mut terms = storage::get_terms(&e)?;
        terms.batch_limit = batch_limit;
        Self::check_terms(&terms)?;
        storage::put_terms(&e, &terms);
        events::config_changed(&e, symbol_short!("batch"));
        Ok(())
    }

    pub fn set_owner_share(e: Env, percent: u32) -> Result<(), Error> {
        Self::require_owner(&e)?;
        let mut ledger = storage::get_ledger(&e)?;
        Self::check_shares(percent, ledger.winner_share_percent)?;
        ledger.owner_share_percent = percent;
        storage::put_ledger(&e, &ledger);
        events::config_changed(&e, symbol_short!("owner_pct"));
        Ok(())
    }

    pub fn set_winner_share(e: Env, percent: u32) -> Result<(), Error> {
        Self::require_owner(&e)?;
        let deployment = storage::get_deployment(&e)?;
        let mut ledger = storage::get_ledger(&e)?;
        Self::check_shares(ledger.owner_share_percent, percent)?;
        pool::check_share_cooldown(&e, &deployment, &ledger)?;
        ledger.winner_share_percent = percent;
        storage::put_ledger(&e, &ledger);
        events::config_changed(&e, symbol_short!("win_pct"));
        Ok(())
    }

    /// Switching media is only allowed while the current one holds nothing.
    pub fn set_payment_medium(e: Env, medium: PaymentMedium) -> Result<(), Error> {
        Self::require_owner(&e)?;
        let deployment = storage::get_deployment(&e)?;
        pool::switch_medium(&e, &deployment, &medium)?;
        events::config_changed(&e, symbol_short!("medium"));
        Ok(())
    }

    pub fn set_winning_trait(e: Env, index: u32) -> Result<(), Error> {
        Self::require_owner(&e)?;
        let deployment = storage::get_deployment(&e)?;
        if index >= pool::winning_domain(&deployment) {
            return Err(Error::InvalidTraitIndex);
        }
        let mut ledger = storage::get_ledger(&e)?;
        ledger.winning_trait_index = index;
        storage::put_ledger(&e, &ledger);
        events::config_changed(&e, symbol_short!("trait"));
        Ok(())
    }

    /// Same as `set_winning_trait`, addressed by packed color.
    pub fn set_winning_color(e: Env, color: u32) -> Result<(), Error> {
        let deployment = storage::get_deployment(&e)?;
        let index = if deployment.palette {
            index_of_canonical(color)
        } else {
            index_of_color(color)
        };
        Self::set_winning_trait(e, index.ok_or(Error::ColorNotFound)?)
    }

    pub fn transfer_ownership(e: Env, new_owner: Address) -> Result<(), Error> {
        Self::require_owner(&e)?;
        storage::put_owner(&e, &new_owner);
        events::config_changed(&e, symbol_short!("owner"));
        Ok(())
    }

    // ---- ownership registry ----

    pub fn owner_of(e: Env, unit_id: u32) -> Result<Address, Error> {
        registry::owner_of(&e, unit_id).ok_or(Error::UnitNotFound)
    }

    pub fn balance_of(e: Env, owner: Address) -> u32 {
        registry::balance_of(&e, &owner)
    }

    pub fn exists(e: Env, unit_id: u32) -> bool {
        registry::exists(&e, unit_id)
    }

    pub fn approve(e: Env, caller: Address, spender: Address, unit_id: u32) -> Result<(), Error> {
        caller.require_auth();
        registry::approve(&e, &caller, &spender, unit_id)
    }

    pub fn set_approval_for_all(e: Env, owner: Address, operator: Address, approved: bool) {
        owner.require_auth();
        registry::set_operator(&e, &owner, &operator, approved);
    }

    pub fn transfer(e: Env, caller: Address, to: Address, unit_id: u32) -> Result<(), Error> {
        caller.require_auth();
        registry::transfer(&e, &caller, &to, unit_id)
    }

    // ---- queries ----

    pub fn owner(e: Env) -> Result<Address, Error> {
        storage::get_owner(&e)
    }

    pub fn name(e: Env) -> Result<String, Error> {
        Ok(storage::get_metadata(&e)?.name)
    }

    pub fn symbol(e: Env) -> Result<String, Error> {
        Ok(storage::get_metadata(&e)?.symbol)
    }

    pub fn deployment(e: Env) -> Result<Deployment, Error> {
        storage::get_deployment(&e)
    }

    pub fn mint_terms(e: Env) -> Result<MintTerms, Error> {
        storage::get_terms(&e)
    }

    pub fn payment_medium(e: Env) -> Option<PaymentMedium> {
        storage::get_medium(&e)
    }

    pub fn ledger(e: Env) -> Result<PoolLedger, Error> {
        storage::get_ledger(&e)
    }

    /// Balance of the payment medium the contract actually holds.
    pub fn held_balance(e: Env) -> Result<i128, Error> {
        Ok(pool::Treasury::load(&e)?.held())
    }

    pub fn owner_withdrawable(e: Env) -> Result<i128, Error> {
        let deployment = storage::get_deployment(&e)?;
        Ok(deployment.accounting.owner_withdrawable(&storage::get_ledger(&e)?))
    }

    /// Trait record; kept after burn so descendants can resolve.
    pub fn unit(e: Env, unit_id: u32) -> Result<UnitRecord, Error> {
        storage::get_unit(&e, unit_id).ok_or(Error::UnitNotFound)
    }

    pub fn palette(e: Env, unit_id: u32) -> Result<Palette, Error> {
        storage::get_palette(&e, unit_id).ok_or(Error::UnitNotFound)
    }

    pub fn unit_count(e: Env, unit_id: u32) -> Result<u32, Error> {
        let deployment = storage::get_deployment(&e)?;
        let unit = Self::live_unit(&e, unit_id)?;
        Ok(DivisorTable::for_magnitude(deployment.magnitude).unit_count(unit.depth))
    }

    pub fn color_indexes(e: Env, unit_id: u32) -> Result<Vec<u32>, Error> {
        let unit = Self::live_unit(&e, unit_id)?;
        Self::color_indexes_at(e, unit_id, unit.depth)
    }

    /// Colors the unit shows when viewed at an earlier `depth`.
    pub fn color_indexes_at(e: Env, unit_id: u32, depth: u32) -> Result<Vec<u32>, Error> {
        let deployment = storage::get_deployment(&e)?;
        let unit = Self::live_unit(&e, unit_id)?;
        if depth > unit.depth {
            return Err(Error::InvalidLimit);
        }
        let table = DivisorTable::for_magnitude(deployment.magnitude);
        let source = StoredTraits { e: &e };
        Resolver::new(&e, table, &source).resolve_color_indexes(depth, &unit)
    }

    /// Packed RGB colors of the unit at its current depth.
    pub fn colors(e: Env, unit_id: u32) -> Result<Vec<u32>, Error> {
        let indexes = Self::color_indexes(e.clone(), unit_id)?;
        let mut out = Vec::new(&e);
        for i in indexes.iter() {
            out.push_back(color_at(i));
        }
        Ok(out)
    }

    pub fn winning_color(e: Env) -> Result<u32, Error> {
        let deployment = storage::get_deployment(&e)?;
        let ledger = storage::get_ledger(&e)?;
        Ok(pool::winning_color(&deployment, ledger.winning_trait_index))
    }

    pub fn is_winning(e: Env, unit_id: u32) -> Result<bool, Error> {
        let deployment = storage::get_deployment(&e)?;
        let ledger = storage::get_ledger(&e)?;
        pool::is_winning(&e, &deployment, &ledger, unit_id)
    }

    pub fn live_units(e: Env) -> u32 {
        storage::live_units(&e)
    }

    pub fn total_minted(e: Env) -> u32 {
        storage::total_minted(&e)
    }
}
