//! Prize pool ledger and claim state machine.
//!
//! The two accounting modes share one ledger shape; every piece of
//! mode-specific arithmetic lives in the `impl AccountingMode` block below.

use soroban_sdk::{log, token, Address, Env};

use crate::composite::{Resolver, StoredTraits};
use crate::error::Error;
use crate::events;
use crate::registry;
use crate::seed::{self, SALT_WINNER};
use crate::storage;
use crate::tables::{color_at, DivisorTable, CANONICAL_COLORS, TABLE_SIZE};
use crate::types::{AccountingMode, Deployment, PaymentMedium, PoolLedger};

/// Winner-share changes are frozen for this long after a claim.
pub const CLAIM_COOLDOWN_SECS: u64 = 86_400;

pub const MAX_OWNER_SHARE: u32 = 90;
pub const MIN_WINNER_SHARE: u32 = 1;
pub const MAX_WINNER_SHARE: u32 = 100;

/// `amount * pct / 100` rounded down, without overflowing for large amounts.
fn percent_of(amount: i128, pct: u32) -> i128 {
    let pct = pct as i128;
    amount / 100 * pct + amount % 100 * pct / 100
}

fn add(total: i128, amount: i128) -> Result<i128, Error> {
    total.checked_add(amount).ok_or(Error::InsufficientPayment)
}

impl AccountingMode {
    /// Book a mint payment. Returns the cut owed to the owner right now.
    pub fn credit_mint(&self, ledger: &mut PoolLedger, payment: i128) -> Result<i128, Error> {
        ledger.total_deposited = add(ledger.total_deposited, payment)?;
        match self {
            AccountingMode::PrepaidSplit => {
                let cut = percent_of(payment, ledger.owner_share_percent);
                ledger.actual_available = add(ledger.actual_available, payment - cut)?;
                Ok(cut)
            }
            AccountingMode::Retroactive => Ok(0),
        }
    }

    pub fn credit_deposit(&self, ledger: &mut PoolLedger, amount: i128) -> Result<(), Error> {
        ledger.total_deposited = add(ledger.total_deposited, amount)?;
        if let AccountingMode::PrepaidSplit = self {
            ledger.actual_available = add(ledger.actual_available, amount)?;
        }
        Ok(())
    }

    /// Funds a claim may draw on, given what the contract actually holds.
    pub fn claimable(&self, ledger: &PoolLedger, held: i128) -> i128 {
        match self {
            AccountingMode::PrepaidSplit => ledger.actual_available.min(held),
            AccountingMode::Retroactive => held,
        }
    }

    pub fn debit_claim(&self, ledger: &mut PoolLedger, amount: i128) {
        ledger.total_deposited -= amount;
        if let AccountingMode::PrepaidSplit = self {
            ledger.actual_available -= amount;
        }
    }

    /// Owner entitlement recomputed from the current winner share.
    pub fn owner_withdrawable(&self, ledger: &PoolLedger) -> i128 {
        match self {
            AccountingMode::PrepaidSplit => 0,
            AccountingMode::Retroactive => {
                let entitled = percent_of(ledger.total_deposited, 100 - ledger.winner_share_percent);
                (entitled - ledger.total_withdrawn_by_owner).max(0)
            }
        }
    }

    pub fn reset(&self, ledger: &mut PoolLedger) {
        ledger.total_deposited = 0;
        ledger.actual_available = 0;
        ledger.total_withdrawn_by_owner = 0;
    }
}

/// Payment collaborator over the Soroban token interface.
pub struct Treasury<'a> {
    e: &'a Env,
    medium: PaymentMedium,
}

impl<'a> Treasury<'a> {
    pub fn load(e: &'a Env) -> Result<Self, Error> {
        let medium = storage::get_medium(e).ok_or(Error::PaymentNotConfigured)?;
        Ok(Treasury { e, medium })
    }

    fn client(&self) -> token::Client<'a> {
        let addr = match &self.medium {
            PaymentMedium::Native(a) | PaymentMedium::Token(a) => a,
        };
        token::Client::new(self.e, addr)
    }

    pub fn held(&self) -> i128 {
        self.client().balance(&self.e.current_contract_address())
    }

    /// Move `amount` from `payer` into the contract.
    pub fn collect(&self, payer: &Address, amount: i128) -> Result<(), Error> {
        if amount == 0 {
            return Ok(());
        }
        let client = self.client();
        let me = self.e.current_contract_address();
        if client.balance(payer) < amount {
            return Err(Error::InsufficientPayment);
        }
        match &self.medium {
            PaymentMedium::Native(_) => client.transfer(payer, &me, &amount),
            PaymentMedium::Token(_) => {
                if client.allowance(payer, &me) < amount {
                    return Err(Error::AllowanceTooLow);
                }
                client.transfer_from(&me, payer, &me, &amount);
            }
        }
        Ok(())
    }

    pub fn pay(&self, to: &Address, amount: i128) {
        if amount > 0 {
            self.client().transfer(&self.e.current_contract_address(), to, &amount);
        }
    }
}

/// Number of trait values the winning index ranges over.
pub fn winning_domain(deployment: &Deployment) -> u32 {
    if deployment.palette {
        CANONICAL_COLORS.len() as u32
    } else {
        TABLE_SIZE
    }
}

pub fn winning_color(deployment: &Deployment, index: u32) -> u32 {
    if deployment.palette {
        CANONICAL_COLORS[(index as usize) % CANONICAL_COLORS.len()]
    } else {
        color_at(index)
    }
}

/// A live unit down to its last color slot whose color is the winning one.
pub fn is_winning(e: &Env, deployment: &Deployment, ledger: &PoolLedger, id: u32) -> Result<bool, Error> {
    if !registry::exists(e, id) {
        return Err(Error::UnitNotFound);
    }
    let unit = storage::get_unit(e, id).ok_or(Error::UnitNotFound)?;
    let table = DivisorTable::for_magnitude(deployment.magnitude);
    if table.unit_count(unit.depth) != 1 {
        return Ok(false);
    }
    let target = winning_color(deployment, ledger.winning_trait_index);
    let color = if deployment.palette {
        storage::get_palette(e, id)
            .and_then(|p| p.colors.get(0))
            .ok_or(Error::UnitNotFound)?
    } else {
        let source = StoredTraits { e };
        color_at(Resolver::new(e, table, &source).first_index(unit.depth, &unit)?)
    };
    Ok(color == target)
}

/// Rejection-sample a winning index different from `previous`.
fn next_winning_index(e: &Env, domain: u32, previous: u32, salt_seed: u128) -> u32 {
    let mut attempt = 0;
    loop {
        let idx = (seed::draw(e, salt_seed, SALT_WINNER, previous, attempt) % domain as u64) as u32;
        if idx != previous {
            return idx;
        }
        attempt += 1;
    }
}

pub fn claim(e: &Env, deployment: &Deployment, caller: &Address, id: u32) -> Result<i128, Error> {
    if !registry::exists(e, id) {
        return Err(Error::UnitNotFound);
    }
    if !registry::is_authorized(e, caller, id) {
        return Err(Error::NotAuthorized);
    }
    let mut ledger = storage::get_ledger(e)?;
    if !is_winning(e, deployment, &ledger, id)? {
        return Err(Error::NotWinning);
    }
    let treasury = Treasury::load(e)?;
    if ledger.total_deposited <= 0 {
        return Err(Error::PoolEmpty);
    }
    let mode = deployment.accounting;
    let available = mode.claimable(&ledger, treasury.held());
    let amount = percent_of(ledger.total_deposited, ledger.winner_share_percent).min(available);
    if amount <= 0 {
        return Err(Error::InsufficientFunds);
    }

    mode.debit_claim(&mut ledger, amount);
    registry::burn(e, id)?;
    treasury.pay(caller, amount);

    let previous = ledger.winning_trait_index;
    let entropy = ((e.prng().gen::<u64>() as u128) << 64) | e.ledger().timestamp() as u128;
    ledger.winning_trait_index = next_winning_index(e, winning_domain(deployment), previous, entropy ^ id as u128);
    ledger.last_claim_ts = e.ledger().timestamp();
    storage::put_ledger(e, &ledger);

    log!(e, "claim unit {} paid {} next trait {}", id, amount, ledger.winning_trait_index);
    events::prize_claimed(e, caller, id, amount);
    events::trait_rotated(e, previous, ledger.winning_trait_index);
    Ok(amount)
}

pub fn deposit(e: &Env, deployment: &Deployment, from: &Address, amount: i128) -> Result<(), Error> {
    let treasury = Treasury::load(e)?;
    if amount <= 0 {
        return Err(Error::ZeroAmount);
    }
    let mut ledger = storage::get_ledger(e)?;
    deployment.accounting.credit_deposit(&mut ledger, amount)?;
    treasury.collect(from, amount)?;
    storage::put_ledger(e, &ledger);
    events::deposited(e, from, amount, amount);
    Ok(())
}

/// Take payment for `count` units and book it. Returns the owner's cut paid out.
pub fn collect_mint(e: &Env, deployment: &Deployment, payer: &Address, cost: i128) -> Result<i128, Error> {
    let treasury = Treasury::load(e)?;
    let mut ledger = storage::get_ledger(e)?;
    let cut = deployment.accounting.credit_mint(&mut ledger, cost)?;
    treasury.collect(payer, cost)?;
    if cut > 0 {
        let owner = storage::get_owner(e)?;
        treasury.pay(&owner, cut);
        events::owner_paid(e, &owner, cut);
    }
    storage::put_ledger(e, &ledger);
    if cost > 0 {
        events::deposited(e, payer, cost, cost - cut);
    }
    Ok(cut)
}

pub fn withdraw_owner_share(e: &Env, deployment: &Deployment) -> Result<i128, Error> {
    if deployment.accounting != AccountingMode::Retroactive {
        return Err(Error::UnsupportedAccounting);
    }
    let treasury = Treasury::load(e)?;
    let mut ledger = storage::get_ledger(e)?;
    let amount = deployment.accounting.owner_withdrawable(&ledger).min(treasury.held());
    if amount <= 0 {
        return Err(Error::NothingToWithdraw);
    }
    ledger.total_withdrawn_by_owner += amount;
    storage::put_ledger(e, &ledger);
    let owner = storage::get_owner(e)?;
    treasury.pay(&owner, amount);
    events::owner_paid(e, &owner, amount);
    Ok(amount)
}

pub fn emergency_sweep(e: &Env, deployment: &Deployment) -> Result<i128, Error> {
    let treasury = Treasury::load(e)?;
    let held = treasury.held();
    if held <= 0 {
        return Err(Error::PoolEmpty);
    }
    let mut ledger = storage::get_ledger(e)?;
    deployment.accounting.reset(&mut ledger);
    storage::put_ledger(e, &ledger);
    let owner = storage::get_owner(e)?;
    treasury.pay(&owner, held);
    log!(e, "emergency sweep {}", held);
    events::swept(e, &owner, held);
    Ok(held)
}

/// Replace the payment medium. Refused while the current medium still holds
/// funds; once it is drained the tracked totals no longer describe any balance
/// and are cleared along with the switch.
pub fn switch_medium(e: &Env, deployment: &Deployment, medium: &PaymentMedium) -> Result<(), Error> {
    if let Ok(current) = Treasury::load(e) {
        if current.held() > 0 {
            return Err(Error::PoolNotEmpty);
        }
    }
    let mut ledger = storage::get_ledger(e)?;
    deployment.accounting.reset(&mut ledger);
    storage::put_ledger(e, &ledger);
    storage::put_medium(e, medium);
    Ok(())
}

/// Winner share changes are rate limited in retroactive mode so the owner
/// cannot shrink a pending winner's payout right after a claim.
pub fn check_share_cooldown(e: &Env, deployment: &Deployment, ledger: &PoolLedger) -> Result<(), Error> {
    if deployment.accounting != AccountingMode::Retroactive || ledger.last_claim_ts == 0 {
        return Ok(());
    }
    if e.ledger().timestamp() < ledger.last_claim_ts + CLAIM_COOLDOWN_SECS {
        return Err(Error::CooldownActive);
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    fn ledger(total: i128, owner: u32, winner: u32) -> PoolLedger {
        PoolLedger {
            total_deposited: total,
            actual_available: 0,
            total_withdrawn_by_owner: 0,
            owner_share_percent: owner,
            winner_share_percent: winner,
            winning_trait_index: 0,
            last_claim_ts: 0,
        }
    }

    #[test]
    fn test_prepaid_split_on_mint() {
        let mut l = ledger(0, 40, 50);
        let cut = AccountingMode::PrepaidSplit.credit_mint(&mut l, 400);
        assert_eq!(cut, Ok(160));
        assert_eq!(l.total_deposited, 400);
        assert_eq!(l.actual_available, 240);

        AccountingMode::PrepaidSplit.credit_deposit(&mut l, 60).unwrap();
        assert_eq!(l.total_deposited, 460);
        assert_eq!(l.actual_available, 300);
    }

    #[test]
    fn test_retroactive_withdrawable() {
        let mode = AccountingMode::Retroactive;
        let mut l = ledger(0, 0, 20);
        assert_eq!(mode.credit_mint(&mut l, 1000), Ok(0));
        assert_eq!(mode.owner_withdrawable(&l), 800);

        l.total_withdrawn_by_owner = 300;
        assert_eq!(mode.owner_withdrawable(&l), 500);

        // raising the winner share shrinks the owner's entitlement retroactively
        l.winner_share_percent = 80;
        assert_eq!(mode.owner_withdrawable(&l), 0);
        for w in [1, 20, 50, 99, 100] {
            l.winner_share_percent = w;
            let v = mode.owner_withdrawable(&l);
            assert!(v >= 0);
            assert!(v <= l.total_deposited - l.total_withdrawn_by_owner);
        }
    }

    #[test]
    fn test_claim_cap_by_mode() {
        let mut l = ledger(1000, 70, 50);
        l.actual_available = 300;
        assert_eq!(AccountingMode::PrepaidSplit.claimable(&l, 300), 300);
        assert_eq!(AccountingMode::PrepaidSplit.claimable(&l, 250), 250);
        assert_eq!(AccountingMode::Retroactive.claimable(&l, 900), 900);

        AccountingMode::PrepaidSplit.debit_claim(&mut l, 300);
        assert_eq!(l.total_deposited, 700);
        assert_eq!(l.actual_available, 0);
    }

    #[test]
    fn test_large_amounts_do_not_overflow() {
        assert_eq!(percent_of(1000, 20), 200);
        assert_eq!(percent_of(999, 50), 499);
        assert_eq!(percent_of(i128::MAX, 100), i128::MAX);
        assert_eq!(percent_of(i128::MAX, 50), i128::MAX / 2);

        let mut l = ledger(i128::MAX - 5, 0, 50);
        assert_eq!(AccountingMode::Retroactive.credit_deposit(&mut l, 10), Err(Error::InsufficientPayment));
        assert_eq!(AccountingMode::Retroactive.credit_mint(&mut l, 10), Err(Error::InsufficientPayment));
        assert_eq!(AccountingMode::Retroactive.owner_withdrawable(&l), percent_of(i128::MAX - 5, 50));
    }

    #[test]
    fn test_rotation_always_moves() {
        let e = Env::default();
        for prev in 0..8u32 {
            for s in 0..4u128 {
                let next = next_winning_index(&e, 8, prev, s);
                assert_ne!(next, prev);
                assert!(next < 8);
            }
        }
    }
}
