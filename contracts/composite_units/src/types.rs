use soroban_sdk::{contracttype, Address, Vec};

/// Size of the merge tree a deployment mints into.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Magnitude {
    Four,
    Twenty,
    Eighty,
}

/// How the owner's cut of revenue is booked.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AccountingMode {
    /// Owner share is split off and paid at mint time.
    PrepaidSplit,
    /// Owner share is computed on demand from the current winner share.
    Retroactive,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum PaymentMedium {
    /// Native asset contract; the payer transfers alongside the call.
    Native(Address),
    /// Fungible token pulled with allowance + transfer_from.
    Token(Address),
}

/// Fixed at `init`.
#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Deployment {
    pub magnitude: Magnitude,
    pub accounting: AccountingMode,
    pub palette: bool,
}

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MintTerms {
    pub price: i128,       // per unit
    pub batch_limit: u32,  // max units per mint call
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UnitRecord {
    pub depth: u32,
    pub ancestry: Vec<u32>,  // ancestry[d]: unit merged in at depth d
    pub bands: Vec<u32>,     // one per merge, first 5 merges only
    pub gradients: Vec<u32>,
    pub seed: u128,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Palette {
    pub len: u32,
    pub colors: Vec<u32>,  // 3 packed RGB slots, unused slots are 0
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolLedger {
    pub total_deposited: i128,
    pub actual_available: i128,         // prepaid-split only
    pub total_withdrawn_by_owner: i128, // retroactive only
    pub owner_share_percent: u32,
    pub winner_share_percent: u32,
    pub winning_trait_index: u32,
    pub last_claim_ts: u64,
}

/// (band, gradient) pair recorded per merge.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Gene {
    pub band: u32,
    pub gradient: u32,
}
