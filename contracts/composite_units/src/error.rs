use soroban_sdk::contracterror;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum Error {
    // configuration
    NotInitialized = 1,
    AlreadyInitialized = 2,
    PaymentNotConfigured = 3,
    UnsupportedAccounting = 4,
    PoolNotEmpty = 5,

    // authorization
    NotAuthorized = 10,

    // validation
    InvalidRecipient = 20,
    InvalidMintCount = 21,
    InvalidMergeOperation = 22,
    InvalidPercentage = 23,
    InvalidLimit = 24,
    InvalidTraitIndex = 25,
    ZeroAmount = 26,
    CooldownActive = 27,
    NotWinning = 28,

    // insufficient resources
    InsufficientPayment = 30,
    AllowanceTooLow = 31,
    PoolEmpty = 32,
    InsufficientFunds = 33,
    NothingToWithdraw = 34,

    // not found
    UnitNotFound = 40,
    ColorNotFound = 41,
}
