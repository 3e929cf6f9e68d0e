use soroban_sdk::{symbol_short, Address, Env, Symbol};

fn sym(s: &str) -> Symbol {
    match s {
        "Minted" => symbol_short!("Minted"),
        "Composited" => symbol_short!("Composite"),
        "Burned" => symbol_short!("Burned"),
        "Transferred" => symbol_short!("Transfer"),
        "Deposited" => symbol_short!("Deposit"),
        "OwnerPaid" => symbol_short!("OwnerPaid"),
        "PrizeClaimed" => symbol_short!("PrizeClm"),
        "TraitRotated" => symbol_short!("TraitRot"),
        "Swept" => symbol_short!("Swept"),
        "ConfigChanged" => symbol_short!("Config"),
        _ => symbol_short!("unknown"),
    }
}

pub fn minted(e: &Env, recipient: &Address, id: u32, seed: u128) {
    e.events().publish((sym("Minted"), recipient.clone()), (id, seed));
}

pub fn composited(e: &Env, keep_id: u32, burn_id: u32, count: u32) {
    e.events().publish((sym("Composited"), keep_id), (burn_id, count));
}

pub fn burned(e: &Env, owner: &Address, id: u32) {
    e.events().publish((sym("Burned"), owner.clone()), id);
}

pub fn transferred(e: &Env, from: &Address, to: &Address, id: u32) {
    e.events().publish((sym("Transferred"), from.clone(), to.clone()), id);
}

pub fn deposited(e: &Env, from: &Address, gross: i128, pooled: i128) {
    e.events().publish((sym("Deposited"), from.clone()), (gross, pooled));
}

pub fn owner_paid(e: &Env, owner: &Address, amount: i128) {
    e.events().publish((sym("OwnerPaid"), owner.clone()), amount);
}

pub fn prize_claimed(e: &Env, winner: &Address, id: u32, amount: i128) {
    e.events().publish((sym("PrizeClaimed"), winner.clone()), (id, amount));
}

pub fn trait_rotated(e: &Env, previous: u32, next: u32) {
    e.events().publish((sym("TraitRotated"),), (previous, next));
}

pub fn swept(e: &Env, owner: &Address, amount: i128) {
    e.events().publish((sym("Swept"), owner.clone()), amount);
}

pub fn config_changed(e: &Env, what: Symbol) {
    e.events().publish((sym("ConfigChanged"), what), ());
}
