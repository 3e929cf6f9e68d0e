//! Seed derivation and salted sub-draws.
//!
//! All entropy here comes from host values: the ledger timestamp and the
//! host PRNG. Both are known to, and can be steered by, whoever orders
//! transactions. The seeds are fit for trait variety, not for anything
//! that needs unpredictability.

use soroban_sdk::{xdr::ToXdr, Address, Bytes, Env};

use crate::types::Gene;

pub const SALT_BAND: &[u8] = b"band";
pub const SALT_GRADIENT: &[u8] = b"gradient";
pub const SALT_FIRST: &[u8] = b"first";
pub const SALT_OFFSET: &[u8] = b"offset";
pub const SALT_PICK: &[u8] = b"pick";
pub const SALT_GENE: &[u8] = b"gene";
pub const SALT_PALETTE: &[u8] = b"palette";
pub const SALT_WINNER: &[u8] = b"winner";

/// Inputs to a fresh unit's seed.
pub struct MintContext {
    pub timestamp: u64,
    pub entropy: u64,
    pub unit_id: u32,
    pub caller: Address,
    pub counter: u32,
}

impl MintContext {
    pub fn capture(e: &Env, unit_id: u32, caller: &Address, counter: u32) -> Self {
        MintContext {
            timestamp: e.ledger().timestamp(),
            entropy: e.prng().gen::<u64>(),
            unit_id,
            caller: caller.clone(),
            counter,
        }
    }
}

fn digest(e: &Env, data: &Bytes) -> [u8; 32] {
    e.crypto().keccak256(data).to_array()
}

/// Low 128 bits of the big-endian digest, i.e. the digest mod 2^128.
fn fold(hash: &[u8; 32]) -> u128 {
    let mut low = [0u8; 16];
    low.copy_from_slice(&hash[16..]);
    u128::from_be_bytes(low)
}

pub fn derive_mint_seed(e: &Env, ctx: &MintContext) -> u128 {
    let mut data = Bytes::new(e);
    data.extend_from_array(&ctx.timestamp.to_be_bytes());
    data.extend_from_array(&ctx.entropy.to_be_bytes());
    data.extend_from_array(&ctx.unit_id.to_be_bytes());
    data.append(&ctx.caller.clone().to_xdr(e));
    data.extend_from_array(&ctx.counter.to_be_bytes());
    fold(&digest(e, &data))
}

pub fn derive_merge_seed(e: &Env, seed_a: u128, seed_b: u128, gene: &Gene) -> u128 {
    let mut data = Bytes::new(e);
    data.extend_from_array(&seed_a.to_be_bytes());
    data.extend_from_array(&seed_b.to_be_bytes());
    data.extend_from_array(&gene.band.to_be_bytes());
    data.extend_from_array(&gene.gradient.to_be_bytes());
    fold(&digest(e, &data))
}

/// Salted draw keyed by seed, depth and slot.
pub fn draw(e: &Env, seed: u128, salt: &[u8], depth: u32, index: u32) -> u64 {
    let mut data = Bytes::new(e);
    data.extend_from_array(&seed.to_be_bytes());
    data.extend_from_slice(salt);
    data.extend_from_array(&depth.to_be_bytes());
    data.extend_from_array(&index.to_be_bytes());
    let h = digest(e, &data);
    let mut head = [0u8; 8];
    head.copy_from_slice(&h[..8]);
    u64::from_be_bytes(head)
}

/// Draw over a pair of seeds, used where two units meet.
pub fn pair_draw(e: &Env, seed_a: u128, seed_b: u128, salt: &[u8]) -> u64 {
    draw(e, seed_a ^ seed_b.rotate_left(64), salt, 0, 0)
}

pub fn band_draw(e: &Env, seed: u128, domain: u32) -> u32 {
    (draw(e, seed, SALT_BAND, 0, 0) % domain as u64) as u32
}

pub fn gradient_draw(e: &Env, seed: u128) -> u32 {
    (draw(e, seed, SALT_GRADIENT, 0, 0) % 100) as u32
}

#[cfg(test)]
mod test {
    use super::*;
    use soroban_sdk::testutils::Address as _;

    #[test]
    fn test_mint_seed_is_replayable() {
        let e = Env::default();
        let caller = Address::generate(&e);
        let ctx = MintContext { timestamp: 1_700_000_000, entropy: 42, unit_id: 7, caller: caller.clone(), counter: 7 };
        let again = MintContext { timestamp: 1_700_000_000, entropy: 42, unit_id: 7, caller, counter: 7 };
        assert_eq!(derive_mint_seed(&e, &ctx), derive_mint_seed(&e, &again));

        let other = MintContext { unit_id: 8, counter: 8, ..again };
        assert_ne!(derive_mint_seed(&e, &ctx), derive_mint_seed(&e, &other));
    }

    #[test]
    fn test_merge_seed_depends_on_gene() {
        let e = Env::default();
        let g1 = Gene { band: 2, gradient: 0 };
        let g2 = Gene { band: 2, gradient: 3 };
        assert_eq!(derive_merge_seed(&e, 11, 22, &g1), derive_merge_seed(&e, 11, 22, &g1));
        assert_ne!(derive_merge_seed(&e, 11, 22, &g1), derive_merge_seed(&e, 11, 22, &g2));
    }

    #[test]
    fn test_draws_are_salted() {
        let e = Env::default();
        let seed = 0xDEAD_BEEF_u128;
        assert_eq!(draw(&e, seed, SALT_PICK, 1, 0), draw(&e, seed, SALT_PICK, 1, 0));
        assert_ne!(draw(&e, seed, SALT_PICK, 1, 0), draw(&e, seed, SALT_PICK, 1, 1));
        assert_ne!(draw(&e, seed, SALT_BAND, 0, 0), draw(&e, seed, SALT_GRADIENT, 0, 0));
        assert!(band_draw(&e, seed, 1000) < 1000);
        assert!(gradient_draw(&e, seed) < 100);
    }
}
