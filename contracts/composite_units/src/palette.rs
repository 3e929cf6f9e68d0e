//! Winning-color palette for palette deployments: three colors at mint,
//! two after the first merge, one after the second.

use soroban_sdk::{vec, Env};

use crate::seed::{self, SALT_PALETTE};
use crate::storage;
use crate::tables::CANONICAL_COLORS;
use crate::types::Palette;

pub fn init_palette(e: &Env, unit_seed: u128) -> Palette {
    let n = CANONICAL_COLORS.len() as u64;
    let pick = |slot| CANONICAL_COLORS[(seed::draw(e, unit_seed, SALT_PALETTE, 0, slot) % n) as usize];
    Palette {
        len: 3,
        colors: vec![e, pick(0), pick(1), pick(2)],
    }
}

/// Palette after merging `other` into `keep`, or `None` when the pair is
/// not at a shrinking step.
pub fn merge_palettes(e: &Env, keep: &Palette, other: &Palette, merge_seed: u128) -> Option<Palette> {
    let color = |p: &Palette, i: u64| p.colors.get(i as u32).unwrap_or(0);
    match (keep.len, other.len) {
        (3, 3) => {
            let a = seed::draw(e, merge_seed, SALT_PALETTE, 3, 0) % 3;
            let b = seed::draw(e, merge_seed, SALT_PALETTE, 3, 1) % 3;
            Some(Palette {
                len: 2,
                colors: vec![e, color(keep, a), color(other, b), 0],
            })
        }
        (2, 2) => {
            let k = seed::draw(e, merge_seed, SALT_PALETTE, 2, 0) % 4;
            let chosen = if k < 2 { color(keep, k) } else { color(other, k - 2) };
            Some(Palette {
                len: 1,
                colors: vec![e, chosen, 0, 0],
            })
        }
        _ => None,
    }
}

/// Shrink `keep_id`'s stored palette after it absorbed `burn_id`.
pub fn on_merge(e: &Env, keep_id: u32, burn_id: u32, merge_seed: u128) {
    let (Some(keep), Some(other)) = (storage::get_palette(e, keep_id), storage::get_palette(e, burn_id)) else {
        return;
    };
    if let Some(next) = merge_palettes(e, &keep, &other, merge_seed) {
        storage::put_palette(e, keep_id, &next);
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_palette_shrinks_three_two_one() {
        let e = Env::default();
        let a = init_palette(&e, 1);
        let b = init_palette(&e, 2);
        assert_eq!(a.len, 3);
        for c in a.colors.iter() {
            assert!(CANONICAL_COLORS.contains(&c));
        }

        let ab = merge_palettes(&e, &a, &b, 10).unwrap();
        assert_eq!(ab.len, 2);
        assert!(a.colors.contains(ab.colors.get(0).unwrap()));
        assert!(b.colors.contains(ab.colors.get(1).unwrap()));
        assert_eq!(ab.colors.get(2), Some(0));

        let c = init_palette(&e, 3);
        let d = init_palette(&e, 4);
        let cd = merge_palettes(&e, &c, &d, 11).unwrap();

        let last = merge_palettes(&e, &ab, &cd, 12).unwrap();
        assert_eq!(last.len, 1);
        let winner = last.colors.get(0).unwrap();
        assert!(winner == ab.colors.get(0).unwrap()
            || winner == ab.colors.get(1).unwrap()
            || winner == cd.colors.get(0).unwrap()
            || winner == cd.colors.get(1).unwrap());
    }

    #[test]
    fn test_single_color_palette_is_fixed() {
        let e = Env::default();
        let one = Palette { len: 1, colors: vec![&e, CANONICAL_COLORS[0], 0, 0] };
        assert_eq!(merge_palettes(&e, &one, &one.clone(), 5), None);
        let three = init_palette(&e, 9);
        assert_eq!(merge_palettes(&e, &three, &one, 5), None);
    }
}
