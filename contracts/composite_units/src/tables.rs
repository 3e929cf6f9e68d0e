//! Per-deployment divisor tables and the fixed color tables.
//!
//! Everything here is immutable `'static` data. A deployment picks its
//! [`DivisorTable`] once, by [`Magnitude`], when the contract is initialized.

use crate::types::Magnitude;

/// Size of the hue wheel every color index points into.
pub const TABLE_SIZE: u32 = 360;

/// Returned in place of colors for a fully spent unit.
pub const BLANK_INDEX: u32 = u32::MAX;
pub const BLANK_COLOR: u32 = u32::MAX;

/// Genes are recorded for this many merges; deeper merges keep their look.
pub const GENE_DEPTH: u32 = 5;

/// Ancestry slots per unit. Tables may not have more non-terminal depths.
pub const MAX_ANCESTRY: u32 = 6;

/// Small trait-color set used by palette deployments.
pub const CANONICAL_COLORS: [u32; 8] = [
    0xE63946, // red
    0xF4A261, // orange
    0xE9C46A, // yellow
    0x2A9D8F, // green
    0x48CAE4, // cyan
    0x1D3557, // blue
    0x7B2CBF, // purple
    0xFF70A6, // pink
];

pub struct DivisorTable {
    /// Live color slots per depth; the last entry (0) is the terminal depth.
    pub unit_counts: &'static [u32],
    /// Hue width of each color band.
    pub band_widths: &'static [u32],
    /// Cumulative draw thresholds per band; the last one is the draw domain.
    pub band_thresholds: &'static [u32],
    /// Spacing multiplier per gradient value (index 0 = no gradient).
    pub gradient_steps: &'static [u32],
}

const BAND_WIDTHS: [u32; 7] = [360, 180, 96, 48, 24, 12, 4];
const BAND_THRESHOLDS: [u32; 7] = [400, 650, 800, 900, 960, 990, 1000];
const GRADIENT_STEPS: [u32; 7] = [0, 1, 2, 3, 4, 6, 8];

static FOUR: DivisorTable = DivisorTable {
    unit_counts: &[4, 2, 1, 0],
    band_widths: &BAND_WIDTHS,
    band_thresholds: &BAND_THRESHOLDS,
    gradient_steps: &GRADIENT_STEPS,
};

static TWENTY: DivisorTable = DivisorTable {
    unit_counts: &[20, 10, 5, 4, 2, 1, 0],
    band_widths: &BAND_WIDTHS,
    band_thresholds: &BAND_THRESHOLDS,
    gradient_steps: &GRADIENT_STEPS,
};

static EIGHTY: DivisorTable = DivisorTable {
    unit_counts: &[80, 20, 10, 4, 2, 1, 0],
    band_widths: &BAND_WIDTHS,
    band_thresholds: &BAND_THRESHOLDS,
    gradient_steps: &GRADIENT_STEPS,
};

impl DivisorTable {
    pub fn for_magnitude(m: Magnitude) -> &'static DivisorTable {
        match m {
            Magnitude::Four => &FOUR,
            Magnitude::Twenty => &TWENTY,
            Magnitude::Eighty => &EIGHTY,
        }
    }

    pub fn terminal_depth(&self) -> u32 {
        self.unit_counts.len() as u32 - 1
    }

    /// Deepest depth at which two units may still be merged. Units down to a
    /// single slot are included, so two potential winners can merge into the
    /// blank terminal unit.
    pub fn max_merge_depth(&self) -> u32 {
        self.terminal_depth() - 1
    }

    pub fn unit_count(&self, depth: u32) -> u32 {
        self.unit_counts.get(depth as usize).copied().unwrap_or(0)
    }

    pub fn band_domain(&self) -> u32 {
        self.band_thresholds[self.band_thresholds.len() - 1]
    }

    /// First band whose cumulative threshold exceeds `draw`.
    pub fn band_for_draw(&self, draw: u32) -> u32 {
        self.band_thresholds
            .iter()
            .position(|t| draw < *t)
            .unwrap_or(self.band_thresholds.len() - 1) as u32
    }

    pub fn band_width(&self, band: u32) -> u32 {
        let last = self.band_widths.len() - 1;
        self.band_widths[(band as usize).min(last)]
    }

    pub fn gradient_step(&self, gradient: u32) -> u32 {
        let last = self.gradient_steps.len() - 1;
        self.gradient_steps[(gradient as usize).min(last)]
    }
}

/// Packed 0xRRGGBB for a hue index on the wheel.
pub fn color_at(index: u32) -> u32 {
    if index == BLANK_INDEX {
        return BLANK_COLOR;
    }
    let h = index % TABLE_SIZE;
    let rise = 255 * (h % 60) / 60;
    let fall = 255 - rise;
    let (r, g, b) = match h / 60 {
        0 => (255, rise, 0),
        1 => (fall, 255, 0),
        2 => (0, 255, rise),
        3 => (0, fall, 255),
        4 => (rise, 0, 255),
        _ => (255, 0, fall),
    };
    (r << 16) | (g << 8) | b
}

/// Index of `color` on the hue wheel, if it is one of its entries.
pub fn index_of_color(color: u32) -> Option<u32> {
    (0..TABLE_SIZE).find(|i| color_at(*i) == color)
}

pub fn index_of_canonical(color: u32) -> Option<u32> {
    CANONICAL_COLORS.iter().position(|c| *c == color).map(|i| i as u32)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_tables_fit_ancestry() {
        for m in [Magnitude::Four, Magnitude::Twenty, Magnitude::Eighty] {
            let t = DivisorTable::for_magnitude(m);
            assert!(t.terminal_depth() <= MAX_ANCESTRY);
            assert_eq!(t.unit_count(t.terminal_depth()), 0);
            assert_eq!(t.unit_count(t.max_merge_depth()), 1);
            // genes cover every non-terminal depth above 0
            assert!(t.max_merge_depth() <= GENE_DEPTH);
        }
    }

    #[test]
    fn test_band_thresholds() {
        let t = DivisorTable::for_magnitude(Magnitude::Twenty);
        assert_eq!(t.band_domain(), 1000);
        assert_eq!(t.band_for_draw(0), 0);
        assert_eq!(t.band_for_draw(399), 0);
        assert_eq!(t.band_for_draw(400), 1);
        assert_eq!(t.band_for_draw(999), 6);
        assert_eq!(t.band_width(6), 4);
    }

    #[test]
    fn test_color_wheel() {
        assert_eq!(color_at(0), 0xFF0000);
        assert_eq!(color_at(120), 0x00FF00);
        assert_eq!(color_at(240), 0x0000FF);
        assert_eq!(color_at(BLANK_INDEX), BLANK_COLOR);
        assert_eq!(index_of_color(0x00FF00), Some(120));
        assert_eq!(index_of_color(0x123456), None);
        assert_eq!(index_of_canonical(0x7B2CBF), Some(6));
    }
}
