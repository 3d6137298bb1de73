//! Physical key layout and its wiring into the switch matrix.
//!
//! Layers are written in physical order, five rows as they sit on the case,
//! and [`kmap`] places each key into its matrix cell at compile time. The
//! wiring table names physical keys by a two-digit hex label: `0x12` is
//! physical row 1, second key from the left.

use crate::keycode::Keycode;
use crate::{Layer, COLS, ROWS};

/// Physical rows: number row, top letter row, home row, bottom row, space row.
pub const PHYS_ROWS: usize = 5;
/// Widest physical row.
pub const PHYS_COLS: usize = 14;
/// Number of keys in each physical row.
pub const PHYS_ROW_LEN: [usize; PHYS_ROWS] = [14, 14, 13, 13, 5];

/// A layer written in physical order. Cells past a row's length are ignored.
pub type PhysicalLayout = [[Keycode; PHYS_COLS]; PHYS_ROWS];

/// A key on the case, by physical row and zero-based position in the row.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PhysKey {
    pub row: u8,
    pub col: u8,
}

const fn k(label: u8) -> Option<PhysKey> {
    Some(PhysKey {
        row: label >> 4,
        col: (label & 0x0F) - 1,
    })
}

const XX: Option<PhysKey> = None;

/// Which physical key sits at each matrix position.
#[rustfmt::skip]
pub const WIRING: [[Option<PhysKey>; COLS]; ROWS] = [
    [k(0x12), k(0x13), k(0x14), k(0x15), k(0x16), k(0x11), k(0x25), k(0x43), k(0x37),
     k(0x22), k(0x23), k(0x24), k(0x21), k(0x31), k(0x33), k(0x34), k(0x35), k(0x36)],
    [k(0x28), k(0x0E), k(0x2A), k(0x07), XX,      k(0x01), k(0x29), k(0x19), k(0x26),
     XX,      k(0x0C), k(0x0D), XX,      k(0x18), k(0x02), k(0x03), k(0x04), k(0x06)],
    [XX,      XX,      XX,      XX,      XX,      k(0x17), k(0x1B), k(0x41), XX,
     k(0x1A), k(0x05), XX,      XX,      XX,      XX,      XX,      XX,      XX     ],
    [k(0x0B), XX,      XX,      XX,      XX,      k(0x08), XX,      XX,      k(0x39),
     XX,      k(0x09), k(0x0A), XX,      k(0x1E), XX,      k(0x3D), XX,      XX     ],
    [XX,      k(0x27), k(0x2D), XX,      XX,      k(0x2B), XX,      XX,      k(0x42),
     XX,      XX,      k(0x2C), XX,      XX,      XX,      XX,      XX,      XX     ],
    [k(0x3A), k(0x3B), k(0x3C), XX,      XX,      XX,      XX,      XX,      XX,
     XX,      k(0x38), k(0x45), XX,      XX,      XX,      XX,      XX,      XX     ],
    [XX,      XX,      XX,      XX,      XX,      XX,      XX,      XX,      XX,
     k(0x32), k(0x1C), k(0x1D), XX,      XX,      k(0x44), XX,      XX,      XX     ],
];

/// Build a matrix-ordered layer from a physical layout. Unwired matrix cells
/// hold [`Keycode::No`].
pub const fn kmap(layout: &PhysicalLayout) -> Layer {
    let mut layer = [[Keycode::No; COLS]; ROWS];
    let mut row = 0;
    while row < ROWS {
        let mut col = 0;
        while col < COLS {
            if let Some(key) = WIRING[row][col] {
                layer[row][col] = layout[key.row as usize][key.col as usize];
            }
            col += 1;
        }
        row += 1;
    }
    layer
}

/// Matrix position `(row, col)` of a physical key.
pub fn matrix_position(key: PhysKey) -> Option<(usize, usize)> {
    (0..ROWS)
        .flat_map(|row| (0..COLS).map(move |col| (row, col)))
        .find(|&(row, col)| WIRING[row][col] == Some(key))
}
