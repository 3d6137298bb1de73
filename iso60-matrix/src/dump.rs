use core::fmt;

use crate::RowBits;

/// Operator-readable rendering of the stable matrix.
///
/// ```text
/// r/c 0123456789ABCDEF
/// 00: 1010000000000000
/// 01: 0000000000000000
/// ```
///
/// Each row shows the low 16 columns, column 0 first.
pub struct Dump<'a, const ROWS: usize>(pub &'a [RowBits; ROWS]);

impl<const ROWS: usize> fmt::Display for Dump<'_, ROWS> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("r/c 0123456789ABCDEF\n")?;
        for (row, bits) in self.0.iter().enumerate() {
            write!(f, "{:02X}: ", row)?;
            for col in 0..16 {
                f.write_str(if bits & (1 << col) != 0 { "1" } else { "0" })?;
            }
            f.write_str("\n")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::format;

    #[test]
    fn test_dump_format() {
        let rows: [RowBits; 2] = [0b101, 0x8000];
        let text = format!("{}", Dump(&rows));
        assert_eq!(
            text,
            "r/c 0123456789ABCDEF\n\
             00: 1010000000000000\n\
             01: 0000000000000001\n"
        );
    }

    #[test]
    fn test_dump_hides_columns_past_sixteen() {
        let rows: [RowBits; 1] = [1 << 17];
        let text = format!("{}", Dump(&rows));
        assert!(text.ends_with("00: 0000000000000000\n"));
    }

    #[test]
    fn test_dump_row_index_is_hex() {
        let rows: [RowBits; 11] = [0; 11];
        let text = format!("{}", Dump(&rows));
        assert!(text.contains("\n0A: "));
    }
}
