//! Replay recorded raw matrix samples through the debounced scanner.
//!
//! A sample file has one scan pass per line: the raw column bits of every
//! row, in row order, optionally followed by `xN` to repeat the pass N times.
//! Values may be binary (`0b101`), hex (`0x1F`) or decimal. `#` starts a
//! comment.
//!
//! ```text
//! # press A, bounce once, hold
//! 0 0 0 0 0 0 0        x4
//! 0 0 0 0 0 0 0b10
//! 0 0 0 0 0 0 0
//! 0 0 0 0 0 0 0b10     x6
//! ```

use std::io::Write;

use anyhow::{bail, Context, Result};
use iso60_keymap::{KEYMAP, LAYER_BASE};
use iso60_matrix::sim::{SimBoard, SimDelay};
use iso60_matrix::{Matrix, RowBits, ScanStatus};

use crate::{COLS, ROWS};

/// One line of a sample file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sample {
    pub rows: [RowBits; ROWS],
    pub repeat: usize,
}

/// Parse a sample file.
pub fn parse_samples(input: &str) -> Result<Vec<Sample>> {
    let mut samples = Vec::new();

    for (line_num, line) in input.lines().enumerate() {
        let line = line.split('#').next().unwrap_or("").trim();
        if line.is_empty() {
            continue;
        }

        let mut fields: Vec<&str> = line.split_whitespace().collect();
        let mut repeat = 1;
        if let Some(last) = fields.last() {
            if let Some(count) = last.strip_prefix('x') {
                repeat = count
                    .parse()
                    .with_context(|| format!("line {}: invalid repeat count '{}'", line_num + 1, last))?;
                if repeat == 0 {
                    bail!("line {}: repeat count must be at least 1", line_num + 1);
                }
                fields.pop();
            }
        }

        if fields.len() != ROWS {
            bail!(
                "line {}: expected {} row values, got {}",
                line_num + 1,
                ROWS,
                fields.len()
            );
        }

        let mut rows = [0; ROWS];
        for (row, field) in fields.iter().enumerate() {
            let bits = parse_bits(field)
                .with_context(|| format!("line {}: row {}: invalid value '{}'", line_num + 1, row, field))?;
            if bits >> COLS != 0 {
                bail!("line {}: row {}: bits set past column {}", line_num + 1, row, COLS - 1);
            }
            rows[row] = bits;
        }

        samples.push(Sample { rows, repeat });
    }

    Ok(samples)
}

fn parse_bits(field: &str) -> Result<RowBits> {
    let value = if let Some(bin) = field.strip_prefix("0b") {
        RowBits::from_str_radix(bin, 2)?
    } else if let Some(hex) = field.strip_prefix("0x") {
        RowBits::from_str_radix(hex, 16)?
    } else {
        field.parse()?
    };
    Ok(value)
}

/// Counts from a replay.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub passes: usize,
    pub commits: usize,
}

/// Scan every sample on a simulated board, writing the status of each pass
/// and the stable matrix after each commit.
pub fn replay(samples: &[Sample], out: &mut impl Write) -> Result<Summary> {
    let board = SimBoard::<ROWS, COLS>::new();
    let mut matrix = Matrix::new(board.rows(), board.cols(), SimDelay::new());
    let mut summary = Summary::default();

    for sample in samples {
        board.set_rows(&sample.rows);
        for _ in 0..sample.repeat {
            summary.passes += 1;
            let status = matrix.scan();
            writeln!(out, "pass {:>4}: {:?}", summary.passes, status)?;
            if status == ScanStatus::Committed {
                summary.commits += 1;
                write!(out, "{}", matrix.dump())?;
                writeln!(out, "keys: {}", pressed_keys(matrix.rows()))?;
            }
        }
    }

    Ok(summary)
}

/// Base-layer names of the pressed keys.
fn pressed_keys(rows: &[RowBits; ROWS]) -> String {
    let mut names = Vec::new();
    for (row, bits) in rows.iter().enumerate() {
        for col in (0..COLS).filter(|col| bits & (1 << col) != 0) {
            let keycode = KEYMAP.keycode(LAYER_BASE, row, col);
            let name = keycode.display_name();
            names.push(if name.is_empty() {
                format!("({},{})", row, col)
            } else {
                name.to_string()
            });
        }
    }
    if names.is_empty() {
        "-".to_string()
    } else {
        names.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_formats() {
        let samples = parse_samples("0b101 0x10 3 0 0 0 0\n").unwrap();
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].rows, [0b101, 0x10, 3, 0, 0, 0, 0]);
        assert_eq!(samples[0].repeat, 1);
    }

    #[test]
    fn test_parse_repeat_and_comments() {
        let input = "# header\n\
                     \n\
                     0 0 0 0 0 0 0 x4   # idle\n\
                     1 0 0 0 0 0 0\n";
        let samples = parse_samples(input).unwrap();
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0].repeat, 4);
        assert_eq!(samples[1].rows[0], 1);
    }

    #[test]
    fn test_parse_wrong_row_count() {
        let err = parse_samples("0 0 0\n").unwrap_err();
        assert!(err.to_string().contains("line 1"));
    }

    #[test]
    fn test_parse_bad_value() {
        assert!(parse_samples("0 0 0 0 0 0 0b12\n").is_err());
        assert!(parse_samples("0 0 0 0 0 0 0 x0\n").is_err());
        assert!(parse_samples("0 0 0 0 0 0 0 xz\n").is_err());
    }

    #[test]
    fn test_parse_rejects_columns_past_matrix() {
        let err = parse_samples("0x40000 0 0 0 0 0 0\n").unwrap_err();
        assert!(err.to_string().contains("past column 17"));
    }

    #[test]
    fn test_replay_commits_after_window() {
        // Space bar is matrix (0, 7).
        let samples = parse_samples(
            "0 0 0 0 0 0 0 x4\n\
             0x80 0 0 0 0 0 0 x4\n",
        )
        .unwrap();
        let mut out = Vec::new();
        let summary = replay(&samples, &mut out).unwrap();

        assert_eq!(summary, Summary { passes: 8, commits: 2 });
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("pass    8: Committed"));
        assert!(text.contains("00: 0000000100000000"));
        assert!(text.ends_with("keys: Spc\n"));
    }

    #[test]
    fn test_replay_rejects_bounce() {
        let samples = parse_samples(
            "0 0 0 0 0 0 0 x4\n\
             0 0x80 0 0 0 0 0\n\
             0 0 0 0 0 0 0 x6\n",
        )
        .unwrap();
        let mut out = Vec::new();
        replay(&samples, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("01: 0000000100000000"));
        assert!(text.contains("pass   11: Idle"));
    }
}
