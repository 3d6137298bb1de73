mod layout;
mod replay;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use iso60_keymap::wiring::WIRING;
use iso60_keymap::{Action, Resolved, KEYMAP, LAYER_BASE, NUM_LAYERS};
use log::{info, LevelFilter};
use std::fs;
use std::io;

pub(crate) use iso60_keymap::{COLS, ROWS};

#[derive(Parser)]
#[command(name = "iso60-cli")]
#[command(about = "ISO60 keyboard keymap and matrix tool")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate an HTML/SVG visualization of the keymap
    Layout {
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the action table
    Actions,
    /// Print what a matrix position resolves to on a layer
    Resolve { layer: usize, row: usize, col: usize },
    /// Print the matrix-to-physical wiring table
    Wiring,
    /// Replay raw matrix samples through the debounced scanner
    Simulate {
        /// Sample file, one scan pass per line
        samples: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new().filter_level(level).init();

    match cli.command {
        Command::Layout { output } => {
            let html = layout::generate_html(&KEYMAP);
            match output {
                Some(path) => {
                    fs::write(&path, &html).with_context(|| format!("writing {}", path))?;
                    info!("wrote {} bytes to {}", html.len(), path);
                    println!("Layout written to {}", path);
                }
                None => print!("{}", html),
            }
        }
        Command::Actions => {
            for (index, action) in KEYMAP.actions.iter().enumerate() {
                println!("Fn{:<2}  {}", index, format_action(*action));
            }
        }
        Command::Resolve { layer, row, col } => {
            if layer >= NUM_LAYERS {
                bail!("layer {} out of range (0-{})", layer, NUM_LAYERS - 1);
            }
            if row >= ROWS || col >= COLS {
                bail!("matrix position ({}, {}) out of range ({}x{})", row, col, ROWS, COLS);
            }
            match KEYMAP.resolve(layer, row, col) {
                Resolved::Key(keycode) => match KEYMAP.action_for(keycode) {
                    Some(action) => println!("{:?} -> {}", keycode, format_action(action)),
                    None => println!("{:?}", keycode),
                },
                Resolved::Overlay { mods, key } => {
                    println!("overlay: {:?} with mods 0x{:02X}", key, mods.bits())
                }
            }
        }
        Command::Wiring => {
            for (row, cells) in WIRING.iter().enumerate() {
                for (col, cell) in cells.iter().enumerate() {
                    if let Some(key) = cell {
                        println!(
                            "({}, {:>2}) -> physical row {} key {:>2}  {}",
                            row,
                            col,
                            key.row,
                            key.col,
                            KEYMAP.keycode(LAYER_BASE, row, col).display_name()
                        );
                    }
                }
            }
        }
        Command::Simulate { samples } => {
            let contents =
                fs::read_to_string(&samples).with_context(|| format!("reading {}", samples))?;
            let parsed = replay::parse_samples(&contents).context("parsing sample file")?;

            let stdout = io::stdout();
            let summary = replay::replay(&parsed, &mut stdout.lock())?;
            println!("{} passes, {} commits", summary.passes, summary.commits);
        }
    }

    Ok(())
}

fn format_action(action: Action) -> String {
    match action {
        Action::ModsKey(mods, key) => format!("mods 0x{:02X} + {:?}", mods.bits(), key),
        Action::LayerTapKey(layer, key) => format!("layer {} while held, {:?} on tap", layer, key),
        Action::LayerMomentary(layer) => format!("layer {} while held", layer),
        Action::LayerToggle(layer) => format!("toggle layer {}", layer),
    }
}
