use std::path::PathBuf;

use anyhow::Context;
use chip::{
    chip8::{ChipSet, Quirks},
    definitions::{cpu, keyboard},
    resources::Rom,
    Runner, RunnerConfig,
};
use clap::Parser;

mod display;
mod input;

use display::TerminalDisplay;
use input::TerminalKeyboard;

/// Runs a chip8 program in the terminal.
///
/// Logging goes to stderr and is configured with `RUST_LOG`.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// The program image, the builtin keypad tester is used if none is given.
    rom: Option<PathBuf>,

    /// Instructions executed per second.
    #[arg(long, default_value_t = cpu::HERTZ, value_parser = clap::value_parser!(u32).range(1..=100_000))]
    hertz: u32,

    /// Terminal cells per pixel.
    #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..=8))]
    scale: u16,

    /// Shift VY into VX for 8XY6 and 8XYE, as the COSMAC VIP did.
    #[arg(long)]
    shift_vy: bool,

    /// Prints which terminal key maps to which chip8 key and exits.
    #[arg(long)]
    list_keys: bool,
}

fn print_keys() {
    let keymap = input::conventional_keymap();
    let mut keys: Vec<_> = keymap.iter().map(|(c, key)| (*key, *c)).collect();
    keys.sort_unstable();

    println!("chip8 key layout:");
    for row in keyboard::LAYOUT {
        let line: Vec<String> = row.iter().map(|key| format!("{:X}", key)).collect();
        println!("  {}", line.join(" "));
    }
    println!("terminal keys:");
    for (key, c) in keys {
        println!("  {:X} <- {}", key, c);
    }
    println!("  Esc or Ctrl-C quits");
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();

    if args.list_keys {
        print_keys();
        return Ok(());
    }

    let rom = match &args.rom {
        Some(path) => Rom::from_path(path)
            .with_context(|| format!("unable to load {}", path.display()))?,
        None => Rom::builtin(),
    };

    let mut chip = ChipSet::with_quirks(Quirks {
        shift_uses_vy: args.shift_vy,
        ..Quirks::default()
    });
    chip.load_rom(&rom)?;
    log::info!("loaded '{}' ({} bytes)", rom.get_name(), rom.get_data().len());

    let display = TerminalDisplay::new(args.scale as usize, rom.get_name())
        .context("unable to set up the terminal")?;
    let keyboard = TerminalKeyboard::new(input::KEY_HOLD);
    let config = RunnerConfig {
        cpu_hertz: args.hertz,
        ..RunnerConfig::default()
    };

    let mut runner = Runner::new(chip, display, keyboard, config);
    if let Err(err) = runner.run() {
        // dropping the runner gives the terminal back before the state is printed
        let chip = runner.into_chip();
        eprintln!("{}", chip);
        return Err(err).with_context(|| format!("'{}' stopped", rom.get_name()));
    }
    Ok(())
}
