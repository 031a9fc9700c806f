use std::time::{Duration, Instant};

use crate::{
    chip8::ChipSet,
    definitions::{cpu, timer},
    devices::{DisplayCommands, InputEvent, KeyboardCommands},
    opcode::Operation,
    timer::Ticker,
    RunnerError,
};

/// The rates the runner drives the chipset with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunnerConfig {
    /// instructions per second
    pub cpu_hertz: u32,
    /// timer decrements per second
    pub timer_hertz: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            cpu_hertz: cpu::HERTZ,
            timer_hertz: timer::HERTZ,
        }
    }
}

/// What the caller of [`Runner::run_once`] shall do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Drives a [`ChipSet`] from a single thread: forwards the input, steps the cpu and the
/// timers at their rates and presents the display whenever it changed.
pub struct Runner<D, K> {
    chip: ChipSet,
    display: D,
    keyboard: K,
    cpu: Ticker,
    timers: Ticker,
}

impl<D, K> Runner<D, K>
where
    D: DisplayCommands,
    K: KeyboardCommands,
{
    pub fn new(chip: ChipSet, display: D, keyboard: K, config: RunnerConfig) -> Self {
        Self::starting_at(chip, display, keyboard, config, Instant::now())
    }

    /// Will create a runner whose first ticks are counted from `now`.
    pub fn starting_at(
        chip: ChipSet,
        display: D,
        keyboard: K,
        config: RunnerConfig,
        now: Instant,
    ) -> Self {
        Self {
            chip,
            display,
            keyboard,
            cpu: Ticker::new(config.cpu_hertz, now),
            timers: Ticker::new(config.timer_hertz, now),
        }
    }

    pub fn chip(&self) -> &ChipSet {
        &self.chip
    }

    /// Will give back the chipset, for example to dump its state after an error.
    pub fn into_chip(self) -> ChipSet {
        self.chip
    }

    /// Runs a single iteration of the loop for the point in time `now`.
    ///
    /// An error from the chipset halts the emulation, the chipset is left as it was before the
    /// failing instruction.
    pub fn run_once(&mut self, now: Instant) -> Result<Flow, RunnerError> {
        for event in self.keyboard.poll()? {
            match event {
                InputEvent::Quit => {
                    log::info!("quit requested");
                    return Ok(Flow::Quit);
                }
                InputEvent::Key { index, pressed } => self.chip.set_key(index, pressed)?,
            }
        }

        for _ in 0..self.cpu.due(now) {
            let operation = self.chip.step().map_err(|err| {
                log::error!("halted at {:#06X}: {}", err.pc(), err);
                err
            })?;
            if let Operation::Wait = operation {
                // nothing will change until the next key event
                break;
            }
        }

        if self.chip.is_dirty() {
            self.display.display(self.chip.display())?;
            self.chip.clear_dirty();
        }

        for _ in 0..self.timers.due(now) {
            self.chip.tick_timers();
        }

        Ok(Flow::Continue)
    }

    /// Will run until the input source asks to quit or an error halts the chipset.
    pub fn run(&mut self) -> Result<(), RunnerError> {
        let now = Instant::now();
        self.cpu.reset(now);
        self.timers.reset(now);

        log::info!("starting the emulation");
        loop {
            if let Flow::Quit = self.run_once(Instant::now())? {
                break;
            }

            let deadline = self.cpu.next_deadline().min(self.timers.next_deadline());
            let wait = deadline.saturating_duration_since(Instant::now());
            if wait > Duration::ZERO {
                std::thread::sleep(wait);
            }
        }
        log::info!("stopped the emulation");
        Ok(())
    }
}
