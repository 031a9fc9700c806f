use std::io::{self, Stdout};

use chip::{
    chip8::Display,
    definitions::display,
    devices::DisplayCommands,
    DeviceError,
};
use crossterm::{
    cursor,
    execute,
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
};
use tui::{
    backend::CrosstermBackend,
    layout::Rect,
    text::Spans,
    widgets::{Block, Borders, Paragraph},
    Terminal,
};

const PIXEL_ON: char = '█';
const PIXEL_OFF: char = ' ';

/// Terminal cells are about twice as high as wide, so every pixel is two cells wide.
const CELL_ASPECT: usize = 2;

/// Renders the display into text lines, every pixel becomes a block of `scale` rows and
/// `2 * scale` columns.
pub fn render(pixels: &Display, scale: usize) -> Vec<String> {
    let scale = scale.max(1);
    let mut lines = Vec::with_capacity(display::HEIGHT * scale);
    for row in pixels.rows() {
        let line: String = row
            .iter()
            .flat_map(|&pixel| {
                let cell = if pixel { PIXEL_ON } else { PIXEL_OFF };
                std::iter::repeat(cell).take(CELL_ASPECT * scale)
            })
            .collect();
        for _ in 0..scale {
            lines.push(line.clone());
        }
    }
    lines
}

/// monochrome display in a terminal, rendered using TUI and Crossterm
///
/// The terminal is switched to raw mode and the alternate screen for as long as the display
/// lives.
pub struct TerminalDisplay {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    scale: usize,
    title: String,
}

impl TerminalDisplay {
    pub fn new(scale: usize, title: &str) -> Result<Self, io::Error> {
        terminal::enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, cursor::Hide)?;

        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.clear()?;

        log::info!("terminal display with scale {}", scale);
        Ok(Self {
            terminal,
            scale,
            title: format!("CHIP-8 - {}", title),
        })
    }
}

impl DisplayCommands for TerminalDisplay {
    fn display(&mut self, pixels: &Display) -> Result<(), DeviceError> {
        let lines: Vec<Spans> = render(pixels, self.scale)
            .into_iter()
            .map(Spans::from)
            .collect();
        let width = (display::WIDTH * CELL_ASPECT * self.scale + 2) as u16;
        let height = (display::HEIGHT * self.scale + 2) as u16;
        let title = self.title.as_str();

        self.terminal.draw(|f| {
            let size = f.size();
            let area = Rect::new(0, 0, width.min(size.width), height.min(size.height));
            let screen =
                Paragraph::new(lines).block(Block::default().title(title).borders(Borders::ALL));
            f.render_widget(screen, area);
        })?;
        Ok(())
    }
}

impl Drop for TerminalDisplay {
    fn drop(&mut self) {
        // nothing left to report to if restoring fails
        let _ = execute!(
            self.terminal.backend_mut(),
            LeaveAlternateScreen,
            cursor::Show
        );
        let _ = terminal::disable_raw_mode();
    }
}
