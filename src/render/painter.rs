use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};
use crossterm::terminal::{Clear, ClearType};

use crate::config::{DisplayConfig, RunConfig};
use crate::render::color::{self, ColorCache};
use crate::render::frame::Frame;
use crate::scheduler::{RunSnapshot, RunSummary};

/// Cursor position from 1-based `(row, col)` screen coordinates.
fn go(row: usize, col: usize) -> MoveTo {
    let clamp = |n: usize| n.saturating_sub(1).min(u16::MAX as usize) as u16;
    MoveTo(clamp(col), clamp(row))
}

/// Draws the progress display with ANSI escapes.
///
/// Screen layout for `N` workers (rows are 1-based):
///
/// ```text
/// 1      ┌──────────┐
/// 2..N+1 1 │ •••    │ Working on task 17
/// N+2    └──────────┘
/// N+3      ••••••    73.0%  73/100 done  2 died
/// N+5    closing report
/// ```
pub struct Painter<W: Write> {
    out: W,
    workers: usize,
    label_width: usize,
    display: DisplayConfig,
    colors: ColorCache,
}

impl<W: Write> Painter<W> {
    pub fn new(out: W, config: &RunConfig) -> Self {
        Self {
            out,
            workers: config.workers,
            label_width: config.label_width(),
            display: config.display.clone(),
            colors: ColorCache::new(),
        }
    }

    /// First column inside the box.
    fn bar_col(&self) -> usize {
        self.label_width + 5
    }

    /// First column right of the box.
    fn info_col(&self) -> usize {
        self.bar_col() + self.display.bar_width + 3
    }

    fn bg(&mut self, hex: &str) -> SetBackgroundColor {
        SetBackgroundColor(self.colors.get(hex))
    }

    fn glyphs(&self, n: usize) -> String {
        std::iter::repeat(self.display.glyph).take(n).collect()
    }

    /// Clear the screen and paint the box with one numbered row per slot.
    pub fn draw_frame(&mut self) -> io::Result<()> {
        let width = self.display.bar_width;
        let label_width = self.label_width;
        let edge = "─".repeat(width + 2);
        queue!(
            self.out,
            Clear(ClearType::All),
            go(1, label_width + 3),
            Print(format!("┌{edge}┐")),
        )?;
        for slot in 1..=self.workers {
            let row = format!(" {:>label_width$} │ {:width$} │", slot, "");
            queue!(self.out, go(slot + 1, 1), Print(row))?;
        }
        let bottom = go(self.workers + 2, label_width + 3);
        queue!(self.out, bottom, Print(format!("└{edge}┘")))?;
        self.out.flush()
    }

    /// Show which job a slot just picked up.
    pub fn draw_assigned(&mut self, slot: usize, job: &str) -> io::Result<()> {
        let at = go(slot + 1, self.info_col());
        queue!(
            self.out,
            at,
            Print(format!("Working on task {job}")),
            Clear(ClearType::UntilNewLine),
        )?;
        self.out.flush()
    }

    /// Paint slot bars and the summary bar for `snapshot`.
    pub fn draw_progress(&mut self, snapshot: &RunSnapshot) -> io::Result<()> {
        if snapshot.total == 0 {
            return Ok(());
        }
        let frame = Frame::compute(snapshot, self.display.bar_width);
        let bar_col = self.bar_col();
        let info_col = self.info_col();

        for &(slot, cols) in &frame.slot_bars {
            let bg = self.bg(color::SLOT_BAR);
            let bar = self.glyphs(cols);
            queue!(self.out, go(slot + 1, bar_col), bg, Print(bar), ResetColor)?;
        }

        let row = self.workers + 3;
        let fg = SetForegroundColor(self.colors.get(color::FOREGROUND));
        let green = self.bg(color::SUCCEEDED);
        let yellow = self.bg(color::IN_FLIGHT);
        let red = self.bg(color::REMAINDER);
        let blue = self.bg(color::SLOT_BAR);
        let done = self.glyphs(frame.succeeded_cols);
        let live = self.glyphs(frame.in_flight_cols);
        let rest = " ".repeat(frame.remainder_cols);
        queue!(
            self.out,
            go(row, bar_col),
            fg,
            green,
            Print(done),
            yellow,
            Print(live),
            red,
            Print(rest),
            go(row, info_col),
            blue,
            Print(format!(" {:.1}% ", frame.percent)),
        )?;
        if snapshot.succeeded > 0 {
            queue!(
                self.out,
                SetBackgroundColor(Color::Reset),
                Print(" "),
                green,
                Print(format!(" {}/{} done ", snapshot.succeeded, snapshot.total)),
            )?;
        }
        if snapshot.failed > 0 {
            queue!(
                self.out,
                SetBackgroundColor(Color::Reset),
                Print(" "),
                red,
                Print(format!(" {} died ", snapshot.failed)),
            )?;
        }
        queue!(self.out, ResetColor)?;
        self.out.flush()
    }

    /// Print the closing report below the display.
    pub fn draw_report(&mut self, summary: &RunSummary) -> io::Result<()> {
        let at = go(self.workers + 5, 1);
        queue!(self.out, at, Print(format!("{summary}\n\n")))?;
        self.out.flush()
    }

    /// Move the cursor below the display without printing anything.
    pub fn park_cursor(&mut self) -> io::Result<()> {
        let at = go(self.workers + 5, 1);
        queue!(self.out, at)?;
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
