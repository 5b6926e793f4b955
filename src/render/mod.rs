//! Live progress display.
//!
//! The dispatcher never draws. It sends [`DisplayEvent`]s carrying counter
//! snapshots, and a [`Renderer`] on a blocking thread turns them into
//! terminal output, so a slow terminal never stalls a supervising task.

pub mod color;
pub mod frame;
pub mod painter;

use std::collections::BTreeMap;
use std::io::{self, Write};

use crossterm::cursor::{MoveTo, Show};
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use tokio::sync::mpsc;

use crate::scheduler::RunSnapshot;

pub use frame::Frame;
pub use painter::Painter;

/// Something the display should reflect.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayEvent {
    /// A slot picked up a job
    Assigned { slot: usize, job: String },
    /// Fresh counters after a start, a completion or a heartbeat
    Progress(RunSnapshot),
    /// Repaint everything from scratch (terminal resized)
    Redraw,
}

/// Owns the painter and the last state it was told about.
pub struct Renderer<W: Write> {
    painter: Painter<W>,
    last: Option<RunSnapshot>,
    labels: BTreeMap<usize, String>,
}

impl<W: Write> Renderer<W> {
    pub fn new(painter: Painter<W>) -> Self {
        Self {
            painter,
            last: None,
            labels: BTreeMap::new(),
        }
    }

    /// Paint the static frame.
    pub fn start(&mut self) -> io::Result<()> {
        self.painter.draw_frame()
    }

    pub fn handle(&mut self, event: DisplayEvent) -> io::Result<()> {
        match event {
            DisplayEvent::Assigned { slot, job } => {
                self.painter.draw_assigned(slot, &job)?;
                self.labels.insert(slot, job);
            }
            DisplayEvent::Progress(snapshot) => {
                self.painter.draw_progress(&snapshot)?;
                self.last = Some(snapshot);
            }
            DisplayEvent::Redraw => {
                self.painter.draw_frame()?;
                for (slot, job) in &self.labels {
                    self.painter.draw_assigned(*slot, job)?;
                }
                if let Some(snapshot) = &self.last {
                    self.painter.draw_progress(snapshot)?;
                }
            }
        }
        Ok(())
    }

    /// Consume events until every sender is gone, then hand the renderer
    /// back so the caller can print the closing report.
    pub fn run_blocking(mut self, mut rx: mpsc::UnboundedReceiver<DisplayEvent>) -> Self {
        while let Some(event) = rx.blocking_recv() {
            if let Err(e) = self.handle(event) {
                tracing::warn!(error = %e, "Failed to draw progress");
            }
        }
        self
    }

    pub fn painter_mut(&mut self) -> &mut Painter<W> {
        &mut self.painter
    }

    pub fn into_painter(self) -> Painter<W> {
        self.painter
    }
}

/// Keeps the cursor hidden while alive and shows it again on drop.
pub struct TerminalGuard {
    _private: (),
}

impl TerminalGuard {
    pub fn hide() -> io::Result<Self> {
        execute!(io::stdout(), crossterm::cursor::Hide)?;
        Ok(Self { _private: () })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), Show);
    }
}

/// Leave the terminal usable before an abrupt exit: clear the screen,
/// home the cursor and make it visible.
pub fn restore_terminal() {
    let _ = execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0), Show);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RunConfig;

    fn renderer() -> Renderer<Vec<u8>> {
        let config = RunConfig::default().with_workers(2);
        Renderer::new(Painter::new(Vec::new(), &config))
    }

    fn output(renderer: Renderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.into_painter().into_inner()).unwrap()
    }

    #[test]
    fn redraw_repaints_labels_and_progress() {
        let mut r = renderer();
        r.handle(DisplayEvent::Assigned {
            slot: 1,
            job: "alpha".into(),
        })
        .unwrap();
        let mut snapshot = RunSnapshot::new(4);
        snapshot.succeeded = 1;
        r.handle(DisplayEvent::Progress(snapshot)).unwrap();
        r.handle(DisplayEvent::Redraw).unwrap();

        let out = output(r);
        assert_eq!(out.matches("Working on task alpha").count(), 2);
        assert_eq!(out.matches(" 1/4 done ").count(), 2);
        assert_eq!(out.matches('┌').count(), 1);
    }

    #[test]
    fn run_blocking_drains_channel() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(DisplayEvent::Assigned {
            slot: 2,
            job: "beta".into(),
        })
        .unwrap();
        drop(tx);

        let out = output(renderer().run_blocking(rx));
        assert!(out.contains("Working on task beta"));
    }
}
