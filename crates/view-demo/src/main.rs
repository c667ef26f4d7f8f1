//! Minimal terminal driver for the view engine: open a file (or start
//! empty), paint the grid every frame, and accept a handful of motion keys.
//! Everything beyond "drive the view and paint its grid" — command mode,
//! editing, undo — is out of scope here.

use std::io::{Stdout, Write, stdout};
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::{queue, style};
use tracing_appender::non_blocking::WorkerGuard;

use core_syntax::StyleSlot;
use core_terminal::{CrosstermBackend, TerminalBackend};
use core_text::{RopeBuffer, TextSource};
use core_view::{CellFlags, UiBackend, View, ViewOptions};

#[derive(Parser, Debug)]
#[command(name = "view-demo", about = "View engine driver")]
struct Args {
    /// Optional path to open at startup (UTF-8 text). A scratch buffer is
    /// used when omitted.
    path: Option<PathBuf>,
}

/// A near-empty [`UiBackend`]: it only gets notified that a draw happened
/// and what styles are in play. Painting the grid onto the real terminal is
/// this binary's job, done after each draw by reading [`View::grid`].
struct NotifyingUi {
    style_specs: Vec<(StyleSlot, String)>,
}

impl NotifyingUi {
    fn new() -> Self {
        Self {
            style_specs: Vec::new(),
        }
    }
}

impl UiBackend for NotifyingUi {
    fn draw_text(&mut self, topline: usize) {
        tracing::trace!(target: "view_demo.ui", topline, "draw_text");
    }

    fn syntax_style(&mut self, slot: StyleSlot, spec: &str) {
        tracing::debug!(target: "view_demo.ui", slot = slot.0, spec, "syntax_style");
        self.style_specs.push((slot, spec.to_string()));
    }
}

fn configure_logging() -> Option<WorkerGuard> {
    let log_path = std::path::Path::new(".");
    let appender = tracing_appender::rolling::never(log_path, "view-demo.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(writer)
        .try_init()
        .ok()?;
    Some(guard)
}

/// Paint every row of the grid, using reverse video for cursor/selected
/// cells. Continuation cells (`len == 0`) are skipped; their leading cell
/// already wrote the full glyph.
fn paint(view: &View<RopeBuffer, NotifyingUi>, out: &mut Stdout) -> Result<()> {
    use crossterm::cursor::MoveTo;
    use crossterm::terminal::Clear;
    use crossterm::terminal::ClearType;

    queue!(out, Clear(ClearType::All))?;
    let grid = view.grid();
    for row in 0..grid.height() {
        queue!(out, MoveTo(0, row as u16))?;
        for cell in grid.row(row) {
            if cell.len == 0 && cell.width == 0 {
                continue;
            }
            let glyph = cell.as_char().unwrap_or(' ');
            let reverse = cell.flags.contains(CellFlags::CURSOR)
                || cell.flags.contains(CellFlags::SELECTED);
            if reverse {
                queue!(out, style::SetAttribute(style::Attribute::Reverse))?;
            }
            queue!(out, style::Print(glyph))?;
            if reverse {
                queue!(out, style::SetAttribute(style::Attribute::Reset))?;
            }
        }
    }
    out.flush()?;
    Ok(())
}

fn open_buffer(args: &Args) -> RopeBuffer {
    match &args.path {
        Some(path) => match RopeBuffer::from_path(path) {
            Ok(buf) => buf,
            Err(err) => {
                tracing::warn!(target: "view_demo", ?err, "open_failed, starting empty");
                RopeBuffer::from_str("untitled", "")
            }
        },
        None => RopeBuffer::from_str("untitled", ""),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let _log_guard = configure_logging();

    let mut backend = CrosstermBackend::new();
    let _guard = backend.enter_guard()?;

    let buffer = open_buffer(&args);
    let mut view = View::new(buffer, NotifyingUi::new(), ViewOptions::default());
    let (w, h) = crossterm::terminal::size()?;
    view.resize(w as usize, h as usize);

    let mut out = stdout();
    paint(&view, &mut out)?;

    let cidx = view.cursors().primary();
    loop {
        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let event = event::read()?;
        let key = match event {
            Event::Resize(w, h) => {
                view.resize(w as usize, h as usize);
                paint(&view, &mut out)?;
                continue;
            }
            Event::Key(key) => key,
            _ => continue,
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            break;
        }
        match key.code {
            KeyCode::Char('q') => break,
            KeyCode::Left => {
                let pos = view.cursors().get(cidx).map(|c| c.pos).unwrap_or(0);
                let target = view.text().char_prev(pos);
                view.cursors_to(cidx, target);
            }
            KeyCode::Right => {
                let pos = view.cursors().get(cidx).map(|c| c.pos).unwrap_or(0);
                let target = view.text().char_next(pos);
                view.cursors_to(cidx, target);
            }
            KeyCode::Down => {
                view.line_down(cidx);
            }
            KeyCode::Up => {
                view.line_up(cidx);
            }
            _ => continue,
        }
        paint(&view, &mut out)?;
    }

    Ok(())
}
