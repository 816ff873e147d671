//! Line-oriented volley recorder behind `quiver record`.

use std::{
    fmt,
    io::{self, BufRead, Write},
};

use quiver_core::{Clock, CommitError, RecordSink, ShootingSession, Shot};

use crate::capture::{parse_pair, target_shot, CanvasGeometry, CaptureError};

/// How typed coordinates are interpreted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputMode {
    /// Target units, radius 10 = outer ring.
    Target,
    /// Canvas pixels, origin top-left.
    Canvas(CanvasGeometry),
}

impl InputMode {
    fn shot(&self, line: &str) -> Result<Shot, CaptureError> {
        let (a, b) = parse_pair(line)?;
        match self {
            InputMode::Target => target_shot(a, b),
            InputMode::Canvas(canvas) => canvas.to_shot(a, b),
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RecorderOutcome {
    pub volleys_saved: u32,
    pub arrows_saved: usize,
    /// Arrows still pending when input ended.
    pub arrows_discarded: usize,
}

/// Drive `session` from `input` until `quit` or end of input.
///
/// Rejected shots and failed saves are reported on `out` and the loop keeps
/// going; only I/O errors on `input`/`out` end it early.
pub fn run_recorder<R, W, C, S>(
    input: R,
    out: &mut W,
    session: &mut ShootingSession,
    mode: InputMode,
    clock: &C,
    sink: &mut S,
) -> io::Result<RecorderOutcome>
where
    R: BufRead,
    W: Write,
    C: Clock + ?Sized,
    S: RecordSink + ?Sized,
    S::Error: fmt::Display,
{
    let mut outcome = RecorderOutcome::default();

    writeln!(
        out,
        "🏹 Session {} at {} m, {} arrows per volley",
        session.session_id(),
        session.distance(),
        session.volley().capacity()
    )?;
    print_help(out, mode)?;

    for line in input.lines() {
        let line = line?;
        let command = line.trim();

        match command.to_lowercase().as_str() {
            "" => continue,
            "help" | "?" => print_help(out, mode)?,
            "status" => print_status(out, session)?,
            "save" => match session.commit_into(clock, sink) {
                Ok(records) => {
                    let scores: Vec<String> = records.iter().map(|r| r.score.to_string()).collect();
                    let total: u32 = records.iter().map(|r| u32::from(r.score)).sum();
                    writeln!(
                        out,
                        "✅ Volley {} saved: {} (total {})",
                        records[0].volley_number,
                        scores.join(" "),
                        total
                    )?;
                    outcome.volleys_saved += 1;
                    outcome.arrows_saved += records.len();
                }
                Err(CommitError::Volley(e)) => writeln!(out, "⚠️  {e}")?,
                Err(CommitError::Sink(e)) => {
                    tracing::error!("failed to save volley: {}", e);
                    writeln!(
                        out,
                        "❌ Failed to save volley: {e}. Arrows kept, try 'save' again."
                    )?;
                }
            },
            "quit" | "exit" | "q" => break,
            _ => match mode.shot(command) {
                Ok(shot) => match session.add(shot) {
                    Ok(()) => writeln!(
                        out,
                        "🎯 Arrow {}: ({}, {}) scores {}, {} left",
                        session.volley().pending_count(),
                        shot.x,
                        shot.y,
                        shot.score(),
                        session.remaining()
                    )?,
                    Err(e) => {
                        tracing::warn!("shot rejected: {}", e);
                        writeln!(out, "⚠️  {e}. Type 'save' to record the volley.")?;
                    }
                },
                Err(e) => writeln!(out, "⚠️  {e}")?,
            },
        }
    }

    let pending = session.volley().pending_count();
    if pending > 0 {
        writeln!(out, "⚠️  {pending} arrow(s) were not saved")?;
        outcome.arrows_discarded = pending;
    }

    Ok(outcome)
}

fn print_help<W: Write>(out: &mut W, mode: InputMode) -> io::Result<()> {
    match mode {
        InputMode::Target => writeln!(out, "  <x> <y>   add an arrow (target units, -10..10)")?,
        InputMode::Canvas(canvas) => writeln!(
            out,
            "  <px> <py> add an arrow (canvas pixels, 0..{})",
            canvas.size_px
        )?,
    }
    writeln!(out, "  status    show the current volley")?;
    writeln!(out, "  save      save the volley to the log")?;
    writeln!(out, "  quit      leave")
}

fn print_status<W: Write>(out: &mut W, session: &ShootingSession) -> io::Result<()> {
    let volley = session.volley();
    writeln!(
        out,
        "📋 Volley {}: {}/{} arrows, {} left",
        session.volley_number(),
        volley.pending_count(),
        volley.capacity(),
        volley.remaining()
    )?;
    for (idx, (shot, score)) in volley.scored().enumerate() {
        writeln!(out, "  {}. ({}, {}) -> {}", idx + 1, shot.x, shot.y, score)?;
    }
    if !volley.is_empty() {
        writeln!(out, "  total {}", volley.total())?;
    }
    Ok(())
}
