//! # Terminal Display
//!
//! Plain-text rendering of the [`ViewModel`] and line-based action input.
//!
//! Each frame is written as a block:
//!
//! ```text
//! Device: Wireless Controller (Vendor: 054c Product: 0ce6)
//! > Press Button B
//!   Button A: Button 0
//!   Button B:
//!   ...
//! Actions: [s]kip [b]ack [r]eset [d]one [q]uit
//! ```
//!
//! Once done, the export JSON follows the rows.

use std::io::{BufRead, Write};
use std::thread;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::{ActionAvailability, MappingDisplay, UserAction, ViewModel};
use crate::error::Result;

/// Parses one line of user input into an action.
///
/// # Examples
///
/// ```
/// use gamepad_mapper::view::terminal::parse_action;
/// use gamepad_mapper::view::UserAction;
///
/// assert_eq!(parse_action("s"), Some(UserAction::Skip));
/// assert_eq!(parse_action(" Finish \n"), Some(UserAction::Done));
/// assert_eq!(parse_action("jump"), None);
/// ```
#[must_use]
pub fn parse_action(line: &str) -> Option<UserAction> {
    match line.trim().to_ascii_lowercase().as_str() {
        "s" | "skip" => Some(UserAction::Skip),
        "r" | "reset" => Some(UserAction::Reset),
        "b" | "back" => Some(UserAction::Back),
        "d" | "done" | "finish" => Some(UserAction::Done),
        "q" | "quit" | "exit" => Some(UserAction::Quit),
        _ => None,
    }
}

/// Reads actions from stdin, one per line, on a dedicated thread.
///
/// Blocking reads keep the async runtime free to shut down. EOF sends
/// [`UserAction::Quit`]; the thread ends once the receiver is dropped.
pub fn spawn_stdin_actions(tx: mpsc::Sender<UserAction>) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    warn!("Failed to read stdin: {}", e);
                    return;
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            match parse_action(&line) {
                Some(action) => {
                    if tx.blocking_send(action).is_err() {
                        return;
                    }
                }
                None => warn!("Unknown action '{}'", line.trim()),
            }
        }

        debug!("stdin closed");
        let _ = tx.blocking_send(UserAction::Quit);
    })
}

fn action_hint(actions: &ActionAvailability) -> String {
    let mut hint = String::from("Actions:");
    for (enabled, label) in [
        (actions.skip, "[s]kip"),
        (actions.back, "[b]ack"),
        (actions.reset, "[r]eset"),
        (actions.done, "[d]one"),
    ] {
        if enabled {
            hint.push(' ');
            hint.push_str(label);
        }
    }
    hint.push_str(" [q]uit");
    hint
}

/// Writes frames to any [`Write`] sink, usually stdout.
#[derive(Debug)]
pub struct TerminalDisplay<W> {
    out: W,
}

impl TerminalDisplay<std::io::Stdout> {
    /// Display on stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> TerminalDisplay<W> {
    /// Display on `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Consumes the display and returns the sink.
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MappingDisplay for TerminalDisplay<W> {
    fn render(&mut self, view: &ViewModel) -> Result<()> {
        let out = &mut self.out;

        writeln!(out)?;
        writeln!(out, "Device: {}", view.connection)?;
        if !view.instruction.is_empty() {
            writeln!(out, "> {}", view.instruction)?;
        }

        for row in &view.rows {
            writeln!(out, "  {}", row)?;
        }

        if let Some(export) = &view.export {
            writeln!(out, "{}", export.to_json_pretty()?)?;
        }

        writeln!(out, "{}", action_hint(&view.actions))?;
        out.flush()?;
        Ok(())
    }
}
