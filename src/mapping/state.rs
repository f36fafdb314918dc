//! # Mapping State Machine
//!
//! Tracks progress through the ordered [`MappingStep`] list.
//!
//! ## States
//!
//! - **In progress**: `current_step < len`. The step at `current_step` is the
//!   one the user is asked to press.
//! - **Done**: `current_step == len`.
//!
//! While in progress the `wait_to_clear` flag gates new assignments: after a
//! control is recorded (or the device reconnects) every control must return
//! to neutral before the next one is accepted.
//!
//! Every transition sets the `dirty` flag so the view knows to redraw.
//!
//! ## Usage
//!
//! ```
//! use gamepad_mapper::mapping::control::ActiveControl;
//! use gamepad_mapper::mapping::state::MappingState;
//! use gamepad_mapper::mapping::step::MappingStep;
//!
//! let mut state = MappingState::new(vec![
//!     MappingStep::button(0, "A"),
//!     MappingStep::axis(0, "Stick"),
//! ]);
//!
//! state.gamepad_cleared();
//! state.set_current_step_mapping(ActiveControl::Button(0))?;
//! assert_eq!(state.current_step(), 1);
//! assert!(state.wait_to_clear());
//! # Ok::<(), gamepad_mapper::error::MapperError>(())
//! ```

use std::fmt::{self, Write as _};

use tracing::debug;

use super::control::ActiveControl;
use super::step::MappingStep;
use crate::error::{MapperError, Result};

/// A step template together with its observed assignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepMapping {
    /// The step being assigned.
    pub step: MappingStep,
    /// The physical control recorded for it, if any.
    pub maps_to: Option<ActiveControl>,
}

/// `name: assignment`, or `name:` while unassigned.
impl fmt::Display for StepMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.step.name)?;
        if let Some(control) = &self.maps_to {
            write!(f, " {}", control)?;
        }
        Ok(())
    }
}

/// The step state machine.
///
/// Pure data plus transitions; never touches a device or the display.
#[derive(Debug, Clone)]
pub struct MappingState {
    mappings: Vec<StepMapping>,
    current_step: usize,
    dirty: bool,
    wait_to_clear: bool,
}

impl MappingState {
    /// Creates the state from step templates, already reset.
    #[must_use]
    pub fn new(steps: Vec<MappingStep>) -> Self {
        let mappings = steps
            .into_iter()
            .map(|step| StepMapping {
                step,
                maps_to: None,
            })
            .collect();

        let mut state = Self {
            mappings,
            current_step: 0,
            dirty: true,
            wait_to_clear: true,
        };
        state.reset();
        state
    }

    /// Clears every result and returns to the first step.
    ///
    /// Always succeeds; calling it twice is the same as calling it once.
    pub fn reset(&mut self) {
        for mapping in &mut self.mappings {
            mapping.maps_to = None;
        }
        self.current_step = 0;
        self.wait_to_clear = true;
        self.dirty = true;
    }

    /// Advances past the current step without recording anything.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidState`] if already done.
    pub fn skip(&mut self) -> Result<()> {
        self.expect_not_done()?;
        debug!("Skipping step {}", self.current_step);
        self.current_step += 1;
        self.dirty = true;
        Ok(())
    }

    /// Steps back one, stopping at the first step.
    ///
    /// The previous result is kept until that step is assigned again.
    pub fn back(&mut self) {
        self.current_step = self.current_step.saturating_sub(1);
        self.dirty = true;
    }

    /// Marks the device as neutral so the next control can be accepted.
    pub fn gamepad_cleared(&mut self) {
        self.wait_to_clear = false;
        self.dirty = true;
    }

    /// Jumps straight to the done state.
    pub fn done(&mut self) {
        self.current_step = self.mappings.len();
        self.dirty = true;
    }

    /// Returns `true` once every step has been assigned, skipped or finished.
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.current_step >= self.mappings.len()
    }

    /// Records `observed` for the current step and advances.
    ///
    /// Re-arms `wait_to_clear` so the same press is not taken for the next step.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidState`] if already done.
    pub fn set_current_step_mapping(&mut self, observed: ActiveControl) -> Result<()> {
        self.expect_not_done()?;
        let mapping = &mut self.mappings[self.current_step];
        debug!("Mapped '{}' to {}", mapping.step.name, observed);
        mapping.maps_to = Some(observed);
        self.current_step += 1;
        self.dirty = true;
        self.wait_to_clear = true;
        Ok(())
    }

    /// Returns the name of the step waiting for input.
    ///
    /// # Errors
    ///
    /// Returns [`MapperError::InvalidState`] if already done.
    pub fn current_step_name(&self) -> Result<&str> {
        self.expect_not_done()?;
        Ok(&self.mappings[self.current_step].step.name)
    }

    /// Index of the step waiting for input (`len` when done).
    #[must_use]
    pub fn current_step(&self) -> usize {
        self.current_step
    }

    /// Whether the device must return to neutral before the next assignment.
    #[must_use]
    pub fn wait_to_clear(&self) -> bool {
        self.wait_to_clear
    }

    /// Whether a redraw has been requested since the last [`take_dirty`](Self::take_dirty).
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Returns the dirty flag and clears it.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// All steps with their current results, in order.
    #[must_use]
    pub fn mappings(&self) -> &[StepMapping] {
        &self.mappings
    }

    /// Number of steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns `true` if there are no steps at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Renders one [`StepMapping`] line per step.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_mapper::mapping::control::ActiveControl;
    /// use gamepad_mapper::mapping::state::MappingState;
    /// use gamepad_mapper::mapping::step::MappingStep;
    ///
    /// let mut state = MappingState::new(vec![
    ///     MappingStep::button(0, "A"),
    ///     MappingStep::button(1, "B"),
    /// ]);
    /// state.gamepad_cleared();
    /// state.set_current_step_mapping(ActiveControl::Button(2)).unwrap();
    ///
    /// assert_eq!(state.human_readable_mapping(), "A: Button 2\nB:\n");
    /// ```
    #[must_use]
    pub fn human_readable_mapping(&self) -> String {
        let mut out = String::new();
        for mapping in &self.mappings {
            let _ = writeln!(out, "{}", mapping);
        }
        out
    }

    fn expect_not_done(&self) -> Result<()> {
        if self.is_done() {
            return Err(MapperError::InvalidState);
        }
        Ok(())
    }
}
