//! # Mapping Steps
//!
//! Static templates for the controls the user is asked to press, built from
//! the standard gamepad layout name tables.
//!
//! | Index | Button | | Index | Axis |
//! |-------|--------|-|-------|------|
//! | 0 | A | | 0 | Left Analog Stick Horizontal |
//! | 1 | B | | 1 | Left Analog Stick Vertical |
//! | 2 | X | | 2 | Right Analog Stick Horizontal |
//! | 3 | Y | | 3 | Right Analog Stick Vertical |
//! | 4-5 | Left/Right Shoulder | | | |
//! | 6-7 | Left/Right Trigger | | | |
//! | 8-9 | Select / Back, Start / Forward | | | |
//! | 10-11 | Left/Right stick press | | | |
//! | 12-15 | DPad Up/Down/Left/Right | | | |
//! | 16 | Logo Button | | | |

use serde::{Deserialize, Serialize};

/// Display names of the logical buttons, indexed by standard button slot.
pub const BUTTON_NAMES: [&str; 17] = [
    "A",
    "B",
    "X",
    "Y",
    "Left Shoulder",
    "Right Shoulder",
    "Left Trigger",
    "Right Trigger",
    "Select / Back",
    "Start / Forward",
    "Press Left Analog Stick",
    "Press Right Analog Stick",
    "DPad Up",
    "DPad Down",
    "DPad Left",
    "DPad Right",
    "Logo Button",
];

/// Display names of the logical axes, indexed by standard axis slot.
pub const AXIS_NAMES: [&str; 4] = [
    "Left Analog Stick Horizontal",
    "Left Analog Stick Vertical",
    "Right Analog Stick Horizontal",
    "Right Analog Stick Vertical",
];

/// Kind of logical slot a step assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepTarget {
    /// A digital button slot.
    Button,
    /// An analog axis slot.
    Axis,
}

/// One logical control to be assigned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingStep {
    /// Human-readable name shown in "Press ..." instructions.
    pub name: String,
    /// Whether this step fills a button or an axis slot.
    pub target: StepTarget,
    /// Logical slot index within the target's table.
    pub index: usize,
}

impl MappingStep {
    /// Creates a button step.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_mapper::mapping::step::{MappingStep, StepTarget};
    ///
    /// let step = MappingStep::button(0, "A");
    /// assert_eq!(step.target, StepTarget::Button);
    /// assert_eq!(step.name, "A");
    /// ```
    #[must_use]
    pub fn button(index: usize, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: StepTarget::Button,
            index,
        }
    }

    /// Creates an axis step.
    #[must_use]
    pub fn axis(index: usize, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: StepTarget::Axis,
            index,
        }
    }
}

/// Builds the full standard step sequence: every button, then every axis.
///
/// # Examples
///
/// ```
/// use gamepad_mapper::mapping::step::default_steps;
///
/// let steps = default_steps();
/// assert_eq!(steps.len(), 21);
/// assert_eq!(steps[0].name, "Button A");
/// assert_eq!(steps[17].name, "Axis Left Analog Stick Horizontal");
/// ```
#[must_use]
pub fn default_steps() -> Vec<MappingStep> {
    let buttons = BUTTON_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| MappingStep::button(index, format!("Button {}", name)));
    let axes = AXIS_NAMES
        .iter()
        .enumerate()
        .map(|(index, name)| MappingStep::axis(index, format!("Axis {}", name)));

    buttons.chain(axes).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_steps_order() {
        let steps = default_steps();

        assert_eq!(steps.len(), BUTTON_NAMES.len() + AXIS_NAMES.len());

        // Buttons come first, in slot order
        for (i, step) in steps.iter().take(BUTTON_NAMES.len()).enumerate() {
            assert_eq!(step.target, StepTarget::Button);
            assert_eq!(step.index, i);
        }

        // Then axes
        for (i, step) in steps.iter().skip(BUTTON_NAMES.len()).enumerate() {
            assert_eq!(step.target, StepTarget::Axis);
            assert_eq!(step.index, i);
        }
    }

    #[test]
    fn test_step_names_are_prefixed() {
        let steps = default_steps();
        assert_eq!(steps[16].name, "Button Logo Button");
        assert_eq!(steps[20].name, "Axis Right Analog Stick Vertical");
    }

    #[test]
    fn test_step_target_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&StepTarget::Button).unwrap(), "\"button\"");
        assert_eq!(serde_json::to_string(&StepTarget::Axis).unwrap(), "\"axis\"");
    }
}
