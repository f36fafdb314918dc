//! # Active Control Detection
//!
//! An [`ActiveControl`] is the physical control observed during one poll:
//! either a pressed button or an axis deflected past the threshold.
//!
//! ## Detection Order
//!
//! Only one control is reported per poll, chosen deterministically:
//!
//! 1. Buttons by ascending index; the first pressed button wins.
//! 2. Axes by ascending index; for each axis `value > threshold` is checked
//!    before `value < -threshold`.
//!
//! ## Wire Form
//!
//! In exports a control serializes as `{"button": 3}` or `{"axis": "0+"}`.

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Deflection beyond which an axis counts as intentionally moved.
pub const DEFAULT_AXIS_THRESHOLD: f32 = 0.8;

/// Direction of an axis deflection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AxisDirection {
    /// Deflected towards +1.0.
    Positive,
    /// Deflected towards -1.0.
    Negative,
}

impl AxisDirection {
    /// Returns the sign character used in axis labels (`+` or `-`).
    #[must_use]
    pub fn sign(self) -> char {
        match self {
            AxisDirection::Positive => '+',
            AxisDirection::Negative => '-',
        }
    }
}

/// A physical control observed on the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActiveControl {
    /// Raw button index.
    Button(usize),
    /// Raw axis index and the direction it was pushed.
    Axis {
        /// Raw axis index.
        index: usize,
        /// Deflection direction.
        direction: AxisDirection,
    },
}

impl ActiveControl {
    /// Shorthand for a positive axis deflection.
    #[must_use]
    pub fn axis_positive(index: usize) -> Self {
        ActiveControl::Axis {
            index,
            direction: AxisDirection::Positive,
        }
    }

    /// Shorthand for a negative axis deflection.
    #[must_use]
    pub fn axis_negative(index: usize) -> Self {
        ActiveControl::Axis {
            index,
            direction: AxisDirection::Negative,
        }
    }

    /// Returns the axis label (`"0+"`, `"3-"`), or `None` for buttons.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_mapper::mapping::control::ActiveControl;
    ///
    /// assert_eq!(ActiveControl::axis_negative(3).axis_label().as_deref(), Some("3-"));
    /// assert_eq!(ActiveControl::Button(1).axis_label(), None);
    /// ```
    #[must_use]
    pub fn axis_label(&self) -> Option<String> {
        match self {
            ActiveControl::Button(_) => None,
            ActiveControl::Axis { index, direction } => {
                Some(format!("{}{}", index, direction.sign()))
            }
        }
    }
}

impl fmt::Display for ActiveControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveControl::Button(index) => write!(f, "Button {}", index),
            ActiveControl::Axis { index, direction } => {
                write!(f, "Axis {}{}", index, direction.sign())
            }
        }
    }
}

/// Error returned when an axis label is not `<index><+|->`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseAxisLabelError(String);

impl fmt::Display for ParseAxisLabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid axis label '{}', expected e.g. \"0+\"", self.0)
    }
}

impl std::error::Error for ParseAxisLabelError {}

impl FromStr for ActiveControl {
    type Err = ParseAxisLabelError;

    /// Parses an axis label such as `"2-"`.
    fn from_str(label: &str) -> Result<Self, Self::Err> {
        let err = || ParseAxisLabelError(label.to_string());

        let direction = match label.chars().last() {
            Some('+') => AxisDirection::Positive,
            Some('-') => AxisDirection::Negative,
            _ => return Err(err()),
        };
        let index = label[..label.len() - 1].parse().map_err(|_| err())?;

        Ok(ActiveControl::Axis { index, direction })
    }
}

impl Serialize for ActiveControl {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            ActiveControl::Button(index) => map.serialize_entry("button", index)?,
            ActiveControl::Axis { .. } => map.serialize_entry("axis", &self.axis_label())?,
        }
        map.end()
    }
}

/// Loose shape of a control object as found in exports.
///
/// Both keys absent means "not assigned".
#[derive(Debug, Default, Deserialize)]
pub(crate) struct RawControl {
    button: Option<usize>,
    axis: Option<String>,
}

impl RawControl {
    pub(crate) fn into_control(self) -> Result<Option<ActiveControl>, String> {
        match (self.button, self.axis) {
            (None, None) => Ok(None),
            (Some(index), None) => Ok(Some(ActiveControl::Button(index))),
            (None, Some(label)) => label
                .parse()
                .map(Some)
                .map_err(|e: ParseAxisLabelError| e.to_string()),
            (Some(_), Some(_)) => Err("control has both 'button' and 'axis'".to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for ActiveControl {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        RawControl::deserialize(deserializer)?
            .into_control()
            .map_err(de::Error::custom)?
            .ok_or_else(|| de::Error::custom("expected 'button' or 'axis'"))
    }
}

/// Finds the first active control in a device reading.
///
/// # Arguments
///
/// * `buttons` - Pressed state per raw button index
/// * `axes` - Normalized axis values (-1.0 to 1.0) per raw axis index
/// * `threshold` - Deflection magnitude an axis must exceed
///
/// # Examples
///
/// ```
/// use gamepad_mapper::mapping::control::{detect_active_control, ActiveControl};
///
/// let buttons = [false, false, false, true];
/// let axes = [0.95, 0.0];
///
/// // Buttons are checked before axes
/// assert_eq!(
///     detect_active_control(&buttons, &axes, 0.8),
///     Some(ActiveControl::Button(3))
/// );
///
/// // Nothing active
/// assert_eq!(detect_active_control(&[false], &[0.5], 0.8), None);
/// ```
#[must_use]
pub fn detect_active_control(
    buttons: &[bool],
    axes: &[f32],
    threshold: f32,
) -> Option<ActiveControl> {
    if let Some(index) = buttons.iter().position(|&pressed| pressed) {
        return Some(ActiveControl::Button(index));
    }

    axes.iter().enumerate().find_map(|(index, &value)| {
        if value > threshold {
            Some(ActiveControl::axis_positive(index))
        } else if value < -threshold {
            Some(ActiveControl::axis_negative(index))
        } else {
            None
        }
    })
}
