//! # Device Module
//!
//! Gamepad input for the mapping loop.
//!
//! This module handles:
//! - The [`InputSource`] seam the poll loop samples once per tick
//! - Per-poll [`DeviceSnapshot`]s with ordered buttons and normalized axes
//! - Device identity, so reconnects and swaps can be told apart
//! - The evdev backend in [`gamepad`]

pub mod gamepad;

use crate::mapping::control::{detect_active_control, ActiveControl};

/// Identity of a connected device.
///
/// Two snapshots with equal identity come from the same connection.
/// `session` is bumped on every (re)open, so unplugging and replugging the
/// same pad yields a different identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    /// Human-readable id, e.g. `"Wireless Controller (Vendor: 054c Product: 0ce6)"`.
    pub id: String,
    /// Connection counter assigned by the input source.
    pub session: u64,
}

/// State of every button and axis at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceSnapshot {
    /// Which connection this reading came from.
    pub identity: DeviceIdentity,
    /// Pressed state per raw button index.
    pub buttons: Vec<bool>,
    /// Axis values per raw axis index, normalized to -1.0..=1.0.
    pub axes: Vec<f32>,
}

impl DeviceSnapshot {
    /// Returns the first active control, buttons before axes.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_mapper::device::{DeviceIdentity, DeviceSnapshot};
    /// use gamepad_mapper::mapping::control::ActiveControl;
    ///
    /// let snapshot = DeviceSnapshot {
    ///     identity: DeviceIdentity { id: "pad".into(), session: 1 },
    ///     buttons: vec![false, false],
    ///     axes: vec![0.0, -0.9],
    /// };
    /// assert_eq!(snapshot.active_control(0.8), Some(ActiveControl::axis_negative(1)));
    /// ```
    #[must_use]
    pub fn active_control(&self, threshold: f32) -> Option<ActiveControl> {
        detect_active_control(&self.buttons, &self.axes, threshold)
    }

    /// Returns `true` when no button is pressed and every axis is within the threshold.
    #[must_use]
    pub fn is_neutral(&self, threshold: f32) -> bool {
        self.active_control(threshold).is_none()
    }
}

/// Something the poll loop can sample.
///
/// Implementations must not block: `poll` is called on every tick.
#[cfg_attr(test, mockall::automock)]
pub trait InputSource {
    /// Returns the current reading, or `None` when no device is connected.
    fn poll(&mut self) -> Option<DeviceSnapshot>;
}
