//! # evdev Gamepad Backend
//!
//! Reads gamepad state through the Linux evdev interface.
//!
//! ## Device Detection
//!
//! Without a configured path, all `/dev/input/event*` nodes are scanned in
//! sorted order and the first one that reports `BTN_SOUTH` (gamepads) or
//! `BTN_TRIGGER` (joysticks) is used.
//!
//! ## Raw Layout
//!
//! The mapping flow needs the device's own layout, not a remapped one:
//!
//! - Buttons: every supported key with code `>= BTN_MISC`, ascending code.
//! - Axes: every supported absolute axis from `ABS_X` to `ABS_HAT3Y`,
//!   ascending code. Values are scaled from the device's `[min, max]` to
//!   `[-1, 1]`. An axis resting at its minimum when the device is opened
//!   (an analog trigger) is scaled to `[0, 1]` instead, so it reads as
//!   neutral when released.
//!
//! ## Reconnects
//!
//! State is sampled with `EVIOCGKEY`/`EVIOCGABS` on every poll. A failing read
//! means the device is gone; the source then reports no device and rescans
//! at most once per rescan interval.

use evdev::{AbsoluteAxisType, Device, Key};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use super::{DeviceIdentity, DeviceSnapshot, InputSource};
use crate::error::{MapperError, Result};

/// Lowest key code treated as a gamepad button (`BTN_MISC`).
const FIRST_BUTTON_CODE: u16 = 0x100;

/// Highest absolute axis code treated as a gamepad axis (`ABS_HAT3Y`).
const LAST_AXIS_CODE: u16 = 0x17;

/// Directory holding evdev nodes.
const INPUT_DIR: &str = "/dev/input";

/// Scales a raw axis reading to `[-1, 1]`, or `[0, 1]` for unipolar axes.
///
/// Out-of-range readings are clamped. A degenerate range reads as 0.
///
/// # Examples
///
/// ```
/// use gamepad_mapper::device::gamepad::normalize_axis;
///
/// assert_eq!(normalize_axis(0, 0, 255, false), -1.0);
/// assert_eq!(normalize_axis(255, 0, 255, false), 1.0);
/// assert_eq!(normalize_axis(-1, -1, 1, false), -1.0);
/// assert_eq!(normalize_axis(0, 0, 255, true), 0.0);
/// ```
#[must_use]
pub fn normalize_axis(value: i32, min: i32, max: i32, unipolar: bool) -> f32 {
    if max <= min {
        return 0.0;
    }

    let span = (max as f32) - (min as f32);
    let fraction = ((value.clamp(min, max) as f32) - (min as f32)) / span;

    if unipolar {
        fraction
    } else {
        fraction * 2.0 - 1.0
    }
}

/// Builds the human-readable device id.
///
/// # Examples
///
/// ```
/// use gamepad_mapper::device::gamepad::format_device_id;
///
/// assert_eq!(
///     format_device_id(Some("Wireless Controller"), 0x054c, 0x0ce6),
///     "Wireless Controller (Vendor: 054c Product: 0ce6)"
/// );
/// ```
#[must_use]
pub fn format_device_id(name: Option<&str>, vendor: u16, product: u16) -> String {
    format!(
        "{} (Vendor: {:04x} Product: {:04x})",
        name.unwrap_or("Unknown Gamepad"),
        vendor,
        product
    )
}

/// A gamepad found during a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GamepadInfo {
    /// evdev node, e.g. `/dev/input/event5`.
    pub path: PathBuf,
    /// Device id as used in exports.
    pub id: String,
}

/// Lists every gamepad the auto-detection would consider.
///
/// # Errors
///
/// Returns `Controller` if `/dev/input` cannot be read.
pub fn list_gamepads() -> Result<Vec<GamepadInfo>> {
    Ok(scan_event_devices()?
        .into_iter()
        .filter(|(_, device)| is_gamepad(device))
        .map(|(path, device)| GamepadInfo {
            id: device_id(&device),
            path,
        })
        .collect())
}

fn is_event_node(path: &Path) -> bool {
    path.file_name()
        .map(|name| name.to_string_lossy().starts_with("event"))
        .unwrap_or(false)
}

fn is_gamepad(device: &Device) -> bool {
    device
        .supported_keys()
        .map(|keys| keys.contains(Key::BTN_SOUTH) || keys.contains(Key::BTN_TRIGGER))
        .unwrap_or(false)
}

fn device_id(device: &Device) -> String {
    let id = device.input_id();
    format_device_id(device.name(), id.vendor(), id.product())
}

/// Opens every readable `/dev/input/event*` node, sorted by path.
fn scan_event_devices() -> Result<Vec<(PathBuf, Device)>> {
    let input_dir = Path::new(INPUT_DIR);

    if !input_dir.exists() {
        return Err(MapperError::Controller(format!(
            "{} directory not found",
            INPUT_DIR
        )));
    }

    let mut paths: Vec<PathBuf> = std::fs::read_dir(input_dir)
        .map_err(|e| MapperError::Controller(format!("Failed to read {}: {}", INPUT_DIR, e)))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| MapperError::Controller(format!("Failed to read directory entry: {}", e)))?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|path| is_event_node(path))
        .collect();

    // Deterministic choice when several pads are connected
    paths.sort();

    let mut devices = Vec::new();
    for path in paths {
        match Device::open(&path) {
            Ok(device) => {
                debug!("Found input device: {} ({})", path.display(), device_id(&device));
                devices.push((path, device));
            }
            Err(e) => {
                // Permission denied or other errors - skip device
                debug!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    Ok(devices)
}

/// Layout of one axis, fixed when the device is opened.
#[derive(Debug, Clone, Copy)]
struct AxisLayout {
    code: usize,
    min: i32,
    max: i32,
    unipolar: bool,
}

/// An open device and its raw layout.
struct Connection {
    device: Device,
    path: PathBuf,
    identity: DeviceIdentity,
    buttons: Vec<Key>,
    axes: Vec<AxisLayout>,
}

impl Connection {
    fn new(device: Device, path: PathBuf, session: u64) -> Result<Self> {
        let buttons: Vec<Key> = device
            .supported_keys()
            .map(|keys| {
                keys.iter()
                    .filter(|key| key.code() >= FIRST_BUTTON_CODE)
                    .collect()
            })
            .unwrap_or_default();

        let abs_state = device.get_abs_state().map_err(|e| {
            MapperError::Controller(format!("Failed to read axes of {}: {}", path.display(), e))
        })?;

        let axes: Vec<AxisLayout> = device
            .supported_absolute_axes()
            .map(|supported| {
                supported
                    .iter()
                    .filter(|axis: &AbsoluteAxisType| axis.0 <= LAST_AXIS_CODE)
                    .map(|axis| {
                        let info = &abs_state[axis.0 as usize];
                        AxisLayout {
                            code: axis.0 as usize,
                            min: info.minimum,
                            max: info.maximum,
                            unipolar: info.value == info.minimum && info.minimum >= 0,
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        let identity = DeviceIdentity {
            id: device_id(&device),
            session,
        };

        info!(
            "Opened gamepad '{}' at {} ({} buttons, {} axes)",
            identity.id,
            path.display(),
            buttons.len(),
            axes.len()
        );

        Ok(Self {
            device,
            path,
            identity,
            buttons,
            axes,
        })
    }

    fn read(&self) -> std::io::Result<DeviceSnapshot> {
        let keys = self.device.get_key_state()?;
        let abs_state = self.device.get_abs_state()?;

        let buttons = self.buttons.iter().map(|&key| keys.contains(key)).collect();
        let axes = self
            .axes
            .iter()
            .map(|axis| {
                normalize_axis(abs_state[axis.code].value, axis.min, axis.max, axis.unipolar)
            })
            .collect();

        Ok(DeviceSnapshot {
            identity: self.identity.clone(),
            buttons,
            axes,
        })
    }
}

/// evdev-backed [`InputSource`].
///
/// Connects lazily on the first poll and reconnects after the device goes away.
///
/// # Examples
///
/// ```no_run
/// use gamepad_mapper::device::gamepad::EvdevGamepad;
/// use gamepad_mapper::device::InputSource;
/// use std::time::Duration;
///
/// let mut gamepad = EvdevGamepad::new(None, Duration::from_secs(1));
/// if let Some(snapshot) = gamepad.poll() {
///     println!("{}: {} buttons", snapshot.identity.id, snapshot.buttons.len());
/// }
/// ```
pub struct EvdevGamepad {
    device_path: Option<PathBuf>,
    rescan_interval: Duration,
    last_scan: Option<Instant>,
    session: u64,
    connection: Option<Connection>,
}

impl std::fmt::Debug for EvdevGamepad {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EvdevGamepad")
            .field("device_path", &self.device_path)
            .field("session", &self.session)
            .field("connected", &self.connection.as_ref().map(|c| &c.path))
            .finish_non_exhaustive()
    }
}

impl EvdevGamepad {
    /// Creates a source for `device_path`, or auto-detection when `None`.
    #[must_use]
    pub fn new(device_path: Option<PathBuf>, rescan_interval: Duration) -> Self {
        Self {
            device_path,
            rescan_interval,
            last_scan: None,
            session: 0,
            connection: None,
        }
    }

    fn scan_due(&self) -> bool {
        self.last_scan
            .map(|at| at.elapsed() >= self.rescan_interval)
            .unwrap_or(true)
    }

    fn open_device(&self) -> Result<(PathBuf, Device)> {
        if let Some(path) = &self.device_path {
            let device = Device::open(path).map_err(|e| {
                MapperError::Controller(format!("Failed to open {}: {}", path.display(), e))
            })?;
            return Ok((path.clone(), device));
        }

        scan_event_devices()?
            .into_iter()
            .find(|(_, device)| is_gamepad(device))
            .ok_or(MapperError::ControllerNotFound)
    }

    fn connect(&mut self) {
        self.last_scan = Some(Instant::now());

        let result = self
            .open_device()
            .and_then(|(path, device)| Connection::new(device, path, self.session + 1));

        match result {
            Ok(connection) => {
                self.session += 1;
                self.connection = Some(connection);
            }
            Err(MapperError::ControllerNotFound) => debug!("No gamepad connected"),
            Err(e) => warn!("{}", e),
        }
    }
}

impl InputSource for EvdevGamepad {
    fn poll(&mut self) -> Option<DeviceSnapshot> {
        if self.connection.is_none() && self.scan_due() {
            self.connect();
        }

        let connection = self.connection.as_ref()?;
        match connection.read() {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                warn!(
                    "Lost gamepad '{}' at {}: {}",
                    connection.identity.id,
                    connection.path.display(),
                    e
                );
                self.connection = None;
                self.last_scan = Some(Instant::now());
                None
            }
        }
    }
}
