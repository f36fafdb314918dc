//! # Mapping Module
//!
//! The guided mapping flow, independent of any device or display.
//!
//! This module handles:
//! - Step templates built from the standard button and axis name tables
//! - Detecting the single active control in a device reading
//! - The step state machine (wait-for-neutral gating, skip, back, finish)
//! - The exported mapping snapshot

pub mod control;
pub mod export;
pub mod state;
pub mod step;

pub use control::{detect_active_control, ActiveControl, AxisDirection};
pub use export::{ExportedMapping, MappingExport};
pub use state::{MappingState, StepMapping};
pub use step::{default_steps, MappingStep, StepTarget};
