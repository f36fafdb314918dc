//! # Gamepad Mapper Library
//!
//! Interactively map the physical buttons and axes of a gamepad to the
//! standard logical layout.
//!
//! The user is walked through a fixed list of controls ("Press Button A",
//! "Press Axis Left Analog Stick Horizontal", ...). A poll loop samples the
//! device, waits for it to return to neutral between answers, and records the
//! first active control for each step. The result is exported as JSON and can
//! be turned into mapping-table code.

pub mod codegen;
pub mod config;
pub mod device;
pub mod error;
pub mod mapping;
pub mod view;
