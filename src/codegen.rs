//! # Mapping Codegen
//!
//! Turns a [`MappingExport`] into the two snippets needed to add a device to a
//! gamepad mapping table: a table entry keyed by vendor/product id, and a
//! mapper function that reorders raw inputs into the standard layout.
//!
//! ## Output
//!
//! ```text
//! Table entry:
//!     {"054c", "0ce6", MapperDualSense}, // Wireless Controller
//!
//! Mapping method:
//! void MapperDualSense(const blink::WebGamepad& input, blink::WebGamepad* mapped) {
//!   *mapped = input;
//!   mapped->buttons[BUTTON_INDEX_PRIMARY] = input.buttons[1];
//!   mapped->buttons[BUTTON_INDEX_LEFT_TRIGGER] = AxisPositiveAsButton(input.axes[3]);
//!   mapped->buttons[BUTTON_INDEX_META] = NullButton();
//!   mapped->axes[AXIS_INDEX_RIGHT_STICK_X] = input.axes[2];
//!   mapped->buttonsLength = BUTTON_INDEX_COUNT;
//!   mapped->axesLength = AXIS_INDEX_COUNT;
//! }
//! ```
//!
//! Identity assignments (raw index equals standard index) are omitted.

use regex::Regex;
use std::fmt::Write as _;

use crate::error::{MapperError, Result};
use crate::mapping::control::{ActiveControl, AxisDirection};
use crate::mapping::export::MappingExport;
use crate::mapping::step::StepTarget;

/// Default name of the generated mapper function.
pub const DEFAULT_MAPPER_NAME: &str = "MapperRenameMe";

/// Standard button slot constants; the last entry doubles as the count.
pub const BUTTON_CONSTANTS: [&str; 18] = [
    "BUTTON_INDEX_PRIMARY",
    "BUTTON_INDEX_SECONDARY",
    "BUTTON_INDEX_TERTIARY",
    "BUTTON_INDEX_QUATERNARY",
    "BUTTON_INDEX_LEFT_SHOULDER",
    "BUTTON_INDEX_RIGHT_SHOULDER",
    "BUTTON_INDEX_LEFT_TRIGGER",
    "BUTTON_INDEX_RIGHT_TRIGGER",
    "BUTTON_INDEX_BACK_SELECT",
    "BUTTON_INDEX_START",
    "BUTTON_INDEX_LEFT_THUMBSTICK",
    "BUTTON_INDEX_RIGHT_THUMBSTICK",
    "BUTTON_INDEX_DPAD_UP",
    "BUTTON_INDEX_DPAD_DOWN",
    "BUTTON_INDEX_DPAD_LEFT",
    "BUTTON_INDEX_DPAD_RIGHT",
    "BUTTON_INDEX_META",
    "BUTTON_INDEX_COUNT",
];

/// Standard axis slot constants; the last entry doubles as the count.
pub const AXIS_CONSTANTS: [&str; 5] = [
    "AXIS_INDEX_LEFT_STICK_X",
    "AXIS_INDEX_LEFT_STICK_Y",
    "AXIS_INDEX_RIGHT_STICK_X",
    "AXIS_INDEX_RIGHT_STICK_Y",
    "AXIS_INDEX_COUNT",
];

/// Vendor id, product id and name parsed from a device id string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceIds {
    pub vendor: String,
    pub product: String,
    pub name: String,
}

impl DeviceIds {
    /// Parses `"<name> (Vendor: vvvv Product: pppp)"`.
    ///
    /// # Errors
    ///
    /// Returns `Codegen` if the vendor or product id is missing.
    ///
    /// # Examples
    ///
    /// ```
    /// use gamepad_mapper::codegen::DeviceIds;
    ///
    /// let ids = DeviceIds::parse("Wireless Controller (Vendor: 054c Product: 0ce6)")?;
    /// assert_eq!(ids.vendor, "054c");
    /// assert_eq!(ids.product, "0ce6");
    /// assert_eq!(ids.name, "Wireless Controller");
    /// # Ok::<(), gamepad_mapper::error::MapperError>(())
    /// ```
    pub fn parse(device_id: &str) -> Result<Self> {
        let capture = |pattern: &str, what: &str| -> Result<String> {
            let re = Regex::new(pattern)
                .map_err(|e| MapperError::Codegen(format!("bad pattern for {}: {}", what, e)))?;
            re.captures(device_id)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .ok_or_else(|| {
                    MapperError::Codegen(format!("no {} id in device id '{}'", what, device_id))
                })
        };

        let vendor = capture(r"Vendor: ([0-9a-fA-F]+)", "vendor")?;
        let product = capture(r"Product: ([0-9a-fA-F]+)", "product")?;
        let name = device_id
            .split('(')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string();

        Ok(Self {
            vendor,
            product,
            name,
        })
    }
}

fn slot(table: &[&'static str], index: usize, what: &str) -> Result<&'static str> {
    // The trailing *_COUNT entry is a length, not a slot
    table
        .get(index)
        .filter(|_| index + 1 < table.len())
        .copied()
        .ok_or_else(|| MapperError::Codegen(format!("{} index {} has no standard slot", what, index)))
}

/// Renders the table entry line.
///
/// # Errors
///
/// Returns `Codegen` if the device id cannot be parsed.
pub fn table_entry(export: &MappingExport, mapper_name: &str) -> Result<String> {
    let ids = DeviceIds::parse(&export.device_id)?;
    Ok(format!(
        "    {{\"{}\", \"{}\", {}}}, // {}",
        ids.vendor, ids.product, mapper_name, ids.name
    ))
}

/// Renders the mapper function.
///
/// # Errors
///
/// Returns `Codegen` if a step index has no standard slot.
pub fn mapper_function(export: &MappingExport, mapper_name: &str) -> Result<String> {
    let mut out = String::new();
    let mut buttons_len = 0;
    let mut axes_len = 0;

    let _ = writeln!(
        out,
        "void {}(const blink::WebGamepad& input, blink::WebGamepad* mapped) {{",
        mapper_name
    );
    out.push_str("  *mapped = input;\n");

    for mapping in &export.mappings {
        match mapping.target {
            StepTarget::Button => {
                let name = slot(&BUTTON_CONSTANTS, mapping.index, "button")?;
                match mapping.maps_to {
                    Some(ActiveControl::Button(raw)) => {
                        if raw != mapping.index {
                            let _ = writeln!(
                                out,
                                "  mapped->buttons[{}] = input.buttons[{}];",
                                name, raw
                            );
                        }
                        buttons_len = buttons_len.max(mapping.index + 1);
                    }
                    Some(ActiveControl::Axis { index, direction }) => {
                        let method = match direction {
                            AxisDirection::Positive => "AxisPositiveAsButton",
                            AxisDirection::Negative => "AxisNegativeAsButton",
                        };
                        let _ = writeln!(
                            out,
                            "  mapped->buttons[{}] = {}(input.axes[{}]);",
                            name, method, index
                        );
                        buttons_len = buttons_len.max(mapping.index + 1);
                    }
                    None => {
                        let _ = writeln!(out, "  mapped->buttons[{}] = NullButton();", name);
                    }
                }
            }
            StepTarget::Axis => {
                let name = slot(&AXIS_CONSTANTS, mapping.index, "axis")?;
                if let Some(ActiveControl::Axis { index, .. }) = mapping.maps_to {
                    if index != mapping.index {
                        let _ = writeln!(out, "  mapped->axes[{}] = input.axes[{}];", name, index);
                    }
                    axes_len = axes_len.max(mapping.index + 1);
                }
            }
        }
    }

    let _ = writeln!(out, "  mapped->buttonsLength = {};", BUTTON_CONSTANTS[buttons_len]);
    let _ = writeln!(out, "  mapped->axesLength = {};", AXIS_CONSTANTS[axes_len]);
    out.push('}');
    Ok(out)
}

/// Renders both snippets with headings, ready to print.
///
/// # Errors
///
/// See [`table_entry`] and [`mapper_function`].
pub fn render(export: &MappingExport, mapper_name: &str) -> Result<String> {
    Ok(format!(
        "Table entry:\n{}\n\nMapping method:\n{}\n",
        table_entry(export, mapper_name)?,
        mapper_function(export, mapper_name)?
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::export::ExportedMapping;

    fn mapping(target: StepTarget, index: usize, maps_to: Option<ActiveControl>) -> ExportedMapping {
        ExportedMapping {
            name: format!("{:?} {}", target, index),
            target,
            index,
            maps_to,
        }
    }

    fn export(mappings: Vec<ExportedMapping>) -> MappingExport {
        MappingExport {
            device_id: "Wireless Controller (Vendor: 054c Product: 0ce6)".to_string(),
            mappings,
        }
    }

    #[test]
    fn test_parse_device_ids() {
        let ids = DeviceIds::parse("Xbox 360 Controller (STANDARD GAMEPAD Vendor: 045e Product: 028e)")
            .unwrap();
        assert_eq!(ids.vendor, "045e");
        assert_eq!(ids.product, "028e");
        assert_eq!(ids.name, "Xbox 360 Controller");
    }

    #[test]
    fn test_parse_device_ids_missing_vendor() {
        let result = DeviceIds::parse("Some Pad");
        assert!(matches!(result, Err(MapperError::Codegen(_))));
    }

    #[test]
    fn test_table_entry() {
        let line = table_entry(&export(vec![]), "MapperDualSense").unwrap();
        assert_eq!(
            line,
            "    {\"054c\", \"0ce6\", MapperDualSense}, // Wireless Controller"
        );
    }

    #[test]
    fn test_mapper_function_lines() {
        let export = export(vec![
            mapping(StepTarget::Button, 0, Some(ActiveControl::Button(1))),
            mapping(StepTarget::Button, 1, Some(ActiveControl::Button(1))),
            mapping(StepTarget::Button, 2, None),
            mapping(StepTarget::Button, 6, Some(ActiveControl::axis_positive(3))),
            mapping(StepTarget::Button, 7, Some(ActiveControl::axis_negative(4))),
            mapping(StepTarget::Axis, 0, Some(ActiveControl::axis_positive(0))),
            mapping(StepTarget::Axis, 2, Some(ActiveControl::axis_positive(3))),
        ]);

        let code = mapper_function(&export, DEFAULT_MAPPER_NAME).unwrap();
        let expected = "\
void MapperRenameMe(const blink::WebGamepad& input, blink::WebGamepad* mapped) {
  *mapped = input;
  mapped->buttons[BUTTON_INDEX_PRIMARY] = input.buttons[1];
  mapped->buttons[BUTTON_INDEX_TERTIARY] = NullButton();
  mapped->buttons[BUTTON_INDEX_LEFT_TRIGGER] = AxisPositiveAsButton(input.axes[3]);
  mapped->buttons[BUTTON_INDEX_RIGHT_TRIGGER] = AxisNegativeAsButton(input.axes[4]);
  mapped->axes[AXIS_INDEX_RIGHT_STICK_X] = input.axes[3];
  mapped->buttonsLength = BUTTON_INDEX_BACK_SELECT;
  mapped->axesLength = AXIS_INDEX_RIGHT_STICK_Y;
}";
        assert_eq!(code, expected);
    }

    #[test]
    fn test_full_mapping_lengths_use_count() {
        let mut mappings: Vec<_> = (0..17)
            .map(|i| mapping(StepTarget::Button, i, Some(ActiveControl::Button(i))))
            .collect();
        mappings.extend((0..4).map(|i| mapping(StepTarget::Axis, i, Some(ActiveControl::axis_positive(i)))));

        let code = mapper_function(&export(mappings), "M").unwrap();
        assert!(code.contains("mapped->buttonsLength = BUTTON_INDEX_COUNT;"));
        assert!(code.contains("mapped->axesLength = AXIS_INDEX_COUNT;"));
        // Identity mappings produce no assignment lines
        assert!(!code.contains("input.buttons["));
    }

    #[test]
    fn test_nothing_mapped_has_zero_lengths() {
        let code = mapper_function(&export(vec![mapping(StepTarget::Axis, 0, None)]), "M").unwrap();
        assert!(code.contains("mapped->buttonsLength = BUTTON_INDEX_PRIMARY;"));
        assert!(code.contains("mapped->axesLength = AXIS_INDEX_LEFT_STICK_X;"));
    }

    #[test]
    fn test_out_of_table_index_is_error() {
        let result = mapper_function(&export(vec![mapping(StepTarget::Button, 17, None)]), "M");
        assert!(matches!(result, Err(MapperError::Codegen(_))));

        let result = mapper_function(&export(vec![mapping(StepTarget::Axis, 4, None)]), "M");
        assert!(matches!(result, Err(MapperError::Codegen(_))));
    }

    #[test]
    fn test_render_contains_both_sections() {
        let text = render(&export(vec![]), "M").unwrap();
        assert!(text.starts_with("Table entry:\n"));
        assert!(text.contains("\nMapping method:\nvoid M("));
    }
}
