//! Fahrenheit companions for parameters reported in degrees Celsius.
//!
//! A converted parameter carries the Celsius code with an `F` suffix, so
//! "00010" water temperature is offered as "00010F" as well.

use crate::parameter::Parameter;
use crate::point::Series;

/// Suffix appended to a Celsius parameter code for its Fahrenheit companion.
pub const FAHRENHEIT_SUFFIX: &str = "F";

pub fn celsius_to_fahrenheit(celsius: f64) -> f64 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    (fahrenheit - 32.0) * 5.0 / 9.0
}

/// True for a code produced by [`fahrenheit_parameter`].
pub fn is_converted_code(code: &str, celsius_codes: &[String]) -> bool {
    code.strip_suffix(FAHRENHEIT_SUFFIX)
        .map_or(false, |base| celsius_codes.iter().any(|c| c == base))
}

/// The Fahrenheit companion of a Celsius parameter, or `None` when the
/// parameter's code is not one of `celsius_codes`.
pub fn fahrenheit_parameter(celsius: &Parameter, celsius_codes: &[String]) -> Option<Parameter> {
    if !celsius_codes.iter().any(|code| *code == celsius.parameter_code) {
        return None;
    }
    Some(Parameter {
        parameter_code: format!("{}{}", celsius.parameter_code, FAHRENHEIT_SUFFIX),
        description: celsius.description.replace("Celsius", "Fahrenheit"),
        unit: "deg F".to_string(),
        ..celsius.clone()
    })
}

/// Every parameter followed by its Fahrenheit companion where one applies.
/// Companions already present in `parameters` are not added twice.
pub fn with_fahrenheit(parameters: &[Parameter], celsius_codes: &[String]) -> Vec<Parameter> {
    let mut all = Vec::with_capacity(parameters.len());
    for parameter in parameters {
        all.push(parameter.clone());
        if let Some(converted) = fahrenheit_parameter(parameter, celsius_codes) {
            let present = parameters
                .iter()
                .any(|p| p.parameter_code == converted.parameter_code);
            if !present {
                all.push(converted);
            }
        }
    }
    all
}

/// A Celsius series converted point by point; gaps stay gaps.
pub fn fahrenheit_series(celsius: &Series) -> Series {
    celsius.map_values(celsius_to_fahrenheit)
}
