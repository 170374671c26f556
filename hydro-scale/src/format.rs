use serde::Serialize;

/// Tick label format, chosen from the tick values themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TickFormat {
    /// No decimal places.
    Integer,
    /// Exactly two decimal places.
    TwoDecimals,
}

impl TickFormat {
    /// Integers when every value is integral, otherwise two decimals.
    pub fn for_values(values: &[f64]) -> Self {
        if values.iter().all(|value| value.fract() == 0.0) {
            TickFormat::Integer
        } else {
            TickFormat::TwoDecimals
        }
    }

    pub fn format(&self, value: f64) -> String {
        // avoid rendering "-0"
        let value = if value == 0.0 { 0.0 } else { value };
        match self {
            TickFormat::Integer => format!("{:.0}", value),
            TickFormat::TwoDecimals => {
                let label = format!("{:.2}", value);
                if label == "-0.00" {
                    "0.00".to_string()
                } else {
                    label
                }
            }
        }
    }
}
