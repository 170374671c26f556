use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of the measurement method a series was recorded with.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MethodId(pub u32);

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Reference metadata for an observed parameter (e.g. "00060", discharge).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Parameter {
    pub parameter_code: String,
    pub description: String,
    pub unit: String,
    #[serde(default)]
    pub is_symlog_scale: bool,
    /// The site has instantaneous values for this parameter.
    #[serde(default, rename = "hasIVData")]
    pub has_iv_data: bool,
    /// The site has field groundwater-level measurements for this parameter.
    #[serde(default, rename = "hasGWLevelsData")]
    pub has_gw_levels_data: bool,
}

impl Parameter {
    /// A parameter uses a symlog axis when its metadata says so or when its
    /// code is one of the configured wide-range parameters.
    pub fn uses_symlog(&self, symlog_codes: &[String]) -> bool {
        self.is_symlog_scale || symlog_codes.iter().any(|code| *code == self.parameter_code)
    }
}

/// Order parameters for the selection list: codes in `priority` first, in
/// that order, then parameters with groundwater-level data, then the rest.
/// Each group keeps the input order.
pub fn sorted_parameters(parameters: &[Parameter], priority: &[String]) -> Vec<Parameter> {
    let rank = |parameter: &Parameter| {
        match priority.iter().position(|code| *code == parameter.parameter_code) {
            Some(position) => (0, position),
            None if parameter.has_gw_levels_data => (1, 0),
            None => (2, 0),
        }
    };
    let mut sorted = parameters.to_vec();
    sorted.sort_by_key(rank);
    sorted
}

/// A measurement method offered for the current parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Method {
    pub method_id: MethodId,
    #[serde(default)]
    pub method_description: String,
}

impl Method {
    /// Descriptions marked discontinued, or left blank, sort after active methods.
    pub fn is_discontinued(&self) -> bool {
        self.method_description.is_empty() || self.method_description.contains("Discontinued")
    }
}

/// Active methods first, then discontinued ones, each group keeping its order.
pub fn sort_methods(methods: &[Method]) -> Vec<Method> {
    let (active, discontinued): (Vec<Method>, Vec<Method>) = methods
        .iter()
        .cloned()
        .partition(|method| !method.is_discontinued());
    active.into_iter().chain(discontinued).collect()
}
