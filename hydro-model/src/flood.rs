use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Named flood stages published for a gage.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
pub enum FloodStage {
    Action,
    Flood,
    ModerateFlood,
    MajorFlood,
}

impl FloodStage {
    pub fn class_name(&self) -> &'static str {
        match self {
            FloodStage::Action => "action-stage",
            FloodStage::Flood => "flood-stage",
            FloodStage::ModerateFlood => "moderate-flood-stage",
            FloodStage::MajorFlood => "major-flood-stage",
        }
    }
}

/// A single horizontal flood line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FloodLevel {
    pub stage: FloodStage,
    pub value: f64,
}

/// Flood stage values for a site, in feet of gage height.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloodLevels {
    pub action_stage: Option<f64>,
    pub flood_stage: Option<f64>,
    pub moderate_flood_stage: Option<f64>,
    pub major_flood_stage: Option<f64>,
}

/// The flood service publishes stage values as strings.
#[derive(Debug, Deserialize)]
struct RawFloodLevels {
    action_stage: Option<String>,
    flood_stage: Option<String>,
    moderate_flood_stage: Option<String>,
    major_flood_stage: Option<String>,
}

fn parse_stage(raw: Option<String>) -> Option<f64> {
    raw.and_then(|s| s.trim().parse::<f64>().ok())
}

impl FloodLevels {
    /// Decode the flood service's JSON object; unparseable stages are dropped.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawFloodLevels = serde_json::from_str(json)?;
        Ok(FloodLevels {
            action_stage: parse_stage(raw.action_stage),
            flood_stage: parse_stage(raw.flood_stage),
            moderate_flood_stage: parse_stage(raw.moderate_flood_stage),
            major_flood_stage: parse_stage(raw.major_flood_stage),
        })
    }

    /// Known stages in ascending severity.
    pub fn levels(&self) -> Vec<FloodLevel> {
        [
            (FloodStage::Action, self.action_stage),
            (FloodStage::Flood, self.flood_stage),
            (FloodStage::ModerateFlood, self.moderate_flood_stage),
            (FloodStage::MajorFlood, self.major_flood_stage),
        ]
        .into_iter()
        .filter_map(|(stage, value)| value.map(|value| FloodLevel { stage, value }))
        .collect()
    }
}

/// The inundation stage closest to `gage_height`. When two stages are equally
/// close the later one in `stages` wins.
pub fn nearest_stage(stages: &[f64], gage_height: f64) -> Option<f64> {
    stages
        .iter()
        .fold(None, |best: Option<(f64, f64)>, &stage| {
            let diff = (gage_height - stage).abs();
            match best {
                Some((_, best_diff)) if diff > best_diff => best,
                _ => Some((stage, diff)),
            }
        })
        .map(|(stage, _)| stage)
}

/// Position of the first stage equal to `stage`.
pub fn stage_index(stages: &[f64], stage: f64) -> Option<usize> {
    stages.iter().position(|candidate| *candidate == stage)
}
