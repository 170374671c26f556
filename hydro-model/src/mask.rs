use crate::error::{ModelError, Result};
use crate::point::TimeSeriesPoint;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Quality classification derived from a point's qualifier codes.
///
/// Declaration order is the default precedence: when a point carries codes
/// for several masks, the one declared first wins.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityMask {
    Ice,
    Flood,
    Backwater,
    ZeroFlow,
    Dry,
    Seasonal,
    PartialRecord,
    RatingDevelopment,
    EquipmentMalfunction,
    Maintenance,
    Discontinued,
    Test,
    Pump,
    Unavailable,
    Estimated,
    /// A null value with no masking qualifier.
    NoData,
}

impl QualityMask {
    pub const ALL: [QualityMask; 16] = [
        QualityMask::Ice,
        QualityMask::Flood,
        QualityMask::Backwater,
        QualityMask::ZeroFlow,
        QualityMask::Dry,
        QualityMask::Seasonal,
        QualityMask::PartialRecord,
        QualityMask::RatingDevelopment,
        QualityMask::EquipmentMalfunction,
        QualityMask::Maintenance,
        QualityMask::Discontinued,
        QualityMask::Test,
        QualityMask::Pump,
        QualityMask::Unavailable,
        QualityMask::Estimated,
        QualityMask::NoData,
    ];

    /// Human readable label, used for legend text.
    pub fn description(&self) -> &'static str {
        match self {
            QualityMask::Ice => "Ice-Affected",
            QualityMask::Flood => "Flood",
            QualityMask::Backwater => "Backwater",
            QualityMask::ZeroFlow => "Zeroflow",
            QualityMask::Dry => "Dry",
            QualityMask::Seasonal => "Seasonal",
            QualityMask::PartialRecord => "Partial Record",
            QualityMask::RatingDevelopment => "Rating Development",
            QualityMask::EquipmentMalfunction => "Equipment Malfunction",
            QualityMask::Maintenance => "Maintenance",
            QualityMask::Discontinued => "Discontinued",
            QualityMask::Test => "Test",
            QualityMask::Pump => "Pump",
            QualityMask::Unavailable => "Unavailable",
            QualityMask::Estimated => "Estimated",
            QualityMask::NoData => "No Data",
        }
    }

    /// Qualifier code conventionally attached to observations with this mask.
    pub fn default_code(&self) -> Option<&'static str> {
        match self {
            QualityMask::Ice => Some("ice"),
            QualityMask::Flood => Some("fld"),
            QualityMask::Backwater => Some("bkw"),
            QualityMask::ZeroFlow => Some("zfl"),
            QualityMask::Dry => Some("dry"),
            QualityMask::Seasonal => Some("ssn"),
            QualityMask::PartialRecord => Some("pr"),
            QualityMask::RatingDevelopment => Some("rat"),
            QualityMask::EquipmentMalfunction => Some("eqp"),
            QualityMask::Maintenance => Some("mnt"),
            QualityMask::Discontinued => Some("dis"),
            QualityMask::Test => Some("tst"),
            QualityMask::Pump => Some("pmp"),
            QualityMask::Unavailable => Some("***"),
            QualityMask::Estimated => Some("e"),
            QualityMask::NoData => None,
        }
    }

    /// Data masks hide the reading; estimated points still carry a value.
    pub fn is_data_mask(&self) -> bool {
        !matches!(self, QualityMask::Estimated)
    }

    /// CSS-style class name for the renderer, e.g. `ice-mask`.
    pub fn class_name(&self) -> String {
        let key = match self.default_code() {
            Some("***") => "unavailable",
            Some(code) => code,
            None => "nodata",
        };
        format!("{key}-mask")
    }
}

/// One row of a classification table: a mask and the codes that select it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaskEntry {
    pub mask: QualityMask,
    pub codes: Vec<String>,
}

/// Qualifier-to-mask lookup with explicit precedence.
///
/// Entries are supplied highest precedence first. Construction checks that
/// every code-selectable mask appears exactly once and that no code selects
/// two masks.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskTable {
    by_code: HashMap<String, (usize, QualityMask)>,
    order: Vec<QualityMask>,
}

impl MaskTable {
    pub fn new(entries: Vec<MaskEntry>) -> Result<Self> {
        let mut by_code = HashMap::new();
        let mut order = Vec::with_capacity(entries.len());
        for (rank, entry) in entries.into_iter().enumerate() {
            if entry.mask == QualityMask::NoData {
                return Err(ModelError::DerivedMask(entry.mask));
            }
            if order.contains(&entry.mask) {
                return Err(ModelError::DuplicateMask(entry.mask));
            }
            order.push(entry.mask);
            for code in entry.codes {
                let key = code.to_ascii_lowercase();
                if by_code.insert(key.clone(), (rank, entry.mask)).is_some() {
                    return Err(ModelError::DuplicateCode(key));
                }
            }
        }
        if let Some(missing) = QualityMask::ALL
            .iter()
            .filter(|mask| **mask != QualityMask::NoData)
            .find(|mask| !order.contains(mask))
        {
            return Err(ModelError::MissingMask(*missing));
        }
        Ok(MaskTable { by_code, order })
    }

    /// Masks in precedence order, highest first.
    pub fn precedence(&self) -> &[QualityMask] {
        &self.order
    }

    /// Classify a point. The highest-precedence matching code wins; a null
    /// value with no matching code is `NoData`; otherwise there is no mask.
    pub fn classify(&self, point: &TimeSeriesPoint) -> Option<QualityMask> {
        let best = point
            .qualifiers
            .iter()
            .filter_map(|code| self.by_code.get(&code.to_ascii_lowercase()))
            .min_by_key(|(rank, _)| *rank)
            .map(|(_, mask)| *mask);
        match best {
            Some(mask) => Some(mask),
            None if point.value.is_none() => Some(QualityMask::NoData),
            None => None,
        }
    }
}

impl Default for MaskTable {
    fn default() -> Self {
        let mut by_code = HashMap::new();
        let mut order = Vec::new();
        for mask in QualityMask::ALL {
            if let Some(code) = mask.default_code() {
                by_code.insert(code.to_string(), (order.len(), mask));
                order.push(mask);
            }
        }
        MaskTable { by_code, order }
    }
}
