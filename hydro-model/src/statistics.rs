//! Daily median statistics and the USGS RDB format that carries them.
//!
//! RDB is tab-separated text: `#` comment lines, a header row, a column
//! format row (e.g. `5s\t15s\t...`), then data rows.

use crate::error::{ModelError, Result};
use csv::{ReaderBuilder, StringRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The median (p50) value for one calendar day across the period of record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStatistic {
    pub month: u32,
    pub day: u32,
    pub p50: f64,
}

/// Median statistics for a single parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatisticsSummary {
    pub parameter_code: String,
    pub begin_year: Option<i32>,
    pub end_year: Option<i32>,
    pub values: Vec<DailyStatistic>,
}

impl StatisticsSummary {
    /// Median for a calendar day, if the record has one.
    pub fn median_for(&self, month: u32, day: u32) -> Option<f64> {
        self.values
            .iter()
            .find(|stat| stat.month == month && stat.day == day)
            .map(|stat| stat.p50)
    }

    /// Parse RDB daily statistics into one summary per parameter code.
    ///
    /// Content without a header row yields no summaries.
    pub fn from_rdb(rdb: &str) -> Result<BTreeMap<String, StatisticsSummary>> {
        let mut reader = ReaderBuilder::new()
            .delimiter(b'\t')
            .comment(Some(b'#'))
            .has_headers(true)
            .flexible(true)
            .from_reader(rdb.as_bytes());

        let headers = reader.headers()?.clone();
        let mut summaries: BTreeMap<String, StatisticsSummary> = BTreeMap::new();
        if headers.is_empty() || headers.iter().all(|h| h.trim().is_empty()) {
            return Ok(summaries);
        }
        let column = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|h| h.trim() == name)
                .ok_or_else(|| ModelError::InvalidFormat(format!("RDB missing column {name}")))
        };
        let parameter_col = column("parameter_cd")?;
        let month_col = column("month_nu")?;
        let day_col = column("day_nu")?;
        let begin_col = column("begin_yr")?;
        let end_col = column("end_yr")?;
        let p50_col = column("p50_va")?;

        let mut skipped = 0u32;
        // first record after the header is the column format row
        for record in reader.records().skip(1) {
            let record = record?;
            let parameter_code = field(&record, parameter_col);
            let parsed = (
                field(&record, month_col).parse::<u32>(),
                field(&record, day_col).parse::<u32>(),
                field(&record, p50_col).parse::<f64>(),
            );
            let (month, day, p50) = match parsed {
                (Ok(month), Ok(day), Ok(p50)) => (month, day, p50),
                _ => {
                    skipped += 1;
                    continue;
                }
            };
            let summary = summaries
                .entry(parameter_code.to_string())
                .or_insert_with(|| StatisticsSummary {
                    parameter_code: parameter_code.to_string(),
                    ..StatisticsSummary::default()
                });
            if let Ok(begin) = field(&record, begin_col).parse::<i32>() {
                summary.begin_year = Some(summary.begin_year.map_or(begin, |b| b.min(begin)));
            }
            if let Ok(end) = field(&record, end_col).parse::<i32>() {
                summary.end_year = Some(summary.end_year.map_or(end, |e| e.max(end)));
            }
            summary.values.push(DailyStatistic { month, day, p50 });
        }
        log::info!(
            "parsed statistics for {} parameters, skipped {} rows",
            summaries.len(),
            skipped
        );
        Ok(summaries)
    }
}

fn field(record: &StringRecord, index: usize) -> &str {
    record.get(index).unwrap_or("").trim()
}
