//! Shared time utilities for hydro crates.
//!
//! Observation times travel through the pipeline as epoch milliseconds
//! (`i64`, UTC). These helpers convert to and from `chrono` types where
//! calendar arithmetic is needed.

/// Time and date utility functions
pub mod dates {
    use anyhow::{anyhow, Context};
    use chrono::{DateTime, Days, Months, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Utc};
    use chrono_tz::Tz;
    use std::mem::replace;

    pub const MS_PER_HOUR: i64 = 3_600_000;
    pub const MS_PER_DAY: i64 = 24 * MS_PER_HOUR;

    /// Compare series are fetched for the same window one year earlier.
    pub const HOURS_IN_ONE_YEAR: i64 = 8760;

    /// Convert epoch milliseconds to a UTC timestamp.
    pub fn to_datetime(millis: i64) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(millis)
    }

    /// Calendar date (UTC) containing the given epoch milliseconds.
    pub fn to_date(millis: i64) -> Option<NaiveDate> {
        to_datetime(millis).map(|dt| dt.date_naive())
    }

    /// Epoch milliseconds of midnight UTC on `date`.
    pub fn date_start_millis(date: NaiveDate) -> Option<i64> {
        date.and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc().timestamp_millis())
    }

    /// Parse an RFC 3339 timestamp (e.g. "2018-01-03T12:00:00.000Z") into epoch milliseconds.
    pub fn parse_iso_time(s: &str) -> anyhow::Result<i64> {
        let parsed = DateTime::parse_from_rfc3339(s.trim())
            .with_context(|| format!("invalid ISO-8601 timestamp: {s}"))?;
        Ok(parsed.with_timezone(&Utc).timestamp_millis())
    }

    /// Format epoch milliseconds as "YYYY-MM-DDTHH:MMZ" (UTC).
    pub fn format_iso_time(millis: i64) -> Option<String> {
        to_datetime(millis).map(|dt| dt.format("%Y-%m-%dT%H:%MZ").to_string())
    }

    /// A calendar period in ISO-8601 duration form, such as "P7D" or "P1Y".
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Period {
        Days(u32),
        Months(u32),
        Years(u32),
    }

    /// Parse a single-unit ISO-8601 period ("P{n}D", "P{n}M" or "P{n}Y").
    pub fn parse_period(period: &str) -> anyhow::Result<Period> {
        let body = period
            .trim()
            .strip_prefix('P')
            .ok_or_else(|| anyhow!("unsupported period: {period}"))?;
        let unit = body
            .chars()
            .last()
            .ok_or_else(|| anyhow!("unsupported period: {period}"))?;
        let count = body[..body.len() - unit.len_utf8()]
            .parse::<u32>()
            .with_context(|| format!("unsupported period: {period}"))?;
        match unit {
            'D' => Ok(Period::Days(count)),
            'M' => Ok(Period::Months(count)),
            'Y' => Ok(Period::Years(count)),
            _ => Err(anyhow!("unsupported period: {period}")),
        }
    }

    /// The `[start, end]` window covering `period` and ending at `end`.
    ///
    /// The start is found by calendar arithmetic on the wall-clock time in
    /// `zone`, so a daylight-saving change inside the window does not shift
    /// the local hour, and "P1Y" lands on the same date a year earlier.
    pub fn window_for_period(end: i64, period: &str, zone: Tz) -> anyhow::Result<(i64, i64)> {
        let local = to_datetime(end)
            .ok_or_else(|| anyhow!("time out of range: {end}"))?
            .with_timezone(&zone)
            .naive_local();
        let start = match parse_period(period)? {
            Period::Days(days) => local.checked_sub_days(Days::new(u64::from(days))),
            Period::Months(months) => local.checked_sub_months(Months::new(months)),
            Period::Years(years) => years
                .checked_mul(12)
                .and_then(|months| local.checked_sub_months(Months::new(months))),
        }
        .ok_or_else(|| anyhow!("period {period} before {end} is out of range"))?;
        Ok((local_millis(start, zone)?, end))
    }

    /// Epoch milliseconds of a wall-clock time in `zone`. Ambiguous times take
    /// the earlier instant; times skipped by a clock change move forward an hour.
    fn local_millis(naive: NaiveDateTime, zone: Tz) -> anyhow::Result<i64> {
        zone.from_local_datetime(&naive)
            .earliest()
            .or_else(|| {
                naive
                    .checked_add_signed(TimeDelta::hours(1))
                    .and_then(|shifted| zone.from_local_datetime(&shifted).earliest())
            })
            .map(|dt| dt.timestamp_millis())
            .ok_or_else(|| anyhow!("no instant for {naive} in {}", zone.name()))
    }

    /// Shift a time back by one (8760 hour) year.
    pub fn previous_year(millis: i64) -> Option<i64> {
        millis.checked_sub(HOURS_IN_ONE_YEAR * MS_PER_HOUR)
    }

    /// A date range iterator that yields each date from the start date
    /// through the end date (inclusive).
    #[derive(Clone, Eq, PartialEq, Copy, Debug)]
    pub struct DateRange(pub NaiveDate, pub NaiveDate);

    impl Iterator for DateRange {
        type Item = NaiveDate;
        fn next(&mut self) -> Option<Self::Item> {
            if self.0 <= self.1 {
                let next = self.0.checked_add_signed(TimeDelta::days(1))?;
                Some(replace(&mut self.0, next))
            } else {
                None
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_parse_and_format_iso_time() {
            let millis = parse_iso_time("2018-01-03T12:00:00.000Z").unwrap();
            assert_eq!(millis, 1_514_980_800_000);
            assert_eq!(format_iso_time(millis).unwrap(), "2018-01-03T12:00Z");
        }

        #[test]
        fn test_parse_iso_time_rejects_garbage() {
            assert!(parse_iso_time("yesterday").is_err());
        }

        #[test]
        fn test_parse_period() {
            assert_eq!(parse_period("P7D").unwrap(), Period::Days(7));
            assert_eq!(parse_period("P365D").unwrap(), Period::Days(365));
            assert_eq!(parse_period("P1Y").unwrap(), Period::Years(1));
            assert_eq!(parse_period("P6M").unwrap(), Period::Months(6));
            assert!(parse_period("7D").is_err());
            assert!(parse_period("PD").is_err());
            assert!(parse_period("P7W").is_err());
            assert!(parse_period("P").is_err());
            assert!(parse_period("P7é").is_err());
        }

        #[test]
        fn test_window_for_period_in_zone() {
            let end = 1_490_562_900_000;
            let chicago = chrono_tz::America::Chicago;
            assert_eq!(
                window_for_period(end, "P7D", chicago).unwrap(),
                (1_489_958_100_000, end)
            );
            // Crosses the March daylight-saving change; the local hour is kept.
            assert_eq!(
                window_for_period(end, "P30D", chicago).unwrap(),
                (1_487_974_500_000, end)
            );
            assert_eq!(
                window_for_period(end, "P1Y", chicago).unwrap(),
                (1_459_026_900_000, end)
            );
        }

        #[test]
        fn test_window_for_period_in_utc() {
            let end = 1_490_562_900_000;
            let (start, _) = window_for_period(end, "P30D", chrono_tz::UTC).unwrap();
            assert_eq!(end - start, 30 * MS_PER_DAY);
        }

        #[test]
        fn test_window_for_period_skipped_local_time() {
            // 2017-03-13T02:30 Chicago; a day earlier is inside the spring-forward gap.
            let end = 1_489_390_200_000;
            let (start, _) = window_for_period(end, "P1D", chrono_tz::America::Chicago).unwrap();
            assert_eq!(format_iso_time(start).unwrap(), "2017-03-12T08:30Z");
        }

        #[test]
        fn test_previous_year() {
            assert_eq!(previous_year(HOURS_IN_ONE_YEAR * MS_PER_HOUR), Some(0));
            assert_eq!(previous_year(i64::MIN + 1), None);
        }

        #[test]
        fn test_date_start_millis() {
            let date = NaiveDate::from_ymd_opt(2018, 1, 3).unwrap();
            let millis = date_start_millis(date).unwrap();
            assert_eq!(to_date(millis).unwrap(), date);
            assert_eq!(to_date(millis + MS_PER_DAY - 1).unwrap(), date);
        }

        #[test]
        fn test_date_range_iteration() {
            let start = NaiveDate::from_ymd_opt(2022, 1, 1).unwrap();
            let end = NaiveDate::from_ymd_opt(2022, 1, 5).unwrap();
            let dates: Vec<NaiveDate> = DateRange(start, end).collect();
            assert_eq!(dates.len(), 5);
            assert_eq!(dates[0], start);
            assert_eq!(dates[4], end);
        }

        #[test]
        fn test_date_range_empty() {
            let start = NaiveDate::from_ymd_opt(2022, 3, 15).unwrap();
            let end = NaiveDate::from_ymd_opt(2022, 3, 14).unwrap();
            assert_eq!(DateRange(start, end).count(), 0);
        }
    }
}
