//! Forecast cycle (model run) selection.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Timelike, Utc};

use crate::error::{CommonError, CommonResult};

/// Hours between the cycle reference time and the moment its files are
/// reliably published on the archive.
pub const PUBLICATION_DELAY_HOURS: i64 = 6;

/// HRRR output we chart is produced every 6 hours (00, 06, 12, 18 UTC).
pub const CYCLE_INTERVAL_HOURS: u32 = 6;

/// A model run identified by its reference date and hour (UTC).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForecastCycle {
    date: NaiveDate,
    hour: u32,
}

impl ForecastCycle {
    /// Create a cycle, rejecting hours that are not a cycle boundary.
    pub fn new(date: NaiveDate, hour: u32) -> CommonResult<Self> {
        if hour >= 24 || hour % CYCLE_INTERVAL_HOURS != 0 {
            return Err(CommonError::InvalidCycleHour(hour));
        }
        Ok(Self { date, hour })
    }

    /// The most recent cycle expected to be published at `now`.
    ///
    /// Shifts `now` back by the publication delay, then rounds the hour down
    /// to the cycle interval. The date is the date of the shifted instant, so
    /// anything before 06:00 UTC selects the previous day's 18z run.
    pub fn latest_available(now: DateTime<Utc>) -> Self {
        let shifted = now - Duration::hours(PUBLICATION_DELAY_HOURS);
        let hour = shifted.hour() / CYCLE_INTERVAL_HOURS * CYCLE_INTERVAL_HOURS;

        Self {
            date: shifted.date_naive(),
            hour,
        }
    }

    /// The latest available cycle according to the wall clock.
    pub fn current() -> Self {
        Self::latest_available(Utc::now())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn hour(&self) -> u32 {
        self.hour
    }

    /// Reference date as used in archive directory names (`YYYYMMDD`).
    pub fn date_str(&self) -> String {
        self.date.format("%Y%m%d").to_string()
    }

    /// Two-digit reference hour as used in archive file names.
    pub fn hour_str(&self) -> String {
        format!("{:02}", self.hour)
    }

    /// Reference time of the run.
    pub fn reference_time(&self) -> DateTime<Utc> {
        let naive = self
            .date
            .and_hms_opt(self.hour, 0, 0)
            .unwrap_or_else(|| self.date.and_time(chrono::NaiveTime::MIN));
        Utc.from_utc_datetime(&naive)
    }
}

impl fmt::Display for ForecastCycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02}z", self.date_str(), self.hour)
    }
}

/// Parses `YYYYMMDDHH`, e.g. `2024061512`.
impl FromStr for ForecastCycle {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.len() != 10 || !s.chars().all(|c| c.is_ascii_digit()) {
            return Err(CommonError::InvalidCycle(s.to_string()));
        }

        let date = NaiveDate::parse_from_str(&s[..8], "%Y%m%d")
            .map_err(|_| CommonError::InvalidCycle(s.to_string()))?;
        let hour: u32 = s[8..]
            .parse()
            .map_err(|_| CommonError::InvalidCycle(s.to_string()))?;

        Self::new(date, hour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn test_current_follows_wall_clock() {
        let before = ForecastCycle::latest_available(Utc::now());
        let current = ForecastCycle::current();
        let after = ForecastCycle::latest_available(Utc::now());

        assert!(current == before || current == after);
        assert_eq!(current.hour() % 6, 0);
    }

    #[test]
    fn test_latest_available_midday() {
        // 14:30 - 6h = 08:30 -> 06z same day
        let cycle = ForecastCycle::latest_available(utc(2024, 6, 15, 14, 30));
        assert_eq!(cycle.date_str(), "20240615");
        assert_eq!(cycle.hour_str(), "06");
    }

    #[test]
    fn test_latest_available_crosses_midnight() {
        // 03:00 - 6h = 21:00 previous day -> 18z
        let cycle = ForecastCycle::latest_available(utc(2024, 6, 15, 3, 0));
        assert_eq!(cycle.date_str(), "20240614");
        assert_eq!(cycle.hour_str(), "18");
    }

    #[test]
    fn test_latest_available_crosses_year() {
        let cycle = ForecastCycle::latest_available(utc(2025, 1, 1, 0, 10));
        assert_eq!(cycle.date_str(), "20241231");
        assert_eq!(cycle.hour(), 18);
    }

    #[test]
    fn test_latest_available_on_boundary() {
        // Exactly 12:00 -> 06:00 shifted -> 06z
        let cycle = ForecastCycle::latest_available(utc(2024, 6, 15, 12, 0));
        assert_eq!(cycle.hour(), 6);
        // One minute earlier still lands in the 00z slot
        let cycle = ForecastCycle::latest_available(utc(2024, 6, 15, 11, 59));
        assert_eq!(cycle.hour(), 0);
    }

    #[test]
    fn test_cycle_hour_always_on_boundary() {
        let start = utc(2024, 2, 27, 0, 0);
        for quarter in 0..(4 * 24 * 4) {
            let now = start + Duration::minutes(15 * quarter);
            let cycle = ForecastCycle::latest_available(now);
            let shifted = now - Duration::hours(6);

            assert!([0, 6, 12, 18].contains(&cycle.hour()), "hour {}", cycle.hour());
            assert_eq!(cycle.hour(), shifted.hour() / 6 * 6);
            assert_eq!(cycle.date(), shifted.date_naive());
        }
    }

    #[test]
    fn test_new_rejects_off_cycle_hours() {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15).unwrap();
        assert!(ForecastCycle::new(date, 12).is_ok());
        assert!(matches!(
            ForecastCycle::new(date, 7),
            Err(CommonError::InvalidCycleHour(7))
        ));
        assert!(ForecastCycle::new(date, 24).is_err());
    }

    #[test]
    fn test_parse_cycle() {
        let cycle: ForecastCycle = "2024061518".parse().unwrap();
        assert_eq!(cycle.date_str(), "20240615");
        assert_eq!(cycle.hour(), 18);
        assert_eq!(cycle.reference_time(), utc(2024, 6, 15, 18, 0));
        assert_eq!(cycle.to_string(), "20240615 18z");
    }

    #[test]
    fn test_parse_cycle_invalid() {
        assert!("20240615".parse::<ForecastCycle>().is_err());
        assert!("2024061507".parse::<ForecastCycle>().is_err());
        assert!("2024133112".parse::<ForecastCycle>().is_err());
        assert!("abcdefghij".parse::<ForecastCycle>().is_err());
    }
}
