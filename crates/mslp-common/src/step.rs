//! Forecast steps (hours ahead of the cycle reference time).

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::cycle::ForecastCycle;
use crate::error::{CommonError, CommonResult};

/// Last hourly step published for the extended HRRR cycles.
pub const MAX_FORECAST_STEP: u32 = 48;

/// Hours ahead of the reference time, always within `0..=48`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ForecastStep(u32);

impl ForecastStep {
    pub fn new(hours: u32) -> CommonResult<Self> {
        if hours > MAX_FORECAST_STEP {
            return Err(CommonError::StepOutOfRange(hours));
        }
        Ok(Self(hours))
    }

    /// Steps `0..=last` in order.
    pub fn through(last: ForecastStep) -> impl Iterator<Item = ForecastStep> {
        (0..=last.0).map(ForecastStep)
    }

    /// Every step of a full run, `0..=48`.
    pub fn all() -> impl Iterator<Item = ForecastStep> {
        Self::through(Self(MAX_FORECAST_STEP))
    }

    pub fn hours(&self) -> u32 {
        self.0
    }

    /// Valid time of this step for the given cycle.
    pub fn valid_time(&self, cycle: &ForecastCycle) -> DateTime<Utc> {
        cycle.reference_time() + Duration::hours(self.0 as i64)
    }
}

/// Two-digit zero-padded hours, as embedded in file names.
impl fmt::Display for ForecastStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_bounds() {
        assert!(ForecastStep::new(0).is_ok());
        assert!(ForecastStep::new(48).is_ok());
        assert!(matches!(
            ForecastStep::new(49),
            Err(CommonError::StepOutOfRange(49))
        ));
    }

    #[test]
    fn test_all_steps_in_order() {
        let steps: Vec<u32> = ForecastStep::all().map(|s| s.hours()).collect();
        assert_eq!(steps.len(), 49);
        assert_eq!(steps.first(), Some(&0));
        assert_eq!(steps.last(), Some(&48));
        assert!(steps.windows(2).all(|w| w[1] == w[0] + 1));
    }

    #[test]
    fn test_through_partial_range() {
        let last = ForecastStep::new(3).unwrap();
        let steps: Vec<String> = ForecastStep::through(last).map(|s| s.to_string()).collect();
        assert_eq!(steps, vec!["00", "01", "02", "03"]);
    }

    #[test]
    fn test_valid_time() {
        let cycle: ForecastCycle = "2024061518".parse().unwrap();
        let step = ForecastStep::new(7).unwrap();
        assert_eq!(
            step.valid_time(&cycle).to_rfc3339(),
            "2024-06-16T01:00:00+00:00"
        );
    }
}
