//! File naming for downloaded grids and rendered charts.

use crate::cycle::ForecastCycle;
use crate::step::ForecastStep;

/// Archive file name for one step of a cycle, e.g. `hrrr.t06z.wrfsfcf07.grib2`.
pub fn grib_file_name(cycle: &ForecastCycle, step: ForecastStep) -> String {
    format!("hrrr.t{}z.wrfsfcf{}.grib2", cycle.hour_str(), step)
}

/// Chart file name for one step, e.g. `MSLP_07.png`.
pub fn png_file_name(step: ForecastStep) -> String {
    format!("MSLP_{}.png", step)
}
