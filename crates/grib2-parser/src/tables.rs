//! GRIB2 parameter and level lookup tables.
//!
//! Translate numeric GRIB2 codes into the short names and level
//! descriptions used by the NOMADS grib filter (`var_MSLMA`,
//! `lev_mean_sea_level`, ...).

use std::collections::HashMap;

/// Lookup key for parameter: (discipline, category, number)
pub type ParamKey = (u8, u8, u8);

/// Code of the MSLP (MAPS system reduction) parameter in NCEP's local table.
pub const MSLMA: ParamKey = (0, 3, 198);

/// Level type code for mean sea level.
pub const LEVEL_MEAN_SEA_LEVEL: u8 = 101;

/// Level description - either static text or a template with placeholders
#[derive(Debug, Clone)]
pub enum LevelDescription {
    /// Static description (e.g., "surface", "mean sea level")
    Static(String),
    /// Template with `{value}` or `{value_mb}` placeholder
    Template(String),
}

impl LevelDescription {
    /// `{value}` is the raw level value, `{value_mb}` the value read as Pa
    /// and shown in mb.
    pub fn format(&self, value: u32) -> String {
        match self {
            LevelDescription::Static(s) => s.clone(),
            LevelDescription::Template(t) => t
                .replace("{value_mb}", &(value / 100).to_string())
                .replace("{value}", &value.to_string()),
        }
    }
}

/// GRIB2 parameter and level lookup tables.
#[derive(Debug, Clone, Default)]
pub struct Grib2Tables {
    parameters: HashMap<ParamKey, String>,
    levels: HashMap<u8, LevelDescription>,
}

impl Grib2Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// WMO and NCEP local entries needed for HRRR surface output.
    pub fn ncep() -> Self {
        let mut tables = Self::new();

        for (key, name) in [
            ((0, 0, 0), "TMP"),
            ((0, 0, 6), "DPT"),
            ((0, 1, 1), "RH"),
            ((0, 2, 2), "UGRD"),
            ((0, 2, 3), "VGRD"),
            ((0, 3, 0), "PRES"),
            ((0, 3, 1), "PRMSL"),
            ((0, 3, 5), "HGT"),
            (MSLMA, "MSLMA"),
        ] {
            tables.add_parameter(key.0, key.1, key.2, name.to_string());
        }

        tables.add_level(1, LevelDescription::Static("surface".to_string()));
        tables.add_level(
            100,
            LevelDescription::Template("{value_mb} mb".to_string()),
        );
        tables.add_level(
            LEVEL_MEAN_SEA_LEVEL,
            LevelDescription::Static("mean sea level".to_string()),
        );
        tables.add_level(
            103,
            LevelDescription::Template("{value} m above ground".to_string()),
        );

        tables
    }

    pub fn add_parameter(&mut self, discipline: u8, category: u8, number: u8, name: String) {
        self.parameters.insert((discipline, category, number), name);
    }

    pub fn add_level(&mut self, level_type: u8, description: LevelDescription) {
        self.levels.insert(level_type, description);
    }

    /// Short name for the codes, or `P{discipline}_{category}_{number}`.
    pub fn get_parameter_name(&self, discipline: u8, category: u8, number: u8) -> String {
        self.parameters
            .get(&(discipline, category, number))
            .cloned()
            .unwrap_or_else(|| format!("P{}_{}_{}", discipline, category, number))
    }

    /// Level description, or `Level type {type} value {value}`.
    pub fn get_level_description(&self, level_type: u8, level_value: u32) -> String {
        match self.levels.get(&level_type) {
            Some(desc) => desc.format(level_value),
            None => format!("Level type {} value {}", level_type, level_value),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.levels.is_empty()
    }
}
