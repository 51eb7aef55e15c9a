//! Lookup tables translating GRIB2 numeric codes into the short strings
//! used in inventory lines. Only the commonly seen entries are carried;
//! everything else falls back to a formatted code.

use crate::sections::FixedSurface;

/// Implements a subset of "Code Table 4.2: Parameter number by product
/// discipline and parameter category" as NCEP-style mnemonics.
const PARAMETER_SHORT_NAMES: &[((u8, u8, u8), &str)] = &[
    ((0, 0, 0), "TMP"),
    ((0, 0, 2), "POT"),
    ((0, 0, 4), "TMAX"),
    ((0, 0, 5), "TMIN"),
    ((0, 0, 6), "DPT"),
    ((0, 1, 0), "SPFH"),
    ((0, 1, 1), "RH"),
    ((0, 1, 7), "PRATE"),
    ((0, 1, 8), "APCP"),
    ((0, 1, 13), "WEASD"),
    ((0, 2, 0), "WDIR"),
    ((0, 2, 1), "WIND"),
    ((0, 2, 2), "UGRD"),
    ((0, 2, 3), "VGRD"),
    ((0, 2, 8), "VVEL"),
    ((0, 2, 22), "GUST"),
    ((0, 3, 0), "PRES"),
    ((0, 3, 1), "PRMSL"),
    ((0, 3, 5), "HGT"),
    ((0, 6, 1), "TCDC"),
    ((0, 7, 6), "CAPE"),
    ((0, 7, 7), "CIN"),
    ((0, 19, 0), "VIS"),
    ((2, 0, 0), "LAND"),
    ((10, 0, 3), "HTSGW"),
];

/// Uppercased short name for a parameter; `PARAM_{category}_{number}` when
/// the triple is not in the table.
pub fn parameter_short_name(discipline: u8, category: u8, number: u8) -> String {
    PARAMETER_SHORT_NAMES
        .iter()
        .find(|(key, _)| *key == (discipline, category, number))
        .map(|(_, name)| (*name).to_owned())
        .unwrap_or_else(|| format!("PARAM_{category}_{number}"))
}

/// Level string for a fixed surface, following "Code Table 4.5: Fixed
/// surface types and units".
pub fn level_description(surface: &FixedSurface) -> String {
    let v = surface.value();
    match surface.surface_type {
        1 => "surface".to_owned(),
        2 => "cloud base".to_owned(),
        3 => "cloud top".to_owned(),
        4 => "0C isotherm".to_owned(),
        6 => "max wind".to_owned(),
        7 => "tropopause".to_owned(),
        100 => format!("{} mb", fmt_value(v / 100.0)),
        101 => "mean sea level".to_owned(),
        102 => format!("{} m above mean sea level", fmt_value(v)),
        103 => format!("{} m above ground", fmt_value(v)),
        104 => format!("{} sigma level", fmt_value(v)),
        106 => format!("{} m below ground", fmt_value(v)),
        108 => format!("{} mb above ground", fmt_value(v / 100.0)),
        200 => "entire atmosphere".to_owned(),
        255 => "missing".to_owned(),
        ty => format!("level type {ty} value {}", fmt_value(v)),
    }
}

/// Implements "Code Table 4.4: Indicator of unit of time range".
pub fn time_unit_name(unit: u8) -> Option<&'static str> {
    let name = match unit {
        0 => "min",
        1 => "hour",
        2 => "day",
        3 => "month",
        4 => "year",
        5 => "decade",
        6 => "normal",
        7 => "century",
        10 => "3-hour",
        11 => "6-hour",
        12 => "12-hour",
        13 => "sec",
        _ => return None,
    };
    Some(name)
}

/// Formats a level value with trailing zeros stripped.
fn fmt_value(v: f64) -> String {
    if v.is_nan() {
        return "missing".to_owned();
    }
    // f64's Display already prints the shortest representation (10, 0.25).
    format!("{v}")
}
