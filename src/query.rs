use std::collections::BTreeMap;

use log::debug;
use regex::Regex;

use crate::error::{DecodeError, GribError, QueryError};
use crate::grid::{GridInfo, LongitudeRange};
use crate::inventory::build_inventory;
use crate::parser::Message;

/// Options for [`Grib2Reader::get_data`](crate::Grib2Reader::get_data).
/// All fields are optional in the sense of having inert defaults.
#[derive(Debug, Clone)]
pub struct GetDataOptions {
    /// Index of the message whose grid defines the coordinate arrays.
    pub message_index: usize,
    /// Regex applied to each inventory line; only matching messages
    /// contribute parameter arrays.
    pub match_pattern: Option<String>,
    /// Keep only these parameter short names (case-insensitive).
    pub parameters: Option<Vec<String>>,
    /// Keep only messages on this fixed surface type.
    pub level_type: Option<u8>,
    /// Keep only messages whose surface value equals this.
    pub level_value: Option<f64>,
    /// When `true` (the default) the first occurrence of each short name
    /// wins; otherwise later occurrences overwrite.
    pub first_parameter_only: bool,
    /// Return one entry per matching message instead of merging.
    pub multi_level: bool,
    pub longitude_range: LongitudeRange,
    /// Add `wind_speed` when both `ugrd` and `vgrd` are present.
    pub calculate_wind_speed: bool,
    /// Add `wind_dir` (meteorological: direction the wind comes from).
    pub calculate_wind_direction: bool,
    /// Rotate grid-relative components to earth-relative ones.
    pub earth_relative_winds: bool,
    /// Return per-point records instead of parallel arrays.
    pub as_objects: bool,
}

impl Default for GetDataOptions {
    fn default() -> Self {
        Self {
            message_index: 0,
            match_pattern: None,
            parameters: None,
            level_type: None,
            level_value: None,
            first_parameter_only: true,
            multi_level: false,
            longitude_range: LongitudeRange::default(),
            calculate_wind_speed: false,
            calculate_wind_direction: false,
            earth_relative_winds: false,
            as_objects: false,
        }
    }
}

/// A record of parallel arrays: grid geometry plus one field per parameter,
/// keyed by the lowercased short name.
#[derive(Debug, Clone, PartialEq)]
pub struct DataView {
    pub grid: GridInfo,
    pub parameters: BTreeMap<String, Vec<f32>>,
}

impl DataView {
    /// Converts the parallel arrays into per-point records.
    pub fn to_points(&self) -> Vec<PointRecord> {
        self.grid
            .lat
            .iter()
            .zip(&self.grid.lng)
            .enumerate()
            .map(|(k, (lat, lng))| PointRecord {
                lat: *lat,
                lng: *lng,
                values: self
                    .parameters
                    .iter()
                    .filter_map(|(name, field)| {
                        field.get(k).map(|v| (name.clone(), *v))
                    })
                    .collect(),
            })
            .collect()
    }
}

/// One grid point with its coordinate and parameter values.
#[derive(Debug, Clone, PartialEq)]
pub struct PointRecord {
    pub lat: f32,
    pub lng: f32,
    pub values: BTreeMap<String, f32>,
}

/// Result shape of a data query.
#[derive(Debug, Clone, PartialEq)]
pub enum DataOutput {
    Grid(DataView),
    MultiLevel(Vec<DataView>),
    Points(Vec<PointRecord>),
    /// Per-message entries converted to point records (`multi_level`
    /// combined with `as_objects`).
    MultiLevelPoints(Vec<Vec<PointRecord>>),
}

pub(crate) fn get_data(
    messages: &[Message],
    options: &GetDataOptions,
) -> Result<DataOutput, GribError> {
    let inventory = build_inventory(messages);

    let mut selected: Vec<usize> = (0..messages.len()).collect();
    if let Some(pattern) = &options.match_pattern {
        let re = Regex::new(pattern).map_err(|e| QueryError::InvalidPattern(e.to_string()))?;
        selected.retain(|&i| re.is_match(&inventory[i].to_string()));
        if selected.is_empty() {
            return Err(QueryError::NoMatch(pattern.clone()).into());
        }
    }

    if let Some(parameters) = &options.parameters {
        selected.retain(|&i| {
            parameters
                .iter()
                .any(|p| p.eq_ignore_ascii_case(&inventory[i].parameter))
        });
    }
    if let Some(level_type) = options.level_type {
        selected.retain(|&i| {
            messages[i]
                .prod_definition
                .fixed_surface()
                .map_or(false, |s| s.surface_type == level_type)
        });
    }
    if let Some(level_value) = options.level_value {
        selected.retain(|&i| {
            messages[i]
                .prod_definition
                .fixed_surface()
                .map_or(false, |s| s.value() == level_value)
        });
    }

    if options.multi_level {
        let mut views = Vec::new();
        for &i in &selected {
            let message = &messages[i];
            let (Some(field), Some(latlon)) =
                (message.field(), message.grid_definition.latlon())
            else {
                debug!("message {i} has no decodable field or grid; skipping");
                continue;
            };
            let grid = GridInfo::from_latlon(latlon, options.longitude_range)?;
            let mut parameters = BTreeMap::new();
            parameters.insert(inventory[i].parameter.to_lowercase(), field.to_vec());
            let mut view = DataView { grid, parameters };
            apply_derived_fields(&mut view, options);
            views.push(view);
        }
        if options.as_objects {
            return Ok(DataOutput::MultiLevelPoints(
                views.iter().map(DataView::to_points).collect(),
            ));
        }
        return Ok(DataOutput::MultiLevel(views));
    }

    let base = messages
        .get(options.message_index)
        .ok_or(QueryError::MessageIndexOutOfRange(options.message_index))?;
    let latlon = base.grid_definition.latlon().ok_or_else(|| {
        GribError::DecodeError(DecodeError::TemplateNumberUnsupported(
            base.grid_definition.template_number,
        ))
    })?;
    let grid = GridInfo::from_latlon(latlon, options.longitude_range)?;

    let mut parameters: BTreeMap<String, Vec<f32>> = BTreeMap::new();
    for &i in &selected {
        let Some(field) = messages[i].field() else {
            debug!("message {i} has no decoded field; skipping");
            continue;
        };
        let key = inventory[i].parameter.to_lowercase();
        if options.first_parameter_only && parameters.contains_key(&key) {
            continue;
        }
        parameters.insert(key, field.to_vec());
    }

    let mut view = DataView { grid, parameters };
    apply_derived_fields(&mut view, options);
    if options.as_objects {
        Ok(DataOutput::Points(view.to_points()))
    } else {
        Ok(DataOutput::Grid(view))
    }
}

fn apply_derived_fields(view: &mut DataView, options: &GetDataOptions) {
    if options.earth_relative_winds && view.grid.grid_relative_winds {
        // Lat/lon grid axes follow meridians and parallels, so grid- and
        // earth-relative components coincide; projected grids would need a
        // per-point convergence angle here.
        debug!("grid-relative winds on a lat/lon grid need no rotation");
    }
    if options.calculate_wind_speed {
        if let (Some(u), Some(v)) = (view.parameters.get("ugrd"), view.parameters.get("vgrd")) {
            let speed = u
                .iter()
                .zip(v)
                .map(|(u, v)| (u * u + v * v).sqrt())
                .collect();
            view.parameters.insert("wind_speed".to_owned(), speed);
        }
    }
    if options.calculate_wind_direction {
        if let (Some(u), Some(v)) = (view.parameters.get("ugrd"), view.parameters.get("vgrd")) {
            let dir = u
                .iter()
                .zip(v)
                .map(|(u, v)| wind_direction(*u, *v))
                .collect();
            view.parameters.insert("wind_dir".to_owned(), dir);
        }
    }
}

/// Meteorological wind direction in `[0, 360)`: the direction the wind
/// comes from, measured clockwise from north.
fn wind_direction(u: f32, v: f32) -> f32 {
    if u == 0.0 && v == 0.0 {
        return 0.0;
    }
    let mut dir = (-f64::from(u)).atan2(-f64::from(v)).to_degrees();
    if dir < 0.0 {
        dir += 360.0;
    }
    if dir >= 360.0 {
        dir -= 360.0;
    }
    dir as f32
}
