use std::collections::BTreeMap;

use crate::grid::{GridInfo, ScanningMode};
use crate::query::{DataView, PointRecord};

/// Target grid for [`regrid_bilinear`]: bounds plus step sizes in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegridSpec {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
    pub lat_step: f64,
    pub lng_step: f64,
}

impl DataView {
    /// Bilinear interpolation of the selected parameters at one point.
    /// Returns `None` when the target lies outside the grid's bounding box
    /// or the grid's scan order does not describe a regular row-major grid.
    ///
    /// An empty `parameters` slice selects every parameter in the view.
    pub fn bilinear_point(&self, lat: f64, lng: f64, parameters: &[String]) -> Option<PointRecord> {
        bilinear_point(self, lat, lng, parameters)
    }

    /// Resamples the selected parameters onto a new regular grid; points
    /// outside the source grid become NaN.
    pub fn regrid_bilinear(&self, spec: &RegridSpec, parameters: &[String]) -> DataView {
        regrid_bilinear(self, spec, parameters)
    }
}

pub fn bilinear_point(
    data: &DataView,
    tlat: f64,
    tlng: f64,
    parameters: &[String],
) -> Option<PointRecord> {
    let grid = &data.grid;
    if !grid.supports_interpolation() || grid.ni == 0 || grid.nj == 0 {
        return None;
    }
    if tlat < grid.lat_min || tlat > grid.lat_max || tlng < grid.lng_min || tlng > grid.lng_max {
        return None;
    }

    let i_f = if grid.ni > 1 {
        (tlng - grid.lng_min) / grid.i_increment
    } else {
        0.0
    };
    let j_f = if grid.nj > 1 {
        (tlat - grid.lat_min) / grid.j_increment
    } else {
        0.0
    };

    let i0 = (i_f.floor() as usize).min(grid.ni - 1);
    let j0 = (j_f.floor() as usize).min(grid.nj - 1);
    let i1 = (i0 + 1).min(grid.ni - 1);
    let j1 = (j0 + 1).min(grid.nj - 1);
    let wx = (i_f - i_f.floor()) as f32;
    let wy = (j_f - j_f.floor()) as f32;

    let values = select(data, parameters)
        .map(|(name, field)| {
            let sample = |i: usize, j: usize| {
                field
                    .get(grid.index_from_southwest(i, j))
                    .copied()
                    .unwrap_or(f32::NAN)
            };
            let v00 = sample(i0, j0);
            let v10 = sample(i1, j0);
            let v01 = sample(i0, j1);
            let v11 = sample(i1, j1);
            let value = v00 * (1.0 - wx) * (1.0 - wy)
                + v10 * wx * (1.0 - wy)
                + v01 * (1.0 - wx) * wy
                + v11 * wx * wy;
            (name.clone(), value)
        })
        .collect();

    Some(PointRecord {
        lat: tlat as f32,
        lng: tlng as f32,
        values,
    })
}

pub fn regrid_bilinear(data: &DataView, spec: &RegridSpec, parameters: &[String]) -> DataView {
    let ni = ((spec.lng_max - spec.lng_min) / spec.lng_step).round() as usize + 1;
    let nj = ((spec.lat_max - spec.lat_min) / spec.lat_step).round() as usize + 1;

    let names: Vec<String> = select(data, parameters)
        .map(|(name, _)| name.clone())
        .collect();
    let mut fields: BTreeMap<String, Vec<f32>> = names
        .iter()
        .map(|name| (name.clone(), Vec::with_capacity(ni * nj)))
        .collect();
    let mut lat = Vec::with_capacity(ni * nj);
    let mut lng = Vec::with_capacity(ni * nj);

    for j in 0..nj {
        let tlat = spec.lat_min + j as f64 * spec.lat_step;
        for i in 0..ni {
            let tlng = spec.lng_min + i as f64 * spec.lng_step;
            lat.push(tlat as f32);
            lng.push(tlng as f32);
            let point = bilinear_point(data, tlat, tlng, &names);
            for name in &names {
                let value = point
                    .as_ref()
                    .and_then(|p| p.values.get(name).copied())
                    .unwrap_or(f32::NAN);
                fields.get_mut(name).unwrap().push(value);
            }
        }
    }

    let lat_last = spec.lat_min + (nj as f64 - 1.0) * spec.lat_step;
    let lon_last = spec.lng_min + (ni as f64 - 1.0) * spec.lng_step;
    let grid = GridInfo {
        ni,
        nj,
        lat_first: spec.lat_min,
        lon_first: spec.lng_min,
        lat_last,
        lon_last,
        i_increment: spec.lng_step,
        j_increment: spec.lat_step,
        scanning_mode: ScanningMode(0b01000000),
        grid_relative_winds: data.grid.grid_relative_winds,
        longitude_range: data.grid.longitude_range,
        lat,
        lng,
        lat_min: spec.lat_min,
        lat_max: lat_last,
        lng_min: spec.lng_min,
        lng_max: lon_last,
    };

    DataView {
        grid,
        parameters: fields,
    }
}

fn select<'a>(
    data: &'a DataView,
    parameters: &'a [String],
) -> impl Iterator<Item = (&'a String, &'a Vec<f32>)> {
    data.parameters.iter().filter(move |(name, _)| {
        parameters.is_empty() || parameters.iter().any(|p| p.eq_ignore_ascii_case(name))
    })
}
