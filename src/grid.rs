use crate::error::{DecodeError, GribError};
use crate::sections::LatLonGrid;

/// Flags from Code Table 3.4 encoding the traversal order of a 2-D grid in
/// the linearised array.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct ScanningMode(pub u8);

impl ScanningMode {
    /// Returns `true` if points of the first row or column scan in the `+i`
    /// (`+x`) direction.
    pub fn scans_positively_for_i(&self) -> bool {
        self.0 & 0b10000000 == 0
    }

    /// Returns `true` if points of the first row or column scan in the `+j`
    /// (`+y`) direction.
    pub fn scans_positively_for_j(&self) -> bool {
        self.0 & 0b01000000 != 0
    }

    /// Returns `true` if adjacent points in `i` (`x`) direction are
    /// consecutive.
    pub fn is_consecutive_for_i(&self) -> bool {
        self.0 & 0b00100000 == 0
    }

    /// Returns `true` if adjacent rows scan in opposite directions.
    pub fn scans_alternating_rows(&self) -> bool {
        self.0 & 0b00010000 != 0
    }

    pub(crate) fn has_unsupported_flags(&self) -> bool {
        self.0 & 0b00001111 != 0
    }

    pub(crate) fn i_sign(&self) -> f64 {
        if self.scans_positively_for_i() {
            1.0
        } else {
            -1.0
        }
    }

    pub(crate) fn j_sign(&self) -> f64 {
        if self.scans_positively_for_j() {
            1.0
        } else {
            -1.0
        }
    }
}

/// Longitude normalisation applied when coordinates are materialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LongitudeRange {
    /// No transform; values may exceed 360° or be negative, as recorded in
    /// the source grid.
    #[default]
    Preserve,
    /// Each value shifted into `[0, 360)`.
    ZeroTo360,
    /// Each value shifted into `(-180, 180]`.
    SignedDegrees,
}

impl LongitudeRange {
    pub fn normalize(&self, mut lng: f64) -> f64 {
        match self {
            Self::Preserve => lng,
            Self::ZeroTo360 => {
                while lng < 0.0 {
                    lng += 360.0;
                }
                while lng >= 360.0 {
                    lng -= 360.0;
                }
                lng
            }
            Self::SignedDegrees => {
                while lng <= -180.0 {
                    lng += 360.0;
                }
                while lng > 180.0 {
                    lng -= 360.0;
                }
                lng
            }
        }
    }
}

/// Iterates grid point coordinates in the order the field values are laid
/// out, following the scanning mode.
pub(crate) struct LatLonGridIterator {
    major: Vec<f64>,
    minor: Vec<f64>,
    scanning_mode: ScanningMode,
    major_pos: usize,
    minor_pos: usize,
    increments: bool,
}

impl LatLonGridIterator {
    pub(crate) fn new(lat: Vec<f64>, lon: Vec<f64>, scanning_mode: ScanningMode) -> Self {
        let (major, minor) = if scanning_mode.is_consecutive_for_i() {
            (lat, lon)
        } else {
            (lon, lat)
        };

        Self {
            major,
            minor,
            scanning_mode,
            major_pos: 0,
            minor_pos: 0,
            increments: true,
        }
    }
}

impl Iterator for LatLonGridIterator {
    type Item = (f64, f64);

    fn next(&mut self) -> Option<Self::Item> {
        if self.major_pos == self.major.len() {
            return None;
        }

        let minor_pos = if self.increments {
            self.minor_pos
        } else {
            self.minor.len() - self.minor_pos - 1
        };
        let minor = self.minor[minor_pos];
        let major = self.major[self.major_pos];

        self.minor_pos += 1;
        if self.minor_pos == self.minor.len() {
            self.major_pos += 1;
            self.minor_pos = 0;
            if self.scanning_mode.scans_alternating_rows() {
                self.increments = !self.increments;
            }
        }

        if self.scanning_mode.is_consecutive_for_i() {
            Some((major, minor))
        } else {
            Some((minor, major))
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.major.len() * self.minor.len();
        (len, Some(len))
    }
}

/// Materialised geometry of one message's grid: canonical corner points,
/// parallel coordinate arrays in field order, and the bounding box computed
/// after longitude normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct GridInfo {
    pub ni: usize,
    pub nj: usize,
    pub lat_first: f64,
    pub lon_first: f64,
    /// Recomputed from the first point, increment and scanning direction;
    /// the values recorded in the file are kept on [`LatLonGrid`].
    pub lat_last: f64,
    pub lon_last: f64,
    pub i_increment: f64,
    pub j_increment: f64,
    pub scanning_mode: ScanningMode,
    /// Resolution flag 0x08: vector components are grid-relative.
    pub grid_relative_winds: bool,
    pub longitude_range: LongitudeRange,
    pub lat: Vec<f32>,
    pub lng: Vec<f32>,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lng_min: f64,
    pub lng_max: f64,
}

impl GridInfo {
    pub(crate) fn from_latlon(grid: &LatLonGrid, range: LongitudeRange) -> Result<Self, GribError> {
        if grid.scanning_mode.has_unsupported_flags() {
            return Err(
                DecodeError::NotSupported("scanning mode flags", u16::from(grid.scanning_mode.0))
                    .into(),
            );
        }

        let (ni, nj) = (grid.ni as usize, grid.nj as usize);
        let lat_first = grid.lat_first_deg();
        let lon_first = grid.lon_first_deg();
        let i_increment = grid.i_increment_deg();
        let j_increment = grid.j_increment_deg();
        let i_step = i_increment * grid.scanning_mode.i_sign();
        let j_step = j_increment * grid.scanning_mode.j_sign();

        let lat_axis: Vec<f64> = (0..nj).map(|j| lat_first + j as f64 * j_step).collect();
        let lon_axis: Vec<f64> = (0..ni).map(|i| lon_first + i as f64 * i_step).collect();

        let mut lat = Vec::with_capacity(ni * nj);
        let mut lng = Vec::with_capacity(ni * nj);
        for (la, lo) in LatLonGridIterator::new(lat_axis, lon_axis, grid.scanning_mode) {
            lat.push(la as f32);
            lng.push(range.normalize(lo) as f32);
        }

        let (lat_min, lat_max) = min_max(&lat);
        let (lng_min, lng_max) = min_max(&lng);

        Ok(Self {
            ni,
            nj,
            lat_first,
            lon_first: range.normalize(lon_first),
            lat_last: lat_first + (nj as f64 - 1.0) * j_step,
            lon_last: range.normalize(lon_first + (ni as f64 - 1.0) * i_step),
            i_increment,
            j_increment,
            scanning_mode: grid.scanning_mode,
            grid_relative_winds: grid.resolution_and_component_flags & 0x08 != 0,
            longitude_range: range,
            lat,
            lng,
            lat_min,
            lat_max,
            lng_min,
            lng_max,
        })
    }

    pub fn num_points(&self) -> usize {
        self.ni * self.nj
    }

    /// Linear index of the grid node `i` columns east of `lng_min` and `j`
    /// rows north of `lat_min`, undoing the scanning order.
    pub(crate) fn index_from_southwest(&self, i: usize, j: usize) -> usize {
        let col = if self.scanning_mode.scans_positively_for_i() {
            i
        } else {
            self.ni - 1 - i
        };
        let row = if self.scanning_mode.scans_positively_for_j() {
            j
        } else {
            self.nj - 1 - j
        };
        row * self.ni + col
    }

    pub(crate) fn supports_interpolation(&self) -> bool {
        self.scanning_mode.is_consecutive_for_i() && !self.scanning_mode.scans_alternating_rows()
    }
}

fn min_max(values: &[f32]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for v in values {
        let v = f64::from(*v);
        if v < min {
            min = v;
        }
        if v > max {
            max = v;
        }
    }
    (min, max)
}
