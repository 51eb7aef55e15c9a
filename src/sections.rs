use chrono::{DateTime, LocalResult, TimeZone, Utc};
use std::fmt::{self, Display, Formatter};

use crate::bits::read_as;
use crate::error::ParseError;
use crate::grid::ScanningMode;

/// Section 0: discipline and total message length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Indicator {
    /// Discipline - GRIB Master Table Number (see Code Table 0.0)
    pub discipline: u8,
    /// GRIB edition number; always 2
    pub edition: u8,
    /// Total length of GRIB message in octets (including Section 0)
    pub total_length: u64,
}

impl Indicator {
    pub(crate) fn from_slice(slice: &[u8]) -> Result<Self, ParseError> {
        if slice.len() < 16 {
            return Err(ParseError::OutOfBounds(slice.len() * 8));
        }
        if &slice[0..4] != b"GRIB" {
            return Err(ParseError::NotGrib);
        }
        let edition = slice[7];
        if edition != 2 {
            return Err(ParseError::GribVersionMismatch(edition));
        }

        Ok(Self {
            discipline: slice[6],
            edition,
            total_length: read_as!(u64, slice, 8),
        })
    }
}

/// Reference time of the data, kept as the unchecked numbers recorded in
/// Section 1. Conversion to a checked date happens on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefTime {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl RefTime {
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let result = Utc.with_ymd_and_hms(
            i32::from(self.year),
            u32::from(self.month),
            u32::from(self.day),
            u32::from(self.hour),
            u32::from(self.minute),
            u32::from(self.second),
        );
        if let LocalResult::None = result {
            None
        } else {
            Some(result.unwrap())
        }
    }
}

impl Display for RefTime {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02} {:02}:{:02}:{:02} UTC",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

/// Section 1: identification of the originating centre and reference time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identification {
    /// Identification of originating/generating centre (see Common Code
    /// Table C-11)
    pub centre_id: u16,
    /// Identification of originating/generating sub-centre
    pub subcentre_id: u16,
    /// GRIB Master Tables Version Number (see Code Table 1.0)
    pub master_table_version: u8,
    /// GRIB Local Tables Version Number (see Code Table 1.1)
    pub local_table_version: u8,
    /// Significance of Reference Time (see Code Table 1.2)
    pub ref_time_significance: u8,
    /// Reference time of data
    pub ref_time: RefTime,
    /// Production status of processed data (see Code Table 1.3)
    pub prod_status: u8,
    /// Type of processed data (see Code Table 1.4)
    pub data_type: u8,
}

impl Identification {
    pub(crate) fn from_payload(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < 16 {
            return Err(ParseError::SectionSizeTooSmall(body.len()));
        }

        Ok(Self {
            centre_id: read_as!(u16, body, 0),
            subcentre_id: read_as!(u16, body, 2),
            master_table_version: body[4],
            local_table_version: body[5],
            ref_time_significance: body[6],
            ref_time: RefTime {
                year: read_as!(u16, body, 7),
                month: body[9],
                day: body[10],
                hour: body[11],
                minute: body[12],
                second: body[13],
            },
            prod_status: body[14],
            data_type: body[15],
        })
    }
}

/// Section 2: centre-specific bytes, carried opaquely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalUse {
    pub payload: Box<[u8]>,
}

/// Section 3: grid geometry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridDefinition {
    /// Source of grid definition (see Code Table 3.0)
    pub source: u8,
    /// Number of data points
    pub num_points: u32,
    /// Grid Definition Template Number
    pub template_number: u16,
    pub template: GridTemplate,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GridTemplate {
    /// Template 3.0: regular latitude/longitude (equidistant cylindrical)
    LatLon(LatLonGrid),
    /// Any other template, preserved as raw template bytes
    Unknown(Box<[u8]>),
}

impl GridDefinition {
    pub(crate) fn from_payload(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < 9 {
            return Err(ParseError::SectionSizeTooSmall(body.len()));
        }
        let num_list_size = body[5];
        let template_number = read_as!(u16, body, 7);

        // A non-empty list of numbers of points makes the grid quasi-regular
        // even under template 0; those are preserved raw.
        let template = if template_number == 0 && num_list_size == 0 {
            GridTemplate::LatLon(LatLonGrid::from_buf(&body[9..])?)
        } else {
            GridTemplate::Unknown(body[9..].to_vec().into_boxed_slice())
        };

        Ok(Self {
            source: body[0],
            num_points: read_as!(u32, body, 1),
            template_number,
            template,
        })
    }

    pub fn latlon(&self) -> Option<&LatLonGrid> {
        match &self.template {
            GridTemplate::LatLon(grid) => Some(grid),
            GridTemplate::Unknown(_) => None,
        }
    }
}

/// Grid definition template 3.0. Latitudes and longitudes are recorded in
/// microdegrees (10^-6 deg).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LatLonGrid {
    /// Number of points along a parallel
    pub ni: u32,
    /// Number of points along a meridian
    pub nj: u32,
    pub lat_first: i32,
    pub lon_first: i32,
    /// Resolution and component flags (see Flag Table 3.3); bit 0x08 set
    /// means vector components are grid-relative
    pub resolution_and_component_flags: u8,
    /// Last point as recorded in the file; the canonical last point is
    /// recomputed from the first point and increments
    pub lat_last_recorded: i32,
    pub lon_last_recorded: i32,
    pub i_increment: u32,
    pub j_increment: u32,
    pub scanning_mode: ScanningMode,
}

impl LatLonGrid {
    pub(crate) fn from_buf(buf: &[u8]) -> Result<Self, ParseError> {
        if buf.len() < 58 {
            return Err(ParseError::SectionSizeTooSmall(buf.len()));
        }

        Ok(Self {
            ni: read_as!(u32, buf, 16),
            nj: read_as!(u32, buf, 20),
            lat_first: read_as!(i32, buf, 32),
            lon_first: read_as!(i32, buf, 36),
            resolution_and_component_flags: buf[40],
            lat_last_recorded: read_as!(i32, buf, 41),
            lon_last_recorded: read_as!(i32, buf, 45),
            i_increment: read_as!(u32, buf, 49),
            j_increment: read_as!(u32, buf, 53),
            scanning_mode: ScanningMode(buf[57]),
        })
    }

    pub fn lat_first_deg(&self) -> f64 {
        f64::from(self.lat_first) * 1e-6
    }

    pub fn lon_first_deg(&self) -> f64 {
        f64::from(self.lon_first) * 1e-6
    }

    pub fn i_increment_deg(&self) -> f64 {
        f64::from(self.i_increment) * 1e-6
    }

    pub fn j_increment_deg(&self) -> f64 {
        f64::from(self.j_increment) * 1e-6
    }

    pub fn grid_shape(&self) -> (usize, usize) {
        (self.ni as usize, self.nj as usize)
    }
}

/// Section 4: what the field is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDefinition {
    /// Number of coordinate values after Template
    pub num_coordinates: u16,
    /// Product Definition Template Number
    pub template_number: u16,
    /// Template bytes (including trailing coordinate values, if any)
    pub templated: Box<[u8]>,
}

impl ProductDefinition {
    pub(crate) fn from_payload(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < 4 {
            return Err(ParseError::SectionSizeTooSmall(body.len()));
        }

        Ok(Self {
            num_coordinates: read_as!(u16, body, 0),
            template_number: read_as!(u16, body, 2),
            templated: body[4..].to_vec().into_boxed_slice(),
        })
    }

    // Templates 4.0 through 4.15 share the leading layout of template 4.0.
    fn template_supported(&self) -> bool {
        self.template_number <= 15
    }

    /// Use Code Table 4.1 to interpret the returned value.
    pub fn parameter_category(&self) -> Option<u8> {
        if self.template_supported() {
            self.templated.first().copied()
        } else {
            None
        }
    }

    /// Use Code Table 4.2 to interpret the returned value.
    pub fn parameter_number(&self) -> Option<u8> {
        if self.template_supported() {
            self.templated.get(1).copied()
        } else {
            None
        }
    }

    /// Forecast time unit (Code Table 4.4) and value.
    pub fn forecast_time(&self) -> Option<(u8, u32)> {
        if !self.template_supported() || self.templated.len() < 13 {
            return None;
        }
        let unit = self.templated[8];
        let templated = &self.templated;
        let value = read_as!(u32, templated, 9);
        Some((unit, value))
    }

    /// First fixed surface of the product.
    pub fn fixed_surface(&self) -> Option<FixedSurface> {
        if !self.template_supported() || self.templated.len() < 19 {
            return None;
        }
        let templated = &self.templated;
        Some(FixedSurface {
            surface_type: templated[13],
            scale_factor: templated[14] as i8,
            scaled_value: read_as!(i32, templated, 15),
        })
    }
}

/// A fixed surface (level) from a product definition template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedSurface {
    /// Use Code Table 4.5 to interpret the returned value.
    pub surface_type: u8,
    pub scale_factor: i8,
    pub scaled_value: i32,
}

impl FixedSurface {
    pub fn is_missing(&self) -> bool {
        self.surface_type == 255
    }

    /// The surface value with the scale factor applied.
    pub fn value(&self) -> f64 {
        if self.is_missing() {
            f64::NAN
        } else {
            f64::from(self.scaled_value) * 10_f64.powi(-i32::from(self.scale_factor))
        }
    }
}

/// Section 5: how the field is packed.
#[derive(Debug, Clone, PartialEq)]
pub struct ReprDefinition {
    /// Number of data points where one or more values are specified in
    /// Section 7 when a bit map is present, total number of data points
    /// when a bit map is absent
    pub num_points: u32,
    /// Data Representation Template Number
    pub template_number: u16,
    pub template: PackingTemplate,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PackingTemplate {
    /// Template 5.0: simple packing
    Simple(SimplePackingParam),
    /// Template 5.2: complex packing
    Complex(SimplePackingParam, ComplexPackingParam),
    /// Template 5.3: complex packing with spatial differencing
    ComplexSpatial(
        SimplePackingParam,
        ComplexPackingParam,
        SpatialDifferencingParam,
    ),
    /// Any other template, preserved as raw template bytes
    Unknown(Box<[u8]>),
}

impl ReprDefinition {
    pub(crate) fn from_payload(body: &[u8]) -> Result<Self, ParseError> {
        if body.len() < 6 {
            return Err(ParseError::SectionSizeTooSmall(body.len()));
        }
        let template_number = read_as!(u16, body, 4);
        let buf = &body[6..];

        let template = match template_number {
            0 => PackingTemplate::Simple(SimplePackingParam::from_buf(buf)?),
            2 => PackingTemplate::Complex(
                SimplePackingParam::from_buf(buf)?,
                ComplexPackingParam::from_buf(buf)?,
            ),
            3 => {
                if buf.len() < 38 {
                    return Err(ParseError::SectionSizeTooSmall(buf.len()));
                }
                PackingTemplate::ComplexSpatial(
                    SimplePackingParam::from_buf(buf)?,
                    ComplexPackingParam::from_buf(buf)?,
                    SpatialDifferencingParam {
                        order: buf[36],
                        extra_octets: buf[37],
                    },
                )
            }
            _ => PackingTemplate::Unknown(buf.to_vec().into_boxed_slice()),
        };

        Ok(Self {
            num_points: read_as!(u32, body, 0),
            template_number,
            template,
        })
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self.template, PackingTemplate::Unknown(_))
    }
}

/// Fields shared by templates 5.0, 5.2 and 5.3: the affine decode
/// `(R + X * 2^E) * 10^-D` plus the per-value bit width.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplePackingParam {
    /// Reference value (R)
    pub ref_val: f32,
    /// Binary scale factor (E)
    pub binary_scale: i16,
    /// Decimal scale factor (D)
    pub decimal_scale: i16,
    /// Number of bits used for each packed value
    pub num_bits: u8,
    /// Type of original field values (see Code Table 5.1)
    pub field_type: u8,
}

impl SimplePackingParam {
    pub(crate) fn from_buf(buf: &[u8]) -> Result<Self, ParseError> {
        if buf.len() < 10 {
            return Err(ParseError::SectionSizeTooSmall(buf.len()));
        }

        Ok(Self {
            ref_val: read_as!(f32, buf, 0),
            binary_scale: read_as!(i16, buf, 4),
            decimal_scale: read_as!(i16, buf, 6),
            num_bits: buf[8],
            field_type: buf[9],
        })
    }

    pub(crate) fn zero_bit_reference_value(&self) -> f32 {
        self.ref_val * 10_f32.powi(-i32::from(self.decimal_scale))
    }
}

/// Group metadata for templates 5.2 and 5.3 (Code Table 5.4 splitting).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ComplexPackingParam {
    /// Group splitting method used (see Code Table 5.4)
    pub group_splitting_method: u8,
    /// Missing value management used (see Code Table 5.5)
    pub missing_value_management: u8,
    pub primary_missing: f32,
    pub secondary_missing: f32,
    /// Number of groups of data values (NG)
    pub ngroup: u32,
    pub group_width_ref: u8,
    pub group_width_nbit: u8,
    pub group_len_ref: u32,
    pub group_len_inc: u8,
    pub group_len_last: u32,
    pub group_len_nbit: u8,
}

impl ComplexPackingParam {
    pub(crate) fn from_buf(buf: &[u8]) -> Result<Self, ParseError> {
        if buf.len() < 36 {
            return Err(ParseError::SectionSizeTooSmall(buf.len()));
        }

        Ok(Self {
            group_splitting_method: buf[10],
            missing_value_management: buf[11],
            primary_missing: read_as!(f32, buf, 12),
            secondary_missing: read_as!(f32, buf, 16),
            ngroup: read_as!(u32, buf, 20),
            group_width_ref: buf[24],
            group_width_nbit: buf[25],
            group_len_ref: read_as!(u32, buf, 26),
            group_len_inc: buf[30],
            group_len_last: read_as!(u32, buf, 31),
            group_len_nbit: buf[35],
        })
    }
}

/// Spatial differencing descriptor for template 5.3 (Code Table 5.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpatialDifferencingParam {
    /// Order of spatial differencing (1 or 2; 0 disables differencing)
    pub order: u8,
    /// Number of octets per extra descriptor in the data section
    pub extra_octets: u8,
}

/// Section 6: which points carry data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMap {
    /// Bit-map indicator: 0 means a bitmap follows, 255 means none applies
    pub indicator: u8,
    pub bitmap: Box<[u8]>,
}

impl BitMap {
    pub(crate) fn from_payload(body: &[u8]) -> Result<Self, ParseError> {
        if body.is_empty() {
            return Err(ParseError::SectionSizeTooSmall(0));
        }

        Ok(Self {
            indicator: body[0],
            bitmap: body[1..].to_vec().into_boxed_slice(),
        })
    }

    /// Masks positions whose bitmap bit is 0 to NaN. Positions are not
    /// removed; the output has the same length as the input field.
    pub fn apply(&self, field: &[f32]) -> Result<Vec<f32>, crate::error::DecodeError> {
        if self.indicator != 0 {
            return Ok(field.to_vec());
        }
        if self.bitmap.len() * 8 < field.len() {
            return Err(crate::error::DecodeError::LengthMismatch {
                expected: field.len(),
                actual: self.bitmap.len() * 8,
            });
        }

        Ok(field
            .iter()
            .enumerate()
            .map(|(n, v)| {
                let bit = self.bitmap[n / 8] >> (7 - n % 8) & 1;
                if bit == 0 {
                    f32::NAN
                } else {
                    *v
                }
            })
            .collect())
    }
}

/// Section 7: the field itself, decoded when the representation template is
/// one of 5.0/5.2/5.3 and raw otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSection {
    Decoded(Vec<f32>),
    Raw(Box<[u8]>),
}

impl DataSection {
    pub fn values(&self) -> Option<&[f32]> {
        match self {
            Self::Decoded(values) => Some(values),
            Self::Raw(_) => None,
        }
    }
}
