//! Builds minimal synthetic GRIB2 messages in memory so tests do not need
//! sample files.

/// Assembles one GRIB2 message byte-by-byte with configurable grid,
/// product and packing. Defaults describe a 3x3 one-degree grid of
/// surface temperature, analysis time 2024-07-01 12Z.
pub struct Grib2Builder {
    discipline: u8,
    centre: u16,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    ni: u32,
    nj: u32,
    la1: i32,
    lo1: i32,
    di: u32,
    dj: u32,
    scanning_mode: u8,
    resolution_flags: u8,
    param_category: u8,
    param_number: u8,
    level_type: u8,
    level_value: i32,
    time_unit: u8,
    forecast_value: u32,
    repr_template: u16,
    repr_bytes: Vec<u8>,
    data_bytes: Vec<u8>,
    bitmap: Option<Vec<u8>>,
}

#[allow(dead_code)]
impl Grib2Builder {
    pub fn new() -> Self {
        Self {
            discipline: 0,
            centre: 7,
            year: 2024,
            month: 7,
            day: 1,
            hour: 12,
            ni: 3,
            nj: 3,
            la1: 50_000_000,
            lo1: 10_000_000,
            di: 1_000_000,
            dj: 1_000_000,
            scanning_mode: 0,
            resolution_flags: 0,
            param_category: 0,
            param_number: 0,
            level_type: 1,
            level_value: 0,
            time_unit: 1,
            forecast_value: 0,
            repr_template: 0,
            repr_bytes: simple_packing_bytes(0.0, 0, 0, 0),
            data_bytes: Vec::new(),
            bitmap: None,
        }
    }

    pub fn with_grid(mut self, ni: u32, nj: u32, la1: f64, lo1: f64, di: f64, dj: f64) -> Self {
        self.ni = ni;
        self.nj = nj;
        self.la1 = (la1 * 1e6).round() as i32;
        self.lo1 = (lo1 * 1e6).round() as i32;
        self.di = (di * 1e6).round() as u32;
        self.dj = (dj * 1e6).round() as u32;
        self
    }

    pub fn with_scanning_mode(mut self, scanning_mode: u8) -> Self {
        self.scanning_mode = scanning_mode;
        self
    }

    pub fn with_resolution_flags(mut self, flags: u8) -> Self {
        self.resolution_flags = flags;
        self
    }

    pub fn with_parameter(mut self, category: u8, number: u8) -> Self {
        self.param_category = category;
        self.param_number = number;
        self
    }

    pub fn with_level(mut self, level_type: u8, level_value: i32) -> Self {
        self.level_type = level_type;
        self.level_value = level_value;
        self
    }

    pub fn with_forecast(mut self, time_unit: u8, value: u32) -> Self {
        self.time_unit = time_unit;
        self.forecast_value = value;
        self
    }

    pub fn with_reference_time(mut self, year: u16, month: u8, day: u8, hour: u8) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self.hour = hour;
        self
    }

    /// Template 5.0 with the given packing parameters and packed bytes.
    pub fn with_simple_packing(
        mut self,
        ref_val: f32,
        binary_scale: i16,
        decimal_scale: i16,
        num_bits: u8,
        data: Vec<u8>,
    ) -> Self {
        self.repr_template = 0;
        self.repr_bytes = simple_packing_bytes(ref_val, binary_scale, decimal_scale, num_bits);
        self.data_bytes = data;
        self
    }

    /// A Section 6 bitmap (indicator 0) with the given bit bytes.
    pub fn with_bitmap(mut self, bitmap: Vec<u8>) -> Self {
        self.bitmap = Some(bitmap);
        self
    }

    /// Any Section 5 template by number, with raw template and data bytes.
    pub fn with_packing(mut self, template: u16, repr_bytes: Vec<u8>, data: Vec<u8>) -> Self {
        self.repr_template = template;
        self.repr_bytes = repr_bytes;
        self.data_bytes = data;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let num_points = self.ni * self.nj;
        let mut body = Vec::new();

        let mut sect1 = vec![0u8; 16];
        sect1[0..2].copy_from_slice(&self.centre.to_be_bytes());
        sect1[4] = 2;
        sect1[6] = 1;
        sect1[7..9].copy_from_slice(&self.year.to_be_bytes());
        sect1[9] = self.month;
        sect1[10] = self.day;
        sect1[11] = self.hour;
        sect1[15] = 1;
        push_section(&mut body, 1, &sect1);

        push_section(&mut body, 3, &self.section3(num_points));
        push_section(&mut body, 4, &self.section4());

        let mut sect5 = Vec::with_capacity(6 + self.repr_bytes.len());
        sect5.extend_from_slice(&num_points.to_be_bytes());
        sect5.extend_from_slice(&self.repr_template.to_be_bytes());
        sect5.extend_from_slice(&self.repr_bytes);
        push_section(&mut body, 5, &sect5);

        match &self.bitmap {
            Some(bits) => {
                let mut sect6 = vec![0u8];
                sect6.extend_from_slice(bits);
                push_section(&mut body, 6, &sect6);
            }
            None => push_section(&mut body, 6, &[255]),
        }
        push_section(&mut body, 7, &self.data_bytes);

        let total_length = 16 + body.len() + 4;
        let mut message = Vec::with_capacity(total_length);
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]);
        message.push(self.discipline);
        message.push(2);
        message.extend_from_slice(&(total_length as u64).to_be_bytes());
        message.extend_from_slice(&body);
        message.extend_from_slice(b"7777");
        message
    }

    fn section3(&self, num_points: u32) -> Vec<u8> {
        let i_sign: i64 = if self.scanning_mode & 0x80 == 0 { 1 } else { -1 };
        let j_sign: i64 = if self.scanning_mode & 0x40 != 0 { 1 } else { -1 };
        let la2 = i64::from(self.la1) + i64::from(self.nj - 1) * i64::from(self.dj) * j_sign;
        let lo2 = i64::from(self.lo1) + i64::from(self.ni - 1) * i64::from(self.di) * i_sign;

        let mut tmpl = vec![0u8; 58];
        tmpl[16..20].copy_from_slice(&self.ni.to_be_bytes());
        tmpl[20..24].copy_from_slice(&self.nj.to_be_bytes());
        tmpl[32..36].copy_from_slice(&self.la1.to_be_bytes());
        tmpl[36..40].copy_from_slice(&self.lo1.to_be_bytes());
        tmpl[40] = self.resolution_flags;
        tmpl[41..45].copy_from_slice(&(la2 as i32).to_be_bytes());
        tmpl[45..49].copy_from_slice(&(lo2 as i32).to_be_bytes());
        tmpl[49..53].copy_from_slice(&self.di.to_be_bytes());
        tmpl[53..57].copy_from_slice(&self.dj.to_be_bytes());
        tmpl[57] = self.scanning_mode;

        let mut sect3 = vec![0u8; 9];
        sect3[1..5].copy_from_slice(&num_points.to_be_bytes());
        sect3.extend_from_slice(&tmpl);
        sect3
    }

    fn section4(&self) -> Vec<u8> {
        let mut tmpl = vec![0u8; 25];
        tmpl[0] = self.param_category;
        tmpl[1] = self.param_number;
        tmpl[8] = self.time_unit;
        tmpl[9..13].copy_from_slice(&self.forecast_value.to_be_bytes());
        tmpl[13] = self.level_type;
        tmpl[15..19].copy_from_slice(&self.level_value.to_be_bytes());
        tmpl[19] = 255;

        let mut sect4 = vec![0u8; 4];
        sect4.extend_from_slice(&tmpl);
        sect4
    }
}

fn push_section(message: &mut Vec<u8>, num: u8, body: &[u8]) {
    message.extend_from_slice(&((body.len() + 5) as u32).to_be_bytes());
    message.push(num);
    message.extend_from_slice(body);
}

/// Template 5.0 bytes: reference value, binary/decimal scales, bit width.
#[allow(dead_code)]
pub fn simple_packing_bytes(
    ref_val: f32,
    binary_scale: i16,
    decimal_scale: i16,
    num_bits: u8,
) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(10);
    bytes.extend_from_slice(&ref_val.to_be_bytes());
    bytes.extend_from_slice(&binary_scale.to_be_bytes());
    bytes.extend_from_slice(&decimal_scale.to_be_bytes());
    bytes.push(num_bits);
    bytes.push(0);
    bytes
}

/// Template 5.2/5.3 bytes: the simple-packing prefix plus group metadata
/// and, for 5.3, the spatial differencing descriptor.
#[allow(clippy::too_many_arguments)]
#[allow(dead_code)]
pub fn complex_packing_bytes(
    ref_val: f32,
    num_bits: u8,
    ngroup: u32,
    group_width_ref: u8,
    group_width_nbit: u8,
    group_len_ref: u32,
    group_len_inc: u8,
    group_len_last: u32,
    group_len_nbit: u8,
    spatial: Option<(u8, u8)>,
) -> Vec<u8> {
    let mut bytes = simple_packing_bytes(ref_val, 0, 0, num_bits);
    bytes.push(1); // group splitting method: general group splitting
    bytes.push(0); // no missing value management
    bytes.extend_from_slice(&[0u8; 8]); // primary/secondary missing values
    bytes.extend_from_slice(&ngroup.to_be_bytes());
    bytes.push(group_width_ref);
    bytes.push(group_width_nbit);
    bytes.extend_from_slice(&group_len_ref.to_be_bytes());
    bytes.push(group_len_inc);
    bytes.extend_from_slice(&group_len_last.to_be_bytes());
    bytes.push(group_len_nbit);
    if let Some((order, extra_octets)) = spatial {
        bytes.push(order);
        bytes.push(extra_octets);
    }
    bytes
}
