use log::warn;

use crate::bits::BitReader;
use crate::decoder::SimplePackingDecodeIterator;
use crate::error::DecodeError;
use crate::sections::{ComplexPackingParam, SimplePackingParam, SpatialDifferencingParam};

/// Templates 5.2 and 5.3: group references, widths and lengths precede the
/// packed values, each metadata array padded to the next byte boundary. For
/// 5.3 a spatial-differencing header (which is not padded) comes first and
/// the integer field is reconstructed by reversing first or second
/// differences.
pub(crate) fn decode(
    param: &SimplePackingParam,
    groups: &ComplexPackingParam,
    spdiff: Option<&SpatialDifferencingParam>,
    num_points: usize,
    payload: &[u8],
) -> Result<Vec<f32>, DecodeError> {
    if param.field_type != 0 {
        return Err(DecodeError::NotSupported(
            "GRIB2 code table 5.1 (type of original field values)",
            param.field_type.into(),
        ));
    }
    if groups.group_splitting_method != 1 {
        return Err(DecodeError::NotSupported(
            "GRIB2 code table 5.4 (group splitting method)",
            groups.group_splitting_method.into(),
        ));
    }
    if groups.missing_value_management > 2 {
        return Err(DecodeError::NotSupported(
            "GRIB2 code table 5.5 (missing value management)",
            groups.missing_value_management.into(),
        ));
    }

    let mut reader = BitReader::new(payload);

    let diff_header = match spdiff {
        Some(sp) if sp.order > 0 => Some(DiffHeader::read(sp, &mut reader)?),
        _ => None,
    };

    let ngroup = groups.ngroup as usize;

    let refs = read_group_array(&mut reader, usize::from(param.num_bits), ngroup)?;
    reader.align_to_byte();

    let widths: Vec<usize> =
        read_group_array(&mut reader, usize::from(groups.group_width_nbit), ngroup)?
            .into_iter()
            .map(|w| w as usize + usize::from(groups.group_width_ref))
            .collect();
    reader.align_to_byte();
    if let Some(&bad) = widths.iter().find(|w| **w > 32) {
        return Err(DecodeError::NotSupported("group width", bad as u16));
    }

    let mut lengths: Vec<usize> =
        read_group_array(&mut reader, usize::from(groups.group_len_nbit), ngroup)?
            .into_iter()
            .map(|v| v as usize * usize::from(groups.group_len_inc) + groups.group_len_ref as usize)
            .collect();
    if let Some(last) = lengths.last_mut() {
        *last = groups.group_len_last as usize;
    }
    reader.align_to_byte();

    // Integer field accumulation; a payload that runs out mid-expansion
    // zero-fills the tail instead of failing the whole message.
    let mut ints: Vec<i64> = Vec::with_capacity(num_points);
    'expand: for ((&reference, &width), &length) in refs.iter().zip(&widths).zip(&lengths) {
        for _ in 0..length {
            if ints.len() == num_points {
                break 'expand;
            }
            if width == 0 {
                ints.push(reference as i64);
                continue;
            }
            match reader.read_bits(width) {
                Ok(raw) => ints.push(reference as i64 + raw as i64),
                Err(_) => break 'expand,
            }
        }
    }
    if ints.len() < num_points {
        warn!(
            "data section truncated; zero-filling {} of {} values",
            num_points - ints.len(),
            num_points
        );
        ints.resize(num_points, 0);
    }

    if let Some(header) = diff_header {
        header.reverse(&mut ints);
    }

    Ok(SimplePackingDecodeIterator::new(ints.into_iter(), param).collect())
}

fn read_header_bits(reader: &mut BitReader, n: usize) -> Result<u64, DecodeError> {
    reader
        .read_bits(n)
        .map_err(|_| DecodeError::TruncatedPayload)
}

fn read_group_array(
    reader: &mut BitReader,
    nbit: usize,
    count: usize,
) -> Result<Vec<u64>, DecodeError> {
    let mut values = Vec::with_capacity(count);
    for _ in 0..count {
        values.push(
            reader
                .read_bits(nbit)
                .map_err(|_| DecodeError::TruncatedPayload)?,
        );
    }
    Ok(values)
}

/// Extra descriptors preceding the group metadata in template 5.3: the
/// first one or two original field values, then the overall minimum of the
/// differences as a sign bit followed by a magnitude (not two's complement).
struct DiffHeader {
    order: u8,
    first_values: [i64; 2],
    minimum: i64,
}

impl DiffHeader {
    fn read(
        param: &SpatialDifferencingParam,
        reader: &mut BitReader,
    ) -> Result<Self, DecodeError> {
        if param.order > 2 {
            return Err(DecodeError::NotSupported(
                "GRIB2 code table 5.6 (order of spatial differencing)",
                param.order.into(),
            ));
        }
        if param.extra_octets == 0 || param.extra_octets > 4 {
            return Err(DecodeError::NotSupported(
                "number of extra descriptor octets",
                param.extra_octets.into(),
            ));
        }

        let nbitsd = usize::from(param.extra_octets) * 8;

        let h1 = read_header_bits(reader, nbitsd)? as i64;
        let h2 = if param.order == 2 {
            read_header_bits(reader, nbitsd)? as i64
        } else {
            0
        };
        let sign = read_header_bits(reader, 1)?;
        let magnitude = read_header_bits(reader, nbitsd - 1)? as i64;
        let minimum = if sign == 1 { -magnitude } else { magnitude };

        Ok(Self {
            order: param.order,
            first_values: [h1, h2],
            minimum,
        })
    }

    fn reverse(&self, ints: &mut [i64]) {
        let [h1, h2] = self.first_values;
        match self.order {
            1 => {
                if let Some(first) = ints.first_mut() {
                    *first = h1;
                }
                for n in 1..ints.len() {
                    ints[n] += self.minimum + ints[n - 1];
                }
            }
            _ => {
                if let Some(first) = ints.first_mut() {
                    *first = h1;
                }
                if let Some(second) = ints.get_mut(1) {
                    *second = h2;
                }
                for n in 2..ints.len() {
                    ints[n] += self.minimum + 2 * ints[n - 1] - ints[n - 2];
                }
            }
        }
    }
}
