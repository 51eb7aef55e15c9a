use log::warn;

use crate::bits::NBitwiseIterator;
use crate::decoder::{FixedValueIterator, SimplePackingDecodeIterator};
use crate::error::DecodeError;
use crate::sections::SimplePackingParam;

/// Template 5.0: each value is an `num_bits`-wide unsigned integer decoded
/// by affine scaling. `num_bits == 0` encodes a constant field.
pub(crate) fn decode(
    param: &SimplePackingParam,
    num_points: usize,
    payload: &[u8],
) -> Result<Vec<f32>, DecodeError> {
    if param.field_type != 0 {
        return Err(DecodeError::NotSupported(
            "GRIB2 code table 5.1 (type of original field values)",
            param.field_type.into(),
        ));
    }

    if param.num_bits == 0 {
        return Ok(FixedValueIterator::new(param.zero_bit_reference_value(), num_points).collect());
    }

    let iter = NBitwiseIterator::new(payload, usize::from(param.num_bits)).take(num_points);
    let mut decoded: Vec<f32> = SimplePackingDecodeIterator::new(iter, param).collect();
    if decoded.len() < num_points {
        warn!(
            "data section truncated; zero-filling {} of {} values",
            num_points - decoded.len(),
            num_points
        );
        decoded.resize(num_points, 0.0);
    }
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param(ref_val: f32, num_bits: u8) -> SimplePackingParam {
        SimplePackingParam {
            ref_val,
            binary_scale: 0,
            decimal_scale: 0,
            num_bits,
            field_type: 0,
        }
    }

    #[test]
    fn zero_bit_field_is_constant() {
        let decoded = decode(&param(273.15, 0), 9, &[]).unwrap();
        assert_eq!(decoded, vec![273.15; 9]);
    }

    #[test]
    fn four_bit_gradient() {
        // Values 0..=8 packed 4 bits each.
        let payload = [0x01, 0x23, 0x45, 0x67, 0x80];
        let decoded = decode(&param(0.0, 4), 9, &payload).unwrap();
        assert_eq!(decoded, vec![0., 1., 2., 3., 4., 5., 6., 7., 8.]);
    }

    #[test]
    fn truncated_payload_zero_fills() {
        let payload = [0x01, 0x23];
        let decoded = decode(&param(0.0, 4), 9, &payload).unwrap();
        assert_eq!(decoded, vec![0., 1., 2., 3., 0., 0., 0., 0., 0.]);
    }

    #[test]
    fn non_float_original_type_is_rejected() {
        let mut p = param(0.0, 4);
        p.field_type = 1;
        assert_eq!(
            decode(&p, 1, &[0x00]),
            Err(DecodeError::NotSupported(
                "GRIB2 code table 5.1 (type of original field values)",
                1,
            ))
        );
    }
}
