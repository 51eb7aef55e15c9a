use num::ToPrimitive;

use crate::error::DecodeError;
use crate::sections::{PackingTemplate, ReprDefinition, SimplePackingParam};

mod complex;
mod simple;

/// Expands a Section 7 payload into the floating-point field described by
/// the data representation section.
pub(crate) fn dispatch(repr: &ReprDefinition, payload: &[u8]) -> Result<Vec<f32>, DecodeError> {
    let num_points = repr.num_points as usize;
    let decoded = match &repr.template {
        PackingTemplate::Simple(param) => simple::decode(param, num_points, payload)?,
        PackingTemplate::Complex(param, groups) => {
            complex::decode(param, groups, None, num_points, payload)?
        }
        PackingTemplate::ComplexSpatial(param, groups, spdiff) => {
            complex::decode(param, groups, Some(spdiff), num_points, payload)?
        }
        PackingTemplate::Unknown(_) => {
            return Err(DecodeError::TemplateNumberUnsupported(repr.template_number))
        }
    };

    if decoded.len() != num_points {
        return Err(DecodeError::LengthMismatch {
            expected: num_points,
            actual: decoded.len(),
        });
    }
    Ok(decoded)
}

/// Applies the affine decode `(R + X * 2^E) * 10^-D` to a stream of packed
/// integers.
pub(crate) struct SimplePackingDecodeIterator<I> {
    iter: I,
    ref_val: f32,
    exp: i32,
    dig: i32,
}

impl<I> SimplePackingDecodeIterator<I> {
    pub(crate) fn new(iter: I, param: &SimplePackingParam) -> Self {
        Self {
            iter,
            ref_val: param.ref_val,
            exp: param.binary_scale.into(),
            dig: param.decimal_scale.into(),
        }
    }
}

impl<I: Iterator<Item = N>, N: ToPrimitive> Iterator for SimplePackingDecodeIterator<I> {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        match self.iter.next() {
            Some(encoded) => {
                let encoded = encoded.to_f32().unwrap();
                let diff = encoded * 2_f32.powi(self.exp);
                let dig_factor = 10_f32.powi(-self.dig);
                Some((self.ref_val + diff) * dig_factor)
            }
            None => None,
        }
    }
}

pub(crate) struct FixedValueIterator<T> {
    val: T,
    length: usize,
    pos: usize,
}

impl<T> FixedValueIterator<T> {
    pub(crate) fn new(val: T, length: usize) -> Self {
        Self {
            val,
            length,
            pos: 0,
        }
    }
}

impl<T: Copy> Iterator for FixedValueIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        if self.pos < self.length {
            self.pos += 1;
            Some(self.val)
        } else {
            None
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let size = self.length - self.pos;
        (size, Some(size))
    }
}
