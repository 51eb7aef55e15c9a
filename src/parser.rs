use log::{debug, warn};

use crate::bits::read_as;
use crate::decoder;
use crate::error::{GribError, ParseError};
use crate::sections::{
    BitMap, DataSection, GridDefinition, Identification, Indicator, LocalUse, ProductDefinition,
    ReprDefinition,
};

const SECT0_IS_MAGIC: &[u8] = b"GRIB";
const SECT0_IS_SIZE: usize = 16;
const SECT_HEADER_SIZE: usize = 5;
const SECT8_ES_MAGIC: &[u8] = b"7777";
const SECT8_ES_SIZE: usize = SECT8_ES_MAGIC.len();

/// One decoded GRIB2 message: the parsed sections plus its position in the
/// input buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    /// Byte offset of the message within the input buffer
    pub offset: usize,
    pub indicator: Indicator,
    pub identification: Identification,
    pub local_use: Option<LocalUse>,
    pub grid_definition: GridDefinition,
    pub prod_definition: ProductDefinition,
    pub repr_definition: ReprDefinition,
    pub bitmap: Option<BitMap>,
    pub data: DataSection,
}

impl Message {
    /// The decoded field, or `None` when the data representation template
    /// is unsupported and Section 7 was preserved raw.
    pub fn field(&self) -> Option<&[f32]> {
        self.data.values()
    }
}

/// Walks the messages concatenated in a buffer.
///
/// Iteration ends when the buffer is exhausted, when no "GRIB" signature is
/// found at the cursor, or after yielding the error for a malformed
/// message.
pub struct MessageIter<'a> {
    buf: &'a [u8],
    pos: usize,
    stopped: bool,
}

impl<'a> MessageIter<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            pos: 0,
            stopped: false,
        }
    }
}

impl<'a> Iterator for MessageIter<'a> {
    type Item = Result<Message, GribError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stopped || self.pos >= self.buf.len() {
            return None;
        }
        let remaining = &self.buf[self.pos..];
        if remaining.len() < SECT0_IS_SIZE || &remaining[..4] != SECT0_IS_MAGIC {
            debug!("no GRIB signature at offset {}; stopping", self.pos);
            self.stopped = true;
            return None;
        }

        match parse_message(self.buf, self.pos) {
            Ok(message) => {
                self.pos += message.indicator.total_length as usize;
                Some(Ok(message))
            }
            Err(e) => {
                warn!("malformed message at offset {}: {e}", self.pos);
                self.stopped = true;
                Some(Err(e))
            }
        }
    }
}

fn parse_message(buf: &[u8], offset: usize) -> Result<Message, GribError> {
    let indicator = Indicator::from_slice(&buf[offset..])?;
    let total_length = indicator.total_length as usize;
    if total_length < SECT0_IS_SIZE + SECT8_ES_SIZE || offset + total_length > buf.len() {
        return Err(ParseError::OutOfBounds(buf.len() * 8).into());
    }
    let message_end = offset + total_length;

    let mut identification = None;
    let mut local_use = None;
    let mut grid_definition = None;
    let mut prod_definition = None;
    let mut repr_definition: Option<ReprDefinition> = None;
    let mut bitmap: Option<BitMap> = None;
    let mut data_body = None;

    let mut cursor = offset + SECT0_IS_SIZE;
    let mut last_num = 0u8;
    loop {
        if cursor + SECT8_ES_SIZE > message_end {
            return Err(ParseError::EndSectionMismatch.into());
        }
        if &buf[cursor..cursor + SECT8_ES_SIZE] == SECT8_ES_MAGIC {
            // Invariant: the end section closes the message exactly.
            if cursor + SECT8_ES_SIZE != message_end {
                return Err(ParseError::MessageSizeMismatch {
                    expected: indicator.total_length,
                    actual: (cursor + SECT8_ES_SIZE - offset) as u64,
                }
                .into());
            }
            break;
        }

        if cursor + SECT_HEADER_SIZE > message_end {
            return Err(ParseError::OutOfBounds(cursor * 8).into());
        }
        let length = read_as!(u32, buf, cursor) as usize;
        let num = buf[cursor + 4];
        if length < SECT_HEADER_SIZE || cursor + length > message_end {
            return Err(ParseError::OutOfBounds(cursor * 8).into());
        }
        if !(1..=7).contains(&num) {
            return Err(ParseError::UnknownSectionNumber(num).into());
        }
        if num <= last_num {
            return Err(ParseError::UnexpectedSection {
                expected: last_num + 1,
                found: num,
            }
            .into());
        }

        let body = &buf[cursor + SECT_HEADER_SIZE..cursor + length];
        match num {
            1 => identification = Some(Identification::from_payload(body)?),
            2 => {
                local_use = Some(LocalUse {
                    payload: body.to_vec().into_boxed_slice(),
                })
            }
            3 => grid_definition = Some(GridDefinition::from_payload(body)?),
            4 => prod_definition = Some(ProductDefinition::from_payload(body)?),
            5 => repr_definition = Some(ReprDefinition::from_payload(body)?),
            6 => bitmap = Some(BitMap::from_payload(body)?),
            7 => data_body = Some(body),
            _ => unreachable!(),
        }
        last_num = num;
        cursor += length;
    }

    let identification = identification.ok_or(ParseError::MissingSection(1))?;
    let grid_definition = grid_definition.ok_or(ParseError::MissingSection(3))?;
    let prod_definition = prod_definition.ok_or(ParseError::MissingSection(4))?;
    let repr_definition = repr_definition.ok_or(ParseError::MissingSection(5))?;
    let data_body = data_body.ok_or(ParseError::MissingSection(7))?;

    let data = if repr_definition.is_supported() {
        let decoded = decoder::dispatch(&repr_definition, data_body)?;
        let decoded = match &bitmap {
            Some(b) if b.indicator == 0 => b.apply(&decoded)?,
            _ => decoded,
        };
        DataSection::Decoded(decoded)
    } else {
        debug!(
            "data representation template {} preserved raw",
            repr_definition.template_number
        );
        DataSection::Raw(data_body.to_vec().into_boxed_slice())
    };

    let bitmap_absent = bitmap.as_ref().map_or(true, |b| b.indicator != 0);
    if bitmap_absent && grid_definition.num_points != repr_definition.num_points {
        warn!(
            "grid defines {} points but data section encodes {}",
            grid_definition.num_points, repr_definition.num_points
        );
    }

    Ok(Message {
        offset,
        indicator,
        identification,
        local_use,
        grid_definition,
        prod_definition,
        repr_definition,
        bitmap,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push_section(message: &mut Vec<u8>, num: u8, body: &[u8]) {
        message.extend_from_slice(&((body.len() + SECT_HEADER_SIZE) as u32).to_be_bytes());
        message.push(num);
        message.extend_from_slice(body);
    }

    /// A minimal single-message file: 2x2 grid, simple packing with
    /// `num_bits = 0` (constant field).
    fn constant_field_message() -> Vec<u8> {
        let mut body = Vec::new();

        let mut sect1 = vec![0u8; 16];
        sect1[0..2].copy_from_slice(&7u16.to_be_bytes());
        sect1[7..9].copy_from_slice(&2024u16.to_be_bytes());
        sect1[9] = 7;
        sect1[10] = 1;
        sect1[11] = 12;
        push_section(&mut body, 1, &sect1);

        let mut grid_tmpl = vec![0u8; 58];
        grid_tmpl[16..20].copy_from_slice(&2u32.to_be_bytes());
        grid_tmpl[20..24].copy_from_slice(&2u32.to_be_bytes());
        grid_tmpl[32..36].copy_from_slice(&10_000_000i32.to_be_bytes());
        grid_tmpl[36..40].copy_from_slice(&20_000_000i32.to_be_bytes());
        grid_tmpl[41..45].copy_from_slice(&9_000_000i32.to_be_bytes());
        grid_tmpl[45..49].copy_from_slice(&21_000_000i32.to_be_bytes());
        grid_tmpl[49..53].copy_from_slice(&1_000_000u32.to_be_bytes());
        grid_tmpl[53..57].copy_from_slice(&1_000_000u32.to_be_bytes());
        let mut sect3 = vec![0u8; 9];
        sect3[1..5].copy_from_slice(&4u32.to_be_bytes());
        sect3.extend_from_slice(&grid_tmpl);
        push_section(&mut body, 3, &sect3);

        let mut sect4 = vec![0u8; 4];
        sect4.extend_from_slice(&[0u8; 25]);
        sect4[4 + 8] = 1;
        sect4[4 + 13] = 1;
        push_section(&mut body, 4, &sect4);

        let mut sect5 = vec![0u8; 17];
        sect5[0..4].copy_from_slice(&4u32.to_be_bytes());
        sect5[6..10].copy_from_slice(&273.15f32.to_be_bytes());
        push_section(&mut body, 5, &sect5);

        push_section(&mut body, 6, &[255]);
        push_section(&mut body, 7, &[]);

        let total_length = SECT0_IS_SIZE + body.len() + SECT8_ES_SIZE;
        let mut message = Vec::with_capacity(total_length);
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0, 0, 2]);
        message.extend_from_slice(&(total_length as u64).to_be_bytes());
        message.extend_from_slice(&body);
        message.extend_from_slice(SECT8_ES_MAGIC);
        message
    }

    #[test]
    fn parse_one_message() {
        let buf = constant_field_message();
        let messages = MessageIter::new(&buf)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(messages.len(), 1);

        let message = &messages[0];
        assert_eq!(message.offset, 0);
        assert_eq!(message.indicator.total_length as usize, buf.len());
        assert_eq!(message.identification.centre_id, 7);
        assert_eq!(message.grid_definition.num_points, 4);
        assert_eq!(message.field(), Some(&[273.15f32; 4][..]));
    }

    #[test]
    fn parse_concatenated_messages_tracks_offsets() {
        let one = constant_field_message();
        let buf = one.repeat(3);
        let messages = MessageIter::new(&buf)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].offset, 0);
        assert_eq!(messages[1].offset, one.len());
        assert_eq!(messages[2].offset, one.len() * 2);
        let total: u64 = messages.iter().map(|m| m.indicator.total_length).sum();
        assert_eq!(total as usize, buf.len());
    }

    #[test]
    fn iteration_stops_at_trailing_garbage() {
        let mut buf = constant_field_message();
        buf.extend_from_slice(b"extra");
        let messages: Vec<_> = MessageIter::new(&buf).collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_ok());
    }

    #[test]
    fn wrong_edition_is_an_error() {
        let mut buf = constant_field_message();
        buf[7] = 1;
        let messages: Vec<_> = MessageIter::new(&buf).collect();
        assert_eq!(
            messages,
            vec![Err(GribError::ParseError(ParseError::GribVersionMismatch(
                1
            )))]
        );
    }

    #[test]
    fn missing_end_section_is_an_error() {
        let mut buf = constant_field_message();
        let n = buf.len();
        buf[n - 4..].copy_from_slice(b"8888");
        let messages: Vec<_> = MessageIter::new(&buf).collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_err());
    }

    #[test]
    fn understated_total_length_is_an_error() {
        // Shrinking total_length makes the section chain overrun the
        // declared end of the message.
        let mut buf = constant_field_message();
        buf[15] -= 1;
        let messages: Vec<_> = MessageIter::new(&buf).collect();
        assert_eq!(messages.len(), 1);
        assert!(messages[0].is_err());
    }
}
