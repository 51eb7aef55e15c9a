use crate::error::{DecodeError, GribError, ParseError, QueryError};
use crate::grid::{GridInfo, LongitudeRange};
use crate::inventory::{build_inventory, InventoryEntry};
use crate::parser::{Message, MessageIter};
use crate::query::{self, DataOutput, GetDataOptions};

/// Parses a buffer of concatenated GRIB2 messages and returns a reader over
/// them.
pub fn from_slice(buf: &[u8]) -> Result<Grib2Reader, GribError> {
    Grib2Reader::new(buf)
}

/// A parsed GRIB2 file: the borrowed input buffer plus its decoded
/// messages, with query entry points over them.
pub struct Grib2Reader<'a> {
    buf: &'a [u8],
    messages: Vec<Message>,
}

impl<'a> Grib2Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Result<Self, GribError> {
        if !buf.is_empty() && (buf.len() < 4 || &buf[..4] != b"GRIB") {
            return Err(ParseError::NotGrib.into());
        }
        let messages = MessageIter::new(buf).collect::<Result<Vec<_>, _>>()?;
        Ok(Self { buf, messages })
    }

    /// The raw bytes this reader was built over.
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    /// Returns the number of messages in the buffer.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns `true` if the buffer holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Materialises the coordinate arrays of one message's grid, with
    /// longitudes preserved as recorded. Fails for grid templates other
    /// than 3.0.
    pub fn get_grid(&self, message_index: usize) -> Result<GridInfo, GribError> {
        let message = self
            .messages
            .get(message_index)
            .ok_or(QueryError::MessageIndexOutOfRange(message_index))?;
        let latlon = message.grid_definition.latlon().ok_or_else(|| {
            GribError::DecodeError(DecodeError::TemplateNumberUnsupported(
                message.grid_definition.template_number,
            ))
        })?;
        GridInfo::from_latlon(latlon, LongitudeRange::Preserve)
    }

    /// One wgrib2-style inventory line per message.
    pub fn get_inventory(&self) -> Vec<InventoryEntry> {
        build_inventory(&self.messages)
    }

    /// Selects, filters and shapes decoded fields; see [`GetDataOptions`].
    pub fn get_data(&self, options: &GetDataOptions) -> Result<DataOutput, GribError> {
        query::get_data(&self.messages, options)
    }
}
