use std::error::Error;
use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, PartialEq)]
pub enum GribError {
    ParseError(ParseError),
    DecodeError(DecodeError),
    QueryError(QueryError),
}

impl Error for GribError {}

impl From<ParseError> for GribError {
    fn from(e: ParseError) -> Self {
        Self::ParseError(e)
    }
}

impl From<DecodeError> for GribError {
    fn from(e: DecodeError) -> Self {
        Self::DecodeError(e)
    }
}

impl From<QueryError> for GribError {
    fn from(e: QueryError) -> Self {
        Self::QueryError(e)
    }
}

impl Display for GribError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::ParseError(e) => write!(f, "{e}"),
            Self::DecodeError(e) => write!(f, "{e}"),
            Self::QueryError(e) => write!(f, "{e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ParseError {
    NotGrib,
    GribVersionMismatch(u8),
    EndSectionMismatch,
    UnknownSectionNumber(u8),
    UnexpectedSection { expected: u8, found: u8 },
    MissingSection(u8),
    SectionSizeTooSmall(usize),
    MessageSizeMismatch { expected: u64, actual: u64 },
    OutOfBounds(usize),
}

impl Error for ParseError {}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::NotGrib => write!(f, "Not GRIB data"),
            Self::GribVersionMismatch(i) => write!(f, "Not GRIB edition 2: {i}"),
            Self::EndSectionMismatch => write!(f, "Content of End Section is not valid"),
            Self::UnknownSectionNumber(s) => write!(f, "Unknown section number: {s}"),
            Self::UnexpectedSection { expected, found } => {
                write!(f, "Expected section {expected}, found section {found}")
            }
            Self::MissingSection(s) => write!(f, "Mandatory section {s} not found"),
            Self::SectionSizeTooSmall(i) => write!(f, "Section size is too small: {i}"),
            Self::MessageSizeMismatch { expected, actual } => {
                write!(
                    f,
                    "Message declares {expected} octets but sections consume {actual}"
                )
            }
            Self::OutOfBounds(i) => write!(f, "Read beyond end of buffer at bit {i}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DecodeError {
    TemplateNumberUnsupported(u16),
    NotSupported(&'static str, u16),
    TruncatedPayload,
    LengthMismatch { expected: usize, actual: usize },
}

impl Error for DecodeError {}

impl Display for DecodeError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::TemplateNumberUnsupported(n) => {
                write!(f, "Data representation template {n} is not supported")
            }
            Self::NotSupported(what, value) => {
                write!(f, "Unsupported value for {what}: {value}")
            }
            Self::TruncatedPayload => write!(f, "Data section ends before group metadata"),
            Self::LengthMismatch { expected, actual } => {
                write!(f, "Expected {expected} values, got {actual}")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryError {
    NoMatch(String),
    InvalidPattern(String),
    MessageIndexOutOfRange(usize),
}

impl Error for QueryError {}

impl Display for QueryError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Self::NoMatch(pattern) => write!(f, "No inventory line matches `{pattern}`"),
            Self::InvalidPattern(e) => write!(f, "Invalid match pattern: {e}"),
            Self::MessageIndexOutOfRange(i) => write!(f, "Message index {i} out of range"),
        }
    }
}
