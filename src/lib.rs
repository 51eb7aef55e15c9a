//! A reader for GRIB2 (GRIdded Binary, edition 2) meteorological data.
//!
//! The entry point is [`from_slice`], which walks the messages concatenated
//! in a byte buffer. Each [`Message`] carries its parsed sections and, for
//! data representation templates 5.0/5.2/5.3, the decoded field.
//! [`Grib2Reader::get_data`] selects and filters fields through a
//! wgrib2-style inventory, derives wind speed and direction, and shapes the
//! result as parallel arrays or per-point records. [`DataView`] offers
//! bilinear point interpolation and regridding on regular lat/lon grids.

mod bits;
pub mod codetables;
mod context;
mod decoder;
mod error;
mod grid;
mod interp;
mod inventory;
mod parser;
mod query;
mod sections;

pub use crate::{
    context::*, error::*, grid::*, interp::*, inventory::*, parser::*, query::*, sections::*,
};
