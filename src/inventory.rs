use std::fmt::{self, Display, Formatter};

use crate::codetables::{level_description, parameter_short_name, time_unit_name};
use crate::parser::Message;
use crate::sections::RefTime;

/// One message's line in a wgrib2-style inventory:
/// `{n}:{offset}:d={YYYYMMDDHH}:{PARAM}:{level}:{forecast_time}:`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InventoryEntry {
    /// 1-based message number
    pub message_number: usize,
    /// Byte offset of the message in the buffer
    pub offset: usize,
    pub ref_time: RefTime,
    /// Uppercased parameter short name
    pub parameter: String,
    pub level: String,
    pub forecast_time: String,
}

impl InventoryEntry {
    pub(crate) fn from_message(message: &Message, message_number: usize) -> Self {
        let discipline = message.indicator.discipline;
        let prod = &message.prod_definition;

        let parameter = match (prod.parameter_category(), prod.parameter_number()) {
            (Some(category), Some(number)) => parameter_short_name(discipline, category, number),
            _ => format!("TMPL_{}", prod.template_number),
        };

        let level = prod
            .fixed_surface()
            .map(|surface| level_description(&surface))
            .unwrap_or_else(|| "missing".to_owned());

        let forecast_time = prod
            .forecast_time()
            .map(|(unit, value)| describe_forecast_time(unit, value))
            .unwrap_or_else(|| "anl".to_owned());

        Self {
            message_number,
            offset: message.offset,
            ref_time: message.identification.ref_time,
            parameter,
            level,
            forecast_time,
        }
    }
}

impl Display for InventoryEntry {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}:d={:04}{:02}{:02}{:02}:{}:{}:{}:",
            self.message_number,
            self.offset,
            self.ref_time.year,
            self.ref_time.month,
            self.ref_time.day,
            self.ref_time.hour,
            self.parameter,
            self.level,
            self.forecast_time
        )
    }
}

fn describe_forecast_time(unit: u8, value: u32) -> String {
    if value == 0 {
        return "anl".to_owned();
    }
    match time_unit_name(unit) {
        Some(name) => format!("{value} {name} fcst"),
        None => format!("{value} (unit {unit}) fcst"),
    }
}

pub(crate) fn build_inventory(messages: &[Message]) -> Vec<InventoryEntry> {
    messages
        .iter()
        .enumerate()
        .map(|(i, message)| InventoryEntry::from_message(message, i + 1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forecast_time_text() {
        assert_eq!(describe_forecast_time(1, 0), "anl");
        assert_eq!(describe_forecast_time(1, 6), "6 hour fcst");
        assert_eq!(describe_forecast_time(0, 30), "30 min fcst");
        assert_eq!(describe_forecast_time(200, 3), "3 (unit 200) fcst");
    }
}
