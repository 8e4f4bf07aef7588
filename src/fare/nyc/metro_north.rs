use serde::Deserialize;

use crate::fare::Error;

/// `mnr_fares.csv`: `from_stop_id,to_stop_id,peak,offpeak`.
#[derive(Debug, Clone, Deserialize)]
pub struct MnrFare {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub peak: i64,
    pub offpeak: i64,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct MetroNorthTables {
    pub fares: Vec<MnrFare>,
}

impl MetroNorthTables {
    /// Simpler than LIRR: no via-fare table, just a direct peak/off-peak
    /// matrix keyed by stop pair. Line and direction changes are handled by
    /// the caller starting a new ticket, not by this lookup.
    pub fn fare(&self, from_stop: &str, to_stop: &str, peak: bool) -> Result<i64, Error> {
        let entry = self
            .fares
            .iter()
            .find(|f| f.from_stop_id == from_stop && f.to_stop_id == to_stop)
            .ok_or(Error::FareNotFound)?;
        Ok(if peak { entry.peak } else { entry.offpeak })
    }
}
