use std::collections::HashMap;

use serde::Deserialize;

use crate::fare::Error;

/// `lirr_zonal_fares.csv`: `from_zone,to_zone,amount,peak`.
#[derive(Debug, Clone, Deserialize)]
pub struct ZonalFare {
    pub from_zone: String,
    pub to_zone: String,
    pub amount: i64,
    pub peak: bool,
}

/// `via_fares.csv`: `from_stop_id,to_stop_id,via_stop_id,amount,peak`.
#[derive(Debug, Clone, Deserialize)]
pub struct ViaFare {
    pub from_stop_id: String,
    pub to_stop_id: String,
    pub via_stop_id: String,
    pub amount: i64,
    pub peak: bool,
}

/// Static LIRR reference tables, loaded once from packaged CSVs and cached
/// for the lifetime of the owning transit data provider.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LirrTables {
    pub zonal_fares: Vec<ZonalFare>,
    pub via_fares: Vec<ViaFare>,
    /// `override` table consulted before `via_fares` for irregular routings.
    #[serde(default)]
    pub via_fare_overrides: Vec<ViaFare>,
    pub stop_fare_zones: HashMap<String, String>,
    /// `descendants.csv`: stop -> (stop -> inbound/outbound reachable).
    #[serde(default)]
    pub descendants: HashMap<String, HashMap<String, Direction>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Inbound,
    Outbound,
}

impl LirrTables {
    pub fn zone_of(&self, stop_id: &str) -> Result<&str, Error> {
        self.stop_fare_zones
            .get(stop_id)
            .map(String::as_str)
            .ok_or_else(|| Error::MalformedStaticData(format!("no fare zone for LIRR stop {stop_id}")))
    }

    fn zonal_fare(&self, from_zone: &str, to_zone: &str, peak: bool) -> Option<i64> {
        self.zonal_fares
            .iter()
            .find(|f| f.from_zone == from_zone && f.to_zone == to_zone && f.peak == peak)
            .map(|f| f.amount)
    }

    /// Direct fare with no via-stop, falling back to the opposite peak
    /// flag's zonal entry if no exact match exists.
    pub fn direct_fare(&self, from_stop: &str, to_stop: &str, peak: bool) -> Result<i64, Error> {
        let from_zone = self.zone_of(from_stop)?;
        let to_zone = self.zone_of(to_stop)?;
        self.zonal_fare(from_zone, to_zone, peak)
            .or_else(|| self.zonal_fare(from_zone, to_zone, !peak))
            .ok_or(Error::FareNotFound)
    }

    /// Via-fare lookup: override table first, then the stock table; within
    /// each, try the exact via stop, then any stop downstream of it on the
    /// appropriate side per the `descendants.csv` reachability matrix.
    pub fn via_fare(
        &self,
        from_stop: &str,
        to_stop: &str,
        via_stop: &str,
        peak: bool,
    ) -> Result<i64, Error> {
        if let Some(amount) = Self::lookup_via(&self.via_fare_overrides, from_stop, to_stop, via_stop, peak) {
            return Ok(amount);
        }
        if let Some(amount) = Self::lookup_via(&self.via_fares, from_stop, to_stop, via_stop, peak) {
            return Ok(amount);
        }
        if let Some(descendants) = self.descendants.get(via_stop) {
            for (candidate, direction) in descendants {
                if *direction != Direction::Outbound {
                    continue;
                }
                if let Some(amount) =
                    Self::lookup_via(&self.via_fares, from_stop, to_stop, candidate, peak)
                {
                    return Ok(amount);
                }
            }
        }
        // Fall back to two direct fares summed.
        let first = self.direct_fare(from_stop, via_stop, peak)?;
        let second = self.direct_fare(via_stop, to_stop, peak)?;
        Ok(first + second)
    }

    fn lookup_via(table: &[ViaFare], from: &str, to: &str, via: &str, peak: bool) -> Option<i64> {
        table
            .iter()
            .find(|f| f.from_stop_id == from && f.to_stop_id == to && f.via_stop_id == via && f.peak == peak)
            .map(|f| f.amount)
    }
}
