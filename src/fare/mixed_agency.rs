use serde::Deserialize;
use std::sync::Arc;

use crate::fare::allowance::{AllowanceBase, MixedAgencyAllowance, TransferAllowance};
use crate::fare::{Error, FareCalculator, FareResult, RideContext};
use crate::shared::time::{Duration, Time};

#[derive(Debug, Clone, Deserialize)]
pub struct MixedAgencyConfig {
    pub flat_fare: i64,
    /// How long a free continuation inside a paid area remains valid.
    pub paid_area_duration_seconds: u32,
    /// The GTFS `zone_id` value marking a stop as inside a station's paid
    /// area (transfers between stops sharing a parent station and this zone
    /// are free).
    #[serde(default = "default_paid_area_zone")]
    pub paid_area_zone: String,
}

fn default_paid_area_zone() -> String {
    "station".into()
}

/// One flat fare per route; the transfer allowance is only honored within
/// the issuing agency. Stops tagged with the paid-area zone id that share a
/// parent station support free continuation without another fare tap.
pub struct MixedAgencyCalculator {
    config: MixedAgencyConfig,
}

impl MixedAgencyCalculator {
    pub fn new(config: MixedAgencyConfig) -> Self {
        Self { config }
    }
}

impl FareCalculator for MixedAgencyCalculator {
    fn calculate_fare(&self, ride: &RideContext, max_clock_time: Time) -> Result<FareResult, Error> {
        let in_paid_area = ride.board_stop.fare_zone.as_deref() == Some(self.config.paid_area_zone.as_str())
            && ride.board_stop.parent_index.is_some()
            && ride.board_stop.parent_index == ride.alight_stop.parent_index;

        let same_agency = match ride.previous_allowance {
            TransferAllowance::MixedAgency(a) => *a.agency_id == *ride.route.agency_id,
            TransferAllowance::None => false,
            _ => return Err(Error::MismatchedAllowanceTypes),
        };

        let fare = if in_paid_area && same_agency {
            0
        } else {
            self.config.flat_fare
        };

        let cumulative_fare = ride.previous_fare + fare;
        let allowance = TransferAllowance::MixedAgency(MixedAgencyAllowance {
            base: AllowanceBase {
                value: self.config.flat_fare,
                count: 1,
                expiration_time: ride.alight_time
                    + Duration::from_seconds(self.config.paid_area_duration_seconds),
            },
            agency_id: Arc::from(&*ride.route.agency_id),
        });

        Ok(FareResult {
            cumulative_fare,
            transfer_allowance: allowance.tighten_expiration(max_clock_time),
        })
    }
}
