use serde::Deserialize;
use std::collections::HashMap;

use crate::fare::allowance::{AllowanceBase, ChicagoRtaAllowance, TransferAllowance};
use crate::fare::{Error, FareCalculator, FareResult, RideContext};
use crate::shared::time::{Duration, Time};

#[derive(Debug, Clone, Deserialize)]
pub struct ChicagoRtaConfig {
    pub cta_fare: i64,
    pub pace_fare: i64,
    /// TODO: the exact PACE_PREMIUM_TRANSFER surcharge amount is
    /// system-specific and unconfirmed; treated as configuration rather
    /// than a hardcoded guess.
    pub pace_premium_surcharge: i64,
    pub ohare_surcharge: i64,
    pub day_pass_price: i64,
    pub transfer_window_seconds: u32,
    pub max_transfers: u32,
    pub pace_free_routes: Vec<String>,
    pub pace_premium_routes: Vec<String>,
    pub ohare_stop_ids: Vec<String>,
    /// `(from_zone, to_zone) -> fare` for Metra, which is zone-based and
    /// does not interact with the CTA-Pace allowance at all.
    pub metra_zone_fares: HashMap<(String, String), i64>,
}

/// Pace/CTA/Metra composite. CTA and Pace share one pay-the-difference
/// allowance; Metra is priced independently and never touches it.
pub struct ChicagoRtaCalculator {
    config: ChicagoRtaConfig,
}

impl ChicagoRtaCalculator {
    pub fn new(config: ChicagoRtaConfig) -> Self {
        Self { config }
    }

    fn is_metra(agency_id: &str) -> bool {
        agency_id.eq_ignore_ascii_case("metra")
    }

    fn is_pace(agency_id: &str) -> bool {
        agency_id.eq_ignore_ascii_case("pace")
    }

    fn metra_fare(&self, ride: &RideContext) -> Result<i64, Error> {
        let from_zone = ride
            .board_stop
            .fare_zone
            .as_deref()
            .ok_or(Error::FareNotFound)?;
        let to_zone = ride
            .alight_stop
            .fare_zone
            .as_deref()
            .ok_or(Error::FareNotFound)?;
        self.config
            .metra_zone_fares
            .get(&(from_zone.to_string(), to_zone.to_string()))
            .copied()
            .ok_or(Error::FareNotFound)
    }

    fn base_ride_fare(&self, ride: &RideContext) -> i64 {
        if Self::is_pace(&ride.route.agency_id) {
            if self.config.pace_free_routes.iter().any(|r| r == &*ride.route.id) {
                return 0;
            }
            let mut fare = self.config.pace_fare;
            if self.config.pace_premium_routes.iter().any(|r| r == &*ride.route.id) {
                fare += self.config.pace_premium_surcharge;
            }
            fare
        } else {
            self.config.cta_fare
        }
    }

    fn touches_ohare(&self, ride: &RideContext) -> bool {
        self.config.ohare_stop_ids.iter().any(|id| id == &*ride.board_stop.id || id == &*ride.alight_stop.id)
    }
}

impl FareCalculator for ChicagoRtaCalculator {
    fn calculate_fare(&self, ride: &RideContext, max_clock_time: Time) -> Result<FareResult, Error> {
        if Self::is_metra(&ride.route.agency_id) {
            let fare = self.metra_fare(ride)?;
            return Ok(FareResult {
                cumulative_fare: ride.previous_fare + fare,
                transfer_allowance: ride.previous_allowance.clone().tighten_expiration(max_clock_time),
            });
        }

        let prev = match ride.previous_allowance {
            TransferAllowance::None => None,
            TransferAllowance::ChicagoRta(a) => Some(*a),
            _ => return Err(Error::MismatchedAllowanceTypes),
        };

        if let Some(p) = prev
            && p.unlimited
            && ride.board_time <= p.base.expiration_time
        {
            return Ok(FareResult {
                cumulative_fare: ride.previous_fare,
                transfer_allowance: TransferAllowance::ChicagoRta(p).tighten_expiration(max_clock_time),
            });
        }

        let within_window = prev
            .map(|p| ride.board_time <= p.base.expiration_time && p.base.count > 0)
            .unwrap_or(false);

        let base_fare = self.base_ride_fare(ride);
        let mut fare = if within_window {
            let covered = prev.map(|p| p.base.value).unwrap_or(0);
            (base_fare - covered).max(0)
        } else {
            base_fare
        };

        if self.touches_ohare(ride) {
            fare = fare.max(self.config.ohare_surcharge);
        }

        let mut unlimited = false;
        let prospective_total = ride.previous_fare + fare;
        if prospective_total >= self.config.day_pass_price {
            fare = (self.config.day_pass_price - ride.previous_fare).max(0);
            unlimited = true;
        }

        let remaining_transfers = if within_window {
            prev.map(|p| p.base.count.saturating_sub(1)).unwrap_or(0)
        } else {
            self.config.max_transfers
        };

        let allowance = ChicagoRtaAllowance {
            base: AllowanceBase {
                value: base_fare.max(prev.map(|p| p.base.value).unwrap_or(0)),
                count: remaining_transfers,
                expiration_time: ride.alight_time
                    + Duration::from_seconds(self.config.transfer_window_seconds),
            },
            unlimited,
        };

        Ok(FareResult {
            cumulative_fare: ride.previous_fare + fare,
            transfer_allowance: TransferAllowance::ChicagoRta(allowance).tighten_expiration(max_clock_time),
        })
    }
}
