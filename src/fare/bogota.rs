use serde::Deserialize;
use std::sync::Arc;

use crate::fare::allowance::{AllowanceBase, TransferAllowance};
use crate::fare::{Error, FareCalculator, FareResult, RideContext};
use crate::shared::time::Time;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RideKind {
    Tpc,
    TransMilenio,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BogotaConfig {
    pub tpc_agency_name: String,
    pub transmilenio_agency_name: String,
    pub tpc_base_fare: i64,
    /// Ordered `[tpc_to_tpc, tpc_to_tm, tm_to_tpc, tm_to_tm]` transfer fares.
    pub transfer_fares: [i64; 4],
}

/// Classifies each ride as TPC or TransMilenio by agency name, charging the
/// base fare on the first ride and one of four ordered-pair transfer fares
/// on every ride after that. No allowance state survives beyond "what kind
/// was the previous ride" — there is no value/count/expiration to carry.
pub struct BogotaCalculator {
    config: BogotaConfig,
}

impl BogotaCalculator {
    pub fn new(config: BogotaConfig) -> Self {
        Self { config }
    }

    fn classify(&self, agency_id: &str) -> RideKind {
        if agency_id == self.config.transmilenio_agency_name {
            RideKind::TransMilenio
        } else {
            RideKind::Tpc
        }
    }

    fn transfer_fare(&self, from: RideKind, to: RideKind) -> i64 {
        let idx = match (from, to) {
            (RideKind::Tpc, RideKind::Tpc) => 0,
            (RideKind::Tpc, RideKind::TransMilenio) => 1,
            (RideKind::TransMilenio, RideKind::Tpc) => 2,
            (RideKind::TransMilenio, RideKind::TransMilenio) => 3,
        };
        self.config.transfer_fares[idx]
    }
}

impl FareCalculator for BogotaCalculator {
    fn calculate_fare(&self, ride: &RideContext, max_clock_time: Time) -> Result<FareResult, Error> {
        let this_kind = self.classify(&ride.route.agency_id);

        let fare = match previous_kind(ride.previous_allowance) {
            None => self.config.tpc_base_fare,
            Some(prev_kind) => self.transfer_fare(prev_kind, this_kind),
        };

        let cumulative_fare = ride.previous_fare + fare;
        let allowance = TransferAllowance::MixedAgency(crate::fare::allowance::MixedAgencyAllowance {
            base: AllowanceBase {
                value: 0,
                count: 0,
                expiration_time: ride.alight_time,
            },
            agency_id: ride_kind_tag(this_kind),
        });

        Ok(FareResult {
            cumulative_fare,
            transfer_allowance: allowance.tighten_expiration(max_clock_time),
        })
    }
}

fn ride_kind_tag(kind: RideKind) -> Arc<str> {
    match kind {
        RideKind::Tpc => Arc::from("tpc"),
        RideKind::TransMilenio => Arc::from("transmilenio"),
    }
}

fn previous_kind(allowance: &TransferAllowance) -> Option<RideKind> {
    match allowance {
        TransferAllowance::MixedAgency(a) => match &*a.agency_id {
            "tpc" => Some(RideKind::Tpc),
            "transmilenio" => Some(RideKind::TransMilenio),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transit_data::{Route, Stop};

    fn config() -> BogotaConfig {
        BogotaConfig {
            tpc_agency_name: "tpc".into(),
            transmilenio_agency_name: "transmilenio".into(),
            tpc_base_fare: 2000,
            transfer_fares: [0, 500, 1800, 0],
        }
    }

    #[test]
    fn tpc_then_transmilenio_then_tpc_sums_three_fares() {
        let calc = BogotaCalculator::new(config());
        let stop = Stop::default();
        let board_time = Time::from_seconds(0);

        let tpc_route = Route {
            agency_id: "tpc".into(),
            ..Default::default()
        };
        let tm_route = Route {
            agency_id: "transmilenio".into(),
            ..Default::default()
        };

        let first = calc
            .calculate_fare(
                &RideContext {
                    route: &tpc_route,
                    board_stop: &stop,
                    alight_stop: &stop,
                    board_time,
                    alight_time: board_time,
                    previous_fare: 0,
                    previous_allowance: &TransferAllowance::None,
                },
                Time::from_seconds(u32::MAX),
            )
            .unwrap();
        assert_eq!(first.cumulative_fare, 2000);

        let second = calc
            .calculate_fare(
                &RideContext {
                    route: &tm_route,
                    board_stop: &stop,
                    alight_stop: &stop,
                    board_time,
                    alight_time: board_time,
                    previous_fare: first.cumulative_fare,
                    previous_allowance: &first.transfer_allowance,
                },
                Time::from_seconds(u32::MAX),
            )
            .unwrap();
        assert_eq!(second.cumulative_fare, 2000 + 500);

        let third = calc
            .calculate_fare(
                &RideContext {
                    route: &tpc_route,
                    board_stop: &stop,
                    alight_stop: &stop,
                    board_time,
                    alight_time: board_time,
                    previous_fare: second.cumulative_fare,
                    previous_allowance: &second.transfer_allowance,
                },
                Time::from_seconds(u32::MAX),
            )
            .unwrap();
        assert_eq!(third.cumulative_fare, 2000 + 500 + 1800);
    }
}
