use serde::Serialize;

use crate::fare::TransferAllowance;
use crate::raptor::label::{LabelKind, McLabel};
use crate::shared::time::Time;
use crate::transit_data::TransitDataProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    Transit,
    Transfer,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteRef {
    pub id: String,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
}

/// One hop of a reconstructed journey.
///
/// `transfer_allowance_after` is intentionally serialized via `TransferAllowance`'s
/// own `Debug`-derived shape rather than a bespoke wire format: the response
/// contract only promises callers an opaque debug view of the allowance a
/// rider is carrying, not a stable cross-system schema.
#[derive(Debug, Clone, Serialize)]
pub struct Leg {
    #[serde(rename = "type")]
    pub kind: LegKind,
    pub board_stop_id: String,
    pub board_stop_name: String,
    pub alight_stop_id: String,
    pub alight_stop_name: String,
    #[serde(serialize_with = "serialize_time_as_seconds")]
    pub board_time: Time,
    #[serde(serialize_with = "serialize_time_as_seconds")]
    pub alight_time: Time,
    pub cumulative_fare: i64,
    #[serde(serialize_with = "serialize_allowance_as_debug")]
    pub transfer_allowance: TransferAllowance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteRef>,
}

fn serialize_time_as_seconds<S>(time: &Time, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u32(time.as_seconds())
}

fn serialize_allowance_as_debug<S>(
    allowance: &TransferAllowance,
    serializer: S,
) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_str(&format!("{allowance:?}"))
}

#[derive(Debug, Clone, Serialize)]
pub struct Itinerary {
    pub departure_time_seconds: u32,
    pub duration_seconds: u32,
    pub fare: i64,
    pub legs: Vec<Leg>,
}

impl Itinerary {
    /// Builds an itinerary from a backtracked label chain (oldest first,
    /// `chain[0]` always the access-leg root with no leg of its own).
    ///
    /// A chain of length 1 means access and egress resolved to the same
    /// stop: no ride was necessary. That journey still surfaces as a single
    /// zero-fare transfer leg rather than an empty leg list, so callers
    /// always see at least one leg describing how the rider got from origin
    /// to destination.
    pub(crate) fn from_chain(data: &TransitDataProvider, chain: &[McLabel]) -> Self {
        let departure_time = chain[0].arrival_time;
        let arrival_time = chain.last().map(|l| l.arrival_time).unwrap_or(departure_time);
        let fare = chain.last().map(|l| l.cumulative_fare).unwrap_or(0);
        let legs: Vec<Leg> = if chain.len() < 2 {
            vec![walk_only_leg(data, &chain[0])]
        } else {
            chain
                .windows(2)
                .map(|pair| {
                    let (predecessor, label) = (&pair[0], &pair[1]);
                    leg_from_label(data, predecessor, label)
                })
                .collect()
        };
        Self {
            departure_time_seconds: departure_time.as_seconds(),
            duration_seconds: arrival_time.as_seconds().saturating_sub(departure_time.as_seconds()),
            fare,
            legs,
        }
    }
}

fn walk_only_leg(data: &TransitDataProvider, label: &McLabel) -> Leg {
    let stop = &data.stops[label.stop_idx as usize];
    Leg {
        kind: LegKind::Transfer,
        board_stop_id: stop.id.to_string(),
        board_stop_name: stop.name.to_string(),
        alight_stop_id: stop.id.to_string(),
        alight_stop_name: stop.name.to_string(),
        board_time: label.arrival_time,
        alight_time: label.arrival_time,
        cumulative_fare: label.cumulative_fare,
        transfer_allowance: label.transfer_allowance.clone(),
        route: None,
    }
}

fn leg_from_label(data: &TransitDataProvider, predecessor: &McLabel, label: &McLabel) -> Leg {
    match label.kind {
        LabelKind::Transit {
            pattern_idx: _,
            trip_idx,
            board_stop,
            board_time,
            alight_time,
        } => {
            let board = &data.stops[board_stop as usize];
            let alight = &data.stops[label.stop_idx as usize];
            let route = data.route_by_trip_idx(trip_idx);
            Leg {
                kind: LegKind::Transit,
                board_stop_id: board.id.to_string(),
                board_stop_name: board.name.to_string(),
                alight_stop_id: alight.id.to_string(),
                alight_stop_name: alight.name.to_string(),
                board_time,
                alight_time,
                cumulative_fare: label.cumulative_fare,
                transfer_allowance: label.transfer_allowance.clone(),
                route: Some(RouteRef {
                    id: route.id.to_string(),
                    short_name: route.short_name.as_ref().map(|s| s.to_string()),
                    long_name: route.long_name.as_ref().map(|s| s.to_string()),
                }),
            }
        }
        LabelKind::Transfer { from_stop, .. } => {
            let board = &data.stops[from_stop as usize];
            let alight = &data.stops[label.stop_idx as usize];
            Leg {
                kind: LegKind::Transfer,
                board_stop_id: board.id.to_string(),
                board_stop_name: board.name.to_string(),
                alight_stop_id: alight.id.to_string(),
                alight_stop_name: alight.name.to_string(),
                board_time: predecessor.arrival_time,
                alight_time: label.arrival_time,
                cumulative_fare: label.cumulative_fare,
                transfer_allowance: label.transfer_allowance.clone(),
                route: None,
            }
        }
        LabelKind::Access => unreachable!("access labels never appear past chain[0]"),
    }
}
