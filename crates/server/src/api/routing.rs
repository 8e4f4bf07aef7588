use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use mc_raptor::raptor::{self, ProfileRequest, Raptor};
use std::sync::{Arc, atomic::AtomicBool};
use tracing::{error, warn};

use crate::state::AppState;

/// `POST /route`: runs one multi-criteria Range-RAPTOR search and returns
/// every Pareto-optimal itinerary it found. Request and response are exactly
/// the core crate's `ProfileRequest`/`ProfileResponse` — this handler's only
/// job is wiring the shared transit data in and mapping search errors to
/// status codes.
pub async fn route(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ProfileRequest>,
) -> Result<Response, StatusCode> {
    let guard = state.transit_data.read().await;
    let Some(data) = guard.as_ref() else {
        warn!("route request received before GTFS data finished loading");
        return Err(StatusCode::SERVICE_UNAVAILABLE);
    };

    let cancelled = AtomicBool::new(false);
    let raptor = Raptor::new(data, request, &cancelled).map_err(map_error)?;
    let response = raptor.solve().map_err(map_error)?;
    Ok(Json(response).into_response())
}

fn map_error(err: raptor::Error) -> StatusCode {
    match err {
        raptor::Error::UnresolvedOrigin | raptor::Error::UnresolvedDestination => {
            StatusCode::NOT_FOUND
        }
        raptor::Error::InvalidDate(_) => StatusCode::BAD_REQUEST,
        raptor::Error::FailedToBuildRoute | raptor::Error::Fare(_) => {
            error!(%err, "search failed");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}
