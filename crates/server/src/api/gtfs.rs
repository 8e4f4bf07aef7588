use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::{fs, path::Path, sync::Arc};
use tracing::error;

use crate::state::AppState;

/// Seconds since the configured feed file was last modified, used as a
/// cheap staleness check by callers that decide when to refresh the feed
/// out-of-band.
pub async fn age(State(state): State<Arc<AppState>>) -> Result<Response, StatusCode> {
    if state.gtfs_data_path.exists() {
        let last_modified = seconds_since_modified(&state.gtfs_data_path)?;
        Ok(last_modified.to_string().into_response())
    } else {
        Err(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

fn seconds_since_modified<P: AsRef<Path>>(path: P) -> Result<u64, StatusCode> {
    let meta_data = fs::metadata(path).map_err(|err| {
        error!("Failed to get metadata: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let modified = meta_data.modified().map_err(|err| {
        error!("Failed to get modified: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;
    let duration = modified.elapsed().map_err(|err| {
        error!("Failed to compute elapsed time since modified: {err}");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(duration.as_secs())
}
