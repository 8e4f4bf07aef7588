use mc_raptor::transit_data::TransitDataProvider;
use std::path::PathBuf;
use tokio::sync::RwLock;

pub struct AppState {
    pub gtfs_data_path: PathBuf,
    pub transit_data: RwLock<Option<TransitDataProvider>>,
}
