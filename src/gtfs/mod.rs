mod config;
mod data;
mod loader;
pub mod models;

pub use config::*;
pub use data::*;
pub use loader::*;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Csv error in {file}: {source}")]
    Csv { file: String, source: csv::Error },
    #[error("Could not find required file: {0}")]
    FileNotFound(String),
    #[error("Missing any source to load data from")]
    MissingSource,
}
