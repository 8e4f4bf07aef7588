use crate::gtfs::{self, Config, GtfsData};
use serde::de::DeserializeOwned;
use std::{
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};
use zip::ZipArchive;

/// Where a feed's CSV tables are read from.
enum Source {
    Zip(ZipArchive<File>),
    Directory(PathBuf),
}

/// Loads a GTFS feed, either a zip archive or an already-extracted
/// directory, into a [`GtfsData`].
pub struct GtfsLoader {
    config: Config,
    source: Option<Source>,
}

impl Default for GtfsLoader {
    fn default() -> Self {
        Self {
            config: Config::default(),
            source: None,
        }
    }
}

impl GtfsLoader {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            source: None,
        }
    }

    pub fn from_zip<P: AsRef<Path>>(mut self, path: P) -> Result<Self, gtfs::Error> {
        let file = File::open(path)?;
        let archive = ZipArchive::new(file)?;
        self.source = Some(Source::Zip(archive));
        Ok(self)
    }

    pub fn from_directory<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.source = Some(Source::Directory(path.as_ref().to_path_buf()));
        self
    }

    /// Reads every table named in [`Config`] that is present in the feed.
    /// `calendar.txt`, `calendar_dates.txt`, `fare_attributes.txt` and
    /// `fare_rules.txt` are optional per the GTFS reference and are skipped
    /// silently when absent; every other table is required.
    pub fn load(mut self) -> Result<GtfsData, gtfs::Error> {
        let mut data = GtfsData::default();
        let config = self.config.clone();

        data.stops = self.read_required(&config.stops_path)?;
        data.routes = self.read_required(&config.routes_path)?;
        data.trips = self.read_required(&config.trips_path)?;
        data.stop_times = self.read_required(&config.stop_times_path)?;
        data.transfers = self.read_optional(&config.transfers_path)?;
        data.calendar = self.read_optional(&config.calendar_path)?;
        data.calendar_dates = self.read_optional(&config.calendar_dates_path)?;
        data.fare_attributes = self.read_optional(&config.fare_attributes_path)?;
        data.fare_rules = self.read_optional(&config.fare_rules_path)?;

        Ok(data)
    }

    fn read_required<T: DeserializeOwned>(&mut self, file_name: &str) -> Result<Vec<T>, gtfs::Error> {
        self.read(file_name)?
            .ok_or_else(|| gtfs::Error::FileNotFound(file_name.to_string()))
    }

    fn read_optional<T: DeserializeOwned>(&mut self, file_name: &str) -> Result<Vec<T>, gtfs::Error> {
        Ok(self.read(file_name)?.unwrap_or_default())
    }

    fn read<T: DeserializeOwned>(&mut self, file_name: &str) -> Result<Option<Vec<T>>, gtfs::Error> {
        match self.source.as_mut() {
            None => Err(gtfs::Error::MissingSource),
            Some(Source::Zip(archive)) => {
                let index = match archive.index_for_name(file_name) {
                    Some(i) => i,
                    None => return Ok(None),
                };
                let file = archive.by_index(index)?;
                parse_csv(file_name, file).map(Some)
            }
            Some(Source::Directory(dir)) => {
                let path = dir.join(file_name);
                if !path.exists() {
                    return Ok(None);
                }
                let file = fs::File::open(&path)?;
                let reader = BufReader::with_capacity(128 * 1024, file);
                parse_csv(file_name, reader).map(Some)
            }
        }
    }
}

fn parse_csv<R, T>(file_name: &str, reader: R) -> Result<Vec<T>, gtfs::Error>
where
    R: std::io::Read,
    T: DeserializeOwned,
{
    let mut rdr = csv::Reader::from_reader(reader);
    let mut out = Vec::new();
    for result in rdr.deserialize() {
        let record: T = result.map_err(|source| gtfs::Error::Csv {
            file: file_name.to_string(),
            source,
        })?;
        out.push(record);
    }
    Ok(out)
}
