//! Reading the raw record set from comma-delimited feed files.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use tracing::debug;

use super::error::FeedError;
use super::records::{
    Fields, FromRecord, RouteRecord, StopRecord, StopTimeRecord, TransferRecord, TripRecord,
};

/// Read every data line of one feed file.
///
/// The first line is a header and is skipped. Fields are trimmed. Any line
/// with too few columns or a bad field aborts the read.
pub fn read_records<T: FromRecord, R: Read>(source: R) -> Result<Vec<T>, FeedError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(source);

    let mut records = Vec::new();
    let mut record = csv::StringRecord::new();

    loop {
        match reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => break,
            Err(source) => {
                return Err(FeedError::Csv {
                    file: T::FILE,
                    source,
                });
            }
        }

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        if record.len() < T::MIN_COLUMNS {
            return Err(FeedError::MalformedRecord {
                file: T::FILE,
                line,
                reason: format!(
                    "expected at least {} columns, found {}",
                    T::MIN_COLUMNS,
                    record.len()
                ),
            });
        }

        let parsed = T::from_fields(&Fields::new(&record, line)).map_err(|reason| {
            FeedError::MalformedRecord {
                file: T::FILE,
                line,
                reason,
            }
        })?;
        records.push(parsed);
    }

    debug!(file = T::FILE, records = records.len(), "read feed file");
    Ok(records)
}

/// The raw record set, one vector per feed file, in file order.
#[derive(Debug, Clone, Default)]
pub struct RawFeed {
    pub stops: Vec<StopRecord>,
    pub transfers: Vec<TransferRecord>,
    pub routes: Vec<RouteRecord>,
    pub trips: Vec<TripRecord>,
    pub stop_times: Vec<StopTimeRecord>,
}

impl RawFeed {
    /// Load a feed from a directory holding the five feed files.
    pub fn load(dir: &Path) -> Result<Self, FeedError> {
        Ok(Self {
            stops: read_file(dir)?,
            transfers: read_file(dir)?,
            routes: read_file(dir)?,
            trips: read_file(dir)?,
            stop_times: read_file(dir)?,
        })
    }

    /// Parse a feed from in-memory sources.
    pub fn from_readers(
        stops: impl Read,
        transfers: impl Read,
        routes: impl Read,
        trips: impl Read,
        stop_times: impl Read,
    ) -> Result<Self, FeedError> {
        Ok(Self {
            stops: read_records(stops)?,
            transfers: read_records(transfers)?,
            routes: read_records(routes)?,
            trips: read_records(trips)?,
            stop_times: read_records(stop_times)?,
        })
    }
}

fn read_file<T: FromRecord>(dir: &Path) -> Result<Vec<T>, FeedError> {
    let path = dir.join(T::FILE);
    let file = File::open(&path).map_err(|source| FeedError::Io {
        path: path.clone(),
        source,
    })?;
    read_records(file)
}
