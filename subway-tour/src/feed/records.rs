//! Raw feed record types.
//!
//! Columns are positional. Each record type declares the file it comes
//! from and the minimum number of columns it needs; trailing optional
//! columns may be absent.

use std::str::FromStr;

use csv::StringRecord;

use crate::domain::{Coordinate, ServiceTime, StationId};

/// A record type that can be read from one line of a feed file.
pub trait FromRecord: Sized {
    /// File name within the feed directory.
    const FILE: &'static str;

    /// Minimum number of columns a line must have.
    const MIN_COLUMNS: usize;

    /// Build a record from the fields of one line.
    ///
    /// Returns a human-readable reason on failure.
    fn from_fields(fields: &Fields<'_>) -> Result<Self, String>;
}

/// Typed access to the fields of one CSV line.
pub struct Fields<'a> {
    record: &'a StringRecord,
    line: u64,
}

impl<'a> Fields<'a> {
    pub fn new(record: &'a StringRecord, line: u64) -> Self {
        Self { record, line }
    }

    /// One-based line number in the source file.
    pub fn line(&self) -> u64 {
        self.line
    }

    /// A field that must be present and non-empty.
    pub fn required(&self, index: usize, name: &str) -> Result<&'a str, String> {
        match self.record.get(index) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(format!("missing {name}")),
        }
    }

    /// A field that may be absent or empty.
    pub fn optional(&self, index: usize) -> Option<&'a str> {
        self.record.get(index).filter(|value| !value.is_empty())
    }

    /// A required field parsed with `FromStr`.
    pub fn parse<T: FromStr>(&self, index: usize, name: &str) -> Result<T, String>
    where
        T::Err: std::fmt::Display,
    {
        let value = self.required(index, name)?;
        value
            .parse()
            .map_err(|e| format!("invalid {name} {value:?}: {e}"))
    }

    /// An optional field parsed with `FromStr` when present.
    pub fn parse_optional<T: FromStr>(&self, index: usize, name: &str) -> Result<Option<T>, String>
    where
        T::Err: std::fmt::Display,
    {
        self.optional(index)
            .map(|value| {
                value
                    .parse()
                    .map_err(|e| format!("invalid {name} {value:?}: {e}"))
            })
            .transpose()
    }

    pub fn station(&self, index: usize, name: &str) -> Result<StationId, String> {
        let value = self.required(index, name)?;
        StationId::parse(value).map_err(|e| format!("{name} {value:?}: {e}"))
    }

    pub fn time(&self, index: usize, name: &str) -> Result<ServiceTime, String> {
        let value = self.required(index, name)?;
        ServiceTime::parse(value).map_err(|e| format!("{name} {value:?}: {e}"))
    }
}

/// `stops.txt`: a station or platform.
#[derive(Debug, Clone, PartialEq)]
pub struct StopRecord {
    pub line: u64,
    pub id: StationId,
    pub name: String,
    pub coordinate: Coordinate,
    pub location_type: Option<u8>,
    pub parent: Option<StationId>,
}

impl FromRecord for StopRecord {
    const FILE: &'static str = "stops.txt";
    const MIN_COLUMNS: usize = 4;

    fn from_fields(fields: &Fields<'_>) -> Result<Self, String> {
        let parent = fields
            .optional(5)
            .map(|value| {
                StationId::parse(value).map_err(|e| format!("parent station {value:?}: {e}"))
            })
            .transpose()?;

        Ok(Self {
            line: fields.line(),
            id: fields.station(0, "stop id")?,
            name: fields.required(1, "stop name")?.to_string(),
            coordinate: Coordinate::new(fields.parse(2, "latitude")?, fields.parse(3, "longitude")?),
            location_type: fields.parse_optional(4, "location type")?,
            parent,
        })
    }
}

/// `transfers.txt`: minimum time to change between two stops.
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRecord {
    pub line: u64,
    pub from: StationId,
    pub to: StationId,
    pub min_transfer_time: u32,
}

impl FromRecord for TransferRecord {
    const FILE: &'static str = "transfers.txt";
    const MIN_COLUMNS: usize = 4;

    fn from_fields(fields: &Fields<'_>) -> Result<Self, String> {
        // Column 2 is the transfer type, which is not used.
        Ok(Self {
            line: fields.line(),
            from: fields.station(0, "from stop id")?,
            to: fields.station(1, "to stop id")?,
            min_transfer_time: fields.parse(3, "min transfer time")?,
        })
    }
}

/// `routes.txt`: a named line.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRecord {
    pub line: u64,
    pub id: String,
    pub short_name: String,
    pub long_name: String,
}

impl FromRecord for RouteRecord {
    const FILE: &'static str = "routes.txt";
    const MIN_COLUMNS: usize = 4;

    fn from_fields(fields: &Fields<'_>) -> Result<Self, String> {
        Ok(Self {
            line: fields.line(),
            id: fields.required(1, "route id")?.to_string(),
            short_name: fields.optional(2).unwrap_or_default().to_string(),
            long_name: fields.optional(3).unwrap_or_default().to_string(),
        })
    }
}

/// `trips.txt`: one run of a route.
#[derive(Debug, Clone, PartialEq)]
pub struct TripRecord {
    pub line: u64,
    pub route_id: String,
    pub id: String,
    pub direction: Option<u8>,
}

impl FromRecord for TripRecord {
    const FILE: &'static str = "trips.txt";
    const MIN_COLUMNS: usize = 2;

    fn from_fields(fields: &Fields<'_>) -> Result<Self, String> {
        Ok(Self {
            line: fields.line(),
            route_id: fields.required(0, "route id")?.to_string(),
            id: fields.required(1, "trip id")?.to_string(),
            direction: fields.parse_optional(4, "direction")?,
        })
    }
}

/// `stop_times.txt`: a trip calling at a stop.
#[derive(Debug, Clone, PartialEq)]
pub struct StopTimeRecord {
    pub line: u64,
    pub trip_id: String,
    pub station: StationId,
    pub arrival: ServiceTime,
    pub departure: Option<ServiceTime>,
    pub sequence: u32,
}

impl FromRecord for StopTimeRecord {
    const FILE: &'static str = "stop_times.txt";
    const MIN_COLUMNS: usize = 5;

    fn from_fields(fields: &Fields<'_>) -> Result<Self, String> {
        let departure = fields
            .optional(3)
            .map(|value| {
                ServiceTime::parse(value).map_err(|e| format!("departure time {value:?}: {e}"))
            })
            .transpose()?;

        Ok(Self {
            line: fields.line(),
            trip_id: fields.required(0, "trip id")?.to_string(),
            station: fields.station(1, "stop id")?,
            arrival: fields.time(2, "arrival time")?,
            departure,
            sequence: fields.parse(4, "stop sequence")?,
        })
    }
}
