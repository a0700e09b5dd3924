//! Station identifier and station record types.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Serialize, Serializer};

/// Error returned when parsing an invalid station identifier.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid station id: {reason}")]
pub struct InvalidStationId {
    reason: &'static str,
}

/// A station identifier as it appears in the timetable feed.
///
/// Identifiers are non-empty and contain no whitespace, commas or control
/// characters, so they survive a round trip through the comma-delimited
/// path-length cache. Cloning is cheap (shared string).
///
/// # Examples
///
/// ```
/// use subway_tour::domain::StationId;
///
/// let id = StationId::parse("A12").unwrap();
/// assert_eq!(id.as_str(), "A12");
///
/// assert!(StationId::parse("").is_err());
/// assert!(StationId::parse("A 12").is_err());
/// assert!(StationId::parse("A,12").is_err());
/// ```
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(Arc<str>);

impl StationId {
    /// Parse a station identifier.
    pub fn parse(s: &str) -> Result<Self, InvalidStationId> {
        if s.is_empty() {
            return Err(InvalidStationId {
                reason: "must not be empty",
            });
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(InvalidStationId {
                reason: "must not contain whitespace or control characters",
            });
        }

        if s.contains(',') {
            return Err(InvalidStationId {
                reason: "must not contain commas",
            });
        }

        Ok(StationId(Arc::from(s)))
    }

    /// Returns the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if the identifier starts with the given prefix.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

impl fmt::Debug for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationId({})", self.as_str())
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for StationId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// A geographic position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A station (or platform) from the feed.
///
/// Identity is the station id alone: two records with the same id compare
/// equal and hash identically even if their names or coordinates differ.
#[derive(Debug, Clone)]
pub struct Station {
    pub id: StationId,
    pub name: String,
    pub coordinate: Coordinate,
    /// Parent station, if this record is a platform of a larger station.
    pub parent: Option<StationId>,
}

impl Station {
    /// Create a station with no parent.
    pub fn new(id: StationId, name: impl Into<String>, coordinate: Coordinate) -> Self {
        Self {
            id,
            name: name.into(),
            coordinate,
            parent: None,
        }
    }

    /// Returns true if this station is its own equivalence root.
    pub fn is_consolidated(&self) -> bool {
        self.parent.is_none()
    }
}

impl PartialEq for Station {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Station {}

impl Hash for Station {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> StationId {
        StationId::parse(s).unwrap()
    }

    #[test]
    fn parse_valid_ids() {
        assert!(StationId::parse("101").is_ok());
        assert!(StationId::parse("A12N").is_ok());
        assert!(StationId::parse("R09-S").is_ok());
    }

    #[test]
    fn reject_invalid_ids() {
        assert!(StationId::parse("").is_err());
        assert!(StationId::parse(" 101").is_err());
        assert!(StationId::parse("1\t01").is_err());
        assert!(StationId::parse("1,01").is_err());
    }

    #[test]
    fn display_and_debug() {
        assert_eq!(format!("{}", id("A12")), "A12");
        assert_eq!(format!("{:?}", id("A12")), "StationId(A12)");
    }

    #[test]
    fn ordering_is_lexicographic() {
        let mut ids = vec![id("B1"), id("A2"), id("A10")];
        ids.sort();
        assert_eq!(ids, vec![id("A10"), id("A2"), id("B1")]);
    }

    #[test]
    fn prefix_match() {
        assert!(id("S09").has_prefix("S"));
        assert!(!id("A09").has_prefix("S"));
    }

    #[test]
    fn station_identity_ignores_attributes() {
        use std::collections::HashSet;

        let a = Station::new(id("101"), "Van Cortlandt Park", Coordinate::new(40.88, -73.89));
        let mut b = Station::new(id("101"), "renamed", Coordinate::new(0.0, 0.0));
        b.parent = Some(id("100"));

        assert_eq!(a, b);
        let mut set = HashSet::new();
        set.insert(a);
        assert!(set.contains(&b));
    }

    #[test]
    fn serializes_as_plain_string() {
        let json = serde_json::to_string(&id("A12")).unwrap();
        assert_eq!(json, "\"A12\"");
    }
}
