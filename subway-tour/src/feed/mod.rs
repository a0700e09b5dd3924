//! Loading a transit feed and consolidating it into a `TransitGraph`.

mod builder;
mod error;
mod reader;
mod records;

pub use builder::{BuildOptions, GraphBuilder};
pub use error::FeedError;
pub use reader::{RawFeed, read_records};
pub use records::{
    Fields, FromRecord, RouteRecord, StopRecord, StopTimeRecord, TransferRecord, TripRecord,
};
