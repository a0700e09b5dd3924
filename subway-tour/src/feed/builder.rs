//! Consolidating the raw record set into a transit graph.
//!
//! Every platform-level stop is rewritten to its equivalence root (the end
//! of its parent chain). Trip segments between consecutive stop times are
//! averaged per consolidated station pair, and each resulting edge records
//! the stations that other trips call at between its endpoints.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use crate::domain::{Edge, Station, StationId, Transfer};
use crate::graph::TransitGraph;

use super::error::FeedError;
use super::reader::RawFeed;
use super::records::{FromRecord, StopRecord, StopTimeRecord, TransferRecord, TripRecord};

/// Options applied while building the graph.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Consolidated stations whose id starts with any of these prefixes are
    /// removed, together with every edge and transfer touching them.
    pub excluded_prefixes: Vec<String>,
}

impl BuildOptions {
    pub fn excluding(prefixes: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            excluded_prefixes: prefixes.into_iter().map(Into::into).collect(),
        }
    }

    fn excludes(&self, id: &StationId) -> bool {
        self.excluded_prefixes.iter().any(|p| id.has_prefix(p))
    }
}

/// Builds a `TransitGraph` from a `RawFeed`.
pub struct GraphBuilder<'a> {
    feed: &'a RawFeed,
    options: BuildOptions,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(feed: &'a RawFeed) -> Self {
        Self {
            feed,
            options: BuildOptions::default(),
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Build the consolidated graph.
    pub fn build(&self) -> Result<TransitGraph, FeedError> {
        let roots = self.resolve_roots()?;
        let trips = self.trip_events(&roots)?;

        let transfers = self.consolidated_transfers(&roots)?;
        let samples = self.segment_samples(&trips, &roots);

        // Intermediates are kept only where they survive pruning.
        let linked: HashSet<&StationId> = samples
            .keys()
            .flat_map(|(from, to)| [from, to])
            .chain(transfers.iter().flat_map(|t| [&t.from, &t.to]))
            .collect();
        let patterns = stopping_patterns(&trips, &roots);
        let edges: Vec<Edge> = samples
            .iter()
            .filter_map(|((from, to), durations)| {
                let edge = Edge::from_samples(from.clone(), to.clone(), durations)?;
                let mut intermediates = self.intermediates(from, to, &patterns);
                intermediates.retain(|station| linked.contains(station));
                Some(edge.with_intermediates(intermediates))
            })
            .collect();

        let root_ids: BTreeSet<&StationId> = roots.values().collect();
        let stops: HashMap<&StationId, &StopRecord> =
            self.feed.stops.iter().map(|stop| (&stop.id, stop)).collect();
        let stations: Vec<Station> = root_ids
            .into_iter()
            .filter(|id| !self.options.excludes(id))
            .map(|id| {
                let stop = stops[id];
                Station::new(id.clone(), stop.name.clone(), stop.coordinate)
            })
            .collect();
        let candidates = stations.len();
        let edge_count = edges.len();
        let transfer_count = transfers.len();

        let graph = TransitGraph::new(stations, edges, transfers)?;

        info!(
            stops = self.feed.stops.len(),
            stations = graph.len(),
            pruned = candidates - graph.len(),
            edges = edge_count,
            transfers = transfer_count,
            "built transit graph"
        );

        Ok(graph)
    }

    /// Map every stop id to its equivalence root.
    fn resolve_roots(&self) -> Result<HashMap<StationId, StationId>, FeedError> {
        let stops: HashMap<&StationId, &StopRecord> =
            self.feed.stops.iter().map(|stop| (&stop.id, stop)).collect();

        let mut roots = HashMap::with_capacity(stops.len());
        for stop in &self.feed.stops {
            let mut current = stop;
            let mut steps = 0;
            while let Some(parent) = &current.parent {
                let line = current.line;
                current = stops.get(parent).copied().ok_or_else(|| {
                    unknown::<StopRecord>(line, "parent station", parent.as_str())
                })?;
                steps += 1;
                if steps > stops.len() {
                    return Err(FeedError::ParentCycle {
                        station: stop.id.clone(),
                    });
                }
            }
            roots.insert(stop.id.clone(), current.id.clone());
        }

        Ok(roots)
    }

    /// Stop-time events grouped per trip (in trip id order), each sorted by
    /// stop sequence.
    fn trip_events(
        &self,
        roots: &HashMap<StationId, StationId>,
    ) -> Result<BTreeMap<&'a str, Vec<&'a StopTimeRecord>>, FeedError> {
        let feed = self.feed;
        let routes: HashSet<&str> = feed.routes.iter().map(|r| r.id.as_str()).collect();

        let mut trips: BTreeMap<&str, Vec<&StopTimeRecord>> = BTreeMap::new();
        for trip in &feed.trips {
            if !routes.contains(trip.route_id.as_str()) {
                return Err(unknown::<TripRecord>(trip.line, "route", &trip.route_id));
            }
            trips.entry(trip.id.as_str()).or_default();
        }

        for event in &feed.stop_times {
            let events = trips
                .get_mut(event.trip_id.as_str())
                .ok_or_else(|| unknown::<StopTimeRecord>(event.line, "trip", &event.trip_id))?;
            if !roots.contains_key(&event.station) {
                return Err(unknown::<StopTimeRecord>(
                    event.line,
                    "station",
                    event.station.as_str(),
                ));
            }
            events.push(event);
        }

        for events in trips.values_mut() {
            events.sort_by_key(|event| event.sequence);
        }

        Ok(trips)
    }

    /// Segment durations (seconds) per consolidated station pair.
    ///
    /// Only consecutive sequence numbers on the same trip form a segment.
    /// Arrival times are normalised along the trip so a time past midnight
    /// that restarts at "00:.." still yields a positive duration.
    fn segment_samples(
        &self,
        trips: &BTreeMap<&str, Vec<&StopTimeRecord>>,
        roots: &HashMap<StationId, StationId>,
    ) -> BTreeMap<(StationId, StationId), Vec<i64>> {
        let mut samples: BTreeMap<(StationId, StationId), Vec<i64>> = BTreeMap::new();

        for events in trips.values() {
            let mut previous = None;
            for event in events {
                let mut arrival = event.arrival;
                if let Some((sequence, station, time)) = previous
                    && u32::checked_add(sequence, 1) == Some(event.sequence)
                {
                    arrival = event.arrival.normalized_after(time);
                    let from = &roots[station];
                    let to = &roots[&event.station];
                    if from != to && !self.options.excludes(from) && !self.options.excludes(to) {
                        samples
                            .entry((from.clone(), to.clone()))
                            .or_default()
                            .push(arrival.since(time).num_seconds());
                    }
                }
                previous = Some((event.sequence, &event.station, arrival));
            }
        }

        samples
    }

    /// Stations called at strictly between `from` and `to` by any stopping
    /// pattern that visits both in that order.
    ///
    /// Conflicting patterns (an express that skips stops next to a local
    /// that calls at them) are merged in first-seen order.
    fn intermediates(
        &self,
        from: &StationId,
        to: &StationId,
        patterns: &StoppingPatterns,
    ) -> Vec<StationId> {
        let mut merged: Vec<StationId> = Vec::new();
        let mut observed: BTreeSet<&[StationId]> = BTreeSet::new();

        for &p in patterns.at(from) {
            let sequence = &patterns.sequences[p];
            let Some(start) = sequence.iter().position(|s| s == from) else {
                continue;
            };
            let rest = &sequence[start + 1..];
            let Some(end) = rest.iter().position(|s| s == to) else {
                continue;
            };
            let between = &rest[..end];
            observed.insert(between);
            for station in between {
                if station != from
                    && station != to
                    && !self.options.excludes(station)
                    && !merged.contains(station)
                {
                    merged.push(station.clone());
                }
            }
        }

        if observed.len() > 1 {
            debug!(
                from = %from,
                to = %to,
                patterns = observed.len(),
                merged = merged.len(),
                "merged conflicting intermediate station patterns"
            );
        }

        merged
    }

    fn consolidated_transfers(
        &self,
        roots: &HashMap<StationId, StationId>,
    ) -> Result<Vec<Transfer>, FeedError> {
        let mut transfers = Vec::with_capacity(self.feed.transfers.len());
        for record in &self.feed.transfers {
            let resolve = |id: &StationId| {
                roots
                    .get(id)
                    .ok_or_else(|| unknown::<TransferRecord>(record.line, "station", id.as_str()))
            };
            let from = resolve(&record.from)?;
            let to = resolve(&record.to)?;
            if self.options.excludes(from) || self.options.excludes(to) {
                continue;
            }
            transfers.push(Transfer::new(from.clone(), to.clone(), record.min_transfer_time));
        }
        Ok(transfers)
    }
}

/// Distinct consolidated stopping patterns and the patterns calling at each
/// station.
struct StoppingPatterns {
    sequences: Vec<Vec<StationId>>,
    by_station: HashMap<StationId, Vec<usize>>,
}

impl StoppingPatterns {
    fn at(&self, station: &StationId) -> &[usize] {
        self.by_station.get(station).map(Vec::as_slice).unwrap_or(&[])
    }
}

fn stopping_patterns(
    trips: &BTreeMap<&str, Vec<&StopTimeRecord>>,
    roots: &HashMap<StationId, StationId>,
) -> StoppingPatterns {
    let distinct: BTreeSet<Vec<StationId>> = trips
        .values()
        .map(|events| {
            let mut sequence: Vec<StationId> = Vec::with_capacity(events.len());
            for event in events {
                let root = &roots[&event.station];
                if sequence.last() != Some(root) {
                    sequence.push(root.clone());
                }
            }
            sequence
        })
        .collect();
    let sequences: Vec<Vec<StationId>> = distinct.into_iter().collect();

    let mut by_station: HashMap<StationId, Vec<usize>> = HashMap::new();
    for (p, sequence) in sequences.iter().enumerate() {
        let calls: BTreeSet<&StationId> = sequence.iter().collect();
        for station in calls {
            by_station.entry(station.clone()).or_default().push(p);
        }
    }

    StoppingPatterns {
        sequences,
        by_station,
    }
}

fn unknown<T: FromRecord>(line: u64, kind: &'static str, id: &str) -> FeedError {
    FeedError::UnknownReference {
        file: T::FILE,
        line,
        kind,
        id: id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::id;

    /// Minimal feed text builder.
    #[derive(Default)]
    struct Fixture {
        stops: Vec<String>,
        transfers: Vec<String>,
        routes: Vec<String>,
        trips: Vec<String>,
        stop_times: Vec<String>,
    }

    impl Fixture {
        fn stop(mut self, id: &str, parent: &str) -> Self {
            self.stops
                .push(format!("{id},Station {id},40.75,-73.98,,{parent}"));
            self
        }

        fn transfer(mut self, from: &str, to: &str, secs: u32) -> Self {
            self.transfers.push(format!("{from},{to},2,{secs}"));
            self
        }

        fn route(mut self, id: &str) -> Self {
            self.routes.push(format!("MTA NYCT,{id},{id},Line {id},1"));
            self
        }

        fn trip_header(mut self, route: &str, id: &str) -> Self {
            self.trips.push(format!("{route},{id},Weekday,Somewhere,0,"));
            self
        }

        fn trip(mut self, route: &str, id: &str, calls: &[(&str, &str)]) -> Self {
            self = self.trip_header(route, id);
            for (i, (stop, time)) in calls.iter().enumerate() {
                self.stop_times
                    .push(format!("{id},{stop},{time},{time},{}", i + 1));
            }
            self
        }

        fn raw_stop_time(mut self, line: &str) -> Self {
            self.stop_times.push(line.to_string());
            self
        }

        fn feed(&self) -> Result<RawFeed, FeedError> {
            let file = |header: &str, lines: &[String]| {
                let mut text = format!("{header}\n");
                for line in lines {
                    text.push_str(line);
                    text.push('\n');
                }
                text
            };
            RawFeed::from_readers(
                file("stop_id,stop_name,stop_lat,stop_lon,location_type,parent_station", &self.stops).as_bytes(),
                file("from_stop_id,to_stop_id,transfer_type,min_transfer_time", &self.transfers).as_bytes(),
                file("agency_id,route_id,route_short_name,route_long_name,route_type", &self.routes).as_bytes(),
                file("route_id,trip_id,service_id,trip_headsign,direction_id,shape_id", &self.trips).as_bytes(),
                file("trip_id,stop_id,arrival_time,departure_time,stop_sequence", &self.stop_times).as_bytes(),
            )
        }

        fn build(&self) -> Result<TransitGraph, FeedError> {
            GraphBuilder::new(&self.feed()?).build()
        }
    }

    fn stations(names: &[&str]) -> Fixture {
        names
            .iter()
            .fold(Fixture::default(), |f, name| f.stop(name, ""))
            .route("1")
    }

    #[test]
    fn consecutive_calls_become_edges() {
        let graph = stations(&["A", "B", "C"])
            .trip("1", "T1", &[("A", "08:00:00"), ("B", "08:01:00"), ("C", "08:03:00")])
            .build()
            .unwrap();

        assert_eq!(graph.edge(&id("A"), &id("B")).unwrap().duration, 60.0);
        assert_eq!(graph.edge(&id("B"), &id("C")).unwrap().duration, 120.0);
        assert!(graph.edge(&id("B"), &id("A")).is_none());
        assert!(graph.edge(&id("A"), &id("C")).is_none());
    }

    #[test]
    fn durations_are_averaged_across_trips() {
        let graph = stations(&["A", "B"])
            .trip("1", "T1", &[("A", "08:00:00"), ("B", "08:01:00")])
            .trip("1", "T2", &[("A", "09:00:00"), ("B", "09:01:30")])
            .build()
            .unwrap();

        assert_eq!(graph.edge(&id("A"), &id("B")).unwrap().duration, 75.0);
    }

    #[test]
    fn midnight_rollover_segment() {
        let graph = stations(&["A", "B", "C"])
            .trip(
                "1",
                "T1",
                &[("A", "23:59:00"), ("B", "23:59:30"), ("C", "00:00:10")],
            )
            .build()
            .unwrap();

        assert_eq!(graph.edge(&id("B"), &id("C")).unwrap().duration, 40.0);
    }

    #[test]
    fn rollover_carries_along_the_trip() {
        let graph = stations(&["A", "B", "C"])
            .trip(
                "1",
                "T1",
                &[("A", "23:59:00"), ("B", "00:00:30"), ("C", "00:02:30")],
            )
            .build()
            .unwrap();

        assert_eq!(graph.edge(&id("A"), &id("B")).unwrap().duration, 90.0);
        assert_eq!(graph.edge(&id("B"), &id("C")).unwrap().duration, 120.0);
    }

    #[test]
    fn gaps_in_stop_sequence_do_not_form_segments() {
        let graph = stations(&["A", "B", "C"])
            .trip("1", "T1", &[("B", "08:00:00"), ("C", "08:01:00")])
            .trip_header("1", "T2")
            .raw_stop_time("T2,A,09:00:00,09:00:00,1")
            .raw_stop_time("T2,B,09:05:00,09:05:00,3")
            .build()
            .unwrap();

        assert!(graph.edge(&id("A"), &id("B")).is_none());
        assert!(graph.station(&id("A")).is_none(), "A has no links and is pruned");
    }

    #[test]
    fn stop_times_are_ordered_by_sequence() {
        let graph = stations(&["A", "B"])
            .trip_header("1", "T1")
            .raw_stop_time("T1,B,08:01:00,08:01:00,2")
            .raw_stop_time("T1,A,08:00:00,08:00:00,1")
            .build()
            .unwrap();

        assert_eq!(graph.edge(&id("A"), &id("B")).unwrap().duration, 60.0);
    }

    #[test]
    fn unlinked_intermediates_are_dropped() {
        // The local's sequence numbers skip, so Y never forms an edge.
        let graph = stations(&["X", "Y", "Z"])
            .trip_header("1", "LOCAL")
            .raw_stop_time("LOCAL,X,08:00:00,08:00:00,1")
            .raw_stop_time("LOCAL,Y,08:02:00,08:02:00,3")
            .raw_stop_time("LOCAL,Z,08:04:00,08:04:00,5")
            .trip("1", "EXPRESS", &[("X", "09:00:00"), ("Z", "09:03:00")])
            .build()
            .unwrap();

        assert!(graph.edge(&id("X"), &id("Z")).unwrap().intermediates.is_empty());
    }

    #[test]
    fn platforms_resolve_to_parent_station() {
        let graph = Fixture::default()
            .stop("A", "")
            .stop("AN", "A")
            .stop("AS", "A")
            .stop("B", "")
            .stop("BN", "B")
            .route("1")
            .trip("1", "T1", &[("AN", "08:00:00"), ("BN", "08:02:00")])
            .trip("1", "T2", &[("BN", "09:00:00"), ("AS", "09:01:00")])
            .transfer("AN", "AS", 0)
            .build()
            .unwrap();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.edge(&id("A"), &id("B")).unwrap().duration, 120.0);
        assert_eq!(graph.edge(&id("B"), &id("A")).unwrap().duration, 60.0);
        assert!(graph.transfer(&id("A"), &id("A")).unwrap().is_self());
        assert!(graph.station(&id("AN")).is_none());
    }

    #[test]
    fn nested_parents_resolve_to_forest_root() {
        let graph = Fixture::default()
            .stop("A", "")
            .stop("A1", "A")
            .stop("A1N", "A1")
            .stop("B", "")
            .route("1")
            .trip("1", "T1", &[("A1N", "08:00:00"), ("B", "08:02:00")])
            .build()
            .unwrap();

        assert!(graph.edge(&id("A"), &id("B")).is_some());
    }

    #[test]
    fn express_edge_records_skipped_stations() {
        let graph = stations(&["X", "Y", "Z"])
            .trip(
                "1",
                "LOCAL",
                &[("X", "08:00:00"), ("Y", "08:02:00"), ("Z", "08:04:00")],
            )
            .trip("1", "EXPRESS", &[("X", "09:00:00"), ("Z", "09:03:00")])
            .build()
            .unwrap();

        let express = graph.edge(&id("X"), &id("Z")).unwrap();
        assert_eq!(express.intermediates, vec![id("Y")]);
        assert_eq!(express.duration, 180.0);
        assert!(graph.edge(&id("X"), &id("Y")).unwrap().intermediates.is_empty());
        assert!(graph.edge(&id("Y"), &id("Z")).unwrap().intermediates.is_empty());
    }

    #[test]
    fn conflicting_patterns_are_merged() {
        let graph = stations(&["V", "W", "X", "Y"])
            .trip(
                "1",
                "L1",
                &[("V", "08:00:00"), ("W", "08:01:00"), ("Y", "08:02:00")],
            )
            .trip(
                "1",
                "L2",
                &[("V", "08:00:00"), ("X", "08:01:00"), ("Y", "08:02:00")],
            )
            .trip("1", "EXP", &[("V", "09:00:00"), ("Y", "09:01:00")])
            .build()
            .unwrap();

        assert_eq!(
            graph.edge(&id("V"), &id("Y")).unwrap().intermediates,
            vec![id("W"), id("X")]
        );
    }

    #[test]
    fn unknown_route_is_fatal() {
        let err = stations(&["A", "B"])
            .trip("9", "T1", &[("A", "08:00:00"), ("B", "08:01:00")])
            .build()
            .unwrap_err();

        match err {
            FeedError::UnknownReference { file, kind, id, .. } => {
                assert_eq!(file, "trips.txt");
                assert_eq!(kind, "route");
                assert_eq!(id, "9");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_trip_is_fatal() {
        let err = stations(&["A"])
            .raw_stop_time("GHOST,A,08:00:00,08:00:00,1")
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            FeedError::UnknownReference {
                file: "stop_times.txt",
                line: 2,
                kind: "trip",
                ..
            }
        ));
    }

    #[test]
    fn unknown_station_in_stop_times_is_fatal() {
        let err = stations(&["A"])
            .trip("1", "T1", &[("A", "08:00:00"), ("Q", "08:01:00")])
            .build()
            .unwrap_err();

        assert!(matches!(
            err,
            FeedError::UnknownReference { kind: "station", .. }
        ));
    }

    #[test]
    fn unknown_transfer_station_is_fatal() {
        let err = stations(&["A"]).transfer("A", "Q", 60).build().unwrap_err();
        assert!(matches!(
            err,
            FeedError::UnknownReference {
                file: "transfers.txt",
                ..
            }
        ));
    }

    #[test]
    fn unknown_parent_is_fatal() {
        let err = Fixture::default().stop("AN", "A").build().unwrap_err();
        assert!(matches!(
            err,
            FeedError::UnknownReference {
                kind: "parent station",
                ..
            }
        ));
    }

    #[test]
    fn parent_cycle_is_fatal() {
        let err = Fixture::default()
            .stop("A", "B")
            .stop("B", "A")
            .build()
            .unwrap_err();
        assert!(matches!(err, FeedError::ParentCycle { .. }));
    }

    #[test]
    fn later_transfer_overwrites_earlier() {
        let graph = stations(&["A", "B"])
            .transfer("A", "B", 60)
            .transfer("A", "B", 240)
            .build()
            .unwrap();

        assert_eq!(graph.transfer(&id("A"), &id("B")).unwrap().min_transfer_time, 240);
    }

    #[test]
    fn isolated_stations_are_pruned() {
        let graph = stations(&["A", "B", "LONELY"])
            .trip("1", "T1", &[("A", "08:00:00"), ("B", "08:01:00")])
            .build()
            .unwrap();

        assert!(graph.station(&id("LONELY")).is_none());
        assert_eq!(graph.len(), 2);
    }

    #[test]
    fn excluded_prefixes_remove_stations_and_links() {
        let fixture = stations(&["A", "B", "S1", "S2"])
            .trip(
                "1",
                "T1",
                &[("A", "08:00:00"), ("S1", "08:01:00"), ("B", "08:02:00")],
            )
            .trip("1", "T2", &[("A", "09:00:00"), ("B", "09:02:00")])
            .trip("1", "T3", &[("S1", "10:00:00"), ("S2", "10:02:00")])
            .transfer("B", "S2", 120);
        let feed = fixture.feed().unwrap();

        let graph = GraphBuilder::new(&feed)
            .with_options(BuildOptions::excluding(["S"]))
            .build()
            .unwrap();

        assert_eq!(graph.len(), 2);
        assert!(graph.station(&id("S1")).is_none());
        assert!(graph.transfer(&id("B"), &id("S2")).is_none());
        assert!(graph.edge(&id("A"), &id("B")).unwrap().intermediates.is_empty());
    }

    #[test]
    fn building_is_deterministic() {
        let fixture = stations(&["X", "Y", "Z", "W"])
            .trip(
                "1",
                "L",
                &[("X", "08:00:00"), ("Y", "08:02:00"), ("Z", "08:04:10")],
            )
            .trip("1", "E", &[("X", "09:00:00"), ("Z", "09:03:00")])
            .trip("1", "R", &[("Z", "09:00:00"), ("W", "09:01:07")])
            .transfer("W", "X", 300);

        let first = fixture.build().unwrap();
        let second = fixture.build().unwrap();

        let summary = |graph: &TransitGraph| {
            graph
                .edges()
                .map(|e| (e.from.clone(), e.to.clone(), e.duration, e.intermediates.clone()))
                .collect::<Vec<_>>()
        };
        assert_eq!(summary(&first), summary(&second));
        assert_eq!(
            first.stations().iter().map(|s| s.id.clone()).collect::<Vec<_>>(),
            second.stations().iter().map(|s| s.id.clone()).collect::<Vec<_>>()
        );
    }
}
