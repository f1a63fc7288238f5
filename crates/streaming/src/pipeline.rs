use std::collections::BTreeMap;
use std::path::PathBuf;

use foundation::Year;
use scene::SelectionSnapshot;

use crate::request::{LoadRequest, RequestId};

/// Book-keeping for loads that have been issued but not completed.
///
/// There is no cancellation: a superseded load still completes, and the
/// caller decides what to do with it by comparing its stamp with the
/// current selection.
#[derive(Debug, Default)]
pub struct LoadPipeline {
    next_request: u64,
    in_flight: BTreeMap<RequestId, LoadRequest>,
}

impl LoadPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn issue(&mut self, year: Year, path: PathBuf, stamp: SelectionSnapshot) -> LoadRequest {
        let id = RequestId(self.next_request);
        self.next_request += 1;
        let req = LoadRequest {
            id,
            year,
            path,
            stamp,
        };
        self.in_flight.insert(id, req.clone());
        req
    }

    /// `true` if a load for `year` issued under `stamp` is still pending.
    pub fn is_pending(&self, year: Year, stamp: &SelectionSnapshot) -> bool {
        self.in_flight
            .values()
            .any(|r| r.year == year && &r.stamp == stamp)
    }

    /// Removes and returns the request. Unknown or already completed ids give `None`.
    pub fn complete(&mut self, id: RequestId) -> Option<LoadRequest> {
        self.in_flight.remove(&id)
    }

    pub fn in_flight_len(&self) -> usize {
        self.in_flight.len()
    }

    pub fn in_flight(&self) -> impl Iterator<Item = &LoadRequest> {
        self.in_flight.values()
    }
}
