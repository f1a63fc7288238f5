use std::collections::BTreeMap;
use std::sync::Arc;

use compute::YearMetrics;
use formats::GlacierCollection;
use foundation::Year;

use crate::residency::{Residency, ResidencyState};

/// A loaded year: the outlines plus the metrics derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct YearData {
    pub collection: Arc<GlacierCollection>,
    pub metrics: YearMetrics,
}

#[derive(Debug, Clone)]
struct StoreEntry {
    residency: Residency,
    data: Option<Arc<YearData>>,
}

/// Per-year collections with explicit residency and a write-once baseline.
///
/// Entries live in a `BTreeMap` so traversal is in year order. Metrics are
/// recomputed on every insert and never outlive the collection they came from.
#[derive(Debug)]
pub struct CollectionStore {
    baseline_year: Year,
    entries: BTreeMap<Year, StoreEntry>,
    baseline: Option<Arc<YearData>>,
}

impl CollectionStore {
    pub fn new(baseline_year: Year) -> Self {
        Self {
            baseline_year,
            entries: BTreeMap::new(),
            baseline: None,
        }
    }

    pub fn baseline_year(&self) -> Year {
        self.baseline_year
    }

    pub fn state(&self, year: Year) -> Option<ResidencyState> {
        self.entries.get(&year).map(|e| e.residency.state)
    }

    pub fn is_resident(&self, year: Year) -> bool {
        self.state(year) == Some(ResidencyState::Resident)
    }

    pub fn mark_requested(&mut self, year: Year) {
        let entry = self.entries.entry(year).or_insert_with(|| StoreEntry {
            residency: Residency::new(),
            data: None,
        });
        // A resident year being reloaded keeps serving its current data.
        if entry.data.is_none() {
            entry.residency.state = ResidencyState::Requested;
        }
    }

    /// Records a failed load. Data from an earlier successful load is kept.
    pub fn mark_failed(&mut self, year: Year) {
        let entry = self.entries.entry(year).or_insert_with(|| StoreEntry {
            residency: Residency::new(),
            data: None,
        });
        if entry.data.is_none() {
            entry.residency.state = ResidencyState::Failed;
        }
    }

    /// Stores a freshly loaded collection and returns its derived data.
    ///
    /// The first insert for the baseline year also fixes the baseline; later
    /// reloads of that year never replace it.
    pub fn insert(&mut self, year: Year, collection: GlacierCollection) -> Arc<YearData> {
        let metrics = YearMetrics::from_collection(year, &collection);
        let data = Arc::new(YearData {
            collection: Arc::new(collection),
            metrics,
        });

        if year == self.baseline_year && self.baseline.is_none() {
            self.baseline = Some(Arc::clone(&data));
        }

        self.entries.insert(
            year,
            StoreEntry {
                residency: Residency {
                    state: ResidencyState::Resident,
                },
                data: Some(Arc::clone(&data)),
            },
        );
        data
    }

    pub fn get(&self, year: Year) -> Option<&Arc<YearData>> {
        self.entries.get(&year).and_then(|e| e.data.as_ref())
    }

    pub fn baseline(&self) -> Option<&Arc<YearData>> {
        self.baseline.as_ref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
