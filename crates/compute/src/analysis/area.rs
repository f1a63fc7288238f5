use std::collections::BTreeMap;

use formats::GlacierCollection;
use foundation::{EntityId, Year};

/// km² per glacier for one survey year, in id order.
pub type EntityAreas = BTreeMap<EntityId, f64>;

pub struct AreaAnalysis;

impl AreaAnalysis {
    /// Sum of all feature areas in km². Empty collections sum to 0.
    pub fn total_area(collection: &GlacierCollection) -> f64 {
        collection.features.iter().map(|f| f.area_km2).sum()
    }

    /// Feature areas grouped by glacier id. Glaciers without features are absent.
    pub fn area_by_entity(collection: &GlacierCollection) -> EntityAreas {
        let mut out = EntityAreas::new();
        for feature in &collection.features {
            *out.entry(feature.entity.clone()).or_insert(0.0) += feature.area_km2;
        }
        out
    }

    pub fn max_entity_area(areas: &EntityAreas) -> Option<f64> {
        areas.values().copied().reduce(f64::max)
    }
}

/// Aggregated metrics for a loaded year.
#[derive(Debug, Clone, PartialEq)]
pub struct YearMetrics {
    pub year: Year,
    pub total_km2: f64,
    pub by_entity: EntityAreas,
}

impl YearMetrics {
    pub fn from_collection(year: Year, collection: &GlacierCollection) -> Self {
        Self {
            year,
            total_km2: AreaAnalysis::total_area(collection),
            by_entity: AreaAnalysis::area_by_entity(collection),
        }
    }

    pub fn entity_area(&self, entity: &EntityId) -> Option<f64> {
        self.by_entity.get(entity).copied()
    }
}
