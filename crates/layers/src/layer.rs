use std::sync::Arc;

use formats::GlacierCollection;
use foundation::{Aabb2, EntityId, Year};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct LayerId(pub u64);

/// Position of a feature in its year's `features` array.
///
/// Tiles are generated with the same ids (`--generate-ids`), so a key is valid
/// for both the GeoJSON and the tiled form of a year.
pub type FeatureKey = usize;

/// Data a map layer draws.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSource {
    GeoJson {
        year: Year,
        collection: Arc<GlacierCollection>,
    },
    Tiles {
        year: Year,
        template: String,
    },
}

impl LayerSource {
    pub fn year(&self) -> Year {
        match self {
            LayerSource::GeoJson { year, .. } | LayerSource::Tiles { year, .. } => *year,
        }
    }
}

/// Per-feature flags the paint rules are keyed on.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct FeatureState {
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFeature {
    pub key: FeatureKey,
    pub entity: EntityId,
}

/// Imperative surface of a map renderer, as used by the render binder.
pub trait MapLayer {
    fn id(&self) -> LayerId;

    /// Replaces the layer's data. Feature states of the old source are dropped.
    fn swap_source(&mut self, source: LayerSource);

    fn set_feature_state(&mut self, key: FeatureKey, state: FeatureState);

    fn clear_feature_states(&mut self);

    /// Features currently loaded in the layer.
    fn rendered_features(&self) -> Vec<RenderedFeature>;

    /// Moves the camera to show `bounds`. Empty bounds leave the camera alone.
    fn fit_bounds(&mut self, bounds: Aabb2);
}
