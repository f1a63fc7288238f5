use std::collections::BTreeMap;

use foundation::Aabb2;

use crate::layer::{FeatureKey, FeatureState, LayerId, LayerSource, MapLayer, RenderedFeature};
use crate::symbology::LayerStyle;

/// In-process map layer: keeps the state a renderer would hold.
///
/// Used headless by the CLI and by tests; a browser build forwards the same
/// calls to the map library instead.
#[derive(Debug, Clone, PartialEq)]
pub struct VectorLayer {
    id: LayerId,
    style: LayerStyle,
    source: Option<LayerSource>,
    states: BTreeMap<FeatureKey, FeatureState>,
    camera: Option<Aabb2>,
}

impl VectorLayer {
    pub fn new(id: u64, style: LayerStyle) -> Self {
        Self {
            id: LayerId(id),
            style,
            source: None,
            states: BTreeMap::new(),
            camera: None,
        }
    }

    pub fn source(&self) -> Option<&LayerSource> {
        self.source.as_ref()
    }

    pub fn camera(&self) -> Option<Aabb2> {
        self.camera
    }

    pub fn style(&self) -> &LayerStyle {
        &self.style
    }

    /// Keys whose `selected` state is set, ascending.
    pub fn selected_keys(&self) -> Vec<FeatureKey> {
        self.states
            .iter()
            .filter(|(_, s)| s.selected)
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn fill_of(&self, key: FeatureKey) -> [f32; 4] {
        let state = self.states.get(&key).copied().unwrap_or_default();
        self.style.fill_for(state)
    }
}

impl MapLayer for VectorLayer {
    fn id(&self) -> LayerId {
        self.id
    }

    fn swap_source(&mut self, source: LayerSource) {
        self.states.clear();
        self.source = Some(source);
    }

    fn set_feature_state(&mut self, key: FeatureKey, state: FeatureState) {
        if state == FeatureState::default() {
            self.states.remove(&key);
        } else {
            self.states.insert(key, state);
        }
    }

    fn clear_feature_states(&mut self) {
        self.states.clear();
    }

    fn rendered_features(&self) -> Vec<RenderedFeature> {
        match &self.source {
            Some(LayerSource::GeoJson { collection, .. }) => collection
                .features
                .iter()
                .map(|f| RenderedFeature {
                    key: f.index,
                    entity: f.entity.clone(),
                })
                .collect(),
            // Tile contents live in the renderer, not in this process.
            Some(LayerSource::Tiles { .. }) | None => Vec::new(),
        }
    }

    fn fit_bounds(&mut self, bounds: Aabb2) {
        if !bounds.is_empty() {
            self.camera = Some(bounds);
        }
    }
}
