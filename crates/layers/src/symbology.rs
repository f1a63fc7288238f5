use serde_json::{Value, json};

use crate::layer::FeatureState;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayerStyle {
    pub visible: bool,
    pub fill: [f32; 4],
    /// Fill used while the feature's `selected` state is set.
    pub selected_fill: [f32; 4],
    pub outline: [f32; 4],
}

impl LayerStyle {
    pub const fn new(visible: bool, fill: [f32; 4], selected_fill: [f32; 4], outline: [f32; 4]) -> Self {
        Self {
            visible,
            fill,
            selected_fill,
            outline,
        }
    }

    pub fn fill_for(&self, state: FeatureState) -> [f32; 4] {
        if state.selected {
            self.selected_fill
        } else {
            self.fill
        }
    }

    /// MapLibre paint properties for a fill layer.
    ///
    /// The fill switches on the `selected` feature state, so highlighting never
    /// requires touching the source data.
    pub fn to_paint(&self) -> Value {
        json!({
            "fill-color": [
                "case",
                ["boolean", ["feature-state", "selected"], false],
                hex(self.selected_fill),
                hex(self.fill)
            ],
            "fill-opacity": self.fill[3],
            "fill-outline-color": hex(self.outline),
        })
    }
}

impl Default for LayerStyle {
    fn default() -> Self {
        // Ice blue, selection in orange.
        Self {
            visible: true,
            fill: [0.53, 0.81, 0.92, 0.8],
            selected_fill: [1.0, 0.4, 0.0, 0.8],
            outline: [0.2, 0.4, 0.6, 1.0],
        }
    }
}

fn hex(color: [f32; 4]) -> String {
    let c = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    format!("#{:02x}{:02x}{:02x}", c(color[0]), c(color[1]), c(color[2]))
}
