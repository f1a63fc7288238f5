use serde::Serialize;

/// Axis-aligned lon/lat bounding box in degrees.
///
/// `min`/`max` are `[lon, lat]`. A box with no points extended into it is empty
/// and reports `None` from accessors that need a real extent.
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn empty() -> Self {
        Aabb2 {
            min: [f64::INFINITY, f64::INFINITY],
            max: [f64::NEG_INFINITY, f64::NEG_INFINITY],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min[0] > self.max[0] || self.min[1] > self.max[1]
    }

    pub fn extend(&mut self, lon: f64, lat: f64) {
        self.min[0] = self.min[0].min(lon);
        self.min[1] = self.min[1].min(lat);
        self.max[0] = self.max[0].max(lon);
        self.max[1] = self.max[1].max(lat);
    }

    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        Aabb2 {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    pub fn center(&self) -> Option<[f64; 2]> {
        if self.is_empty() {
            return None;
        }
        Some([
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ])
    }
}

impl Default for Aabb2 {
    fn default() -> Self {
        Self::empty()
    }
}
