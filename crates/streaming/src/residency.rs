/// Lifecycle of one year's data in the store.
///
/// Requested → Resident, or Requested → Failed. A failed year is requested
/// again by the next render pass that needs it.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ResidencyState {
    Requested,
    Resident,
    Failed,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Residency {
    pub state: ResidencyState,
}

impl Residency {
    pub fn new() -> Self {
        Self {
            state: ResidencyState::Requested,
        }
    }
}

impl Default for Residency {
    fn default() -> Self {
        Self::new()
    }
}
