use foundation::EntityId;

/// Copy of the selection at one instant, used to stamp async loads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SelectionSnapshot {
    pub year_index: usize,
    pub entity: Option<EntityId>,
}

/// The single view state shared by the map and every chart panel.
///
/// Two independent axes: the active year index (what the slider points at)
/// and an optional selected glacier. Every mutator returns `true` only when
/// the state actually changed, so callers can skip redundant render passes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionState {
    year_count: usize,
    year_index: usize,
    entity: Option<EntityId>,
}

impl SelectionState {
    /// Starts at the baseline year with every glacier shown.
    ///
    /// `year_count` is clamped to at least 1.
    pub fn new(year_count: usize) -> Self {
        Self {
            year_count: year_count.max(1),
            year_index: 0,
            entity: None,
        }
    }

    pub fn year_count(&self) -> usize {
        self.year_count
    }

    pub fn year_index(&self) -> usize {
        self.year_index
    }

    pub fn entity(&self) -> Option<&EntityId> {
        self.entity.as_ref()
    }

    /// Out-of-range indices are clamped to the last year, like a slider's max.
    pub fn set_year_index(&mut self, index: usize) -> bool {
        let index = index.min(self.year_count - 1);
        if index == self.year_index {
            return false;
        }
        self.year_index = index;
        true
    }

    pub fn select_entity(&mut self, entity: EntityId) -> bool {
        if self.entity.as_ref() == Some(&entity) {
            return false;
        }
        self.entity = Some(entity);
        true
    }

    /// "Show all glaciers".
    pub fn clear_entity(&mut self) -> bool {
        self.entity.take().is_some()
    }

    pub fn snapshot(&self) -> SelectionSnapshot {
        SelectionSnapshot {
            year_index: self.year_index,
            entity: self.entity.clone(),
        }
    }

    pub fn matches(&self, snapshot: &SelectionSnapshot) -> bool {
        self.year_index == snapshot.year_index && self.entity == snapshot.entity
    }
}
