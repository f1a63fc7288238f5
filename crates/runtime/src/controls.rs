use foundation::{EntityId, Year, YearSet};
use scene::SelectionState;
use tracing::debug;

/// Input from the page controls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// Year slider moved to an index.
    YearSlider(usize),
    /// Year chosen from the dropdown.
    YearPicked(Year),
    /// Glacier clicked on the map or in a chart.
    EntityPicked(EntityId),
    /// Glacier dropdown; `None` is its "all glaciers" entry.
    EntityDropdown(Option<EntityId>),
    /// "Return to all" button.
    ShowAll,
}

/// Maps each control 1:1 onto a selection mutation.
pub struct ControlSurface;

impl ControlSurface {
    /// Returns `true` if the selection changed and a render pass is due.
    pub fn apply(selection: &mut SelectionState, years: &YearSet, event: &ControlEvent) -> bool {
        match event {
            ControlEvent::YearSlider(index) => selection.set_year_index(*index),
            ControlEvent::YearPicked(year) => match years.index_of(*year) {
                Some(index) => selection.set_year_index(index),
                None => {
                    debug!("ignoring unknown year {year}");
                    false
                }
            },
            ControlEvent::EntityPicked(id) => selection.select_entity(id.clone()),
            ControlEvent::EntityDropdown(Some(id)) => selection.select_entity(id.clone()),
            ControlEvent::EntityDropdown(None) | ControlEvent::ShowAll => selection.clear_entity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ControlEvent, ControlSurface};
    use foundation::{EntityId, Year, YearSet};
    use scene::SelectionState;

    #[test]
    fn each_control_maps_to_one_mutation() {
        let years = YearSet::glacier_default();
        let mut s = SelectionState::new(years.len());

        assert!(ControlSurface::apply(&mut s, &years, &ControlEvent::YearSlider(2)));
        assert_eq!(s.year_index(), 2);

        assert!(ControlSurface::apply(&mut s, &years, &ControlEvent::YearPicked(Year(2016))));
        assert_eq!(s.year_index(), 4);
        assert!(!ControlSurface::apply(&mut s, &years, &ControlEvent::YearPicked(Year(1999))));

        let b = EntityId::new("B").unwrap();
        assert!(ControlSurface::apply(&mut s, &years, &ControlEvent::EntityPicked(b.clone())));
        assert!(!ControlSurface::apply(&mut s, &years, &ControlEvent::EntityDropdown(Some(b))));
        assert!(ControlSurface::apply(&mut s, &years, &ControlEvent::ShowAll));
        assert!(!ControlSurface::apply(&mut s, &years, &ControlEvent::EntityDropdown(None)));
    }

    #[test]
    fn slider_is_bounded_by_the_year_set() {
        let years = YearSet::glacier_default();
        let mut s = SelectionState::new(years.len());
        ControlSurface::apply(&mut s, &years, &ControlEvent::YearSlider(40));
        assert_eq!(s.year_index(), years.last_index());
    }
}
