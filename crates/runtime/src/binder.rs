use std::sync::Arc;

use compute::{AreaAnalysis, Change, RetreatSeries, compute_change};
use formats::{DatasetRegistry, GlacierCollection, MapSource, ParseOptions};
use foundation::{Aabb2, Year};
use layers::charts::{ChartFrame, ChartPanel, RankKey, ranked_bars, retreat_rates, stacked_proportion};
use layers::{FeatureKey, FeatureState, LayerSource, MapLayer};
use scene::{SelectionSnapshot, SelectionState};
use streaming::{CollectionStore, LoadPipeline, LoadRequest, RequestId, SourceError};
use tracing::{debug, info, warn};

use crate::controls::{ControlEvent, ControlSurface};
use crate::event_bus::{Event, EventBus, EventKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinderConfig {
    pub rank_key: RankKey,
    /// Bars shown besides the pinned selection.
    pub rank_limit: usize,
    pub parse: ParseOptions,
}

impl Default for BinderConfig {
    fn default() -> Self {
        Self {
            rank_key: RankKey::AreaDescending,
            rank_limit: 10,
            parse: ParseOptions::default(),
        }
    }
}

/// The three auxiliary chart panels next to the map.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ChartPanels<P> {
    pub stacked: P,
    pub ranked: P,
    pub rates: P,
}

/// Everything one render pass puts on screen.
///
/// Computed purely from the selection and resident data, so the same
/// selection over the same data always yields an equal frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderFrame {
    pub year: Year,
    pub selection: SelectionSnapshot,
    pub source: LayerSource,
    pub highlighted: Vec<FeatureKey>,
    pub camera: Aabb2,
    pub total_km2: f64,
    pub entity_km2: Option<f64>,
    pub since_baseline: Change,
    pub since_previous: Option<Change>,
    pub stacked: ChartFrame,
    pub ranked: ChartFrame,
    pub rates: ChartFrame,
}

/// Applies the selection to the map layer and chart panels.
///
/// Loads are not performed here: `start`, `handle` and `request_render` return
/// the loads to run, and the caller feeds results back through `complete`.
pub struct RenderBinder<L, P> {
    registry: DatasetRegistry,
    config: BinderConfig,
    selection: SelectionState,
    store: CollectionStore,
    pipeline: LoadPipeline,
    layer: L,
    charts: ChartPanels<P>,
    events: EventBus,
    pass: u64,
    last_frame: Option<RenderFrame>,
}

impl<L: MapLayer, P: ChartPanel> RenderBinder<L, P> {
    pub fn new(registry: DatasetRegistry, config: BinderConfig, layer: L, charts: ChartPanels<P>) -> Self {
        let years = registry.years();
        let selection = SelectionState::new(years.len());
        let store = CollectionStore::new(years.baseline());
        Self {
            registry,
            config,
            selection,
            store,
            pipeline: LoadPipeline::new(),
            layer,
            charts,
            events: EventBus::new(),
            pass: 0,
            last_frame: None,
        }
    }

    pub fn selection(&self) -> &SelectionState {
        &self.selection
    }

    pub fn registry(&self) -> &DatasetRegistry {
        &self.registry
    }

    pub fn store(&self) -> &CollectionStore {
        &self.store
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    pub fn charts(&self) -> &ChartPanels<P> {
        &self.charts
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Takes the recorded events, leaving the log empty.
    pub fn drain_events(&mut self) -> Vec<Event> {
        self.events.drain()
    }

    pub fn last_frame(&self) -> Option<&RenderFrame> {
        self.last_frame.as_ref()
    }

    pub fn in_flight(&self) -> usize {
        self.pipeline.in_flight_len()
    }

    /// First render pass for the initial selection.
    pub fn start(&mut self) -> Vec<LoadRequest> {
        self.request_render()
    }

    pub fn handle(&mut self, event: &ControlEvent) -> Vec<LoadRequest> {
        if ControlSurface::apply(&mut self.selection, self.registry.years(), event) {
            self.request_render()
        } else {
            Vec::new()
        }
    }

    /// Starts a render pass: requests missing years, or renders right away
    /// when everything the pass needs is resident.
    pub fn request_render(&mut self) -> Vec<LoadRequest> {
        self.pass += 1;
        let stamp = self.selection.snapshot();
        let mut loads = Vec::new();

        for year in self.needed_years() {
            if self.store.is_resident(year) || self.pipeline.is_pending(year, &stamp) {
                continue;
            }
            let path = match self.registry.locate(year) {
                Ok(entry) => entry.features.clone(),
                Err(err) => {
                    warn!("cannot load year {year}: {err}");
                    continue;
                }
            };
            self.store.mark_requested(year);
            let req = self.pipeline.issue(year, path, stamp.clone());
            self.events
                .emit(self.pass, EventKind::LoadIssued, format!("{year} -> {}", req.path.display()));
            loads.push(req);
        }

        if loads.is_empty() {
            self.try_render();
        }
        loads
    }

    /// Feeds back the result of a load returned earlier.
    ///
    /// Data is stored whenever it parses, but a render is only attempted if the
    /// selection still equals the one the load was issued for.
    pub fn complete(&mut self, id: RequestId, result: Result<String, SourceError>) {
        let Some(req) = self.pipeline.complete(id) else {
            debug!("ignoring completion for unknown request {id:?}");
            return;
        };

        let payload = match result {
            Ok(payload) => payload,
            Err(err) => {
                warn!("load of {} failed: {err}", req.year);
                self.store.mark_failed(req.year);
                self.events
                    .emit(self.pass, EventKind::LoadFailed, format!("{}: {err}", req.year));
                self.catch_up();
                return;
            }
        };

        let collection = match GlacierCollection::from_geojson_str(&payload, &self.config.parse) {
            Ok(c) => c,
            Err(err) => {
                warn!("data for {} is unusable: {err}", req.year);
                self.store.mark_failed(req.year);
                self.events
                    .emit(self.pass, EventKind::ParseFailed, format!("{}: {err}", req.year));
                self.catch_up();
                return;
            }
        };
        if !collection.diagnostics.is_empty() {
            debug!(
                "{}: skipped {} feature(s), first: {}",
                req.year,
                collection.diagnostics.len(),
                collection.diagnostics[0]
            );
        }
        self.store.insert(req.year, collection);

        if !self.selection.matches(&req.stamp) {
            debug!("discarding stale load of {} ({:?})", req.year, req.id);
            self.events
                .emit(self.pass, EventKind::StaleDiscarded, format!("{}", req.year));
            self.catch_up();
            return;
        }
        self.try_render();
    }

    /// Renders the current selection if the map does not show it yet.
    ///
    /// A completion that cannot render itself may still be the last thing the
    /// current pass was waiting on.
    fn catch_up(&mut self) {
        let shown = self
            .last_frame
            .as_ref()
            .is_some_and(|f| self.selection.matches(&f.selection));
        if !shown {
            self.try_render();
        }
    }

    /// Years from the baseline up to the selected one. All are requested, but
    /// only the baseline and the selected year gate the render.
    fn needed_years(&self) -> Vec<Year> {
        let years = self.registry.years();
        (0..=self.selection.year_index())
            .filter_map(|i| years.get(i))
            .collect()
    }

    fn try_render(&mut self) {
        match self.compose_frame() {
            Some(frame) => self.apply(frame),
            None => debug!("render pass {} waiting for data", self.pass),
        }
    }

    /// Builds the frame for the current selection.
    ///
    /// Returns `None` until the baseline and the selected year are resident
    /// and no earlier year is still loading for this selection. Earlier years
    /// that failed are left out of the rates.
    pub fn compose_frame(&self) -> Option<RenderFrame> {
        let years = self.registry.years();
        let index = self.selection.year_index();
        let year = years.get(index)?;

        let stamp = self.selection.snapshot();
        let needed = self.needed_years();
        if needed.iter().any(|y| self.pipeline.is_pending(*y, &stamp)) {
            return None;
        }
        let baseline = self.store.baseline()?;
        let baseline_year = years.baseline();
        let current = self.store.get(year)?;
        let collection = &current.collection;
        let entity = self.selection.entity();

        let highlighted: Vec<FeatureKey> = entity
            .map(|e| collection.features_of(e).map(|f| f.index).collect())
            .unwrap_or_default();
        let camera = entity
            .map(|e| collection.entity_bounds(e))
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| collection.bounds());

        let total_km2 = current.metrics.total_km2;
        let since_baseline = compute_change(
            total_km2,
            baseline.metrics.total_km2,
            year.years_since(baseline_year),
        );
        let since_previous = (0..index)
            .rev()
            .filter_map(|i| years.get(i))
            .find_map(|prev_year| {
                let prev = self.series_point(prev_year)?;
                Some(compute_change(total_km2, prev, year.years_since(prev_year)))
            });
        let series = RetreatSeries::new(
            needed
                .iter()
                .filter_map(|y| self.series_point(*y).map(|area| (*y, area))),
        );

        let scale_max = AreaAnalysis::max_entity_area(&baseline.metrics.by_entity).unwrap_or(0.0);

        let source = match self.registry.locate(year).ok()?.map_source() {
            MapSource::Tiles(template) => LayerSource::Tiles {
                year,
                template: template.to_string(),
            },
            MapSource::GeoJson(_) => LayerSource::GeoJson {
                year,
                collection: Arc::clone(collection),
            },
        };

        Some(RenderFrame {
            year,
            selection: stamp,
            source,
            highlighted,
            camera,
            total_km2,
            entity_km2: entity.and_then(|e| current.metrics.entity_area(e)),
            since_baseline,
            since_previous,
            stacked: stacked_proportion(total_km2, baseline.metrics.total_km2),
            ranked: ranked_bars(
                &current.metrics.by_entity,
                entity,
                self.config.rank_key,
                self.config.rank_limit,
                scale_max,
            ),
            rates: retreat_rates(&series),
        })
    }

    /// Total area for a year, taking the baseline year from the fixed baseline.
    fn series_point(&self, year: Year) -> Option<f64> {
        if year == self.store.baseline_year() {
            return self.store.baseline().map(|b| b.metrics.total_km2);
        }
        self.store.get(year).map(|d| d.metrics.total_km2)
    }

    fn apply(&mut self, frame: RenderFrame) {
        self.layer.swap_source(frame.source.clone());
        self.layer.clear_feature_states();
        for key in &frame.highlighted {
            self.layer
                .set_feature_state(*key, FeatureState { selected: true });
        }
        self.layer.fit_bounds(frame.camera);

        self.charts.stacked.draw(&frame.stacked);
        self.charts.ranked.draw(&frame.ranked);
        self.charts.rates.draw(&frame.rates);

        info!(
            "rendered {} (pass {}, {} highlighted)",
            frame.year,
            self.pass,
            frame.highlighted.len()
        );
        self.events
            .emit(self.pass, EventKind::Rendered, frame.year.to_string());
        self.last_frame = Some(frame);
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::path::PathBuf;

    use formats::{DatasetEntry, DatasetRegistry, ParseOptions};
    use foundation::Year;
    use layers::charts::RecordingPanel;
    use layers::symbology::LayerStyle;
    use layers::vector::VectorLayer;
    use serde_json::json;

    use super::{BinderConfig, ChartPanels, RenderBinder};

    pub type TestBinder = RenderBinder<VectorLayer, RecordingPanel>;

    /// `(glacier id, km², lon offset)` per feature.
    pub fn payload(features: &[(&str, f64, f64)]) -> String {
        let features: Vec<_> = features
            .iter()
            .map(|(id, area, lon)| {
                json!({
                    "type": "Feature",
                    "properties": { "sgi-id": id, "area_km2": area },
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [[[lon, 46.0], [lon + 0.1, 46.0], [lon + 0.1, 46.1], [lon, 46.1], [lon, 46.0]]]
                    }
                })
            })
            .collect();
        json!({ "type": "FeatureCollection", "features": features }).to_string()
    }

    pub fn path(year: i32) -> PathBuf {
        PathBuf::from(format!("data/{year}.geojson"))
    }

    /// 1850: A split across two basins (6 + 4), B 5, C 7, D 3 = 25 km².
    /// 1931: A 8, B 4, C 6 = 18 km². 1973: A 6, B 3 = 9 km².
    pub fn files() -> Vec<(PathBuf, String)> {
        vec![
            (
                path(1850),
                payload(&[("A", 6.0, 8.0), ("A", 4.0, 8.2), ("B", 5.0, 9.0), ("C", 7.0, 9.5), ("D", 3.0, 10.0)]),
            ),
            (path(1931), payload(&[("A", 8.0, 8.0), ("B", 4.0, 9.0), ("C", 6.0, 9.5)])),
            (path(1973), payload(&[("A", 6.0, 8.0), ("B", 3.0, 9.0)])),
        ]
    }

    pub fn registry(tiled: &[i32]) -> DatasetRegistry {
        DatasetRegistry::new([1850, 1931, 1973].map(|y| DatasetEntry {
            year: Year(y),
            features: path(y),
            tiles: tiled
                .contains(&y)
                .then(|| format!("tiles/{y}/{{z}}/{{x}}/{{y}}.pbf")),
        }))
        .unwrap()
    }

    pub fn binder(tiled: &[i32]) -> TestBinder {
        let config = BinderConfig {
            parse: ParseOptions {
                area_field: Some("area_km2".to_string()),
                ..ParseOptions::default()
            },
            ..BinderConfig::default()
        };
        RenderBinder::new(
            registry(tiled),
            config,
            VectorLayer::new(1, LayerStyle::default()),
            ChartPanels::default(),
        )
    }

    pub fn file(year: i32) -> Result<String, streaming::SourceError> {
        files()
            .into_iter()
            .find(|(p, _)| *p == path(year))
            .map(|(_, s)| s)
            .ok_or_else(|| streaming::SourceError::NotFound(path(year)))
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::{binder, file, payload, TestBinder};
    use crate::controls::ControlEvent;
    use crate::event_bus::EventKind;
    use foundation::{EntityId, Year};
    use layers::LayerSource;
    use pretty_assertions::assert_eq;
    use streaming::{LoadRequest, ResidencyState, SourceError};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn serve(b: &mut TestBinder, loads: Vec<LoadRequest>) {
        for req in loads {
            b.complete(req.id, file(req.year.0));
        }
    }

    fn started() -> TestBinder {
        let mut b = binder(&[]);
        let loads = b.start();
        serve(&mut b, loads);
        b
    }

    fn labels(frame: &layers::charts::ChartFrame) -> Vec<&str> {
        frame.data.iter().map(|d| d.label.as_str()).collect()
    }

    #[test]
    fn initial_pass_loads_only_the_baseline() {
        let mut b = binder(&[]);
        let loads = b.start();
        assert_eq!(loads.len(), 1);
        assert_eq!(loads[0].year, Year(1850));
        assert!(b.last_frame().is_none());

        serve(&mut b, loads);
        let frame = b.last_frame().unwrap();
        assert_eq!(frame.year, Year(1850));
        assert_close(frame.total_km2, 25.0, 1e-12);
        assert_eq!(frame.since_baseline.absolute, 0.0);
        assert_eq!(frame.since_previous, None);
        assert!(frame.rates.data.is_empty());
        assert_eq!(labels(&frame.ranked), vec!["A", "C", "B", "D"]);
        assert_close(frame.ranked.scale_max, 10.0, 1e-12);
        assert_eq!(b.charts().stacked.draw_count(), 1);
    }

    #[test]
    fn moving_the_slider_loads_every_year_up_to_the_target() {
        let mut b = started();
        let loads = b.handle(&ControlEvent::YearSlider(2));
        let years: Vec<Year> = loads.iter().map(|r| r.year).collect();
        assert_eq!(years, vec![Year(1931), Year(1973)]);

        // Arrival order does not matter; the pass renders once both are in.
        let mut loads = loads.into_iter().rev();
        let late = loads.next().unwrap();
        b.complete(late.id, file(late.year.0));
        assert_eq!(b.last_frame().unwrap().year, Year(1850));
        serve(&mut b, loads.collect());

        let frame = b.last_frame().unwrap();
        assert_eq!(frame.year, Year(1973));
        assert_close(frame.total_km2, 9.0, 1e-12);
        let prev = frame.since_previous.unwrap();
        assert_close(prev.absolute, -9.0, 1e-12);
        assert_close(prev.percent, -50.0, 1e-12);
        assert_close(prev.per_year, -9.0 / 42.0, 1e-12);
        assert_close(frame.since_baseline.percent, -64.0, 1e-12);
        assert_eq!(labels(&frame.rates), vec!["1850-1931", "1931-1973"]);
        // The ranked axis stays on the baseline scale.
        assert_close(frame.ranked.scale_max, 10.0, 1e-12);
        let remaining = frame.stacked.data[0].value;
        assert_close(remaining, 36.0, 1e-9);
    }

    #[test]
    fn round_trip_navigation_reproduces_the_render() {
        let mut b = started();
        let original = b.last_frame().unwrap().clone();

        let loads = b.handle(&ControlEvent::YearSlider(2));
        serve(&mut b, loads);
        assert_eq!(b.last_frame().unwrap().year, Year(1973));

        let loads = b.handle(&ControlEvent::YearSlider(0));
        assert!(loads.is_empty());
        assert_eq!(b.last_frame().unwrap(), &original);
    }

    #[test]
    fn stale_loads_are_stored_but_do_not_render() {
        let mut b = started();
        let to_1931 = b.handle(&ControlEvent::YearSlider(1));
        assert_eq!(to_1931.len(), 1);

        // Back to the baseline before 1931 arrives: renders from the store.
        assert!(b.handle(&ControlEvent::YearSlider(0)).is_empty());
        assert_eq!(b.charts().stacked.draw_count(), 2);

        serve(&mut b, to_1931);
        assert_eq!(b.events().count(EventKind::StaleDiscarded), 1);
        assert_eq!(b.last_frame().unwrap().year, Year(1850));
        assert_eq!(b.charts().stacked.draw_count(), 2);
        assert!(b.store().is_resident(Year(1931)));

        // The stored year is reused without another load.
        assert!(b.handle(&ControlEvent::YearSlider(1)).is_empty());
        assert_eq!(b.last_frame().unwrap().year, Year(1931));
    }

    #[test]
    fn superseded_year_cannot_overwrite_a_newer_selection() {
        let mut b = started();
        let to_1931 = b.handle(&ControlEvent::YearSlider(1));
        let to_1973 = b.handle(&ControlEvent::YearSlider(2));
        // The 1973 pass asks for 1931 again under its own stamp.
        assert_eq!(to_1973.len(), 2);

        serve(&mut b, to_1973);
        assert_eq!(b.last_frame().unwrap().year, Year(1973));
        let draws = b.charts().ranked.draw_count();

        serve(&mut b, to_1931);
        assert_eq!(b.last_frame().unwrap().year, Year(1973));
        assert_eq!(b.charts().ranked.draw_count(), draws);
    }

    #[test]
    fn failed_load_keeps_the_previous_render() {
        let mut b = started();
        let before = b.last_frame().unwrap().clone();
        let loads = b.handle(&ControlEvent::YearSlider(1));
        b.complete(loads[0].id, Err(SourceError::NotFound(loads[0].path.clone())));

        assert_eq!(b.last_frame().unwrap(), &before);
        assert_eq!(b.events().count(EventKind::LoadFailed), 1);
        assert_eq!(b.store().state(Year(1931)), Some(ResidencyState::Failed));
        assert_eq!(b.in_flight(), 0);

        // No retry on its own; the next state change asks again.
        let retry = b.handle(&ControlEvent::EntityPicked(id("A")));
        assert_eq!(retry.len(), 1);
        assert_eq!(retry[0].year, Year(1931));
    }

    #[test]
    fn failed_reload_after_a_stale_arrival_still_renders() {
        let mut b = started();
        let first = b.handle(&ControlEvent::YearSlider(1));
        let second = b.handle(&ControlEvent::YearSlider(2));
        assert_eq!(second.len(), 2);
        let (reload_1931, load_1973) = (&second[0], &second[1]);

        b.complete(load_1973.id, file(1973));
        assert_eq!(b.last_frame().unwrap().year, Year(1850));
        // Stored for later, but 1931 is still loading for this selection.
        b.complete(first[0].id, file(1931));
        assert_eq!(b.last_frame().unwrap().year, Year(1850));

        b.complete(reload_1931.id, Err(SourceError::NotFound(reload_1931.path.clone())));
        assert_eq!(b.in_flight(), 0);
        let frame = b.last_frame().unwrap();
        assert_eq!(frame.year, Year(1973));
        assert_eq!(labels(&frame.rates), vec!["1850-1931", "1931-1973"]);
        assert_eq!(b.events().count(EventKind::Rendered), 2);
    }

    #[test]
    fn missing_intermediate_year_does_not_block_later_years() {
        let mut b = started();
        let loads = b.handle(&ControlEvent::YearSlider(2));
        let (load_1931, load_1973) = (&loads[0], &loads[1]);
        assert_eq!(load_1931.year, Year(1931));

        b.complete(load_1973.id, file(1973));
        b.complete(load_1931.id, Err(SourceError::NotFound(load_1931.path.clone())));
        assert_eq!(b.store().state(Year(1931)), Some(ResidencyState::Failed));

        let frame = b.last_frame().unwrap();
        assert_eq!(frame.year, Year(1973));
        // Measured against the nearest year that did load.
        let prev = frame.since_previous.unwrap();
        assert_close(prev.absolute, -16.0, 1e-12);
        assert_close(prev.per_year, -16.0 / 123.0, 1e-12);
        assert_eq!(labels(&frame.rates), vec!["1850-1973"]);
    }

    #[test]
    fn late_failure_does_not_redraw_a_current_frame() {
        let mut b = started();
        let loads = b.handle(&ControlEvent::YearSlider(1));
        b.handle(&ControlEvent::YearSlider(0));
        let draws = b.charts().stacked.draw_count();

        b.complete(loads[0].id, Err(SourceError::NotFound(loads[0].path.clone())));
        assert_eq!(b.charts().stacked.draw_count(), draws);
        assert_eq!(b.last_frame().unwrap().year, Year(1850));
    }

    #[test]
    fn unparseable_payload_is_a_failed_load() {
        let mut b = started();
        let loads = b.handle(&ControlEvent::YearSlider(1));
        b.complete(loads[0].id, Ok("{\"type\":\"Feature\"}".to_string()));
        assert_eq!(b.events().count(EventKind::ParseFailed), 1);
        assert_eq!(b.last_frame().unwrap().year, Year(1850));
    }

    #[test]
    fn duplicate_completions_are_ignored() {
        let mut b = binder(&[]);
        let loads = b.start();
        let req = loads[0].clone();
        b.complete(req.id, file(1850));
        b.complete(req.id, Ok(payload(&[("X", 1.0, 0.0)])));
        assert_close(b.last_frame().unwrap().total_km2, 25.0, 1e-12);
    }

    #[test]
    fn selecting_a_glacier_highlights_all_its_parts() {
        let mut b = started();
        assert!(b.handle(&ControlEvent::EntityPicked(id("A"))).is_empty());

        let frame = b.last_frame().unwrap();
        assert_eq!(frame.highlighted, vec![0, 1]);
        assert_eq!(frame.entity_km2, Some(10.0));
        assert_eq!(labels(&frame.ranked)[0], "A");
        assert_eq!(b.layer().selected_keys(), vec![0, 1]);
        let camera = b.layer().camera().unwrap();
        assert_close(camera.min[0], 8.0, 1e-12);
        assert_close(camera.max[0], 8.3, 1e-12);

        b.handle(&ControlEvent::ShowAll);
        assert!(b.layer().selected_keys().is_empty());
        assert_close(b.layer().camera().unwrap().max[0], 10.1, 1e-12);
    }

    #[test]
    fn absent_glacier_leaves_the_highlight_empty() {
        let mut b = started();
        let loads = b.handle(&ControlEvent::YearSlider(2));
        serve(&mut b, loads);
        // D disappeared after 1850.
        assert!(b.handle(&ControlEvent::EntityDropdown(Some(id("D")))).is_empty());

        let frame = b.last_frame().unwrap();
        assert_eq!(frame.year, Year(1973));
        assert!(frame.highlighted.is_empty());
        assert_eq!(frame.entity_km2, None);
        assert_eq!(frame.ranked.highlight, None);
        assert!(b.layer().selected_keys().is_empty());
    }

    #[test]
    fn tiled_years_point_the_map_at_tiles() {
        let mut b = binder(&[1931]);
        let loads = b.start();
        serve(&mut b, loads);
        assert!(matches!(b.layer().source(), Some(LayerSource::GeoJson { .. })));

        let loads = b.handle(&ControlEvent::YearPicked(Year(1931)));
        serve(&mut b, loads);
        match b.layer().source() {
            Some(LayerSource::Tiles { year, template }) => {
                assert_eq!(*year, Year(1931));
                assert_eq!(template, "tiles/1931/{z}/{x}/{y}.pbf");
            }
            other => panic!("expected tile source, got {other:?}"),
        }
        // Metrics still come from the GeoJSON.
        assert_close(b.last_frame().unwrap().total_km2, 18.0, 1e-12);
    }
}
