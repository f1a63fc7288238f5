use compute::{EntityAreas, RetreatSeries};
use foundation::EntityId;
use serde::Serialize;

/// One bar or line point.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartDatum {
    pub label: String,
    pub value: f64,
}

impl ChartDatum {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    StackedProportion,
    RankedBar,
    RetreatRate,
}

/// Everything a chart panel needs to redraw itself.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartFrame {
    pub kind: ChartKind,
    pub data: Vec<ChartDatum>,
    /// Value mapped to the full axis length.
    pub scale_max: f64,
    /// Label drawn with the highlight colour, if any.
    pub highlight: Option<String>,
}

/// Declarative drawing surface for one chart.
pub trait ChartPanel {
    fn draw(&mut self, frame: &ChartFrame);
}

/// Keeps every frame it was asked to draw.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecordingPanel {
    frames: Vec<ChartFrame>,
}

impl RecordingPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last(&self) -> Option<&ChartFrame> {
        self.frames.last()
    }

    pub fn draw_count(&self) -> usize {
        self.frames.len()
    }
}

impl ChartPanel for RecordingPanel {
    fn draw(&mut self, frame: &ChartFrame) {
        self.frames.push(frame.clone());
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum RankKey {
    /// Glacier id, ascending.
    Identifier,
    /// Area, largest first; equal areas fall back to id order.
    #[default]
    AreaDescending,
}

pub const REMAINING_LABEL: &str = "remaining";
pub const LOST_LABEL: &str = "lost";

/// Remaining vs lost share of the baseline area, in percent.
pub fn stacked_proportion(current_total: f64, baseline_total: f64) -> ChartFrame {
    let (remaining, lost) = if baseline_total > 0.0 {
        let remaining = (current_total / baseline_total * 100.0).clamp(0.0, 100.0);
        (remaining, 100.0 - remaining)
    } else {
        (0.0, 0.0)
    };
    ChartFrame {
        kind: ChartKind::StackedProportion,
        data: vec![
            ChartDatum::new(REMAINING_LABEL, remaining),
            ChartDatum::new(LOST_LABEL, lost),
        ],
        scale_max: 100.0,
        highlight: None,
    }
}

/// Ranked glacier areas.
///
/// The selected glacier, when it has area this year, is always the first bar.
/// The remaining glaciers are ordered by `key` and cut to `limit` bars.
/// `scale_max` is passed in so the axis can stay fixed across years.
pub fn ranked_bars(
    areas: &EntityAreas,
    selected: Option<&EntityId>,
    key: RankKey,
    limit: usize,
    scale_max: f64,
) -> ChartFrame {
    let pinned = selected.and_then(|id| areas.get_key_value(id));

    let mut rest: Vec<(&EntityId, f64)> = areas
        .iter()
        .filter(|(id, _)| pinned.is_none_or(|(p, _)| p != *id))
        .map(|(id, a)| (id, *a))
        .collect();
    match key {
        // BTreeMap iteration is already in id order.
        RankKey::Identifier => {}
        RankKey::AreaDescending => rest.sort_by(|(ia, a), (ib, b)| b.total_cmp(a).then_with(|| ia.cmp(ib))),
    }
    rest.truncate(limit);

    let mut data = Vec::with_capacity(rest.len() + 1);
    if let Some((id, area)) = pinned {
        data.push(ChartDatum::new(id.as_str(), *area));
    }
    data.extend(rest.into_iter().map(|(id, a)| ChartDatum::new(id.as_str(), a)));

    ChartFrame {
        kind: ChartKind::RankedBar,
        data,
        scale_max,
        highlight: pinned.map(|(id, _)| id.to_string()),
    }
}

/// Area lost per year for each interval of the series (km²/yr, negative for retreat).
pub fn retreat_rates(series: &RetreatSeries) -> ChartFrame {
    let data: Vec<ChartDatum> = series
        .intervals()
        .into_iter()
        .map(|iv| ChartDatum::new(format!("{}-{}", iv.from, iv.to), iv.change.per_year))
        .collect();
    let scale_max = data.iter().map(|d| d.value.abs()).fold(0.0, f64::max);
    ChartFrame {
        kind: ChartKind::RetreatRate,
        data,
        scale_max,
        highlight: None,
    }
}

#[cfg(test)]
mod tests {
    use super::{ChartDatum, ChartKind, ChartPanel, RankKey, RecordingPanel, ranked_bars, retreat_rates, stacked_proportion};
    use compute::{EntityAreas, RetreatSeries};
    use foundation::{EntityId, Year};
    use pretty_assertions::assert_eq;

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    fn areas(pairs: &[(&str, f64)]) -> EntityAreas {
        pairs.iter().map(|(k, v)| (id(k), *v)).collect()
    }

    fn labels(frame: &super::ChartFrame) -> Vec<&str> {
        frame.data.iter().map(|d| d.label.as_str()).collect()
    }

    #[test]
    fn selected_glacier_is_pinned_before_truncation() {
        let a = areas(&[("A", 10.0), ("B", 5.0), ("C", 7.0), ("D", 3.0)]);
        let frame = ranked_bars(&a, Some(&id("B")), RankKey::AreaDescending, 2, 10.0);
        assert_eq!(labels(&frame), vec!["B", "A", "C"]);
        assert_eq!(frame.highlight.as_deref(), Some("B"));
        assert_eq!(frame.scale_max, 10.0);
    }

    #[test]
    fn identifier_order_and_no_selection() {
        let a = areas(&[("C", 7.0), ("A", 10.0), ("B", 5.0)]);
        let frame = ranked_bars(&a, None, RankKey::Identifier, 10, 12.0);
        assert_eq!(labels(&frame), vec!["A", "B", "C"]);
        assert_eq!(frame.highlight, None);
    }

    #[test]
    fn absent_selection_is_not_pinned() {
        let a = areas(&[("A", 10.0), ("C", 7.0)]);
        let frame = ranked_bars(&a, Some(&id("Z")), RankKey::AreaDescending, 1, 10.0);
        assert_eq!(labels(&frame), vec!["A"]);
        assert_eq!(frame.highlight, None);
    }

    #[test]
    fn equal_areas_fall_back_to_id_order() {
        let a = areas(&[("B", 4.0), ("A", 4.0), ("C", 9.0)]);
        let frame = ranked_bars(&a, None, RankKey::AreaDescending, 3, 9.0);
        assert_eq!(labels(&frame), vec!["C", "A", "B"]);
    }

    #[test]
    fn stacked_shares_of_baseline() {
        let frame = stacked_proportion(90.0, 100.0);
        assert_eq!(frame.kind, ChartKind::StackedProportion);
        assert_eq!(
            frame.data,
            vec![ChartDatum::new("remaining", 90.0), ChartDatum::new("lost", 10.0)]
        );
        let empty = stacked_proportion(5.0, 0.0);
        assert_eq!(empty.data[0].value, 0.0);
        assert_eq!(empty.data[1].value, 0.0);
    }

    #[test]
    fn rates_per_interval() {
        let s = RetreatSeries::new([(Year(1850), 100.0), (Year(1931), 90.0), (Year(1973), 69.0)]);
        let frame = retreat_rates(&s);
        assert_eq!(labels(&frame), vec!["1850-1931", "1931-1973"]);
        assert!((frame.data[1].value + 0.5).abs() < 1e-12);
        assert!((frame.scale_max - 0.5).abs() < 1e-12);
        assert!(retreat_rates(&RetreatSeries::new([(Year(1850), 1.0)])).data.is_empty());
    }

    #[test]
    fn recording_panel_keeps_last_frame() {
        let mut panel = RecordingPanel::new();
        panel.draw(&stacked_proportion(1.0, 2.0));
        panel.draw(&stacked_proportion(2.0, 2.0));
        assert_eq!(panel.draw_count(), 2);
        assert_eq!(panel.last().unwrap().data[0].value, 100.0);
    }

    #[test]
    fn frames_serialize_for_the_chart_library() {
        let json = serde_json::to_value(stacked_proportion(1.0, 4.0)).unwrap();
        assert_eq!(json["kind"], "stacked_proportion");
        assert_eq!(json["data"][0]["label"], "remaining");
        assert_eq!(json["data"][0]["value"], 25.0);
    }
}
