use foundation::Year;
use serde::Serialize;

/// Difference between two area measurements.
///
/// All fields are unrounded; see `crate::display` for presentation.
#[derive(Debug, Copy, Clone, PartialEq, Default, Serialize)]
pub struct Change {
    pub absolute: f64,
    /// Relative change in percent. 0 when the previous value is 0.
    pub percent: f64,
    /// Absolute change per year. 0 when the years coincide.
    pub per_year: f64,
}

pub fn compute_change(current: f64, previous: f64, year_gap: i32) -> Change {
    let absolute = current - previous;
    let percent = if previous == 0.0 {
        0.0
    } else {
        absolute / previous * 100.0
    };
    let per_year = if year_gap == 0 {
        0.0
    } else {
        absolute / f64::from(year_gap)
    };
    Change {
        absolute: finite_or_zero(absolute),
        percent: finite_or_zero(percent),
        per_year: finite_or_zero(per_year),
    }
}

fn finite_or_zero(v: f64) -> f64 {
    if v.is_finite() { v } else { 0.0 }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct Interval {
    pub from: Year,
    pub to: Year,
    pub change: Change,
}

/// Areas at successive survey years.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RetreatSeries {
    points: Vec<(Year, f64)>,
}

impl RetreatSeries {
    /// Points are sorted by year; later duplicates of a year replace earlier ones.
    pub fn new(points: impl IntoIterator<Item = (Year, f64)>) -> Self {
        let mut points: Vec<(Year, f64)> = points.into_iter().collect();
        points.sort_by_key(|(y, _)| *y);
        points.reverse();
        points.dedup_by_key(|(y, _)| *y);
        points.reverse();
        Self { points }
    }

    pub fn points(&self) -> &[(Year, f64)] {
        &self.points
    }

    pub fn intervals(&self) -> Vec<Interval> {
        self.points
            .windows(2)
            .map(|w| {
                let (from, prev) = w[0];
                let (to, cur) = w[1];
                Interval {
                    from,
                    to,
                    change: compute_change(cur, prev, to.years_since(from)),
                }
            })
            .collect()
    }

    /// Change from the first point to the last; `None` with fewer than two points.
    pub fn since_first(&self) -> Option<Change> {
        if self.points.len() < 2 {
            return None;
        }
        let (first_year, first) = *self.points.first()?;
        let (last_year, last) = *self.points.last()?;
        Some(compute_change(last, first, last_year.years_since(first_year)))
    }
}
