//! Presentation rounding.
//!
//! Aggregation and change computation always work on unrounded values; the
//! helpers here are the only place numbers are cut to display precision.

pub const DISPLAY_DECIMALS: u32 = 2;

pub fn round_to(value: f64, decimals: u32) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round() / scale;
    // Avoid printing "-0.00".
    if rounded == 0.0 { 0.0 } else { rounded }
}

pub fn round_display(value: f64) -> f64 {
    round_to(value, DISPLAY_DECIMALS)
}

pub fn format_km2(value: f64) -> String {
    format!("{:.2} km²", round_display(value))
}

pub fn format_percent(value: f64) -> String {
    format!("{:+.2}%", round_display(value))
}

pub fn format_rate(value: f64) -> String {
    format!("{:.2} km²/yr", round_display(value))
}
