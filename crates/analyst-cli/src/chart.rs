//! Text line chart for the terminal

use analyst_market::PricePoint;

const BARS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

/// One bar per value, scaled between the series minimum and maximum
pub fn sparkline(values: &[f64]) -> String {
    let (min, max) = bounds(values);
    let span = max - min;

    values
        .iter()
        .map(|v| {
            if span <= f64::EPSILON {
                BARS[BARS.len() / 2]
            } else {
                let level = ((v - min) / span * (BARS.len() - 1) as f64).round() as usize;
                BARS[level.min(BARS.len() - 1)]
            }
        })
        .collect()
}

fn bounds(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)))
}

/// Sparkline plus a line with the range and the dates covered
pub fn price_chart(series: &[PricePoint]) -> String {
    let (Some(first), Some(last)) = (series.first(), series.last()) else {
        return "(no data)".to_string();
    };

    let closes: Vec<f64> = series.iter().map(|p| p.close).collect();
    let (min, max) = bounds(&closes);

    format!(
        "{}\nlow {min:.2}  high {max:.2}  last {:.2}  ({} to {})",
        sparkline(&closes),
        last.close,
        first.date.format("%Y-%m-%d"),
        last.date.format("%Y-%m-%d"),
    )
}
