/// Abbreviates a weight magnitude for labels: 950, 1.2k, 3.4M, 5.6B.
pub fn format_weight(value: f64) -> String {
    const K: f64 = 1_000.0;
    const M: f64 = 1_000_000.0;
    const B: f64 = 1_000_000_000.0;

    let magnitude = value.abs();
    if magnitude >= B {
        format!("{:.1}B", value / B)
    } else if magnitude >= M {
        format!("{:.1}M", value / M)
    } else if magnitude >= K {
        format!("{:.1}k", value / K)
    } else if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value:.1}")
    }
}

/// Summary label stamped on a synthetic aggregate record.
pub fn aggregate_label(count: usize, total: f64) -> String {
    format!("Other ({} items, {})", count, format_weight(total))
}
