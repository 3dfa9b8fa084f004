/// Geometric bucket boundaries from `start` to `end` inclusive, `count`
/// buckets total. Used instead of hand-picked literals so every bucket
/// family documents its own range instead of a list of magic numbers.
pub fn exponential_range(start: f64, end: f64, count: usize) -> Vec<f64> {
    assert!(count >= 2, "need at least two buckets to span a range");
    let factor = (end / start).powf(1.0 / (count - 1) as f64);
    prometheus::exponential_buckets(start, factor, count).expect("valid bucket parameters")
}

/// General-purpose operation duration: 1ms - 10s, 12 buckets.
pub fn duration_buckets() -> Vec<f64> {
    exponential_range(0.001, 10.0, 12)
}

/// Outbound HTTP call latency: 5ms - 30s, 12 buckets.
pub fn api_latency_buckets() -> Vec<f64> {
    exponential_range(0.005, 30.0, 12)
}

/// Database query latency: 1ms - 5s, 10 buckets.
pub fn database_buckets() -> Vec<f64> {
    exponential_range(0.001, 5.0, 10)
}

/// Payload size in bytes: 1KB - 16MB, 10 buckets.
pub fn payload_size_buckets() -> Vec<f64> {
    exponential_range(1024.0, 16.0 * 1024.0 * 1024.0, 10)
}
