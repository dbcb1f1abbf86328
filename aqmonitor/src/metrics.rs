use lazy_static::lazy_static;
use prometheus::{Counter, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();
    pub static ref PROVIDER_REQUESTS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "aqmonitor_provider_requests_total",
        "Total requests sent to the air-quality provider"
    ))
    .unwrap();
    pub static ref PROVIDER_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "aqmonitor_provider_failures_total",
        "Total provider requests that failed or returned a non-2xx status"
    ))
    .unwrap();
    pub static ref PROVIDER_LATENCY_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new(
            "aqmonitor_provider_latency_seconds",
            "Round-trip time of provider requests"
        )
        .buckets(vec![0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0])
    )
    .unwrap();
    pub static ref LOOKUPS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "aqmonitor_lookups_total",
        "Total on-demand nearest-city lookups"
    ))
    .unwrap();
    pub static ref SNAPSHOTS_TOTAL: Counter = Counter::with_opts(Opts::new(
        "aqmonitor_snapshots_total",
        "Total snapshots persisted"
    ))
    .unwrap();
    pub static ref SNAPSHOT_FAILURES_TOTAL: Counter = Counter::with_opts(Opts::new(
        "aqmonitor_snapshot_failures_total",
        "Total snapshot captures that failed"
    ))
    .unwrap();
}

pub fn init_metrics() {
    REGISTRY
        .register(Box::new(PROVIDER_REQUESTS_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(PROVIDER_FAILURES_TOTAL.clone()))
        .unwrap();
    REGISTRY
        .register(Box::new(PROVIDER_LATENCY_SECONDS.clone()))
        .unwrap();
    REGISTRY.register(Box::new(LOOKUPS_TOTAL.clone())).unwrap();
    REGISTRY.register(Box::new(SNAPSHOTS_TOTAL.clone())).unwrap();
    REGISTRY
        .register(Box::new(SNAPSHOT_FAILURES_TOTAL.clone()))
        .unwrap();
}

pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer).unwrap();
    String::from_utf8(buffer).unwrap()
}
