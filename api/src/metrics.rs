use prometheus::{CounterVec, Encoder, Histogram, HistogramOpts, Opts, Registry, TextEncoder};


// Request statistics exposed on /metrics.
#[derive(Clone)]
pub struct ApiMetrics {
    registry: Registry,
    pub requests: CounterVec,
    pub failures: CounterVec,
    pub processing_ms: Histogram,
}

impl ApiMetrics {

    pub fn new() -> Result<ApiMetrics, prometheus::Error> {
        let registry = Registry::new();

        let requests_opts = Opts::new("tenant_cost_api_requests", "number of requests");
        let requests = CounterVec::new(requests_opts, &["kind"])?;
        registry.register(Box::new(requests.clone()))?;

        let failures_opts = Opts::new("tenant_cost_api_failures", "number of failed requests");
        let failures = CounterVec::new(failures_opts, &["kind"])?;
        registry.register(Box::new(failures.clone()))?;

        let processing_opts = HistogramOpts::new(
            "tenant_cost_api_processing_ms", "processing time milliseconds")
            .buckets(vec![10.0, 50.0, 100.0, 250.0, 500.0, 800.0, 1200.0, 2000.0]);
        let processing_ms = Histogram::with_opts(processing_opts)?;
        registry.register(Box::new(processing_ms.clone()))?;

        Ok(ApiMetrics { registry, requests, failures, processing_ms })
    }

    // Text exposition of every registered metric.
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let mut buffer = vec![];
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
