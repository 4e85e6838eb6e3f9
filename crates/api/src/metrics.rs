use crate::errors::ApiError;
use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};
use std::time::Duration;

pub struct AnalyzeMetrics {
    duration: Histogram<f64>,
    requests: Counter<u64>,
    detections: Counter<u64>,
}

impl AnalyzeMetrics {
    pub fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0, 10.0,
        ];

        let duration = meter
            .f64_histogram("analyze_duration_seconds")
            .with_description("Time to answer an analyze request (staging + inference + rendering)")
            .with_unit("s")
            .with_boundaries(latency_buckets.to_vec())
            .build();
        let requests = meter
            .u64_counter("analyze_requests_total")
            .with_description("Analyze requests by outcome")
            .build();
        let detections = meter
            .u64_counter("detections_total")
            .with_description("Total detections returned")
            .build();

        Self {
            duration,
            requests,
            detections,
        }
    }

    pub fn record<T>(&self, elapsed: Duration, result: &Result<T, ApiError>, detections: usize) {
        let outcome = match result {
            Ok(_) => "success",
            Err(e) if e.is_client_error() => "client_error",
            Err(_) => "server_error",
        };
        let attributes = [KeyValue::new("outcome", outcome)];

        self.duration.record(elapsed.as_secs_f64(), &attributes);
        self.requests.add(1, &attributes);
        self.detections.add(detections as u64, &[]);
    }
}
