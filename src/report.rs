/// Aggregation and rendering of load test results.
use crate::error::AppError;
use crate::simulator::session::{Endpoint, RequestSample};
use serde::Serialize;

const ENDPOINTS: [Endpoint; 4] = [
    Endpoint::Auth,
    Endpoint::Info,
    Endpoint::SendCoin,
    Endpoint::BuyItem,
];

/// Latency statistics over successful requests.
#[derive(Debug, Clone, Serialize)]
pub struct LatencyStats {
    pub average_ms: f64,
    pub p50_ms: u64,
    pub p95_ms: u64,
}

impl LatencyStats {
    fn from_latencies(mut latencies: Vec<u64>) -> Self {
        if latencies.is_empty() {
            return Self {
                average_ms: 0.0,
                p50_ms: 0,
                p95_ms: 0,
            };
        }

        latencies.sort_unstable();
        let average_ms = latencies.iter().sum::<u64>() as f64 / latencies.len() as f64;
        let p50_ms = latencies[latencies.len() / 2];
        let p95_index = ((latencies.len() as f64) * 0.95).ceil() as usize;
        let p95_ms = latencies[p95_index.clamp(0, latencies.len().saturating_sub(1))];

        Self {
            average_ms,
            p50_ms,
            p95_ms,
        }
    }
}

/// Per-endpoint slice of the summary.
#[derive(Debug, Clone, Serialize)]
pub struct EndpointSummary {
    pub endpoint: String,
    pub requests: usize,
    pub successful: usize,
    pub failed: usize,
    pub latency: LatencyStats,
}

/// Aggregated results of a load test run.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_requests: usize,
    pub successful: usize,
    pub failed: usize,
    pub success_rate: f64,
    pub latency: LatencyStats,
    pub endpoints: Vec<EndpointSummary>,
    pub last_error: Option<String>,
}

impl Summary {
    pub fn from_samples(samples: &[RequestSample]) -> Self {
        let total_requests = samples.len();
        let successful = samples.iter().filter(|s| s.success).count();
        let failed = total_requests.saturating_sub(successful);
        let success_rate = if total_requests > 0 {
            (successful as f64 / total_requests as f64) * 100.0
        } else {
            0.0
        };

        let latency = LatencyStats::from_latencies(
            samples
                .iter()
                .filter(|s| s.success)
                .map(|s| s.latency_ms)
                .collect(),
        );

        let endpoints = ENDPOINTS
            .iter()
            .filter_map(|endpoint| {
                let subset: Vec<&RequestSample> =
                    samples.iter().filter(|s| s.endpoint == *endpoint).collect();
                if subset.is_empty() {
                    return None;
                }
                let successful = subset.iter().filter(|s| s.success).count();
                Some(EndpointSummary {
                    endpoint: endpoint.as_str().to_string(),
                    requests: subset.len(),
                    successful,
                    failed: subset.len() - successful,
                    latency: LatencyStats::from_latencies(
                        subset
                            .iter()
                            .filter(|s| s.success)
                            .map(|s| s.latency_ms)
                            .collect(),
                    ),
                })
            })
            .collect();

        let last_error = samples
            .iter()
            .rev()
            .find_map(|s| if s.success { None } else { s.error.clone() });

        Self {
            total_requests,
            successful,
            failed,
            success_rate,
            latency,
            endpoints,
            last_error,
        }
    }

    /// Human-readable text report.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str("=== Load Test Results ===\n");
        out.push_str(&format!("Total Requests: {}\n", self.total_requests));
        out.push_str(&format!(
            "Successful: {} ({:.1}%)\n",
            self.successful, self.success_rate
        ));
        out.push_str(&format!(
            "Failed: {} ({:.1}%)\n",
            self.failed,
            100.0 - self.success_rate
        ));
        out.push_str("\nLatency (ms):\n");
        out.push_str(&format!("  Average: {:.2}\n", self.latency.average_ms));
        out.push_str(&format!("  p50: {}\n", self.latency.p50_ms));
        out.push_str(&format!("  p95: {}\n", self.latency.p95_ms));

        if !self.endpoints.is_empty() {
            out.push_str("\nPer endpoint:\n");
            for ep in &self.endpoints {
                out.push_str(&format!(
                    "  {}: {} requests, {} ok, {} failed, avg {:.2}ms\n",
                    ep.endpoint, ep.requests, ep.successful, ep.failed, ep.latency.average_ms
                ));
            }
        }

        if let Some(ref err) = self.last_error {
            out.push_str(&format!("\nLast error: {}\n", err));
        }

        out
    }

    /// JSON report for scripting.
    pub fn render_json(&self) -> Result<String, AppError> {
        serde_json::to_string_pretty(self).map_err(AppError::Json)
    }

    /// CSV report, one row per endpoint plus a total row.
    pub fn render_csv(&self) -> String {
        let mut out = String::from(
            "endpoint,requests,successful,failed,avg_latency_ms,p50_latency_ms,p95_latency_ms\n",
        );
        out.push_str(&format!(
            "total,{},{},{},{:.2},{},{}\n",
            self.total_requests,
            self.successful,
            self.failed,
            self.latency.average_ms,
            self.latency.p50_ms,
            self.latency.p95_ms
        ));
        for ep in &self.endpoints {
            out.push_str(&format!(
                "{},{},{},{},{:.2},{},{}\n",
                ep.endpoint,
                ep.requests,
                ep.successful,
                ep.failed,
                ep.latency.average_ms,
                ep.latency.p50_ms,
                ep.latency.p95_ms
            ));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(endpoint: Endpoint, success: bool, latency_ms: u64) -> RequestSample {
        RequestSample {
            endpoint,
            success,
            status: Some(if success { 200 } else { 500 }),
            latency_ms,
            error: if success {
                None
            } else {
                Some("server exploded".to_string())
            },
        }
    }

    #[test]
    fn empty_samples_produce_a_zeroed_summary() {
        let summary = Summary::from_samples(&[]);
        assert_eq!(summary.total_requests, 0);
        assert_eq!(summary.successful, 0);
        assert_eq!(summary.success_rate, 0.0);
        assert!(summary.endpoints.is_empty());
        assert!(summary.last_error.is_none());
    }

    #[test]
    fn summary_counts_and_groups_by_endpoint() {
        let samples = vec![
            sample(Endpoint::Auth, true, 10),
            sample(Endpoint::Info, true, 20),
            sample(Endpoint::Info, true, 30),
            sample(Endpoint::SendCoin, false, 0),
        ];

        let summary = Summary::from_samples(&samples);

        assert_eq!(summary.total_requests, 4);
        assert_eq!(summary.successful, 3);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.success_rate, 75.0);
        assert_eq!(summary.last_error.as_deref(), Some("server exploded"));

        assert_eq!(summary.endpoints.len(), 3);
        let info = summary
            .endpoints
            .iter()
            .find(|e| e.endpoint == "info")
            .expect("info endpoint present");
        assert_eq!(info.requests, 2);
        assert_eq!(info.successful, 2);
        assert_eq!(info.latency.average_ms, 25.0);
    }

    #[test]
    fn latency_percentiles_over_successful_samples_only() {
        let mut samples: Vec<RequestSample> = (1..=100)
            .map(|ms| sample(Endpoint::Info, true, ms))
            .collect();
        samples.push(sample(Endpoint::Info, false, 100_000));

        let summary = Summary::from_samples(&samples);

        assert_eq!(summary.latency.p50_ms, 51);
        assert_eq!(summary.latency.p95_ms, 96);
        assert_eq!(summary.latency.average_ms, 50.5);
    }

    #[test]
    fn csv_has_a_total_row_and_endpoint_rows() {
        let samples = vec![
            sample(Endpoint::Auth, true, 10),
            sample(Endpoint::BuyItem, true, 15),
        ];
        let csv = Summary::from_samples(&samples).render_csv();

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("endpoint,requests"));
        assert!(lines[1].starts_with("total,2,2,0"));
        assert!(lines.iter().any(|l| l.starts_with("auth,1,1,0")));
        assert!(lines.iter().any(|l| l.starts_with("buy,1,1,0")));
    }

    #[test]
    fn json_serializes_the_full_summary() {
        let samples = vec![sample(Endpoint::Auth, true, 10)];
        let json = Summary::from_samples(&samples)
            .render_json()
            .expect("summary should serialize");

        let value: serde_json::Value = serde_json::from_str(&json).expect("valid json");
        assert_eq!(value["total_requests"], 1);
        assert_eq!(value["endpoints"][0]["endpoint"], "auth");
        assert_eq!(value["latency"]["p50_ms"], 10);
    }
}
