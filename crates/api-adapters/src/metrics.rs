//! Prometheus metrics for the HTTP surface.

use prometheus_client::encoding::text::encode;
use prometheus_client::encoding::EncodeLabelSet;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::registry::Registry;

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct RequestLabels {
    pub method: String,
    /// Matched route template, not the raw path, to keep cardinality bounded.
    pub route: String,
    pub status: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, EncodeLabelSet)]
pub struct DenialLabels {
    pub reason: String,
}

pub struct Metrics {
    registry: Registry,
    requests: Family<RequestLabels, Counter>,
    denials: Family<DenialLabels, Counter>,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::with_prefix("cbra");
        let requests = Family::<RequestLabels, Counter>::default();
        let denials = Family::<DenialLabels, Counter>::default();
        registry.register("http_requests", "HTTP requests by route and status", requests.clone());
        registry.register("access_denials", "Requests refused by the staff gate", denials.clone());
        Self { registry, requests, denials }
    }

    pub fn record_request(&self, method: &str, route: &str, status: u16) {
        self.requests
            .get_or_create(&RequestLabels {
                method: method.to_string(),
                route: route.to_string(),
                status: status.to_string(),
            })
            .inc();
    }

    pub fn record_denial(&self, reason: &str) {
        self.denials.get_or_create(&DenialLabels { reason: reason.to_string() }).inc();
    }

    /// OpenMetrics text exposition.
    pub fn render(&self) -> Result<String, std::fmt::Error> {
        let mut buffer = String::new();
        encode(&mut buffer, &self.registry)?;
        Ok(buffer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_exposition() {
        let metrics = Metrics::new();
        metrics.record_request("GET", "/api/cases", 200);
        metrics.record_request("GET", "/api/cases", 200);
        metrics.record_denial("not_staff");

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"cbra_http_requests_total{method="GET",route="/api/cases",status="200"} 2"#));
        assert!(text.contains(r#"cbra_access_denials_total{reason="not_staff"} 1"#));
        assert!(text.ends_with("# EOF\n"));
    }
}
