use lazy_static::lazy_static;
use prometheus::{Counter, Gauge, Histogram, register_counter, register_gauge, register_histogram};


lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("view_counter_requests_total", "Total number of counter requests").unwrap();
    pub static ref INCREMENTS_TOTAL: Counter =
        register_counter!("view_counter_increments_total", "Total recorded views").unwrap();
    pub static ref RATE_LIMITED_TOTAL: Counter =
        register_counter!("view_counter_rate_limited_total", "Increments denied by the rate limiter").unwrap();
    pub static ref NOT_FOUND_TOTAL: Counter =
        register_counter!("view_counter_identity_not_found_total", "Requests for unknown identities").unwrap();
    pub static ref REQUEST_LATENCY: Histogram = register_histogram!(
        "view_counter_request_latency_seconds",
        "Request latency in seconds"
    )
    .unwrap();
    pub static ref RATE_LIMIT_SOURCES: Gauge =
        register_gauge!("view_counter_rate_limit_sources", "Source addresses tracked by the rate limiter").unwrap();
}
