//! Metric definitions
//!
//! The library only records through the `metrics` facade. Hosts that want
//! the numbers install a recorder (e.g. a Prometheus exporter) themselves.

use metrics::{describe_counter, describe_histogram, Unit};

/// Register metric descriptions so exporters include HELP/TYPE lines
pub fn describe_metrics() {
    describe_counter!(
        "emailer_send_total",
        "Total number of send attempts by transport and outcome"
    );
    describe_histogram!(
        "emailer_send_duration_seconds",
        Unit::Seconds,
        "Time spent in send, including rendering and delivery"
    );
}
