//! Metric declarations for the client.
//!
//! Counters go through the `metrics` facade and cost nothing until the
//! application installs a recorder.
//!
//! ```rust
//! use rn42_client::metrics::{metric_defs, describe_metrics};
//!
//! describe_metrics();
//! metrics::counter!(metric_defs::TX_BYTES.name).increment(3);
//! ```

use metrics::{describe_counter, Unit};

/// A counter declaration with its metadata.
#[derive(Debug, Clone)]
pub struct Metric {
    /// The metric name (e.g., "rn42.commands.sent").
    pub name: &'static str,
    /// Human-readable description of the metric.
    pub description: &'static str,
    /// The unit of measurement.
    pub unit: Unit,
    /// Expected label keys for this metric.
    pub labels: &'static [&'static str],
}

impl Metric {
    /// Creates a new counter metric with the given name.
    pub const fn counter(name: &'static str) -> Self {
        Self {
            name,
            description: "",
            unit: Unit::Count,
            labels: &[],
        }
    }

    /// Sets the description for the metric.
    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Sets the unit for the metric.
    pub const fn with_unit(mut self, unit: Unit) -> Self {
        self.unit = unit;
        self
    }

    /// Sets the expected label keys for the metric.
    pub const fn with_labels(mut self, labels: &'static [&'static str]) -> Self {
        self.labels = labels;
        self
    }

    /// Registers this metric's description with the metrics recorder.
    pub fn describe(&self) {
        describe_counter!(self.name, self.unit, self.description);
    }
}

/// All metric definitions for the client.
pub mod metric_defs {
    use super::{Metric, Unit};

    /// Commands written while in command mode, including `$$$` and `---`.
    ///
    /// Labels: command
    pub const COMMANDS_SENT: Metric = Metric::counter("rn42.commands.sent")
        .with_description("Commands written to the module")
        .with_labels(&["command"]);

    /// Commands the module acknowledged with the expected reply.
    ///
    /// Labels: command
    pub const COMMANDS_ACKED: Metric = Metric::counter("rn42.commands.acked")
        .with_description("Commands acknowledged by the module")
        .with_labels(&["command"]);

    /// Commands that got no reply or the wrong reply.
    ///
    /// Labels: command, reason
    pub const COMMANDS_FAILED: Metric = Metric::counter("rn42.commands.failed")
        .with_description("Commands not acknowledged by the module")
        .with_labels(&["command", "reason"]);

    /// HID raw reports written in data mode.
    ///
    /// Labels: kind (keyboard, mouse, gamepad)
    pub const HID_REPORTS: Metric = Metric::counter("rn42.hid.reports")
        .with_description("HID raw reports written")
        .with_labels(&["kind"]);

    /// Bytes written to the transport.
    pub const TX_BYTES: Metric = Metric::counter("rn42.tx.bytes")
        .with_description("Bytes written to the module")
        .with_unit(Unit::Bytes);

    /// Every metric declared above.
    pub const ALL: &[Metric] = &[COMMANDS_SENT, COMMANDS_ACKED, COMMANDS_FAILED, HID_REPORTS, TX_BYTES];
}

/// Register descriptions for every client metric.
pub fn describe_metrics() {
    for metric in metric_defs::ALL {
        metric.describe();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_names_are_namespaced() {
        for metric in metric_defs::ALL {
            assert!(metric.name.starts_with("rn42."), "{}", metric.name);
            assert!(!metric.description.is_empty());
        }
    }

    #[test]
    fn test_describe_without_recorder() {
        describe_metrics();
    }
}
