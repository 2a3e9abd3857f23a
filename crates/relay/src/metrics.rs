//! Metric names recorded by the relay.

/// Container for the relay's metric identifiers.
#[derive(Debug, Clone)]
pub struct Metrics;

impl Metrics {
    /// Identifier for the counter of outbound messages submitted.
    pub const MESSAGES_SUBMITTED_TOTAL: &'static str = "omni_relay_messages_submitted_total";
    /// Identifier for the counter of failed outbound submissions.
    pub const SUBMISSION_ERRORS_TOTAL: &'static str = "omni_relay_submission_errors_total";
    /// Identifier for the counter of delayed transactions triggered.
    pub const TRIGGERS_TOTAL: &'static str = "omni_relay_triggers_total";
    /// Identifier for the counter of aborted sweeps.
    pub const SWEEP_ERRORS_TOTAL: &'static str = "omni_relay_sweep_errors_total";
    /// Identifier for the counter of classified outcomes, labelled by kind.
    pub const OUTCOMES_TOTAL: &'static str = "omni_relay_outcomes_total";
    /// Identifier for the counter of outcome logs that failed to decode.
    pub const OUTCOME_DECODE_ERRORS_TOTAL: &'static str = "omni_relay_outcome_decode_errors_total";
    /// Identifier for the counter of occurrences forwarded to the handler.
    pub const OCCURRENCES_FORWARDED_TOTAL: &'static str = "omni_relay_occurrences_forwarded_total";
    /// Identifier for the counter of retracted occurrences.
    pub const OCCURRENCES_RETRACTED_TOTAL: &'static str = "omni_relay_occurrences_retracted_total";
    /// Identifier for the counter of occurrences that could not be resolved.
    pub const DISPATCH_ERRORS_TOTAL: &'static str = "omni_relay_dispatch_errors_total";
    /// Identifier for the counter of (re)established subscriptions.
    pub const SUBSCRIPTIONS_TOTAL: &'static str = "omni_relay_subscriptions_total";

    /// Describes all relay metrics and registers them at zero.
    pub fn init() {
        Self::describe();
        Self::zero();
    }

    fn describe() {
        metrics::describe_counter!(
            Self::MESSAGES_SUBMITTED_TOTAL,
            metrics::Unit::Count,
            "Outbound protocol messages submitted as transactions",
        );
        metrics::describe_counter!(
            Self::SUBMISSION_ERRORS_TOTAL,
            metrics::Unit::Count,
            "Outbound submissions that failed and stopped a drain",
        );
        metrics::describe_counter!(
            Self::TRIGGERS_TOTAL,
            metrics::Unit::Count,
            "Delayed transactions whose execution was triggered",
        );
        metrics::describe_counter!(
            Self::SWEEP_ERRORS_TOTAL,
            metrics::Unit::Count,
            "Trigger sweeps aborted by a poll or trigger failure",
        );
        metrics::describe_counter!(
            Self::OUTCOMES_TOTAL,
            metrics::Unit::Count,
            "Classified delayed-execution outcomes",
        );
        metrics::describe_counter!(
            Self::OUTCOME_DECODE_ERRORS_TOTAL,
            metrics::Unit::Count,
            "Outcome logs skipped because their data did not decode",
        );
        metrics::describe_counter!(
            Self::OCCURRENCES_FORWARDED_TOTAL,
            metrics::Unit::Count,
            "TransactionSent occurrences forwarded to the message handler",
        );
        metrics::describe_counter!(
            Self::OCCURRENCES_RETRACTED_TOTAL,
            metrics::Unit::Count,
            "Forwarded occurrences later retracted by a reorg",
        );
        metrics::describe_counter!(
            Self::DISPATCH_ERRORS_TOTAL,
            metrics::Unit::Count,
            "Occurrences that could not be resolved into a message",
        );
        metrics::describe_counter!(
            Self::SUBSCRIPTIONS_TOTAL,
            metrics::Unit::Count,
            "Log subscriptions established, including reconnects",
        );
    }

    fn zero() {
        metrics::counter!(Self::MESSAGES_SUBMITTED_TOTAL).increment(0);
        metrics::counter!(Self::SUBMISSION_ERRORS_TOTAL).increment(0);
        metrics::counter!(Self::TRIGGERS_TOTAL).increment(0);
        metrics::counter!(Self::SWEEP_ERRORS_TOTAL).increment(0);
        metrics::counter!(Self::OUTCOMES_TOTAL).increment(0);
        metrics::counter!(Self::OUTCOME_DECODE_ERRORS_TOTAL).increment(0);
        metrics::counter!(Self::OCCURRENCES_FORWARDED_TOTAL).increment(0);
        metrics::counter!(Self::OCCURRENCES_RETRACTED_TOTAL).increment(0);
        metrics::counter!(Self::DISPATCH_ERRORS_TOTAL).increment(0);
        metrics::counter!(Self::SUBSCRIPTIONS_TOTAL).increment(0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metrics::{
        Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit,
    };
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct RegistrationRecorder {
        described: Mutex<Vec<String>>,
        registered: Mutex<Vec<String>>,
    }

    impl Recorder for RegistrationRecorder {
        fn describe_counter(&self, key: KeyName, _unit: Option<Unit>, _description: SharedString) {
            self.described.lock().unwrap().push(key.as_str().to_string());
        }

        fn describe_gauge(&self, _key: KeyName, _unit: Option<Unit>, _description: SharedString) {}

        fn describe_histogram(
            &self,
            _key: KeyName,
            _unit: Option<Unit>,
            _description: SharedString,
        ) {
        }

        fn register_counter(&self, key: &Key, _metadata: &Metadata<'_>) -> Counter {
            self.registered.lock().unwrap().push(key.name().to_string());
            Counter::noop()
        }

        fn register_gauge(&self, _key: &Key, _metadata: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _key: &Key, _metadata: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    #[test]
    fn test_init_describes_and_zeroes_counters() {
        let recorder = RegistrationRecorder::default();
        metrics::with_local_recorder(&recorder, Metrics::init);

        let described = recorder.described.lock().unwrap();
        let registered = recorder.registered.lock().unwrap();
        assert_eq!(described.len(), 10);
        assert_eq!(*described, *registered);
        assert!(registered.contains(&Metrics::SUBSCRIPTIONS_TOTAL.to_string()));
    }
}
