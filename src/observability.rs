use biometrics::{Collector, Counter, Moments};

pub(crate) static CLIENT_REQUESTS: Counter = Counter::new("askchat.client.requests");
pub(crate) static CLIENT_REQUEST_ERRORS: Counter = Counter::new("askchat.client.request_errors");
pub(crate) static CLIENT_REQUEST_DURATION: Moments =
    Moments::new("askchat.client.request_duration_seconds");

pub(crate) static CONVERSATION_SUBMISSIONS: Counter =
    Counter::new("askchat.conversation.submissions");
pub(crate) static CONVERSATION_REJECTED: Counter = Counter::new("askchat.conversation.rejected");
pub(crate) static CONVERSATION_FAILURES: Counter = Counter::new("askchat.conversation.failures");
pub(crate) static CONVERSATION_TURN_DURATION: Moments =
    Moments::new("askchat.conversation.turn_duration_seconds");

/// Register this crate's biometrics with the provided collector.
pub fn register_biometrics(collector: Collector) {
    collector.register_counter(&CLIENT_REQUESTS);
    collector.register_counter(&CLIENT_REQUEST_ERRORS);
    collector.register_moments(&CLIENT_REQUEST_DURATION);

    collector.register_counter(&CONVERSATION_SUBMISSIONS);
    collector.register_counter(&CONVERSATION_REJECTED);
    collector.register_counter(&CONVERSATION_FAILURES);
    collector.register_moments(&CONVERSATION_TURN_DURATION);
}
