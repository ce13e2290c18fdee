//! Alert evaluation, notification delivery, and DLQ replay.
//!
//! Distinct from [`crate::domain::alerting`], which holds the alert,
//! condition, notification, and DLQ job data types — this module is the
//! service layer that reads current values, fires alerts, delivers
//! notifications, and replays failed deliveries.

mod channel;
mod dlq_replay;
mod evaluator;
mod observed_value;

pub use channel::{DeliveryError, InAppChannel, NotificationChannelPort, SmtpEmailChannel};
pub use dlq_replay::DlqReplayer;
pub use evaluator::{AlertEvaluator, ObservedValueSource};
pub use observed_value::MetricsObservedValueSource;
