//! Alert rules, their conditions, delivered notifications, and the DLQ.

mod alert;
mod condition;
mod dlq;
mod notification;

pub use alert::Alert;
pub use condition::{ComparisonOperator, Condition, ConditionError};
pub use dlq::{DlqJob, DlqStatus};
pub use notification::{DeliveryChannel, Notification};
