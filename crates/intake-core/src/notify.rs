//! Boundary to the notification collaborator.
//!
//! Completion of an intake fires exactly one dispatch of the collected
//! record to the scheduling team. Delivery is fire-and-forget: the outcome
//! is folded into the completion message, never retried, and never allowed
//! to abort the conversation.

use async_trait::async_trait;
use intake_types::PatientRecord;

/// Consumes the completed record; returns whether delivery succeeded.
///
/// Implementations must not panic or propagate errors — failures are
/// reported as `false`.
#[async_trait]
pub trait IntakeNotifier: Send + Sync {
    async fn dispatch(&self, record: &PatientRecord) -> bool;
}

/// A notifier that drops every record. Used in tests and when no relay is
/// configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullNotifier;

#[async_trait]
impl IntakeNotifier for NullNotifier {
    async fn dispatch(&self, _record: &PatientRecord) -> bool {
        false
    }
}
