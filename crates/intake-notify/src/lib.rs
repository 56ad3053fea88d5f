//! Notification relay for completed intakes.
//!
//! When an intake completes, the collected record is handed to the
//! scheduling team exactly once. Delivery goes over HTTP as a JSON message
//! to a configured relay endpoint (the relay owns the actual mail fan-out).
//! Dispatch is fire-and-forget: any failure is logged, reported as `false`,
//! and never retried or allowed to interrupt the conversation.

use async_trait::async_trait;
use intake_core::IntakeNotifier;
use intake_types::PatientRecord;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Outbound request timeout. A slow relay must not stall a live call.
const DISPATCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors from the notification relay. These never escape [`NotifyService`];
/// `dispatch` converts them to `false`.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification relay is not configured")]
    Disabled,
    #[error("relay request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("relay rejected the notification: HTTP {0}")]
    Rejected(u16),
}

/// Relay configuration: where to post and who should receive the intake.
#[derive(Clone, Default, serde::Deserialize)]
pub struct NotifyConfig {
    /// Relay endpoint URL. Empty disables dispatch.
    #[serde(default)]
    pub endpoint: String,
    /// Recipients the relay should deliver to.
    #[serde(default)]
    pub recipients: Vec<String>,
    /// Bearer token presented to the relay, if it requires one.
    #[serde(default)]
    pub auth_token: String,
}

impl fmt::Debug for NotifyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotifyConfig")
            .field("endpoint", &self.endpoint)
            .field("recipients", &self.recipients)
            .field("auth_token", &"[REDACTED]")
            .finish()
    }
}

/// The message posted to the relay.
#[derive(Debug, Serialize)]
struct NotifyMessage<'a> {
    subject: String,
    body: String,
    recipients: &'a [String],
}

/// HTTP implementation of the notification collaborator.
#[derive(Debug)]
pub struct NotifyService {
    config: NotifyConfig,
    client: reqwest::Client,
}

impl NotifyService {
    pub fn new(config: NotifyConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Whether a relay endpoint is configured at all.
    pub fn is_enabled(&self) -> bool {
        !self.config.endpoint.is_empty()
    }

    async fn send(&self, record: &PatientRecord) -> Result<(), NotifyError> {
        if !self.is_enabled() {
            return Err(NotifyError::Disabled);
        }

        let message = NotifyMessage {
            subject: format!(
                "New Patient Intake - {}",
                record.name.as_deref().unwrap_or("Unknown")
            ),
            body: render_summary(record),
            recipients: &self.config.recipients,
        };

        let mut request = self
            .client
            .post(&self.config.endpoint)
            .timeout(DISPATCH_TIMEOUT)
            .json(&message);
        if !self.config.auth_token.is_empty() {
            request = request.bearer_auth(&self.config.auth_token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl IntakeNotifier for NotifyService {
    async fn dispatch(&self, record: &PatientRecord) -> bool {
        match self.send(record).await {
            Ok(()) => {
                tracing::info!("patient intake dispatched to scheduling team");
                true
            }
            Err(NotifyError::Disabled) => {
                tracing::warn!("notification relay not configured, intake not dispatched");
                false
            }
            Err(e) => {
                tracing::warn!("failed to dispatch intake notification: {e}");
                false
            }
        }
    }
}

/// Renders the record as the plain-text summary delivered to the scheduling
/// team. Unfilled fields read as "Not provided".
pub fn render_summary(record: &PatientRecord) -> String {
    fn field(value: &Option<String>) -> &str {
        value.as_deref().unwrap_or("Not provided")
    }

    let has_referral = record
        .has_referral
        .map(|b| if b { "Yes" } else { "No" })
        .unwrap_or("Not provided");

    format!(
        "New Patient Intake Information\n\
         =============================\n\
         \n\
         Patient Details:\n\
         - Name: {name}\n\
         - Date of Birth: {dob}\n\
         - Phone: {phone}\n\
         - Email: {email}\n\
         \n\
         Insurance Information:\n\
         - Payer: {payer}\n\
         - ID: {insurance_id}\n\
         \n\
         Referral Information:\n\
         - Has Referral: {has_referral}\n\
         - Referring Physician: {physician}\n\
         \n\
         Medical Information:\n\
         - Chief Complaint: {complaint}\n\
         \n\
         Address Information:\n\
         - Address: {address}\n\
         - Address Validated: {address_valid}\n\
         \n\
         Intake completed at: {completed_at}\n",
        name = field(&record.name),
        dob = field(&record.date_of_birth),
        phone = field(&record.phone),
        email = field(&record.email),
        payer = field(&record.insurance_payer),
        insurance_id = field(&record.insurance_id),
        has_referral = has_referral,
        physician = field(&record.referral_physician),
        complaint = field(&record.chief_complaint),
        address = field(&record.address),
        address_valid = record.address_valid,
        completed_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_relay_dispatches_to_false() {
        let service = NotifyService::new(NotifyConfig::default());
        assert!(!service.is_enabled());
        assert!(!service.dispatch(&PatientRecord::default()).await);
    }

    #[tokio::test]
    async fn unreachable_relay_is_a_soft_failure() {
        let service = NotifyService::new(NotifyConfig {
            // Reserved TEST-NET-1 address: connection refused fast, no DNS.
            endpoint: "http://192.0.2.1:9/notify".to_string(),
            recipients: vec!["scheduling@example.com".to_string()],
            auth_token: String::new(),
        });
        assert!(service.is_enabled());
        assert!(!service.dispatch(&PatientRecord::default()).await);
    }

    #[test]
    fn summary_includes_collected_fields_and_placeholders() {
        let record = PatientRecord {
            name: Some("Jane Doe".into()),
            chief_complaint: Some("back pain".into()),
            has_referral: Some(false),
            ..Default::default()
        };
        let body = render_summary(&record);
        assert!(body.contains("- Name: Jane Doe"));
        assert!(body.contains("- Chief Complaint: back pain"));
        assert!(body.contains("- Has Referral: No"));
        assert!(body.contains("- Date of Birth: Not provided"));
        assert!(body.contains("Address Validated: false"));
    }

    #[test]
    fn debug_redacts_the_auth_token() {
        let config = NotifyConfig {
            endpoint: "https://relay.example.com".into(),
            recipients: vec![],
            auth_token: "sekrit".into(),
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sekrit"));
        assert!(debug.contains("[REDACTED]"));
    }
}
