//! Name-dispatched capability set over the intake operations.
//!
//! The voice-pipeline deployment hands these tools to an external reasoning
//! agent that decides, turn by turn, which one to invoke. Arguments arrive
//! as JSON; every tool returns the confirmation sentence the agent speaks.
//! Tools carry no ordering guards of their own (see [`crate::session`]).

use crate::notify::IntakeNotifier;
use crate::session::IntakeSession;
use serde_json::Value;
use std::str::FromStr;
use thiserror::Error;

/// The nine intake tools, by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    StorePatientName,
    StoreDateOfBirth,
    StoreInsurance,
    StoreReferralInfo,
    StoreChiefComplaint,
    StoreAndValidateAddress,
    StoreContactInfo,
    GetAvailableAppointments,
    GetPatientSummary,
}

impl ToolName {
    /// All tools, in canonical intake order.
    pub const ALL: [ToolName; 9] = [
        Self::StorePatientName,
        Self::StoreDateOfBirth,
        Self::StoreInsurance,
        Self::StoreReferralInfo,
        Self::StoreChiefComplaint,
        Self::StoreAndValidateAddress,
        Self::StoreContactInfo,
        Self::GetAvailableAppointments,
        Self::GetPatientSummary,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::StorePatientName => "store_patient_name",
            Self::StoreDateOfBirth => "store_date_of_birth",
            Self::StoreInsurance => "store_insurance",
            Self::StoreReferralInfo => "store_referral_info",
            Self::StoreChiefComplaint => "store_chief_complaint",
            Self::StoreAndValidateAddress => "store_and_validate_address",
            Self::StoreContactInfo => "store_contact_info",
            Self::GetAvailableAppointments => "get_available_appointments",
            Self::GetPatientSummary => "get_patient_summary",
        }
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|tool| tool.as_str() == s)
            .ok_or_else(|| ToolError::UnknownTool(s.to_string()))
    }
}

/// Errors surfaced to the driving agent. Malformed input to a *step* never
/// errors (absent validation simply stores what it is given); only the tool
/// envelope itself can be wrong.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),
    #[error("invalid tool arguments: {0}")]
    BadArgs(String),
}

/// Invokes `tool` against `session` with JSON `args`.
pub async fn invoke(
    session: &mut IntakeSession,
    tool: ToolName,
    args: &Value,
    notifier: &dyn IntakeNotifier,
) -> Result<String, ToolError> {
    let reply = match tool {
        ToolName::StorePatientName => session.submit_name(require_str(args, "name")?),
        ToolName::StoreDateOfBirth => session.submit_dob(require_str(args, "date_of_birth")?),
        ToolName::StoreInsurance => session.submit_insurance(
            require_str(args, "payer_name")?,
            require_str(args, "insurance_id")?,
        ),
        ToolName::StoreReferralInfo => session.submit_referral(
            require_bool(args, "has_referral")?,
            optional_str(args, "physician_name"),
        ),
        ToolName::StoreChiefComplaint => session.submit_complaint(require_str(args, "complaint")?),
        ToolName::StoreAndValidateAddress => session.submit_address(require_str(args, "address")?),
        ToolName::StoreContactInfo => {
            session.submit_contact(require_str(args, "phone")?, optional_str(args, "email"))
        }
        ToolName::GetAvailableAppointments => session.list_appointments(notifier).await,
        ToolName::GetPatientSummary => session.summarize(),
    };
    Ok(reply)
}

fn require_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, ToolError> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ToolError::BadArgs(format!("missing string field: {key}")))
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str)
}

fn require_bool(args: &Value, key: &str) -> Result<bool, ToolError> {
    args.get(key)
        .and_then(Value::as_bool)
        .ok_or_else(|| ToolError::BadArgs(format!("missing boolean field: {key}")))
}
