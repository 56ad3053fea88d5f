//! Shared types for the intake platform.
//!
//! This crate provides the foundational types used across all intake crates:
//! the per-conversation [`PatientRecord`], the [`Stage`] progression enum,
//! and the scheduling types ([`Appointment`], [`SlotOffer`]).
//!
//! No crate in the workspace depends on anything *except* `intake-types` for
//! cross-cutting type definitions. This keeps the dependency graph clean and
//! prevents circular dependencies.

use serde::{Deserialize, Serialize};

/// Position of a conversation within the fixed intake field order.
///
/// Advances forward only, with one exception: the conversation stays at
/// [`Stage::Address`] until the provided address passes validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Greeting,
    Name,
    Dob,
    Insurance,
    Referral,
    Complaint,
    Address,
    Contact,
    Scheduling,
    Complete,
}

impl Stage {
    /// Returns the string label for this stage, as reported in summaries.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Name => "name",
            Self::Dob => "dob",
            Self::Insurance => "insurance",
            Self::Referral => "referral",
            Self::Complaint => "complaint",
            Self::Address => "address",
            Self::Contact => "contact",
            Self::Scheduling => "scheduling",
            Self::Complete => "complete",
        }
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::Greeting
    }
}

/// A confirmed appointment selection: the slot a caller picked by keypress.
///
/// Only the telephony driver writes this; the agent-pipeline driver stops at
/// the offered listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    /// Human-readable date, e.g. "Tuesday, March 04".
    pub date: String,
    /// Human-readable time, e.g. "10:30 AM".
    pub time: String,
    /// Provider name, e.g. "Dr. Sarah Johnson".
    pub doctor: String,
}

/// One offered appointment slot produced by the slot generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotOffer {
    /// Provider name.
    pub provider_name: String,
    /// Provider specialty, e.g. "Family Medicine".
    pub specialty: String,
    /// Clinic location.
    pub location: String,
    /// Slot start time (local clock).
    pub when: chrono::NaiveDateTime,
}

impl SlotOffer {
    /// Formats the slot the way it is spoken to a caller,
    /// e.g. "Dr. Sarah Johnson (Family Medicine) at Main Office - Tuesday, March 04 at 10:30 AM".
    pub fn spoken(&self) -> String {
        format!(
            "{} ({}) at {} - {}",
            self.provider_name,
            self.specialty,
            self.location,
            self.when.format("%A, %B %d at %I:%M %p")
        )
    }
}

/// The mutable per-conversation data bag collecting intake answers.
///
/// Created empty at session start, mutated exclusively by the step operations,
/// and discarded when the conversation ends. Never persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatientRecord {
    pub name: Option<String>,
    /// Free-form, expected MM/DD/YYYY. Not parsed or validated.
    pub date_of_birth: Option<String>,
    pub insurance_payer: Option<String>,
    pub insurance_id: Option<String>,
    pub has_referral: Option<bool>,
    /// Non-empty only when `has_referral` is `Some(true)`.
    pub referral_physician: Option<String>,
    pub chief_complaint: Option<String>,
    /// Raw address text as given, whether or not it validated.
    pub address: Option<String>,
    #[serde(default)]
    pub address_valid: bool,
    pub phone: Option<String>,
    pub email: Option<String>,
    /// Set only by the telephony driver once a caller picks a slot.
    pub appointment: Option<Appointment>,
    #[serde(default)]
    pub stage: Stage,
}

impl PatientRecord {
    /// Returns true once every required field has been collected.
    ///
    /// Email is optional (may be declined) and the appointment selection is
    /// a telephony-only extra, so neither gates completion.
    pub fn is_complete(&self) -> bool {
        self.name.is_some()
            && self.date_of_birth.is_some()
            && self.insurance_payer.is_some()
            && self.insurance_id.is_some()
            && self.has_referral.is_some()
            && self.chief_complaint.is_some()
            && self.address.is_some()
            && self.address_valid
            && self.phone.is_some()
    }
}
