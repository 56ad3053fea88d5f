//! The intake slot-filling state machine.
//!
//! One [`IntakeSession`] owns one [`PatientRecord`] for the lifetime of a
//! conversation. Each collectible field has one operation; each operation
//! stores its input, advances the stage, and returns the confirmation
//! sentence to speak back.
//!
//! Operations are deliberately permissive: they overwrite their target
//! fields and advance the stage no matter where the conversation currently
//! stands. The driving agent may free-associate with the patient and call
//! steps out of order, so the machine must stay safe under any call
//! sequence. The only structural loop is address collection, which holds the
//! stage at `address` until validation passes.

use crate::address::{self, AddressVerdict};
use crate::notify::IntakeNotifier;
use crate::slots;
use intake_types::{Appointment, PatientRecord, SlotOffer, Stage};

/// Providers offered per completed intake.
const OFFERED_PROVIDERS: usize = 2;

/// A live intake conversation: the record plus the slots last offered.
#[derive(Debug, Default)]
pub struct IntakeSession {
    record: PatientRecord,
    offered: Vec<SlotOffer>,
}

impl IntakeSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the record collected so far.
    pub fn record(&self) -> &PatientRecord {
        &self.record
    }

    pub fn stage(&self) -> Stage {
        self.record.stage
    }

    /// Slots produced by the most recent [`Self::list_appointments`] call.
    pub fn offered_slots(&self) -> &[SlotOffer] {
        &self.offered
    }

    pub fn submit_name(&mut self, full_name: &str) -> String {
        self.record.name = Some(full_name.to_string());
        self.record.stage = Stage::Dob;
        tracing::info!(name = full_name, "stored patient name");
        format!("Thank you, {full_name}. I have recorded your name.")
    }

    /// Stores the date of birth as given. Any non-empty string is accepted;
    /// the MM/DD/YYYY convention is prompted for but not enforced.
    pub fn submit_dob(&mut self, date_of_birth: &str) -> String {
        self.record.date_of_birth = Some(date_of_birth.to_string());
        self.record.stage = Stage::Insurance;
        "Date of birth recorded. Now let's collect your insurance information.".to_string()
    }

    /// Stores payer and member ID together.
    pub fn submit_insurance(&mut self, payer: &str, member_id: &str) -> String {
        self.record.insurance_payer = Some(payer.to_string());
        self.record.insurance_id = Some(member_id.to_string());
        self.record.stage = Stage::Referral;
        tracing::info!(payer, "stored insurance");
        "Insurance information saved.".to_string()
    }

    /// Records referral status. Without a referral the physician argument is
    /// discarded, whatever was passed.
    pub fn submit_referral(&mut self, has_referral: bool, physician: Option<&str>) -> String {
        self.record.has_referral = Some(has_referral);
        self.record.referral_physician = if has_referral {
            physician
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(str::to_string)
        } else {
            None
        };
        self.record.stage = Stage::Complaint;

        match self.record.referral_physician.as_deref() {
            Some(name) => format!("Referral from Dr. {name} recorded."),
            None => "Referral information recorded.".to_string(),
        }
    }

    pub fn submit_complaint(&mut self, complaint: &str) -> String {
        self.record.chief_complaint = Some(complaint.to_string());
        self.record.stage = Stage::Address;
        "Chief complaint recorded. Now I need your address.".to_string()
    }

    /// Validates and stores the address. On rejection the stage stays at
    /// `address` and the reply names exactly the missing components, so the
    /// caller re-invokes this operation with a corrected address.
    pub fn submit_address(&mut self, address_text: &str) -> String {
        let verdict: AddressVerdict = address::validate(address_text);

        self.record.address = Some(address_text.to_string());
        self.record.address_valid = verdict.valid;
        tracing::info!(valid = verdict.valid, "address validation");

        if verdict.valid {
            self.record.stage = Stage::Contact;
            "Address verified and saved.".to_string()
        } else {
            format!(
                "I'm sorry, but the address appears to be incomplete or invalid. {}. \
                 Please provide the complete address.",
                verdict.message()
            )
        }
    }

    /// Stores phone and optional email (the patient may decline email).
    pub fn submit_contact(&mut self, phone: &str, email: Option<&str>) -> String {
        self.record.phone = Some(phone.to_string());
        self.record.email = email
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string);
        self.record.stage = Stage::Scheduling;
        "Contact information saved. Now let me find available appointment times for you."
            .to_string()
    }

    /// Completes the intake: generates availability, dispatches the record to
    /// the scheduling team once, and returns the numbered listing with the
    /// dispatch outcome folded into the trailing sentence. The listing is
    /// returned whether or not dispatch succeeded.
    pub async fn list_appointments(&mut self, notifier: &dyn IntakeNotifier) -> String {
        self.offered = slots::generate(OFFERED_PROVIDERS);
        self.record.stage = Stage::Complete;

        let mut listing = String::from("Here are the available appointments:\n");
        for (i, offer) in self.offered.iter().enumerate() {
            listing.push_str(&format!("{}. {}\n", i + 1, offer.spoken()));
        }

        if notifier.dispatch(&self.record).await {
            listing.push_str(
                "\nYour information has been sent to our scheduling team. \
                 They will contact you shortly to confirm your appointment.",
            );
        } else {
            listing.push_str(
                "\nThere was an issue sending your information. \
                 Please call our office directly to complete your appointment booking.",
            );
        }

        listing
    }

    /// Stores the slot a caller picked from the last offered listing
    /// (1-based, matching the spoken numbering). Returns `None` when the
    /// choice does not map to an offered slot.
    pub fn select_appointment(&mut self, choice: usize) -> Option<String> {
        let offer = choice.checked_sub(1).and_then(|i| self.offered.get(i))?;

        self.record.appointment = Some(Appointment {
            date: offer.when.format("%A, %B %d").to_string(),
            time: offer.when.format("%I:%M %p").to_string(),
            doctor: offer.provider_name.clone(),
        });
        Some(format!(
            "You're booked with {} on {}.",
            offer.provider_name,
            offer.when.format("%A, %B %d at %I:%M %p")
        ))
    }

    /// Returns the full record as pretty JSON. Callable at any stage, never
    /// fails, mutates nothing. Unfilled fields render as null.
    pub fn summarize(&self) -> String {
        serde_json::to_string_pretty(&self.record).unwrap_or_else(|_| "{}".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NullNotifier;

    #[test]
    fn name_advances_stage_to_dob() {
        let mut session = IntakeSession::new();
        let reply = session.submit_name("Jane Doe");
        assert_eq!(session.record().name.as_deref(), Some("Jane Doe"));
        assert_eq!(session.stage(), Stage::Dob);
        assert!(reply.contains("Jane Doe"));
    }

    #[test]
    fn declining_referral_discards_physician_argument() {
        let mut session = IntakeSession::new();
        session.submit_referral(false, Some("Dr. Strange"));
        assert_eq!(session.record().has_referral, Some(false));
        assert_eq!(session.record().referral_physician, None);

        session.submit_referral(false, Some("   "));
        assert_eq!(session.record().referral_physician, None);
    }

    #[test]
    fn accepted_referral_keeps_physician() {
        let mut session = IntakeSession::new();
        let reply = session.submit_referral(true, Some("House"));
        assert_eq!(session.record().referral_physician.as_deref(), Some("House"));
        assert!(reply.contains("Dr. House"));
        assert_eq!(session.stage(), Stage::Complaint);
    }

    #[test]
    fn invalid_address_holds_the_stage_and_is_idempotent() {
        let mut session = IntakeSession::new();
        session.submit_complaint("back pain");
        assert_eq!(session.stage(), Stage::Address);

        let first = session.submit_address("Main St");
        let second = session.submit_address("Main St");
        assert_eq!(first, second);
        assert_eq!(session.stage(), Stage::Address);
        assert!(!session.record().address_valid);
        assert_eq!(session.record().address.as_deref(), Some("Main St"));
        assert!(first.contains("street number, city, state, ZIP code"));
    }

    #[test]
    fn valid_address_moves_on_to_contact() {
        let mut session = IntakeSession::new();
        session.submit_address("1 Elm St, Boston, MA, 02108");
        assert!(session.record().address_valid);
        assert_eq!(session.stage(), Stage::Contact);
    }

    #[test]
    fn operations_overwrite_out_of_order() {
        // The driving agent is free to revisit steps; the machine must not
        // guard against it.
        let mut session = IntakeSession::new();
        session.submit_contact("555-1234", None);
        assert_eq!(session.stage(), Stage::Scheduling);

        session.submit_name("Late Name");
        assert_eq!(session.stage(), Stage::Dob);
        assert_eq!(session.record().phone.as_deref(), Some("555-1234"));
    }

    #[test]
    fn summarize_never_fails_and_tracks_mutations() {
        let mut session = IntakeSession::new();
        let empty: serde_json::Value = serde_json::from_str(&session.summarize()).unwrap();
        assert_eq!(empty["stage"], "greeting");
        assert!(empty["name"].is_null());

        session.submit_name("Jane Doe");
        let after: serde_json::Value = serde_json::from_str(&session.summarize()).unwrap();
        assert_eq!(after["name"], "Jane Doe");
        assert_eq!(after["stage"], "dob");
    }

    #[tokio::test]
    async fn listing_completes_even_when_dispatch_fails() {
        let mut session = IntakeSession::new();
        let listing = session.list_appointments(&NullNotifier).await;

        assert_eq!(session.stage(), Stage::Complete);
        assert!(listing.starts_with("Here are the available appointments:"));
        assert!(listing.contains("1. "));
        assert!(listing.contains("call our office directly"));
        assert_eq!(session.offered_slots().len(), 4);
    }

    #[tokio::test]
    async fn selecting_an_offered_slot_books_it() {
        let mut session = IntakeSession::new();
        session.list_appointments(&NullNotifier).await;

        assert!(session.select_appointment(0).is_none());
        assert!(session.select_appointment(99).is_none());

        let reply = session.select_appointment(1).expect("slot 1 exists");
        let booked = session.record().appointment.as_ref().expect("stored");
        assert_eq!(booked.doctor, session.offered_slots()[0].provider_name);
        assert!(reply.contains(&booked.doctor));
    }
}
